use animux::{Canvas, Engine, EngineConfig, Layer, Params, Pool, RegistryError, SlotId};
use proptest::prelude::*;

fn idle(_: &mut Params, _: &mut Canvas<'_>) {}

fn engine_with(layers: &[Layer]) -> (Engine, Vec<SlotId>) {
    let mut engine = Engine::new(EngineConfig::new(4, 4).with_slot_capacity(8)).unwrap();
    let ids = layers
        .iter()
        .map(|&l| engine.add_slot(idle, Params::new(), l).unwrap())
        .collect();
    (engine, ids)
}

fn pool_total(engine: &Engine) -> usize {
    Pool::ALL.iter().map(|&p| engine.registry().pool_len(p)).sum()
}

#[test]
fn failed_operations_do_not_mutate() {
    let (mut e, ids) = engine_with(&[Layer::Low, Layer::Medium]);
    let (a, b) = (ids[0], ids[1]);

    assert_eq!(e.queue(a, None), Err(RegistryError::NotRegistered(a)));
    assert_eq!(e.unregister(a, true), Err(RegistryError::NotRegistered(a)));
    assert_eq!(e.register(SlotId(42), Layer::Low), Err(RegistryError::UnknownSlot(SlotId(42))));
    assert_eq!(pool_total(&e), 0);

    e.register(a, Layer::Low).unwrap();
    e.register(b, Layer::Medium).unwrap();
    e.queue(a, None).unwrap();
    e.swap(false).unwrap();

    let snapshot = |e: &Engine| -> Vec<Vec<SlotId>> {
        Pool::ALL.iter().map(|&p| e.registry().iter(p).collect()).collect()
    };
    let before = snapshot(&e);
    assert_eq!(e.register(a, Layer::High), Err(RegistryError::AlreadyRegistered(a)));
    assert_eq!(e.queue(a, None), Err(RegistryError::NotWaiting(a)));
    assert_eq!(e.unregister(a, false), Err(RegistryError::SlotActive(a)));
    assert!(e.queue_by_routine("missing", None).is_err());
    let after = snapshot(&e);
    assert_eq!(before, after);
    assert_eq!(e.slot(a).unwrap().layer(), Layer::Low);
}

#[test]
fn unregister_waiting_or_queued_slot() {
    let (mut e, ids) = engine_with(&[Layer::Low, Layer::Transition]);
    for &id in &ids {
        let layer = e.slot(id).unwrap().layer();
        e.register(id, layer).unwrap();
    }
    e.queue(ids[1], None).unwrap();
    e.unregister(ids[0], false).unwrap();
    e.unregister(ids[1], false).unwrap();
    assert_eq!(pool_total(&e), 0);
    // Unregistered slots can come back.
    e.register(ids[0], Layer::High).unwrap();
    assert_eq!(e.pool_of(ids[0]), Some(Pool::WaitingMain));
}

#[test]
fn queue_by_routine_skips_queued_slots() {
    let mut e = Engine::new(EngineConfig::new(2, 2)).unwrap();
    let first = e.add_slot(animux::routines::SolidFill, Params::new(), Layer::Low).unwrap();
    let second = e.add_slot(animux::routines::SolidFill, Params::new(), Layer::Low).unwrap();
    e.register(first, Layer::Low).unwrap();
    e.register(second, Layer::Low).unwrap();
    assert_eq!(e.queue_by_routine("solid_fill", None), Ok(first));
    assert_eq!(e.queue_by_routine("solid_fill", Some(Layer::High)), Ok(second));
    assert_eq!(
        e.queue_by_routine("solid_fill", None),
        Err(RegistryError::NoWaitingRoutine("solid_fill".to_string()))
    );
    assert_eq!(e.slot(second).unwrap().tier(), Layer::High.tier());
}

#[derive(Debug, Clone)]
enum Op {
    Register(usize, Layer),
    Unregister(usize, bool),
    Queue(usize, Option<Layer>),
    Swap(bool),
}

fn layer() -> impl Strategy<Value = Layer> {
    prop::sample::select(Layer::ALL.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..6usize, layer()).prop_map(|(s, l)| Op::Register(s, l)),
        (0..6usize, any::<bool>()).prop_map(|(s, f)| Op::Unregister(s, f)),
        (0..6usize, prop::option::of(layer())).prop_map(|(s, l)| Op::Queue(s, l)),
        any::<bool>().prop_map(Op::Swap),
    ]
}

proptest! {
    #[test]
    fn pools_stay_exclusive(ops in prop::collection::vec(op(), 0..80)) {
        let (mut e, ids) = engine_with(&[Layer::Low; 6]);
        let mut registered = [false; 6];
        for op in ops {
            match op {
                Op::Register(s, l) => {
                    if e.register(ids[s], l).is_ok() {
                        registered[s] = true;
                    }
                }
                Op::Unregister(s, force) => {
                    if e.unregister(ids[s], force).is_ok() {
                        registered[s] = false;
                    }
                }
                Op::Queue(s, l) => {
                    let _ = e.queue(ids[s], l);
                }
                Op::Swap(blend) => {
                    let _ = e.swap(blend);
                }
            }
            let expected = registered.iter().filter(|&&r| r).count();
            prop_assert_eq!(pool_total(&e), expected);
            prop_assert!(e.registry().pools_consistent());
            prop_assert!(e.registry().active_sorted());
            for (s, &r) in registered.iter().enumerate() {
                prop_assert_eq!(e.pool_of(ids[s]).is_some(), r);
            }
        }
    }
}
