//! End-to-end lifecycle scenarios driven through the frame harness.

use animux::harness::FrameHarness;
use animux::{
    Canvas, Engine, EngineConfig, Layer, Params, Pool, RegistryError, Rgb, Rung, SlotId, Tier,
};

const RED: Rgb = Rgb::new(200, 0, 0);
const GREEN: Rgb = Rgb::new(0, 200, 0);
const BLUE: Rgb = Rgb::new(0, 0, 200);

fn fill(p: &mut Params, c: &mut Canvas<'_>) {
    for i in 0..c.len() {
        c.write(i, p.color);
    }
}

fn fill_and_remember(p: &mut Params, c: &mut Canvas<'_>) {
    for i in 0..c.len() {
        if c.write(i, p.color) {
            c.remember(i);
        }
    }
}

fn corner(p: &mut Params, c: &mut Canvas<'_>) {
    c.write(0, p.color);
}

fn engine() -> Engine {
    Engine::new(EngineConfig::new(4, 2).with_default_fps(100)).unwrap()
}

struct Abc {
    h: FrameHarness,
    a: SlotId,
    b: SlotId,
    c: SlotId,
}

fn abc() -> Abc {
    let mut e = engine();
    let a = e.add_slot(fill, Params::new().with_color(RED), Layer::Low).unwrap();
    let b = e.add_slot(fill_and_remember, Params::new().with_color(GREEN), Layer::Medium).unwrap();
    let c = e
        .add_slot(corner, Params::new().with_color(BLUE).with_transition_ms(100), Layer::Transition)
        .unwrap();
    e.register(a, Layer::Low).unwrap();
    e.register(b, Layer::Medium).unwrap();
    e.register(c, Layer::Transition).unwrap();
    Abc {
        h: FrameHarness::new(e),
        a,
        b,
        c,
    }
}

#[test]
fn hard_cut_replaces_active_content() {
    let Abc { mut h, a, b, .. } = abc();

    h.engine_mut().queue(a, None).unwrap();
    h.engine_mut().swap(false).unwrap();
    assert_eq!(h.engine().pool_of(a), Some(Pool::Active));
    assert_eq!(h.engine().slot(a).unwrap().tier(), Tier::LOW);
    assert!(h.engine().claims().pixels().iter().all(|p| p.tier == Tier::LOW));
    h.tick();
    assert!(h.frame().iter().all(|&c| c == RED));

    h.engine_mut().queue(b, None).unwrap();
    h.engine_mut().swap(false).unwrap();
    assert_eq!(h.engine().pool_of(a), Some(Pool::WaitingMain));
    assert_eq!(h.engine().pool_of(b), Some(Pool::Active));
    assert_eq!(h.engine().slot(b).unwrap().tier(), Tier::MEDIUM);
    assert!(h
        .engine()
        .claims()
        .pixels()
        .iter()
        .all(|p| p.tier == Tier::LOW && p.color == Rgb::BLACK));
    h.advance(10);
    assert!(h.frame().iter().all(|&c| c == GREEN));
}

#[test]
fn transition_fences_then_sweeps() {
    let Abc { mut h, b, c, .. } = abc();
    h.engine_mut().queue(b, None).unwrap();
    h.engine_mut().swap(false).unwrap();
    h.tick();

    h.engine_mut().queue(c, None).unwrap();
    h.engine_mut().swap(false).unwrap();
    let e = h.engine();
    assert!(e.is_transition_in_progress());
    assert!(e.claims().pixels().iter().all(|p| p.tier == Tier::PHASING_LOW));
    assert_eq!(e.slot(b).unwrap().tier(), Tier::Phasing(Rung::Medium));
    assert_eq!(e.slot(c).unwrap().tier(), Tier::Transition);
    assert_eq!(e.active().collect::<Vec<_>>(), vec![c, b]);

    // C claims the corner at the transition tier; B keeps drawing elsewhere.
    let start = h.now_ms() + 10;
    h.advance(10);
    assert_eq!(h.frame()[0], BLUE);
    assert!(h.frame()[1..].iter().all(|&px| px == GREEN));
    // The corner decayed onto the active ladder; B's phasing writes stay out.
    assert!(!h.engine().claims().can_write(Tier::Phasing(Rung::Medium), 0));
    h.advance(10);
    assert_eq!(h.frame()[0], BLUE);

    while h.now_ms() < start + 100 {
        h.advance(10);
        if h.now_ms() < start + 100 {
            assert!(h.engine().is_transition_in_progress());
        }
    }
    let e = h.engine();
    assert_eq!(e.pool_of(c), Some(Pool::WaitingTransition));
    assert_eq!(e.pool_of(b), Some(Pool::WaitingMain));
    assert!(!e.is_transition_in_progress());
    assert_eq!(e.active().count(), 0);
    assert!(e.claims().pixels().iter().all(|p| !p.tier.is_phasing()));
    assert_eq!(e.claims().remembered_count(b.0), 0);
}

#[test]
fn forced_unregister_releases_held_pixels() {
    let Abc { mut h, b, .. } = abc();
    h.engine_mut().queue(b, None).unwrap();
    h.engine_mut().swap(false).unwrap();
    h.tick();
    assert_eq!(h.engine().claims().remembered_count(b.0), 8);

    let e = h.engine_mut();
    assert_eq!(e.unregister(b, false), Err(RegistryError::SlotActive(b)));
    assert_eq!(e.pool_of(b), Some(Pool::Active));
    assert_eq!(e.claims().remembered_count(b.0), 8);

    e.unregister(b, true).unwrap();
    assert_eq!(e.pool_of(b), None);
    assert_eq!(e.claims().remembered_count(b.0), 0);
    assert!(e.claims().pixels().iter().all(|p| p.tier == Tier::LOW));
    // Back in a waiting pool once registered again.
    e.register(b, Layer::Medium).unwrap();
    assert_eq!(e.pool_of(b), Some(Pool::WaitingMain));
}

#[test]
fn persistent_clear_write_hands_pixel_to_medium() {
    fn blink(p: &mut Params, c: &mut Canvas<'_>) {
        let color = if p.counter == 0 { p.color } else { Rgb::BLACK };
        c.write(0, color);
        p.counter += 1;
    }

    let mut e = engine();
    let hold = e.add_slot(blink, Params::new().with_color(RED), Layer::Persistent).unwrap();
    let mid = e.add_slot(corner, Params::new().with_color(GREEN), Layer::Medium).unwrap();
    for id in [hold, mid] {
        e.register(id, e.slot(id).unwrap().layer()).unwrap();
        e.queue(id, None).unwrap();
    }
    e.swap(false).unwrap();
    assert_eq!(e.active().collect::<Vec<_>>(), vec![hold, mid]);

    let mut h = FrameHarness::new(e);
    h.tick();
    assert_eq!(h.frame()[0], RED);
    assert_eq!(h.engine().claims().claim(0).unwrap().tier, Tier::HIGH_PERSISTENT);

    h.advance(10);
    assert_eq!(h.frame()[0], GREEN);
}
