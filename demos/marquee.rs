//! Runs a confetti layer over a solid background, then swipes to a new scene
//! and prints the panel as ASCII at a few points along the way.
//!
//! `cargo run --example marquee`

use animux::harness::FrameHarness;
use animux::routines::{Confetti, LineSwipe, SolidFill};
use animux::{EngineBuilder, EngineConfig, Layer, Params, Rgb, Tags};

const CONFIG: &str = r#"
width = 24
height = 8
slot_capacity = 8
default_fps = 50
"#;

fn render(h: &FrameHarness, label: &str) {
    let config = h.engine().config();
    println!("-- {label} @ {} ms", h.now_ms());
    for y in 0..config.height as i32 {
        let row: String = (0..config.width as i32)
            .map(|x| match h.pixel(x, y).unwrap_or_default() {
                c if c.is_clear() => ' ',
                c if c.r >= c.g && c.r >= c.b => '#',
                c if c.g >= c.b => '+',
                _ => '.',
            })
            .collect();
        println!("|{row}|");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(true)
        .init();

    let config = EngineConfig::from_toml_str(CONFIG)?;
    let mut builder = EngineBuilder::new(config);
    builder
        .slot("night", SolidFill, Params::new().with_color(Rgb::new(0, 0, 60)), Layer::Low)
        .tagged(
            "sparks",
            Confetti::new(42),
            Params::new().with_speed(4).with_scale(200).with_fps(60),
            Tags::REMEMBRANCE | Tags::VISUAL,
        )
        .slot("dawn", SolidFill, Params::new().with_color(Rgb::new(90, 30, 0)), Layer::High)
        .tagged(
            "swipe",
            LineSwipe,
            Params::new().with_color(Rgb::new(0, 255, 0)).with_transition_ms(400),
            Tags::TRANSITION,
        );
    let (engine, names) = builder.build()?;
    let mut h = FrameHarness::new(engine);

    for name in ["night", "sparks"] {
        let id = names.get(name).ok_or("missing slot")?;
        h.engine_mut().queue(id, None)?;
    }
    let outcome = h.engine_mut().swap(false)?;
    tracing::info!(?outcome, "first scene");
    h.run_for(300, 5);
    render(&h, "night");

    h.engine_mut().queue_by_routine("solid_fill", None)?;
    h.engine_mut().queue_by_routine("line_swipe", None)?;
    let outcome = h.engine_mut().swap(false)?;
    tracing::info!(?outcome, "swiping");
    h.run_for(200, 5);
    render(&h, "mid-swipe");
    h.run_for(400, 5);
    render(&h, "dawn");

    tracing::info!(frames = h.frames_drawn(), "done");
    Ok(())
}
