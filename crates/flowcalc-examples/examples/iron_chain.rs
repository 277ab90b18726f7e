//! Iron chain example: smelting, gears and belts sharing one plate buffer.
//!
//! An ore source feeds electric furnaces through a temporary buffer. Plates
//! land on an iron buffer that also feeds gear assemblers (whose gears go
//! back onto the same buffer) and belt assemblers. Three output points are
//! registered and analysed one at a time.
//!
//! Run with: `cargo run -p flowcalc-examples --example iron_chain`
//! (set `RUST_LOG=flowcalc_core=debug` to see the solver steps).

use flowcalc_core::network::{Network, OutputPoint};
use flowcalc_core::station::{ModifierKind, RecipeStation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn recipe(name: &str, inputs: &[(&str, f64)], output: (&str, f64), craft_time: f64) -> RecipeStation {
    RecipeStation::new(
        name,
        inputs.iter().map(|&(m, a)| (m.to_string(), a)).collect(),
        vec![(output.0.to_string(), output.1)],
        craft_time,
    )
    .unwrap()
}

fn main() {
    init_tracing();
    let mut network = Network::new();

    // --- Smelting ---

    let ore = network.add_source("iron_ore", Some(60.0)).unwrap();
    let temp_buffer = network.add_buffer("temp_buffer", &[]).unwrap();
    network.connect(ore, temp_buffer, &[]).unwrap();

    let furnace = recipe("electric furnace", &[("iron_ore", 1.0)], ("iron_plate", 1.0), 3.2)
        .with_speed(2.0)
        .unwrap();
    let furnaces = network.add_station_group(furnace, None).unwrap();
    network.connect(temp_buffer, furnaces, &[]).unwrap();

    let iron_buffer = network.add_buffer("iron_buffer", &[("iron_plate", 45.0)]).unwrap();
    network.connect(furnaces, iron_buffer, &[]).unwrap();
    network
        .add_output_point(OutputPoint::new(iron_buffer, "iron_plate"))
        .unwrap();

    // --- Gears, cycled back onto the iron buffer ---

    let gear = recipe("gear assembler", &[("iron_plate", 2.0)], ("gear", 1.0), 0.5)
        .with_speed(0.75)
        .unwrap()
        .with_modifier(ModifierKind::Speed(1.2));
    let gears = network.add_station_group(gear, Some(3.0)).unwrap();
    network.connect(iron_buffer, gears, &[]).unwrap();
    network.connect(gears, iron_buffer, &[]).unwrap();
    network.add_output_point(OutputPoint::new(iron_buffer, "gear")).unwrap();

    // --- Belts, extracted straight from the assemblers ---

    let belt = recipe(
        "belt assembler",
        &[("iron_plate", 1.0), ("gear", 1.0)],
        ("belt", 2.0),
        0.5,
    )
    .with_speed(0.75)
    .unwrap();
    let belts = network.add_station_group(belt, Some(3.0)).unwrap();
    network.connect(iron_buffer, belts, &["iron_plate", "gear"]).unwrap();
    network.add_output_point(OutputPoint::new(belts, "belt")).unwrap();

    let aggregate = network.full_analyse().unwrap();
    println!("{}", flowcalc_report::full_report(&network, &aggregate));
}
