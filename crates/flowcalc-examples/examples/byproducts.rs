//! Byproduct example: a refinery whose surplus has to be discarded.
//!
//! One refinery turns A into B, C and E. B and C go onto a main line that
//! feeds a crafter (B + C -> D), but the refinery makes twice as much C as
//! the crafter needs and E has no consumer at all. Waste points drain both
//! surpluses; the cheaper overflow dump is preferred over the expensive one.
//!
//! Run with: `cargo run -p flowcalc-examples --example byproducts`

use flowcalc_core::config::AnalysisConfig;
use flowcalc_core::network::{Network, OutputPoint};
use flowcalc_core::station::RecipeStation;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG: &str = r#"
tolerance = 1e-9
minimize_waste = true
"#;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    init_tracing();
    let config = AnalysisConfig::from_toml_str(CONFIG).unwrap();
    let mut network = Network::with_config(config);

    let source = network.add_source("A", Some(10.0)).unwrap();
    let refinery = RecipeStation::new(
        "refinery",
        vec![("A".into(), 1.0)],
        vec![("B".into(), 1.0), ("C".into(), 2.0), ("E".into(), 1.5)],
        1.0,
    )
    .unwrap();
    let refineries = network.add_station_group(refinery, None).unwrap();
    network.connect(source, refineries, &[]).unwrap();

    let main_line = network.add_buffer("main_line", &[]).unwrap();
    network.connect(refineries, main_line, &["B", "C"]).unwrap();
    network.add_waste_point(refineries, "E", None, 1.0).unwrap();

    // Surplus C can leave through a free overflow or a costly dump.
    let overflow = network.add_buffer("overflow", &[("C", 6.0)]).unwrap();
    let dump = network.add_buffer("dump", &[]).unwrap();
    network.connect(main_line, overflow, &["C"]).unwrap();
    network.connect(main_line, dump, &["C"]).unwrap();
    network.add_waste_point(overflow, "C", None, 0.0).unwrap();
    network.add_waste_point(dump, "C", None, 10.0).unwrap();

    let crafter = RecipeStation::new(
        "crafter",
        vec![("B".into(), 1.0), ("C".into(), 1.0)],
        vec![("D".into(), 1.0)],
        1.0,
    )
    .unwrap();
    let crafters = network.add_station_group(crafter, None).unwrap();
    network.connect(main_line, crafters, &["B", "C"]).unwrap();
    network.connect(crafters, main_line, &["D"]).unwrap();
    network.add_output_point(OutputPoint::new(main_line, "D")).unwrap();

    let aggregate = network.full_analyse().unwrap();
    println!("{}", flowcalc_report::full_report(&network, &aggregate));
}
