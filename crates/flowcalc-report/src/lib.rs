//! Plain-text reports for analysis results.
//!
//! Renders [`SingleResult`] and [`AggregateResult`] against the
//! [`Network`] they were computed on, so nodes can be named by material,
//! buffer name or station description. Rates use two decimals.
//!
//! # Usage
//!
//! ```ignore
//! let aggregate = network.full_analyse()?;
//! println!("{}", flowcalc_report::full_report(&network, &aggregate));
//! ```

use flowcalc_core::id::{BufferLine, NodeId};
use flowcalc_core::network::Network;
use flowcalc_core::result::{AggregateResult, Bottleneck, RateMap, Rates, SingleResult};

const UNKNOWN: &str = "[unknown]";

// ---------------------------------------------------------------------------
// Naming helpers
// ---------------------------------------------------------------------------

fn source_material(network: &Network, id: NodeId) -> &str {
    network
        .node(id)
        .and_then(|n| n.as_source())
        .map(|s| s.material.as_str())
        .unwrap_or(UNKNOWN)
}

fn buffer_name(network: &Network, id: NodeId) -> &str {
    network
        .node(id)
        .and_then(|n| n.as_buffer())
        .map(|b| b.name.as_str())
        .unwrap_or(UNKNOWN)
}

fn waste_material(network: &Network, id: NodeId) -> &str {
    network
        .node(id)
        .and_then(|n| n.as_waste())
        .map(|w| w.material.as_str())
        .unwrap_or(UNKNOWN)
}

fn format_rate(rate: f64) -> String {
    if rate.is_infinite() {
        "infinite".to_string()
    } else {
        format!("{rate:.2}")
    }
}

// ---------------------------------------------------------------------------
// Bottlenecks
// ---------------------------------------------------------------------------

/// Human-readable name of the capacity constraint behind `bottleneck`.
pub fn describe_bottleneck(network: &Network, bottleneck: &Bottleneck) -> String {
    match bottleneck {
        Bottleneck::SourceCap { source } => {
            format!("maximum rate of a {} source", source_material(network, *source))
        }
        Bottleneck::StationCap { station } => network
            .node(*station)
            .and_then(|n| n.as_station())
            .map(|group| group.station.cap_description())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        Bottleneck::BufferCap { buffer, material } => {
            format!("{material} rate cap of buffer '{}'", buffer_name(network, *buffer))
        }
        Bottleneck::OutputCap { material, .. } => format!("{material} output cap"),
        Bottleneck::WasteCap { waste } => format!("{} waste cap", waste_material(network, *waste)),
    }
}

/// One-line summary: the rate, what limits it, and what removing that limit
/// would raise it to.
pub fn one_line(network: &Network, result: &SingleResult) -> String {
    let Some((first_rate, first)) = result.bottlenecks.first() else {
        if result.rate.is_infinite() {
            return "infinite".to_string();
        }
        return format!("{:.2}/s with no bottleneck", result.rate);
    };
    let next_rate = result
        .bottlenecks
        .get(1)
        .map(|(rate, _)| *rate)
        .unwrap_or(result.residual_rate);
    let description = describe_bottleneck(network, first);
    if next_rate.is_infinite() {
        format!("{:.2}/s bottlenecked by {description} for ever", result.rate)
    } else if *first_rate > 0.0 {
        format!(
            "{:.2}/s bottlenecked by {description} for another {:.1}x",
            result.rate,
            next_rate / first_rate
        )
    } else {
        format!("{:.2}/s bottlenecked by {description}, {next_rate:.2}/s without it", result.rate)
    }
}

// ---------------------------------------------------------------------------
// Rate sections
// ---------------------------------------------------------------------------

fn push_sources(lines: &mut Vec<String>, network: &Network, sources: &RateMap<NodeId>) {
    if sources.is_empty() {
        return;
    }
    lines.push(" -- sources -- ".to_string());
    for (&source, rate) in sources.iter() {
        lines.push(format!("{}: {}/s", source_material(network, source), format_rate(rate)));
    }
}

/// Buffer lines grouped under their buffer, buffers in first-seen order.
fn push_buffers(lines: &mut Vec<String>, network: &Network, buffers: &RateMap<BufferLine>) {
    if buffers.is_empty() {
        return;
    }
    lines.push(" -- buffer throughput -- ".to_string());
    let mut seen: Vec<NodeId> = Vec::new();
    for line in buffers.keys() {
        if !seen.contains(&line.buffer) {
            seen.push(line.buffer);
        }
    }
    for buffer in seen {
        lines.push(format!("{}:", buffer_name(network, buffer)));
        for (line, rate) in buffers.iter().filter(|(l, _)| l.buffer == buffer) {
            lines.push(format!("- {}: {}/s", line.material, format_rate(rate)));
        }
    }
}

fn push_stations(lines: &mut Vec<String>, network: &Network, stations: &RateMap<NodeId>) {
    if stations.is_empty() {
        return;
    }
    lines.push(" -- stations -- ".to_string());
    for (&station, rate) in stations.iter() {
        let description = network
            .node(station)
            .and_then(|n| n.as_station())
            .map(|group| group.station.describe_throughput(rate))
            .unwrap_or_else(|| UNKNOWN.to_string());
        lines.push(description);
    }
}

fn push_wastes(lines: &mut Vec<String>, network: &Network, wastes: &RateMap<NodeId>) {
    if wastes.is_empty() {
        return;
    }
    lines.push(" -- waste -- ".to_string());
    for (&waste, rate) in wastes.iter() {
        let location = network
            .node(waste)
            .and_then(|n| n.as_waste())
            .and_then(|w| network.node(w.location))
            .map(|n| match n.as_buffer() {
                Some(buffer) => format!("buffer '{}'", buffer.name),
                None => n.kind_name().to_string(),
            })
            .unwrap_or_else(|| UNKNOWN.to_string());
        lines.push(format!(
            "{} from {location}: {}/s",
            waste_material(network, waste),
            format_rate(rate)
        ));
    }
}

fn push_rates(lines: &mut Vec<String>, network: &Network, rates: &Rates) {
    push_sources(lines, network, &rates.sources);
    push_buffers(lines, network, &rates.buffers);
    push_stations(lines, network, &rates.stations);
    push_wastes(lines, network, &rates.wastes);
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Multi-line report of one output point.
pub fn single_report(network: &Network, result: &SingleResult) -> String {
    let mut lines = vec![format!("final rate: {}", one_line(network, result))];

    if result.bottlenecks.len() >= 2 {
        lines.push(" -- bottlenecks -- ".to_string());
        for (i, (_, bottleneck)) in result.bottlenecks.iter().enumerate() {
            let description = describe_bottleneck(network, bottleneck);
            match result.bottlenecks.get(i + 1) {
                Some((next_rate, _)) => lines.push(format!("{next_rate:.2} by removing {description}")),
                None => lines.push(format!(
                    "{} by removing {description}",
                    format_rate(result.residual_rate)
                )),
            }
        }
    }

    let costs = result.source_costs();
    if !costs.is_empty() {
        lines.push(" -- cost per unit material -- ".to_string());
        for (source, cost) in costs {
            lines.push(format!("{}: {cost:.2}", source_material(network, source)));
        }
    }

    push_rates(&mut lines, network, &result.rates);
    lines.join("\n")
}

/// The aggregate envelope followed by a one-line summary per output point.
pub fn aggregate_report(network: &Network, aggregate: &AggregateResult) -> String {
    let mut lines = Vec::new();
    push_rates(&mut lines, network, &aggregate.rates);
    lines.push(" -- single output rates -- ".to_string());
    for (point, result) in &aggregate.singles {
        lines.push(format!("{}: {}", point.material, one_line(network, result)));
    }
    lines.join("\n")
}

/// Every single report in registration order, then the aggregate report.
pub fn full_report(network: &Network, aggregate: &AggregateResult) -> String {
    let mut lines = Vec::new();
    for (point, result) in &aggregate.singles {
        lines.push(format!("-------- {}", point.material));
        lines.push(single_report(network, result));
        lines.push(String::new());
    }
    lines.push("-------- full analysis".to_string());
    lines.push(aggregate_report(network, aggregate));
    lines.join("\n")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use flowcalc_core::network::OutputPoint;
    use flowcalc_core::test_utils::*;

    #[test]
    fn bottleneck_descriptions() {
        let (mut network, _, ids) = ore_chain(Some(5.0), Some(3.0));
        let waste = network.add_waste_point(ids.line, "slag", Some(1.0), 1.0).unwrap();

        assert_eq!(
            describe_bottleneck(&network, &Bottleneck::SourceCap { source: ids.source }),
            "maximum rate of a iron_ore source"
        );
        assert_eq!(
            describe_bottleneck(&network, &Bottleneck::StationCap { station: ids.smelter }),
            "smelter station cap"
        );
        assert_eq!(
            describe_bottleneck(
                &network,
                &Bottleneck::BufferCap {
                    buffer: ids.line,
                    material: "iron_ore".into()
                }
            ),
            "iron_ore rate cap of buffer 'ore line'"
        );
        assert_eq!(
            describe_bottleneck(
                &network,
                &Bottleneck::OutputCap {
                    location: ids.smelter,
                    material: "iron_plate".into()
                }
            ),
            "iron_plate output cap"
        );
        assert_eq!(
            describe_bottleneck(&network, &Bottleneck::WasteCap { waste }),
            "slag waste cap"
        );
    }

    #[test]
    fn one_line_forms() {
        let (network, point, _) = ore_chain(None, None);
        let result = network.analyse(&point).unwrap();
        assert_eq!(one_line(&network, &result), "infinite");

        let (network, point, _) = ore_chain(Some(5.0), None);
        let result = network.analyse(&point).unwrap();
        assert_eq!(
            one_line(&network, &result),
            "5.00/s bottlenecked by maximum rate of a iron_ore source for ever"
        );

        let (network, point, _) = ore_chain(Some(5.0), Some(2.0));
        let result = network.analyse(&point).unwrap();
        assert_eq!(
            one_line(&network, &result),
            "2.00/s bottlenecked by iron_ore rate cap of buffer 'ore line' for another 2.5x"
        );
    }

    #[test]
    fn idle_output_has_no_bottleneck() {
        let mut network = Network::new();
        let crude = network.add_source("crude", Some(4.0)).unwrap();
        let refinery = network.add_station_group(refinery(), None).unwrap();
        network.connect(crude, refinery, &[]).unwrap();
        let result = network.analyse(&OutputPoint::new(refinery, "fuel")).unwrap();
        assert_eq!(one_line(&network, &result), "0.00/s with no bottleneck");
    }

    #[test]
    fn finite_residual_is_not_called_infinite() {
        let mut network = Network::new();
        let crude = network.add_source("crude", Some(4.0)).unwrap();
        let refinery = network.add_station_group(refinery(), None).unwrap();
        network.connect(crude, refinery, &[]).unwrap();
        let point = OutputPoint::new(refinery, "fuel").with_max_rate(0.0);

        let result = network.analyse(&point).unwrap();
        assert_eq!(result.bottlenecks.len(), 1);
        assert_eq!(result.residual_rate, 0.0);
        let line = one_line(&network, &result);
        assert_eq!(line, "0.00/s bottlenecked by fuel output cap, 0.00/s without it");
        assert!(!single_report(&network, &result).contains("infinite"));
    }

    #[test]
    fn single_report_sections() {
        let (network, point, _) = ore_chain(Some(5.0), Some(2.0));
        let result = network.analyse(&point).unwrap();
        let report = single_report(&network, &result);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[..lines.len() - 1].to_vec(),
            vec![
                "final rate: 2.00/s bottlenecked by iron_ore rate cap of buffer 'ore line' for another 2.5x",
                " -- bottlenecks -- ",
                "5.00 by removing iron_ore rate cap of buffer 'ore line'",
                "infinite by removing maximum rate of a iron_ore source",
                " -- cost per unit material -- ",
                "iron_ore: 1.00",
                " -- sources -- ",
                "iron_ore: 2.00/s",
                " -- buffer throughput -- ",
                "ore line:",
                "- iron_ore: 2.00/s",
                " -- stations -- ",
            ]
        );
        // Station counts round up, so only the unit is stable here.
        assert!(report.ends_with("smelter stations"));
    }

    #[test]
    fn byproduct_report_lists_waste() {
        let (network, point, _) = byproduct_network();
        let result = network.analyse(&point).unwrap();
        let report = single_report(&network, &result);
        assert!(report.contains(" -- waste -- "));
        assert!(report.contains("C from buffer 'main_line': 10.00/s"));
        assert!(report.contains("E from station group: 15.00/s"));
        assert!(report.contains("main_line:\n- D: 10.00/s"));
    }

    #[test]
    fn full_report_layout() {
        let (network, _, _) = byproduct_network();
        let aggregate = network.full_analyse().unwrap();
        let report = full_report(&network, &aggregate);
        assert!(report.starts_with("-------- D\nfinal rate: 10.00/s"));
        assert!(report.contains("-------- full analysis"));
        assert!(report.ends_with("D: 10.00/s bottlenecked by maximum rate of a A source for ever"));
    }
}
