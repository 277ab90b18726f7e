//! Maximum-throughput analysis of output points.
//!
//! One analysis runs, in order: reachability search, LP construction, the
//! primary solve, an optional waste-minimising re-solve, and bottleneck
//! decomposition. The decomposition repeatedly removes the first binding
//! capacity constraint and re-solves until the rate becomes unbounded or
//! nothing binds any more.

use crate::config::AnalysisConfig;
use crate::lp::{self, Equality, Inequality, LinearProgram, Row, OBJECTIVE};
use crate::network::{ConfigError, Network, OutputPoint};
use crate::result::{AggregateResult, Bottleneck, Rates, SingleResult};
use crate::search::{self, Subgraph};
use crate::solver::{self, LpOutcome, Objective, Vertex};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by [`Network::analyse`] and [`Network::full_analyse`].
///
/// Only [`AnalysisError::Config`] is a caller mistake. The other variants
/// mean the constructed LP is inconsistent with itself.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid output point: {0}")]
    Config(#[from] ConfigError),
    #[error("primary linear program is infeasible")]
    Infeasible,
    #[error("waste-minimising re-solve failed at rate {rate}")]
    SecondaryFailed { rate: f64 },
    #[error("re-solve failed after removing bottleneck {0:?}")]
    DecompositionFailed(Bottleneck),
}

// ---------------------------------------------------------------------------
// Solving
// ---------------------------------------------------------------------------

/// Primary solve followed, when waste flows, by the weighted waste re-solve.
fn optimise(
    lp: &LinearProgram,
    inequalities: &[Inequality],
    config: &AnalysisConfig,
) -> Result<LpOutcome, AnalysisError> {
    let count = lp.layout.variable_count();
    let primary = solver::solve(count, &lp.equalities, inequalities, Objective::MaximizeOutput)
        .map_err(|_| AnalysisError::Infeasible)?;
    let LpOutcome::Optimal(vertex) = primary else {
        return Ok(LpOutcome::Unbounded);
    };
    let rate = vertex.rate();
    if !rate.is_finite() {
        return Ok(LpOutcome::Unbounded);
    }
    if !config.minimize_waste {
        return Ok(LpOutcome::Optimal(vertex));
    }

    let weights = &lp.waste_weights;
    let wasting = weights
        .iter()
        .any(|&(var, _)| vertex.values[var] > config.tolerance);
    if !wasting {
        return Ok(LpOutcome::Optimal(vertex));
    }

    tracing::debug!(rate, "re-solving to minimise weighted waste");
    let mut pinned = lp.equalities.clone();
    let mut row = Row::new();
    row.add(OBJECTIVE, 1.0);
    pinned.push(Equality { row, rhs: rate });

    match solver::solve(count, &pinned, inequalities, Objective::MinimizeWeighted(weights)) {
        Ok(LpOutcome::Optimal(secondary)) => Ok(LpOutcome::Optimal(secondary)),
        Ok(LpOutcome::Unbounded) | Err(_) => Err(AnalysisError::SecondaryFailed { rate }),
    }
}

/// Remove binding constraints one at a time, recording the rate each one
/// held the output at. Also returns the rate left once the loop stops:
/// infinite when it ended unbounded.
fn decompose(
    lp: &LinearProgram,
    first: &Vertex,
    config: &AnalysisConfig,
) -> Result<(Vec<(f64, Bottleneck)>, f64), AnalysisError> {
    let mut active = lp.inequalities.clone();
    let mut bottlenecks = Vec::new();
    let mut current = first.clone();

    loop {
        let Some(&index) = current.binding(config.tolerance).first() else {
            tracing::debug!(rate = current.rate(), "no binding constraint left");
            return Ok((bottlenecks, config.clean(current.rate())));
        };
        let removed = active.remove(index);
        tracing::debug!(
            rate = current.rate(),
            node = ?removed.bottleneck.node(),
            bottleneck = ?removed.bottleneck,
            "removing bottleneck"
        );
        bottlenecks.push((current.rate(), removed.bottleneck.clone()));

        match optimise(lp, &active, config) {
            Ok(LpOutcome::Optimal(next)) => current = next,
            Ok(LpOutcome::Unbounded) => return Ok((bottlenecks, f64::INFINITY)),
            Err(_) => return Err(AnalysisError::DecompositionFailed(removed.bottleneck)),
        }
    }
}

// ---------------------------------------------------------------------------
// Rate collection
// ---------------------------------------------------------------------------

fn collect_rates(lp: &LinearProgram, values: &[f64], config: &AnalysisConfig) -> Rates {
    let mut rates = Rates::default();
    for (id, flow) in &lp.source_flows {
        rates.sources.insert(*id, config.clean(flow.dot(values)));
    }
    for (line, flow) in &lp.buffer_flows {
        rates.buffers.insert(line.clone(), config.clean(flow.dot(values)));
    }
    for (id, var) in lp.layout.stations() {
        rates.stations.insert(id, config.clean(values[var]));
    }
    for (id, var) in lp.layout.wastes() {
        rates.wastes.insert(id, config.clean(values[var]));
    }
    rates
}

/// Every discovered entity runs without limit, except idle stations.
fn unbounded_rates(lp: &LinearProgram, subgraph: &Subgraph) -> Rates {
    let mut rates = Rates::default();
    for &id in &subgraph.sources {
        rates.sources.insert(id, f64::INFINITY);
    }
    for line in &subgraph.buffer_lines {
        rates.buffers.insert(line.clone(), f64::INFINITY);
    }
    for &id in &subgraph.stations {
        if !lp.idle_stations.contains(&id) {
            rates.stations.insert(id, f64::INFINITY);
        }
    }
    for &id in &subgraph.wastes {
        rates.wastes.insert(id, f64::INFINITY);
    }
    rates
}

// ---------------------------------------------------------------------------
// Network entry points
// ---------------------------------------------------------------------------

impl Network {
    /// Compute the maximum sustainable rate at `point`, the per-entity rates
    /// at that optimum, and the chain of constraints limiting it.
    pub fn analyse(&self, point: &OutputPoint) -> Result<SingleResult, AnalysisError> {
        self.validate_output_point(point)?;
        let config = self.config();

        let subgraph = search::discover(self, point.location, &point.material);
        tracing::debug!(
            sources = subgraph.sources.len(),
            stations = subgraph.stations.len(),
            buffer_lines = subgraph.buffer_lines.len(),
            transfers = subgraph.transfers.len(),
            wastes = subgraph.wastes.len(),
            "discovered subgraph"
        );

        let lp = lp::build(self, &subgraph, point);
        tracing::debug!(
            variables = lp.layout.variable_count(),
            equalities = lp.equalities.len(),
            inequalities = lp.inequalities.len(),
            idle_stations = lp.idle_stations.len(),
            "built linear program"
        );

        let vertex = match optimise(&lp, &lp.inequalities, config)? {
            LpOutcome::Optimal(vertex) => vertex,
            LpOutcome::Unbounded => {
                let mut rates = unbounded_rates(&lp, &subgraph);
                rates.finish(self);
                return Ok(SingleResult {
                    rate: f64::INFINITY,
                    rates,
                    bottlenecks: Vec::new(),
                    residual_rate: f64::INFINITY,
                });
            }
        };

        let (bottlenecks, residual_rate) = decompose(&lp, &vertex, config)?;
        let mut rates = collect_rates(&lp, &vertex.values, config);
        rates.finish(self);
        Ok(SingleResult {
            rate: config.clean(vertex.rate()),
            rates,
            bottlenecks,
            residual_rate,
        })
    }

    /// Analyse every registered output point independently.
    ///
    /// The aggregate rates are the key-wise maximum over all single results.
    pub fn full_analyse(&self) -> Result<AggregateResult, AnalysisError> {
        let singles = self.analyse_all()?;
        let mut rates = Rates::default();
        for (_, single) in &singles {
            rates.merge_max(&single.rates);
        }
        rates.finish(self);
        Ok(AggregateResult { rates, singles })
    }

    #[cfg(not(feature = "parallel"))]
    fn analyse_all(&self) -> Result<Vec<(OutputPoint, SingleResult)>, AnalysisError> {
        let total = self.output_points().len();
        self.output_points()
            .iter()
            .enumerate()
            .map(|(index, point)| {
                tracing::info!(index = index + 1, total, material = %point.material, "analysing output point");
                self.analyse(point).map(|result| (point.clone(), result))
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn analyse_all(&self) -> Result<Vec<(OutputPoint, SingleResult)>, AnalysisError> {
        use rayon::prelude::*;

        let total = self.output_points().len();
        self.output_points()
            .par_iter()
            .enumerate()
            .map(|(index, point)| {
                tracing::info!(index = index + 1, total, material = %point.material, "analysing output point");
                self.analyse(point).map(|result| (point.clone(), result))
            })
            .collect()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
