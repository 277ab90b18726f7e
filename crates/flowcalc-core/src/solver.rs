//! Adapter over the `minilp` simplex solver.
//!
//! Every variable is bounded to `[0, inf)`. Rows whose coefficients all
//! cancel are not handed to the solver, but their slack is still reported so
//! callers can index slack by inequality position. An [`LpOutcome::Optimal`]
//! vertex always has finite values.

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};

use crate::lp::{Equality, Inequality, OBJECTIVE};

/// What to optimise.
#[derive(Debug, Clone, Copy)]
pub enum Objective<'a> {
    /// Maximise the extraction-rate variable.
    MaximizeOutput,
    /// Minimise `sum(weight * x[var])` over the given `(var, weight)` pairs.
    MinimizeWeighted(&'a [(usize, f64)]),
}

/// An optimal vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Primal values indexed like the variable layout.
    pub values: Vec<f64>,
    /// `bound - row . x` per inequality, in input order.
    pub slack: Vec<f64>,
}

impl Vertex {
    /// The extraction rate at this vertex.
    pub fn rate(&self) -> f64 {
        self.values.get(OBJECTIVE).copied().unwrap_or(0.0)
    }

    /// Indices of inequalities whose slack is below `tolerance`.
    pub fn binding(&self, tolerance: f64) -> Vec<usize> {
        self.slack
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s < tolerance)
            .map(|(i, _)| i)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal(Vertex),
    /// The objective grows without limit.
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("linear program is infeasible")]
    Infeasible,
}

fn expr(vars: &[Variable], terms: &[(usize, f64)]) -> LinearExpr {
    let mut expr = LinearExpr::empty();
    for &(var, coeff) in terms {
        if coeff != 0.0 {
            if let Some(&v) = vars.get(var) {
                expr.add(v, coeff);
            }
        }
    }
    expr
}

/// Solve `objective` over `variable_count` non-negative variables subject to
/// `equalities` and `inequalities`.
pub fn solve(
    variable_count: usize,
    equalities: &[Equality],
    inequalities: &[Inequality],
    objective: Objective<'_>,
) -> Result<LpOutcome, SolveError> {
    let mut costs = vec![0.0; variable_count];
    let direction = match objective {
        Objective::MaximizeOutput => {
            if let Some(c) = costs.get_mut(OBJECTIVE) {
                *c = 1.0;
            }
            OptimizationDirection::Maximize
        }
        Objective::MinimizeWeighted(weights) => {
            for &(var, weight) in weights {
                if let Some(c) = costs.get_mut(var) {
                    *c += weight;
                }
            }
            OptimizationDirection::Minimize
        }
    };

    let mut problem = Problem::new(direction);
    let vars: Vec<Variable> = costs
        .iter()
        .map(|&cost| problem.add_var(cost, (0.0, f64::INFINITY)))
        .collect();

    for equality in equalities.iter().filter(|e| !e.row.is_empty()) {
        problem.add_constraint(expr(&vars, equality.row.terms()), ComparisonOp::Eq, equality.rhs);
    }
    for inequality in inequalities.iter().filter(|i| !i.row.is_empty()) {
        problem.add_constraint(expr(&vars, inequality.row.terms()), ComparisonOp::Le, inequality.bound);
    }

    match problem.solve() {
        Ok(solution) => {
            let values: Vec<f64> = vars.iter().map(|&v| solution[v]).collect();
            // minilp can report an unbounded ray as an "optimal" infinite vertex.
            if !solution.objective().is_finite() || values.iter().any(|v| !v.is_finite()) {
                return Ok(LpOutcome::Unbounded);
            }
            let slack = inequalities.iter().map(|i| i.slack(&values)).collect();
            Ok(LpOutcome::Optimal(Vertex { values, slack }))
        }
        Err(minilp::Error::Unbounded) => Ok(LpOutcome::Unbounded),
        Err(_) => Err(SolveError::Infeasible),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::Row;
    use crate::result::Bottleneck;
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    fn cap(var: usize, bound: f64) -> Inequality {
        let mut map: SlotMap<crate::id::NodeId, ()> = SlotMap::with_key();
        let mut row = Row::new();
        row.add(var, 1.0);
        Inequality {
            row,
            bound,
            bottleneck: Bottleneck::StationCap { station: map.insert(()) },
        }
    }

    fn equal(a: usize, b: usize, ratio: f64) -> Equality {
        let mut row = Row::new();
        row.add(a, 1.0);
        row.add(b, -ratio);
        Equality { row, rhs: 0.0 }
    }

    #[test]
    fn maximises_under_cap() {
        let outcome = solve(2, &[equal(0, 1, 2.0)], &[cap(1, 3.0)], Objective::MaximizeOutput).unwrap();
        let LpOutcome::Optimal(vertex) = outcome else {
            panic!("expected an optimum");
        };
        assert_relative_eq!(vertex.rate(), 6.0, epsilon = 1e-9);
        assert_eq!(vertex.binding(1e-9), vec![0]);
    }

    #[test]
    fn missing_cap_is_unbounded() {
        let outcome = solve(2, &[equal(0, 1, 1.0)], &[], Objective::MaximizeOutput).unwrap();
        assert_eq!(outcome, LpOutcome::Unbounded);
    }

    #[test]
    fn uncapped_side_flow_is_unbounded() {
        // x0 = x1, x2 = x1 and only x0 appears in the objective.
        let outcome = solve(
            3,
            &[equal(0, 1, 1.0), equal(2, 1, 1.0)],
            &[],
            Objective::MaximizeOutput,
        )
        .unwrap();
        assert_eq!(outcome, LpOutcome::Unbounded);
    }

    #[test]
    fn empty_rows_keep_their_slack_slot() {
        let mut empty = cap(1, 4.0);
        empty.row = Row::new();
        let outcome = solve(2, &[equal(0, 1, 1.0)], &[empty, cap(0, 2.0)], Objective::MaximizeOutput).unwrap();
        let LpOutcome::Optimal(vertex) = outcome else {
            panic!("expected an optimum");
        };
        assert_eq!(vertex.slack.len(), 2);
        assert_relative_eq!(vertex.slack[0], 4.0);
        assert_eq!(vertex.binding(1e-9), vec![1]);
    }

    #[test]
    fn weighted_minimisation_prefers_cheap_variable() {
        // x0 = x1 + x2 = 5, x1 costs 1, x2 costs 5.
        let mut split = Row::new();
        split.add(0, 1.0);
        split.add(1, -1.0);
        split.add(2, -1.0);
        let mut pin = Row::new();
        pin.add(0, 1.0);
        let equalities = [Equality { row: split, rhs: 0.0 }, Equality { row: pin, rhs: 5.0 }];
        let weights = [(1, 1.0), (2, 5.0)];
        let outcome = solve(3, &equalities, &[], Objective::MinimizeWeighted(&weights)).unwrap();
        let LpOutcome::Optimal(vertex) = outcome else {
            panic!("expected an optimum");
        };
        assert_relative_eq!(vertex.values[1], 5.0, epsilon = 1e-9);
        assert_relative_eq!(vertex.values[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn contradictory_system_is_infeasible() {
        let mut pin = Row::new();
        pin.add(0, 1.0);
        let equalities = [Equality { row: pin, rhs: 5.0 }];
        assert_eq!(
            solve(1, &equalities, &[cap(0, 1.0)], Objective::MaximizeOutput),
            Err(SolveError::Infeasible)
        );
    }
}
