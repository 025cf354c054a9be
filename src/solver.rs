//! Visiting-order search over a travel-time matrix.
//!
//! Both searches look for an open Hamiltonian path: every location is
//! visited once and the route does not return to its start. The exhaustive
//! search is exact but factorial, so it is guarded by a size ceiling and an
//! optional time budget. The nearest-neighbour heuristic is O(N³).

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlannerError, PlannerResult};

/// Permutations enumerated between time-budget checks.
const BUDGET_CHECK_INTERVAL: u64 = 4096;

/// Square travel-time matrix, validated on construction.
///
/// Diagonal entries are kept as supplied but never used as edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u32>>", into = "Vec<Vec<u32>>")]
pub struct DistanceMatrix {
    rows: Vec<Vec<u32>>,
}

impl DistanceMatrix {
    /// Fails fast on an empty or non-square matrix.
    pub fn new(rows: Vec<Vec<u32>>) -> PlannerResult<Self> {
        if rows.is_empty() {
            return Err(PlannerError::ContractViolation(
                "distance matrix is empty".to_string(),
            ));
        }
        let n = rows.len();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(PlannerError::ContractViolation(format!(
                "distance matrix is not square: row {index} has {} entries, expected {n}",
                row.len()
            )));
        }
        Ok(Self { rows })
    }

    /// Number of locations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false: construction rejects empty matrices.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cost(&self, from: usize, to: usize) -> u32 {
        self.rows[from][to]
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    /// Total cost of following `order` without returning to the start.
    pub fn path_cost(&self, order: &[usize]) -> u64 {
        order
            .windows(2)
            .map(|pair| u64::from(self.cost(pair[0], pair[1])))
            .sum()
    }
}

impl TryFrom<Vec<Vec<u32>>> for DistanceMatrix {
    type Error = PlannerError;

    fn try_from(rows: Vec<Vec<u32>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<DistanceMatrix> for Vec<Vec<u32>> {
    fn from(matrix: DistanceMatrix) -> Self {
        matrix.rows
    }
}

/// A full visiting order and its accumulated cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub order: Vec<usize>,
    pub cost: u64,
}

impl Route {
    fn single() -> Self {
        Self {
            order: vec![0],
            cost: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStrategy {
    Exhaustive,
    Heuristic,
    /// Exhaustive up to the size ceiling, heuristic above it.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    pub strategy: SolveStrategy,
    /// Largest location count the exhaustive search accepts.
    pub max_exhaustive_locations: usize,
    /// Wall-clock budget for one exhaustive search.
    pub time_limit: Option<Duration>,
    /// Spread independent subproblems over the rayon pool.
    pub parallel: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            strategy: SolveStrategy::Auto,
            max_exhaustive_locations: 10,
            time_limit: None,
            parallel: true,
        }
    }
}

/// Runs the configured strategy; also reports which search actually ran.
pub fn solve(matrix: &DistanceMatrix, options: &SolveOptions) -> PlannerResult<(Route, SolveStrategy)> {
    let strategy = match options.strategy {
        SolveStrategy::Auto if matrix.len() <= options.max_exhaustive_locations => {
            SolveStrategy::Exhaustive
        }
        SolveStrategy::Auto => SolveStrategy::Heuristic,
        other => other,
    };
    let route = match strategy {
        SolveStrategy::Heuristic => heuristic(matrix, options),
        _ => exhaustive(matrix, options)?,
    };
    Ok((route, strategy))
}

/// Exact search over every permutation.
///
/// Permutations are visited in lexicographic order and the first one
/// reaching the minimum cost wins, whether or not the search runs in
/// parallel.
pub fn exhaustive(matrix: &DistanceMatrix, options: &SolveOptions) -> PlannerResult<Route> {
    let n = matrix.len();
    if n == 1 {
        return Ok(Route::single());
    }
    if n > options.max_exhaustive_locations {
        return Err(PlannerError::SearchTooLarge {
            locations: n,
            limit: options.max_exhaustive_locations,
        });
    }

    let started = Instant::now();
    let deadline = options.time_limit.map(|limit| started + limit);
    let subtree = |first: usize| best_with_first(matrix, first, deadline, started);

    // Each subtree holds the lexicographic block of permutations starting
    // with `first`, so keeping the lowest `first` among ties preserves order.
    let subtrees: Vec<Route> = if options.parallel {
        (0..n).into_par_iter().map(subtree).collect::<PlannerResult<_>>()?
    } else {
        (0..n).map(subtree).collect::<PlannerResult<_>>()?
    };
    let best = subtrees
        .into_iter()
        .reduce(|best, candidate| if candidate.cost < best.cost { candidate } else { best })
        .ok_or_else(|| PlannerError::ContractViolation("no permutations enumerated".to_string()))?;

    info!(
        locations = n,
        cost = best.cost,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "exhaustive search finished"
    );
    Ok(best)
}

fn best_with_first(
    matrix: &DistanceMatrix,
    first: usize,
    deadline: Option<Instant>,
    started: Instant,
) -> PlannerResult<Route> {
    let mut rest: Vec<usize> = (0..matrix.len()).filter(|&i| i != first).collect();
    let mut order = Vec::with_capacity(matrix.len());
    let mut best: Option<Route> = None;
    let mut enumerated: u64 = 0;

    loop {
        order.clear();
        order.push(first);
        order.extend_from_slice(&rest);
        let cost = matrix.path_cost(&order);
        if best.as_ref().is_none_or(|route| cost < route.cost) {
            best = Some(Route {
                order: order.clone(),
                cost,
            });
        }

        enumerated += 1;
        if enumerated % BUDGET_CHECK_INTERVAL == 0 {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(PlannerError::SearchTimedOut {
                        elapsed: started.elapsed(),
                    });
                }
            }
        }

        if !next_permutation(&mut rest) {
            break;
        }
    }

    debug!(first, enumerated, "exhaustive subtree done");
    best.ok_or_else(|| PlannerError::ContractViolation("empty permutation subtree".to_string()))
}

/// Advances `items` to the next lexicographic permutation; false at the last.
fn next_permutation(items: &mut [usize]) -> bool {
    let Some(pivot) = items.windows(2).rposition(|pair| pair[0] < pair[1]) else {
        return false;
    };
    let Some(successor) = items.iter().rposition(|&item| item > items[pivot]) else {
        return false;
    };
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}

/// Nearest-neighbour search from every start; keeps the cheapest.
///
/// From the current location the cheapest unvisited destination is taken,
/// lowest index first among equal costs. Visited locations are never
/// candidates again, and neither is the current location itself.
pub fn heuristic(matrix: &DistanceMatrix, options: &SolveOptions) -> Route {
    let n = matrix.len();
    if n == 1 {
        return Route::single();
    }

    let started = Instant::now();
    let walk = |start: usize| nearest_neighbour_from(matrix, start);
    let routes: Vec<Route> = if options.parallel {
        (0..n).into_par_iter().map(walk).collect()
    } else {
        (0..n).map(walk).collect()
    };

    // Earliest start wins among equal totals.
    let best = routes
        .into_iter()
        .reduce(|best, candidate| if candidate.cost < best.cost { candidate } else { best })
        .unwrap_or_else(Route::single);

    info!(
        locations = n,
        cost = best.cost,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "heuristic search finished"
    );
    best
}

fn nearest_neighbour_from(matrix: &DistanceMatrix, start: usize) -> Route {
    let n = matrix.len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut cost: u64 = 0;
    let mut current = start;

    visited[current] = true;
    order.push(current);
    while order.len() < n {
        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by_key(|&j| (matrix.cost(current, j), j));
        let Some(next) = next else { break };
        cost += u64::from(matrix.cost(current, next));
        visited[next] = true;
        order.push(next);
        current = next;
    }

    Route { order, cost }
}
