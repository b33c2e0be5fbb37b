//! Single-day VRP solver (§4.3): fixed `K` vehicles, `N` sites, one day.
//!
//! Two interchangeable strategies share one contract — [`SingleDaySolver`] —
//! so higher layers (the multi-day scheduler, the sequential cluster
//! planner) depend on the capability, not the concrete variant, the same
//! way a `RouteProvider` trait lets callers swap backends behind a
//! `Box<dyn Trait>`.

pub mod greedy;
pub mod optimization;

use std::time::Instant;

use crate::oracle::TimeOracle;
use crate::types::Site;

/// One vehicle's route for the day: an ordered slice of indices into the
/// `sites` array passed to [`solve_day`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub site_indices: Vec<usize>,
    pub service_minutes: i64,
    pub travel_minutes: i64,
}

impl RouteResult {
    pub fn total_minutes(&self) -> i64 {
        self.service_minutes + self.travel_minutes
    }
}

/// Result of solving one day for a fixed vehicle count.
#[derive(Debug, Clone)]
pub struct SolveOutput {
    pub routes: Vec<RouteResult>,
    pub unassigned: Vec<usize>,
}

impl SolveOutput {
    fn assigned_count(&self) -> usize {
        self.routes.iter().map(|r| r.site_indices.len()).sum()
    }

    /// Total travel minutes across all routes — the objective §4.3 minimizes.
    fn total_travel_minutes(&self) -> i64 {
        self.routes.iter().map(|r| r.travel_minutes).sum()
    }

    /// Largest single route time, for tie-breaking (§4.3 "smaller max-route time").
    fn max_route_minutes(&self) -> i64 {
        self.routes.iter().map(|r| r.total_minutes()).max().unwrap_or(0)
    }

    /// Variance of route time across vehicles, for tie-breaking.
    fn route_time_variance(&self) -> f64 {
        if self.routes.is_empty() {
            return 0.0;
        }
        let times: Vec<f64> = self.routes.iter().map(|r| r.total_minutes() as f64).collect();
        let mean = times.iter().sum::<f64>() / times.len() as f64;
        times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / times.len() as f64
    }
}

/// Strategy implemented by both the fast and full-optimization solvers.
///
/// `solve_fixed_k` builds (up to) `vehicles` routes over every site in
/// `sites[..]`, honoring `budget_minutes` and `stop_cap` per route; any site
/// that cannot be placed is reported in [`SolveOutput::unassigned`] rather
/// than causing a failure (§4.3 "never throws for infeasibility").
pub trait SingleDaySolver: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn solve_fixed_k(
        &self,
        sites: &[Site],
        service_minutes: &[i64],
        vehicles: usize,
        budget_minutes: i64,
        stop_cap: usize,
        oracle: &dyn TimeOracle,
        deadline: Option<Instant>,
    ) -> SolveOutput;
}

/// Travel time for visiting `site_indices` in order (sum of pairwise legs).
pub(crate) fn route_travel_minutes(
    sites: &[Site],
    site_indices: &[usize],
    oracle: &dyn TimeOracle,
) -> i64 {
    site_indices
        .windows(2)
        .map(|pair| oracle.travel_minutes(sites[pair[0]].location(), sites[pair[1]].location()).round() as i64)
        .sum()
}

pub(crate) fn route_service_minutes(site_indices: &[usize], service_minutes: &[i64]) -> i64 {
    site_indices.iter().map(|&i| service_minutes[i]).sum()
}

pub(crate) fn build_route(
    sites: &[Site],
    service_minutes: &[i64],
    site_indices: Vec<usize>,
    oracle: &dyn TimeOracle,
) -> RouteResult {
    let travel_minutes = route_travel_minutes(sites, &site_indices, oracle);
    let service = route_service_minutes(&site_indices, service_minutes);
    RouteResult {
        site_indices,
        service_minutes: service,
        travel_minutes,
    }
}

/// Entry point: drives [`SingleDaySolver::solve_fixed_k`], implementing
/// `minimize_crews` (§4.3) by probing `K = 1, 2, ..., vehicles` and stopping
/// at the first fully-assigned solution, and the tie-breaking rule (§4.3)
/// when a caller needs to pick among equally-good outputs is exposed via
/// [`better_or_equal`] for multi-candidate callers (the cluster planner).
#[allow(clippy::too_many_arguments)]
pub fn solve_day(
    sites: &[Site],
    service_minutes: &[i64],
    vehicles: usize,
    budget_minutes: i64,
    stop_cap: usize,
    minimize_crews: bool,
    oracle: &dyn TimeOracle,
    strategy: &dyn SingleDaySolver,
    deadline: Option<Instant>,
) -> SolveOutput {
    if sites.is_empty() {
        return SolveOutput {
            routes: Vec::new(),
            unassigned: Vec::new(),
        };
    }

    if !minimize_crews {
        return strategy.solve_fixed_k(
            sites,
            service_minutes,
            vehicles,
            budget_minutes,
            stop_cap,
            oracle,
            deadline,
        );
    }

    let mut best: Option<SolveOutput> = None;
    for k in 1..=vehicles {
        let attempt = strategy.solve_fixed_k(
            sites,
            service_minutes,
            k,
            budget_minutes,
            stop_cap,
            oracle,
            deadline,
        );
        let fully_assigned = attempt.unassigned.is_empty();
        let is_better = best
            .as_ref()
            .map(|b| attempt.assigned_count() > b.assigned_count())
            .unwrap_or(true);
        if is_better {
            best = Some(attempt);
        }
        if fully_assigned {
            break;
        }
    }
    best.expect("vehicles >= 1 guarantees at least one attempt")
}

/// Tie-break comparator (§4.3): smaller total travel, then smaller max-route
/// time, then smaller route-time variance. Returns `true` if `candidate` is
/// strictly better than `incumbent`.
pub fn is_better(candidate: &SolveOutput, incumbent: &SolveOutput) -> bool {
    let c_travel = candidate.total_travel_minutes();
    let i_travel = incumbent.total_travel_minutes();
    if c_travel != i_travel {
        return c_travel < i_travel;
    }
    let c_max = candidate.max_route_minutes();
    let i_max = incumbent.max_route_minutes();
    if c_max != i_max {
        return c_max < i_max;
    }
    candidate.route_time_variance() < incumbent.route_time_variance()
}
