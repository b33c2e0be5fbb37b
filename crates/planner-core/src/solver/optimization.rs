//! Full-optimization single-day solver (§4.3 "full" mode).
//!
//! Seeds from the same savings construction as [`super::greedy`] — so a
//! full-mode solution can never be worse than the fast-mode one it started
//! from — then spends the remaining time budget on a wider local search:
//! 2-opt per route, relocate-between-routes, and insertion of still-
//! unassigned sites via the Hungarian algorithm (used here to find a good
//! initial pairing of unassigned sites to routes once both are small
//! enough to matrix out).

use std::time::Instant;

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use crate::oracle::TimeOracle;
use crate::types::Site;

use super::greedy::solve_greedy;
use super::{build_route, route_travel_minutes, SingleDaySolver, SolveOutput};

/// Matrices larger than this aren't worth the `O(n^3)` Hungarian solve within
/// a single-day planning deadline; relocate/insertion already covers them.
const MAX_ASSIGNMENT_SIZE: usize = 40;

#[derive(Debug, Default, Clone, Copy)]
pub struct OptimizingSolver;

impl SingleDaySolver for OptimizingSolver {
    fn solve_fixed_k(
        &self,
        sites: &[Site],
        service_minutes: &[i64],
        vehicles: usize,
        budget_minutes: i64,
        stop_cap: usize,
        oracle: &dyn TimeOracle,
        deadline: Option<Instant>,
    ) -> SolveOutput {
        let seed = solve_greedy(sites, service_minutes, vehicles, budget_minutes, stop_cap, oracle);
        let mut routes: Vec<Vec<usize>> = seed.routes.iter().map(|r| r.site_indices.clone()).collect();
        let mut unassigned = seed.unassigned;

        if routes.len() < vehicles {
            routes.resize(vehicles, Vec::new());
        }

        if unassigned.len() <= MAX_ASSIGNMENT_SIZE && !routes.is_empty() {
            assign_unassigned_via_hungarian(
                sites,
                service_minutes,
                &mut routes,
                &mut unassigned,
                budget_minutes,
                stop_cap,
                oracle,
            );
        }

        loop {
            if past_deadline(deadline) {
                break;
            }
            let improved_relocate = relocate_pass(
                sites,
                service_minutes,
                &mut routes,
                &mut unassigned,
                budget_minutes,
                stop_cap,
                oracle,
                deadline,
            );
            let improved_two_opt = two_opt_pass(sites, &mut routes, oracle, deadline);
            if !improved_relocate && !improved_two_opt {
                break;
            }
        }

        unassigned.sort_unstable();
        SolveOutput {
            routes: routes
                .into_iter()
                .filter(|r| !r.is_empty())
                .map(|stops| build_route(sites, service_minutes, stops, oracle))
                .collect(),
            unassigned,
        }
    }
}

fn past_deadline(deadline: Option<Instant>) -> bool {
    deadline.map(|d| Instant::now() >= d).unwrap_or(false)
}

fn route_minutes(sites: &[Site], service_minutes: &[i64], stops: &[usize], oracle: &dyn TimeOracle) -> i64 {
    route_travel_minutes(sites, stops, oracle) + stops.iter().map(|&i| service_minutes[i]).sum::<i64>()
}

/// Hungarian assignment of unassigned sites to the route whose end they best
/// extend. Only attempted when small enough to matrix out; `neg()` flips the
/// maximization the `pathfinding` crate solves for into our minimization.
fn assign_unassigned_via_hungarian(
    sites: &[Site],
    service_minutes: &[i64],
    routes: &mut [Vec<usize>],
    unassigned: &mut Vec<usize>,
    budget_minutes: i64,
    stop_cap: usize,
    oracle: &dyn TimeOracle,
) {
    if unassigned.is_empty() {
        return;
    }
    const SCALE: f64 = 1_000.0;
    const INFEASIBLE: i64 = -1_000_000_000_i64;

    struct Matrix(Vec<Vec<i64>>);
    impl Weights<i64> for Matrix {
        fn rows(&self) -> usize {
            self.0.len()
        }
        fn columns(&self) -> usize {
            self.0.first().map_or(0, |r| r.len())
        }
        fn at(&self, row: usize, col: usize) -> i64 {
            self.0[row][col]
        }
        fn neg(&self) -> Self {
            Matrix(self.0.iter().map(|r| r.iter().map(|&x| -x).collect()).collect())
        }
    }

    let n = unassigned.len();
    let m = routes.len();
    if m == 0 {
        return;
    }
    // kuhn_munkres requires rows <= columns; pad with infeasible dummy
    // columns when there are more unassigned sites than routes.
    let padded_m = m.max(n);
    let mut weights = vec![vec![INFEASIBLE; padded_m]; n];
    for (row, &site) in unassigned.iter().enumerate() {
        for (col, route) in routes.iter().enumerate() {
            if route.len() + 1 > stop_cap {
                continue;
            }
            let end = *route.last().unwrap_or(&site);
            let added_travel = if route.is_empty() {
                0.0
            } else {
                oracle.travel_minutes(sites[end].location(), sites[site].location())
            };
            let mut candidate = route.clone();
            candidate.push(site);
            if route_minutes(sites, service_minutes, &candidate, oracle) > budget_minutes {
                continue;
            }
            weights[row][col] = -((added_travel * SCALE).round() as i64);
        }
    }

    let (_, assignment) = kuhn_munkres(&Matrix(weights.clone()));
    let mut placed = Vec::new();
    for (row, &col) in assignment.iter().enumerate() {
        if col >= m || weights[row][col] == INFEASIBLE {
            continue;
        }
        routes[col].push(unassigned[row]);
        placed.push(unassigned[row]);
    }
    unassigned.retain(|site| !placed.contains(site));
}

/// One pass of moving a single site from its current route into whichever
/// route (or the unassigned pool, for still-unplaced sites) reduces total
/// travel, without breaking budget or stop-cap. Returns whether anything moved.
#[allow(clippy::too_many_arguments)]
fn relocate_pass(
    sites: &[Site],
    service_minutes: &[i64],
    routes: &mut [Vec<usize>],
    unassigned: &mut Vec<usize>,
    budget_minutes: i64,
    stop_cap: usize,
    oracle: &dyn TimeOracle,
    deadline: Option<Instant>,
) -> bool {
    let mut moved_any = false;

    let mut candidates: Vec<usize> = unassigned.clone();
    for route in routes.iter() {
        candidates.extend(route.iter().copied());
    }

    for &site in &candidates {
        if past_deadline(deadline) {
            break;
        }
        let origin_route = routes.iter().position(|r| r.contains(&site));
        let origin_cost_before = origin_route
            .map(|idx| route_minutes(sites, service_minutes, &routes[idx], oracle))
            .unwrap_or(0);

        let mut best: Option<(usize, Vec<usize>, i64)> = None; // (route_idx, new_stops, removed_cost_delta)

        for (idx, route) in routes.iter().enumerate() {
            if Some(idx) == origin_route {
                continue;
            }
            if route.len() + 1 > stop_cap {
                continue;
            }
            let mut candidate = route.clone();
            candidate.push(site);
            let new_cost = route_minutes(sites, service_minutes, &candidate, oracle);
            if new_cost > budget_minutes {
                continue;
            }
            let delta = new_cost - route_minutes(sites, service_minutes, route, oracle);
            let better = best.as_ref().map(|(_, _, d)| delta < *d).unwrap_or(true);
            if better {
                best = Some((idx, candidate, delta));
            }
        }

        if let Some((idx, candidate, delta)) = best {
            let origin_after = origin_route.map(|o| {
                let mut stops = routes[o].clone();
                stops.retain(|&s| s != site);
                route_minutes(sites, service_minutes, &stops, oracle)
            });
            let removal_savings = origin_after
                .map(|after| origin_cost_before - after)
                .unwrap_or(0);

            if delta < removal_savings || (origin_route.is_none() && delta < i64::MAX) {
                if let Some(o) = origin_route {
                    routes[o].retain(|&s| s != site);
                } else {
                    unassigned.retain(|&s| s != site);
                }
                routes[idx] = candidate;
                moved_any = true;
            }
        }
    }

    moved_any
}

fn two_opt_pass(
    sites: &[Site],
    routes: &mut [Vec<usize>],
    oracle: &dyn TimeOracle,
    deadline: Option<Instant>,
) -> bool {
    let mut improved_any = false;
    for route in routes.iter_mut() {
        if past_deadline(deadline) {
            break;
        }
        if route.len() < 4 {
            continue;
        }
        loop {
            let mut improved = false;
            let current = route_travel_minutes(sites, route, oracle);
            let n = route.len();
            'search: for i in 0..n - 1 {
                for j in (i + 2)..n {
                    route[i + 1..=j].reverse();
                    let candidate = route_travel_minutes(sites, route, oracle);
                    if candidate < current {
                        improved = true;
                        improved_any = true;
                        break 'search;
                    } else {
                        route[i + 1..=j].reverse();
                    }
                }
            }
            if !improved {
                break;
            }
        }
    }
    improved_any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::HaversineOracle;

    fn site(id: &str, lat: f64, lon: f64, service: i64) -> Site {
        Site {
            id: id.to_string(),
            lat,
            lon,
            service_minutes: Some(service),
            cluster_id: None,
            name: None,
            street: None,
            city: None,
            state: None,
        }
    }

    #[test]
    fn full_mode_is_never_worse_than_fast_mode() {
        let sites: Vec<Site> = (0..16)
            .map(|i| site(&format!("s{i}"), 30.0 + (i as f64 * 7.0 % 11.0) * 0.08, -90.0 + i as f64 * 0.05, 40))
            .collect();
        let service: Vec<i64> = sites.iter().map(|s| s.service_minutes.unwrap()).collect();
        let oracle = HaversineOracle;

        let fast = solve_greedy(&sites, &service, 3, 480, 8, &oracle);
        let full = OptimizingSolver.solve_fixed_k(&sites, &service, 3, 480, 8, &oracle, None);

        let fast_assigned: usize = fast.routes.iter().map(|r| r.site_indices.len()).sum();
        let full_assigned: usize = full.routes.iter().map(|r| r.site_indices.len()).sum();
        assert!(full_assigned >= fast_assigned);

        let fast_travel: i64 = fast.routes.iter().map(|r| r.travel_minutes).sum();
        let full_travel: i64 = full.routes.iter().map(|r| r.travel_minutes).sum();
        if full_assigned == fast_assigned {
            assert!(full_travel <= fast_travel);
        }
    }

    #[test]
    fn respects_deadline_without_panicking() {
        let sites: Vec<Site> = (0..20)
            .map(|i| site(&format!("s{i}"), 30.0 + i as f64 * 0.02, -90.0 + i as f64 * 0.02, 30))
            .collect();
        let service: Vec<i64> = sites.iter().map(|s| s.service_minutes.unwrap()).collect();
        let oracle = HaversineOracle;
        let deadline = Instant::now();
        let output = OptimizingSolver.solve_fixed_k(&sites, &service, 2, 480, 8, &oracle, Some(deadline));
        let assigned: usize = output.routes.iter().map(|r| r.site_indices.len()).sum();
        assert_eq!(assigned + output.unassigned.len(), sites.len());
    }

    #[test]
    fn respects_budget_and_stop_cap() {
        let sites: Vec<Site> = (0..15)
            .map(|i| site(&format!("s{i}"), 30.0 + i as f64 * 0.03, -90.0, 60))
            .collect();
        let service: Vec<i64> = sites.iter().map(|s| s.service_minutes.unwrap()).collect();
        let oracle = HaversineOracle;
        let output = OptimizingSolver.solve_fixed_k(&sites, &service, 3, 480, 5, &oracle, None);
        for route in &output.routes {
            assert!(route.site_indices.len() <= 5);
            assert!(route.total_minutes() <= 480);
        }
    }
}
