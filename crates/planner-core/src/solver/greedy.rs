//! Fast (greedy) single-day solver: savings-style construction + 2-opt (§4.3).
//!
//! Classic savings merge (`s(i,j) = t(depot,i) + t(depot,j) - t(i,j)`) needs a
//! depot; routes here have none (§4.3: "crews stage from the first stop").
//! We substitute a virtual depot — the centroid of today's sites — purely as
//! a reference point for ranking merge candidates; it never appears in an
//! output route. This keeps the rest of the savings/2-opt machinery intact.

use std::time::Instant;

use crate::geo::centroid;
use crate::oracle::TimeOracle;
use crate::types::Site;

use super::{build_route, route_travel_minutes, SingleDaySolver, SolveOutput};

#[derive(Debug, Default, Clone, Copy)]
pub struct GreedySolver;

struct Route {
    stops: Vec<usize>,
}

impl Route {
    fn total_minutes(&self, sites: &[Site], service_minutes: &[i64], oracle: &dyn TimeOracle) -> i64 {
        route_travel_minutes(sites, &self.stops, oracle)
            + self.stops.iter().map(|&i| service_minutes[i]).sum::<i64>()
    }
}

impl SingleDaySolver for GreedySolver {
    fn solve_fixed_k(
        &self,
        sites: &[Site],
        service_minutes: &[i64],
        vehicles: usize,
        budget_minutes: i64,
        stop_cap: usize,
        oracle: &dyn TimeOracle,
        _deadline: Option<Instant>,
    ) -> SolveOutput {
        solve_greedy(sites, service_minutes, vehicles, budget_minutes, stop_cap, oracle)
    }
}

pub(crate) fn solve_greedy(
    sites: &[Site],
    service_minutes: &[i64],
    vehicles: usize,
    budget_minutes: i64,
    stop_cap: usize,
    oracle: &dyn TimeOracle,
) -> SolveOutput {
    let n = sites.len();
    if n == 0 || vehicles == 0 {
        return SolveOutput {
            routes: Vec::new(),
            unassigned: (0..n).collect(),
        };
    }

    let mut routes: Vec<Route> = Vec::new();
    let mut unassigned: Vec<usize> = Vec::new();
    for (i, &service) in service_minutes.iter().enumerate().take(n) {
        if service > budget_minutes {
            unassigned.push(i);
        } else {
            routes.push(Route { stops: vec![i] });
        }
    }

    let depot = centroid(&sites.iter().map(Site::location).collect::<Vec<_>>());

    // Savings-ranked merge: recompute the candidate list each round (route
    // set shrinks every merge, so this stays cheap for field-service-sized
    // instances) and apply the single best legal merge.
    loop {
        let mut best: Option<(usize, usize, f64, Vec<usize>)> = None; // (i, j, savings, merged_stops)

        for i in 0..routes.len() {
            for j in (i + 1)..routes.len() {
                let a_start = sites[routes[i].stops[0]].location();
                let a_end = sites[*routes[i].stops.last().unwrap()].location();
                let b_start = sites[routes[j].stops[0]].location();
                let b_end = sites[*routes[j].stops.last().unwrap()].location();

                let savings = oracle.travel_minutes(depot, a_end)
                    + oracle.travel_minutes(depot, b_start)
                    - oracle.travel_minutes(a_end, b_start);

                for (savings, merged) in [
                    (savings, concat(&routes[i].stops, &routes[j].stops)),
                    (
                        oracle.travel_minutes(depot, b_end) + oracle.travel_minutes(depot, a_start)
                            - oracle.travel_minutes(b_end, a_start),
                        concat(&routes[j].stops, &routes[i].stops),
                    ),
                ] {
                    if merged.len() > stop_cap {
                        continue;
                    }
                    let candidate = Route { stops: merged.clone() };
                    if candidate.total_minutes(sites, service_minutes, oracle) > budget_minutes {
                        continue;
                    }
                    let better = best.as_ref().map(|(_, _, s, _)| savings > *s).unwrap_or(true);
                    if better {
                        best = Some((i, j, savings, merged));
                    }
                }
            }
        }

        match best {
            Some((i, j, _, merged)) => {
                routes[i].stops = merged;
                routes.remove(j);
            }
            None => break,
        }
    }

    // Force routes down to `vehicles` by merging smallest-first, else
    // dropping the smallest remaining route to unassigned.
    while routes.len() > vehicles {
        routes.sort_by_key(|r| r.stops.len());
        let mut merged_any = false;
        'outer: for i in 0..routes.len() {
            for j in (i + 1)..routes.len() {
                let merged = concat(&routes[i].stops, &routes[j].stops);
                if merged.len() > stop_cap {
                    continue;
                }
                let candidate = Route { stops: merged.clone() };
                if candidate.total_minutes(sites, service_minutes, oracle) <= budget_minutes {
                    routes[i].stops = merged;
                    routes.remove(j);
                    merged_any = true;
                    break 'outer;
                }
            }
        }
        if !merged_any {
            let dropped = routes.remove(0);
            unassigned.extend(dropped.stops);
        }
    }

    for route in &mut routes {
        two_opt(route, sites, service_minutes, oracle, budget_minutes);
    }

    unassigned.sort_unstable();
    SolveOutput {
        routes: routes
            .into_iter()
            .map(|r| build_route(sites, service_minutes, r.stops, oracle))
            .collect(),
        unassigned,
    }
}

fn concat(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Reverse sub-sequences while route travel time strictly decreases (§4.3).
fn two_opt(
    route: &mut Route,
    sites: &[Site],
    service_minutes: &[i64],
    oracle: &dyn TimeOracle,
    _budget_minutes: i64,
) {
    if route.stops.len() < 4 {
        return;
    }
    let n = route.stops.len();
    loop {
        let mut improved = false;
        let current = route_travel_minutes(sites, &route.stops, oracle);
        for i in 0..n - 1 {
            for j in (i + 2)..n {
                route.stops[i + 1..=j].reverse();
                let candidate = route_travel_minutes(sites, &route.stops, oracle);
                if candidate < current {
                    improved = true;
                    break;
                } else {
                    route.stops[i + 1..=j].reverse();
                }
            }
            if improved {
                break;
            }
        }
        if !improved {
            break;
        }
    }
    let _ = service_minutes;
}
