//! Sequential cluster planner (§4.5): fixed-crew mode with clustering
//! enabled. Crews move to a new cluster once their current one is exhausted,
//! so coverage is guaranteed even when `crews < clusters`.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::calendar_dates::WorkDays;
use crate::error::{progress_failure_recommendations, Outcome, PlanError, ProgressFailureContext};
use crate::oracle::TimeOracle;
use crate::scheduler::DEFAULT_STALL_THRESHOLD;
use crate::solver::{solve_day, SingleDaySolver};
use crate::types::{Site, TeamDay};

pub struct ClusterPlanOutput {
    pub team_days: Vec<TeamDay>,
}

/// Per-day assignment of free crews to the cluster with the most remaining
/// work (§4.5 step 1-2). Crews still tied to a non-empty cluster are left
/// alone; crews whose cluster just emptied, or that have none yet, are
/// reassigned, preferring a cluster no other crew currently holds.
fn assign_free_crews(
    current_cluster: &mut [Option<u32>],
    remaining_by_cluster: &HashMap<u32, Vec<usize>>,
) {
    let mut claimed: Vec<u32> = current_cluster
        .iter()
        .filter_map(|c| *c)
        .filter(|id| remaining_by_cluster.get(id).map(|v| !v.is_empty()).unwrap_or(false))
        .collect();

    for slot in current_cluster.iter_mut() {
        let still_active = slot.map(|id| remaining_by_cluster.get(&id).map(|v| !v.is_empty()).unwrap_or(false));
        if still_active == Some(true) {
            continue;
        }

        let mut candidates: Vec<(u32, usize)> = remaining_by_cluster
            .iter()
            .filter(|(_, sites)| !sites.is_empty())
            .map(|(&id, sites)| (id, sites.len()))
            .collect();

        candidates.sort_by(|a, b| {
            let a_unclaimed = !claimed.contains(&a.0);
            let b_unclaimed = !claimed.contains(&b.0);
            b_unclaimed
                .cmp(&a_unclaimed)
                .then(b.1.cmp(&a.1))
                .then(a.0.cmp(&b.0))
        });

        *slot = candidates.first().map(|(id, _)| {
            claimed.push(*id);
            *id
        });
    }
}

/// Runs the sequential cluster planner over an open-ended (or calendar-
/// bounded) work calendar. Per-cluster single-day solves run in parallel
/// (§5 "embarrassingly parallel", §12): distinct clusters share no sites.
#[allow(clippy::too_many_arguments)]
pub fn plan_clusters(
    sites: &[Site],
    service_minutes: &[i64],
    start: NaiveDate,
    end: Option<NaiveDate>,
    holidays: &HashSet<NaiveDate>,
    vehicles: usize,
    budget_minutes: i64,
    stop_cap: usize,
    minimize_crews: bool,
    oracle: &dyn TimeOracle,
    strategy: &dyn SingleDaySolver,
    deadline: Option<Instant>,
) -> Outcome<ClusterPlanOutput> {
    let mut remaining_by_cluster: HashMap<u32, Vec<usize>> = HashMap::new();
    for (idx, site) in sites.iter().enumerate() {
        let cluster_id = site
            .cluster_id
            .expect("validate() guarantees cluster_id when use_clusters is set");
        remaining_by_cluster.entry(cluster_id).or_default().push(idx);
    }

    let mut current_cluster: Vec<Option<u32>> = vec![None; vehicles];
    let mut team_days = Vec::new();
    let mut stall = 0u32;

    let day_iter: Box<dyn Iterator<Item = NaiveDate>> = match end {
        Some(end) => Box::new(WorkDays::bounded(start, end, holidays)),
        None => Box::new(WorkDays::from(start, holidays)),
    };

    for day in day_iter {
        if remaining_by_cluster.values().all(|v| v.is_empty()) {
            break;
        }

        assign_free_crews(&mut current_cluster, &remaining_by_cluster);

        let mut crews_per_cluster: HashMap<u32, Vec<usize>> = HashMap::new();
        for (crew_idx, slot) in current_cluster.iter().enumerate() {
            if let Some(cluster_id) = slot {
                crews_per_cluster.entry(*cluster_id).or_default().push(crew_idx);
            }
        }

        let solved: Vec<(u32, Vec<usize>, crate::solver::SolveOutput)> = crews_per_cluster
            .par_iter()
            .map(|(&cluster_id, crew_idxs)| {
                let today_indices = remaining_by_cluster[&cluster_id].clone();
                let subset_sites: Vec<Site> = today_indices.iter().map(|&i| sites[i].clone()).collect();
                let subset_service: Vec<i64> = today_indices.iter().map(|&i| service_minutes[i]).collect();
                let output = solve_day(
                    &subset_sites,
                    &subset_service,
                    crew_idxs.len(),
                    budget_minutes,
                    stop_cap,
                    minimize_crews,
                    oracle,
                    strategy,
                    deadline,
                );
                (cluster_id, today_indices, output)
            })
            .collect();

        let mut scheduled_today = 0usize;
        for (cluster_id, today_indices, output) in solved {
            let subset_sites: Vec<&Site> = today_indices.iter().map(|&i| &sites[i]).collect();
            let crew_idxs = &crews_per_cluster[&cluster_id];

            for (crew_slot, route) in crew_idxs.iter().zip(output.routes.iter()) {
                if route.site_indices.is_empty() {
                    continue;
                }
                scheduled_today += route.site_indices.len();
                team_days.push(TeamDay {
                    team_id: format!("team-{}", crew_slot + 1),
                    date: day,
                    cluster_id: Some(cluster_id),
                    site_ids: route
                        .site_indices
                        .iter()
                        .map(|&local| subset_sites[local].id.clone())
                        .collect(),
                    service_minutes: route.service_minutes,
                    route_minutes: route.total_minutes(),
                });
            }

            let assigned_today: HashSet<usize> = output
                .routes
                .iter()
                .flat_map(|r| r.site_indices.iter().map(|&local| today_indices[local]))
                .collect();
            remaining_by_cluster
                .get_mut(&cluster_id)
                .unwrap()
                .retain(|idx| !assigned_today.contains(idx));
        }

        let remaining_total: usize = remaining_by_cluster.values().map(Vec::len).sum();
        if scheduled_today == 0 && remaining_total > 0 {
            stall += 1;
            if stall >= DEFAULT_STALL_THRESHOLD {
                return Err(PlanError::ProgressFailure {
                    context: ProgressFailureContext {
                        sites_remaining: remaining_total,
                        sites_scheduled_today: 0,
                        unassigned: remaining_total,
                        consecutive_days: stall,
                        crews: vehicles,
                    },
                    recommendations: progress_failure_recommendations(),
                });
            }
        } else {
            stall = 0;
        }
    }

    let remaining_total: usize = remaining_by_cluster.values().map(Vec::len).sum();
    if remaining_total > 0 {
        return Err(PlanError::ProgressFailure {
            context: ProgressFailureContext {
                sites_remaining: remaining_total,
                sites_scheduled_today: 0,
                unassigned: remaining_total,
                consecutive_days: stall,
                crews: vehicles,
            },
            recommendations: progress_failure_recommendations(),
        });
    }

    Ok(ClusterPlanOutput { team_days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::HaversineOracle;
    use crate::solver::greedy::GreedySolver;

    fn site(id: &str, lat: f64, lon: f64, cluster_id: u32) -> Site {
        Site {
            id: id.to_string(),
            lat,
            lon,
            service_minutes: Some(60),
            cluster_id: Some(cluster_id),
            name: None,
            street: None,
            city: None,
            state: None,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn single_crew_visits_every_cluster_in_turn() {
        let sites = vec![
            site("a1", 30.0, -90.0, 0),
            site("a2", 30.01, -90.0, 0),
            site("b1", 35.0, -80.0, 1),
            site("b2", 35.01, -80.0, 1),
        ];
        let service = vec![60; 4];
        let holidays = HashSet::new();
        let oracle = HaversineOracle;
        let strategy = GreedySolver;

        let output = plan_clusters(
            &sites,
            &service,
            d(2026, 1, 5),
            None,
            &holidays,
            1,
            480,
            8,
            false,
            &oracle,
            &strategy,
            None,
        )
        .unwrap();

        let scheduled: usize = output.team_days.iter().map(|t| t.site_ids.len()).sum();
        assert_eq!(scheduled, 4);
        for team_day in &output.team_days {
            let cluster_id = team_day.cluster_id.unwrap();
            for site_id in &team_day.site_ids {
                let site = sites.iter().find(|s| &s.id == site_id).unwrap();
                assert_eq!(site.cluster_id, Some(cluster_id));
            }
        }
    }

    #[test]
    fn crew_never_mixes_clusters_within_a_day() {
        let sites = vec![
            site("a1", 30.0, -90.0, 0),
            site("b1", 35.0, -80.0, 1),
        ];
        let service = vec![60; 2];
        let holidays = HashSet::new();
        let oracle = HaversineOracle;
        let strategy = GreedySolver;

        let output = plan_clusters(
            &sites,
            &service,
            d(2026, 1, 5),
            None,
            &holidays,
            2,
            480,
            8,
            false,
            &oracle,
            &strategy,
            None,
        )
        .unwrap();

        for team_day in &output.team_days {
            let ids: HashSet<u32> = team_day
                .site_ids
                .iter()
                .map(|id| sites.iter().find(|s| &s.id == id).unwrap().cluster_id.unwrap())
                .collect();
            assert_eq!(ids.len(), 1);
        }
    }
}
