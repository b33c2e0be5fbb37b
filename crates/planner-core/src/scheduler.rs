//! Multi-day scheduler (§4.4): drives the single-day solver across a work
//! calendar until every site is placed, detecting when it's stuck.

use std::collections::HashSet;
use std::time::Instant;

use chrono::NaiveDate;

use crate::calendar_dates::WorkDays;
use crate::error::{progress_failure_recommendations, Outcome, PlanError, ProgressFailureContext};
use crate::geo::{centroid, distance_miles};
use crate::oracle::TimeOracle;
use crate::solver::{solve_day, SingleDaySolver};
use crate::types::{Site, TeamDay};

/// Consecutive zero-progress work days before the loop gives up (§4.4).
pub const DEFAULT_STALL_THRESHOLD: u32 = 5;

pub struct ScheduleOutput {
    pub team_days: Vec<TeamDay>,
    /// Non-empty only when `tolerate_stall` let the loop stop early.
    pub unassigned_site_ids: Vec<String>,
}

/// Greedily pick up to `cap` of `remaining` closest to the remaining set's
/// centroid, so each day's subset is geographically coherent (§4.4 "nearest-
/// cluster-centroid greedy").
fn select_for_today(remaining: &[usize], sites: &[Site], cap: usize) -> Vec<usize> {
    if remaining.len() <= cap {
        return remaining.to_vec();
    }
    let locations: Vec<_> = remaining.iter().map(|&i| sites[i].location()).collect();
    let center = centroid(&locations);
    let mut ranked = remaining.to_vec();
    ranked.sort_by(|&a, &b| {
        distance_miles(sites[a].location(), center)
            .partial_cmp(&distance_miles(sites[b].location(), center))
            .unwrap()
    });
    ranked.truncate(cap);
    ranked
}

/// Runs the multi-day loop. `end` bounds the calendar (fixed-calendar mode);
/// `None` means open-ended (fixed-crew mode). When `tolerate_stall` is set, a
/// stalled loop returns `Ok` with the leftover sites reported as unassigned
/// (§7 `PartialPlan`) instead of raising [`PlanError::ProgressFailure`] —
/// the calendar planner always passes `false` so it can retry with more crews.
#[allow(clippy::too_many_arguments)]
pub fn schedule(
    sites: &[Site],
    service_minutes: &[i64],
    start: NaiveDate,
    end: Option<NaiveDate>,
    holidays: &HashSet<NaiveDate>,
    vehicles: usize,
    budget_minutes: i64,
    stop_cap: usize,
    minimize_crews: bool,
    tolerate_stall: bool,
    oracle: &dyn TimeOracle,
    strategy: &dyn SingleDaySolver,
    deadline: Option<Instant>,
) -> Outcome<ScheduleOutput> {
    let mut remaining: Vec<usize> = (0..sites.len()).collect();
    let mut team_days = Vec::new();
    let mut stall = 0u32;
    let cap = vehicles.saturating_mul(stop_cap).max(1);

    let day_iter: Box<dyn Iterator<Item = NaiveDate>> = match end {
        Some(end) => Box::new(WorkDays::bounded(start, end, holidays)),
        None => Box::new(WorkDays::from(start, holidays)),
    };

    for day in day_iter {
        if remaining.is_empty() {
            break;
        }

        let today_indices = select_for_today(&remaining, sites, cap);
        let subset_sites: Vec<Site> = today_indices.iter().map(|&i| sites[i].clone()).collect();
        let subset_service: Vec<i64> = today_indices.iter().map(|&i| service_minutes[i]).collect();

        let output = solve_day(
            &subset_sites,
            &subset_service,
            vehicles,
            budget_minutes,
            stop_cap,
            minimize_crews,
            oracle,
            strategy,
            deadline,
        );

        let scheduled_today: usize = output.routes.iter().map(|r| r.site_indices.len()).sum();

        for (team_idx, route) in output.routes.iter().enumerate() {
            if route.site_indices.is_empty() {
                continue;
            }
            team_days.push(TeamDay {
                team_id: format!("team-{}", team_idx + 1),
                date: day,
                cluster_id: None,
                site_ids: route
                    .site_indices
                    .iter()
                    .map(|&local| subset_sites[local].id.clone())
                    .collect(),
                service_minutes: route.service_minutes,
                route_minutes: route.total_minutes(),
            });
        }

        let assigned_global: HashSet<usize> = output
            .routes
            .iter()
            .flat_map(|r| r.site_indices.iter().map(|&local| today_indices[local]))
            .collect();
        remaining.retain(|idx| !assigned_global.contains(idx));

        if scheduled_today == 0 && !remaining.is_empty() {
            stall += 1;
            if stall >= DEFAULT_STALL_THRESHOLD {
                return stalled_result(sites, &remaining, team_days, stall, vehicles, tolerate_stall);
            }
        } else {
            stall = 0;
        }
    }

    if !remaining.is_empty() {
        return stalled_result(sites, &remaining, team_days, stall, vehicles, tolerate_stall);
    }

    Ok(ScheduleOutput {
        team_days,
        unassigned_site_ids: Vec::new(),
    })
}

fn stalled_result(
    sites: &[Site],
    remaining: &[usize],
    team_days: Vec<TeamDay>,
    consecutive_days: u32,
    crews: usize,
    tolerate_stall: bool,
) -> Outcome<ScheduleOutput> {
    if tolerate_stall {
        return Ok(ScheduleOutput {
            team_days,
            unassigned_site_ids: remaining.iter().map(|&i| sites[i].id.clone()).collect(),
        });
    }
    Err(PlanError::ProgressFailure {
        context: ProgressFailureContext {
            sites_remaining: remaining.len(),
            sites_scheduled_today: 0,
            unassigned: remaining.len(),
            consecutive_days,
            crews,
        },
        recommendations: progress_failure_recommendations(),
    })
}
