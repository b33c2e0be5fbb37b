//! Orchestrator (§4.7): a single `plan()` entry point that dispatches a
//! request to the right planning mode.

use std::time::{Duration, Instant};

use chrono::Local;

use crate::cluster_planner::plan_clusters;
use crate::error::Outcome;
use crate::oracle::{CachedTimeOracle, HaversineOracle};
use crate::scheduler::schedule;
use crate::solver::greedy::GreedySolver;
use crate::solver::optimization::OptimizingSolver;
use crate::solver::{solve_day, SingleDaySolver};
use crate::types::{PlanRequest, PlanResult, TeamDay};
use crate::calendar;

/// Wall-clock budget for the full-optimization solver when the caller didn't
/// supply one (§4.3 "default ~60s").
const DEFAULT_FULL_MODE_BUDGET: Duration = Duration::from_secs(60);

/// `plan(request) -> PlanResult`: validates the request, then dispatches
/// per §4.7's decision tree.
///
/// ```text
/// INIT -> DISPATCH -> { SINGLE_DAY, MULTI_DAY, SEQ_CLUSTER, CALENDAR } -> EMIT | FAIL
/// ```
pub fn plan(request: &PlanRequest) -> Outcome<PlanResult> {
    request.validate()?;

    let oracle = CachedTimeOracle::with_default_capacity(HaversineOracle);
    let greedy = GreedySolver;
    let optimizing = OptimizingSolver;
    let strategy: &dyn SingleDaySolver = if request.fast_mode { &greedy } else { &optimizing };
    let deadline = if request.fast_mode {
        None
    } else {
        Some(Instant::now() + DEFAULT_FULL_MODE_BUDGET)
    };

    let service_minutes: Vec<i64> = request
        .sites
        .iter()
        .map(|site| request.service_minutes_for(site))
        .collect();
    let budget = request.max_route_minutes.min(request.effective_workday_minutes());
    let stop_cap = request.max_sites_per_crew_per_day;

    if request.end_date.is_some() {
        tracing::info!(sites = request.sites.len(), "dispatching to calendar planner");
        return calendar::plan_calendar(request, &request.sites, &service_minutes, &oracle, &greedy, &optimizing, deadline);
    }

    if request.use_clusters && request.sites.iter().all(|s| s.cluster_id.is_some()) {
        tracing::info!(sites = request.sites.len(), "dispatching to sequential cluster planner");
        let start = request.start_date.unwrap_or_else(today);
        let output = plan_clusters(
            &request.sites,
            &service_minutes,
            start,
            None,
            &request.holidays,
            request.team_config.teams,
            budget,
            stop_cap,
            request.minimize_crews,
            &oracle,
            strategy,
            deadline,
        )?;
        let mut result = build_result(output.team_days, start);
        result.sort_team_days();
        return Ok(result);
    }

    if let Some(start) = request.start_date {
        tracing::info!(sites = request.sites.len(), "dispatching to multi-day scheduler");
        let output = schedule(
            &request.sites,
            &service_minutes,
            start,
            None,
            &request.holidays,
            request.team_config.teams,
            budget,
            stop_cap,
            request.minimize_crews,
            request.minimize_crews,
            &oracle,
            strategy,
            deadline,
        )?;
        let mut result = build_result(output.team_days, start);
        result.unassigned = output.unassigned_site_ids.len();
        result.sort_team_days();
        return Ok(result);
    }

    tracing::info!(sites = request.sites.len(), "dispatching to single-day solver");
    let today = today();
    let sites = &request.sites;
    let output = solve_day(
        sites,
        &service_minutes,
        request.team_config.teams,
        budget,
        stop_cap,
        request.minimize_crews,
        &oracle,
        strategy,
        deadline,
    );

    let team_days: Vec<TeamDay> = output
        .routes
        .into_iter()
        .enumerate()
        .filter(|(_, route)| !route.site_indices.is_empty())
        .map(|(team_idx, route)| TeamDay {
            team_id: format!("team-{}", team_idx + 1),
            date: today,
            cluster_id: None,
            site_ids: route.site_indices.iter().map(|&i| sites[i].id.clone()).collect(),
            service_minutes: route.service_minutes,
            route_minutes: route.total_minutes(),
        })
        .collect();

    let mut result = build_result(team_days, today);
    result.unassigned = output.unassigned.len();
    Ok(result)
}

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

fn build_result(team_days: Vec<TeamDay>, start: chrono::NaiveDate) -> PlanResult {
    let end_date = team_days.iter().map(|t| t.date).max().unwrap_or(start);
    PlanResult {
        team_days,
        unassigned: 0,
        start_date: start,
        end_date,
    }
}
