//! Calendar planner (§4.6): plans within a fixed `[start_date, end_date]`
//! window, searching for the smallest crew count that clears the backlog.

use std::time::Instant;

use crate::calendar_dates::work_day_count;
use crate::error::{Outcome, PlanError};
use crate::geo::centroid;
use crate::oracle::TimeOracle;
use crate::scheduler::schedule;
use crate::solver::SingleDaySolver;
use crate::types::{PlanRequest, PlanResult, Site};

/// Crew-count attempts beyond the initial estimate before giving up (§4.6 step 3).
pub const MAX_CREW_BUFFER: usize = 5;

fn estimate_min_crews(
    request: &PlanRequest,
    sites: &[Site],
    service_minutes: &[i64],
    work_days: usize,
    oracle: &dyn TimeOracle,
) -> usize {
    let total_service: i64 = service_minutes.iter().sum();
    let locations: Vec<_> = sites.iter().map(Site::location).collect();
    let center = centroid(&locations);
    let estimated_travel: i64 = locations
        .iter()
        .map(|&loc| (oracle.travel_minutes(center, loc) * 2.0).round() as i64)
        .sum();

    let effective_workday = request.effective_workday_minutes();
    if work_days == 0 || effective_workday <= 0 {
        return request.team_config.teams;
    }

    let raw = (total_service + estimated_travel) as f64 / (work_days as f64 * effective_workday as f64);
    (raw.ceil() as usize).max(1)
}

/// Runs §4.6 end to end: estimate, feasibility probe in fast mode, actual
/// planning in the requested mode, then a post-validation retry loop that
/// adds crews until the buffer is exhausted.
#[allow(clippy::too_many_arguments)]
pub fn plan_calendar(
    request: &PlanRequest,
    sites: &[Site],
    service_minutes: &[i64],
    oracle: &dyn TimeOracle,
    fast_strategy: &dyn SingleDaySolver,
    actual_strategy: &dyn SingleDaySolver,
    deadline: Option<Instant>,
) -> Outcome<PlanResult> {
    let start = request
        .start_date
        .ok_or_else(|| PlanError::invalid_request("calendar planning requires start_date"))?;
    let end = request
        .end_date
        .ok_or_else(|| PlanError::invalid_request("calendar planning requires end_date"))?;

    let work_days = work_day_count(start, end, &request.holidays);
    let k0 = estimate_min_crews(request, sites, service_minutes, work_days, oracle);
    let budget = request.max_route_minutes.min(request.effective_workday_minutes());
    let stop_cap = request.max_sites_per_crew_per_day;

    let mut last_err: Option<PlanError> = None;
    let mut committed_k = None;

    for k in k0..=k0 + MAX_CREW_BUFFER {
        let probe = schedule(
            sites,
            service_minutes,
            start,
            Some(end),
            &request.holidays,
            k,
            budget,
            stop_cap,
            request.minimize_crews,
            false,
            oracle,
            fast_strategy,
            deadline,
        );
        match probe {
            Ok(_) => {
                committed_k = Some(k);
                break;
            }
            Err(err) => last_err = Some(err),
        }
    }

    let Some(start_k) = committed_k else {
        return Err(PlanError::CalendarInfeasible {
            cause: Box::new(last_err.expect("at least one probe attempt ran")),
            recommendations: vec![
                "add a crew".to_string(),
                "extend end_date".to_string(),
                "enable clustering".to_string(),
            ],
        });
    };

    let strategy = if request.fast_mode { fast_strategy } else { actual_strategy };

    for k in start_k..=k0 + MAX_CREW_BUFFER {
        let attempt = schedule(
            sites,
            service_minutes,
            start,
            Some(end),
            &request.holidays,
            k,
            budget,
            stop_cap,
            request.minimize_crews,
            false,
            oracle,
            strategy,
            deadline,
        );
        match attempt {
            Ok(output) => {
                let end_date = output
                    .team_days
                    .iter()
                    .map(|t| t.date)
                    .max()
                    .unwrap_or(start);
                let mut result = PlanResult {
                    team_days: output.team_days,
                    unassigned: 0,
                    start_date: start,
                    end_date,
                };
                result.sort_team_days();
                return Ok(result);
            }
            Err(err) => last_err = Some(err),
        }
    }

    Err(PlanError::CalendarInfeasible {
        cause: Box::new(last_err.expect("at least one planning attempt ran")),
        recommendations: vec![
            "add a crew".to_string(),
            "extend end_date".to_string(),
            "enable clustering".to_string(),
        ],
    })
}
