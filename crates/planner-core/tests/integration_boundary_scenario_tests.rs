mod support;

use std::collections::HashSet;

use chrono::NaiveDate;
use planner_core::{plan, PlanError, PlanRequest, TeamConfig, Workday};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn base_request(sites: Vec<planner_core::Site>, teams: usize) -> PlanRequest {
    PlanRequest {
        sites,
        team_config: TeamConfig {
            teams,
            workday: Workday::default(),
        },
        use_clusters: false,
        start_date: None,
        end_date: None,
        holidays: HashSet::new(),
        max_route_minutes: 600,
        service_minutes_per_site: None,
        break_minutes: 0,
        fast_mode: true,
        max_sites_per_crew_per_day: 8,
        minimize_crews: true,
    }
}

/// §8(a): 15 sites split across two distant clumps, two crews, one 8-hour
/// day — every site gets covered and each crew's route stays within its
/// own clump.
#[test]
fn single_day_two_crews_splits_by_geography() {
    let sites = support::baton_rouge_and_charlotte(60);
    let req = base_request(sites, 2);

    let result = plan(&req).unwrap();
    assert_eq!(result.unassigned, 0);
    assert_eq!(result.start_date, result.end_date);
    assert_eq!(result.team_days.len(), 2);

    for day in &result.team_days {
        let all_br = day.site_ids.iter().all(|id| id.starts_with("br-"));
        let all_clt = day.site_ids.iter().all(|id| id.starts_with("clt-"));
        assert!(all_br || all_clt, "route mixed the two clumps: {:?}", day.site_ids);
    }
}

/// §8(c): 19 sites in 4 clusters, only 3 crews. Every TeamDay stays
/// cluster-pure, the plan spans multiple days, and at least one crew
/// switches clusters across days.
#[test]
fn sequential_cluster_plan_rotates_crews_across_clusters() {
    let sizes = [10usize, 5, 2, 2];
    let mut sites = Vec::new();
    for (cluster_id, &size) in sizes.iter().enumerate() {
        let base_lat = 38.9 + cluster_id as f64 * 2.0;
        let base_lon = -77.0 + cluster_id as f64 * 2.0;
        for i in 0..size {
            sites.push(support::clustered_site(
                &format!("c{cluster_id}-s{i}"),
                base_lat + i as f64 * 0.01,
                base_lon + i as f64 * 0.01,
                60,
                cluster_id as u32,
            ));
        }
    }

    let mut req = base_request(sites, 3);
    req.use_clusters = true;
    req.start_date = Some(d(2026, 2, 2));
    req.max_sites_per_crew_per_day = 8;

    let result = plan(&req).unwrap();
    assert_eq!(result.unassigned, 0);
    assert!(result.end_date > result.start_date);

    let cluster_of = |id: &str| -> u32 {
        id.split('-').next().unwrap()[1..].parse().unwrap()
    };
    for day in &result.team_days {
        let clusters: HashSet<u32> = day.site_ids.iter().map(|id| cluster_of(id)).collect();
        assert_eq!(clusters.len(), 1, "crew mixed clusters on {}: {:?}", day.date, day.site_ids);
    }

    let mut crew_clusters: std::collections::HashMap<&str, HashSet<Option<u32>>> = std::collections::HashMap::new();
    for day in &result.team_days {
        crew_clusters
            .entry(day.team_id.as_str())
            .or_default()
            .insert(day.cluster_id);
    }
    assert!(crew_clusters.values().any(|visited| visited.len() > 1));
}

/// §8(d): a holiday and the weekend it doesn't fall on both get excluded
/// from the schedule.
#[test]
fn holiday_and_weekend_dates_are_excluded() {
    let sites = support::grid_around(40, 38.0, -77.5, 0.01, 60);
    let mut req = base_request(sites, 1);
    req.start_date = Some(d(2025, 1, 1)); // Wednesday
    req.end_date = Some(d(2025, 1, 10));
    req.holidays.insert(d(2025, 1, 6));

    let result = plan(&req).unwrap();
    let dates: HashSet<NaiveDate> = result.team_days.iter().map(|t| t.date).collect();
    assert!(!dates.contains(&d(2025, 1, 4))); // Saturday
    assert!(!dates.contains(&d(2025, 1, 5))); // Sunday
    assert!(!dates.contains(&d(2025, 1, 6))); // holiday
}

/// §8(e): capacity saturation — 50 sites, 3 crews, cap 8/day means at most
/// 24 sites scheduled in a single day, forcing a multi-day span.
#[test]
fn capacity_saturation_forces_a_multi_day_span() {
    let sites = support::grid_around(50, 35.0, -90.0, 0.015, 45);
    let mut req = base_request(sites, 3);
    req.start_date = Some(d(2026, 3, 2));
    req.max_sites_per_crew_per_day = 8;

    let result = plan(&req).unwrap();
    let mut per_day: std::collections::HashMap<NaiveDate, usize> = std::collections::HashMap::new();
    for day in &result.team_days {
        *per_day.entry(day.date).or_insert(0) += day.site_ids.len();
    }
    assert!(per_day.values().all(|&count| count <= 24));
    assert!(per_day.len() >= 3);
}

/// §8(f): a single crew facing 50 sites whose service time alone exceeds
/// the per-day budget can never place a single stop, so the scheduler
/// raises `ProgressFailure` instead of looping forever.
#[test]
fn impossible_budget_surfaces_progress_failure() {
    let sites = support::sprawled_across_state(50, 200);
    let mut req = base_request(sites, 1);
    req.start_date = Some(d(2026, 1, 5));
    req.team_config.workday = Workday { start: 8 * 3600, end: 8 * 3600 + 180 * 60 };
    req.minimize_crews = false;

    match plan(&req) {
        Err(PlanError::ProgressFailure { context, .. }) => {
            assert!(context.consecutive_days >= 5);
            assert!(context.sites_remaining > 0);
        }
        other => panic!("expected ProgressFailure, got {other:?}"),
    }
}
