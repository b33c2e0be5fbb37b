//! Request/response value types (§3).

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::geo::LatLon;

/// Default per-day per-team cap on driving + service minutes.
pub const DEFAULT_MAX_ROUTE_MINUTES: i64 = 480;
/// Default hard cap on stops per route.
pub const DEFAULT_MAX_SITES_PER_CREW_PER_DAY: usize = 8;

/// A geocoded service site. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub service_minutes: Option<i64>,
    pub cluster_id: Option<u32>,
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Site {
    pub fn location(&self) -> LatLon {
        (self.lat, self.lon)
    }

    fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("site {}: lat {} out of range [-90, 90]", self.id, self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(format!("site {}: lon {} out of range [-180, 180]", self.id, self.lon));
        }
        if let Some(minutes) = self.service_minutes {
            if minutes <= 0 {
                return Err(format!("site {}: service_minutes must be positive", self.id));
            }
        }
        Ok(())
    }
}

/// A working window within a day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Workday {
    /// Seconds from midnight.
    pub start: i64,
    /// Seconds from midnight.
    pub end: i64,
}

impl Workday {
    pub fn minutes(&self) -> i64 {
        (self.end - self.start) / 60
    }
}

impl Default for Workday {
    fn default() -> Self {
        // 08:00 - 17:00
        Self {
            start: 8 * 3600,
            end: 17 * 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub teams: usize,
    pub workday: Workday,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            teams: 1,
            workday: Workday::default(),
        }
    }
}

fn default_max_route_minutes() -> i64 {
    DEFAULT_MAX_ROUTE_MINUTES
}
fn default_max_sites_per_crew_per_day() -> usize {
    DEFAULT_MAX_SITES_PER_CREW_PER_DAY
}

/// The aggregated planning request (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanRequest {
    pub sites: Vec<Site>,
    pub team_config: TeamConfig,
    #[serde(default)]
    pub use_clusters: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub holidays: HashSet<NaiveDate>,
    #[serde(default = "default_max_route_minutes")]
    pub max_route_minutes: i64,
    pub service_minutes_per_site: Option<i64>,
    #[serde(default)]
    pub break_minutes: i64,
    #[serde(default)]
    pub fast_mode: bool,
    #[serde(default = "default_max_sites_per_crew_per_day")]
    pub max_sites_per_crew_per_day: usize,
    #[serde(default)]
    pub minimize_crews: bool,
}

impl PlanRequest {
    /// Parses a request from its §6 JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self, PlanError> {
        serde_json::from_str(json)
            .map_err(|err| PlanError::invalid_request(format!("malformed request JSON: {err}")))
    }

    /// Effective service minutes for a site (its own, else the request default).
    pub fn service_minutes_for(&self, site: &Site) -> i64 {
        site.service_minutes
            .or(self.service_minutes_per_site)
            .unwrap_or(60)
    }

    /// Per-day budget after subtracting the break (§3, §8 invariant 4).
    pub fn effective_workday_minutes(&self) -> i64 {
        self.team_config.workday.minutes() - self.break_minutes
    }

    /// Boundary validation (§7 `InvalidRequest`). Rejects structurally
    /// impossible requests before any planning strategy runs.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.sites.is_empty() {
            return Err(PlanError::invalid_request("no sites in request"));
        }

        let mut seen_ids = HashSet::with_capacity(self.sites.len());
        for site in &self.sites {
            if !seen_ids.insert(site.id.as_str()) {
                return Err(PlanError::invalid_request(format!(
                    "duplicate site id: {}",
                    site.id
                )));
            }
            if let Err(message) = site.validate() {
                return Err(PlanError::invalid_request(message));
            }
            if self.use_clusters && site.cluster_id.is_none() {
                return Err(PlanError::invalid_request(format!(
                    "site {} missing cluster_id while use_clusters is set",
                    site.id
                )));
            }
        }

        if self.team_config.teams == 0 {
            return Err(PlanError::invalid_request("team_config.teams must be >= 1"));
        }
        if self.team_config.workday.end <= self.team_config.workday.start {
            return Err(PlanError::invalid_request(
                "workday end must be after workday start",
            ));
        }
        if self.break_minutes < 0 {
            return Err(PlanError::invalid_request("break_minutes must be >= 0"));
        }
        if self.effective_workday_minutes() <= 0 {
            return Err(PlanError::invalid_request(
                "break_minutes leaves no working time in the workday",
            ));
        }
        if self.max_route_minutes <= 0 {
            return Err(PlanError::invalid_request("max_route_minutes must be > 0"));
        }
        if self.max_sites_per_crew_per_day == 0 {
            return Err(PlanError::invalid_request(
                "max_sites_per_crew_per_day must be >= 1",
            ));
        }
        if let Some(end) = self.end_date {
            let start = self.start_date.ok_or_else(|| {
                PlanError::invalid_request("end_date set without start_date")
            })?;
            if end < start {
                return Err(PlanError::invalid_request("end_date before start_date"));
            }
        }

        Ok(())
    }
}

/// One crew's route for one day (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDay {
    pub team_id: String,
    pub date: NaiveDate,
    pub cluster_id: Option<u32>,
    pub site_ids: Vec<String>,
    pub service_minutes: i64,
    pub route_minutes: i64,
}

/// The overall plan output (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub team_days: Vec<TeamDay>,
    pub unassigned: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl PlanResult {
    /// Sort team_days by (date, team_id) ascending (§5 ordering guarantee).
    pub fn sort_team_days(&mut self) {
        self.team_days
            .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.team_id.cmp(&b.team_id)));
    }

    /// Renders the §6 JSON response format.
    pub fn to_json_string(&self) -> Result<String, PlanError> {
        serde_json::to_string(self)
            .map_err(|err| PlanError::SolverError {
                message: format!("failed to serialize plan result: {err}"),
                recommendations: Vec::new(),
            })
    }
}
