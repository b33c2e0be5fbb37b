//! Error taxonomy for the planning core.
//!
//! The single-day solver never raises for infeasibility — it reports an
//! `unassigned` count instead. Only [`PlanError::InvalidRequest`] and
//! [`PlanError::CalendarInfeasible`] ever escape the orchestrator;
//! [`PlanError::ProgressFailure`] is raised by the multi-day scheduler and
//! caught by the calendar planner for its crew-buffer retry loop.

use thiserror::Error;

/// Structured context for a stalled multi-day scheduling loop.
#[derive(Debug, Clone)]
pub struct ProgressFailureContext {
    pub sites_remaining: usize,
    pub sites_scheduled_today: usize,
    pub unassigned: usize,
    pub consecutive_days: u32,
    pub crews: usize,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid request: {message}")]
    InvalidRequest {
        message: String,
        recommendations: Vec<String>,
    },

    #[error("solver error: {message}")]
    SolverError {
        message: String,
        recommendations: Vec<String>,
    },

    #[error(
        "no progress for {} consecutive days with {} crews ({} sites remaining)",
        context.consecutive_days, context.crews, context.sites_remaining
    )]
    ProgressFailure {
        context: ProgressFailureContext,
        recommendations: Vec<String>,
    },

    #[error("calendar infeasible after exhausting crew buffer")]
    CalendarInfeasible {
        #[source]
        cause: Box<PlanError>,
        recommendations: Vec<String>,
    },
}

impl PlanError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        PlanError::InvalidRequest {
            message: message.into(),
            recommendations: Vec::new(),
        }
    }

    pub fn invalid_request_with(message: impl Into<String>, recommendations: Vec<String>) -> Self {
        PlanError::InvalidRequest {
            message: message.into(),
            recommendations,
        }
    }

    /// Suggested relaxations the caller can offer the user (§7 "User-visible behavior").
    pub fn recommendations(&self) -> &[String] {
        match self {
            PlanError::InvalidRequest { recommendations, .. }
            | PlanError::SolverError { recommendations, .. }
            | PlanError::ProgressFailure { recommendations, .. }
            | PlanError::CalendarInfeasible { recommendations, .. } => recommendations,
        }
    }
}

/// Shorthand for `Result<T, PlanError>`, distinct from [`crate::types::PlanResult`]
/// (the output payload of a successful plan).
pub type Outcome<T> = std::result::Result<T, PlanError>;

/// Default relaxations offered when the multi-day loop stalls.
pub fn progress_failure_recommendations() -> Vec<String> {
    vec![
        "increase max_route_minutes".to_string(),
        "disable fast mode".to_string(),
        "add a crew".to_string(),
        "enable clustering".to_string(),
    ]
}
