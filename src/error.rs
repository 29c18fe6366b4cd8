//! Error types shared by the planning pipeline.

use thiserror::Error;

/// Coarse classification of a [`PlannerError`], suitable for structured
/// reporting to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Input,
    InfeasibleRoute,
    ExternalProvider,
    Scheduling,
    Config,
}

/// Errors raised by the planning stages.
///
/// Unresolvable matrix cells are not errors: they are recorded as
/// [`TravelCost::UNREACHABLE`](crate::matrix::TravelCost::UNREACHABLE).
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Malformed or insufficient input (too few places, bad index, ...).
    #[error("invalid input: {0}")]
    Input(String),

    /// No full-coverage path exists over the reachable arcs.
    #[error("no feasible route covers all {places} places")]
    InfeasibleRoute { places: usize },

    /// The routing or place-search collaborator failed.
    #[error("external provider failed: {0}")]
    ExternalProvider(#[from] ProviderError),

    /// Empty route or zero days handed to the scheduler.
    #[error("cannot build schedule: {0}")]
    Scheduling(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PlannerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::Input(_) => ErrorKind::Input,
            PlannerError::InfeasibleRoute { .. } => ErrorKind::InfeasibleRoute,
            PlannerError::ExternalProvider(_) => ErrorKind::ExternalProvider,
            PlannerError::Scheduling(_) => ErrorKind::Scheduling,
            PlannerError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        PlannerError::Input(message.into())
    }

    pub(crate) fn scheduling(message: impl Into<String>) -> Self {
        PlannerError::Scheduling(message.into())
    }
}

/// Failures reported by a routing or place-search collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned an unusable response: {0}")]
    MalformedResponse(String),

    #[error("travel mode {0} is not supported by this provider")]
    UnsupportedMode(crate::traits::TravelMode),

    #[error("{0}")]
    Other(String),
}
