//! Error types for the scheduling crate.

use thiserror::Error;

/// Errors that can occur during dependency analysis, resource
/// management or scheduling.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedError {
    /// A resource specification names a type that is not registered.
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    /// A resource configuration payload is malformed.
    #[error("invalid configuration for resource '{name}': {reason}")]
    ResourceConfig {
        /// Name of the resource instance.
        name: String,
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A resource instance name contains illegal characters.
    #[error("invalid resource name '{0}': names may only contain letters, digits, '_' and '-'")]
    InvalidResourceName(String),

    /// Two resource instances share a name.
    #[error("duplicate resource name '{0}'")]
    DuplicateResourceName(String),

    /// A reservation could not be completed.
    #[error("resource '{resource}' rejected '{name}' at cycle {cycle}")]
    ReservationFailed {
        /// Name of the instruction that was being reserved.
        name: String,
        /// The cycle at which the reservation was attempted.
        cycle: i64,
        /// Name of the resource instance that rejected it.
        resource: String,
    },

    /// A resource state was used after a failed partial reservation.
    #[error("resource state is broken after a failed reservation; it must be discarded")]
    BrokenState,

    /// The scheduler could not place a statement within the resource
    /// wait bound.
    #[error("cannot schedule '{name}': no resources available after waiting {waited} cycles (at cycle {cycle})")]
    Infeasible {
        /// Name of the statement that could not be placed.
        name: String,
        /// The cycle at which the scheduler gave up.
        cycle: i64,
        /// How many cycles it advanced without scheduling anything.
        waited: u64,
    },

    /// Internal invariant violation. Indicates a bug.
    #[error("internal scheduler error: {0}")]
    Internal(String),
}

/// Result type for scheduling operations.
pub type SchedResult<T> = Result<T, SchedError>;
