//! Exit code standardization for tfcost
//!
//! ## Exit Code Convention
//!
//! - `0` = Success (including estimates where some resources failed to price)
//! - `1` = User error (unreadable or malformed plan, unknown resource values)
//! - `2` = System error (billing API failure, network error, I/O)
//! - `3` = Configuration error (invalid config file, missing API key)

use crate::error::{ConfigError, CostError};

/// Standard exit codes for tfcost
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid plan, bad input)
    pub const USER_ERROR: i32 = 1;
    /// System error (billing API failure, network error)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error (invalid config, missing API key)
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a CostError to an appropriate exit code
pub fn exit_code_for_error(error: &CostError) -> i32 {
    use CostError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,

        // System errors (billing API, network, I/O)
        CatalogSource { .. } => codes::SYSTEM_ERROR,
        Retryable { .. } => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,

        Resource { source, .. } => exit_code_for_error(source),

        // Everything else stems from the arguments, the plan or its values
        _ => codes::USER_ERROR,
    }
}

/// Exit code for a top-level `anyhow` error.
///
/// Errors that are neither `CostError` nor `ConfigError` count as system errors.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<CostError>() {
        exit_code_for_error(e)
    } else if error.downcast_ref::<ConfigError>().is_some() {
        codes::CONFIG_ERROR
    } else {
        codes::SYSTEM_ERROR
    }
}
