//! Error types for the geodat library
//!
//! Only structural and configuration faults are errors. Data-quality problems
//! in individual rows (unknown country codes, missing region codes, oversized
//! node tables) are logged and recovered with a fallback value instead.

use thiserror::Error;

/// Result type alias for geodat operations
pub type Result<T> = std::result::Result<T, GeoDatError>;

/// Main error type for geodat operations
#[derive(Error, Debug)]
pub enum GeoDatError {
    /// Network string could not be parsed as `address/prefix`
    #[error("Invalid network '{network}': {reason}")]
    InvalidNetwork {
        /// The offending input
        network: String,
        /// What was wrong with it
        reason: String,
    },

    /// Network belongs to an address family the database cannot hold
    #[error("Cannot insert {network} into an {family} database")]
    AddressFamilyMismatch {
        /// The offending network
        network: String,
        /// Address family of the database being built
        family: &'static str,
    },

    /// Unknown database kind or address family name
    #[error("Unsupported database variant: {0}")]
    UnsupportedVariant(String),

    /// Record kind does not belong to the database being built
    #[error("Record kind {record} cannot be stored in a {variant} database")]
    RecordKindMismatch {
        /// Kind of the rejected record
        record: &'static str,
        /// Database variant being built
        variant: String,
    },

    /// The trailer comment must be plain ASCII
    #[error("Database comment must be ASCII: {0:?}")]
    InvalidComment(String),

    /// Unknown output text encoding
    #[error("Unsupported output encoding: {0}")]
    UnsupportedEncoding(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GeoDatError {
    pub(crate) fn invalid_network(network: &str, reason: impl Into<String>) -> Self {
        GeoDatError::InvalidNetwork {
            network: network.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_network() {
        let err = GeoDatError::invalid_network("1.2.3.4/40", "prefix length 40 exceeds 32");
        assert_eq!(
            err.to_string(),
            "Invalid network '1.2.3.4/40': prefix length 40 exceeds 32"
        );
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: GeoDatError = io.into();
        assert_eq!(err.to_string(), "missing.csv");
    }
}
