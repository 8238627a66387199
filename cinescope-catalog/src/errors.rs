//! Error types for catalog provider access.

use thiserror::Error;

/// Errors that can occur while talking to the catalog provider.
///
/// Cloneable so one failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    /// Provider could not be reached.
    #[error("Network error: {reason}")]
    Network {
        /// The reason for the network error
        reason: String,
    },

    /// Provider answered with a non-2xx status.
    #[error("Catalog returned HTTP {status} for {endpoint}")]
    Status {
        /// Endpoint path that was requested
        endpoint: String,
        /// HTTP status code returned
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("Parse error: {reason}")]
    Parse {
        /// The reason for the parse error
        reason: String,
    },

    /// Requested item does not exist in the catalog.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing item
        what: String,
    },

    /// No API key was configured for a provider that requires one.
    #[error("Catalog API key is not configured")]
    MissingCredentials,
}

impl CatalogError {
    /// Whether re-issuing the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Network { .. } => true,
            CatalogError::Status { status, .. } => *status == 429 || *status >= 500,
            CatalogError::Parse { .. }
            | CatalogError::NotFound { .. }
            | CatalogError::MissingCredentials => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let network = CatalogError::Network {
            reason: "connection refused".to_string(),
        };
        assert!(network.is_retryable());

        let throttled = CatalogError::Status {
            endpoint: "/search/multi".to_string(),
            status: 429,
        };
        assert!(throttled.is_retryable());

        let unauthorized = CatalogError::Status {
            endpoint: "/search/multi".to_string(),
            status: 401,
        };
        assert!(!unauthorized.is_retryable());
        assert!(!CatalogError::MissingCredentials.is_retryable());
    }
}
