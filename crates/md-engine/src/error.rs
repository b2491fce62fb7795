//! Error types for domain computation.

use thiserror::Error;

/// Errors raised while computing a domain, histogram or page.
///
/// All variants are request-scoped: the engine holds no state that an error
/// could leave behind.
#[derive(Error, Debug)]
pub enum DomainError {
    /// The dimension is absent or disabled on the resource.
    #[error("Dimension not found: {0}")]
    DimensionNotFound(String),

    /// A filter names a dimension that is not configured at all.
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    /// The spatial restriction references an unrecognized grid set.
    #[error("Unknown grid set: {0}")]
    UnknownGridSet(String),

    /// The histogram resolution is not a number or ISO-8601 period, or does
    /// not fit the dimension.
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// A range or explicit bound has `low > high`.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A filter, cursor or paging literal could not be interpreted.
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// The request box cannot be reprojected into the native CRS.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Failure reported by the data-access collaborator, passed through as is.
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

impl DomainError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// Create an InvalidResolution error.
    pub fn invalid_resolution(msg: impl Into<String>) -> Self {
        Self::InvalidResolution(msg.into())
    }

    /// Get the OGC exception code for this error.
    pub fn exception_code(&self) -> &'static str {
        match self {
            DomainError::DimensionNotFound(_)
            | DomainError::UnknownDimension(_)
            | DomainError::UnknownGridSet(_)
            | DomainError::InvalidResolution(_)
            | DomainError::InvalidRange(_)
            | DomainError::InvalidParameter { .. } => "InvalidParameterValue",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            DomainError::DataAccess(DataAccessError::Cancelled) => 503,
            DomainError::DataAccess(_) | DomainError::Projection(_) => 500,
            _ => 400,
        }
    }
}

/// Errors reported by a [`DataSource`](crate::DataSource) implementation.
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// The backing store could not answer the query.
    #[error("data source query failed: {0}")]
    QueryFailed(String),

    /// The surrounding request was cancelled while the query ran.
    #[error("query cancelled")]
    Cancelled,
}

/// Result type for domain engine operations.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_codes() {
        assert_eq!(
            DomainError::DimensionNotFound("abcd".into()).exception_code(),
            "InvalidParameterValue"
        );
        assert_eq!(
            DomainError::UnknownGridSet("EPSG:4326_unknown".into()).exception_code(),
            "InvalidParameterValue"
        );
        assert_eq!(
            DomainError::from(DataAccessError::QueryFailed("io".into())).exception_code(),
            "NoApplicableCode"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(DomainError::invalid_range("5 > 1").http_status_code(), 400);
        assert_eq!(
            DomainError::from(DataAccessError::Cancelled).http_status_code(),
            503
        );
        assert_eq!(DomainError::Projection("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_data_access_passthrough_message() {
        let err = DomainError::from(DataAccessError::QueryFailed("record 7: no such table".into()));
        assert_eq!(err.to_string(), "data source query failed: record 7: no such table");
    }
}
