//! Error types for identity resolution

use std::fmt;

#[derive(Debug)]
pub enum UserInfoError {
    Cache(auth_cache::CacheError),
    /// The authoritative source failed (query error, bad row, ...)
    Source(String),
}

impl fmt::Display for UserInfoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserInfoError::Cache(err) => write!(f, "Cache error: {}", err),
            UserInfoError::Source(msg) => write!(f, "Lookup error: {}", msg),
        }
    }
}

impl std::error::Error for UserInfoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UserInfoError::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<auth_cache::CacheError> for UserInfoError {
    fn from(err: auth_cache::CacheError) -> Self {
        UserInfoError::Cache(err)
    }
}

pub type Result<T> = std::result::Result<T, UserInfoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_cache_error_display() {
        let err = UserInfoError::from(auth_cache::CacheError::Stopped);
        assert_eq!(format!("{}", err), "Cache error: Cache engine stopped");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_source_error_display() {
        let err = UserInfoError::Source("querying database: timeout".to_string());
        assert_eq!(format!("{}", err), "Lookup error: querying database: timeout");
        assert!(err.source().is_none());
    }
}
