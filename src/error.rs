use anyhow::anyhow;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Database,
    Unauthorized,
    Forbidden,
    InvalidInput,
    NotFound,
    Conflict,
    Unknown,
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub source: anyhow::Error,
}

/// Public message for every failed project access check.
pub const NO_PERMISSION: &str = "No permission";

/// Public message when a route requires a signed-in user.
pub const TOKEN_MISSING: &str = "token missing or invalid";

impl LibError {
    pub fn database(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Database,
            code: "database_error",
            public,
            source,
        }
    }

    pub fn unauthorized(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            code: "unauthorized",
            public,
            source,
        }
    }

    /// The requester lacks view or edit rights on a project, or the project
    /// does not exist. Both collapse into the same response.
    pub fn no_permission(source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            code: "no_permission",
            public: NO_PERMISSION,
            source,
        }
    }

    pub fn token_missing(source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            code: "token_missing_or_invalid",
            public: TOKEN_MISSING,
            source,
        }
    }

    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            source,
        }
    }

    pub fn invalid_with_code(
        code: &'static str,
        public: &'static str,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            source,
        }
    }

    pub fn forbidden(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Forbidden,
            code: "forbidden",
            public,
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "not_found",
            public,
            source,
        }
    }

    pub fn conflict(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Conflict,
            code: "conflict",
            public,
            source,
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            source,
        }
    }

    pub fn message(public: &'static str) -> Self {
        Self::unknown(public, anyhow!(public))
    }

    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind, ErrorKind::Database | ErrorKind::Unknown)
    }
}

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.source)
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for LibError {
    fn from(value: sqlx::Error) -> Self {
        Self::database("Database request failed", anyhow!(value))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{ErrorKind, LibError, NO_PERMISSION};

    #[test]
    fn no_permission_is_unauthorized() {
        let err = LibError::no_permission(anyhow!("project 7 missing"));
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.public, NO_PERMISSION);
        assert!(err.is_client_error());
    }

    #[test]
    fn database_errors_are_server_faults() {
        let err = LibError::database("Failed to query project", anyhow!("connection reset"));
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "database_error: connection reset");
    }
}
