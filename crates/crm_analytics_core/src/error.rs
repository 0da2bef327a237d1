use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CrmError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidInput(_) => 400,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// True for failures caused by the caller rather than the store.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_not_found() {
        assert_eq!(CrmError::NotFound("x".into()).http_status(), 404);
    }

    #[test]
    fn http_status_invalid_input() {
        assert_eq!(CrmError::InvalidInput("x".into()).http_status(), 400);
    }

    #[test]
    fn http_status_conflict() {
        assert_eq!(CrmError::Conflict("x".into()).http_status(), 409);
    }

    #[test]
    fn http_status_internal() {
        let err = CrmError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(err.http_status(), 500);
        assert!(!err.is_client_error());
    }

    #[test]
    fn display_invalid_input() {
        let e = CrmError::InvalidInput("unknown sort property 'foo'".into());
        assert_eq!(e.to_string(), "invalid input: unknown sort property 'foo'");
        assert!(e.is_client_error());
    }

    #[test]
    fn display_internal() {
        let e = CrmError::Internal(anyhow::anyhow!("connection refused"));
        assert_eq!(e.to_string(), "internal: connection refused");
    }
}
