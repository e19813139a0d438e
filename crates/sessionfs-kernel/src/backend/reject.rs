use super::{Backend, BackendError};

/// Fails every request with the same message.
#[derive(Debug, Clone)]
pub struct RejectBackend {
    message: String,
}

impl RejectBackend {
    /// Create a backend that always fails with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Backend for RejectBackend {
    fn respond(&self, _request: &str) -> Result<String, BackendError> {
        Err(BackendError::failed(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_fails() {
        let backend = RejectBackend::new("backend offline");
        let err = backend.respond("anything").unwrap_err();
        assert_eq!(err.to_string(), "backend offline");
    }
}
