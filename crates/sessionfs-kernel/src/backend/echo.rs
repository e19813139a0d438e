use super::{Backend, BackendError};

/// Replies with the request prefixed by a fixed string.
#[derive(Debug, Clone)]
pub struct EchoBackend {
    prefix: String,
}

impl EchoBackend {
    /// Prefix used by [`EchoBackend::default`].
    pub const DEFAULT_PREFIX: &'static str = "You said: ";

    /// Create an echo backend with a custom prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl Backend for EchoBackend {
    fn respond(&self, request: &str) -> Result<String, BackendError> {
        Ok(format!("{}{}", self.prefix, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefix() {
        let backend = EchoBackend::default();
        assert_eq!(backend.respond("hello").unwrap(), "You said: hello");
    }

    #[test]
    fn test_custom_prefix_and_empty_request() {
        let backend = EchoBackend::new("> ");
        assert_eq!(backend.respond("").unwrap(), "> ");
    }
}
