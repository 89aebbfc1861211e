//! Registry errors.

use tessera_core::TesseraError;
use thiserror::Error;

/// Errors raised while loading middleware configuration.
///
/// Any of these aborts startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A descriptor maps to something other than a sequence of names.
    #[error("middleware config for '{descriptor}' must be an array, found {found}")]
    BadConfig {
        /// The offending descriptor.
        descriptor: String,
        /// The JSON kind found instead.
        found: &'static str,
    },
}

impl From<RegistryError> for TesseraError {
    fn from(err: RegistryError) -> Self {
        TesseraError::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_descriptor() {
        let err = RegistryError::BadConfig {
            descriptor: "plugin.shop".to_string(),
            found: "object",
        };
        assert_eq!(
            err.to_string(),
            "middleware config for 'plugin.shop' must be an array, found object"
        );
        assert_eq!(TesseraError::from(err).code(), 500);
    }
}
