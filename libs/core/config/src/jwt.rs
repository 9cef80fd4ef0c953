//! JWT signing configuration.

use crate::{env_required, ConfigError, FromEnv};

/// JWT authentication configuration.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required) - must be at least 32 characters
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// JWT signing secret (minimum 32 characters)
    pub secret: String,
}

impl JwtConfig {
    /// Create a new JwtConfig with the given secret.
    ///
    /// # Panics
    /// Panics if the secret is less than 32 characters.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= 32,
            "JWT secret must be at least 32 characters"
        );
        Self { secret }
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < 32 {
            return Err(ConfigError::ParseError {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least 32 characters for security (got {}). Generate one with: openssl rand -base64 32",
                    secret.len()
                ),
            });
        }

        Ok(Self { secret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_rejects_short_secret() {
        temp_env::with_var("JWT_SECRET", Some("too-short"), || {
            assert!(JwtConfig::from_env().is_err());
        });
    }

    #[test]
    fn from_env_accepts_long_secret() {
        temp_env::with_var(
            "JWT_SECRET",
            Some("0123456789abcdef0123456789abcdef"),
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret.len(), 32);
            },
        );
    }

    #[test]
    #[should_panic(expected = "at least 32 characters")]
    fn new_panics_on_short_secret() {
        let _ = JwtConfig::new("short");
    }
}
