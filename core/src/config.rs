//! Client configuration loaded from the environment.
//!
//! A `.env` file in the working directory is honored outside of tests.

/// Default API location when `BARTERUP_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = match lookup("BARTERUP_API_URL") {
            Some(url) if url.trim().is_empty() => DEFAULT_API_URL.to_string(),
            Some(url) => url.trim().to_string(),
            None => DEFAULT_API_URL.to_string(),
        };
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "BARTERUP_API_URL".to_string(),
                format!("'{api_url}' is not an http(s) URL"),
            ));
        }
        Ok(Self { api_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn reads_api_url() {
        let config = ClientConfig::from_lookup(|key| {
            (key == "BARTERUP_API_URL").then(|| "https://api.barterup.id".to_string())
        })
        .unwrap();
        assert_eq!(config.api_url, "https://api.barterup.id");
    }

    #[test]
    fn rejects_non_http_url() {
        let err = ClientConfig::from_lookup(|_| Some("ftp://nope".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "BARTERUP_API_URL"));
    }
}
