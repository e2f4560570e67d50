//! Credential loading.
//!
//! Both API keys are required before a session can start.  They are read from a YAML secrets
//! file, falling back to environment variables of the same name:
//!
//! ```yaml
//! GOOGLE_API_KEY: "..."
//! SERPER_API_KEY: "..."
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Name of the model-provider credential.
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

/// Name of the search-provider credential.
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";

/// Default location of the secrets file, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = ".searchchat/secrets.yaml";

/// The two credentials a chat session needs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    /// Key for the Gemini API.
    pub google_api_key: String,
    /// Key for the Serper search API.
    pub serper_api_key: String,
}

impl Secrets {
    /// Create secrets from explicit values.
    pub fn new(google_api_key: impl Into<String>, serper_api_key: impl Into<String>) -> Self {
        Self {
            google_api_key: google_api_key.into(),
            serper_api_key: serper_api_key.into(),
        }
    }

    /// Load secrets from `path`, falling back to the process environment.
    ///
    /// A missing file is not an error by itself; a missing key is.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    /// Load secrets from `path`, falling back to `env` for keys the file lacks.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = match fs::read_to_string(path) {
            Ok(content) => Self::parse_file(&content)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to read secrets file {}", path.display()),
                    err,
                ));
            }
        };
        Self::resolve(&file, env)
    }

    fn parse_file(content: &str) -> Result<HashMap<String, String>> {
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn resolve(
        file: &HashMap<String, String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let lookup = |name: &str| {
            file.get(name)
                .cloned()
                .or_else(|| env(name))
                .filter(|value| !value.trim().is_empty())
        };
        match (lookup(GOOGLE_API_KEY), lookup(SERPER_API_KEY)) {
            (Some(google), Some(serper)) => Ok(Self::new(google, serper)),
            (google, serper) => {
                let missing = [(GOOGLE_API_KEY, google), (SERPER_API_KEY, serper)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>()
                    .join(" and ");
                Err(Error::configuration(format!(
                    "API keys not found: add {missing} to the secrets file or the environment"
                )))
            }
        }
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("google_api_key", &"<redacted>")
            .field("serper_api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "searchchat-secrets-{}-{name}.yaml",
            std::process::id()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn load_from_file() {
        let path = scratch_file(
            "both",
            "GOOGLE_API_KEY: google-key\nSERPER_API_KEY: serper-key\n",
        );
        let secrets = Secrets::load_with_env(&path, no_env).unwrap();
        assert_eq!(secrets, Secrets::new("google-key", "serper-key"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn environment_fills_gaps() {
        let path = scratch_file("partial", "GOOGLE_API_KEY: from-file\n");
        let secrets = Secrets::load_with_env(&path, |name| {
            (name == SERPER_API_KEY).then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(secrets.google_api_key, "from-file");
        assert_eq!(secrets.serper_api_key, "from-env");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_uses_environment() {
        let secrets = Secrets::load_with_env("/nonexistent/searchchat/secrets.yaml", |name| {
            Some(format!("{name}-value"))
        })
        .unwrap();
        assert_eq!(secrets.google_api_key, "GOOGLE_API_KEY-value");
    }

    #[test]
    fn missing_keys_are_fatal_configuration_errors() {
        let err = Secrets::load_with_env("/nonexistent/searchchat/secrets.yaml", no_env)
            .unwrap_err();
        assert!(err.is_configuration());
        let message = err.to_string();
        assert!(message.contains(GOOGLE_API_KEY));
        assert!(message.contains(SERPER_API_KEY));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let path = scratch_file("blank", "GOOGLE_API_KEY: \"\"\nSERPER_API_KEY: s\n");
        let err = Secrets::load_with_env(&path, no_env).unwrap_err();
        assert!(err.to_string().contains(GOOGLE_API_KEY));
        assert!(!err.to_string().contains(SERPER_API_KEY));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn malformed_file_is_serialization_error() {
        let path = scratch_file("malformed", "- just\n- a list\n");
        let err = Secrets::load_with_env(&path, no_env).unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn debug_redacts() {
        let secrets = Secrets::new("aaa", "bbb");
        let debug = format!("{secrets:?}");
        assert!(!debug.contains("aaa"));
        assert!(!debug.contains("bbb"));
    }
}
