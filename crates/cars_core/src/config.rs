//! Store connection properties.
//!
//! # Responsibility
//! - Hold the opaque `key=value` property set handed to the connection
//!   provider at construction time.
//! - Load properties from a file or from process environment.
//!
//! # Invariants
//! - Keys and values are kept verbatim: no variable substitution, no
//!   quote stripping. Unknown keys are never dropped.
//! - `db.password` never appears in `redacted()` output.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DB_URL: &str = "db.url";
pub const DB_USER: &str = "db.user";
pub const DB_PASSWORD: &str = "db.password";
pub const DB_BUSY_TIMEOUT_MS: &str = "db.busy_timeout_ms";

const REDACTED: &str = "****";

/// Environment variable to property key mapping used by `from_env`.
const ENV_KEYS: &[(&str, &str)] = &[
    ("CARS_DB_URL", DB_URL),
    ("CARS_DB_USER", DB_USER),
    ("CARS_DB_PASSWORD", DB_PASSWORD),
    ("CARS_DB_BUSY_TIMEOUT_MS", DB_BUSY_TIMEOUT_MS),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required property `{0}` is missing")]
    MissingKey(String),

    #[error("invalid value `{value}` for property `{key}`")]
    InvalidValue { key: String, value: String },

    #[error("failed to read properties file `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse properties file `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: java_properties::PropertiesError,
    },

    #[error("failed to load .env file: {0}")]
    DotEnv(#[source] dotenvy::Error),
}

/// Property set describing how to reach the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreProperties {
    values: BTreeMap<String, String>,
}

impl StoreProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a Java-style `.properties` file.
    ///
    /// Accepts `key=value`, `key:value` and `key value` lines, `#`/`!`
    /// comments and backslash continuations. Values are taken literally.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let values =
            java_properties::read(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(values.into_iter().collect())
    }

    /// Builds properties from `CARS_DB_*` environment variables.
    ///
    /// A `.env` file in the working directory (or its parents) is loaded
    /// first when present.
    ///
    /// # Errors
    /// - A `.env` file exists but cannot be read or parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        accept_missing_dotenv(dotenvy::dotenv())?;

        Ok(ENV_KEYS
            .iter()
            .filter_map(|(var, key)| std::env::var(var).ok().map(|value| (*key, value)))
            .collect())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value for `key` or `ConfigError::MissingKey`.
    ///
    /// Whitespace-only values count as missing.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    /// Parses an optional numeric property.
    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a printable view with secrets masked.
    pub fn redacted(&self) -> RedactedProperties<'_> {
        RedactedProperties(self)
    }
}

impl<K, V> FromIterator<(K, V)> for StoreProperties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

fn accept_missing_dotenv<T>(result: Result<T, dotenvy::Error>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::DotEnv(err)),
    }
}

/// Display adapter returned by [`StoreProperties::redacted`].
pub struct RedactedProperties<'a>(&'a StoreProperties);

impl Display for RedactedProperties<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (index, (key, value)) in self.0.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if key == DB_PASSWORD {
                write!(f, "{key}={REDACTED}")?;
            } else {
                write!(f, "{key}={value}")?;
            }
        }
        f.write_str("}")
    }
}
