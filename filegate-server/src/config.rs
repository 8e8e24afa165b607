//! Configuration for the file gateway server.
//!
//! This module provides the configuration system for the gateway HTTP
//! server. Configuration can be loaded from multiple sources with the
//! following precedence (highest to lowest):
//!
//! 1. Environment variables (prefixed with `FG__`)
//! 2. YAML configuration file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! See [`Config`] for a description of all configuration fields and their
//! defaults.
//!
//! # Environment Variables
//!
//! Environment variables use `FG__` as a prefix and double underscores
//! (`__`) to denote nested configuration structures. For example:
//!
//! - `FG__HTTP_ADDR=0.0.0.0:3000` sets the HTTP server address
//! - `FG__OBJECT_STORAGE__TYPE=s3compatible` sets the object storage type
//! - `FG__AUTH__TOKEN_SECRET=...` sets the token signing secret
//!
//! # YAML Configuration File
//!
//! The same configuration in YAML format would look like this:
//!
//! ```yaml
//! http_addr: 0.0.0.0:3000
//!
//! object_storage:
//!   type: s3compatible
//!   region: us-east-1
//!   bucket: uploads
//!
//! auth:
//!   token_secret: change-me
//! ```

use std::borrow::Cow;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use secrecy::{CloneableSecret, SecretBox, SerializableSecret, zeroize::Zeroize};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "FG__";

/// Newtype around `String` that may protect against accidental
/// logging of secrets in our configuration struct. Use with
/// [`secrecy::SecretBox`].
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret as a plain string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl std::ops::Deref for ConfigSecret {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

impl CloneableSecret for ConfigSecret {}
impl SerializableSecret for ConfigSecret {}
impl Zeroize for ConfigSecret {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Object storage backend configuration.
///
/// The `type` field in YAML or `__TYPE` in environment variables
/// determines which variant is used.
///
/// Used in: [`Config::object_storage`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectStorage {
    /// Local filesystem storage backend (type `"filesystem"`).
    ///
    /// Stores blobs as files on the local filesystem. Suitable for
    /// development, testing, and single-server deployments.
    ///
    /// # Example
    ///
    /// ```yaml
    /// object_storage:
    ///   type: filesystem
    ///   path: /data/objects
    /// ```
    FileSystem {
        /// Directory path for storing objects.
        ///
        /// The directory will be created if it doesn't exist. Relative
        /// paths are resolved from the server's working directory.
        ///
        /// # Default
        ///
        /// `"data/objects"` (relative to the server's working directory)
        ///
        /// # Environment Variables
        ///
        /// - `FG__OBJECT_STORAGE__TYPE=filesystem`
        /// - `FG__OBJECT_STORAGE__PATH=/path/to/storage`
        path: PathBuf,
    },

    /// S3-compatible storage backend (type `"s3compatible"`).
    ///
    /// Supports Amazon S3 and other S3-compatible services such as MinIO
    /// or SeaweedFS.
    ///
    /// # Example
    ///
    /// ```yaml
    /// object_storage:
    ///   type: s3compatible
    ///   endpoint: http://localhost:9000
    ///   region: us-east-1
    ///   bucket: uploads
    ///   path_style: true
    /// ```
    S3Compatible {
        /// Optional custom S3 endpoint URL.
        ///
        /// Examples: `http://localhost:9000` (for MinIO). If unset, the
        /// region's default endpoint is used.
        ///
        /// # Environment Variable
        ///
        /// `FG__OBJECT_STORAGE__ENDPOINT`
        endpoint: Option<String>,

        /// The region name of the bucket.
        ///
        /// # Environment Variable
        ///
        /// `FG__OBJECT_STORAGE__REGION`
        region: String,

        /// S3 bucket name.
        ///
        /// The bucket must exist before starting the server.
        ///
        /// # Environment Variable
        ///
        /// `FG__OBJECT_STORAGE__BUCKET`
        bucket: String,

        /// Static access key.
        ///
        /// When unset, credentials are resolved from the ambient
        /// environment (instance profiles, `AWS_*` variables).
        ///
        /// # Environment Variable
        ///
        /// `FG__OBJECT_STORAGE__ACCESS_KEY`
        access_key: Option<String>,

        /// Static secret key, redacted from debug output.
        ///
        /// # Environment Variable
        ///
        /// `FG__OBJECT_STORAGE__SECRET_KEY`
        secret_key: Option<SecretBox<ConfigSecret>>,

        /// Use path-style addressing instead of virtual-hosted buckets.
        ///
        /// Required by most self-hosted S3-compatible services.
        ///
        /// # Default
        ///
        /// `false`
        #[serde(default)]
        path_style: bool,
    },

    /// In-memory storage backend (type `"memory"`).
    ///
    /// Keeps all objects in process memory. Contents are lost on restart;
    /// intended for tests and local experiments only.
    Memory,
}

/// User table backend configuration.
///
/// Used in: [`Config::user_storage`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UserStorage {
    /// Local filesystem user table (type `"filesystem"`).
    ///
    /// Keeps one JSON document per account. The uniqueness constraint on
    /// signup maps to exclusive file creation.
    FileSystem {
        /// Directory path for storing account records.
        ///
        /// # Default
        ///
        /// `"data/users"` (relative to the server's working directory)
        ///
        /// # Environment Variables
        ///
        /// - `FG__USER_STORAGE__TYPE=filesystem`
        /// - `FG__USER_STORAGE__PATH=/path/to/users`
        path: PathBuf,
    },

    /// In-memory user table (type `"memory"`).
    ///
    /// Accounts are lost on restart; intended for tests only.
    Memory,
}

/// Authentication configuration.
///
/// Used in: [`Config::auth`]
#[derive(Debug, Deserialize, Serialize)]
pub struct Auth {
    /// Secret used to sign and verify session tokens.
    ///
    /// This must come from external configuration and is never
    /// hardcoded. The server refuses to start without it, since any
    /// token it issued would otherwise be unverifiable.
    ///
    /// # Environment Variable
    ///
    /// `FG__AUTH__TOKEN_SECRET`
    pub token_secret: Option<SecretBox<ConfigSecret>>,

    /// How long issued session tokens stay valid.
    ///
    /// Sessions are stateless: expiry is embedded in the token and
    /// checked on verification, there is no revocation.
    ///
    /// # Default
    ///
    /// `2h`
    ///
    /// # Environment Variable
    ///
    /// `FG__AUTH__TOKEN_VALIDITY`
    #[serde(with = "humantime_serde")]
    pub token_validity: Duration,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_validity: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Runtime configuration for the Tokio async runtime.
///
/// Used in: [`Config::runtime`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Runtime {
    /// Number of worker threads for the server runtime.
    ///
    /// Set this in accordance with the resources available to the
    /// server, especially in Kubernetes environments.
    ///
    /// # Default
    ///
    /// Defaults to the number of CPU cores on the host machine.
    ///
    /// # Environment Variable
    ///
    /// `FG__RUNTIME__WORKER_THREADS`
    pub worker_threads: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
        }
    }
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Logging configuration.
///
/// Controls the verbosity of log output. Logs are always written to
/// stderr.
///
/// Used in: [`Config::logging`]
#[derive(Debug, Deserialize, Serialize)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// Valid levels in increasing severity: TRACE, DEBUG, INFO, WARN,
    /// ERROR, OFF. The `RUST_LOG` environment variable provides more
    /// granular control per module if needed.
    ///
    /// # Default
    ///
    /// `INFO`
    ///
    /// # Environment Variable
    ///
    /// `FG__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
        }
    }
}

/// [Sentry](https://sentry.io/) error tracking and performance monitoring
/// configuration.
///
/// Sentry is disabled by default and only enabled when a DSN is provided.
///
/// Used in: [`Config::sentry`]
#[derive(Debug, Deserialize, Serialize)]
pub struct Sentry {
    /// Sentry DSN (Data Source Name).
    ///
    /// When set, enables Sentry error tracking and performance
    /// monitoring. When `None`, Sentry integration is completely
    /// disabled.
    ///
    /// # Default
    ///
    /// `None` (Sentry disabled)
    ///
    /// # Environment Variable
    ///
    /// `FG__SENTRY__DSN`
    pub dsn: Option<SecretBox<ConfigSecret>>,

    /// Environment name for this deployment.
    ///
    /// Used to distinguish events from different environments (e.g.
    /// "production", "staging", "development").
    ///
    /// # Environment Variable
    ///
    /// `FG__SENTRY__ENVIRONMENT`
    pub environment: Option<Cow<'static, str>>,

    /// Server name or identifier.
    ///
    /// Set to the hostname or pod name of the server.
    ///
    /// # Environment Variable
    ///
    /// `FG__SENTRY__SERVER_NAME`
    pub server_name: Option<Cow<'static, str>>,

    /// Error event sampling rate.
    ///
    /// # Default
    ///
    /// `1.0` (send all errors)
    ///
    /// # Environment Variable
    ///
    /// `FG__SENTRY__SAMPLE_RATE`
    pub sample_rate: f32,

    /// Performance trace sampling rate.
    ///
    /// # Default
    ///
    /// `0.01` (send 1% of traces)
    ///
    /// # Environment Variable
    ///
    /// `FG__SENTRY__TRACES_SAMPLE_RATE`
    pub traces_sample_rate: f32,

    /// Enable Sentry SDK debug mode.
    ///
    /// # Default
    ///
    /// `false`
    ///
    /// # Environment Variable
    ///
    /// `FG__SENTRY__DEBUG`
    pub debug: bool,
}

impl Sentry {
    /// Returns whether Sentry integration is enabled.
    ///
    /// Sentry is considered enabled if a DSN is configured.
    pub fn is_enabled(&self) -> bool {
        self.dsn.is_some()
    }
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            server_name: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.01,
            debug: false,
        }
    }
}

/// Main configuration struct for the gateway server.
///
/// This is the top-level configuration that combines all server settings
/// including networking, storage backends, authentication, runtime, and
/// observability options.
///
/// Configuration is loaded with the following precedence (highest to
/// lowest):
/// 1. Environment variables (prefixed with `FG__`)
/// 2. YAML configuration file (if provided via `-c` flag)
/// 3. Default values
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server bind address.
    ///
    /// Note that binding to `0.0.0.0` makes the server accessible from
    /// all network interfaces.
    ///
    /// # Default
    ///
    /// `0.0.0.0:3000`
    ///
    /// # Environment Variable
    ///
    /// `FG__HTTP_ADDR`
    pub http_addr: SocketAddr,

    /// Maximum accepted upload payload size in bytes.
    ///
    /// Upload bodies are buffered in memory for the duration of a
    /// request before being forwarded to storage, so this also bounds
    /// per-request memory usage.
    ///
    /// # Default
    ///
    /// `67108864` (64 MiB)
    ///
    /// # Environment Variable
    ///
    /// `FG__MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// Optional directory of static files to serve.
    ///
    /// When set, requests that match no API route fall back to files
    /// from this directory.
    ///
    /// # Default
    ///
    /// `None` (no static file serving)
    ///
    /// # Environment Variable
    ///
    /// `FG__STATIC_DIR`
    pub static_dir: Option<PathBuf>,

    /// Storage backend for uploaded objects.
    ///
    /// See [`ObjectStorage`] for available backends.
    pub object_storage: ObjectStorage,

    /// Storage backend for the user account table.
    ///
    /// See [`UserStorage`] for available backends.
    pub user_storage: UserStorage,

    /// Authentication configuration.
    ///
    /// See [`Auth`] for configuration options.
    pub auth: Auth,

    /// Configuration of the internal task runtime.
    ///
    /// See [`Runtime`] for configuration options.
    pub runtime: Runtime,

    /// Logging configuration.
    ///
    /// See [`Logging`] for configuration options.
    pub logging: Logging,

    /// Sentry error tracking configuration.
    ///
    /// See [`Sentry`] for configuration options.
    pub sentry: Sentry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:3000".parse().unwrap(),
            max_upload_size: 64 * 1024 * 1024,
            static_dir: None,

            object_storage: ObjectStorage::FileSystem {
                path: PathBuf::from("data/objects"),
            },
            user_storage: UserStorage::FileSystem {
                path: PathBuf::from("data/users"),
            },

            auth: Auth::default(),
            runtime: Runtime::default(),
            logging: Logging::default(),
            sentry: Sentry::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the provided arguments.
    ///
    /// Configuration is merged in the following order (later sources
    /// override earlier ones):
    /// 1. Default values
    /// 2. YAML configuration file (if provided)
    /// 3. Environment variables (prefixed with `FG__`)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The YAML configuration file cannot be read or parsed
    /// - Environment variables contain invalid values
    /// - Required fields are missing or invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn configurable_via_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FG__HTTP_ADDR", "127.0.0.1:8080");
            jail.set_env("FG__OBJECT_STORAGE__TYPE", "s3compatible");
            jail.set_env("FG__OBJECT_STORAGE__ENDPOINT", "http://localhost:9000");
            jail.set_env("FG__OBJECT_STORAGE__REGION", "us-east-1");
            jail.set_env("FG__OBJECT_STORAGE__BUCKET", "whatever");
            jail.set_env("FG__OBJECT_STORAGE__PATH_STYLE", "true");
            jail.set_env("FG__AUTH__TOKEN_SECRET", "hunter2");
            jail.set_env("FG__AUTH__TOKEN_VALIDITY", "30m");

            let config = Config::load(None).unwrap();

            assert_eq!(config.http_addr, "127.0.0.1:8080".parse().unwrap());

            let ObjectStorage::S3Compatible {
                endpoint,
                region,
                bucket,
                path_style,
                ..
            } = &dbg!(&config).object_storage
            else {
                panic!("expected s3 storage");
            };
            assert_eq!(endpoint.as_deref(), Some("http://localhost:9000"));
            assert_eq!(region, "us-east-1");
            assert_eq!(bucket, "whatever");
            assert!(*path_style);

            let secret = config.auth.token_secret.unwrap();
            assert_eq!(secret.expose_secret().as_str(), "hunter2");
            assert_eq!(config.auth.token_validity, Duration::from_secs(30 * 60));

            Ok(())
        });
    }

    #[test]
    fn configurable_via_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            http_addr: 0.0.0.0:8000
            object_storage:
                type: filesystem
                path: /data/objects
            user_storage:
                type: filesystem
                path: /data/users
            auth:
                token_secret: hunter2
            sentry:
                dsn: abcde
                environment: production
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|_jail| {
            let config = Config::load(Some(tempfile.path())).unwrap();

            let ObjectStorage::FileSystem { path } = &config.object_storage else {
                panic!("expected filesystem storage");
            };
            assert_eq!(path, Path::new("/data/objects"));

            assert_eq!(
                config.auth.token_secret.unwrap().expose_secret().as_str(),
                "hunter2"
            );
            assert_eq!(config.sentry.dsn.unwrap().expose_secret().as_str(), "abcde");
            assert_eq!(config.sentry.environment.as_deref(), Some("production"));

            Ok(())
        });
    }

    #[test]
    fn configured_with_env_and_yaml() {
        let mut tempfile = tempfile::NamedTempFile::new().unwrap();
        tempfile
            .write_all(
                br#"
            object_storage:
                type: s3compatible
                endpoint: http://localhost:9000
                region: us-east-1
                bucket: whatever
            "#,
            )
            .unwrap();

        figment::Jail::expect_with(|jail| {
            jail.set_env("FG__OBJECT_STORAGE__ENDPOINT", "http://localhost:9001");

            let config = Config::load(Some(tempfile.path())).unwrap();

            let ObjectStorage::S3Compatible { endpoint, .. } = &config.object_storage else {
                panic!("expected s3 storage");
            };
            // Env should overwrite the yaml config
            assert_eq!(endpoint.as_deref(), Some("http://localhost:9001"));

            Ok(())
        });
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FG__AUTH__TOKEN_SECRET", "hunter2");

            let config = Config::load(None).unwrap();
            let debugged = format!("{config:?}");
            assert!(!debugged.contains("hunter2"));

            Ok(())
        });
    }
}
