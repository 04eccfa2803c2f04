//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `INTAKE_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `INTAKE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `INTAKE_UPLOADS__MAX_UPLOAD_SIZE=1048576` sets the `uploads.max_upload_size` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use intake::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}", config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! INTAKE_PORT=8080
//! INTAKE_UPLOADS__DIR=/var/lib/intake/uploads
//! INTAKE_UPLOADS__ALLOWED_TYPES='[image/png, image/jpeg]'
//! INTAKE_JSON__ALLOW_UNKNOWN_FIELDS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;
use crate::ingest::{JsonIngestSpec, UploadSpec};
use crate::ingest::json::DEFAULT_MAX_BODY_SIZE;

/// Default per-file upload limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "INTAKE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty or missing config file yields a working server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Multipart upload handling
    pub uploads: UploadsConfig,
    /// JSON request body handling
    pub json: JsonConfig,
    /// Where downloadable files are served from
    pub downloads: DownloadsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            uploads: UploadsConfig::default(),
            json: JsonConfig::default(),
            downloads: DownloadsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Directory uploaded files are written to (created on first upload)
    pub dir: PathBuf,
    /// Accepted MIME types, matched against the sniffed content. Empty accepts anything.
    pub allowed_types: Vec<String>,
    /// Maximum size of a single uploaded file in bytes
    pub max_upload_size: u64,
    /// Store files under random names instead of the client-supplied name
    pub rename: bool,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            allowed_types: Vec::new(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            rename: true,
        }
    }
}

impl UploadsConfig {
    pub fn upload_spec(&self) -> UploadSpec {
        UploadSpec {
            allowed_types: self.allowed_types.clone(),
            max_upload_size: self.max_upload_size,
            rename_on_conflict: self.rename,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsonConfig {
    /// Maximum JSON body size in bytes
    pub max_body_size: u64,
    /// Silently ignore object keys the target type does not declare
    pub allow_unknown_fields: bool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            allow_unknown_fields: false,
        }
    }
}

impl JsonConfig {
    pub fn json_spec(&self) -> JsonIngestSpec {
        JsonIngestSpec {
            max_body_size: self.max_body_size,
            allow_unknown_fields: self.allow_unknown_fields,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadsConfig {
    pub dir: PathBuf,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.json.max_body_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: json.max_body_size must be greater than 0".to_string(),
            });
        }

        if self.uploads.max_upload_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: uploads.max_upload_size must be greater than 0".to_string(),
            });
        }

        if self.uploads.dir.as_os_str().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: uploads.dir must not be empty".to_string(),
            });
        }

        for allowed in &self.uploads.allowed_types {
            if !is_media_type(allowed) {
                return Err(Error::Internal {
                    operation: format!("Config validation: uploads.allowed_types entry '{allowed}' is not a type/subtype media type"),
                });
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("INTAKE_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_media_type(value: &str) -> bool {
    let valid_token = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c));

    match value.trim().split_once('/') {
        Some((kind, subtype)) => valid_token(kind) && valid_token(subtype),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.bind_address(), "0.0.0.0:3001");
            assert_eq!(config.json.max_body_size, 1024 * 1024);
            assert!(!config.json.allow_unknown_fields);
            assert!(config.uploads.rename);
            assert!(config.uploads.allowed_types.is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_yaml_sections() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 9000
uploads:
  dir: /tmp/uploads
  allowed_types: [image/png, image/gif]
  max_upload_size: 2048
  rename: false
json:
  max_body_size: 512
  allow_unknown_fields: true
downloads:
  dir: /srv/files
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 9000);

            let upload_spec = config.uploads.upload_spec();
            assert_eq!(upload_spec.allowed_types, vec!["image/png", "image/gif"]);
            assert_eq!(upload_spec.max_upload_size, 2048);
            assert!(!upload_spec.rename_on_conflict);
            assert_eq!(config.uploads.dir, PathBuf::from("/tmp/uploads"));

            let json_spec = config.json.json_spec();
            assert_eq!(json_spec.max_body_size, 512);
            assert!(json_spec.allow_unknown_fields);

            assert_eq!(config.downloads.dir, PathBuf::from("/srv/files"));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 127.0.0.1
json:
  max_body_size: 100
"#,
            )?;

            jail.set_env("INTAKE_PORT", "8080");
            jail.set_env("INTAKE_JSON__MAX_BODY_SIZE", "200");
            jail.set_env("INTAKE_UPLOADS__RENAME", "false");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert_eq!(config.json.max_body_size, 200);
            assert!(!config.uploads.rename);

            Ok(())
        });
    }

    #[test]
    fn test_unknown_key_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "uploads:\n  max_size: 10\n")?;

            let result = Config::load(&args("test.yaml"));
            assert!(result.is_err());

            Ok(())
        });
    }

    #[test]
    fn test_zero_sizes_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("zero_json.yaml", "json:\n  max_body_size: 0\n")?;
            jail.create_file("zero_upload.yaml", "uploads:\n  max_upload_size: 0\n")?;

            let err = Config::load(&args("zero_json.yaml")).unwrap_err();
            assert!(err.to_string().contains("json.max_body_size"));

            let err = Config::load(&args("zero_upload.yaml")).unwrap_err();
            assert!(err.to_string().contains("uploads.max_upload_size"));

            Ok(())
        });
    }

    #[test]
    fn test_allowed_types_must_be_media_types() {
        let mut config = Config::default();
        config.uploads.allowed_types = vec!["image/png".to_string(), "png".to_string()];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'png'"));

        config.uploads.allowed_types = vec!["image/svg+xml".to_string(), "application/vnd.ms-excel".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_upload_dir_rejected() {
        let mut config = Config::default();
        config.uploads.dir = PathBuf::new();

        assert!(config.validate().is_err());
    }
}
