//! Service configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    pub const PORT: u16 = 8081;
    pub const ALLOWED_EXTENSIONS: &str = "jpg,jpeg,png";
    pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;
    pub const AWS_REGION: &str = "us-east-1";
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierSettings {
    /// TensorFlow-Serving style REST endpoint.
    Remote { endpoint: String },
    /// TorchScript module loaded in-process.
    Torch { model_path: PathBuf, output_logits: bool },
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    /// Custom S3-compatible endpoint (MinIO, Supabase storage gateway, ...)
    pub endpoint: Option<String>,
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_extensions: Vec<String>,
    pub max_upload_size: usize,
    pub classifier: ClassifierSettings,
    pub labels_path: Option<PathBuf>,
    pub storage: StorageSettings,
    pub predictions_table: String,
    pub treatments_table: String,
    /// Bound on every call to the classifier, blob store and record store.
    pub external_call_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::MissingEnvVar(name));

        let host = var("HOST").unwrap_or_else(|| defaults::HOST.to_string());
        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => defaults::PORT,
        };

        let allowed_extensions = parse_extensions(
            &var("ALLOWED_EXTENSIONS").unwrap_or_else(|| defaults::ALLOWED_EXTENSIONS.to_string()),
        );
        if allowed_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "ALLOWED_EXTENSIONS",
                reason: "at least one extension is required".to_string(),
            });
        }

        let max_upload_size = match var("MAX_UPLOAD_SIZE") {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                name: "MAX_UPLOAD_SIZE",
                reason: e.to_string(),
            })?,
            None => defaults::MAX_UPLOAD_SIZE,
        };

        let backend = var("CLASSIFIER_BACKEND").unwrap_or_else(|| "remote".to_string());
        let classifier = match backend.to_lowercase().as_str() {
            "remote" => ClassifierSettings::Remote {
                endpoint: required("MODEL_URL")?,
            },
            "torch" => ClassifierSettings::Torch {
                model_path: PathBuf::from(required("MODEL_PATH")?),
                output_logits: parse_bool("MODEL_OUTPUT_LOGITS", var("MODEL_OUTPUT_LOGITS"))?,
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "CLASSIFIER_BACKEND",
                    reason: format!("expected 'remote' or 'torch', got '{}'", other),
                });
            }
        };

        let bucket = required("S3_BUCKET_NAME")?;
        let region = var("AWS_REGION").unwrap_or_else(|| defaults::AWS_REGION.to_string());
        let endpoint = var("S3_ENDPOINT");
        let public_base_url = var("S3_PUBLIC_BASE_URL").unwrap_or_else(|| match &endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        });

        let external_call_timeout = match var("EXTERNAL_CALL_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    name: "EXTERNAL_CALL_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            allowed_extensions,
            max_upload_size,
            classifier,
            labels_path: var("DISEASE_LABELS_PATH").map(PathBuf::from),
            storage: StorageSettings {
                bucket,
                region,
                endpoint,
                public_base_url,
            },
            predictions_table: required("DYNAMODB_PREDICTIONS_TABLE")?,
            treatments_table: required("DYNAMODB_TREATMENTS_TABLE")?,
            external_call_timeout,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn parse_bool(name: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            name,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
