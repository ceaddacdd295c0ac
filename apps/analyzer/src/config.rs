use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::analysis::extractor::RetryPolicy;
use crate::analysis::scoring::ScoringWeights;
use crate::llm_client::DEFAULT_MODEL;

const DEFAULT_ALLOWED_MEDIA_TYPES: &str = "application/pdf,text/plain,text/markdown";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_model: String,
    /// Unset means records are kept in memory for the life of the process.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub max_file_size_mb: usize,
    pub allowed_media_types: Vec<String>,
    pub extraction_retry: RetryPolicy,
    pub scoring_weights: ScoringWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| "10".to_string())
            .parse::<usize>()
            .context("MAX_FILE_SIZE_MB must be a positive integer")?;
        if max_file_size_mb == 0 {
            bail!("MAX_FILE_SIZE_MB must be greater than zero");
        }

        let allowed_media_types: Vec<String> = var("ALLOWED_MEDIA_TYPES")
            .unwrap_or_else(|| DEFAULT_ALLOWED_MEDIA_TYPES.to_string())
            .split(',')
            .map(|media_type| media_type.trim().to_lowercase())
            .filter(|media_type| !media_type.is_empty())
            .collect();
        if allowed_media_types.is_empty() {
            bail!("ALLOWED_MEDIA_TYPES must name at least one media type");
        }

        let defaults = RetryPolicy::default();
        let max_attempts = match var("EXTRACTION_MAX_ATTEMPTS") {
            Some(value) => value
                .parse::<u32>()
                .context("EXTRACTION_MAX_ATTEMPTS must be a positive integer")?,
            None => defaults.max_attempts,
        };
        if max_attempts == 0 {
            bail!("EXTRACTION_MAX_ATTEMPTS must be at least 1");
        }
        let base_delay = match var("EXTRACTION_RETRY_BASE_MS") {
            Some(value) => Duration::from_millis(
                value
                    .parse::<u64>()
                    .context("EXTRACTION_RETRY_BASE_MS must be a number of milliseconds")?,
            ),
            None => defaults.base_delay,
        };

        let scoring_weights = match var("SCORING_WEIGHTS") {
            Some(value) => parse_weights(&value)?,
            None => ScoringWeights::default(),
        };

        Ok(Config {
            anthropic_api_key: var("ANTHROPIC_API_KEY").with_context(|| {
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string()
            })?,
            llm_model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            database_url: var("DATABASE_URL"),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_file_size_mb,
            allowed_media_types,
            extraction_retry: RetryPolicy {
                max_attempts,
                base_delay,
            },
            scoring_weights,
        })
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        self.allowed_media_types.iter().any(|allowed| allowed == media_type)
    }
}

/// `technical,experience,education`, e.g. `0.4,0.4,0.2`. Must sum to 1.
fn parse_weights(value: &str) -> Result<ScoringWeights> {
    let weights = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .context("SCORING_WEIGHTS must be three comma-separated numbers")?;
    let &[technical, experience, education] = weights.as_slice() else {
        bail!("SCORING_WEIGHTS must be three comma-separated numbers");
    };
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        bail!("SCORING_WEIGHTS must not be negative");
    }
    if (technical + experience + education - 1.0).abs() > 1e-6 {
        bail!("SCORING_WEIGHTS must sum to 1");
    }
    Ok(ScoringWeights {
        technical,
        experience,
        education,
    })
}

#[cfg(test)]
pub(crate) fn test_config(overrides: &[(&str, &str)]) -> Config {
    let vars: std::collections::HashMap<String, String> = [("ANTHROPIC_API_KEY", "test-key")]
        .iter()
        .chain(overrides)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test config")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.llm_model, DEFAULT_MODEL);
        assert_eq!(config.database_url, None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert!(config.accepts_media_type("application/pdf"));
        assert!(config.accepts_media_type("text/markdown"));
        assert!(!config.accepts_media_type("image/png"));
        assert_eq!(config.extraction_retry, RetryPolicy::default());
        assert_eq!(config.scoring_weights, ScoringWeights::default());
    }

    #[test]
    fn test_api_key_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(load(&[("ANTHROPIC_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_overrides_and_validation() {
        let config = load(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("DATABASE_URL", "postgres://localhost/analyzer"),
            ("ALLOWED_MEDIA_TYPES", " Application/PDF , "),
            ("MAX_FILE_SIZE_MB", "2"),
        ])
        .unwrap();
        assert_eq!(config.allowed_media_types, vec!["application/pdf"]);
        assert_eq!(config.max_file_size_mb, 2);
        assert!(config.database_url.is_some());

        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("MAX_FILE_SIZE_MB", "0")]).is_err());
        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("ALLOWED_MEDIA_TYPES", ",")]).is_err());
        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn test_extraction_retry_overrides() {
        let config = load(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("EXTRACTION_MAX_ATTEMPTS", "5"),
            ("EXTRACTION_RETRY_BASE_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.extraction_retry.max_attempts, 5);
        assert_eq!(config.extraction_retry.base_delay, Duration::from_millis(250));

        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("EXTRACTION_MAX_ATTEMPTS", "0")]).is_err());
        assert!(load(&[("ANTHROPIC_API_KEY", "k"), ("EXTRACTION_RETRY_BASE_MS", "-1")]).is_err());
    }

    #[test]
    fn test_scoring_weights() {
        let config = load(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("SCORING_WEIGHTS", "0.5, 0.3, 0.2"),
        ])
        .unwrap();
        assert_eq!(config.scoring_weights.technical, 0.5);
        assert_eq!(config.scoring_weights.experience, 0.3);
        assert_eq!(config.scoring_weights.education, 0.2);

        for bad in ["0.5,0.5", "0.5,0.5,0.5", "1.2,-0.2,0", "a,b,c"] {
            assert!(
                load(&[("ANTHROPIC_API_KEY", "k"), ("SCORING_WEIGHTS", bad)]).is_err(),
                "{bad} should be rejected"
            );
        }
    }
}
