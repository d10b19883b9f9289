// Runtime configuration, read once from the environment at startup.
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODELS: [&str; 4] = [
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_CACHE_PREFIX: &str = "ops_dashboard_";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bookings_file: String,
    pub exceptions_file: String,
    pub revenue_file: String,
    pub output_dir: PathBuf,
    /// `None` means no credential: insights come from the synthetic generator.
    pub gemini_api_key: Option<String>,
    /// Model variants in preference order.
    pub gemini_models: Vec<String>,
    pub gemini_base_url: String,
    pub cache_prefix: String,
    pub cache_quota_bytes: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            bookings_file: "bookings.csv".to_string(),
            exceptions_file: "exceptions.csv".to_string(),
            revenue_file: "revenue.csv".to_string(),
            output_dir: PathBuf::from("."),
            gemini_api_key: None,
            gemini_models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            cache_quota_bytes: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            data_dir: get("DASHBOARD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            bookings_file: get("DASHBOARD_BOOKINGS_FILE").unwrap_or(defaults.bookings_file),
            exceptions_file: get("DASHBOARD_EXCEPTIONS_FILE").unwrap_or(defaults.exceptions_file),
            revenue_file: get("DASHBOARD_REVENUE_FILE").unwrap_or(defaults.revenue_file),
            output_dir: get("DASHBOARD_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_models: get("GEMINI_MODELS")
                .map(|v| parse_model_list(&v))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.gemini_models),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            cache_prefix: get("DASHBOARD_CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_quota_bytes: get("DASHBOARD_CACHE_QUOTA_BYTES").and_then(|v| v.parse().ok()),
        }
    }

    pub fn bookings_path(&self) -> PathBuf {
        self.data_dir.join(&self.bookings_file)
    }

    pub fn exceptions_path(&self) -> PathBuf {
        self.data_dir.join(&self.exceptions_file)
    }

    pub fn revenue_path(&self) -> PathBuf {
        self.data_dir.join(&self.revenue_file)
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.gemini_models.len(), DEFAULT_MODELS.len());
        assert_eq!(config.bookings_path(), PathBuf::from("./bookings.csv"));
        assert_eq!(config.cache_prefix, DEFAULT_CACHE_PREFIX);
    }

    #[test]
    fn blank_api_key_is_no_credential() {
        let config = config_from(&[("GEMINI_API_KEY", "   ")]);
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn model_list_keeps_order() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODELS", " fast , ,slow"),
            ("DASHBOARD_CACHE_QUOTA_BYTES", "2048"),
            ("DASHBOARD_DATA_DIR", "/data"),
        ]);
        assert_eq!(config.gemini_api_key.as_deref(), Some("k"));
        assert_eq!(config.gemini_models, vec!["fast", "slow"]);
        assert_eq!(config.cache_quota_bytes, Some(2048));
        assert_eq!(config.revenue_path(), PathBuf::from("/data/revenue.csv"));
    }
}
