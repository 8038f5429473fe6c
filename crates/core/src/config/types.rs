use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub search: SearchDefaults,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Remote service connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Service base URL (default: "https://mpcfill.com/")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum outbound calls per second, shared by all call sites (default: 10)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_second: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            rate_limit_per_second: default_rate_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://mpcfill.com/".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_rate_limit() -> f64 {
    10.0
}

/// Defaults applied to search settings built by the CLI
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchDefaults {
    #[serde(default = "default_minimum_dpi")]
    pub minimum_dpi: i32,
    #[serde(default = "default_maximum_dpi")]
    pub maximum_dpi: i32,
    /// Maximum file size in MB
    #[serde(default = "default_maximum_size")]
    pub maximum_size: i32,
    #[serde(default)]
    pub fuzzy_search: bool,
    #[serde(default)]
    pub filter_cardbacks: bool,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            minimum_dpi: default_minimum_dpi(),
            maximum_dpi: default_maximum_dpi(),
            maximum_size: default_maximum_size(),
            fuzzy_search: false,
            filter_cardbacks: false,
        }
    }
}

fn default_minimum_dpi() -> i32 {
    600
}

fn default_maximum_dpi() -> i32 {
    1500
}

fn default_maximum_size() -> i32 {
    30
}

/// Download batch settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Concurrent downloads (default: 1)
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// File name template; supports {index}, {name}, {ext} and {id}
    #[serde(default = "default_filename_format")]
    pub filename_format: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            filename_format: default_filename_format(),
        }
    }
}

fn default_threads() -> usize {
    1
}

fn default_filename_format() -> String {
    "{index}_{name}.{ext}".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.client.base_url, "https://mpcfill.com/");
        assert_eq!(config.client.timeout_secs, 10);
        assert_eq!(config.client.rate_limit_per_second, 10.0);
        assert_eq!(config.search.minimum_dpi, 600);
        assert_eq!(config.search.maximum_dpi, 1500);
        assert_eq!(config.search.maximum_size, 30);
        assert_eq!(config.download.threads, 1);
        assert_eq!(config.download.filename_format, "{index}_{name}.{ext}");
    }

    #[test]
    fn test_deserialize_client_section() {
        let toml = r#"
[client]
base_url = "http://localhost:8000"
timeout_secs = 30
rate_limit_per_second = 2.5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.client.base_url, "http://localhost:8000");
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.client.rate_limit_per_second, 2.5);
        // Untouched sections keep defaults
        assert_eq!(config.download.threads, 1);
    }

    #[test]
    fn test_deserialize_partial_search_section() {
        let toml = r#"
[search]
minimum_dpi = 300
fuzzy_search = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.search.minimum_dpi, 300);
        assert_eq!(config.search.maximum_dpi, 1500);
        assert!(config.search.fuzzy_search);
        assert!(!config.search.filter_cardbacks);
    }

    #[test]
    fn test_deserialize_download_section() {
        let toml = r#"
[download]
threads = 8
filename_format = "{id}.{ext}"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.download.threads, 8);
        assert_eq!(config.download.filename_format, "{id}.{ext}");
    }
}
