use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

const ENV_PREFIX: &str = "MPCFILL_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from an optional file.
///
/// Without a path, built-in defaults are used and environment variables
/// still apply.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[client]
timeout_secs = 5

[download]
threads = 4
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.client.timeout_secs, 5);
        assert_eq!(config.download.threads, 4);
    }

    #[test]
    fn test_load_config_from_str_wrong_type() {
        let toml = r#"
[client]
timeout_secs = "soon"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/mpcfill.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[client]
base_url = "http://127.0.0.1:8000/"
rate_limit_per_second = 4.0

[search]
maximum_dpi = 1200
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.client.base_url, "http://127.0.0.1:8000/");
        assert_eq!(config.client.rate_limit_per_second, 4.0);
        assert_eq!(config.search.maximum_dpi, 1200);
        assert_eq!(config.search.minimum_dpi, 600);
    }

    #[test]
    fn test_load_config_or_default_without_file() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.download.filename_format, "{index}_{name}.{ext}");
    }
}
