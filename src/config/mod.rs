mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./reelid.toml",
        "~/.config/reelid/config.toml",
        "/etc/reelid/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Overlay environment-style configuration onto a loaded config.
///
/// `THEMOVIEDB_API`, `PORT`, `HOST`, and `REELID_DB` take precedence over
/// anything in the file, matching how the service is deployed in containers.
pub fn apply_env(config: &mut Config) {
    if let Ok(key) = std::env::var("THEMOVIEDB_API") {
        if !key.is_empty() {
            config.backend.api_key = key;
        }
    }
    if let Ok(port) = std::env::var("PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => tracing::warn!("Ignoring unparseable PORT value: {port}"),
        }
    }
    if let Ok(host) = std::env::var("HOST") {
        if !host.is_empty() {
            config.server.host = host;
        }
    }
    if let Ok(db) = std::env::var("REELID_DB") {
        if !db.is_empty() {
            config.store.path = db;
        }
    }
}

/// Validate configuration before the service accepts traffic.
///
/// A missing or implausibly short backend credential must stop startup —
/// serving with a broken key would turn every resolution into a backend
/// error.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.backend.api_key.len() < 10 {
        anyhow::bail!(
            "Backend API key is missing or implausibly short; set THEMOVIEDB_API or backend.api_key"
        );
    }

    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.backend.base_url.is_empty() {
        anyhow::bail!("backend.base_url cannot be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_fails_validation() {
        // No API key by default; the service must refuse to start.
        let config = Config::default();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_with_key_passes_validation() {
        let mut config = Config::default();
        config.backend.api_key = "abcdef1234567890".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_short_key_fails_validation() {
        let mut config = Config::default();
        config.backend.api_key = "short".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [backend]
            api_key = "abcdef1234567890"

            [server]
            port = 8099
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8099);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.backend.language, "en-US");
        assert_eq!(config.episodes.freshness_days, 7);
    }
}
