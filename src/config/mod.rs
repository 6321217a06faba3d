// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(&contents, path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|s| s.to_str());
    let config = if matches!(extension, Some("yaml") | Some("yml")) {
        serde_yaml::from_str(contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")?
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let config = parse_config("data_dir: /var/lib/monitor\n", Path::new("c.yaml")).unwrap();
        assert_eq!(config.data_dir, Path::new("/var/lib/monitor"));
        assert_eq!(config.logs_dir, Path::new(".logs"));
        assert_eq!(config.scheduler.probe_interval_secs, 60);
        assert_eq!(config.scheduler.rotation_interval_secs, 86_400);
        assert!(config.notifier.twilio.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_json_twilio_section() {
        let json = r#"{"notifier": {"twilio": {"account_sid": "AC1", "auth_token": "t", "from_phone": "+15005550006"}}}"#;
        let config = parse_config(json, Path::new("c.json")).unwrap();
        let twilio = config.notifier.twilio.as_ref().unwrap();
        assert_eq!(twilio.api_base, "https://api.twilio.com");
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = parse_config("scheduler:\n  probe_interval_secs: 0\n", Path::new("c.yml")).unwrap();
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "metrics:\n  enabled: true\n  port: 9100\n").await.unwrap();

        let config = load_config(&path).await.unwrap();
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9100);
        assert_eq!(config.metrics.path, "/metrics");
    }
}
