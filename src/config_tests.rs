//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.kraken.base_url, "https://api.kraken.com");
        assert_eq!(config.kraken.pair, "XBTUSD");
        assert_eq!(config.kraken.candle_window_minutes, 15);
        assert_eq!(config.kraken.timeout_secs, 30);
        assert_eq!(config.paper.log_path, PathBuf::from("./logs/paper_trades.csv"));
        assert_eq!(config.feed.poll_interval_secs, 5);
        assert!(config.feed.market_slug.is_none());
        assert!(!config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 8080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_kraken_config_partial() {
        let toml_str = r#"
pair = "ETHUSD"
"#;
        let config: KrakenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pair, "ETHUSD");
        assert_eq!(config.base_url, "https://api.kraken.com");
        assert_eq!(config.candle_window_minutes, 15);
    }

    #[test]
    fn test_full_config() {
        let toml_str = r#"
[kraken]
base_url = "http://localhost:9000"
pair = "SOLUSD"
candle_window_minutes = 5
timeout_secs = 3

[paper]
log_path = "/tmp/paper.csv"

[feed]
poll_interval_secs = 2
market_slug = "sol-updown-5m-1714564800"

[dashboard]
enabled = true
port = 9090
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.kraken.base_url, "http://localhost:9000");
        assert_eq!(config.kraken.candle_window_minutes, 5);
        assert_eq!(config.paper.log_path, PathBuf::from("/tmp/paper.csv"));
        assert_eq!(config.feed.market_slug.as_deref(), Some("sol-updown-5m-1714564800"));
        assert!(config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 9090);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.kraken.candle_window_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_pair() {
        let mut config = Config::default();
        config.kraken.pair = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.feed.poll_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.toml");
        std::fs::write(
            &path,
            "[kraken]\npair = \"XRPUSD\"\n\n[paper]\nlog_path = \"trades.csv\"\n",
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.kraken.pair, "XRPUSD");
        assert_eq!(config.paper.log_path, PathBuf::from("trades.csv"));
        assert_eq!(config.feed.poll_interval_secs, 5);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.kraken.candle_window_minutes, 15);
    }
}
