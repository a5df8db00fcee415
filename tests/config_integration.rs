//! Configuration Integration Tests
//!
//! File loading, environment overlays and validation.

use std::io::Write;

use serial_test::serial;
use soundswap_bot::core::Config;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn clear_env() {
    for var in [
        "DISCORD_PUBLIC_KEY",
        "DISCORD_BOT_TOKEN",
        "DISCORD_APP_ID",
        "DISCORD_CHANNEL_ID",
        "SERPAPI_KEY",
        "GEMINI_API_KEY",
        "SOUNDSWAP_HOST",
        "SOUNDSWAP_PORT",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = config_file(
        r#"
[server]
port = 9000

[search]
queries = ["granular synthesis"]
"#,
    );

    let config = Config::load_from_file(file.path()).unwrap();
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.search.queries, vec!["granular synthesis".to_string()]);
    assert_eq!(config.search.max_concurrency, 2);
    assert_eq!(config.session.ttl_secs, 1800);
}

#[test]
fn test_malformed_file_is_rejected() {
    let file = config_file("[server\nport = ");
    assert!(Config::load_from_file(file.path()).is_err());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
[discord]
bot_token = "from-file"
application_id = "111"
"#,
    );

    std::env::set_var("DISCORD_BOT_TOKEN", "from-env");
    std::env::set_var("SOUNDSWAP_PORT", "7070");
    std::env::set_var("SERPAPI_KEY", "serp");

    let config = Config::load_with_env(file.path()).unwrap();
    assert_eq!(config.discord.bot_token.as_deref(), Some("from-env"));
    assert_eq!(config.discord.application_id.as_deref(), Some("111"));
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.search.api_key.as_deref(), Some("serp"));

    clear_env();
}

#[test]
#[serial]
fn test_blank_env_values_are_ignored() {
    clear_env();
    let file = config_file("[ai]\napi_key = \"file-key\"\n");

    std::env::set_var("GEMINI_API_KEY", "   ");
    std::env::set_var("SOUNDSWAP_PORT", "not-a-port");

    let config = Config::load_with_env(file.path()).unwrap();
    assert_eq!(config.ai.api_key.as_deref(), Some("file-key"));
    assert_eq!(config.server.port, 8000);

    clear_env();
}

#[test]
#[serial]
fn test_validation_runs_after_env() {
    clear_env();
    let file = config_file("[search]\nqueries = []\n");
    let err = Config::load_with_env(file.path()).unwrap_err();
    assert!(err.to_string().contains("search.queries"));

    let file = config_file("[search]\nmax_concurrency = 0\n");
    let err = Config::load_with_env(file.path()).unwrap_err();
    assert!(err.to_string().contains("max_concurrency"));
}

#[test]
fn test_redacted_round_trips_through_toml() {
    let mut config = Config::default();
    config.discord.public_key = Some("abcdef".to_string());
    config.ai.api_key = Some("secret".to_string());

    let text = toml::to_string_pretty(&config.redacted()).unwrap();
    assert!(!text.contains("abcdef"));
    assert!(!text.contains("secret"));

    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.discord.public_key.as_deref(), Some("***"));
    assert_eq!(parsed.server.port, config.server.port);
}
