//! Coverage for config parsing and loading.

use std::io::Write;
use std::path::{Path, PathBuf};

use quarry::config::{load_config, BingConfig, Config, OpenAiConfig, ResearchConfig};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = match tempfile::NamedTempFile::new() {
        Ok(file) => file,
        Err(err) => panic!("temp file should be created: {err}"),
    };
    if let Err(err) = file.write_all(contents.as_bytes()) {
        panic!("temp file should be writable: {err}");
    }
    file
}

#[test]
fn defaults_point_at_public_endpoints() {
    let openai = OpenAiConfig::default();
    assert_eq!(openai.api_key_env, "OPENAI_API_KEY");
    assert_eq!(openai.base_url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(openai.timeout_secs, 60);

    let bing = BingConfig::default();
    assert_eq!(bing.endpoint, "https://api.bing.microsoft.com/v7.0/search");
    assert_eq!(bing.count, 10);

    assert_eq!(ResearchConfig::default().model, "gpt-4o");
}

#[test]
fn load_full_config() {
    let file = write_config(
        r#"
[research]
model = "gpt-4o-mini"

[models.openai]
api_key_env = "MY_OPENAI_KEY"
base_url = "http://localhost:8080/v1/chat/completions"
timeout_secs = 15

[search.bing]
api_key_env = "MY_BING_KEY"
count = 25
market = "en-US"

[telemetry]
path = "/tmp/quarry-telemetry.jsonl"
"#,
    );

    let config = match load_config(file.path()) {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.research.model, "gpt-4o-mini");
    assert_eq!(config.models.openai.api_key_env, "MY_OPENAI_KEY");
    assert_eq!(config.models.openai.timeout_secs, 15);
    assert_eq!(config.search.bing.count, 25);
    assert_eq!(config.search.bing.market.as_deref(), Some("en-US"));
    assert_eq!(config.search.bing.timeout_secs, 30);
    assert_eq!(
        config.telemetry.path,
        Some(PathBuf::from("/tmp/quarry-telemetry.jsonl"))
    );
}

#[test]
fn partial_config_keeps_defaults() {
    let file = write_config("[search.bing]\ncount = 3\n");
    let config = match load_config(file.path()) {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.search.bing.count, 3);
    assert_eq!(config.search.bing.api_key_env, "BING_SEARCH_API_KEY");
    assert_eq!(config.research, ResearchConfig::default());
}

#[test]
fn missing_file_is_an_error() {
    let result = load_config(Path::new("/nonexistent/quarry/config.toml"));
    let err = match result {
        Ok(_) => panic!("missing file should fail"),
        Err(err) => err.to_string(),
    };
    assert!(err.contains("failed to read config"));
}

#[test]
fn invalid_toml_is_an_error() {
    let file = write_config("[research\nmodel = ");
    let err = match load_config(file.path()) {
        Ok(_) => panic!("invalid TOML should fail"),
        Err(err) => err.to_string(),
    };
    assert!(err.contains("failed to parse config"));
}

#[test]
fn wrong_value_type_is_an_error() {
    let config = toml::from_str::<Config>("[search.bing]\ncount = \"ten\"\n");
    assert!(config.is_err());
}
