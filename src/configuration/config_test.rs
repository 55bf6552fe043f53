use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    assert!(res.contains("asset-root = \"public\""));
    assert!(res.contains("# gemini-token = \"\""));
    assert!(res.contains("request-timeout = 30000"));
    assert!(!res.contains("config-file"));
}

#[test]
fn it_uses_kebab_case_keys() {
    assert_eq!(ConfigKey::GeminiURL.to_string(), "gemini-url");
    assert_eq!(ConfigKey::RequestTimeout.to_string(), "request-timeout");
    assert_eq!(ConfigKey::AssetRoot.to_string(), "asset-root");
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["docchat", "-c", "./config.example.toml"])?;
    Config::load(vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_invalid_values_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["docchat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_malformed_toml() -> Result<()> {
    let matches = cli::build()
        .try_get_matches_from(vec!["docchat", "-c", "./test/malformed-config.toml"])?;
    let res = Config::load(vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
