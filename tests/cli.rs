//! End-to-end tests of the `apiscope` binary

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config and environment
fn apiscope(dir: &Path) -> anyhow::Result<Command> {
    let config = dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "")?;
    }

    let mut cmd = Command::cargo_bin("apiscope")?;
    cmd.current_dir(dir)
        .env("APISCOPE_CONFIG", &config)
        .env_remove("APISCOPE_TOKEN")
        .env_remove("APISCOPE_CATALOG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    Ok(cmd)
}

#[test]
fn test_query_prints_url() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["query", "-a", "Data API (Delayed)", "-e", "Strikes"])
        .args(["--token", "T1", "-p", "dte=30,45"])
        .assert()
        .success()
        .stdout("https://api.orats.io/datav2/strikes?token=T1&ticker=AAPL&dte=30,45\n");
    Ok(())
}

#[test]
fn test_query_uppercases_ticker_override() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["query", "-a", "Data API (Delayed)", "-e", "Tickers", "-p", "ticker=msft"])
        .assert()
        .success()
        .stdout("https://api.orats.io/datav2/tickers?ticker=MSFT\n");
    Ok(())
}

#[test]
fn test_unknown_parameter_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["query", "-a", "Data API (Delayed)", "-e", "Tickers", "-p", "dte=30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no parameter 'dte'"));
    Ok(())
}

#[test]
fn test_unknown_api_lists_available() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["query", "-a", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Data API (Live)"));
    Ok(())
}

#[test]
fn test_snippet_python_keeps_unquoted_url() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["snippet", "-a", "Data API (Delayed)", "-e", "Tickers", "--token", "T1"])
        .args(["--syntax", "python"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("import requests\n"))
        .stdout(predicate::str::contains(
            "url = https://api.orats.io/datav2/tickers?token=T1&ticker=AAPL\n",
        ));
    Ok(())
}

#[test]
fn test_snippet_syntax_from_config() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("config.toml"), "[console]\nsyntax = \"r\"\n")?;
    apiscope(dir.path())?
        .args(["snippet", "-a", "Data API (Delayed)", "-e", "Tickers"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("library(RCurl)\n"));
    Ok(())
}

#[test]
fn test_token_from_env() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .env("APISCOPE_TOKEN", "envtoken")
        .args(["query", "-a", "Data API (Delayed)", "-e", "Tickers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token=envtoken"));
    Ok(())
}

#[test]
fn test_apis_lists_catalog() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["apis", "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Intraday Data API (Delayed)"))
        .stdout(predicate::str::contains("Data API (Live)"));
    Ok(())
}

#[test]
fn test_endpoints_default_to_second_api() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["endpoints", "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/datav2/live/one-minute/strikes/chain"));
    Ok(())
}

#[test]
fn test_fields_suggestions() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["fields", "-a", "Data API (Delayed)", "-e", "Strikes", "ticker,tradeD"])
        .args(["--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("tradeDate\n"));
    Ok(())
}

#[test]
fn test_fields_without_definitions_fails() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["fields", "-a", "Data API (Delayed)", "-e", "Tickers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no field definitions"));
    Ok(())
}

#[test]
fn test_scripted_console() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["console", "--token", "T1"])
        .write_stdin(
            "api Data API (Delayed)\n\
             endpoint Strikes\n\
             set ticker msft\n\
             set fields tick\n\
             key fields enter\n\
             url\n\
             quit\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "https://api.orats.io/datav2/strikes?token=T1&ticker=MSFT&fields=ticker\n",
        ));
    Ok(())
}

#[test]
fn test_scripted_console_stops_on_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .arg("console")
        .write_stdin("endpoint Nope\nurl\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no endpoint 'Nope'"));
    Ok(())
}

#[test]
fn test_config_set_and_get() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?
        .args(["config", "api.token", "abc123"])
        .assert()
        .success();

    apiscope(dir.path())?
        .args(["config", "api.token"])
        .assert()
        .success()
        .stdout("abc123\n");

    apiscope(dir.path())?
        .args(["query", "-a", "Data API (Delayed)", "-e", "Tickers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("token=abc123"));
    Ok(())
}

#[test]
fn test_init_creates_config() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    apiscope(dir.path())?.arg("init").assert().success();
    assert!(dir.path().join(".apiscope").join("config.toml").exists());

    apiscope(dir.path())?
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    Ok(())
}
