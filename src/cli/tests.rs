//! Unit tests for CLI commands

use crate::cli::{execute, execute_with, parse_revalidate, Cli, Commands};
use crate::manifest::Revalidate;
use crate::runtime_config::RuntimeConfig;
use clap::Parser;
use std::path::Path;

#[test]
fn test_resolve_command_parses() {
    let cli = Cli::try_parse_from([
        "brrtedge",
        "resolve",
        "--manifests",
        "build",
        "/blog/a?x=1",
        "--host",
        "example.com",
        "-H",
        "authorization: Basic abc",
        "--api",
    ])
    .unwrap();

    match cli.command {
        Commands::Resolve {
            manifests,
            url,
            host,
            headers,
            api,
        } => {
            assert_eq!(manifests.as_deref(), Some(Path::new("build")));
            assert_eq!(url, "/blog/a?x=1");
            assert_eq!(host.as_deref(), Some("example.com"));
            assert_eq!(headers, vec!["authorization: Basic abc".to_string()]);
            assert!(api);
        }
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["brrtedge", "resolve", "--manifests", "build", "/"],
        vec!["brrtedge", "routes", "--manifests", "build"],
        vec!["brrtedge", "cache-control", "--revalidate", "false"],
        vec![
            "brrtedge",
            "cache-control",
            "--revalidate",
            "60",
            "--expires",
            "Wed, 21 Apr 2021 04:47:27 GMT",
        ],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_cache_control_requires_revalidate() {
    assert!(Cli::try_parse_from(["brrtedge", "cache-control"]).is_err());
}

#[test]
fn test_parse_revalidate() {
    assert_eq!(parse_revalidate("false").unwrap(), Revalidate::Never);
    assert_eq!(parse_revalidate(" 60 ").unwrap(), Revalidate::After(60));
    assert!(parse_revalidate("soon").is_err());
}

#[test]
fn test_cache_control_output() {
    let cli = Cli::try_parse_from([
        "brrtedge",
        "cache-control",
        "--revalidate",
        "false",
        "--long-ttl",
        "600",
    ])
    .unwrap();
    let mut out = Vec::new();
    execute(&cli, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["revalidate"], serde_json::json!(false));
    assert_eq!(
        value["cacheControl"],
        "public, max-age=0, s-maxage=600, must-revalidate"
    );
}

#[test]
fn test_cache_control_long_ttl_from_runtime_config() {
    let cli = Cli::try_parse_from(["brrtedge", "cache-control", "--revalidate", "false"]).unwrap();
    let config = RuntimeConfig {
        long_ttl_secs: 900,
        ..RuntimeConfig::default()
    };
    let mut out = Vec::new();
    execute_with(&cli, &config, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        value["cacheControl"],
        "public, max-age=0, s-maxage=900, must-revalidate"
    );
}

#[test]
fn test_cache_control_past_expiry_is_stale() {
    let cli = Cli::try_parse_from([
        "brrtedge",
        "cache-control",
        "--revalidate",
        "60",
        "--expires",
        "Wed, 21 Apr 2021 04:47:27 GMT",
    ])
    .unwrap();
    let mut out = Vec::new();
    execute(&cli, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        value["cacheControl"],
        "public, max-age=0, s-maxage=0, must-revalidate"
    );
}

#[test]
fn test_cache_control_rejects_bad_date() {
    let cli = Cli::try_parse_from([
        "brrtedge",
        "cache-control",
        "--revalidate",
        "60",
        "--expires",
        "yesterday",
    ])
    .unwrap();
    assert!(execute(&cli, &mut Vec::new()).is_err());
}
