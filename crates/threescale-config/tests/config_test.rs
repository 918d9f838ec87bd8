// Integration tests for profile loading and credential resolution.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;

use threescale_api::{Credentials, TlsMode};
use threescale_config::{
    Config, ConfigError, Defaults, Profile, load_config_from, log_filter,
    profile_to_client_config, resolve_credentials, save_config_to,
};

// ── Helpers ─────────────────────────────────────────────────────────

const SAMPLE: &str = r#"
default_profile = "prod"

[defaults]
timeout = 10

[profiles.prod]
endpoint = "https://acme-admin.3scale.net"
access_token_env = "PROD_TOKEN"

[profiles.staging]
endpoint = "https://staging-admin.example.com"
provider_key = "plain-key"
insecure = true
timeout = 60
"#;

fn profile(endpoint: &str) -> Profile {
    Profile {
        endpoint: endpoint.into(),
        ..Profile::default()
    }
}

// ── Loading ─────────────────────────────────────────────────────────

#[test]
fn loads_profiles_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        let config = load_config_from(Path::new("config.toml")).unwrap();

        assert_eq!(config.default_profile.as_deref(), Some("prod"));
        assert_eq!(config.defaults.timeout, 10);
        assert_eq!(config.defaults.log_level, "warn");
        assert_eq!(config.profiles.len(), 2);

        let (name, prod) = config.profile(None).unwrap();
        assert_eq!(name, "prod");
        assert_eq!(prod.access_token_env.as_deref(), Some("PROD_TOKEN"));
        Ok(())
    });
}

#[test]
fn missing_file_yields_defaults() {
    Jail::expect_with(|_| {
        let config = load_config_from(Path::new("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        Ok(())
    });
}

#[test]
fn environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        jail.set_env("THREESCALE_DEFAULTS__TIMEOUT", "5");
        jail.set_env("THREESCALE_PROFILES__PROD__ENDPOINT", "https://other-admin.example.com");

        let config = load_config_from(Path::new("config.toml")).unwrap();
        assert_eq!(config.defaults.timeout, 5);
        assert_eq!(
            config.profiles["prod"].endpoint,
            "https://other-admin.example.com"
        );
        Ok(())
    });
}

#[test]
fn unknown_profile_is_a_validation_error() {
    let config = Config::default();
    let err = config.profile(Some("nope")).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

#[test]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "default".into(),
        Profile {
            provider_key: Some("k".into()),
            timeout: Some(15),
            ..profile("https://acme-admin.3scale.net")
        },
    );
    save_config_to(&config, &path).unwrap();

    assert_eq!(load_config_from(&path).unwrap(), config);
}

// ── Credentials ─────────────────────────────────────────────────────

#[test]
fn named_env_var_beats_plaintext() {
    Jail::expect_with(|jail| {
        jail.set_env("MY_TOKEN", "from-env");
        let p = Profile {
            access_token: Some("from-file".into()),
            access_token_env: Some("MY_TOKEN".into()),
            ..profile("https://acme-admin.3scale.net")
        };

        let creds = resolve_credentials(&p, "default").unwrap();
        assert!(matches!(creds, Credentials::AccessToken(_)));
        assert_eq!(
            creds.header_value().unwrap().to_str().unwrap(),
            "Bearer from-env"
        );
        Ok(())
    });
}

#[test]
fn fallback_env_var_supplies_provider_key() {
    Jail::expect_with(|jail| {
        jail.set_env("THREESCALE_PROVIDER_KEY", "abc");
        let creds = resolve_credentials(&profile("https://a.example.com"), "default").unwrap();
        assert!(matches!(creds, Credentials::ProviderKey(_)));
        Ok(())
    });
}

#[test]
fn profile_without_credentials_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("THREESCALE_ACCESS_TOKEN", "");
        jail.set_env("THREESCALE_PROVIDER_KEY", "");
        let err = resolve_credentials(&profile("https://a.example.com"), "empty").unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "empty"));
        Ok(())
    });
}

// ── ClientConfig translation ────────────────────────────────────────

#[test]
fn translates_tls_and_timeout() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", SAMPLE)?;
        let config = load_config_from(Path::new("config.toml")).unwrap();
        let (name, staging) = config.profile(Some("staging")).unwrap();

        let client = profile_to_client_config(staging, name, &config.defaults).unwrap();
        assert_eq!(client.endpoint, "https://staging-admin.example.com");
        assert!(matches!(client.transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(client.transport.timeout, Duration::from_secs(60));
        assert!(matches!(client.credentials, Credentials::ProviderKey(_)));
        Ok(())
    });
}

#[test]
fn custom_ca_and_default_timeout() {
    Jail::expect_with(|_| {
        let p = Profile {
            provider_key: Some("k".into()),
            ca_cert: Some("ca.pem".into()),
            ..profile("https://acme-admin.3scale.net")
        };
        let client = profile_to_client_config(&p, "default", &Defaults::default()).unwrap();
        assert!(matches!(
            client.transport.tls,
            TlsMode::CustomCa(ref path) if path == Path::new("ca.pem")
        ));
        assert_eq!(client.transport.timeout, Duration::from_secs(30));
        Ok(())
    });
}

#[test]
fn invalid_endpoint_is_rejected() {
    for endpoint in ["not a url", "ftp://acme.example.com"] {
        let p = Profile {
            provider_key: Some("k".into()),
            ..profile(endpoint)
        };
        let err = profile_to_client_config(&p, "default", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));
    }
}

// ── Logging ─────────────────────────────────────────────────────────

#[test]
fn invalid_log_directive_names_its_source() {
    Jail::expect_with(|jail| {
        jail.set_env("THREESCALE_LOG", "threescale_api=loud");
        let err = log_filter("warn").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation { ref field, .. } if field == "THREESCALE_LOG"
        ));
        Ok(())
    });
}

#[test]
fn log_filter_prefers_threescale_log() {
    Jail::expect_with(|jail| {
        jail.set_env("THREESCALE_LOG", "threescale_api=trace");
        jail.set_env("RUST_LOG", "error");
        let filter = log_filter("warn").unwrap();
        assert_eq!(filter.to_string(), "threescale_api=trace");
        Ok(())
    });
}

#[test]
fn log_filter_falls_back_to_level() {
    Jail::expect_with(|jail| {
        jail.set_env("THREESCALE_LOG", "");
        jail.set_env("RUST_LOG", "");
        let filter = log_filter("debug").unwrap();
        assert_eq!(filter.to_string(), "debug");
        Ok(())
    });
}
