//! Unit tests for configuration loading and validation.

use std::ffi::OsString;

use env_lock::lock_env;
use rstest::rstest;

use super::*;
use crate::test_support::cap_fs::is_directory;
use crate::test_support::uploads::scratch_upload_settings;

const APP_VARS: [&str; 8] = [
    "APP_SERVER_PORT",
    "APP_ENVIRONMENT",
    "APP_DEBUG",
    "APP_DATABASE_URL",
    "APP_GEMINI_API_KEY",
    "APP_LOG_LEVEL",
    "APP_LOG_FORMAT",
    "APP_RUN_MIGRATIONS",
];

fn load_from_empty_args() -> AppSettings {
    AppSettings::load_from_iter([OsString::from("ebook-summary")]).expect("config should load")
}

fn cleared_env() -> Vec<(&'static str, Option<String>)> {
    APP_VARS.iter().map(|name| (*name, None)).collect()
}

#[rstest]
fn defaults_apply_when_nothing_is_set() {
    let _guard = lock_env(cleared_env());

    let config = load_from_empty_args().validate().expect("defaults are valid");
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8000);
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.debug, cfg!(debug_assertions));
    assert_eq!(config.app_name, "ebook_summary");
    assert!(config.database.is_none());
    assert!(!config.generative.has_api_key());
    assert_eq!(config.generative.model, "gemini-1.5-flash");
    assert_eq!(config.generative.retry_policy.max_retries(), 3);
    assert_eq!(
        config.generative.retry_policy.initial_delay(),
        Duration::from_secs(1)
    );
    assert_eq!(config.uploads.max_upload_size_bytes, 104_857_600);
    assert_eq!(config.uploads.upload_dir, PathBuf::from("./uploads"));
    assert_eq!(config.logging, LoggingSettings::default());
    assert_eq!(config.retention.document_retention_days, 30);
    assert_eq!(
        config.retention.cleanup_job_time,
        NaiveTime::from_hms_opt(2, 0, 0).expect("valid time")
    );
}

#[rstest]
fn environment_overrides_are_respected() {
    let _guard = lock_env([
        ("APP_SERVER_PORT", Some("9090".to_owned())),
        ("APP_ENVIRONMENT", Some("production".to_owned())),
        ("APP_DEBUG", Some("false".to_owned())),
        (
            "APP_DATABASE_URL",
            Some("postgresql://app:secret@db:5432/ebooks".to_owned()),
        ),
        ("APP_GEMINI_API_KEY", Some("key-123".to_owned())),
        ("APP_LOG_LEVEL", Some("warning".to_owned())),
        ("APP_LOG_FORMAT", Some("text".to_owned())),
        ("APP_RUN_MIGRATIONS", Some("true".to_owned())),
    ]);

    let config = load_from_empty_args().validate().expect("overrides are valid");
    assert_eq!(config.port, 9090);
    assert_eq!(config.environment, Environment::Production);
    assert!(!config.debug);
    let database = config.database.expect("database configured");
    assert_eq!(database.url.as_str(), "postgresql://app:secret@db:5432/ebooks");
    assert!(database.run_migrations);
    assert_eq!(database.pool_size, 20);
    assert!(config.generative.has_api_key());
    assert_eq!(config.logging.level, LogLevel::Warning);
    assert_eq!(config.logging.format, LogFormat::Text);
}

#[rstest]
#[case("true", true)]
#[case("false", false)]
fn boolean_environment_values_survive_cli_merge(#[case] raw: &str, #[case] expected: bool) {
    let overrides = [
        ("APP_DEBUG", raw),
        ("APP_RUN_MIGRATIONS", raw),
        ("APP_DATABASE_URL", "postgres://db/ebooks"),
    ];
    let mut vars = cleared_env();
    for (name, value) in &mut vars {
        if let Some((_, raw_value)) = overrides.iter().find(|(key, _)| key == name) {
            *value = Some((*raw_value).to_owned());
        }
    }
    let _guard = lock_env(vars);

    let settings = load_from_empty_args();
    assert_eq!(settings.debug, Some(expected));
    assert_eq!(settings.run_migrations, Some(expected));
    let config = settings.validate().expect("valid");
    assert_eq!(config.debug, expected);
    assert_eq!(
        config.database.expect("database configured").run_migrations,
        expected
    );
}

#[rstest]
fn unset_booleans_stay_absent() {
    let _guard = lock_env(cleared_env());

    let settings = load_from_empty_args();
    assert_eq!(settings.debug, None);
    assert_eq!(settings.run_migrations, None);
}

#[rstest]
#[case(AppSettings { server_port: Some(0), ..AppSettings::default() }, SettingsError::InvalidPort)]
#[case(
    AppSettings { environment: Some("qa".into()), ..AppSettings::default() },
    SettingsError::UnknownEnvironment("qa".into())
)]
#[case(
    AppSettings { log_level: Some("TRACE".into()), ..AppSettings::default() },
    SettingsError::UnknownLogLevel("TRACE".into())
)]
#[case(
    AppSettings { log_format: Some("xml".into()), ..AppSettings::default() },
    SettingsError::UnknownLogFormat("xml".into())
)]
#[case(
    AppSettings {
        database_url: Some("postgres://db/ebooks".into()),
        db_pool_size: Some(0),
        ..AppSettings::default()
    },
    SettingsError::Zero { field: "db_pool_size" }
)]
#[case(
    AppSettings { document_retention_days: Some(0), ..AppSettings::default() },
    SettingsError::Zero { field: "document_retention_days" }
)]
#[case(
    AppSettings { cleanup_job_time: Some("2:00".into()), ..AppSettings::default() },
    SettingsError::InvalidCleanupTime("2:00".into())
)]
#[case(
    AppSettings { cleanup_job_time: Some("25:00".into()), ..AppSettings::default() },
    SettingsError::InvalidCleanupTime("25:00".into())
)]
#[case(
    AppSettings { gemini_retry_delay_secs: Some(0), ..AppSettings::default() },
    SettingsError::RetryPolicy(RetryPolicyError::ZeroInitialDelay)
)]
fn invalid_values_are_rejected(#[case] settings: AppSettings, #[case] expected: SettingsError) {
    assert_eq!(settings.validate().expect_err("invalid"), expected);
}

#[rstest]
#[case("mysql://db/ebooks")]
#[case("not a url")]
fn non_postgres_urls_are_rejected(#[case] url: &str) {
    let settings = AppSettings {
        database_url: Some(url.to_owned()),
        ..AppSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::InvalidDatabaseUrl { .. })
    ));
}

#[rstest]
fn empty_database_url_means_no_database() {
    let settings = AppSettings {
        database_url: Some(String::new()),
        ..AppSettings::default()
    };
    assert!(settings.validate().expect("valid").database.is_none());
}

#[rstest]
fn long_retry_delay_raises_the_cap() {
    let settings = AppSettings {
        gemini_retry_delay_secs: Some(90),
        ..AppSettings::default()
    };
    let policy = settings.validate().expect("valid").generative.retry_policy;
    assert_eq!(policy.max_delay(), Duration::from_secs(90));
}

#[rstest]
fn debug_output_redacts_secrets() {
    let settings = AppSettings {
        database_url: Some("postgres://app:hunter2@db/ebooks".into()),
        gemini_api_key: Some("sk-very-secret".into()),
        ..AppSettings::default()
    };
    let config = settings.validate().expect("valid");

    for rendered in [
        format!("{settings:?}"),
        format!("{:?}", config.database),
        format!("{:?}", config.generative),
    ] {
        assert!(!rendered.contains("hunter2"), "{rendered}");
        assert!(!rendered.contains("sk-very-secret"), "{rendered}");
    }
}

#[rstest]
fn ensure_directories_creates_missing_paths() {
    let (_root, uploads) = scratch_upload_settings();
    assert!(!is_directory(&uploads.upload_dir));

    ensure_directories(&uploads).expect("directories created");
    assert!(is_directory(&uploads.upload_dir));
    assert!(is_directory(&uploads.temp_dir));

    ensure_directories(&uploads).expect("idempotent");
}
