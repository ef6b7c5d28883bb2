//! Environment variable overrides for Settings.
//!
//! Kept in its own test binary: env vars are process-global, and the tests
//! in this file take ENV_LOCK so they never see each other's variables.

use std::sync::Mutex;

use rstest::rstest;
use tempfile::TempDir;

use orgtidy::application::ApplicationError;
use orgtidy::config::Settings;
use orgtidy::domain::SortOrder;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Load settings from `dir` with `vars` set, removing them again afterwards.
fn load_with_env(dir: &TempDir, vars: &[(&str, &str)]) -> Result<Settings, ApplicationError> {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
    let result = Settings::load(Some(dir.path()));
    for (key, _) in vars {
        std::env::remove_var(key);
    }
    result
}

#[test]
fn given_env_vars_when_load_then_override_local_config() {
    // Arrange
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".orgtidy.toml"),
        "[pipeline]\nmin_group_size = 4\n",
    )
    .unwrap();

    // Act
    let result = load_with_env(
        &dir,
        &[
            ("ORGTIDY_PIPELINE__MIN_GROUP_SIZE", "5"),
            ("ORGTIDY_PIPELINE__MIN_LENGTH_RATIO", "0.8"),
            ("ORGTIDY_DISPLAY__SORT", "size"),
        ],
    );

    // Assert
    let settings = result.expect("load settings");
    assert_eq!(settings.pipeline.min_group_size, 5);
    assert!((settings.pipeline.min_length_ratio - 0.8).abs() < f64::EPSILON);
    assert_eq!(settings.display.sort, SortOrder::Size);
}

#[rstest]
#[case("ORGTIDY_PIPELINE__MIN_GROUP_SIZE", "four")]
#[case("ORGTIDY_PIPELINE__MIN_PREFIX_LEN", "-")]
#[case("ORGTIDY_PIPELINE__MIN_LENGTH_RATIO", "high")]
#[case("ORGTIDY_DISPLAY__SORT", "random")]
fn given_unparsable_env_value_when_load_then_config_error(
    #[case] key: &str,
    #[case] value: &str,
) {
    // Arrange
    let dir = TempDir::new().unwrap();

    // Act
    let result = load_with_env(&dir, &[(key, value)]);

    // Assert
    assert!(
        matches!(result, Err(ApplicationError::Config { .. })),
        "{}={} should be rejected, got {:?}",
        key,
        value,
        result
    );
}
