//! Configuration layering: file values, environment overrides, validation.

use component_knowledge::concurrency::ExceptionPolicy;
use component_knowledge::config::ConfigLoader;
use std::fs;

#[test]
fn environment_overrides_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("knowledge.toml");
    fs::write(
        &path,
        "node_id = \"from-file\"\nverbose_logging = false\nlistener_exception_policy = \"log_and_proceed\"\n",
    )
    .unwrap();

    std::env::set_var("COMPONENT_KNOWLEDGE__VERBOSE_LOGGING", "true");
    let result = ConfigLoader::load_from_file(&path);
    std::env::remove_var("COMPONENT_KNOWLEDGE__VERBOSE_LOGGING");

    let config = result.unwrap();
    assert_eq!(config.node_id, "from-file");
    assert!(config.verbose_logging);
    assert!(config.publication_enabled);
    assert_eq!(config.listener_exception_policy, ExceptionPolicy::LogAndProceed);
}

#[test]
fn missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.toml");
    assert!(ConfigLoader::load_from_file(&path).is_err());
}
