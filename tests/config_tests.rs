//! Configuration loading from disk.

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use modelbus::adapter::outbound::predictor::PredictorRegistry;
use modelbus::error::{ConfigError, Error};
use modelbus::infrastructure::bootstrap::build_services;
use modelbus::infrastructure::config::settings::Config;
use modelbus::port::Broker;
use modelbus::testkit::broker::MemoryBroker;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const TWO_MODELS: &str = r#"
[broker]
address = "localhost:9092"

[service]
delivery = "after_processing"

[[models]]
kind = "identity"
name = "echo"
major_version = 1
minor_version = 0

[[models]]
kind = "identity"
name = "echo"
major_version = 2
minor_version = 0
"#;

#[test]
fn loads_config_from_file() {
    let file = write_config(TWO_MODELS);

    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.models.len(), 2);
    assert_eq!(config.models[1].major_version, 2);
}

#[test]
fn example_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("modelbus.example.toml");

    let config = Config::load(path).unwrap();

    assert_eq!(config.models.len(), 2);
    let registry = PredictorRegistry::with_builtins();
    assert!(config.models.iter().all(|entry| registry.check(entry).is_ok()));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = Config::load(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
}

#[test]
fn invalid_file_names_the_field() {
    let file = write_config("[broker]\naddress = \"localhost:9092\"\n");

    let err = Config::load(file.path()).unwrap_err();

    assert_eq!(err.to_string(), "missing required field: models");
}

#[test]
fn loaded_models_become_services() {
    let file = write_config(TWO_MODELS);
    let config = Config::load(file.path()).unwrap();
    let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::new());

    let services = build_services(&config, &PredictorRegistry::with_builtins(), &broker).unwrap();

    let inputs: Vec<_> = services
        .iter()
        .map(|s| s.topics().input_topic().to_string())
        .collect();
    assert_eq!(
        inputs,
        vec!["model_server.echo.1.0.inputs", "model_server.echo.2.0.inputs"]
    );
    assert!(services
        .iter()
        .all(|s| s.config().delivery == modelbus::application::DeliveryPolicy::AfterProcessing));
}

#[test]
fn unknown_predictor_kind_fails_at_build_time() {
    let file = write_config(&TWO_MODELS.replacen("kind = \"identity\"", "kind = \"onnx\"", 1));
    let config = Config::load(file.path()).unwrap();
    let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::new());

    let err = build_services(&config, &PredictorRegistry::with_builtins(), &broker).unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::UnknownPredictor { ref kind, .. }) if kind == "onnx"
    ));
}
