//! Tests for configuration validation

use queuify::config::{QueueConfig, StoreBackendConfig};
use queuify::core::DEFAULT_NAMESPACE;

fn redis_config(url: &str) -> QueueConfig {
    QueueConfig {
        name: "jobs".to_string(),
        maxsize: 10,
        namespace: DEFAULT_NAMESPACE.to_string(),
        store: StoreBackendConfig::Redis {
            url: url.to_string(),
        },
    }
}

#[test]
fn test_queue_config_validation() {
    assert!(QueueConfig::in_memory("jobs", 5).validate().is_ok());
    assert!(redis_config("redis://localhost:6379/0").validate().is_ok());
    assert!(redis_config("rediss://cache.internal:6380").validate().is_ok());
    assert!(redis_config("unix:///tmp/redis.sock").validate().is_ok());
}

#[test]
fn test_queue_config_invalid_name() {
    assert!(QueueConfig::in_memory("", 5).validate().is_err());
    assert!(QueueConfig::in_memory("two words", 5).validate().is_err());
}

#[test]
fn test_queue_config_invalid_url() {
    assert!(redis_config("http://localhost:6379").validate().is_err());
    assert!(redis_config("localhost:6379").validate().is_err());
}

#[test]
fn test_queue_config_from_json() {
    let json = r#"{
        "name": "jobs",
        "maxsize": 3,
        "store": { "backend": "redis", "url": "redis://localhost:6379/0" }
    }"#;

    let config = QueueConfig::from_json_str(json).unwrap();
    assert_eq!(config.maxsize, 3);
    assert_eq!(config.namespace, DEFAULT_NAMESPACE);
    assert_eq!(
        config.store,
        StoreBackendConfig::Redis {
            url: "redis://localhost:6379/0".to_string()
        }
    );
}

#[test]
fn test_queue_config_from_json_defaults() {
    let json = r#"{ "name": "jobs", "namespace": "", "store": { "backend": "in_memory" } }"#;
    let config = QueueConfig::from_json_str(json).unwrap();
    assert_eq!(config.maxsize, 0);
    assert_eq!(config.namespace, "");
    assert_eq!(config.store, StoreBackendConfig::InMemory);
}

#[test]
fn test_queue_config_from_json_rejects_invalid() {
    assert!(QueueConfig::from_json_str("{").is_err());
    let json = r#"{ "name": "", "store": { "backend": "in_memory" } }"#;
    assert!(QueueConfig::from_json_str(json).is_err());
}

#[test]
fn test_queue_config_from_env() {
    use queuify::config::{ENV_MAXSIZE, ENV_NAMESPACE, ENV_QUEUE_NAME, ENV_REDIS_URL};

    std::env::set_var(ENV_QUEUE_NAME, "env-jobs");
    std::env::set_var(ENV_MAXSIZE, " 8 ");
    std::env::set_var(ENV_NAMESPACE, "svc");
    std::env::remove_var(ENV_REDIS_URL);

    let config = QueueConfig::from_env().unwrap();
    assert_eq!(config.name, "env-jobs");
    assert_eq!(config.maxsize, 8);
    assert_eq!(config.namespace, "svc");
    assert_eq!(config.store, StoreBackendConfig::InMemory);

    std::env::set_var(ENV_MAXSIZE, "many");
    assert!(QueueConfig::from_env().is_err());

    for var in [ENV_QUEUE_NAME, ENV_MAXSIZE, ENV_NAMESPACE] {
        std::env::remove_var(var);
    }
}
