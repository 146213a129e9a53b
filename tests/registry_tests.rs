mod common;

use common::Harness;
use service_migrator::config::{ConfigError, MigrationDefinition, Migrator};
use service_migrator::strategy::{
    RecreateOptions, ServiceRecreator, StrategyDeps, StrategyError, StrategyRegistry,
    StrategySettings,
};
use std::sync::Arc;

fn migrator(name: &str, yaml: &str) -> Migrator {
    Migrator {
        name: name.to_string(),
        value: serde_yaml::from_str(yaml).unwrap(),
    }
}

fn build(harness: &Harness, definition: &MigrationDefinition) -> Result<StrategyRegistry, ConfigError> {
    StrategyRegistry::new(
        definition,
        StrategyDeps {
            clients: harness.clients.clone(),
            executor: harness.executor.clone(),
            recreator: Arc::new(ServiceRecreator::new(
                harness.clients.clone(),
                RecreateOptions::default(),
            )),
        },
    )
}

#[test]
fn test_unconfigured_offering_falls_back_to_default() {
    let harness = Harness::new();
    let registry = harness.default_registry();

    let strategy = registry.lookup("redis").unwrap();
    assert_eq!(strategy.name(), "default");
}

#[test]
fn test_configured_offerings_resolve_to_their_strategy() {
    let harness = Harness::new();
    let definition = MigrationDefinition {
        use_default_migrator: true,
        migrators: vec![
            migrator("p.mysql", "instance_group: database\n"),
            migrator("credhub", "{}"),
            migrator("ecs-bucket", "reclaim_policy: Delete\n"),
        ],
    };
    let registry = build(&harness, &definition).unwrap();

    assert_eq!(registry.lookup("p.mysql").unwrap().name(), "mysql");
    assert_eq!(registry.lookup("credhub").unwrap().name(), "credhub");
    assert_eq!(registry.lookup("ecs-bucket").unwrap().name(), "ecs");
    // not configured, so not special
    assert_eq!(registry.lookup("p-mysql").unwrap().name(), "default");
}

#[test]
fn test_no_default_means_not_configured() {
    let harness = Harness::new();
    let definition = MigrationDefinition {
        use_default_migrator: false,
        migrators: vec![migrator("credhub", "{}")],
    };
    let registry = build(&harness, &definition).unwrap();

    let err = registry.lookup("redis").err().unwrap();
    assert!(matches!(err, StrategyError::NotConfigured { .. }));
    assert!(err.skip_reason().unwrap().contains("redis"));
}

#[test]
fn test_lookup_is_idempotent() {
    let harness = Harness::new();
    let definition = MigrationDefinition {
        use_default_migrator: true,
        migrators: vec![migrator("p.mysql", "instance_group: database\ndeployment_prefix: 'sm-'\n")],
    };
    let registry = build(&harness, &definition).unwrap();

    let first = registry.settings("p.mysql").cloned();
    let second = registry.settings("p.mysql").cloned();
    assert_eq!(first, second);
    match first {
        Some(StrategySettings::MySql(settings)) => {
            assert_eq!(settings.instance_group, "database");
            assert_eq!(settings.deployment_prefix, "sm-");
        }
        other => panic!("unexpected settings {other:?}"),
    }

    assert!(Arc::ptr_eq(
        &registry.lookup("p.mysql").unwrap(),
        &registry.lookup("p.mysql").unwrap()
    ));
}

#[test]
fn test_bad_settings_fail_at_construction() {
    let harness = Harness::new();

    let mismatch = MigrationDefinition {
        use_default_migrator: true,
        migrators: vec![migrator("p.mysql", "instance_group: [a, b]\n")],
    };
    assert!(matches!(
        build(&harness, &mismatch),
        Err(ConfigError::InvalidMigratorSettings { .. })
    ));

    let unknown = MigrationDefinition {
        use_default_migrator: true,
        migrators: vec![migrator("rabbitmq", "{}")],
    };
    assert!(matches!(
        build(&harness, &unknown),
        Err(ConfigError::UnknownMigrator { .. })
    ));

    let broken_template = MigrationDefinition {
        use_default_migrator: true,
        migrators: vec![migrator("ecs", "query_command: 'mysql {{#each}}'\n")],
    };
    assert!(matches!(
        build(&harness, &broken_template),
        Err(ConfigError::InvalidMigratorSettings { .. })
    ));
}
