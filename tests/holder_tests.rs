mod common;

use common::{foundation, Harness};
use service_migrator::clients::Foundations;
use service_migrator::config::{Authentication, ConfigError};
use std::sync::Arc;

#[tokio::test]
async fn test_clients_are_built_once_per_side() {
    let harness = Harness::new();

    let first = harness.clients.source_cf_client().await.unwrap();
    let second = harness.clients.cf_client(true).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(harness.loader.load_count(), 1);

    harness.clients.target_cf_client().await.unwrap();
    harness.clients.target_cf_client().await.unwrap();
    assert_eq!(harness.loader.load_count(), 2);

    harness.clients.source_bosh_client().await.unwrap();
    harness.clients.bosh_client(true).await.unwrap();
    assert_eq!(harness.bosh.build_count(), 1);
}

#[tokio::test]
async fn test_concurrent_first_use_builds_once() {
    let harness = Harness::new();
    let clients = harness.clients.clone();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let clients = clients.clone();
        handles.push(tokio::spawn(async move {
            clients.source_ops_manager_client().await.map(|_| ())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(harness.opsman.build_count(), 1);
}

#[tokio::test]
async fn test_bosh_proxy_defaults_to_ops_manager_tunnel() {
    let harness = Harness::new();
    harness.clients.source_bosh_client().await.unwrap();

    let proxies = harness.bosh.proxies.lock().clone();
    assert_eq!(
        proxies,
        vec![Some(
            "ssh+socks5://ubuntu@opsman.source:22?private-key=/keys/source.pem".to_string()
        )]
    );
}

#[tokio::test]
async fn test_access_derived_from_ops_manager() {
    let mut source = foundation("source");
    source.bosh = None;
    source.cloud_controller = None;
    let harness = Harness::with_foundations(Foundations {
        source,
        target: foundation("target"),
    });

    // derived CF url is api.sys.example.com, which the fake routes to the target side
    harness.clients.source_cf_client().await.unwrap();
    harness.clients.source_bosh_client().await.unwrap();

    assert_eq!(harness.opsman.build_count(), 1);
    assert_eq!(harness.loader.load_count(), 1);
    assert_eq!(harness.bosh.build_count(), 1);
}

#[test]
fn test_validate_rejects_ambiguous_authentication() {
    let mut source = foundation("source");
    source.authentication = Authentication {
        basic: Authentication::basic("admin", "secret").basic,
        uaa: Authentication::uaa_client("https://uaa.source", "id", "secret").uaa,
    };
    let harness = Harness::with_foundations(Foundations {
        source,
        target: foundation("target"),
    });

    assert!(matches!(
        harness.clients.validate(),
        Err(ConfigError::InvalidAuthentication { .. })
    ));
}

#[test]
fn test_validate_rejects_empty_basic_password() {
    let mut target = foundation("target");
    target.authentication = Authentication::basic("admin", "");
    let harness = Harness::with_foundations(Foundations {
        source: foundation("source"),
        target,
    });

    assert!(harness.clients.validate().is_err());
}

#[test]
fn test_validate_accepts_well_formed_foundations() {
    let harness = Harness::new();
    assert!(harness.clients.validate().is_ok());
}
