//! Round-trip tests against a real DynamoDB table.
//!
//! Ignored by default; point them at a disposable table first, e.g. a local
//! instance:
//!
//! ```sh
//! SISMO_TEST_TABLE=sismo-test SISMO_TEST_ENDPOINT=http://localhost:8000 \
//!     cargo test --test store -- --ignored
//! ```

use std::env;
use std::time::Duration;

use sismo_recorder::{
    config::StoreConfig,
    models::{EventAttributes, RawEpoch, SeismicEvent},
    store::{persist, DynamoDbStore, EventStore, PersistenceMode},
};

async fn setup_test_store() -> DynamoDbStore {
    dotenvy::dotenv().ok();
    let table =
        env::var("SISMO_TEST_TABLE").expect("Environment variable SISMO_TEST_TABLE required");

    DynamoDbStore::connect(StoreConfig {
        table,
        region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        endpoint: env::var("SISMO_TEST_ENDPOINT").ok(),
        mode: PersistenceMode::Replace,
        timeout: Duration::from_secs(10),
    })
    .await
}

fn sample_event(source_id: &str) -> SeismicEvent {
    SeismicEvent::from_attributes(EventAttributes {
        source_id: Some(source_id.to_string()),
        event_time: RawEpoch::Millis(1_700_000_000_000),
        time_of_day: Some("17:13:20".to_string()),
        magnitude: "4.1".parse().unwrap(),
        latitude: "-12.04".parse().unwrap(),
        longitude: "-77.51".parse().unwrap(),
        depth_km: "48".parse().unwrap(),
        reference_location: Some("15 km al SO de Lima".to_string()),
        department: Some("LIMA".to_string()),
    })
}

#[ignore]
#[tokio::test]
async fn test_put_and_get_round_trip() {
    let store = setup_test_store().await;
    let event = sample_event("4521");

    store
        .put_events(std::slice::from_ref(&event))
        .await
        .expect("Failed to store event");

    let stored = store
        .get_event(&event.id)
        .await
        .expect("Failed to read event")
        .expect("Stored event not found");

    // Exact decimal fields survive the trip with no rounding drift.
    assert_eq!(stored, event);

    store
        .delete_events(&[event.id.clone()])
        .await
        .expect("Failed to clean up event");
}

#[ignore]
#[tokio::test]
async fn test_replace_leaves_only_the_new_batch() {
    let store = setup_test_store().await;

    persist(
        &store,
        PersistenceMode::Replace,
        &[sample_event("1"), sample_event("2")],
    )
    .await
    .expect("Failed to store first batch");

    let batch = vec![sample_event("3")];
    persist(&store, PersistenceMode::Replace, &batch)
        .await
        .expect("Failed to store second batch");

    let ids = store.scan_ids().await.expect("Failed to scan ids");
    assert_eq!(ids, vec![batch[0].id.clone()]);

    store
        .delete_events(&ids)
        .await
        .expect("Failed to clean up events");
}

#[ignore]
#[tokio::test]
async fn test_append_accumulates() {
    let store = setup_test_store().await;
    persist(&store, PersistenceMode::Replace, &[])
        .await
        .expect("Failed to clear table");

    persist(&store, PersistenceMode::Append, &[sample_event("1")])
        .await
        .expect("Failed to store first batch");
    persist(&store, PersistenceMode::Append, &[sample_event("2")])
        .await
        .expect("Failed to store second batch");

    let ids = store.scan_ids().await.expect("Failed to scan ids");
    assert_eq!(ids.len(), 2);

    store
        .delete_events(&ids)
        .await
        .expect("Failed to clean up events");
}
