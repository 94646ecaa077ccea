//! DynamoDB-backed event store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::errors::RecorderError;
use crate::models::SeismicEvent;
use crate::store::EventStore;

/// [`EventStore`] backed by a DynamoDB table keyed by the `id` attribute.
///
/// Requests run without retries and with the configured operation timeout;
/// the scheduled task reports a failed run instead of waiting out backoff.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table: String,
}

impl DynamoDbStore {
    /// Connect with shared AWS configuration from the environment, honoring
    /// the region and optional endpoint override.
    pub async fn connect(config: StoreConfig) -> Self {
        info!(table = %config.table, region = %config.region, "Connecting to DynamoDB");
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.timeout)
                    .build(),
            )
            .load()
            .await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            table: config.table,
        }
    }
}

#[async_trait]
impl EventStore for DynamoDbStore {
    async fn put_events(&self, events: &[SeismicEvent]) -> Result<(), RecorderError> {
        for event in events {
            self.client
                .put_item()
                .table_name(&self.table)
                .set_item(Some(to_item(event)))
                .send()
                .await
                .map_err(|e| RecorderError::StoreWrite {
                    message: sdk_error_message(&e),
                })?;
        }
        debug!(count = events.len(), table = %self.table, "Stored events");
        Ok(())
    }

    async fn scan_ids(&self) -> Result<Vec<String>, RecorderError> {
        let mut ids = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table)
                .projection_expression("#id")
                .expression_attribute_names("#id", "id")
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| RecorderError::StoreScan {
                    message: sdk_error_message(&e),
                })?;

            for item in output.items() {
                if let Some(AttributeValue::S(id)) = item.get("id") {
                    ids.push(id.clone());
                }
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        Ok(ids)
    }

    async fn delete_events(&self, ids: &[String]) -> Result<(), RecorderError> {
        for id in ids {
            self.client
                .delete_item()
                .table_name(&self.table)
                .key("id", AttributeValue::S(id.clone()))
                .send()
                .await
                .map_err(|e| RecorderError::StoreDelete {
                    message: sdk_error_message(&e),
                })?;
        }
        Ok(())
    }

    async fn get_event(&self, id: &str) -> Result<Option<SeismicEvent>, RecorderError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| RecorderError::StoreRead {
                message: sdk_error_message(&e),
            })?;

        output.item().map(from_item).transpose()
    }
}

/// Map an event to a DynamoDB item: strings as `S`, decimals as `N` so the
/// stored numbers keep their exact digits.
fn to_item(event: &SeismicEvent) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(event.id.clone())),
        (
            "objectid".to_string(),
            AttributeValue::S(event.source_id.clone()),
        ),
        (
            "fechaevento".to_string(),
            AttributeValue::S(event.event_time.clone()),
        ),
        (
            "hora".to_string(),
            AttributeValue::S(event.time_of_day.clone()),
        ),
        (
            "magnitud".to_string(),
            AttributeValue::N(event.magnitude.to_string()),
        ),
        (
            "lat".to_string(),
            AttributeValue::N(event.latitude.to_string()),
        ),
        (
            "lon".to_string(),
            AttributeValue::N(event.longitude.to_string()),
        ),
        (
            "profundidad_km".to_string(),
            AttributeValue::N(event.depth_km.to_string()),
        ),
        (
            "referencia".to_string(),
            AttributeValue::S(event.reference_location.clone()),
        ),
        (
            "departamento".to_string(),
            AttributeValue::S(event.department.clone()),
        ),
    ])
}

/// Rebuild an event from a stored item. Only `id` is required; other
/// attributes fall back to defaults like the normalizer does.
fn from_item(item: &HashMap<String, AttributeValue>) -> Result<SeismicEvent, RecorderError> {
    let id = item
        .get("id")
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| RecorderError::StoreRead {
            message: "item without a string id attribute".to_string(),
        })?;

    Ok(SeismicEvent {
        id,
        source_id: string_attr(item, "objectid"),
        event_time: string_attr(item, "fechaevento"),
        time_of_day: string_attr(item, "hora"),
        magnitude: decimal_attr(item, "magnitud"),
        latitude: decimal_attr(item, "lat"),
        longitude: decimal_attr(item, "lon"),
        depth_km: decimal_attr(item, "profundidad_km"),
        reference_location: string_attr(item, "referencia"),
        department: string_attr(item, "departamento"),
    })
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> String {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

fn decimal_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Decimal {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .unwrap_or(Decimal::ZERO)
}

fn sdk_error_message<E, R>(error: &SdkError<E, R>) -> String
where
    E: std::error::Error,
{
    match error {
        SdkError::ServiceError(context) => context.err().to_string(),
        other => other.to_string(),
    }
}
