//! Normalization of upstream payloads into storable events.

use serde::Deserialize;
use tracing::warn;

use crate::errors::RecorderError;
use crate::models::{
    EventAttributes, PageTable, QueryResponse, SeismicEvent, UpstreamPayload, MAX_EVENTS,
};

/// What to do with a record whose event time is absent.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingTimePolicy {
    /// Drop the record, keep the rest of the batch.
    #[default]
    Skip,
    /// Reject the whole batch.
    Fail,
}

/// Convert an upstream payload into at most [`MAX_EVENTS`] normalized events,
/// keeping upstream order.
///
/// The batch is truncated to [`MAX_EVENTS`] before the missing-time policy
/// runs, so a skipped record is not backfilled from beyond the cap. Under
/// [`MissingTimePolicy::Fail`] a single record without an event time rejects
/// the whole batch.
pub fn normalize(
    payload: UpstreamPayload,
    policy: MissingTimePolicy,
) -> Result<Vec<SeismicEvent>, RecorderError> {
    match payload {
        UpstreamPayload::Query(response) => normalize_query(response, policy),
        UpstreamPayload::Page(table) => normalize_page(table, policy),
    }
}

fn normalize_query(
    response: QueryResponse,
    policy: MissingTimePolicy,
) -> Result<Vec<SeismicEvent>, RecorderError> {
    let mut events = Vec::new();
    for feature in response.features.into_iter().take(MAX_EVENTS) {
        let attrs = feature.attributes.unwrap_or_default();
        if let Some(attrs) = apply_policy(attrs, policy)? {
            events.push(SeismicEvent::from_attributes(attrs));
        }
    }
    Ok(events)
}

fn normalize_page(
    table: PageTable,
    policy: MissingTimePolicy,
) -> Result<Vec<SeismicEvent>, RecorderError> {
    let mut events = Vec::new();
    for cells in table.rows.iter().take(MAX_EVENTS) {
        if cells.len() < table.headers.len() {
            warn!(
                cells = cells.len(),
                headers = table.headers.len(),
                "Dropping table row with missing cells"
            );
            continue;
        }
        let attrs = EventAttributes::from_cells(&table.headers, cells);
        if let Some(attrs) = apply_policy(attrs, policy)? {
            events.push(SeismicEvent::from_attributes(attrs));
        }
    }
    Ok(events)
}

fn apply_policy(
    attrs: EventAttributes,
    policy: MissingTimePolicy,
) -> Result<Option<EventAttributes>, RecorderError> {
    if attrs.event_time.is_missing() {
        return match policy {
            MissingTimePolicy::Skip => {
                warn!("Skipping record without event time");
                Ok(None)
            }
            MissingTimePolicy::Fail => Err(RecorderError::UpstreamMalformed {
                message: "record without event time".to_string(),
            }),
        };
    }
    Ok(Some(attrs))
}
