//! The scheduled fetch, normalize, persist task.

use serde::Serialize;
use tracing::{error, info};

use crate::errors::RecorderError;
use crate::fetch::EventSource;
use crate::models::SeismicEvent;
use crate::normalize::{normalize, MissingTimePolicy};
use crate::store::{persist, EventStore, PersistenceMode};

/// Result of one task run, in web handler shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ResponseBody,
}

impl TaskResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Body of a run response: a report on success, the error message otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Report(IngestReport),
    Error { message: String },
}

/// Stored batch summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub message: String,
    pub cantidad: usize,
    pub data: Vec<SeismicEvent>,
}

/// One fetch, normalize, persist pipeline over a source and a store.
///
/// The source and store are held for the life of the process and reused
/// across scheduled runs.
pub struct IngestTask<S, T> {
    source: S,
    store: T,
    mode: PersistenceMode,
    missing_time: MissingTimePolicy,
}

impl<S: EventSource, T: EventStore> IngestTask<S, T> {
    pub fn new(
        source: S,
        store: T,
        mode: PersistenceMode,
        missing_time: MissingTimePolicy,
    ) -> Self {
        Self {
            source,
            store,
            mode,
            missing_time,
        }
    }

    /// Run the pipeline once and report the outcome.
    ///
    /// Failures never escape as errors; they map to the response status and
    /// an error body, leaving the scheduler to trigger the next attempt.
    pub async fn run(&self) -> TaskResponse {
        match self.execute().await {
            Ok(events) => {
                info!(count = events.len(), "Run complete");
                TaskResponse {
                    status_code: 200,
                    body: ResponseBody::Report(IngestReport {
                        message: format!("Stored {} seismic events", events.len()),
                        cantidad: events.len(),
                        data: events,
                    }),
                }
            }
            Err(e) => {
                error!(error = %e, "Run failed");
                TaskResponse {
                    status_code: e.status_code(),
                    body: ResponseBody::Error {
                        message: e.to_string(),
                    },
                }
            }
        }
    }

    async fn execute(&self) -> Result<Vec<SeismicEvent>, RecorderError> {
        let payload = self.source.fetch().await?;
        let events = normalize(payload, self.missing_time)?;
        persist(&self.store, self.mode, &events).await?;
        Ok(events)
    }
}
