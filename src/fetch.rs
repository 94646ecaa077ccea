//! Upstream access: structured query and page scrape.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::{SourceKind, UpstreamConfig};
use crate::errors::RecorderError;
use crate::models::{PageTable, QueryResponse, UpstreamPayload, MAX_EVENTS};

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Query string for the structured feature service: every report column,
/// newest first, capped at the batch size.
const QUERY_PARAMS: &[(&str, &str)] = &[
    ("where", "1=1"),
    (
        "outFields",
        "objectid,fechaevento,hora,magnitud,lat,lon,prof,ref,departamento",
    ),
    ("orderByFields", "fechaevento DESC"),
    ("resultRecordCount", "10"),
    ("f", "json"),
];

/// Source of upstream seismic reports.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch and parse the configured upstream representation.
    async fn fetch(&self) -> Result<UpstreamPayload, RecorderError>;
}

/// [`EventSource`] backed by the public IGP web service.
pub struct HttpEventSource {
    client: Client,
    config: UpstreamConfig,
}

impl HttpEventSource {
    pub fn new(config: UpstreamConfig) -> Result<Self, RecorderError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RecorderError::InvalidConfig {
                message: format!("HTTP client: {}", e),
            })?;
        Ok(Self { client, config })
    }

    async fn fetch_query(&self) -> Result<QueryResponse, RecorderError> {
        let body = get_text(self.client.get(&self.config.base_url).query(QUERY_PARAMS)).await?;
        serde_json::from_str(&body).map_err(|e| RecorderError::UpstreamMalformed {
            message: format!("unexpected query body: {}", e),
        })
    }

    async fn fetch_page(&self) -> Result<PageTable, RecorderError> {
        let body = get_text(self.client.get(&self.config.base_url)).await?;
        parse_page_table(&body).ok_or(RecorderError::UpstreamNoData)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch(&self) -> Result<UpstreamPayload, RecorderError> {
        debug!(url = %self.config.base_url, source = ?self.config.source, "Fetching upstream report");
        match self.config.source {
            SourceKind::Query => Ok(UpstreamPayload::Query(self.fetch_query().await?)),
            SourceKind::Page => Ok(UpstreamPayload::Page(self.fetch_page().await?)),
        }
    }
}

async fn get_text(request: RequestBuilder) -> Result<String, RecorderError> {
    let response = request.send().await.map_err(request_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(RecorderError::UpstreamUnavailable {
            status: status.as_u16(),
        });
    }
    response.text().await.map_err(request_error)
}

fn request_error(e: reqwest::Error) -> RecorderError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    RecorderError::UpstreamUnreachable { message }
}

/// Extract the first report table from the page.
///
/// Header cells come from the first row, `th` preferred over `td`, lowercased
/// and trimmed. At most [`MAX_EVENTS`] data rows are kept. `None` when the
/// page carries no table or the table has no header row.
fn parse_page_table(html: &str) -> Option<PageTable> {
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let header_selector = Selector::parse("th").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let document = Html::parse_document(html);
    let table = document.select(&table_selector).next()?;
    let mut rows = table.select(&row_selector);

    let header_row = rows.next()?;
    let mut headers: Vec<String> = header_row
        .select(&header_selector)
        .map(|cell| cell_text(cell).to_lowercase())
        .collect();
    if headers.is_empty() {
        headers = header_row
            .select(&cell_selector)
            .map(|cell| cell_text(cell).to_lowercase())
            .collect();
    }
    if headers.is_empty() {
        return None;
    }

    let data_rows: Vec<Vec<String>> = rows
        .take(MAX_EVENTS)
        .map(|row| row.select(&cell_selector).map(cell_text).collect())
        .collect();

    Some(PageTable {
        headers,
        rows: data_rows,
    })
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
