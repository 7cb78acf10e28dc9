use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{name} unavailable: {reason}")]
    Unavailable { name: &'static str, reason: String },

    #[error("Error decoding {name}: {reason}")]
    Decode { name: &'static str, reason: String },
}

/// Provider of the full, current collection of one kind of record.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Record: Send;

    async fn fetch_all(&self) -> Result<Vec<Self::Record>, SourceError>;
}

/// Build the HTTP client shared by every source.
pub fn build_client(request_timeout_seconds: u64) -> reqwest::Result<Client> {
    let mut builder = Client::builder();
    if request_timeout_seconds > 0 {
        builder = builder.timeout(Duration::from_secs(request_timeout_seconds));
    }
    builder.build()
}

/// Fetches a JSON array of records with a single GET against a fixed URL.
pub struct HttpSource<T> {
    client: Client,
    name: &'static str,
    url: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> HttpSource<T> {
    pub fn new(client: Client, name: &'static str, base_url: &str, path: &str) -> Self {
        let url = format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'));
        Self { client, name, url, _record: PhantomData }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl<T> RecordSource for HttpSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Record = T;

    async fn fetch_all(&self) -> Result<Vec<T>, SourceError> {
        info!("Fetching {} from {}", self.name, self.url);

        let unavailable =
            |reason: String| SourceError::Unavailable { name: self.name, reason };

        let response =
            self.client.get(&self.url).send().await.map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} provider answered {}", self.name, status);
            return Err(unavailable(format!("provider answered {}", status)));
        }

        let body = response.bytes().await.map_err(|e| unavailable(e.to_string()))?;

        let records: Vec<T> = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Decode { name: self.name, reason: e.to_string() })?;

        debug!("Fetched {} {}", records.len(), self.name);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_report_common::Habit;

    #[test]
    fn test_url_joins_base_and_path() {
        let client = Client::new();

        let source =
            HttpSource::<Habit>::new(client.clone(), "habits", "http://host:1/", "/habits");
        assert_eq!(source.url(), "http://host:1/habits");

        let source = HttpSource::<Habit>::new(client, "tasks", "http://host:2", "Task/tasks");
        assert_eq!(source.url(), "http://host:2/Task/tasks");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = build_client(5).unwrap();
        let source =
            HttpSource::<Habit>::new(client, "habits", &format!("http://{}", addr), "/habits");

        match source.fetch_all().await {
            Err(SourceError::Unavailable { name, .. }) => assert_eq!(name, "habits"),
            other => panic!("Expected unavailable source, got {:?}", other.map(|r| r.len())),
        }
    }
}
