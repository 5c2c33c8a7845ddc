use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;

use super::model::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Failed to read snapshot {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Hub unavailable: {0}")]
    Unavailable(String),
}

/// Source of hub snapshots
///
/// The wire protocol to the hub lives behind this trait; the coordinator only
/// needs whole snapshots.
#[async_trait]
pub trait HubClient: Send + Sync {
    /// Fetch the current rooms and devices from the hub
    async fn fetch_snapshot(&self) -> Result<Snapshot, HubError>;
}

/// Reads snapshots from a JSON file kept up to date by an external fetcher.
///
/// The file is re-read on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileClient {
    path: PathBuf,
}

impl JsonFileClient {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HubClient for JsonFileClient {
    async fn fetch_snapshot(&self) -> Result<Snapshot, HubError> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| HubError::Io(self.path.clone(), e))?;

        Ok(serde_json::from_slice(&contents)?)
    }
}

/// Mock hub client for testing
///
/// Hands out queued responses in order, then keeps repeating the last one.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockHubClient {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<Snapshot, String>>>,
    last: std::sync::Mutex<Option<Result<Snapshot, String>>>,
}

#[cfg(test)]
impl MockHubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_snapshot(&self, snapshot: Snapshot) {
        self.responses.lock().unwrap().push_back(Ok(snapshot));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }
}

#[cfg(test)]
#[async_trait]
impl HubClient for MockHubClient {
    async fn fetch_snapshot(&self) -> Result<Snapshot, HubError> {
        let next = self.responses.lock().unwrap().pop_front();
        let response = match next {
            Some(r) => {
                *self.last.lock().unwrap() = Some(r.clone());
                r
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err("no snapshot queued".to_string())),
        };
        response.map_err(HubError::Unavailable)
    }
}
