use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::error::ApiError;
use rebuscada_types::CompetitionPush;

const PUSH_CHANNEL_CAPACITY: usize = 32;

/// A live standings feed for one competition. Dropping or closing it stops
/// the reader task.
pub struct PushConnection {
    competition_id: String,
    receiver: mpsc::Receiver<CompetitionPush>,
    reader: Option<JoinHandle<()>>,
}

impl PushConnection {
    pub fn new(
        competition_id: impl Into<String>,
        receiver: mpsc::Receiver<CompetitionPush>,
        reader: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            competition_id: competition_id.into(),
            receiver,
            reader,
        }
    }

    pub fn competition_id(&self) -> &str {
        &self.competition_id
    }

    /// Next snapshot, or `None` once the feed has ended
    pub async fn recv(&mut self) -> Option<CompetitionPush> {
        self.receiver.recv().await
    }

    pub fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.receiver.close();
        tracing::debug!("Closed push feed for competition {}", self.competition_id);
    }
}

impl Drop for PushConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, competition_id: &str) -> Result<PushConnection, ApiError>;
}

/// Opens `/ws/competition/{id}` on the backend
pub struct WsPushConnector {
    base_url: Url,
}

impl WsPushConnector {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn competition_url(&self, competition_id: &str) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("Invalid push base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["ws", "competition", competition_id]);
        Ok(url)
    }
}

#[async_trait]
impl PushConnector for WsPushConnector {
    async fn connect(&self, competition_id: &str) -> Result<PushConnection, ApiError> {
        let url = self.competition_url(competition_id)?;
        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::info!("Push feed connected for competition {}", competition_id);

        // Nothing is sent upstream; the write half only keeps the socket open
        let (write, mut read) = ws.split();
        let (sender, receiver) = mpsc::channel(PUSH_CHANNEL_CAPACITY);
        let id = competition_id.to_string();

        let reader = tokio::spawn(async move {
            let _write = write;
            while let Some(result) = read.next().await {
                match result {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<CompetitionPush>(text.as_str()) {
                            Ok(push) => {
                                if sender.send(push).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Ignoring malformed push message: {}", e);
                            }
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        tracing::info!("Push feed for {} closed by server: {:?}", id, frame);
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Push feed for {} failed: {}", id, e);
                        break;
                    }
                }
            }
        });

        Ok(PushConnection::new(competition_id, receiver, Some(reader)))
    }
}
