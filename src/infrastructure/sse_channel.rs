// Server-sent event live channel - streams `newData` events from the backend
use crate::application::error::ChannelError;
use crate::application::live_channel::{ChannelEvent, LiveSubscription, LiveUpdateChannel};
use crate::domain::record::Record;
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;

/// Event name carrying one new sample
pub const NEW_DATA_EVENT: &str = "newData";

/// How long to wait for the response headers of the event stream
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SseLiveChannel {
    client: reqwest::Client,
    url: String,
    connect_timeout: Duration,
}

impl SseLiveChannel {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

#[async_trait]
impl LiveUpdateChannel for SseLiveChannel {
    async fn subscribe(&self) -> Result<LiveSubscription, ChannelError> {
        let request = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream")
            .send();
        let response = tokio::time::timeout(self.connect_timeout, request)
            .await
            .map_err(|_| {
                ChannelError::Connect(format!(
                    "{} did not answer within {:?}",
                    self.url, self.connect_timeout
                ))
            })?
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChannelError::Connect(format!(
                "{} returned status {}",
                self.url,
                response.status()
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        let reader = tokio::spawn(async move {
            if tx.send(ChannelEvent::Connected).await.is_err() {
                return;
            }

            let frames = sse_frames(response.bytes_stream());
            futures::pin_mut!(frames);
            while let Some(frame) = frames.next().await {
                let event = match frame {
                    Ok(frame) => match decode_frame(&frame) {
                        Some(event) => event,
                        None => continue,
                    },
                    Err(e) => ChannelEvent::Error(e),
                };
                if tx.send(event).await.is_err() {
                    return;
                }
            }

            let _ = tx.send(ChannelEvent::Disconnected).await;
        });

        Ok(LiveSubscription::new(rx, reader))
    }
}

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` parser
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every frame completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer
            .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|pair| pair == b"\n\n") {
            let block = self.buffer.split_to(end);
            self.buffer.advance(2);
            if let Some(frame) = parse_block(&block) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_block(block: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event: event.unwrap_or_else(|| "message".to_string()),
        data: data.join("\n"),
    })
}

fn sse_frames<S>(bytes: S) -> impl Stream<Item = Result<SseFrame, ChannelError>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    async_stream::stream! {
        let mut decoder = SseDecoder::new();
        futures::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for frame in decoder.push(&chunk) {
                        yield Ok(frame);
                    }
                }
                Err(e) => {
                    yield Err(ChannelError::Stream(e.to_string()));
                    break;
                }
            }
        }
    }
}

/// Map a frame to a channel event; frames for other event names are skipped
pub fn decode_frame(frame: &SseFrame) -> Option<ChannelEvent> {
    if frame.event != NEW_DATA_EVENT {
        tracing::debug!("Ignoring live event {}", frame.event);
        return None;
    }
    let event = match serde_json::from_str::<Record>(&frame.data) {
        Ok(record) => ChannelEvent::NewData(record),
        Err(e) => ChannelEvent::Error(ChannelError::Decode(e.to_string())),
    };
    Some(event)
}
