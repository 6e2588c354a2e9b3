//! Push-notification subscription
//!
//! Opens the service's WebSocket channel and hands every decoded change
//! event to a caller-supplied callback. The connection is re-established
//! on drop with capped exponential backoff; callers never re-subscribe.

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::client::InventoryClient;
use crate::records::ChangeNotification;
use crate::{Error, Result};

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Handle to a running subscription.
///
/// Dropping the handle closes the watch channel the background task selects
/// on, so the reconnect loop stops at its next suspension point; [`close`]
/// additionally aborts the task for a prompt transport release.
///
/// [`close`]: Subscription::close
pub struct Subscription {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl Subscription {
    /// Stop the reconnect loop and release the transport.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        self.task.abort();
        let _ = self.task.await;
    }
}

impl InventoryClient {
    /// Subscribe to change notifications.
    ///
    /// `on_event` is invoked from the subscription task for every decoded
    /// event; it should do no more than enqueue the notification for the
    /// sync worker.
    pub fn subscribe<F>(&self, on_event: F) -> Result<Subscription>
    where
        F: Fn(ChangeNotification) + Send + Sync + 'static,
    {
        let ws_url = websocket_url(self.base_url())?;
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_subscription(ws_url, on_event, shutdown_rx));
        Ok(Subscription { shutdown, task })
    }
}

/// Derive the push-channel URL from the service's HTTP URL.
fn websocket_url(base_url: &str) -> Result<String> {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(Error::InvalidUrl {
            url: base_url.to_string(),
        });
    };
    Ok(format!("{ws_base}/api/v1"))
}

fn reconnect_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: INITIAL_RECONNECT_DELAY,
        max_interval: MAX_RECONNECT_DELAY,
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    }
}

async fn run_subscription<F>(ws_url: String, on_event: F, mut shutdown: watch::Receiver<bool>)
where
    F: Fn(ChangeNotification) + Send + Sync + 'static,
{
    let mut backoff = reconnect_backoff();
    loop {
        let mut stream = tokio::select! {
            _ = shutdown.changed() => return,
            connected = connect_async(ws_url.as_str()) => match connected {
                Ok((stream, _response)) => {
                    backoff.reset();
                    stream
                }
                Err(err) => {
                    let delay = backoff.next_backoff().unwrap_or(MAX_RECONNECT_DELAY);
                    tracing::warn!(
                        url = %ws_url,
                        error = %err,
                        delay_secs = delay.as_secs(),
                        "subscription connect failed"
                    );
                    tokio::select! {
                        _ = shutdown.changed() => return,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            },
        };
        tracing::info!(url = %ws_url, "subscribed to inventory changes");

        loop {
            let message = tokio::select! {
                _ = shutdown.changed() => return,
                message = stream.next() => message,
            };
            match message {
                Some(Ok(Message::Text(text))) => match ChangeNotification::parse(text.as_str()) {
                    Ok(event) => {
                        tracing::debug!(?event, "change notification");
                        on_event(event);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring undecodable change event");
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(url = %ws_url, "subscription closed by server");
                    break;
                }
                Some(Ok(_)) => {} // ping/pong/binary frames carry no events
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "subscription transport error");
                    break;
                }
            }
        }

        let delay = backoff.next_backoff().unwrap_or(MAX_RECONNECT_DELAY);
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
