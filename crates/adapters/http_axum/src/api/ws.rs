//! WebSocket command API.
//!
//! Every connection owns one writer task fed by an mpsc channel, so command
//! replies and subscription events never interleave mid-frame. Subscriptions
//! are tasks forwarding bus events; they are aborted on `unsubscribe_events`
//! and when the connection goes away.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use activityhub_app::ports::{ActivityStore, EventPublisher};
use activityhub_app::services::activity_service::{ActivityUpdate, NewActivity};
use activityhub_domain::error::ActivityHubError;
use activityhub_domain::event::{Event, EventType};
use activityhub_domain::frequency::Frequency;
use activityhub_domain::id::ActivityId;
use activityhub_domain::time::{TimestampInput, now};

use crate::api::ws_messages::{
    COMMANDS, ERR_HOME_ASSISTANT_ERROR, ERR_INVALID_FORMAT, ERR_NOT_FOUND, ERR_UNKNOWN_COMMAND,
    Incoming, Outgoing,
};
use crate::state::AppState;

const OUTGOING_BUFFER: usize = 256;

/// `GET /api/websocket`
pub async fn upgrade<S, P>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S, P>>,
) -> impl IntoResponse
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket<S, P>(socket: WebSocket, state: AppState<S, P>)
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Outgoing>(OUTGOING_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(%err, "failed to serialize socket message");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    tracing::debug!("socket client connected");
    let mut connection = Connection::new(state);
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => connection.handle_text(text.as_str(), &tx).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(%err, "socket error");
                break;
            }
        }
    }

    drop(connection);
    send_task.abort();
    tracing::debug!("socket client disconnected");
}

/// Per-connection command handler.
pub struct Connection<S, P> {
    state: AppState<S, P>,
    subscriptions: HashMap<u64, JoinHandle<()>>,
}

impl<S, P> Drop for Connection<S, P> {
    fn drop(&mut self) {
        for (_, task) in self.subscriptions.drain() {
            task.abort();
        }
    }
}

impl<S, P> Connection<S, P>
where
    S: ActivityStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(state: AppState<S, P>) -> Self {
        Self {
            state,
            subscriptions: HashMap::new(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handle one text frame, queueing every reply on `tx`.
    pub async fn handle_text(&mut self, text: &str, tx: &mpsc::Sender<Outgoing>) {
        let reply = self.handle(text, tx).await;
        if tx.send(reply).await.is_err() {
            tracing::debug!("socket writer gone, reply dropped");
        }
    }

    async fn handle(&mut self, text: &str, tx: &mpsc::Sender<Outgoing>) -> Outgoing {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(err) => return Outgoing::error(0, ERR_INVALID_FORMAT, err.to_string()),
        };
        let id = value.get("id").and_then(serde_json::Value::as_u64).unwrap_or(0);
        let command = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        if !COMMANDS.contains(&command) {
            return Outgoing::error(id, ERR_UNKNOWN_COMMAND, "Unknown command.");
        }
        tracing::trace!(id, command, "socket command");

        let incoming: Incoming = match serde_json::from_value(value) {
            Ok(incoming) => incoming,
            Err(err) => {
                return Outgoing::error(
                    id,
                    ERR_INVALID_FORMAT,
                    format!("Message incorrectly formatted: {err}"),
                );
            }
        };

        let result = match incoming {
            Incoming::Items { id, category } => Ok(self.items(id, category).await),
            Incoming::Add {
                id,
                name,
                category,
                frequency,
                last_completed,
                icon,
            } => {
                let last_completed = last_completed.map(TimestampInput::Epoch);
                self.add(id, name, category, frequency, last_completed, icon)
                    .await
            }
            Incoming::Update {
                id,
                item_id,
                last_completed,
                name,
                category,
            } => {
                let last_completed = last_completed.map(TimestampInput::Text);
                self.update(id, &item_id, last_completed, name, category)
                    .await
            }
            Incoming::Remove { id, item_id } => self.remove(id, &item_id).await,
            Incoming::Subscribe { id } => Ok(self.subscribe(id, tx)),
            Incoming::UnsubscribeEvents { id, subscription } => {
                Ok(self.unsubscribe(id, subscription))
            }
            Incoming::Ping { id } => Ok(Outgoing::pong(id)),
        };

        result.unwrap_or_else(|err| error_frame(id, &err))
    }

    async fn items(&self, id: u64, category: Option<String>) -> Outgoing {
        let items = self
            .state
            .activity_service
            .items(category.as_deref())
            .await;
        Outgoing::result(id, to_json(&items))
    }

    async fn add(
        &self,
        id: u64,
        name: String,
        category: String,
        frequency: Frequency,
        last_completed: Option<TimestampInput>,
        icon: Option<String>,
    ) -> Result<Outgoing, ActivityHubError> {
        let last_completed = last_completed.map(|input| input.resolve()).transpose()?;
        let created = self
            .state
            .activity_service
            .add_activity(NewActivity {
                names: vec![name],
                category,
                frequency,
                last_completed,
                icon,
            })
            .await?;
        Ok(Outgoing::result(id, to_json(&created)))
    }

    async fn update(
        &self,
        id: u64,
        item_id: &str,
        last_completed: Option<TimestampInput>,
        name: Option<String>,
        category: Option<String>,
    ) -> Result<Outgoing, ActivityHubError> {
        let last_completed = match last_completed {
            Some(input) => input.resolve()?,
            None => now(),
        };
        let Some(activity_id) = parse_item_id(item_id) else {
            return Ok(Outgoing::result(id, serde_json::Value::Null));
        };
        let updated = self
            .state
            .activity_service
            .update_activity(
                activity_id,
                ActivityUpdate {
                    last_completed: Some(last_completed),
                    category,
                    name,
                    ..ActivityUpdate::default()
                },
            )
            .await?;
        Ok(Outgoing::result(id, to_json(&updated)))
    }

    async fn remove(&self, id: u64, item_id: &str) -> Result<Outgoing, ActivityHubError> {
        let Some(activity_id) = parse_item_id(item_id) else {
            return Ok(Outgoing::result(id, serde_json::Value::Null));
        };
        let removed = self
            .state
            .activity_service
            .remove_activity(activity_id)
            .await?;
        Ok(Outgoing::result(id, to_json(&removed)))
    }

    fn subscribe(&mut self, id: u64, tx: &mpsc::Sender<Outgoing>) -> Outgoing {
        let mut events = self.state.event_bus.subscribe();
        let tx = tx.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.event_type == EventType::ActivityManagerUpdated => {
                        if tx.send(Outgoing::event(id, event_payload(&event))).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            skipped,
                            subscription = id,
                            "socket subscriber lagged, some events were dropped"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.subscriptions.insert(id, task) {
            previous.abort();
        }
        Outgoing::result(id, serde_json::Value::Null)
    }

    fn unsubscribe(&mut self, id: u64, subscription: u64) -> Outgoing {
        match self.subscriptions.remove(&subscription) {
            Some(task) => {
                task.abort();
                Outgoing::result(id, serde_json::Value::Null)
            }
            None => Outgoing::error(id, ERR_NOT_FOUND, "Subscription not found."),
        }
    }
}

fn parse_item_id(item_id: &str) -> Option<ActivityId> {
    match ActivityId::from_str(item_id) {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::debug!(item_id, "ignored, malformed item id");
            None
        }
    }
}

fn event_payload(event: &Event) -> serde_json::Value {
    serde_json::json!({
        "event_type": event.event_type,
        "data": event.data,
        "time_fired": event.timestamp.to_rfc3339(),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|err| {
        tracing::warn!(%err, "failed to serialize socket result");
        serde_json::Value::Null
    })
}

fn error_frame(id: u64, err: &ActivityHubError) -> Outgoing {
    match err {
        ActivityHubError::Validation(inner) => {
            Outgoing::error(id, ERR_INVALID_FORMAT, inner.to_string())
        }
        ActivityHubError::NotFound(inner) => Outgoing::error(id, ERR_NOT_FOUND, inner.to_string()),
        ActivityHubError::Storage(inner) => {
            tracing::error!(error = %inner, "storage error");
            Outgoing::error(id, ERR_HOME_ASSISTANT_ERROR, "Failed to save activities.")
        }
    }
}
