//! Socket API message types.

use serde::{Deserialize, Serialize};

use activityhub_domain::frequency::Frequency;

pub const ITEMS: &str = "activity_manager/items";
pub const ADD: &str = "activity_manager/add";
pub const UPDATE: &str = "activity_manager/update";
pub const REMOVE: &str = "activity_manager/remove";
pub const SUBSCRIBE: &str = "activity_manager/subscribe";
pub const UNSUBSCRIBE_EVENTS: &str = "unsubscribe_events";
pub const PING: &str = "ping";

/// Every command type the socket understands.
pub const COMMANDS: [&str; 7] = [ITEMS, ADD, UPDATE, REMOVE, SUBSCRIBE, UNSUBSCRIBE_EVENTS, PING];

pub const ERR_INVALID_FORMAT: &str = "invalid_format";
pub const ERR_UNKNOWN_COMMAND: &str = "unknown_command";
pub const ERR_NOT_FOUND: &str = "not_found";
pub const ERR_HOME_ASSISTANT_ERROR: &str = "home_assistant_error";

/// Command sent by a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Incoming {
    #[serde(rename = "activity_manager/items")]
    Items {
        id: u64,
        #[serde(default)]
        category: Option<String>,
    },
    #[serde(rename = "activity_manager/add")]
    Add {
        id: u64,
        name: String,
        category: String,
        frequency: Frequency,
        #[serde(default)]
        last_completed: Option<i64>,
        #[serde(default)]
        icon: Option<String>,
    },
    #[serde(rename = "activity_manager/update")]
    Update {
        id: u64,
        item_id: String,
        #[serde(default)]
        last_completed: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        category: Option<String>,
    },
    #[serde(rename = "activity_manager/remove")]
    Remove { id: u64, item_id: String },
    #[serde(rename = "activity_manager/subscribe")]
    Subscribe { id: u64 },
    #[serde(rename = "unsubscribe_events")]
    UnsubscribeEvents { id: u64, subscription: u64 },
    #[serde(rename = "ping")]
    Ping { id: u64 },
}

/// Frame sent to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Result(ResultMessage),
    Event(EventMessage),
    Pong(PongMessage),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub event: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub id: u64,
    #[serde(rename = "type")]
    pub msg_type: &'static str,
}

impl Outgoing {
    #[must_use]
    pub fn result(id: u64, result: serde_json::Value) -> Self {
        Self::Result(ResultMessage {
            id,
            msg_type: "result",
            success: true,
            result: Some(result),
            error: None,
        })
    }

    #[must_use]
    pub fn error(id: u64, code: &'static str, message: impl Into<String>) -> Self {
        Self::Result(ResultMessage {
            id,
            msg_type: "result",
            success: false,
            result: None,
            error: Some(ErrorInfo {
                code,
                message: message.into(),
            }),
        })
    }

    #[must_use]
    pub fn event(id: u64, event: serde_json::Value) -> Self {
        Self::Event(EventMessage {
            id,
            msg_type: "event",
            event,
        })
    }

    #[must_use]
    pub fn pong(id: u64) -> Self {
        Self::Pong(PongMessage {
            id,
            msg_type: "pong",
        })
    }
}
