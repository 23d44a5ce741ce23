use serde::{Deserialize, Serialize};

use crate::job::{JobKey, JobKind};

/// Job-type-specific input carried by a queue message.
///
/// Internally tagged so the wire form reads `{"type": "translate", ...}`.
/// The enum is the registry: dispatch over it is an exhaustive match, so
/// an unhandled job type is a compile error, not a runtime fallback.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// Slow no-op sample job; carries no input.
    Example {},
    /// Translate the addressed todo item's title and create a derived
    /// item owned by `owner_id`.
    Translate {
        todo_item_id: String,
        owner_id: String,
    },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::Example {} => JobKind::Example,
            JobPayload::Translate { .. } => JobKind::Translate,
        }
    }
}

/// The queue payload: a job's key plus its typed input.
///
/// This is the sole vehicle carrying the key and input to the worker. It
/// lives only as long as the queue retains it and may be delivered more
/// than once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobMessage {
    pub key: JobKey,
    pub payload: JobPayload,
}

impl JobMessage {
    pub fn new(key: JobKey, payload: JobPayload) -> Self {
        Self { key, payload }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Why a delivery body could not be turned into a [`JobMessage`].
#[derive(Debug, thiserror::Error)]
pub enum MessageDecodeError {
    /// The body is not a message at all; no job key is recoverable.
    #[error("malformed job message: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The key decoded but the payload tag is not a declared job type.
    /// This is a defect in deployed code, not an expected input.
    #[error("unrecognized job type for {key}: {detail}")]
    UnknownJobType { key: JobKey, detail: String },
}

/// Decode a delivery body in two stages.
///
/// The key is recovered first so that a message with a bad payload tag
/// can still be resolved to its record and marked failed, instead of
/// vanishing into a parse error.
pub fn decode_message(body: &str) -> Result<JobMessage, MessageDecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(MessageDecodeError::Malformed)?;

    let key: JobKey = serde_json::from_value(value.get("key").cloned().unwrap_or_default())
        .map_err(MessageDecodeError::Malformed)?;

    let payload = serde_json::from_value(value.get("payload").cloned().unwrap_or_default())
        .map_err(|err| MessageDecodeError::UnknownJobType {
            key: key.clone(),
            detail: err.to_string(),
        })?;

    Ok(JobMessage { key, payload })
}
