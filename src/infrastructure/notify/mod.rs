pub mod in_memory;

use crate::core::errors::DivvyError;
use async_trait::async_trait;
use serde::Serialize;

/// A real-time update pushed to one user after a state transition. Delivery
/// mechanics live entirely behind this trait; the core only publishes.
#[derive(Clone, Debug, Serialize)]
pub struct Event {
    pub kind: String,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new<T: Serialize>(kind: &str, payload: &T) -> Self {
        Event {
            kind: kind.to_string(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, user_id: &str, event: Event) -> Result<(), DivvyError>;
}
