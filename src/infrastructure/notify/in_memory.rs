use crate::core::errors::DivvyError;
use crate::infrastructure::notify::{Event, Notifier};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    published: Arc<RwLock<Vec<(String, Event)>>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<(String, Event)> {
        let published = self.published.read().await;
        published.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn publish(&self, user_id: &str, event: Event) -> Result<(), DivvyError> {
        let mut published = self.published.write().await;
        published.push((user_id.to_string(), event));
        Ok(())
    }
}
