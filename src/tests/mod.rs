mod balance_tests;
mod settlement_tests;

use std::collections::HashMap;

use crate::core::models::group::Group;
use crate::core::models::user::User;
use crate::core::services::DivvyService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::notify::in_memory::InMemoryNotifier;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub struct TestContext {
    pub service: DivvyService<InMemoryLogging, InMemoryStorage, InMemoryNotifier>,
    pub storage: InMemoryStorage,
    pub notifier: InMemoryNotifier,
}

pub fn create_test_context() -> TestContext {
    let _ = env_logger::try_init();
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let notifier = InMemoryNotifier::new();
    TestContext {
        service: DivvyService::new(storage.clone(), logging, notifier.clone()),
        storage,
        notifier,
    }
}

/// Two users in one group, the first being the admin.
pub async fn setup_pair(ctx: &TestContext) -> (User, User, Group) {
    let alice = ctx
        .service
        .create_user("Alice".to_string(), "alice@example.com".to_string())
        .await
        .unwrap();
    let bob = ctx
        .service
        .create_user("Bob".to_string(), "bob@example.com".to_string())
        .await
        .unwrap();
    let group = ctx
        .service
        .create_group("Flat".to_string(), vec![bob.id.clone()], &alice.id)
        .await
        .unwrap();
    (alice, bob, group)
}

pub fn shares(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries.iter().map(|(id, amount)| (id.to_string(), *amount)).collect()
}
