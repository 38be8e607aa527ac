//! Integration tests for `SqliteStore` and the engine running on top of it,
//! against an in-memory database.

mod store;

use vigil_core::{user::UserId, vault::NewRecipient};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn alice() -> UserId { UserId::from("alice") }

fn bob() -> UserId { UserId::from("bob") }

fn recipient(name: &str) -> NewRecipient {
  NewRecipient {
    name:                     name.to_owned(),
    email:                    format!("{}@example.org", name.to_lowercase()),
    relationship_description: None,
  }
}

/// Let the clock advance so consecutive rows get distinct `created_at`.
async fn tick() { tokio::time::sleep(std::time::Duration::from_millis(2)).await }
