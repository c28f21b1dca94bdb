//! In-memory `StaffDirectory`.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{StaffDirectory, StaffDirectoryError};
use crate::domain::{StaffUser, UserId};

/// Staff users in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryStaffDirectory {
    users: RwLock<Vec<StaffUser>>,
}

impl InMemoryStaffDirectory {
    pub fn new(users: Vec<StaffUser>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Add a user or replace the one with the same id.
    pub async fn upsert(&self, user: StaffUser) {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }
}

#[async_trait]
impl StaffDirectory for InMemoryStaffDirectory {
    async fn list_all(&self) -> Result<Vec<StaffUser>, StaffDirectoryError> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<StaffUser>, StaffDirectoryError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| &user.id == id)
            .cloned())
    }
}
