use crate::domain::value_objects::UserId;
use crate::ports::user_directory::{Result, UserDirectory as UserDirectoryTrait};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Mock implementation of UserDirectory
///
/// Supports stateful testing by storing user IDs.
pub struct UserDirectory {
    users: Mutex<HashSet<UserId>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashSet::new()),
        }
    }

    /// Register a new user and return its id
    pub fn add_user(&self) -> UserId {
        let user_id = UserId::new();
        self.register(user_id);
        user_id
    }

    /// Register an existing id for testing purposes
    pub fn register(&self, user_id: UserId) {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id);
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectoryTrait for UserDirectory {
    /// Check if user exists in the registered users
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id))
    }
}
