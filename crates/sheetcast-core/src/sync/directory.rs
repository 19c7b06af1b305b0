//! Registered users.

use crate::error::{Result, SheetcastError};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: &str) -> Self {
        User {
            username: username.to_string(),
        }
    }
}

/// Lookup-by-name user registry the sync service resolves owners against.
pub trait UserDirectory: Send + Sync {
    fn exists(&self, username: &str) -> bool;
    /// Fails with `UserExists` when the name is taken.
    fn add(&self, user: User) -> Result<()>;
    fn lookup(&self, username: &str) -> Option<User>;
    /// Registered names, sorted.
    fn usernames(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: DashMap<String, User>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for MemoryDirectory {
    fn exists(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    fn add(&self, user: User) -> Result<()> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(SheetcastError::UserExists(user.username)),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    fn lookup(&self, username: &str) -> Option<User> {
        self.users.get(username).map(|u| u.value().clone())
    }

    fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.users.iter().map(|u| u.key().clone()).collect();
        names.sort();
        names
    }
}
