//! Batch display-name resolution over one staff snapshot.
//!
//! Read paths load the directory once per request and resolve every name
//! from memory instead of querying per lead.

use std::collections::HashMap;

use super::user::{StaffUser, UserId};

/// Name shown when a referenced user no longer exists.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Indexed snapshot of the staff directory.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    users: Vec<StaffUser>,
    by_id: HashMap<UserId, usize>,
}

impl NameDirectory {
    pub fn new(users: Vec<StaffUser>) -> Self {
        let by_id = users
            .iter()
            .enumerate()
            .map(|(index, user)| (user.id.clone(), index))
            .collect();
        Self { users, by_id }
    }

    /// Every user in directory order.
    pub fn users(&self) -> &[StaffUser] {
        &self.users
    }

    pub fn find(&self, id: &UserId) -> Option<&StaffUser> {
        self.by_id.get(id).and_then(|&index| self.users.get(index))
    }

    /// First user whose email matches, ignoring ASCII case and padding.
    pub fn find_by_email(&self, email: &str) -> Option<&StaffUser> {
        let wanted = email.trim();
        if wanted.is_empty() {
            return None;
        }
        self.users
            .iter()
            .find(|user| user.email.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn name_of(&self, id: &UserId) -> Option<&str> {
        self.find(id).map(|user| user.name.as_str())
    }

    /// Resolve an optional reference, falling back to [`UNKNOWN_NAME`].
    pub fn name_or_unknown(&self, id: Option<&UserId>) -> String {
        id.and_then(|id| self.name_of(id))
            .unwrap_or(UNKNOWN_NAME)
            .to_owned()
    }
}
