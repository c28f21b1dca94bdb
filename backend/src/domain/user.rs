//! Staff users and the caller identity attached to every request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must not contain surrounding whitespace")]
    InvalidId,
    #[error("unknown hierarchy level: {0}")]
    UnknownHierarchyLevel(String),
}

/// Stable identifier of a staff user.
///
/// Identifiers are opaque strings issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    ///
    /// # Examples
    /// ```
    /// use leads_backend::domain::UserId;
    ///
    /// assert!(UserId::new("exec-1").is_ok());
    /// assert!(UserId::new("  ").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Position of a staff user in the sales hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HierarchyLevel {
    Executive,
    TeamLead,
    Manager,
    SuperAdmin,
}

impl HierarchyLevel {
    /// Wire label used by headers and storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executive => "executive",
            Self::TeamLead => "teamLead",
            Self::Manager => "manager",
            Self::SuperAdmin => "superAdmin",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyLevel {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "executive" => Ok(Self::Executive),
            "teamLead" => Ok(Self::TeamLead),
            "manager" => Ok(Self::Manager),
            "superAdmin" => Ok(Self::SuperAdmin),
            other => Err(UserValidationError::UnknownHierarchyLevel(other.to_owned())),
        }
    }
}

/// Staff member record as held by the staff directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub hierarchy_level: Option<HierarchyLevel>,
    /// Direct senior. May point at a user that no longer exists.
    pub senior_id: Option<UserId>,
    pub is_active: bool,
}

impl StaffUser {
    /// Active staff user with no senior, mostly useful for seeding.
    pub fn new(id: UserId, name: impl Into<String>, level: Option<HierarchyLevel>) -> Self {
        Self {
            id,
            name: name.into(),
            email: String::new(),
            role: String::new(),
            hierarchy_level: level,
            senior_id: None,
            is_active: true,
        }
    }

    /// Attach a direct senior.
    pub fn with_senior(mut self, senior: UserId) -> Self {
        self.senior_id = Some(senior);
        self
    }

    /// Attach a contact email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Identity of the staff user issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: UserId,
    /// `None` behaves like super admin for read scoping.
    pub hierarchy_level: Option<HierarchyLevel>,
    pub role: String,
}

impl CallerContext {
    pub fn new(user_id: UserId, hierarchy_level: Option<HierarchyLevel>) -> Self {
        Self {
            user_id,
            hierarchy_level,
            role: String::new(),
        }
    }

    /// Attach the caller's role label.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Whether the caller sits at the top of the hierarchy.
    pub fn is_super_admin(&self) -> bool {
        matches!(self.hierarchy_level, Some(HierarchyLevel::SuperAdmin))
    }

    /// Whether the caller is a sales executive.
    pub fn is_executive(&self) -> bool {
        matches!(self.hierarchy_level, Some(HierarchyLevel::Executive))
    }
}
