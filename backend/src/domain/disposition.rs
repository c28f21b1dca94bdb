//! Call outcome labels recorded against leads.
//!
//! Dispositions are a small closed vocabulary plus whatever free text older
//! data or spreadsheet imports carry. Unknown labels are preserved verbatim
//! and sort after every known label.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sub-disposition attached to leads that re-enquire through an ad.
pub const HOT_LEAD: &str = "Hot Lead";

/// Placeholder for unset free-text lead fields.
pub const NOT_AVAILABLE: &str = "NA";

/// Current call outcome of a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Disposition {
    #[default]
    NotAvailable,
    NotOpen,
    CallBack,
    NoResponse,
    Presentation,
    FollowUp,
    Prospect,
    NotInterested,
    DealDone,
    Other(String),
}

/// Known dispositions in sales-panel order.
const ORDER: [Disposition; 9] = [
    Disposition::NotAvailable,
    Disposition::NotOpen,
    Disposition::CallBack,
    Disposition::NoResponse,
    Disposition::Presentation,
    Disposition::FollowUp,
    Disposition::Prospect,
    Disposition::NotInterested,
    Disposition::DealDone,
];

impl Disposition {
    /// Parse a stored or submitted label. Blank input maps to
    /// [`Disposition::NotAvailable`].
    ///
    /// # Examples
    /// ```
    /// use leads_backend::domain::Disposition;
    ///
    /// assert_eq!(Disposition::from_label(" Call Back "), Disposition::CallBack);
    /// assert_eq!(
    ///     Disposition::from_label("Callback later"),
    ///     Disposition::Other("Callback later".to_owned())
    /// );
    /// ```
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "" | NOT_AVAILABLE => Self::NotAvailable,
            "Not Open" => Self::NotOpen,
            "Call Back" => Self::CallBack,
            "No Response" => Self::NoResponse,
            "Presentation" => Self::Presentation,
            "FollowUp" => Self::FollowUp,
            "Prospect" => Self::Prospect,
            "Not Interested" => Self::NotInterested,
            "Deal Done" => Self::DealDone,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Stored label.
    pub fn label(&self) -> &str {
        match self {
            Self::NotAvailable => NOT_AVAILABLE,
            Self::NotOpen => "Not Open",
            Self::CallBack => "Call Back",
            Self::NoResponse => "No Response",
            Self::Presentation => "Presentation",
            Self::FollowUp => "FollowUp",
            Self::Prospect => "Prospect",
            Self::NotInterested => "Not Interested",
            Self::DealDone => "Deal Done",
            Self::Other(label) => label.as_str(),
        }
    }

    /// Position in the sales-panel ordering; unknown labels rank last.
    pub fn sort_rank(&self) -> usize {
        ORDER
            .iter()
            .position(|known| known == self)
            .unwrap_or(ORDER.len())
    }

    /// Disposition a lead carries after being handed to another executive.
    ///
    /// A lead the previous owner gave up on is reopened for the new owner;
    /// every other outcome is kept.
    pub fn after_reassignment(&self) -> Self {
        match self {
            Self::NotInterested => Self::NotOpen,
            other => other.clone(),
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Disposition {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<Disposition> for String {
    fn from(value: Disposition) -> Self {
        match value {
            Disposition::Other(label) => label,
            known => known.label().to_owned(),
        }
    }
}
