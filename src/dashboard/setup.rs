//! First-time profile setup: the income choice set, the submitted form and
//! how it merges into the stored parent record.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::SetupError;
use crate::records::ParentRecord;

/// Monthly household income brackets offered by the setup form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IncomeBracket {
    #[default]
    UpTo10k,
    From10kTo15k,
    From15kTo20k,
    From20kTo25k,
    Above25k,
}

impl IncomeBracket {
    pub const ALL: [IncomeBracket; 5] = [
        Self::UpTo10k,
        Self::From10kTo15k,
        Self::From15kTo20k,
        Self::From20kTo25k,
        Self::Above25k,
    ];

    /// The exact text stored in `householdIncome`.
    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo10k => "₱10,000 and below",
            Self::From10kTo15k => "₱10,001–15,000",
            Self::From15kTo20k => "₱15,001–20,000",
            Self::From20kTo25k => "₱20,001–25,000",
            Self::Above25k => "₱25,001 and above",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == label)
    }

    /// One-based position in the dropdown.
    pub fn from_position(position: usize) -> Option<Self> {
        position
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

impl fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for IncomeBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Values the setup form opens with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SetupPrompt {
    pub name: String,
    pub contact: String,
    pub income: IncomeBracket,
}

impl SetupPrompt {
    /// Prefills from whatever the stored profile already has. An unset or
    /// unrecognized income falls back to the first bracket.
    pub fn prefill(parent: &ParentRecord) -> Self {
        Self {
            name: parent.name.clone().unwrap_or_default(),
            contact: parent.contact.clone().unwrap_or_default(),
            income: parent
                .household_income
                .as_deref()
                .and_then(IncomeBracket::from_label)
                .unwrap_or_default(),
        }
    }

    pub fn form(&self) -> ProfileForm {
        ProfileForm {
            name: self.name.clone(),
            contact: self.contact.clone(),
            income: self.income,
        }
    }
}

/// What the parent submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub contact: String,
    pub income: IncomeBracket,
}

pub const MISSING_FIELDS: &str = "Please enter your name and contact number.";

impl ProfileForm {
    /// Merges the trimmed form into `parent`, keeping every other field.
    ///
    /// Fails without touching anything when the name or contact is blank.
    pub fn apply_to(&self, parent: &ParentRecord) -> Result<ParentRecord, SetupError> {
        let name = self.name.trim();
        let contact = self.contact.trim();
        if name.is_empty() || contact.is_empty() {
            return Err(SetupError::Validation(MISSING_FIELDS));
        }

        Ok(ParentRecord {
            name: Some(name.to_string()),
            contact: Some(contact.to_string()),
            household_income: Some(self.income.label().to_string()),
            ..parent.clone()
        })
    }
}
