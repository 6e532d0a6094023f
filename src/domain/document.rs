//! Persisted documents attached to appointments, shift notes, resources and notes.

use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{DocumentId, DocumentLocation, FileName, HubId, TypeConstraintError};

/// Largest attachment accepted from a file selection, in bytes.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Entity kind that owns a document.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Appointment,
    ShiftNote,
    Resource,
    Note,
}

impl Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerKind::Appointment => write!(f, "Appointment"),
            OwnerKind::ShiftNote => write!(f, "ShiftNote"),
            OwnerKind::Resource => write!(f, "Resource"),
            OwnerKind::Note => write!(f, "Note"),
        }
    }
}

impl TryFrom<&str> for OwnerKind {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Appointment" => Ok(OwnerKind::Appointment),
            "ShiftNote" => Ok(OwnerKind::ShiftNote),
            "Resource" => Ok(OwnerKind::Resource),
            "Note" => Ok(OwnerKind::Note),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown document owner `{other}`"
            ))),
        }
    }
}

/// A document already stored by the server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub file_name: FileName,
    pub location: DocumentLocation,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: NaiveDateTime,
}

/// Metadata for a document about to be inserted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDocument {
    pub hub_id: HubId,
    pub owner_kind: OwnerKind,
    pub owner_id: i32,
    pub file_name: FileName,
    pub location: DocumentLocation,
    pub content_type: String,
    pub size_bytes: u64,
}

/// Whether a selected file of `size_bytes` may be attached.
#[must_use]
pub fn accepts_size(size_bytes: u64) -> bool {
    size_bytes <= MAX_ATTACHMENT_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_guard_accepts_exactly_five_mebibytes() {
        assert!(accepts_size(0));
        assert!(accepts_size(MAX_ATTACHMENT_BYTES));
        assert!(!accepts_size(MAX_ATTACHMENT_BYTES + 1));
    }

    #[test]
    fn owner_kind_round_trips_through_text() {
        for kind in [
            OwnerKind::Appointment,
            OwnerKind::ShiftNote,
            OwnerKind::Resource,
            OwnerKind::Note,
        ] {
            assert_eq!(OwnerKind::try_from(kind.to_string().as_str()), Ok(kind));
        }
        assert!(OwnerKind::try_from("Invoice").is_err());
    }
}
