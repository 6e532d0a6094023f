//! Flat reference data used to populate selectors.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::types::{HubId, ReferenceId, ReferenceName, TypeConstraintError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Language,
    ClientType,
    ClientStatus,
    ClientClassification,
    CarePlanStatus,
    GoalOutcome,
    AppointmentType,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 7] = [
        ReferenceKind::Language,
        ReferenceKind::ClientType,
        ReferenceKind::ClientStatus,
        ReferenceKind::ClientClassification,
        ReferenceKind::CarePlanStatus,
        ReferenceKind::GoalOutcome,
        ReferenceKind::AppointmentType,
    ];

    /// URL segment the kind is served under.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            ReferenceKind::Language => "languages",
            ReferenceKind::ClientType => "clientTypes",
            ReferenceKind::ClientStatus => "clientStatus",
            ReferenceKind::ClientClassification => "classifications",
            ReferenceKind::CarePlanStatus => "carePlanStatus",
            ReferenceKind::GoalOutcome => "goalOutcomes",
            ReferenceKind::AppointmentType => "appointmentTypes",
        }
    }

    pub fn from_path(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.path() == segment)
    }
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ReferenceKind::Language => "Language",
            ReferenceKind::ClientType => "ClientType",
            ReferenceKind::ClientStatus => "ClientStatus",
            ReferenceKind::ClientClassification => "ClientClassification",
            ReferenceKind::CarePlanStatus => "CarePlanStatus",
            ReferenceKind::GoalOutcome => "GoalOutcome",
            ReferenceKind::AppointmentType => "AppointmentType",
        };
        write!(f, "{value}")
    }
}

impl TryFrom<&str> for ReferenceKind {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == value)
            .ok_or_else(|| {
                TypeConstraintError::InvalidValue(format!("unknown reference kind `{value}`"))
            })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferenceItem {
    pub id: ReferenceId,
    pub kind: ReferenceKind,
    pub name: ReferenceName,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReferenceItem {
    pub hub_id: HubId,
    pub kind: ReferenceKind,
    pub name: ReferenceName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_back_to_kinds() {
        for kind in ReferenceKind::ALL {
            assert_eq!(ReferenceKind::from_path(kind.path()), Some(kind));
            assert_eq!(ReferenceKind::try_from(kind.to_string().as_str()), Ok(kind));
        }
        assert_eq!(ReferenceKind::from_path("careplans"), None);
    }
}
