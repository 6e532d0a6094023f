use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::document::Document;
use crate::domain::types::{HubId, ResourceId, ShareScope, Title, TypeConstraintError};

/// Dates a resource is valid for. `to` is never before `from`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Validity {
    from: NaiveDate,
    to: Option<NaiveDate>,
}

impl Validity {
    pub fn new(from: NaiveDate, to: Option<NaiveDate>) -> Result<Self, TypeConstraintError> {
        if to.is_some_and(|to| to < from) {
            return Err(TypeConstraintError::InvalidValue(
                "validity ends before it starts".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        day >= self.from && self.to.is_none_or(|to| day <= to)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub hub_id: HubId,
    pub title: Title,
    pub description: Option<String>,
    pub validity: Validity,
    pub share_scope: ShareScope,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable content of a resource, shared by create and update.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceContent {
    pub title: Title,
    pub description: Option<String>,
    pub validity: Validity,
    pub share_scope: ShareScope,
}
