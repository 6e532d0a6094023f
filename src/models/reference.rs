use diesel::prelude::*;

use crate::domain::reference::{
    NewReferenceItem as DomainNewReferenceItem, ReferenceItem as DomainReferenceItem,
    ReferenceKind,
};
use crate::domain::types::{ReferenceId, ReferenceName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::reference_items)]
pub struct ReferenceItem {
    pub id: i32,
    pub hub_id: i32,
    pub kind: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::reference_items)]
pub struct NewReferenceItem<'a> {
    pub hub_id: i32,
    pub kind: String,
    pub name: &'a str,
}

impl TryFrom<ReferenceItem> for DomainReferenceItem {
    type Error = TypeConstraintError;

    fn try_from(item: ReferenceItem) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReferenceId::new(item.id)?,
            kind: ReferenceKind::try_from(item.kind.as_str())?,
            name: ReferenceName::new(item.name)?,
            is_active: item.is_active,
        })
    }
}

impl<'a> From<&'a DomainNewReferenceItem> for NewReferenceItem<'a> {
    fn from(item: &'a DomainNewReferenceItem) -> Self {
        Self {
            hub_id: item.hub_id.get(),
            kind: item.kind.to_string(),
            name: item.name.as_str(),
        }
    }
}
