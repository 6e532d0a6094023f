use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::document::{Document as DomainDocument, NewDocument as DomainNewDocument};
use crate::domain::types::{DocumentId, DocumentLocation, FileName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::documents)]
pub struct Document {
    pub id: i32,
    pub hub_id: i32,
    pub owner_kind: String,
    pub owner_id: i32,
    pub file_name: String,
    pub location: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::documents)]
pub struct NewDocument<'a> {
    pub hub_id: i32,
    pub owner_kind: String,
    pub owner_id: i32,
    pub file_name: &'a str,
    pub location: &'a str,
    pub content_type: &'a str,
    pub size_bytes: i64,
}

impl TryFrom<Document> for DomainDocument {
    type Error = TypeConstraintError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DocumentId::new(document.id)?,
            file_name: FileName::new(document.file_name)?,
            location: DocumentLocation::new(document.location)?,
            content_type: document.content_type,
            size_bytes: u64::try_from(document.size_bytes).map_err(|_| {
                TypeConstraintError::InvalidValue("negative document size".to_string())
            })?,
            created_at: document.created_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewDocument> for NewDocument<'a> {
    type Error = TypeConstraintError;

    fn try_from(document: &'a DomainNewDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            hub_id: document.hub_id.get(),
            owner_kind: document.owner_kind.to_string(),
            owner_id: document.owner_id,
            file_name: document.file_name.as_str(),
            location: document.location.as_str(),
            content_type: document.content_type.as_str(),
            size_bytes: i64::try_from(document.size_bytes).map_err(|_| {
                TypeConstraintError::InvalidValue("document too large".to_string())
            })?,
        })
    }
}
