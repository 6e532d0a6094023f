use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::note::{Note as DomainNote, NoteContent};
use crate::domain::types::{
    ClientId, HubId, NoteId, RichText, ShareScope, Title, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::notes)]
pub struct Note {
    pub id: i32,
    pub hub_id: i32,
    pub client_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub effective_date: NaiveDate,
    pub share_scope: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notes)]
pub struct NewNote<'a> {
    pub hub_id: i32,
    pub client_id: Option<i32>,
    pub title: &'a str,
    pub body: &'a str,
    pub effective_date: NaiveDate,
    pub share_scope: String,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::notes)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateNote<'a> {
    pub client_id: Option<i32>,
    pub title: &'a str,
    pub body: &'a str,
    pub effective_date: NaiveDate,
    pub share_scope: String,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Note> for DomainNote {
    type Error = TypeConstraintError;

    fn try_from(note: Note) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NoteId::new(note.id)?,
            hub_id: HubId::new(note.hub_id)?,
            client_id: note.client_id.map(ClientId::new).transpose()?,
            title: Title::new(note.title)?,
            body: RichText::new(note.body),
            effective_date: note.effective_date,
            share_scope: ShareScope::try_from(note.share_scope.as_str())?,
            documents: Vec::new(),
            created_at: note.created_at,
            updated_at: note.updated_at,
        })
    }
}

impl<'a> NewNote<'a> {
    pub fn from_domain(hub_id: HubId, content: &'a NoteContent) -> Self {
        Self {
            hub_id: hub_id.get(),
            client_id: content.client_id.map(ClientId::get),
            title: content.title.as_str(),
            body: content.body.as_str(),
            effective_date: content.effective_date,
            share_scope: content.share_scope.to_string(),
        }
    }
}

impl<'a> UpdateNote<'a> {
    pub fn from_domain(content: &'a NoteContent, updated_at: NaiveDateTime) -> Self {
        Self {
            client_id: content.client_id.map(ClientId::get),
            title: content.title.as_str(),
            body: content.body.as_str(),
            effective_date: content.effective_date,
            share_scope: content.share_scope.to_string(),
            updated_at,
        }
    }
}
