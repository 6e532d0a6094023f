use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::document::Document;
use crate::domain::types::{ClientId, HubId, NoteId, RichText, ShareScope, Title};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub hub_id: HubId,
    pub client_id: Option<ClientId>,
    pub title: Title,
    pub body: RichText,
    pub effective_date: NaiveDate,
    pub share_scope: ShareScope,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable content of a note, shared by create and update.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteContent {
    pub client_id: Option<ClientId>,
    pub title: Title,
    pub body: RichText,
    pub effective_date: NaiveDate,
    pub share_scope: ShareScope,
}
