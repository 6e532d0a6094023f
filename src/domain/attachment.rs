//! Attachment editing session.
//!
//! One display list merges documents the server already holds (`Old`, keyed
//! by document id) with files picked in the current session (`New`, keyed by
//! file name). Deleting an `Old` entry stages the document for removal on the
//! next save; deleting a `New` entry just forgets the pending upload.

use serde::{Deserialize, Serialize};

use crate::domain::document::{Document, accepts_size};
use crate::domain::types::DocumentId;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttachmentStatus {
    Old,
    New,
}

/// Stable key of a display entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttachmentKey {
    Old(DocumentId),
    New(String),
}

/// A row of the merged display list.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AttachmentEntry {
    pub name: String,
    pub doc_id: Option<DocumentId>,
    pub status: AttachmentStatus,
}

impl AttachmentEntry {
    pub fn key(&self) -> AttachmentKey {
        match (self.status, self.doc_id) {
            (AttachmentStatus::Old, Some(id)) => AttachmentKey::Old(id),
            _ => AttachmentKey::New(self.name.clone()),
        }
    }
}

/// A locally selected file that has not been uploaded yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What a viewer should open for an entry.
#[derive(Debug, PartialEq, Eq)]
pub enum AttachmentView<'a> {
    /// Persisted document served from this location.
    Remote(&'a str),
    /// In-memory file selected during this session.
    Local(&'a PendingFile),
}

/// Changes to send with the owning entity on save.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AttachmentChanges {
    pub uploads: Vec<PendingFile>,
    pub removed_document_ids: Vec<DocumentId>,
}

#[derive(Debug, Default)]
pub struct AttachmentSession {
    existing: Vec<Document>,
    entries: Vec<AttachmentEntry>,
    pending: Vec<PendingFile>,
    removed: Vec<Document>,
}

impl AttachmentSession {
    /// Starts a session over the documents the entity already has.
    pub fn new(existing: Vec<Document>) -> Self {
        let entries = existing
            .iter()
            .map(|doc| AttachmentEntry {
                name: doc.file_name.to_string(),
                doc_id: Some(doc.id),
                status: AttachmentStatus::Old,
            })
            .collect();
        Self {
            existing,
            entries,
            pending: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Merged list shown to the user, newest additions first.
    pub fn entries(&self) -> &[AttachmentEntry] {
        &self.entries
    }

    /// Documents staged for removal on the next save.
    pub fn removed(&self) -> &[Document] {
        &self.removed
    }

    pub fn pending(&self) -> &[PendingFile] {
        &self.pending
    }

    /// Adds selected files ahead of the current entries.
    ///
    /// Oversized files and names already pending are skipped. Returns the
    /// number of files accepted.
    pub fn add_files(&mut self, files: Vec<PendingFile>) -> usize {
        let mut accepted = Vec::new();
        for file in files {
            if !accepts_size(file.size()) {
                log::debug!("Skipping oversized attachment {}", file.name);
                continue;
            }
            let duplicate = self.pending.iter().any(|p| p.name == file.name)
                || accepted.iter().any(|p: &PendingFile| p.name == file.name);
            if duplicate {
                continue;
            }
            accepted.push(file);
        }

        let count = accepted.len();
        let mut entries: Vec<AttachmentEntry> = accepted
            .iter()
            .map(|file| AttachmentEntry {
                name: file.name.clone(),
                doc_id: None,
                status: AttachmentStatus::New,
            })
            .collect();
        entries.append(&mut self.entries);
        self.entries = entries;

        accepted.append(&mut self.pending);
        self.pending = accepted;
        count
    }

    /// Resolves an entry to something a viewer can open.
    pub fn view(&self, key: &AttachmentKey) -> Option<AttachmentView<'_>> {
        match key {
            AttachmentKey::Old(id) => self
                .existing
                .iter()
                .find(|doc| doc.id == *id)
                .filter(|_| self.entries.iter().any(|e| e.key() == *key))
                .map(|doc| AttachmentView::Remote(doc.location.as_str())),
            AttachmentKey::New(name) => self
                .pending
                .iter()
                .find(|file| file.name == *name)
                .map(AttachmentView::Local),
        }
    }

    /// Removes an entry from the display list. Returns `false` if absent.
    pub fn delete(&mut self, key: &AttachmentKey) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.key() == *key) else {
            return false;
        };
        self.entries.remove(position);

        match key {
            AttachmentKey::Old(id) => {
                if let Some(doc) = self.existing.iter().find(|doc| doc.id == *id) {
                    self.removed.push(doc.clone());
                }
            }
            AttachmentKey::New(name) => self.pending.retain(|file| file.name != *name),
        }
        true
    }

    /// Consumes the session into the payload sent on save.
    pub fn into_changes(self) -> AttachmentChanges {
        AttachmentChanges {
            uploads: self.pending,
            removed_document_ids: self.removed.into_iter().map(|doc| doc.id).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::document::MAX_ATTACHMENT_BYTES;
    use crate::domain::types::{DocumentLocation, FileName};

    fn document(id: i32, name: &str) -> Document {
        Document {
            id: DocumentId::new(id).unwrap(),
            file_name: FileName::new(name).unwrap(),
            location: DocumentLocation::new(format!("/documents/{id}/{name}")).unwrap(),
            content_type: "application/pdf".to_string(),
            size_bytes: 1_024,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn file(name: &str, size: usize) -> PendingFile {
        PendingFile::new(name, "image/png", vec![0; size])
    }

    fn names(session: &AttachmentSession) -> Vec<&str> {
        session.entries().iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn added_files_appear_before_existing_entries() {
        let mut session = AttachmentSession::new(vec![document(1, "a.pdf"), document(2, "b.pdf")]);
        session.add_files(vec![file("c.png", 10)]);
        session.add_files(vec![file("d.png", 10), file("e.png", 10)]);

        assert_eq!(names(&session), vec!["d.png", "e.png", "c.png", "a.pdf", "b.pdf"]);
        let old = session
            .entries()
            .iter()
            .filter(|e| e.status == AttachmentStatus::Old)
            .count();
        assert_eq!(old, 2);
    }

    #[test]
    fn oversized_files_are_dropped_silently() {
        let mut session = AttachmentSession::new(Vec::new());
        let limit = MAX_ATTACHMENT_BYTES as usize;
        let accepted = session.add_files(vec![
            file("big.png", limit + 1),
            file("edge.png", limit),
            file("small.png", 1),
        ]);

        assert_eq!(accepted, 2);
        assert_eq!(names(&session), vec!["edge.png", "small.png"]);
        assert_eq!(session.pending().len(), 2);
    }

    #[test]
    fn new_files_are_deduplicated_by_name() {
        let mut session = AttachmentSession::new(Vec::new());
        session.add_files(vec![file("x.png", 1)]);
        let accepted = session.add_files(vec![file("x.png", 2), file("y.png", 2)]);

        assert_eq!(accepted, 1);
        assert_eq!(names(&session), vec!["y.png", "x.png"]);
    }

    #[test]
    fn old_and_new_entries_with_same_name_stay_disjoint() {
        let mut session = AttachmentSession::new(vec![document(4, "care.pdf")]);
        session.add_files(vec![PendingFile::new("care.pdf", "application/pdf", vec![1])]);

        assert_eq!(session.entries().len(), 2);
        assert!(session.delete(&AttachmentKey::New("care.pdf".to_string())));
        assert_eq!(session.entries()[0].status, AttachmentStatus::Old);
        assert!(session.removed().is_empty());
    }

    #[test]
    fn view_resolves_old_to_location_and_new_to_file() {
        let mut session = AttachmentSession::new(vec![document(7, "plan.pdf")]);
        session.add_files(vec![file("photo.png", 3)]);

        let old = session.view(&AttachmentKey::Old(DocumentId::new(7).unwrap()));
        assert_eq!(old, Some(AttachmentView::Remote("/documents/7/plan.pdf")));

        match session.view(&AttachmentKey::New("photo.png".to_string())) {
            Some(AttachmentView::Local(file)) => assert_eq!(file.bytes.len(), 3),
            other => panic!("unexpected view {other:?}"),
        }
    }

    #[test]
    fn deleting_old_entry_stages_document_for_removal() {
        let mut session = AttachmentSession::new(vec![document(1, "a.pdf"), document(2, "b.pdf")]);
        session.add_files(vec![file("c.png", 1)]);

        assert!(session.delete(&AttachmentKey::Old(DocumentId::new(2).unwrap())));
        assert!(session.delete(&AttachmentKey::New("c.png".to_string())));
        assert!(!session.delete(&AttachmentKey::New("c.png".to_string())));
        assert!(
            session
                .view(&AttachmentKey::Old(DocumentId::new(2).unwrap()))
                .is_none()
        );

        assert_eq!(names(&session), vec!["a.pdf"]);
        let changes = session.into_changes();
        assert!(changes.uploads.is_empty());
        assert_eq!(changes.removed_document_ids, vec![DocumentId::new(2).unwrap()]);
    }
}
