//! On-disk store for uploaded documents.
//!
//! Files are written under `upload_dir` with a random prefix and served back
//! under `documents_url`.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::domain::attachment::PendingFile;
use crate::domain::document::{Document, NewDocument, OwnerKind};
use crate::domain::types::{DocumentLocation, FileName, HubId};
use crate::models::config::ServerConfig;

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
    public_url: String,
}

/// Keeps the last path segment and replaces anything outside `[A-Za-z0-9._-]`.
fn stored_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let name = if cleaned.is_empty() { "file" } else { cleaned };
    format!("{}-{name}", Uuid::new_v4().simple())
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        let public_url: String = public_url.into();
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.upload_dir, &config.documents_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the files and returns the rows describing them.
    ///
    /// Files written before a failure are removed again.
    pub fn save(
        &self,
        hub_id: HubId,
        owner_kind: OwnerKind,
        owner_id: i32,
        files: &[PendingFile],
    ) -> io::Result<Vec<NewDocument>> {
        std::fs::create_dir_all(&self.root)?;
        let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
        let mut documents = Vec::with_capacity(files.len());

        for file in files {
            let name = stored_name(&file.name);
            let path = self.root.join(&name);
            if let Err(e) = std::fs::write(&path, &file.bytes) {
                self.discard(&written);
                return Err(e);
            }
            written.push(path);

            let document = FileName::new(file.name.as_str())
                .and_then(|file_name| {
                    Ok((
                        file_name,
                        DocumentLocation::new(format!("{}/{name}", self.public_url))?,
                    ))
                })
                .map(|(file_name, location)| NewDocument {
                    hub_id,
                    owner_kind,
                    owner_id,
                    file_name,
                    location,
                    content_type: file.content_type.clone(),
                    size_bytes: file.size(),
                });
            match document {
                Ok(document) => documents.push(document),
                Err(e) => {
                    self.discard(&written);
                    return Err(io::Error::new(io::ErrorKind::InvalidInput, e.to_string()));
                }
            }
        }
        Ok(documents)
    }

    /// Best-effort removal of stored files; failures are logged.
    pub fn remove(&self, documents: &[Document]) {
        for document in documents {
            let Some(path) = self.path_of(document.location.as_str()) else {
                log::warn!("Document location outside store: {}", document.location);
                continue;
            };
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Failed to remove {}: {e}", path.display());
            }
        }
    }

    /// Removes files written by [`DocumentStore::save`] whose rows were never
    /// recorded.
    pub fn discard_unrecorded(&self, documents: &[NewDocument]) {
        let paths: Vec<PathBuf> = documents
            .iter()
            .filter_map(|document| self.path_of(document.location.as_str()))
            .collect();
        self.discard(&paths);
    }

    fn path_of(&self, location: &str) -> Option<PathBuf> {
        let name = location
            .strip_prefix(&self.public_url)?
            .trim_start_matches('/');
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.root.join(name))
    }

    fn discard(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = std::fs::remove_file(path) {
                log::warn!("Failed to clean up {}: {e}", path.display());
            }
        }
    }
}
