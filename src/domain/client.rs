use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClientEmail, ClientId, ClientName, HubId, PhoneNumber, ReferenceId};

/// Physical and postal addresses of a client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClientAddress {
    pub physical: Option<String>,
    pub postal: Option<String>,
}

impl ClientAddress {
    /// Trims both lines and drops the blank ones.
    #[must_use]
    pub fn new(physical: Option<String>, postal: Option<String>) -> Self {
        Self {
            physical: trim_optional(physical),
            postal: trim_optional(postal),
        }
    }
}

/// Reference data a client is tagged with.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClientClassifiers {
    pub client_type_id: Option<ReferenceId>,
    pub status_id: Option<ReferenceId>,
    pub classification_ids: Vec<ReferenceId>,
    pub language_ids: Vec<ReferenceId>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub hub_id: HubId,
    pub name: ClientName,
    pub email: Option<ClientEmail>,
    pub phone: Option<PhoneNumber>,
    pub address: ClientAddress,
    pub classifiers: ClientClassifiers,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NewClient {
    pub hub_id: HubId,
    pub name: ClientName,
    pub email: Option<ClientEmail>,
    pub phone: Option<PhoneNumber>,
    pub address: ClientAddress,
    pub classifiers: ClientClassifiers,
}

impl NewClient {
    #[must_use]
    pub fn new(
        hub_id: HubId,
        name: ClientName,
        email: Option<ClientEmail>,
        phone: Option<PhoneNumber>,
        address: ClientAddress,
        classifiers: ClientClassifiers,
    ) -> Self {
        Self {
            hub_id,
            name,
            email,
            phone,
            address,
            classifiers: dedup_classifiers(classifiers),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpdateClient {
    pub name: ClientName,
    pub email: Option<ClientEmail>,
    pub phone: Option<PhoneNumber>,
    pub address: ClientAddress,
    pub classifiers: ClientClassifiers,
}

impl UpdateClient {
    #[must_use]
    pub fn new(
        name: ClientName,
        email: Option<ClientEmail>,
        phone: Option<PhoneNumber>,
        address: ClientAddress,
        classifiers: ClientClassifiers,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            address,
            classifiers: dedup_classifiers(classifiers),
        }
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Keeps the first occurrence of each classification and language id.
fn dedup_classifiers(mut classifiers: ClientClassifiers) -> ClientClassifiers {
    fn dedup(ids: &mut Vec<ReferenceId>) {
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
    }
    dedup(&mut classifiers.classification_ids);
    dedup(&mut classifiers.language_ids);
    classifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: i32) -> ReferenceId {
        ReferenceId::new(id).unwrap()
    }

    #[test]
    fn address_lines_are_trimmed_and_blank_lines_dropped() {
        let address = ClientAddress::new(Some("  1 Main St ".into()), Some("   ".into()));
        assert_eq!(address.physical.as_deref(), Some("1 Main St"));
        assert_eq!(address.postal, None);
    }

    #[test]
    fn new_client_deduplicates_reference_ids() {
        let client = NewClient::new(
            HubId::new(1).unwrap(),
            ClientName::new("Ada").unwrap(),
            None,
            None,
            ClientAddress::default(),
            ClientClassifiers {
                client_type_id: None,
                status_id: None,
                classification_ids: vec![reference(3), reference(1), reference(3)],
                language_ids: vec![reference(2), reference(2)],
            },
        );
        assert_eq!(
            client.classifiers.classification_ids,
            vec![reference(3), reference(1)]
        );
        assert_eq!(client.classifiers.language_ids, vec![reference(2)]);
    }
}
