use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::client::{
    Client as DomainClient, ClientAddress, ClientClassifiers, NewClient as DomainNewClient,
    UpdateClient as DomainUpdateClient,
};
use crate::domain::types::{
    ClientEmail, ClientId, ClientName, HubId, PhoneNumber, ReferenceId, TypeConstraintError,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::clients)]
/// Diesel model for [`crate::domain::client::Client`].
pub struct Client {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub physical_address: Option<String>,
    pub postal_address: Option<String>,
    pub client_type_id: Option<i32>,
    pub client_status_id: Option<i32>,
    pub classification_ids: String,
    pub language_ids: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::clients)]
/// Insertable form of [`Client`].
pub struct NewClient<'a> {
    pub hub_id: i32,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub physical_address: Option<&'a str>,
    pub postal_address: Option<&'a str>,
    pub client_type_id: Option<i32>,
    pub client_status_id: Option<i32>,
    pub classification_ids: String,
    pub language_ids: String,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(treat_none_as_null = true)]
/// Data used when updating a [`Client`] record.
pub struct UpdateClient<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub physical_address: Option<&'a str>,
    pub postal_address: Option<&'a str>,
    pub client_type_id: Option<i32>,
    pub client_status_id: Option<i32>,
    pub classification_ids: String,
    pub language_ids: String,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Client> for DomainClient {
    type Error = TypeConstraintError;

    fn try_from(client: Client) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClientId::new(client.id)?,
            hub_id: HubId::new(client.hub_id)?,
            name: ClientName::new(client.name)?,
            email: client.email.map(ClientEmail::new).transpose()?,
            phone: client.phone.map(PhoneNumber::new).transpose()?,
            address: ClientAddress::new(client.physical_address, client.postal_address),
            classifiers: ClientClassifiers {
                client_type_id: client.client_type_id.map(ReferenceId::new).transpose()?,
                status_id: client.client_status_id.map(ReferenceId::new).transpose()?,
                classification_ids: decode_json(&client.classification_ids)?,
                language_ids: decode_json(&client.language_ids)?,
            },
            created_at: client.created_at,
            updated_at: client.updated_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewClient> for NewClient<'a> {
    type Error = TypeConstraintError;

    fn try_from(client: &'a DomainNewClient) -> Result<Self, Self::Error> {
        Ok(Self {
            hub_id: client.hub_id.get(),
            name: client.name.as_str(),
            email: client.email.as_ref().map(ClientEmail::as_str),
            phone: client.phone.as_ref().map(PhoneNumber::as_str),
            physical_address: client.address.physical.as_deref(),
            postal_address: client.address.postal.as_deref(),
            client_type_id: client.classifiers.client_type_id.map(ReferenceId::get),
            client_status_id: client.classifiers.status_id.map(ReferenceId::get),
            classification_ids: encode_json(&client.classifiers.classification_ids)?,
            language_ids: encode_json(&client.classifiers.language_ids)?,
        })
    }
}

impl<'a> UpdateClient<'a> {
    pub fn from_domain(
        client: &'a DomainUpdateClient,
        updated_at: NaiveDateTime,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            name: client.name.as_str(),
            email: client.email.as_ref().map(ClientEmail::as_str),
            phone: client.phone.as_ref().map(PhoneNumber::as_str),
            physical_address: client.address.physical.as_deref(),
            postal_address: client.address.postal.as_deref(),
            client_type_id: client.classifiers.client_type_id.map(ReferenceId::get),
            client_status_id: client.classifiers.status_id.map(ReferenceId::get),
            classification_ids: encode_json(&client.classifiers.classification_ids)?,
            language_ids: encode_json(&client.classifiers.language_ids)?,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row() -> Client {
        let now = Utc::now().naive_utc();
        Client {
            id: 1,
            hub_id: 2,
            name: "Ruth Ellis".to_string(),
            email: Some("ruth@example.com".to_string()),
            phone: None,
            physical_address: Some("4 Park Lane".to_string()),
            postal_address: None,
            client_type_id: Some(3),
            client_status_id: None,
            classification_ids: "[5,6]".to_string(),
            language_ids: "[]".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_into_domain() {
        let client = DomainClient::try_from(row()).unwrap();
        assert_eq!(client.id.get(), 1);
        assert_eq!(client.name.as_str(), "Ruth Ellis");
        assert_eq!(client.classifiers.classification_ids.len(), 2);
        assert_eq!(client.address.physical.as_deref(), Some("4 Park Lane"));
    }

    #[test]
    fn corrupt_row_is_rejected() {
        let mut bad = row();
        bad.hub_id = 0;
        assert!(DomainClient::try_from(bad).is_err());
    }

    #[test]
    fn domain_client_encodes_id_lists() {
        let client = DomainClient::try_from(row()).unwrap();
        let new = DomainNewClient::new(
            client.hub_id,
            client.name,
            client.email,
            client.phone,
            client.address,
            client.classifiers,
        );
        let insertable = NewClient::try_from(&new).unwrap();
        assert_eq!(insertable.classification_ids, "[5,6]");
        assert_eq!(insertable.email, Some("ruth@example.com"));
    }
}
