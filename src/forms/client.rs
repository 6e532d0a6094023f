use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::client::{ClientAddress, ClientClassifiers, NewClient, UpdateClient};
use crate::domain::types::{ClientEmail, ClientName, HubId, PhoneNumber, ReferenceId};
use crate::forms::{derived_errors, field_error, finish, parse_id, parse_optional_id};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for creating or updating a client.
pub struct ClientForm {
    /// Display name.
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Contact email, blank means none.
    pub email: Option<String>,
    pub phone: Option<String>,
    pub physical_address: Option<String>,
    pub postal_address: Option<String>,
    pub client_type_id: Option<i32>,
    pub client_status_id: Option<i32>,
    #[serde(default)]
    pub classification_ids: Vec<i32>,
    #[serde(default)]
    pub language_ids: Vec<i32>,
}

/// Validated client fields.
pub struct ClientPayload {
    pub name: ClientName,
    pub email: Option<ClientEmail>,
    pub phone: Option<PhoneNumber>,
    pub address: ClientAddress,
    pub classifiers: ClientClassifiers,
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TryFrom<&ClientForm> for ClientPayload {
    type Error = ValidationErrors;

    fn try_from(form: &ClientForm) -> Result<Self, Self::Error> {
        let mut errors = derived_errors(form.validate());

        let name = ClientName::new(form.name.as_str())
            .map_err(|_| errors.add("name", field_error("required", "Name is required")))
            .ok();
        let email = blank_to_none(&form.email).and_then(|email| {
            ClientEmail::new(email)
                .map_err(|_| errors.add("email", field_error("email", "Invalid email address")))
                .ok()
        });
        let phone = blank_to_none(&form.phone).and_then(|phone| {
            PhoneNumber::new(phone)
                .map_err(|_| errors.add("phone", field_error("phone", "Invalid phone number")))
                .ok()
        });

        let client_type_id = parse_optional_id(&mut errors, "client_type_id", form.client_type_id);
        let status_id = parse_optional_id(&mut errors, "client_status_id", form.client_status_id);
        let classification_ids: Vec<Option<ReferenceId>> = form
            .classification_ids
            .iter()
            .map(|&raw| parse_id(&mut errors, "classification_ids", raw))
            .collect();
        let language_ids: Vec<Option<ReferenceId>> = form
            .language_ids
            .iter()
            .map(|&raw| parse_id(&mut errors, "language_ids", raw))
            .collect();

        finish(errors)?;

        Ok(Self {
            // `finish` returned early if the name failed to parse.
            name: name.ok_or_else(ValidationErrors::new)?,
            email,
            phone,
            address: ClientAddress::new(form.physical_address.clone(), form.postal_address.clone()),
            classifiers: ClientClassifiers {
                client_type_id,
                status_id,
                classification_ids: classification_ids.into_iter().flatten().collect(),
                language_ids: language_ids.into_iter().flatten().collect(),
            },
        })
    }
}

impl ClientPayload {
    pub fn into_new_client(self, hub_id: HubId) -> NewClient {
        NewClient::new(
            hub_id,
            self.name,
            self.email,
            self.phone,
            self.address,
            self.classifiers,
        )
    }

    pub fn into_update(self) -> UpdateClient {
        UpdateClient::new(
            self.name,
            self.email,
            self.phone,
            self.address,
            self.classifiers,
        )
    }
}
