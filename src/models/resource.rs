use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::resource::{Resource as DomainResource, ResourceContent, Validity};
use crate::domain::types::{HubId, ResourceId, ShareScope, Title, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::resources)]
pub struct Resource {
    pub id: i32,
    pub hub_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub share_scope: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::resources)]
pub struct NewResource<'a> {
    pub hub_id: i32,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub share_scope: String,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::resources)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateResource<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub share_scope: String,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Resource> for DomainResource {
    type Error = TypeConstraintError;

    fn try_from(resource: Resource) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ResourceId::new(resource.id)?,
            hub_id: HubId::new(resource.hub_id)?,
            title: Title::new(resource.title)?,
            description: resource.description,
            validity: Validity::new(resource.valid_from, resource.valid_to)?,
            share_scope: ShareScope::try_from(resource.share_scope.as_str())?,
            documents: Vec::new(),
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        })
    }
}

impl<'a> NewResource<'a> {
    pub fn from_domain(hub_id: HubId, content: &'a ResourceContent) -> Self {
        Self {
            hub_id: hub_id.get(),
            title: content.title.as_str(),
            description: content.description.as_deref(),
            valid_from: content.validity.from(),
            valid_to: content.validity.to(),
            share_scope: content.share_scope.to_string(),
        }
    }
}

impl<'a> UpdateResource<'a> {
    pub fn from_domain(content: &'a ResourceContent, updated_at: NaiveDateTime) -> Self {
        Self {
            title: content.title.as_str(),
            description: content.description.as_deref(),
            valid_from: content.validity.from(),
            valid_to: content.validity.to(),
            share_scope: content.share_scope.to_string(),
            updated_at,
        }
    }
}
