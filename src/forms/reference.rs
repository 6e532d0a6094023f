use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::reference::{NewReferenceItem, ReferenceKind};
use crate::domain::types::{HubId, ReferenceName};
use crate::forms::FormError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for adding a reference data item.
pub struct AddReferenceForm {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

impl AddReferenceForm {
    pub fn into_new_item(
        self,
        hub_id: HubId,
        kind: ReferenceKind,
    ) -> Result<NewReferenceItem, FormError> {
        self.validate()?;
        Ok(NewReferenceItem {
            hub_id,
            kind,
            name: ReferenceName::new(self.name)?,
        })
    }
}
