//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::appointment::{Appointment, AppointmentContent};
use crate::domain::care_plan::{CarePlan, CarePlanContent, NewCarePlan};
use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::document::{Document, NewDocument, OwnerKind};
use crate::domain::export::{BulkExportAction, BulkExportPlan};
use crate::domain::note::{Note, NoteContent};
use crate::domain::reference::{NewReferenceItem, ReferenceItem, ReferenceKind};
use crate::domain::resource::{Resource, ResourceContent};
use crate::domain::shift_note::{PaymentState, ShiftNote, ShiftNoteContent};
use crate::domain::types::{
    AppointmentId, CarePlanId, ClientId, DocumentId, HubId, NoteId, ResourceId, ShiftNoteId,
};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AppointmentListQuery, AppointmentReader, AppointmentWriter, CarePlanListQuery,
    CarePlanReader, CarePlanWriter, ClientListQuery, ClientReader, ClientWriter, DocumentReader,
    DocumentWriter, HubListQuery, NoteListQuery, NoteReader, NoteWriter, ReferenceReader,
    ReferenceWriter, ResourceReader, ResourceWriter, ShiftNoteListQuery, ShiftNoteReader,
    ShiftNoteWriter,
};

mock! {
    pub Repository {}

    impl ClientReader for Repository {
        fn get_client_by_id(&self, id: ClientId, hub_id: HubId) -> RepositoryResult<Option<Client>>;
        fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)>;
    }

    impl ClientWriter for Repository {
        fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client>;
        fn update_client(
            &self,
            client_id: ClientId,
            hub_id: HubId,
            updates: &UpdateClient,
        ) -> RepositoryResult<Client>;
        fn delete_client(
            &self,
            client_id: ClientId,
            hub_id: HubId,
        ) -> RepositoryResult<Vec<Document>>;
    }

    impl CarePlanReader for Repository {
        fn get_care_plan_by_id(
            &self,
            id: CarePlanId,
            hub_id: HubId,
        ) -> RepositoryResult<Option<CarePlan>>;
        fn list_care_plans(
            &self,
            query: CarePlanListQuery,
        ) -> RepositoryResult<(usize, Vec<CarePlan>)>;
    }

    impl CarePlanWriter for Repository {
        fn create_care_plan(&self, new_plan: &NewCarePlan) -> RepositoryResult<CarePlan>;
        fn update_care_plan(
            &self,
            id: CarePlanId,
            hub_id: HubId,
            content: &CarePlanContent,
        ) -> RepositoryResult<CarePlan>;
        fn delete_care_plan(&self, id: CarePlanId, hub_id: HubId) -> RepositoryResult<()>;
    }

    impl AppointmentReader for Repository {
        fn get_appointment_by_id(
            &self,
            id: AppointmentId,
            hub_id: HubId,
        ) -> RepositoryResult<Option<Appointment>>;
        fn list_appointments(
            &self,
            query: AppointmentListQuery,
        ) -> RepositoryResult<(usize, Vec<Appointment>)>;
    }

    impl AppointmentWriter for Repository {
        fn create_appointment(
            &self,
            hub_id: HubId,
            content: &AppointmentContent,
        ) -> RepositoryResult<Appointment>;
        fn update_appointment(
            &self,
            id: AppointmentId,
            hub_id: HubId,
            content: &AppointmentContent,
        ) -> RepositoryResult<Appointment>;
        fn delete_appointment(
            &self,
            id: AppointmentId,
            hub_id: HubId,
        ) -> RepositoryResult<Vec<Document>>;
    }

    impl ShiftNoteReader for Repository {
        fn get_shift_note_by_id(
            &self,
            id: ShiftNoteId,
            hub_id: HubId,
        ) -> RepositoryResult<Option<ShiftNote>>;
        fn list_shift_notes(
            &self,
            query: ShiftNoteListQuery,
        ) -> RepositoryResult<(usize, Vec<ShiftNote>)>;
    }

    impl ShiftNoteWriter for Repository {
        fn create_shift_note(
            &self,
            hub_id: HubId,
            content: &ShiftNoteContent,
        ) -> RepositoryResult<ShiftNote>;
        fn update_shift_note(
            &self,
            id: ShiftNoteId,
            hub_id: HubId,
            content: &ShiftNoteContent,
        ) -> RepositoryResult<ShiftNote>;
        fn delete_shift_note(&self, id: ShiftNoteId, hub_id: HubId)
            -> RepositoryResult<Vec<Document>>;
        fn update_payment_states(
            &self,
            hub_id: HubId,
            ids: &[ShiftNoteId],
            status: PaymentState,
            comment: Option<String>,
        ) -> RepositoryResult<Vec<ShiftNote>>;
        fn increment_export_counts(&self, hub_id: HubId, ids: &[ShiftNoteId])
            -> RepositoryResult<usize>;
        fn apply_bulk_export(
            &self,
            hub_id: HubId,
            ids: &[ShiftNoteId],
            action: BulkExportAction,
        ) -> RepositoryResult<BulkExportPlan>;
    }

    impl ResourceReader for Repository {
        fn get_resource_by_id(
            &self,
            id: ResourceId,
            hub_id: HubId,
        ) -> RepositoryResult<Option<Resource>>;
        fn list_resources(&self, query: HubListQuery) -> RepositoryResult<(usize, Vec<Resource>)>;
    }

    impl ResourceWriter for Repository {
        fn create_resource(&self, hub_id: HubId, content: &ResourceContent)
            -> RepositoryResult<Resource>;
        fn update_resource(
            &self,
            id: ResourceId,
            hub_id: HubId,
            content: &ResourceContent,
        ) -> RepositoryResult<Resource>;
        fn delete_resource(&self, id: ResourceId, hub_id: HubId) -> RepositoryResult<Vec<Document>>;
    }

    impl NoteReader for Repository {
        fn get_note_by_id(&self, id: NoteId, hub_id: HubId) -> RepositoryResult<Option<Note>>;
        fn list_notes(&self, query: NoteListQuery) -> RepositoryResult<(usize, Vec<Note>)>;
    }

    impl NoteWriter for Repository {
        fn create_note(&self, hub_id: HubId, content: &NoteContent) -> RepositoryResult<Note>;
        fn update_note(
            &self,
            id: NoteId,
            hub_id: HubId,
            content: &NoteContent,
        ) -> RepositoryResult<Note>;
        fn delete_note(&self, id: NoteId, hub_id: HubId) -> RepositoryResult<Vec<Document>>;
    }

    impl DocumentReader for Repository {
        fn list_documents(
            &self,
            hub_id: HubId,
            owner_kind: OwnerKind,
            owner_id: i32,
        ) -> RepositoryResult<Vec<Document>>;
    }

    impl DocumentWriter for Repository {
        fn create_documents(&self, documents: &[NewDocument]) -> RepositoryResult<Vec<Document>>;
        fn delete_documents(
            &self,
            hub_id: HubId,
            owner_kind: OwnerKind,
            owner_id: i32,
            ids: &[DocumentId],
        ) -> RepositoryResult<Vec<Document>>;
    }

    impl ReferenceReader for Repository {
        fn list_reference_items(
            &self,
            hub_id: HubId,
            kind: ReferenceKind,
        ) -> RepositoryResult<Vec<ReferenceItem>>;
    }

    impl ReferenceWriter for Repository {
        fn create_reference_item(&self, item: &NewReferenceItem) -> RepositoryResult<ReferenceItem>;
    }
}
