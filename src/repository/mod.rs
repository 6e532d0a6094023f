use chrono::NaiveDate;

use crate::db::{DbConnection, DbPool};
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
    AppointmentId, CarePlanId, CaregiverId, ClientId, DocumentId, HubId, NoteId, ResourceId,
    ShiftNoteId,
};
use crate::repository::errors::RepositoryResult;

pub mod appointment;
pub mod care_plan;
pub mod client;
pub mod document;
pub mod errors;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod note;
pub mod reference;
pub mod resource;
pub mod shift_note;

/// Diesel-backed repository implementing every reader and writer trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub(crate) fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.per_page as i64
    }

    pub(crate) fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[derive(Debug, Clone)]
pub struct ClientListQuery {
    pub hub_id: HubId,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl ClientListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            search: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone)]
pub struct CarePlanListQuery {
    pub hub_id: HubId,
    pub client_id: Option<ClientId>,
    pub pagination: Option<Pagination>,
}

impl CarePlanListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            client_id: None,
            pagination: None,
        }
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone)]
pub struct AppointmentListQuery {
    pub hub_id: HubId,
    pub client_id: Option<ClientId>,
    /// Appointments starting on or after this day.
    pub from: Option<NaiveDate>,
    /// Appointments starting on or before this day.
    pub to: Option<NaiveDate>,
    pub pagination: Option<Pagination>,
}

impl AppointmentListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            client_id: None,
            from: None,
            to: None,
            pagination: None,
        }
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone)]
pub struct ShiftNoteListQuery {
    pub hub_id: HubId,
    pub client_id: Option<ClientId>,
    pub caregiver_id: Option<CaregiverId>,
    pub payment_state: Option<PaymentState>,
    /// Only rows that are neither Paid nor Rejected.
    pub outstanding_only: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub pagination: Option<Pagination>,
}

impl ShiftNoteListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            client_id: None,
            caregiver_id: None,
            payment_state: None,
            outstanding_only: false,
            from: None,
            to: None,
            pagination: None,
        }
    }

    pub fn client(mut self, client_id: Option<ClientId>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn caregiver(mut self, caregiver_id: Option<CaregiverId>) -> Self {
        self.caregiver_id = caregiver_id;
        self
    }

    pub fn payment_state(mut self, state: Option<PaymentState>) -> Self {
        self.payment_state = state;
        self
    }

    pub fn outstanding_only(mut self, outstanding_only: bool) -> Self {
        self.outstanding_only = outstanding_only;
        self
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// List query for hub-wide collections (resources).
#[derive(Debug, Clone)]
pub struct HubListQuery {
    pub hub_id: HubId,
    pub pagination: Option<Pagination>,
}

impl HubListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            pagination: None,
        }
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone)]
pub struct NoteListQuery {
    pub hub_id: HubId,
    pub client_id: Option<ClientId>,
    pub pagination: Option<Pagination>,
}

impl NoteListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            client_id: None,
            pagination: None,
        }
    }

    pub fn client(mut self, client_id: Option<ClientId>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait ClientReader {
    fn get_client_by_id(&self, id: ClientId, hub_id: HubId) -> RepositoryResult<Option<Client>>;
    fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)>;
}

pub trait ClientWriter {
    fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client>;
    fn update_client(
        &self,
        client_id: ClientId,
        hub_id: HubId,
        updates: &UpdateClient,
    ) -> RepositoryResult<Client>;
    /// Deletes the client with everything hanging off it, returning the
    /// documents whose files must be removed.
    fn delete_client(&self, client_id: ClientId, hub_id: HubId) -> RepositoryResult<Vec<Document>>;
}

pub trait CarePlanReader {
    fn get_care_plan_by_id(
        &self,
        id: CarePlanId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<CarePlan>>;
    fn list_care_plans(&self, query: CarePlanListQuery)
    -> RepositoryResult<(usize, Vec<CarePlan>)>;
}

pub trait CarePlanWriter {
    fn create_care_plan(&self, new_plan: &NewCarePlan) -> RepositoryResult<CarePlan>;
    fn update_care_plan(
        &self,
        id: CarePlanId,
        hub_id: HubId,
        content: &CarePlanContent,
    ) -> RepositoryResult<CarePlan>;
    fn delete_care_plan(&self, id: CarePlanId, hub_id: HubId) -> RepositoryResult<()>;
}

pub trait AppointmentReader {
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

pub trait AppointmentWriter {
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

pub trait ShiftNoteReader {
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

pub trait ShiftNoteWriter {
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
    /// Moves every listed timesheet to `status` in one transaction.
    ///
    /// Fails with `NotFound` if any id is missing and with `Conflict` if any
    /// row does not allow the transition; nothing is written in either case.
    fn update_payment_states(
        &self,
        hub_id: HubId,
        ids: &[ShiftNoteId],
        status: PaymentState,
        comment: Option<String>,
    ) -> RepositoryResult<Vec<ShiftNote>>;
    /// Adds one to the export count of every listed timesheet.
    fn increment_export_counts(&self, hub_id: HubId, ids: &[ShiftNoteId])
    -> RepositoryResult<usize>;
    /// Plans and applies a bulk export action over the current export counts.
    fn apply_bulk_export(
        &self,
        hub_id: HubId,
        ids: &[ShiftNoteId],
        action: BulkExportAction,
    ) -> RepositoryResult<BulkExportPlan>;
}

pub trait ResourceReader {
    fn get_resource_by_id(
        &self,
        id: ResourceId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Resource>>;
    fn list_resources(&self, query: HubListQuery) -> RepositoryResult<(usize, Vec<Resource>)>;
}

pub trait ResourceWriter {
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

pub trait NoteReader {
    fn get_note_by_id(&self, id: NoteId, hub_id: HubId) -> RepositoryResult<Option<Note>>;
    fn list_notes(&self, query: NoteListQuery) -> RepositoryResult<(usize, Vec<Note>)>;
}

pub trait NoteWriter {
    fn create_note(&self, hub_id: HubId, content: &NoteContent) -> RepositoryResult<Note>;
    fn update_note(
        &self,
        id: NoteId,
        hub_id: HubId,
        content: &NoteContent,
    ) -> RepositoryResult<Note>;
    fn delete_note(&self, id: NoteId, hub_id: HubId) -> RepositoryResult<Vec<Document>>;
}

pub trait DocumentReader {
    fn list_documents(
        &self,
        hub_id: HubId,
        owner_kind: OwnerKind,
        owner_id: i32,
    ) -> RepositoryResult<Vec<Document>>;
}

pub trait DocumentWriter {
    fn create_documents(&self, documents: &[NewDocument]) -> RepositoryResult<Vec<Document>>;
    /// Removes the listed documents of one owner. Ids owned by anyone else
    /// are ignored. Returns the removed rows.
    fn delete_documents(
        &self,
        hub_id: HubId,
        owner_kind: OwnerKind,
        owner_id: i32,
        ids: &[DocumentId],
    ) -> RepositoryResult<Vec<Document>>;
}

pub trait ReferenceReader {
    fn list_reference_items(
        &self,
        hub_id: HubId,
        kind: ReferenceKind,
    ) -> RepositoryResult<Vec<ReferenceItem>>;
}

pub trait ReferenceWriter {
    fn create_reference_item(&self, item: &NewReferenceItem) -> RepositoryResult<ReferenceItem>;
}
