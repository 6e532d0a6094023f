//! Client-side state: one [`Slice`] per entity plus a notification queue.
//!
//! Every async method performs exactly one API call and records its outcome
//! on the matching slice status. Failures other than cancellation are pushed
//! as error notifications.

use std::future::Future;

use serde::Serialize;

use crate::client::api::{ApiClient, ApiError};
use crate::client::status::RequestStatus;
use crate::client::timesheets::TimesheetFeed;
use crate::domain::appointment::Appointment;
use crate::domain::attachment::{AttachmentChanges, AttachmentSession};
use crate::domain::care_plan::CarePlan;
use crate::domain::client::Client;
use crate::domain::export::BulkExportDialog;
use crate::domain::note::Note;
use crate::domain::reference::{ReferenceItem, ReferenceKind};
use crate::domain::resource::Resource;
use crate::domain::shift_note::{ShiftNote, StatusChange};
use crate::dto::query::{AppointmentsQuery, ClientScopedQuery, ClientsQuery, PageQuery};
use crate::dto::timesheet::{BulkExportOutcome, IncrementOutcome, TimesheetRow};
use crate::forms::appointment::AppointmentForm;
use crate::forms::care_plan::CarePlanForm;
use crate::forms::client::ClientForm;
use crate::forms::note::NoteForm;
use crate::forms::reference::AddReferenceForm;
use crate::forms::resource::ResourceForm;
use crate::forms::shift_note::ShiftNoteForm;
use crate::forms::timesheet::{
    BulkExportForm, BulkStatusForm, ExportIncrementForm, TimesheetFilterQuery,
};
use crate::pagination::Paginated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Per-entity state.
#[derive(Debug, Clone)]
pub struct Slice<T> {
    pub items: Paginated<T>,
    pub current: Option<T>,
    /// Status of list and detail fetches.
    pub state: RequestStatus,
    pub submit_state: RequestStatus,
    pub update_state: RequestStatus,
    pub delete_state: RequestStatus,
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Self {
            items: Paginated::default(),
            current: None,
            state: RequestStatus::Idle,
            submit_state: RequestStatus::Idle,
            update_state: RequestStatus::Idle,
            delete_state: RequestStatus::Idle,
        }
    }
}

/// Reference lists keyed by kind, in the order they were loaded.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSlice {
    lists: Vec<(ReferenceKind, Vec<ReferenceItem>)>,
    pub state: RequestStatus,
    pub submit_state: RequestStatus,
}

impl ReferenceSlice {
    pub fn items(&self, kind: ReferenceKind) -> &[ReferenceItem] {
        self.lists
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, items)| items.as_slice())
            .unwrap_or(&[])
    }

    fn replace(&mut self, kind: ReferenceKind, items: Vec<ReferenceItem>) {
        match self.lists.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => *existing = items,
            None => self.lists.push((kind, items)),
        }
    }

    fn push(&mut self, kind: ReferenceKind, item: ReferenceItem) {
        let mut items = self.items(kind).to_vec();
        items.push(item);
        items.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        self.replace(kind, items);
    }
}

pub struct Store {
    api: ApiClient,
    feed: TimesheetFeed,
    pub clients: Slice<Client>,
    pub care_plans: Slice<CarePlan>,
    pub appointments: Slice<Appointment>,
    pub shift_notes: Slice<ShiftNote>,
    pub timesheets: Slice<TimesheetRow>,
    pub resources: Slice<Resource>,
    pub notes: Slice<Note>,
    pub reference: ReferenceSlice,
    notifications: Vec<Notification>,
}

/// Tracks one request on `status`, pushing a notification when it fails.
async fn track<T, F>(
    status: &mut RequestStatus,
    notifications: &mut Vec<Notification>,
    request: F,
) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    *status = RequestStatus::Loading;
    match request.await {
        Ok(value) => {
            *status = RequestStatus::Success;
            Ok(value)
        }
        Err(ApiError::Canceled) => {
            *status = RequestStatus::Idle;
            Err(ApiError::Canceled)
        }
        Err(err) => {
            log::error!("API request failed: {err}");
            *status = RequestStatus::Failed;
            notifications.push(Notification {
                level: NotificationLevel::Error,
                message: err.user_message(),
            });
            Err(err)
        }
    }
}

/// Replaces the entry with a matching id in the list and the current slot.
fn upsert<T: Clone, K: PartialEq>(slice: &mut Slice<T>, value: &T, key: impl Fn(&T) -> K) {
    let id = key(value);
    if let Some(existing) = slice.items.items.iter_mut().find(|item| key(item) == id) {
        *existing = value.clone();
    }
    slice.current = Some(value.clone());
}

fn remove<T, K: PartialEq>(slice: &mut Slice<T>, id: K, key: impl Fn(&T) -> K) {
    let before = slice.items.items.len();
    slice.items.items.retain(|item| key(item) != id);
    if slice.items.items.len() < before {
        slice.items.total = slice.items.total.saturating_sub(1);
    }
    if slice.current.as_ref().is_some_and(|item| key(item) == id) {
        slice.current = None;
    }
}

fn removed_ids(changes: &AttachmentChanges) -> Vec<i32> {
    changes
        .removed_document_ids
        .iter()
        .map(|id| id.get())
        .collect()
}

impl Store {
    pub fn new(api: ApiClient) -> Self {
        let feed = TimesheetFeed::new(api.clone());
        Self::with_feed(api, feed)
    }

    pub fn with_feed(api: ApiClient, feed: TimesheetFeed) -> Self {
        Self {
            api,
            feed,
            clients: Slice::default(),
            care_plans: Slice::default(),
            appointments: Slice::default(),
            shift_notes: Slice::default(),
            timesheets: Slice::default(),
            resources: Slice::default(),
            notes: Slice::default(),
            reference: ReferenceSlice::default(),
            notifications: Vec::new(),
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Hands queued notifications to the caller.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify_success(&mut self, message: impl Into<String>) {
        self.notifications.push(Notification {
            level: NotificationLevel::Success,
            message: message.into(),
        });
    }

    // Clients

    pub async fn fetch_clients(&mut self, query: &ClientsQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.clients.state,
            &mut self.notifications,
            self.api.list_clients(query),
        )
        .await?;
        self.clients.items = page;
        Ok(())
    }

    pub async fn fetch_client(&mut self, id: i32) -> Result<(), ApiError> {
        let client = track(
            &mut self.clients.state,
            &mut self.notifications,
            self.api.get_client(id),
        )
        .await?;
        self.clients.current = Some(client);
        Ok(())
    }

    pub async fn create_client(&mut self, form: &ClientForm) -> Result<Client, ApiError> {
        let client = track(
            &mut self.clients.submit_state,
            &mut self.notifications,
            self.api.create_client(form),
        )
        .await?;
        self.clients.current = Some(client.clone());
        self.notify_success("Client created");
        Ok(client)
    }

    pub async fn update_client(&mut self, id: i32, form: &ClientForm) -> Result<Client, ApiError> {
        let client = track(
            &mut self.clients.update_state,
            &mut self.notifications,
            self.api.update_client(id, form),
        )
        .await?;
        upsert(&mut self.clients, &client, |c| c.id);
        self.notify_success("Client updated");
        Ok(client)
    }

    pub async fn delete_client(&mut self, id: i32) -> Result<(), ApiError> {
        track(
            &mut self.clients.delete_state,
            &mut self.notifications,
            self.api.delete_client(id),
        )
        .await?;
        remove(&mut self.clients, id, |c| c.id.get());
        self.notify_success("Client deleted");
        Ok(())
    }

    // Care plans

    pub async fn fetch_care_plans(&mut self, query: &ClientScopedQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.care_plans.state,
            &mut self.notifications,
            self.api.list_care_plans(query),
        )
        .await?;
        self.care_plans.items = page;
        Ok(())
    }

    pub async fn fetch_client_care_plans(&mut self, client_id: i32) -> Result<(), ApiError> {
        let plans = track(
            &mut self.care_plans.state,
            &mut self.notifications,
            self.api.client_care_plans(client_id),
        )
        .await?;
        let total = plans.len();
        self.care_plans.items = Paginated::new(plans, total, 1, total);
        Ok(())
    }

    pub async fn fetch_care_plan(&mut self, id: i32) -> Result<(), ApiError> {
        let plan = track(
            &mut self.care_plans.state,
            &mut self.notifications,
            self.api.get_care_plan(id),
        )
        .await?;
        self.care_plans.current = Some(plan);
        Ok(())
    }

    pub async fn create_care_plan(&mut self, form: &CarePlanForm) -> Result<CarePlan, ApiError> {
        let plan = track(
            &mut self.care_plans.submit_state,
            &mut self.notifications,
            self.api.create_care_plan(form),
        )
        .await?;
        self.care_plans.current = Some(plan.clone());
        self.notify_success("Care plan created");
        Ok(plan)
    }

    pub async fn update_care_plan(
        &mut self,
        id: i32,
        form: &CarePlanForm,
    ) -> Result<CarePlan, ApiError> {
        let plan = track(
            &mut self.care_plans.update_state,
            &mut self.notifications,
            self.api.update_care_plan(id, form),
        )
        .await?;
        upsert(&mut self.care_plans, &plan, |p| p.id);
        self.notify_success("Care plan updated");
        Ok(plan)
    }

    pub async fn delete_care_plan(&mut self, id: i32) -> Result<(), ApiError> {
        track(
            &mut self.care_plans.delete_state,
            &mut self.notifications,
            self.api.delete_care_plan(id),
        )
        .await?;
        remove(&mut self.care_plans, id, |p| p.id.get());
        self.notify_success("Care plan deleted");
        Ok(())
    }

    // Appointments

    pub async fn fetch_appointments(&mut self, query: &AppointmentsQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.appointments.state,
            &mut self.notifications,
            self.api.list_appointments(query),
        )
        .await?;
        self.appointments.items = page;
        Ok(())
    }

    pub async fn fetch_appointment(&mut self, id: i32) -> Result<(), ApiError> {
        let appointment = track(
            &mut self.appointments.state,
            &mut self.notifications,
            self.api.get_appointment(id),
        )
        .await?;
        self.appointments.current = Some(appointment);
        Ok(())
    }

    /// Creates (`id` is `None`) or updates an appointment together with the
    /// attachment changes collected in `session`.
    pub async fn save_appointment(
        &mut self,
        id: Option<i32>,
        mut form: AppointmentForm,
        session: AttachmentSession,
    ) -> Result<Appointment, ApiError> {
        let changes = session.into_changes();
        form.removed_document_ids = removed_ids(&changes);
        let appointment = match id {
            None => {
                track(
                    &mut self.appointments.submit_state,
                    &mut self.notifications,
                    self.api.create_appointment(&form, &changes.uploads),
                )
                .await?
            }
            Some(id) => {
                track(
                    &mut self.appointments.update_state,
                    &mut self.notifications,
                    self.api.update_appointment(id, &form, &changes.uploads),
                )
                .await?
            }
        };
        upsert(&mut self.appointments, &appointment, |a| a.id);
        self.notify_success("Appointment saved");
        Ok(appointment)
    }

    pub async fn delete_appointment(&mut self, id: i32) -> Result<(), ApiError> {
        track(
            &mut self.appointments.delete_state,
            &mut self.notifications,
            self.api.delete_appointment(id),
        )
        .await?;
        remove(&mut self.appointments, id, |a| a.id.get());
        self.notify_success("Appointment deleted");
        Ok(())
    }

    // Shift notes and timesheets

    pub async fn fetch_shift_notes(&mut self, query: &ClientScopedQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.shift_notes.state,
            &mut self.notifications,
            self.api.list_shift_notes(query),
        )
        .await?;
        self.shift_notes.items = page;
        Ok(())
    }

    pub async fn fetch_shift_note(&mut self, id: i32) -> Result<(), ApiError> {
        let note = track(
            &mut self.shift_notes.state,
            &mut self.notifications,
            self.api.get_shift_note(id),
        )
        .await?;
        self.shift_notes.current = Some(note);
        Ok(())
    }

    pub async fn save_shift_note(
        &mut self,
        id: Option<i32>,
        mut form: ShiftNoteForm,
        session: AttachmentSession,
    ) -> Result<ShiftNote, ApiError> {
        let changes = session.into_changes();
        form.removed_document_ids = removed_ids(&changes);
        let note = match id {
            None => {
                track(
                    &mut self.shift_notes.submit_state,
                    &mut self.notifications,
                    self.api.create_shift_note(&form, &changes.uploads),
                )
                .await?
            }
            Some(id) => {
                track(
                    &mut self.shift_notes.update_state,
                    &mut self.notifications,
                    self.api.update_shift_note(id, &form, &changes.uploads),
                )
                .await?
            }
        };
        upsert(&mut self.shift_notes, &note, |n| n.id);
        self.notify_success("Shift note saved");
        Ok(note)
    }

    pub async fn delete_shift_note(&mut self, id: i32) -> Result<(), ApiError> {
        track(
            &mut self.shift_notes.delete_state,
            &mut self.notifications,
            self.api.delete_shift_note(id),
        )
        .await?;
        remove(&mut self.shift_notes, id, |n| n.id.get());
        self.notify_success("Shift note deleted");
        Ok(())
    }

    /// Loads the timesheet table. Superseded loads leave the slice untouched.
    ///
    /// The store stays borrowed while the load runs; cancel it or start a
    /// newer one through [`Store::timesheet_feed`].
    pub async fn fetch_timesheets(&mut self, query: &TimesheetFilterQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.timesheets.state,
            &mut self.notifications,
            self.feed.fetch(query),
        )
        .await?;
        self.timesheets.items = page;
        Ok(())
    }

    pub fn cancel_timesheet_fetch(&self) {
        self.feed.cancel();
    }

    /// Handle sharing this store's fetch generation.
    pub fn timesheet_feed(&self) -> TimesheetFeed {
        self.feed.clone()
    }

    pub async fn update_timesheet_status(
        &mut self,
        change: StatusChange,
    ) -> Result<TimesheetRow, ApiError> {
        let row = track(
            &mut self.timesheets.update_state,
            &mut self.notifications,
            self.api
                .update_timesheet_status(change.id.get(), change.status, change.comment),
        )
        .await?;
        upsert(&mut self.timesheets, &row, |r| r.id);
        self.notify_success(format!("Timesheet marked {}", row.payment_state));
        Ok(row)
    }

    pub async fn bulk_update_status(
        &mut self,
        form: &BulkStatusForm,
    ) -> Result<Vec<TimesheetRow>, ApiError> {
        let rows = track(
            &mut self.timesheets.update_state,
            &mut self.notifications,
            self.api.bulk_update_status(form),
        )
        .await?;
        for row in &rows {
            upsert(&mut self.timesheets, row, |r| r.id);
        }
        self.timesheets.current = None;
        self.notify_success(format!("{} timesheets updated", rows.len()));
        Ok(rows)
    }

    pub async fn increment_exports(
        &mut self,
        form: &ExportIncrementForm,
    ) -> Result<IncrementOutcome, ApiError> {
        let outcome = track(
            &mut self.timesheets.update_state,
            &mut self.notifications,
            self.api.increment_exports(form),
        )
        .await?;
        for row in &mut self.timesheets.items.items {
            if form.ids.contains(&row.id.get()) {
                row.export_count += 1;
                row.is_exported = true;
            }
        }
        Ok(outcome)
    }

    /// Runs the action chosen in a confirmed dialog. Does nothing until the
    /// dialog allows execution.
    pub async fn bulk_export(
        &mut self,
        dialog: &BulkExportDialog,
    ) -> Result<Option<BulkExportOutcome>, ApiError> {
        let Some(action) = dialog.action().filter(|_| dialog.can_execute()) else {
            return Ok(None);
        };
        let plan = dialog.plan();
        let form = BulkExportForm {
            ids: plan
                .unexported
                .iter()
                .chain(&plan.exported)
                .map(|id| id.get())
                .collect(),
            action,
            confirmation: dialog.confirmation().to_string(),
        };
        let outcome = track(
            &mut self.timesheets.update_state,
            &mut self.notifications,
            self.api.bulk_export(&form),
        )
        .await?;

        for row in &mut self.timesheets.items.items {
            if outcome.exported.contains(&row.id) {
                row.export_count = 1;
            } else if outcome.reversed.contains(&row.id) {
                row.export_count = 0;
            }
            row.is_exported = row.export_count > 0;
        }
        self.notify_success("Export status updated");
        Ok(Some(outcome))
    }

    // Resources

    pub async fn fetch_resources(&mut self, query: &PageQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.resources.state,
            &mut self.notifications,
            self.api.list_resources(query),
        )
        .await?;
        self.resources.items = page;
        Ok(())
    }

    pub async fn fetch_resource(&mut self, id: i32) -> Result<(), ApiError> {
        let resource = track(
            &mut self.resources.state,
            &mut self.notifications,
            self.api.get_resource(id),
        )
        .await?;
        self.resources.current = Some(resource);
        Ok(())
    }

    pub async fn save_resource(
        &mut self,
        id: Option<i32>,
        mut form: ResourceForm,
        session: AttachmentSession,
    ) -> Result<Resource, ApiError> {
        let changes = session.into_changes();
        form.removed_document_ids = removed_ids(&changes);
        let resource = match id {
            None => {
                track(
                    &mut self.resources.submit_state,
                    &mut self.notifications,
                    self.api.create_resource(&form, &changes.uploads),
                )
                .await?
            }
            Some(id) => {
                track(
                    &mut self.resources.update_state,
                    &mut self.notifications,
                    self.api.update_resource(id, &form, &changes.uploads),
                )
                .await?
            }
        };
        upsert(&mut self.resources, &resource, |r| r.id);
        self.notify_success("Resource saved");
        Ok(resource)
    }

    pub async fn delete_resource(&mut self, id: i32) -> Result<(), ApiError> {
        track(
            &mut self.resources.delete_state,
            &mut self.notifications,
            self.api.delete_resource(id),
        )
        .await?;
        remove(&mut self.resources, id, |r| r.id.get());
        self.notify_success("Resource deleted");
        Ok(())
    }

    // Notes

    pub async fn fetch_notes(&mut self, query: &ClientScopedQuery) -> Result<(), ApiError> {
        let page = track(
            &mut self.notes.state,
            &mut self.notifications,
            self.api.list_notes(query),
        )
        .await?;
        self.notes.items = page;
        Ok(())
    }

    pub async fn fetch_note(&mut self, id: i32) -> Result<(), ApiError> {
        let note = track(
            &mut self.notes.state,
            &mut self.notifications,
            self.api.get_note(id),
        )
        .await?;
        self.notes.current = Some(note);
        Ok(())
    }

    pub async fn save_note(
        &mut self,
        id: Option<i32>,
        mut form: NoteForm,
        session: AttachmentSession,
    ) -> Result<Note, ApiError> {
        let changes = session.into_changes();
        form.removed_document_ids = removed_ids(&changes);
        let note = match id {
            None => {
                track(
                    &mut self.notes.submit_state,
                    &mut self.notifications,
                    self.api.create_note(&form, &changes.uploads),
                )
                .await?
            }
            Some(id) => {
                track(
                    &mut self.notes.update_state,
                    &mut self.notifications,
                    self.api.update_note(id, &form, &changes.uploads),
                )
                .await?
            }
        };
        upsert(&mut self.notes, &note, |n| n.id);
        self.notify_success("Note saved");
        Ok(note)
    }

    pub async fn delete_note(&mut self, id: i32) -> Result<(), ApiError> {
        track(
            &mut self.notes.delete_state,
            &mut self.notifications,
            self.api.delete_note(id),
        )
        .await?;
        remove(&mut self.notes, id, |n| n.id.get());
        self.notify_success("Note deleted");
        Ok(())
    }

    // Reference data

    pub async fn fetch_reference(&mut self, kind: ReferenceKind) -> Result<(), ApiError> {
        let items = track(
            &mut self.reference.state,
            &mut self.notifications,
            self.api.list_reference_items(kind),
        )
        .await?;
        self.reference.replace(kind, items);
        Ok(())
    }

    pub async fn add_reference_item(
        &mut self,
        kind: ReferenceKind,
        form: &AddReferenceForm,
    ) -> Result<ReferenceItem, ApiError> {
        let item = track(
            &mut self.reference.submit_state,
            &mut self.notifications,
            self.api.create_reference_item(kind, form),
        )
        .await?;
        self.reference.push(kind, item.clone());
        self.notify_success(format!("{kind} added"));
        Ok(item)
    }
}
