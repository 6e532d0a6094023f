use chrono::{NaiveDate, NaiveDateTime};

use care_backoffice::domain::appointment::Schedule;
use care_backoffice::domain::client::{
    Client, ClientAddress, ClientClassifiers, NewClient, UpdateClient,
};
use care_backoffice::domain::export::BulkExportAction;
use care_backoffice::domain::reference::{NewReferenceItem, ReferenceKind};
use care_backoffice::domain::shift_note::{PaymentState, RecordedWindow, ShiftNoteContent};
use care_backoffice::domain::types::{
    CaregiverId, ClientName, HubId, ReferenceName, RichText, ShiftNoteId,
};
use care_backoffice::repository::errors::RepositoryError;
use care_backoffice::repository::{
    ClientListQuery, ClientReader, ClientWriter, DieselRepository, ReferenceReader,
    ReferenceWriter, ShiftNoteListQuery, ShiftNoteReader, ShiftNoteWriter,
};

mod common;

fn hub() -> HubId {
    HubId::new(1).unwrap()
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn create_client(repo: &DieselRepository, name: &str) -> Client {
    let new_client = NewClient::new(
        hub(),
        ClientName::new(name).unwrap(),
        None,
        None,
        ClientAddress::new(Some("1 Main St".into()), None),
        ClientClassifiers::default(),
    );
    repo.create_client(&new_client).unwrap()
}

fn shift(client: &Client, day: u32) -> ShiftNoteContent {
    ShiftNoteContent {
        client_id: client.id,
        caregiver_id: CaregiverId::new(7).unwrap(),
        appointment_id: None,
        note: RichText::new("Helped with groceries"),
        schedule: Schedule::new(at(day, 9), at(day, 13)).unwrap(),
        recorded: RecordedWindow::default(),
    }
}

#[test]
fn test_client_repository_crud() {
    let test_db = common::TestDb::new("test_client_repository_crud.db");
    let repo = DieselRepository::new(test_db.pool());

    let alice = create_client(&repo, "Alice");
    let bob = create_client(&repo, "Bob");

    let (total, items) = repo.list_clients(ClientListQuery::new(hub())).unwrap();
    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);

    let (found, items) = repo
        .list_clients(ClientListQuery::new(hub()).search("bob"))
        .unwrap();
    assert_eq!(found, 1);
    assert_eq!(items[0].id, bob.id);

    let updates = UpdateClient::new(
        ClientName::new("Bobby").unwrap(),
        None,
        None,
        bob.address.clone(),
        ClientClassifiers::default(),
    );
    let updated = repo.update_client(bob.id, hub(), &updates).unwrap();
    assert_eq!(updated.name.as_str(), "Bobby");

    let other_hub = HubId::new(2).unwrap();
    assert!(repo.get_client_by_id(alice.id, other_hub).unwrap().is_none());

    repo.delete_client(alice.id, hub()).unwrap();
    assert!(repo.get_client_by_id(alice.id, hub()).unwrap().is_none());
    let (total_after, _) = repo.list_clients(ClientListQuery::new(hub())).unwrap();
    assert_eq!(total_after, 1);
}

#[test]
fn test_deleting_client_removes_its_shift_notes() {
    let test_db = common::TestDb::new("test_deleting_client_removes_its_shift_notes.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = create_client(&repo, "Carol");
    let note = repo.create_shift_note(hub(), &shift(&client, 4)).unwrap();

    repo.delete_client(client.id, hub()).unwrap();

    assert!(repo.get_shift_note_by_id(note.id, hub()).unwrap().is_none());
}

#[test]
fn test_shift_note_defaults_and_work_minutes() {
    let test_db = common::TestDb::new("test_shift_note_defaults_and_work_minutes.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = create_client(&repo, "Dan");

    let mut content = shift(&client, 4);
    content.recorded = RecordedWindow {
        clock_in: Some(at(4, 9)),
        clock_out: Some(at(4, 12)),
    };
    let note = repo.create_shift_note(hub(), &content).unwrap();

    assert_eq!(note.payment_state, PaymentState::Pending);
    assert_eq!(note.export_count, 0);
    assert_eq!(note.total_work_minutes, 180);
}

#[test]
fn test_payment_transitions_are_enforced_atomically() {
    let test_db = common::TestDb::new("test_payment_transitions_are_enforced_atomically.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = create_client(&repo, "Erin");
    let first = repo.create_shift_note(hub(), &shift(&client, 4)).unwrap();
    let second = repo.create_shift_note(hub(), &shift(&client, 5)).unwrap();

    let approved = repo
        .update_payment_states(hub(), &[first.id], PaymentState::Approved, None)
        .unwrap();
    assert_eq!(approved[0].payment_state, PaymentState::Approved);

    // Pending -> Paid is not allowed, so neither row may change.
    let err = repo
        .update_payment_states(
            hub(),
            &[first.id, second.id],
            PaymentState::Paid,
            Some("batch 12".into()),
        )
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
    let first_after = repo.get_shift_note_by_id(first.id, hub()).unwrap().unwrap();
    assert_eq!(first_after.payment_state, PaymentState::Approved);
    assert_eq!(first_after.comment, None);

    let paid = repo
        .update_payment_states(hub(), &[first.id], PaymentState::Paid, Some("batch 12".into()))
        .unwrap();
    assert_eq!(paid[0].payment_state, PaymentState::Paid);
    assert_eq!(paid[0].comment.as_deref(), Some("batch 12"));

    let err = repo
        .update_payment_states(hub(), &[first.id], PaymentState::Rejected, None)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let missing = ShiftNoteId::new(9_999).unwrap();
    let err = repo
        .update_payment_states(hub(), &[second.id, missing], PaymentState::Approved, None)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

#[test]
fn test_outstanding_listing_skips_paid_and_rejected() {
    let test_db = common::TestDb::new("test_outstanding_listing_skips_paid_and_rejected.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = create_client(&repo, "Fay");
    let pending = repo.create_shift_note(hub(), &shift(&client, 4)).unwrap();
    let approved = repo.create_shift_note(hub(), &shift(&client, 5)).unwrap();
    let rejected = repo.create_shift_note(hub(), &shift(&client, 6)).unwrap();
    repo.update_payment_states(hub(), &[approved.id], PaymentState::Approved, None)
        .unwrap();
    repo.update_payment_states(hub(), &[rejected.id], PaymentState::Rejected, None)
        .unwrap();

    let (total, rows) = repo
        .list_shift_notes(ShiftNoteListQuery::new(hub()).outstanding_only(true))
        .unwrap();
    assert_eq!(total, 2);
    let mut ids: Vec<_> = rows.iter().map(|row| row.id).collect();
    ids.sort();
    assert_eq!(ids, vec![pending.id, approved.id]);

    let (total, _) = repo
        .list_shift_notes(
            ShiftNoteListQuery::new(hub()).payment_state(Some(PaymentState::Rejected)),
        )
        .unwrap();
    assert_eq!(total, 1);
}

#[test]
fn test_export_counts_and_bulk_export() {
    let test_db = common::TestDb::new("test_export_counts_and_bulk_export.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = create_client(&repo, "Gus");
    let a = repo.create_shift_note(hub(), &shift(&client, 4)).unwrap();
    let b = repo.create_shift_note(hub(), &shift(&client, 5)).unwrap();
    let c = repo.create_shift_note(hub(), &shift(&client, 6)).unwrap();

    assert_eq!(repo.increment_export_counts(hub(), &[c.id]).unwrap(), 1);
    assert_eq!(repo.increment_export_counts(hub(), &[c.id]).unwrap(), 1);
    let c_now = repo.get_shift_note_by_id(c.id, hub()).unwrap().unwrap();
    assert_eq!(c_now.export_count, 2);
    // Export bookkeeping leaves the payment state alone.
    assert_eq!(c_now.payment_state, PaymentState::Pending);

    let plan = repo
        .apply_bulk_export(hub(), &[a.id, b.id, c.id], BulkExportAction::PerformBoth)
        .unwrap();
    assert_eq!(plan.unexported.len(), 2);
    assert_eq!(plan.exported, vec![c.id]);

    let counts: Vec<i32> = [a.id, b.id, c.id]
        .iter()
        .map(|id| {
            repo.get_shift_note_by_id(*id, hub())
                .unwrap()
                .unwrap()
                .export_count
        })
        .collect();
    assert_eq!(counts, vec![1, 1, 0]);

    // Nothing is left to reverse once every row is unexported again.
    repo.apply_bulk_export(hub(), &[a.id, b.id], BulkExportAction::ReverseToUnexported)
        .unwrap();
    let err = repo
        .apply_bulk_export(hub(), &[a.id, b.id], BulkExportAction::ReverseToUnexported)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[test]
fn test_reference_items_are_unique_per_kind() {
    let test_db = common::TestDb::new("test_reference_items_are_unique_per_kind.db");
    let repo = DieselRepository::new(test_db.pool());
    let item = |kind, name: &str| NewReferenceItem {
        hub_id: hub(),
        kind,
        name: ReferenceName::new(name).unwrap(),
    };

    repo.create_reference_item(&item(ReferenceKind::Language, "Spanish"))
        .unwrap();
    repo.create_reference_item(&item(ReferenceKind::Language, "French"))
        .unwrap();
    // Same name under another kind is fine.
    repo.create_reference_item(&item(ReferenceKind::ClientType, "Spanish"))
        .unwrap();

    let err = repo
        .create_reference_item(&item(ReferenceKind::Language, "Spanish"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let languages = repo
        .list_reference_items(hub(), ReferenceKind::Language)
        .unwrap();
    let names: Vec<&str> = languages.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["French", "Spanish"]);
}
