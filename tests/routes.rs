use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::NaiveDate;
use serde_json::{Value, json};

use care_backoffice::auth::AuthenticatedUser;
use care_backoffice::domain::appointment::Schedule;
use care_backoffice::domain::client::{ClientAddress, ClientClassifiers, NewClient};
use care_backoffice::domain::shift_note::{RecordedWindow, ShiftNote, ShiftNoteContent};
use care_backoffice::domain::types::{CaregiverId, ClientName, HubId, RichText};
use care_backoffice::models::config::ServerConfig;
use care_backoffice::repository::{ClientWriter, DieselRepository, ShiftNoteWriter};
use care_backoffice::routes;
use care_backoffice::storage::DocumentStore;

mod common;

const SECRET: &str = "route-test-secret";

fn config(upload_dir: &str) -> ServerConfig {
    ServerConfig {
        domain: "localhost".into(),
        address: "127.0.0.1".into(),
        port: 8080,
        database_url: String::new(),
        upload_dir: upload_dir.into(),
        documents_url: "/documents".into(),
        secret: SECRET.into(),
        cors_origin: None,
    }
}

fn bearer(roles: &[&str]) -> (header::HeaderName, String) {
    let user = AuthenticatedUser {
        sub: "7".into(),
        email: "coordinator@example.com".into(),
        hub_id: 1,
        name: "Coordinator".into(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        exp: 4_102_444_800,
    };
    let token = user.to_token(SECRET).unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn seed_shift_note(repo: &DieselRepository) -> ShiftNote {
    let hub = HubId::new(1).unwrap();
    let client = repo
        .create_client(&NewClient::new(
            hub,
            ClientName::new("Alice").unwrap(),
            None,
            None,
            ClientAddress::default(),
            ClientClassifiers::default(),
        ))
        .unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let content = ShiftNoteContent {
        client_id: client.id,
        caregiver_id: CaregiverId::new(7).unwrap(),
        appointment_id: None,
        note: RichText::new("Morning visit"),
        schedule: Schedule::new(
            day.and_hms_opt(8, 0, 0).unwrap(),
            day.and_hms_opt(12, 0, 0).unwrap(),
        )
        .unwrap(),
        recorded: RecordedWindow::default(),
    };
    repo.create_shift_note(hub, &content).unwrap()
}

macro_rules! app {
    ($repo:expr, $uploads:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($repo.clone()))
                .app_data(web::Data::new(DocumentStore::new(
                    $uploads.path().to_path_buf(),
                    "/documents",
                )))
                .app_data(web::Data::new(config(
                    $uploads.path().to_str().unwrap(),
                )))
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn requests_without_token_are_unauthorized() {
    let test_db = common::TestDb::new("requests_without_token_are_unauthorized.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    let app = app!(repo, uploads);

    let req = test::TestRequest::get().uri("/clients").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/clients")
        .insert_header(bearer(&["staff"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn client_create_then_list() {
    let test_db = common::TestDb::new("client_create_then_list.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    let app = app!(repo, uploads);

    let req = test::TestRequest::post()
        .uri("/clients")
        .insert_header(bearer(&["care"]))
        .set_json(json!({ "name": "Alice", "email": "alice@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["name"], "Alice");

    let req = test::TestRequest::get()
        .uri("/clients?page=1")
        .insert_header(bearer(&["care"]))
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["pages"], 1);
    assert_eq!(page["items"][0]["name"], "Alice");

    let req = test::TestRequest::post()
        .uri("/clients")
        .insert_header(bearer(&["care"]))
        .set_json(json!({ "name": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn timesheet_status_follows_the_workflow() {
    let test_db = common::TestDb::new("timesheet_status_follows_the_workflow.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    let note = seed_shift_note(&repo);
    let app = app!(repo, uploads);

    let req = test::TestRequest::put()
        .uri(&format!("/shiftnotes/time-sheets/status/{}?status=Paid", note.id))
        .insert_header(bearer(&["care"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/shiftnotes/time-sheets/status/{}?status=Approved", note.id))
        .insert_header(bearer(&["care"]))
        .to_request();
    let row: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(row["payment_state"], "Approved");
    assert_eq!(row["allowed_transitions"], json!(["Rejected", "Paid"]));

    let req = test::TestRequest::put()
        .uri(&format!("/shiftnotes/time-sheets/status/{}?status=Bogus", note.id))
        .insert_header(bearer(&["care"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn csv_export_is_an_attachment() {
    let test_db = common::TestDb::new("csv_export_is_an_attachment.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    seed_shift_note(&repo);
    let app = app!(repo, uploads);

    let req = test::TestRequest::get()
        .uri("/shiftnotes/export/time-sheets?format=csv")
        .insert_header(bearer(&["care"]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/csv"));
    let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
    assert!(disposition.to_str().unwrap().contains("time-sheets.csv"));

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.starts_with("id,client_id,caregiver_id,shift_start"));
}

#[actix_web::test]
async fn bulk_export_requires_typed_confirmation() {
    let test_db = common::TestDb::new("bulk_export_requires_typed_confirmation.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    let note = seed_shift_note(&repo);
    let app = app!(repo, uploads);

    let req = test::TestRequest::post()
        .uri("/shiftnotes/export/bulk-update")
        .insert_header(bearer(&["care"]))
        .set_json(json!({
            "ids": [note.id],
            "action": "ExportUnexported",
            "confirmation": "Confirm",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/shiftnotes/export/bulk-update")
        .insert_header(bearer(&["care"]))
        .set_json(json!({
            "ids": [note.id],
            "action": "ExportUnexported",
            "confirmation": " confirm ",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn reference_items_need_admin_to_create() {
    let test_db = common::TestDb::new("reference_items_need_admin_to_create.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    let app = app!(repo, uploads);

    let req = test::TestRequest::post()
        .uri("/languages")
        .insert_header(bearer(&["care"]))
        .set_json(json!({ "name": "Spanish" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/languages")
        .insert_header(bearer(&["care", "care_admin"]))
        .set_json(json!({ "name": "Spanish" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/languages")
        .insert_header(bearer(&["care", "care_admin"]))
        .set_json(json!({ "name": "Spanish" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri("/languages")
        .insert_header(bearer(&["care"]))
        .to_request();
    let items: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["kind"], "Language");
}

#[actix_web::test]
async fn undecodable_multipart_is_a_form_error() {
    let test_db = common::TestDb::new("undecodable_multipart_is_a_form_error.db");
    let uploads = tempfile::tempdir().unwrap();
    let repo = DieselRepository::new(test_db.pool());
    let app = app!(repo, uploads);

    let body = concat!(
        "--boundary\r\n",
        "Content-Disposition: form-data; name=\"comment\"\r\n\r\n",
        "no note field\r\n",
        "--boundary--\r\n",
    );
    let req = test::TestRequest::post()
        .uri("/notes")
        .insert_header(bearer(&["care"]))
        .insert_header((
            header::CONTENT_TYPE,
            "multipart/form-data; boundary=boundary",
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = test::read_body_json(resp).await;
    assert!(error["error"].as_str().unwrap().contains("invalid payload"));
}
