//! HTTP handlers of the JSON API.

use actix_multipart::form::MultipartFormConfig;
use actix_web::{HttpRequest, web};
use serde::de::DeserializeOwned;

use crate::domain::reference::ReferenceKind;
use crate::services::{ServiceError, ServiceResult};

pub mod appointments;
pub mod care_plans;
pub mod clients;
pub mod notes;
pub mod reference;
pub mod resources;
pub mod shift_notes;

/// Registers every endpoint. Shared by the server and the route tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(multipart_config())
        .service(clients::list_clients)
        .service(clients::create_client)
        .service(clients::show_client)
        .service(clients::update_client)
        .service(clients::delete_client)
        .service(care_plans::list_client_care_plans)
        .service(care_plans::list_care_plans)
        .service(care_plans::create_care_plan)
        .service(care_plans::show_care_plan)
        .service(care_plans::update_care_plan)
        .service(care_plans::delete_care_plan)
        .service(appointments::list_appointments)
        .service(appointments::create_appointment)
        .service(appointments::show_appointment)
        .service(appointments::update_appointment)
        .service(appointments::delete_appointment)
        // Fixed timesheet paths go before `/shiftnotes/{id}`.
        .service(shift_notes::list_timesheets)
        .service(shift_notes::export_timesheets)
        .service(shift_notes::increment_exports)
        .service(shift_notes::bulk_export)
        .service(shift_notes::update_timesheet_status)
        .service(shift_notes::bulk_update_status)
        .service(shift_notes::list_shift_notes)
        .service(shift_notes::create_shift_note)
        .service(shift_notes::show_shift_note)
        .service(shift_notes::update_shift_note)
        .service(shift_notes::delete_shift_note)
        .service(resources::list_resources)
        .service(resources::create_resource)
        .service(resources::show_resource)
        .service(resources::update_resource)
        .service(resources::delete_resource)
        .service(notes::list_notes)
        .service(notes::create_note)
        .service(notes::show_note)
        .service(notes::update_note)
        .service(notes::delete_note);

    for kind in ReferenceKind::ALL {
        cfg.service(
            web::resource(format!("/{}", kind.path()))
                .app_data(web::Data::new(kind))
                .route(web::get().to(reference::list_reference_items))
                .route(web::post().to(reference::create_reference_item)),
        );
    }
}

/// JSON bodies that fail to decode are reported like any other form error.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected JSON body: {err}");
        ServiceError::Form(format!("invalid payload: {err}")).into()
    })
}

/// Upper bound for one multipart request, all files included.
const MULTIPART_TOTAL_LIMIT: usize = 100 * 1024 * 1024;

/// Multipart bodies that fail to decode are reported as form errors.
fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(MULTIPART_TOTAL_LIMIT)
        .error_handler(|err, _req| {
            log::warn!("Rejected multipart body: {err}");
            ServiceError::Form(format!("invalid payload: {err}")).into()
        })
}

/// Decodes the query string, reporting malformed values as form errors.
pub(crate) fn parse_query<T: DeserializeOwned>(req: &HttpRequest) -> ServiceResult<T> {
    serde_html_form::from_str(req.query_string()).map_err(|err| {
        log::warn!("Rejected query string `{}`: {err}", req.query_string());
        ServiceError::Form(format!("invalid query string: {err}"))
    })
}
