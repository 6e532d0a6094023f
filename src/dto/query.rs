//! Query strings accepted by the list endpoints.

use serde::{Deserialize, Serialize};

/// `?page=&search=` of the client list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientsQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

/// `?page=&client_id=` of lists that can be narrowed to one client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientScopedQuery {
    pub client_id: Option<i32>,
    pub page: Option<usize>,
}

/// `?page=` of hub-wide lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

/// `?client_id=&from=&to=&page=` of the appointment list. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentsQuery {
    pub client_id: Option<i32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<usize>,
}
