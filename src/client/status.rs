use serde::Serialize;

/// Lifecycle of one kind of request on a slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

impl RequestStatus {
    pub fn is_loading(self) -> bool {
        self == RequestStatus::Loading
    }
}
