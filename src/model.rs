use serde::{Deserialize, Serialize};

/// `CurrentStatus` value the engine reports once a pod's containers are live
pub const POD_STATUS_RUNNING: i32 = 1;

/// Body of `POST .../ReplicationControllerChange`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceUpdateRequest {
    pub name: String,
    pub image: String,
}

/// One entry of the `GET .../GetPods` response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PodStatus {
    pub name: String,
    pub current_status: i32,
}

impl PodStatus {
    pub fn is_running(&self) -> bool {
        self.current_status == POD_STATUS_RUNNING
    }

    pub fn belongs_to(&self, service_name: &str) -> bool {
        self.name.to_lowercase() == service_name.to_lowercase()
    }
}
