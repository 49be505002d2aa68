use reqwest::StatusCode;
use std::fmt;

pub const DEPLOYMENT_TIMEOUT_MESSAGE: &str =
    "Deploy failed, some containers failed to get into running state";

#[derive(Debug)]
pub enum DeployError {
    /// The engine answered with a 4xx/5xx status
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },
    /// No poll saw the service's containers running
    DeploymentTimeout { service_name: String, attempts: u32 },
}

impl std::error::Error for DeployError {}
impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::Http { status, url, body } => {
                write!(f, "url: {}, status: {}, message: {}", url, status, body)
            }
            DeployError::DeploymentTimeout {
                service_name,
                attempts,
            } => write!(
                f,
                "{} (service {}, {} attempts)",
                DEPLOYMENT_TIMEOUT_MESSAGE, service_name, attempts
            ),
        }
    }
}
