use crate::config::{PodMatchPolicy, PollingConfig};
use crate::engine_client::EngineClient;
use crate::error::DeployError;
use crate::model::{PodStatus, ServiceUpdateRequest};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Pushes a new image to an engine service and waits for its pods to come up
pub struct DeploymentTrigger {
    client: EngineClient,
    polling: PollingConfig,
}

impl DeploymentTrigger {
    pub fn new(client: EngineClient, polling: PollingConfig) -> Self {
        DeploymentTrigger { client, polling }
    }

    /// Submits the image update, then blocks until the service is running or the poll budget runs out
    pub async fn deploy(&self, service_name: &str, image: &str) -> Result<()> {
        self.submit_update(service_name, image)
            .await
            .with_context(|| format!("Failed to update service {} to {}", service_name, image))?;
        let attempts = self.validate_deployment(service_name).await?;
        info!(
            "Service {} is running image {} after {} status checks",
            service_name, image, attempts
        );
        Ok(())
    }

    pub async fn submit_update(&self, service_name: &str, image: &str) -> Result<()> {
        let request = ServiceUpdateRequest {
            name: service_name.to_string(),
            image: image.to_string(),
        };
        info!("{}", serde_json::to_string(&request)?);

        self.client.replication_controller_change(&request).await?;

        info!("Updated the service {}", service_name);
        Ok(())
    }

    /// Fetches the tenant's pods once and reports whether `service_name` is running
    pub async fn poll_once(&self, service_name: &str) -> Result<bool> {
        let pods = self.client.get_pods().await?;
        Ok(evaluate_pods(&pods, service_name, self.polling.match_policy))
    }

    /// Returns the number of polls it took to see the service running
    pub async fn validate_deployment(&self, service_name: &str) -> Result<u32> {
        let interval = self.polling.interval();
        for attempt in 1..=self.polling.max_attempts {
            tokio::time::sleep(interval).await;
            debug!(
                "Checking pods of service {} (attempt {}/{})",
                service_name, attempt, self.polling.max_attempts
            );
            if self.poll_once(service_name).await? {
                return Ok(attempt);
            }
        }

        Err(DeployError::DeploymentTimeout {
            service_name: service_name.to_string(),
            attempts: self.polling.max_attempts,
        }
        .into())
    }
}

fn evaluate_pods(pods: &[PodStatus], service_name: &str, policy: PodMatchPolicy) -> bool {
    let mut matching = pods.iter().filter(|pod| pod.belongs_to(service_name));

    let verdict = match policy {
        PodMatchPolicy::FirstMatch => matching.next().map(|pod| (pod.is_running(), pod)),
        PodMatchPolicy::AllMatching => {
            let matching: Vec<&PodStatus> = matching.collect();
            match matching.iter().find(|pod| !pod.is_running()) {
                Some(pod) => Some((false, *pod)),
                None => matching.first().map(|pod| (true, *pod)),
            }
        }
    };

    match verdict {
        Some((true, _)) => {
            info!("All containers in service {} are running", service_name);
            true
        }
        Some((false, pod)) => {
            info!(
                "Service {} at least one container is not running, current status {}",
                service_name, pod.current_status
            );
            false
        }
        None => {
            debug!("No pod found for service {}", service_name);
            false
        }
    }
}
