//! Background dispatch to the external analysis workflow
//!
//! The upload handler enqueues a `DispatchJob` and returns; a dedicated
//! worker task forwards the file bytes to the workflow webhook. Forward
//! failures never reach the uploader - the submission id has already been
//! returned - but every outcome is logged and counted so a submission stuck
//! in Pending is visible to operators.

use scholarcheck_common::{config::AppConfig, errors::AppError, metrics};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Multipart field name the workflow expects the document under
const FILE_FIELD: &str = "data";

/// One unit of dispatch work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchJob {
    pub submission_id: i32,
    pub owner_email: String,
    pub filename: String,
    pub content_type: String,
    pub payload: Vec<u8>,
}

/// Enqueues dispatch jobs without blocking the request path
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<DispatchJob>,
}

impl Dispatcher {
    /// Hand a job to the worker. Never blocks: a full or closed queue drops
    /// the job with an error log and a counter, and the submission stays
    /// Pending.
    pub fn enqueue(&self, job: DispatchJob) {
        let submission_id = job.submission_id;
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                error!(submission_id, "Dispatch queue full, dropping forward");
                metrics::record_dispatch_dropped();
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(submission_id, "Dispatch worker gone, dropping forward");
                metrics::record_dispatch_dropped();
            }
        }
    }
}

/// The worker half of the dispatch channel
pub struct DispatchWorker {
    rx: mpsc::Receiver<DispatchJob>,
    client: reqwest::Client,
    webhook_url: Option<String>,
    service_key: String,
}

/// Create the dispatch channel pair from configuration
pub fn channel(config: &AppConfig) -> Result<(Dispatcher, DispatchWorker), AppError> {
    let (tx, rx) = mpsc::channel(config.workflow.dispatch_queue_capacity);

    let client = reqwest::Client::builder()
        .timeout(config.forward_timeout())
        .build()
        .map_err(|e| AppError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
        })?;

    Ok((
        Dispatcher { tx },
        DispatchWorker {
            rx,
            client,
            webhook_url: config.workflow.webhook_url.clone(),
            service_key: config.auth.service_api_key.clone(),
        },
    ))
}

impl DispatchWorker {
    /// Drain the queue until every sender is gone
    pub async fn run(mut self) {
        info!("Dispatch worker started");

        while let Some(job) = self.rx.recv().await {
            let submission_id = job.submission_id;

            let Some(url) = self.webhook_url.clone() else {
                warn!(
                    submission_id,
                    "No workflow webhook configured, dropping dispatch job"
                );
                metrics::record_dispatch_dropped();
                continue;
            };

            let timer = metrics::Timer::start();
            match self.forward(&url, job).await {
                Ok(status) => {
                    metrics::record_dispatch(timer.elapsed_secs(), true);
                    info!(
                        submission_id,
                        status = status.as_u16(),
                        "Forwarded submission to analysis workflow"
                    );
                }
                Err(e) => {
                    metrics::record_dispatch(timer.elapsed_secs(), false);
                    error!(
                        submission_id,
                        error = %e,
                        "Failed to forward submission to analysis workflow"
                    );
                }
            }
        }

        info!("Dispatch worker stopped");
    }

    async fn forward(
        &self,
        url: &str,
        job: DispatchJob,
    ) -> std::result::Result<reqwest::StatusCode, reqwest::Error> {
        let part = reqwest::multipart::Part::bytes(job.payload)
            .file_name(job.filename)
            .mime_str(&job.content_type)?;
        let form = reqwest::multipart::Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(url)
            .query(&[
                ("id", job.submission_id.to_string()),
                ("email", job.owner_email),
            ])
            .header("X-API-Key", &self.service_key)
            .multipart(form)
            .send()
            .await?;

        let response = response.error_for_status()?;
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_serialization() {
        let job = DispatchJob {
            submission_id: 42,
            owner_email: "alice@example.com".to_string(),
            filename: "essay.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            payload: vec![1, 2, 3],
        };

        let json = serde_json::to_string(&job).unwrap();
        let parsed: DispatchJob = serde_json::from_str(&json).unwrap();

        assert_eq!(job.submission_id, parsed.submission_id);
        assert_eq!(job.payload, parsed.payload);
    }

    #[tokio::test]
    async fn test_enqueue_never_blocks_on_full_queue() {
        let (tx, mut rx) = mpsc::channel(1);
        let dispatcher = Dispatcher { tx };

        let job = DispatchJob {
            submission_id: 1,
            owner_email: "a@b.c".to_string(),
            filename: "f.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            payload: vec![],
        };

        dispatcher.enqueue(job.clone());
        // Queue is full now; the second enqueue must drop, not block.
        dispatcher.enqueue(job);

        assert_eq!(rx.try_recv().unwrap().submission_id, 1);
        assert!(rx.try_recv().is_err());
    }
}
