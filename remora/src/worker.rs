use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn, Instrument};

use crate::config::WorkerConfig;
use crate::handlers::JobHandlers;
use crate::job::JobStatus;
use crate::payload::{decode_message, JobMessage, MessageDecodeError};
use crate::queue::{BatchDisposition, Delivery};
use crate::store::{JobStore, StoreError};
use crate::telemetry;

/// Consumes batches of job messages, drives records through the status
/// state machine, and dispatches to the handler registry.
///
/// Invocations are admission-controlled by an explicit semaphore; the
/// default single permit means one batch runs at a time process-wide,
/// shielding the shared downstream pool. Within one invocation the
/// messages are processed concurrently, and one message's failure never
/// blocks the rest: the returned [`BatchDisposition`] names only the
/// failed subset, which the transport redelivers.
pub struct JobWorker<S> {
    store: Arc<S>,
    handlers: JobHandlers,
    invocation_permits: Semaphore,
}

impl<S> std::fmt::Debug for JobWorker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobWorker")
            .field("handlers", &self.handlers)
            .field(
                "available_permits",
                &self.invocation_permits.available_permits(),
            )
            .finish()
    }
}

impl<S> JobWorker<S>
where
    S: JobStore,
{
    pub fn new(store: Arc<S>, handlers: JobHandlers, config: &WorkerConfig) -> Self {
        Self {
            store,
            handlers,
            invocation_permits: Semaphore::new(config.invocation_permits.max(1)),
        }
    }

    /// Process one delivered batch and report the failed subset.
    ///
    /// Waits for an invocation permit first, then for every message to
    /// settle. A message fails the batch only for itself: handler
    /// errors, store errors, and undecodable bodies each mark that one
    /// delivery for redelivery.
    pub async fn process_batch(&self, deliveries: Vec<Delivery>) -> BatchDisposition {
        let permit = match self.invocation_permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                // Semaphore closed only happens if someone closes it
                // explicitly, which this worker never does.
                error!("worker invocation semaphore closed; failing whole batch");
                let mut disposition = BatchDisposition::new();
                for delivery in &deliveries {
                    disposition.record_failure(delivery.message_id);
                }
                return disposition;
            }
        };

        let span = telemetry::batch_span(deliveries.len());

        async {
            telemetry::record_batch_size(deliveries.len());

            let outcomes = futures::future::join_all(
                deliveries
                    .iter()
                    .map(|delivery| self.process_delivery(delivery)),
            )
            .await;

            let mut disposition = BatchDisposition::new();
            for (delivery, outcome) in deliveries.iter().zip(outcomes) {
                match outcome {
                    Ok(()) => disposition.record_success(delivery.message_id),
                    Err(err) => {
                        warn!(
                            message_id = %delivery.message_id,
                            receive_count = delivery.receive_count,
                            "job message failed, leaving for redelivery: {err:#}"
                        );
                        disposition.record_failure(delivery.message_id);
                    }
                }
            }

            drop(permit);
            disposition
        }
        .instrument(span)
        .await
    }

    /// Operator escape hatch: run one explicit message through the
    /// worker as a single-delivery batch, e.g. to recover a stuck
    /// `pending` job whose original message was lost.
    pub async fn reinvoke(&self, message: &JobMessage) -> anyhow::Result<()> {
        let delivery = Delivery::first(message)?;
        let disposition = self.process_batch(vec![delivery]).await;
        if !disposition.is_clean() {
            anyhow::bail!("reinvoked job {} failed", message.key);
        }
        Ok(())
    }

    async fn process_delivery(&self, delivery: &Delivery) -> anyhow::Result<()> {
        let message = match decode_message(&delivery.body) {
            Ok(message) => message,
            Err(MessageDecodeError::Malformed(err)) => {
                // No key recoverable; nothing to mark. Fail the delivery
                // and let transport retry policy deal with it.
                error!(message_id = %delivery.message_id, "undecodable job message: {err}");
                return Err(err.into());
            }
            Err(err @ MessageDecodeError::UnknownJobType { .. }) => {
                // Defect-class error: the key resolved but the payload
                // tag is not a declared job type. Mark the record failed
                // so the defect is visible from the store, then fail.
                if let MessageDecodeError::UnknownJobType { key, .. } = &err {
                    error!(job = %key, "dispatch failure: {err}");
                    if let Err(store_err) = self
                        .store
                        .transition(key, JobStatus::Failed, Some(err.to_string()))
                        .await
                    {
                        error!(job = %key, "could not mark dispatch failure: {store_err}");
                    }
                }
                return Err(err.into());
            }
        };

        let key = message.key.clone();
        let kind = message.payload.kind();
        let span = telemetry::dispatch_span(&key, kind);

        async {
            match self.store.transition(&key, JobStatus::Running, None).await {
                Ok(()) => {}
                Err(StoreError::InvalidTransition {
                    from: JobStatus::Completed,
                    ..
                }) => {
                    // Redelivery of an already-completed job: acknowledge
                    // without re-running the handler.
                    info!(job = %key, "already completed, dropping redelivered message");
                    return Ok(());
                }
                Err(err) => {
                    error!(job = %key, "could not mark running: {err}");
                    return Err(err.into());
                }
            }

            match self.handlers.dispatch(message.payload).await {
                Ok(()) => {
                    if let Err(err) = self
                        .store
                        .transition(&key, JobStatus::Completed, None)
                        .await
                    {
                        // Worst case: side effects happened but the
                        // terminal status did not stick. Surface loudly;
                        // the sweep reports such records as stuck.
                        error!(job = %key, "finalization failed after successful handler: {err}");
                        return Err(err.into());
                    }
                    telemetry::record_job_finished(kind, "completed");
                    info!(job = %key, kind = %kind, "job completed");
                    Ok(())
                }
                Err(handler_err) => {
                    let reason = format!("{handler_err:#}");
                    if let Err(err) = self
                        .store
                        .transition(&key, JobStatus::Failed, Some(reason.clone()))
                        .await
                    {
                        error!(job = %key, "could not record failure: {err}");
                    }
                    telemetry::record_job_finished(kind, "failed");
                    warn!(job = %key, kind = %kind, reason, "job failed");
                    // Propagate so the transport redelivers.
                    Err(handler_err)
                }
            }
        }
        .instrument(span)
        .await
    }
}
