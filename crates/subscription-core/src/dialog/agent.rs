//! Dialog owner agent
//!
//! Every dialog is owned by exactly one agent. The agent holds the
//! [`DialogRecord`] and executes requests from its mailbox one at a time, so a
//! read submitted through [`DialogOwner::inspect`] can never interleave with a
//! mutation of the same dialog.
//!
//! ```text
//!  caller ──Inspect(fn)──▶ mailbox ──▶ agent task ──fn(&record)──▶ oneshot ──▶ caller
//!  state machine ──Update(fn)──┘
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::record::DialogRecord;
use crate::errors::{SubscriptionError, SubscriptionResult};

/// Read-only job executed inside the owner
pub type InspectFn = Box<dyn FnOnce(&DialogRecord) + Send + 'static>;

/// Mutation executed inside the owner
pub type UpdateFn = Box<dyn FnOnce(&mut DialogRecord) + Send + 'static>;

/// Request delivered to a dialog agent's mailbox
pub enum OwnerRequest {
    Inspect(InspectFn),
    Update(UpdateFn),
    Stop,
}

impl std::fmt::Debug for OwnerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerRequest::Inspect(_) => f.write_str("Inspect(..)"),
            OwnerRequest::Update(_) => f.write_str("Update(..)"),
            OwnerRequest::Stop => f.write_str("Stop"),
        }
    }
}

/// Address of a live dialog agent
#[derive(Debug, Clone)]
pub struct DialogOwner {
    tx: mpsc::Sender<OwnerRequest>,
}

impl DialogOwner {
    /// Create an owner handle and the mailbox it feeds.
    ///
    /// For registries that run their own agent loop; [`DialogAgent::spawn`]
    /// covers the common case.
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<OwnerRequest>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self { tx }, rx)
    }

    /// Run `f` against the dialog inside its owner and return the result.
    ///
    /// `NotFound` if the agent is gone, `Timeout` if it did not answer
    /// within `timeout`. A timed-out job may still run later; it is
    /// read-only so nothing needs undoing.
    pub async fn inspect<F, R>(&self, f: F, timeout: Duration) -> SubscriptionResult<R>
    where
        F: FnOnce(&DialogRecord) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: InspectFn = Box::new(move |record: &DialogRecord| {
            let _ = reply_tx.send(f(record));
        });

        let exchange = async {
            self.tx
                .send(OwnerRequest::Inspect(job))
                .await
                .map_err(|_| SubscriptionError::not_found("dialog owner"))?;
            reply_rx
                .await
                .map_err(|_| SubscriptionError::not_found("dialog owner reply"))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(SubscriptionError::timeout("dialog inspect", timeout)),
        }
    }

    /// Queue a mutation of the dialog
    pub async fn update<F>(&self, f: F) -> SubscriptionResult<()>
    where
        F: FnOnce(&mut DialogRecord) + Send + 'static,
    {
        self.tx
            .send(OwnerRequest::Update(Box::new(f)))
            .await
            .map_err(|_| SubscriptionError::not_found("dialog owner"))
    }

    /// Ask the agent to stop; pending requests ahead of this one still run
    pub async fn stop(&self) {
        let _ = self.tx.send(OwnerRequest::Stop).await;
    }

    /// Queue `Stop` without waiting for mailbox capacity.
    ///
    /// Returns `false` if the mailbox was full. The agent then exits once
    /// every handle to it has been dropped.
    pub fn try_stop(&self) -> bool {
        match self.tx.try_send(OwnerRequest::Stop) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => true,
            Err(mpsc::error::TrySendError::Full(_)) => false,
        }
    }

    /// Whether the agent behind this handle has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Task owning one dialog
pub struct DialogAgent;

impl DialogAgent {
    /// Spawn an agent owning `record` with a mailbox of `depth` requests
    pub fn spawn(record: DialogRecord, depth: usize) -> DialogOwner {
        let (owner, rx) = DialogOwner::channel(depth);
        tokio::spawn(Self::run(record, rx));
        owner
    }

    async fn run(mut record: DialogRecord, mut rx: mpsc::Receiver<OwnerRequest>) {
        debug!("Dialog agent started for {} ({})", record.id, record.app_id);

        while let Some(request) = rx.recv().await {
            trace!("Dialog {} processing {:?}", record.id, request);
            match request {
                OwnerRequest::Inspect(job) => job(&record),
                OwnerRequest::Update(job) => job(&mut record),
                OwnerRequest::Stop => break,
            }
        }

        debug!("Dialog agent stopped for {}", record.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AppId, DialogId, EventToken};
    use crate::subscription::{SubscriptionClass, SubscriptionRecord};
    use tokio::time::Instant;

    fn record() -> DialogRecord {
        DialogRecord::new(AppId::new("app1"), DialogId::new("tag1", "call1").unwrap())
    }

    #[tokio::test]
    async fn test_inspect_sees_prior_updates() {
        let owner = DialogAgent::spawn(record(), 8);

        owner
            .update(|dialog| {
                dialog.subscriptions.push(SubscriptionRecord::new(
                    EventToken::new("presence"),
                    SubscriptionClass::Receiver,
                    Instant::now(),
                ));
            })
            .await
            .unwrap();

        let count = owner
            .inspect(|dialog| dialog.subscriptions.len(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_inspect_after_stop_is_not_found() {
        let owner = DialogAgent::spawn(record(), 8);
        owner.stop().await;

        // The agent drops its mailbox once it has processed Stop
        while !owner.is_closed() {
            tokio::task::yield_now().await;
        }

        let result = owner.inspect(|dialog| dialog.id.clone(), Duration::from_secs(1)).await;
        tokio_test::assert_err!(&result);
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_try_stop_on_full_mailbox_returns_immediately() {
        let (owner, mut mailbox) = DialogOwner::channel(1);
        owner.update(|_| {}).await.unwrap();

        assert!(!owner.try_stop());
        assert!(matches!(mailbox.recv().await, Some(OwnerRequest::Update(_))));
        assert!(owner.try_stop());
        assert!(matches!(mailbox.recv().await, Some(OwnerRequest::Stop)));
    }

    #[tokio::test]
    async fn test_inspect_times_out_on_idle_mailbox() {
        let (owner, _mailbox) = DialogOwner::channel(4);

        let result = owner
            .inspect(|dialog| dialog.subscriptions.len(), Duration::from_millis(20))
            .await;
        assert!(result.unwrap_err().is_timeout());
    }
}
