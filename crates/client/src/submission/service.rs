//! Batch submission service.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tablecart::{cart::LocalCart, storage::CartNamespace};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::{
    api::{CartApi, CartBatch, ServerCartSnapshot},
    submission::{RetryPolicy, SubmissionError},
};

/// A cart shared between the UI surface and the submission service.
pub type SharedCart = Arc<Mutex<LocalCart>>;

/// Wrap a cart for sharing.
#[must_use]
pub fn share(cart: LocalCart) -> SharedCart {
    Arc::new(Mutex::new(cart))
}

/// Lock a shared cart. Cart mutations never leave it half-updated, so a
/// poisoned lock is still usable.
pub fn lock(cart: &SharedCart) -> MutexGuard<'_, LocalCart> {
    cart.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sends the pending operation log to the server as one idempotent batch.
#[derive(Clone)]
pub struct SubmissionService {
    api: Arc<dyn CartApi>,
    retry: RetryPolicy,
    in_flight: Arc<AsyncMutex<()>>,
}

impl Debug for SubmissionService {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SubmissionService")
            .field("retry", &self.retry)
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}

impl SubmissionService {
    /// Create a service sending batches through `api`.
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>, retry: RetryPolicy) -> Self {
        Self {
            api,
            retry,
            in_flight: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Whether a submission is running.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Submit every pending operation.
    ///
    /// On success the submitted operations are dropped from the log and the
    /// local lines are left as they are. Edits made while the request is in
    /// flight stay queued for the next submission. The request runs to
    /// completion even if the returned future is dropped.
    ///
    /// # Errors
    ///
    /// - [`SubmissionError::NoOperations`]: nothing is queued.
    /// - [`SubmissionError::InFlight`]: another submission is running.
    /// - [`SubmissionError::Validation`]: the log is malformed; it is left
    ///   untouched.
    /// - [`SubmissionError::Network`], [`SubmissionError::AuthExpired`],
    ///   [`SubmissionError::Rejected`]: the request failed; the operations are
    ///   queued again.
    pub async fn submit(&self, cart: &SharedCart) -> Result<ServerCartSnapshot, SubmissionError> {
        self.run(cart, false).await
    }

    /// Like [`SubmissionService::submit`], then replace the local lines with
    /// the returned server cart. The replacement is skipped when edits were
    /// made during the request or the cart has switched namespace.
    ///
    /// # Errors
    ///
    /// See [`SubmissionService::submit`].
    pub async fn submit_and_sync(
        &self,
        cart: &SharedCart,
    ) -> Result<ServerCartSnapshot, SubmissionError> {
        self.run(cart, true).await
    }

    /// Replace the local lines with the server cart. Skipped while operations
    /// are pending, since the server has not seen them yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched or the local cart
    /// cannot be persisted.
    pub async fn sync_from_server(
        &self,
        cart: &SharedCart,
    ) -> Result<ServerCartSnapshot, SubmissionError> {
        let namespace = lock(cart).namespace().clone();

        let snapshot = self
            .api
            .fetch_server_cart(&namespace)
            .await
            .map_err(|error| SubmissionError::from_api(1, error))?;

        apply_snapshot(&mut lock(cart), &namespace, &snapshot)?;

        Ok(snapshot)
    }

    async fn run(
        &self,
        cart: &SharedCart,
        sync: bool,
    ) -> Result<ServerCartSnapshot, SubmissionError> {
        let guard = Arc::clone(&self.in_flight)
            .try_lock_owned()
            .map_err(|_busy| SubmissionError::InFlight)?;

        let (namespace, batch) = capture_batch(&mut lock(cart))?;

        info!(%namespace, batch = %batch.id, actions = batch.len(), "submitting cart batch");

        let api = Arc::clone(&self.api);
        let retry = self.retry;
        let cart = Arc::clone(cart);

        let task = tokio::spawn(async move {
            let _guard = guard;
            let outcome = send_with_retry(api.as_ref(), retry, &batch, &namespace).await;

            settle(&mut lock(&cart), &namespace, outcome, sync)
        });

        task.await.map_err(SubmissionError::Task)?
    }
}

fn capture_batch(cart: &mut LocalCart) -> Result<(CartNamespace, CartBatch), SubmissionError> {
    let namespace = cart.namespace().clone();

    if cart.is_submitting() {
        // Only reachable when an earlier submission task never settled.
        warn!(%namespace, "recovering operations from an abandoned submission");
        cart.finish_submission(&namespace, false)?;
    }

    if let Err(error) = cart.validate_pending() {
        error!(%namespace, "refusing to submit invalid operations: {error}");
        return Err(error.into());
    }

    let captured = cart.capture_pending().ok_or(SubmissionError::NoOperations)?;

    Ok((namespace, CartBatch::new(&captured)))
}

async fn send_with_retry(
    api: &dyn CartApi,
    retry: RetryPolicy,
    batch: &CartBatch,
    namespace: &CartNamespace,
) -> Result<ServerCartSnapshot, SubmissionError> {
    let mut attempt = 1;

    loop {
        match api.submit_batch(batch, namespace).await {
            Ok(snapshot) => {
                info!(batch = %batch.id, attempt, "cart batch accepted");
                return Ok(snapshot);
            }
            Err(error) if error.is_transient() && retry.allows_retry_after(attempt) => {
                let delay = retry.delay_after(attempt);

                warn!(
                    batch = %batch.id,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "cart batch failed, retrying: {error}"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                error!(batch = %batch.id, attempt, "cart batch failed: {error}");
                return Err(SubmissionError::from_api(attempt, error));
            }
        }
    }
}

fn settle(
    cart: &mut LocalCart,
    namespace: &CartNamespace,
    outcome: Result<ServerCartSnapshot, SubmissionError>,
    sync: bool,
) -> Result<ServerCartSnapshot, SubmissionError> {
    match outcome {
        Ok(snapshot) => {
            cart.finish_submission(namespace, true)?;

            if sync {
                apply_snapshot(cart, namespace, &snapshot)?;
            }

            Ok(snapshot)
        }
        Err(error) => {
            if let Err(storage) = cart.finish_submission(namespace, false) {
                warn!(%namespace, "failed to persist restored operations: {storage}");
            }

            Err(error)
        }
    }
}

fn apply_snapshot(
    cart: &mut LocalCart,
    namespace: &CartNamespace,
    snapshot: &ServerCartSnapshot,
) -> Result<(), SubmissionError> {
    if cart.namespace() != namespace {
        debug!(%namespace, active = %cart.namespace(), "skipping sync for inactive namespace");
        return Ok(());
    }

    if cart.has_pending_operations() {
        info!(
            %namespace,
            pending = cart.pending_operations().len(),
            "skipping sync, local edits are pending"
        );
        return Ok(());
    }

    cart.replace_lines(snapshot.clone().into_lines())?;

    Ok(())
}
