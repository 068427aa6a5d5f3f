//! Cart Context
//!
//! The surface a UI talks to: local edits are applied immediately and the
//! network side is only touched on explicit submission or sync.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tablecart::{
    cart::{CartError, LineItem, LocalCart, PendingOperation},
    fingerprint::Fingerprint,
    menu::{MenuItem, SelectedOption},
    storage::{CartNamespace, CartRepository},
};
use tracing::{debug, info};

use crate::{
    api::{CartApi, ServerCartSnapshot},
    submission::{RetryPolicy, SharedCart, SubmissionError, SubmissionService, lock, share},
};

/// The active cart plus carts switched away from mid-submission.
///
/// A parked cart still holds the operations its submission captured and stays
/// the only owner of its namespace until that submission settles.
#[derive(Debug)]
struct Carts {
    active: SharedCart,
    parked: FxHashMap<CartNamespace, SharedCart>,
}

/// Cart state plus the services that reconcile it with the server.
#[derive(Debug, Clone)]
pub struct CartContext {
    carts: Arc<Mutex<Carts>>,
    repository: Arc<dyn CartRepository>,
    currency: &'static Currency,
    submission: SubmissionService,
}

impl CartContext {
    /// Load the cart for `namespace` from `repository`.
    #[must_use]
    pub fn new(
        namespace: CartNamespace,
        repository: Arc<dyn CartRepository>,
        currency: &'static Currency,
        api: Arc<dyn CartApi>,
        retry: RetryPolicy,
    ) -> Self {
        let cart = LocalCart::load(namespace, Arc::clone(&repository), currency);

        Self {
            carts: Arc::new(Mutex::new(Carts {
                active: share(cart),
                parked: FxHashMap::default(),
            })),
            repository,
            currency,
            submission: SubmissionService::new(api, retry),
        }
    }

    /// Shared handle to the active cart.
    pub fn cart(&self) -> SharedCart {
        Arc::clone(&self.carts().active)
    }

    /// Namespace of the active cart.
    pub fn namespace(&self) -> CartNamespace {
        lock(&self.cart()).namespace().clone()
    }

    /// Switch to another table session, or to the pickup cart with `None`.
    ///
    /// The new namespace's stored cart replaces the current one; nothing is
    /// carried over. A cart left while its submission is in flight is kept
    /// aside so the submission settles against it, and switching back to it
    /// before then resumes that cart instead of reloading storage.
    pub fn switch_table(&self, session_id: Option<String>) {
        let namespace = CartNamespace::from_session(session_id);
        let mut carts = self.carts();

        let current = lock(&carts.active).namespace().clone();

        if current == namespace {
            return;
        }

        info!(from = %current, to = %namespace, "switching cart namespace");

        carts.parked.retain(|_, cart| lock(cart).is_submitting());

        let next = match carts.parked.remove(&namespace) {
            Some(parked) => {
                debug!(%namespace, "resuming cart with a submission in flight");
                parked
            }
            None => share(LocalCart::load(
                namespace,
                Arc::clone(&self.repository),
                self.currency,
            )),
        };

        let previous = std::mem::replace(&mut carts.active, next);

        if lock(&previous).is_submitting() {
            debug!(namespace = %current, "parking cart until its submission settles");
            carts.parked.insert(current, previous);
        }
    }

    /// See [`LocalCart::add_item`].
    ///
    /// # Errors
    ///
    /// Returns an error for a zero quantity or when persisting fails.
    pub fn add_item(
        &self,
        menu_item: MenuItem,
        quantity: u32,
        selected_options: Vec<SelectedOption>,
    ) -> Result<Fingerprint, CartError> {
        lock(&self.cart()).add_item(menu_item, quantity, selected_options)
    }

    /// See [`LocalCart::remove_item`].
    ///
    /// # Errors
    ///
    /// Returns an error when persisting fails.
    pub fn remove_item(&self, fingerprint: &Fingerprint) -> Result<(), CartError> {
        lock(&self.cart()).remove_item(fingerprint)
    }

    /// See [`LocalCart::update_quantity`].
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown line or when persisting fails.
    pub fn update_quantity(
        &self,
        fingerprint: &Fingerprint,
        quantity: i64,
    ) -> Result<(), CartError> {
        lock(&self.cart()).update_quantity(fingerprint, quantity)
    }

    /// See [`LocalCart::clear_cart`].
    ///
    /// # Errors
    ///
    /// Returns an error when the stored cart cannot be erased.
    pub fn clear_cart(&self) -> Result<(), CartError> {
        lock(&self.cart()).clear_cart()
    }

    /// Cart total.
    pub fn total_amount(&self) -> Money<'static, Currency> {
        lock(&self.cart()).total_amount()
    }

    /// Copy of the line with the given fingerprint.
    pub fn get_item_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<LineItem> {
        lock(&self.cart()).get_item_by_fingerprint(fingerprint).cloned()
    }

    /// Copy of every line, oldest first.
    pub fn lines(&self) -> Vec<LineItem> {
        lock(&self.cart()).lines().into_iter().cloned().collect()
    }

    /// Copy of the operations not yet submitted.
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        lock(&self.cart()).pending_operations().to_vec()
    }

    /// Currency totals are expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Whether anything still has to reach the server.
    pub fn has_pending_operations(&self) -> bool {
        lock(&self.cart()).has_pending_operations()
    }

    /// See [`SubmissionService::submit`].
    ///
    /// # Errors
    ///
    /// See [`SubmissionService::submit`].
    pub async fn submit_pending_operations(&self) -> Result<ServerCartSnapshot, SubmissionError> {
        self.submission.submit(&self.cart()).await
    }

    /// See [`SubmissionService::submit_and_sync`].
    ///
    /// # Errors
    ///
    /// See [`SubmissionService::submit`].
    pub async fn submit_and_sync(&self) -> Result<ServerCartSnapshot, SubmissionError> {
        self.submission.submit_and_sync(&self.cart()).await
    }

    /// See [`SubmissionService::sync_from_server`].
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be fetched or stored.
    pub async fn sync_from_server(&self) -> Result<ServerCartSnapshot, SubmissionError> {
        self.submission.sync_from_server(&self.cart()).await
    }

    fn carts(&self) -> MutexGuard<'_, Carts> {
        self.carts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use mockall::Sequence;
    use rusty_money::iso::GBP;
    use tablecart::storage::MemoryStore;
    use testresult::TestResult;

    use crate::api::{ApiError, MockCartApi};

    use super::*;

    fn context(store: Arc<MemoryStore>, api: MockCartApi) -> CartContext {
        CartContext::new(
            CartNamespace::table("1"),
            store,
            GBP,
            Arc::new(api),
            RetryPolicy::none(),
        )
    }

    fn retrying_context(store: Arc<MemoryStore>, api: MockCartApi) -> CartContext {
        CartContext::new(
            CartNamespace::table("1"),
            store,
            GBP,
            Arc::new(api),
            RetryPolicy::default(),
        )
    }

    fn unavailable_then_accepted() -> MockCartApi {
        let mut api = MockCartApi::new();
        let mut seq = Sequence::new();

        api.expect_submit_batch()
            .once()
            .in_sequence(&mut seq)
            .withf(|_, ns| *ns == CartNamespace::table("1"))
            .returning(|_, _| {
                Err(ApiError::Status {
                    status: 503,
                    body: String::new(),
                })
            });
        api.expect_submit_batch()
            .once()
            .in_sequence(&mut seq)
            .withf(|_, ns| *ns == CartNamespace::table("1"))
            .returning(|_, _| Ok(ServerCartSnapshot::default()));

        api
    }

    #[test]
    fn edits_are_visible_through_context() -> TestResult {
        let ctx = context(Arc::new(MemoryStore::new()), MockCartApi::new());

        let fp = ctx.add_item(MenuItem::new("soup", "Soup", 4_00), 2, Vec::new())?;
        ctx.update_quantity(&fp, 3)?;

        assert_eq!(ctx.get_item_by_fingerprint(&fp).map(|l| l.quantity), Some(3));
        assert_eq!(ctx.total_amount(), Money::from_minor(12_00, GBP));
        assert!(ctx.has_pending_operations());

        ctx.remove_item(&fp)?;

        assert!(ctx.lines().is_empty());
        assert!(!ctx.has_pending_operations());

        Ok(())
    }

    #[test]
    fn switching_tables_reloads_without_merging() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let ctx = context(Arc::clone(&store), MockCartApi::new());
        ctx.add_item(MenuItem::new("soup", "Soup", 4_00), 1, Vec::new())?;

        ctx.switch_table(Some("2".to_string()));

        assert_eq!(ctx.namespace(), CartNamespace::table("2"));
        assert!(ctx.lines().is_empty());

        ctx.switch_table(Some("1".to_string()));

        assert_eq!(ctx.lines().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn submission_after_switch_targets_new_table() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let mut api = MockCartApi::new();

        api.expect_submit_batch()
            .once()
            .withf(|_, ns| *ns == CartNamespace::Pickup)
            .return_once(|_, _| Ok(ServerCartSnapshot::default()));

        let ctx = context(Arc::clone(&store), api);
        ctx.add_item(MenuItem::new("soup", "Soup", 4_00), 1, Vec::new())?;
        ctx.switch_table(None);
        ctx.add_item(MenuItem::new("bread", "Bread", 2_00), 1, Vec::new())?;

        ctx.submit_pending_operations().await?;

        assert!(!ctx.has_pending_operations());

        ctx.switch_table(Some("1".to_string()));
        assert!(ctx.has_pending_operations(), "table 1 edits are still queued");

        Ok(())
    }

    #[tokio::test]
    async fn clear_cart_discards_everything() -> TestResult {
        let ctx = context(Arc::new(MemoryStore::new()), MockCartApi::new());
        ctx.add_item(MenuItem::new("soup", "Soup", 4_00), 1, Vec::new())?;

        ctx.clear_cart()?;

        assert!(matches!(
            ctx.submit_pending_operations().await,
            Err(SubmissionError::NoOperations)
        ));

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_batch_settles_after_switching_away_and_back() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let ctx = retrying_context(Arc::clone(&store), unavailable_then_accepted());
        ctx.add_item(MenuItem::new("soup", "Soup", 4_00), 1, Vec::new())?;

        let submission = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.submit_pending_operations().await }
        });

        tokio::task::yield_now().await;

        ctx.switch_table(Some("2".to_string()));
        assert!(ctx.lines().is_empty());

        submission.await??;

        ctx.switch_table(Some("1".to_string()));

        assert_eq!(ctx.lines().len(), 1);
        assert!(
            !ctx.has_pending_operations(),
            "accepted operations must not be queued again"
        );
        assert!(store.load(&CartNamespace::table("1"))?.operations.is_empty());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn switching_back_during_flight_resumes_the_submitting_cart() -> TestResult {
        let store = Arc::new(MemoryStore::new());
        let ctx = retrying_context(Arc::clone(&store), unavailable_then_accepted());
        ctx.add_item(MenuItem::new("soup", "Soup", 4_00), 1, Vec::new())?;

        let submission = tokio::spawn({
            let ctx = ctx.clone();
            async move { ctx.submit_pending_operations().await }
        });

        tokio::task::yield_now().await;

        ctx.switch_table(None);
        ctx.switch_table(Some("1".to_string()));
        let bread = ctx.add_item(MenuItem::new("bread", "Bread", 2_00), 1, Vec::new())?;

        submission.await??;

        let pending = ctx.pending_operations();
        assert_eq!(ctx.lines().len(), 2);
        assert!(
            matches!(
                pending.as_slice(),
                [PendingOperation::AddItem { fingerprint, .. }] if *fingerprint == bread
            ),
            "only the edit made during the flight stays queued: {pending:?}"
        );

        Ok(())
    }
}
