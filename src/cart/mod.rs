//! Cart
//!
//! [`LocalCart`] is the on-device view of what a table intends to order. It is
//! the single owner of one storage namespace: every mutation is applied in
//! memory, compacted into the pending operation log and persisted before the
//! call returns.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, info, warn};

use crate::{
    fingerprint::{Fingerprint, fingerprint},
    menu::{MenuItem, SelectedOption},
    pricing,
    storage::{CartNamespace, CartRepository, StorageError, StoredCart},
};

pub mod errors;
pub mod line_item;
pub mod operations;

pub use errors::{CartError, OperationError};
pub use line_item::LineItem;
pub use operations::{OperationLog, PendingOperation};

/// Local, optimistic cart for one table session or the pickup cart.
#[derive(Debug)]
pub struct LocalCart {
    namespace: CartNamespace,
    currency: &'static Currency,
    repository: Arc<dyn CartRepository>,
    lines: FxHashMap<Fingerprint, LineItem>,
    operations: OperationLog,
    in_flight: Option<Vec<PendingOperation>>,
}

impl LocalCart {
    /// Create an empty cart without reading storage.
    #[must_use]
    pub fn new(
        namespace: CartNamespace,
        repository: Arc<dyn CartRepository>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            namespace,
            currency,
            repository,
            lines: FxHashMap::default(),
            operations: OperationLog::new(),
            in_flight: None,
        }
    }

    /// Rehydrate the cart stored under `namespace`.
    ///
    /// Corrupt stored data resets the namespace to an empty cart; any other
    /// read failure also yields an empty cart. Neither is reported to the
    /// caller beyond a warning in the log.
    #[must_use]
    pub fn load(
        namespace: CartNamespace,
        repository: Arc<dyn CartRepository>,
        currency: &'static Currency,
    ) -> Self {
        let mut cart = Self::new(namespace, repository, currency);

        match cart.repository.load(&cart.namespace) {
            Ok(stored) => cart.hydrate(stored),
            Err(StorageError::Corrupted { key, source }) => {
                warn!(namespace = %cart.namespace, %key, "stored cart is corrupted, resetting: {source}");

                if let Err(error) = cart.repository.clear(&cart.namespace) {
                    warn!(namespace = %cart.namespace, "failed to reset corrupted cart: {error}");
                }
            }
            Err(error) => {
                warn!(namespace = %cart.namespace, "failed to load cart, starting empty: {error}");
            }
        }

        cart
    }

    fn hydrate(&mut self, stored: StoredCart) {
        for line in stored.lines {
            if line.quantity == 0 {
                continue;
            }

            match self.lines.get_mut(&line.fingerprint) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
                None => {
                    self.lines.insert(line.fingerprint.clone(), line);
                }
            }
        }

        self.operations = OperationLog::from_operations(stored.operations);

        debug!(
            namespace = %self.namespace,
            lines = self.lines.len(),
            operations = self.operations.len(),
            "loaded cart"
        );
    }

    /// Add `quantity` units of a configured menu item.
    ///
    /// Adding a configuration that is already in the cart increases that
    /// line's quantity rather than creating a second line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`]: `quantity` is zero.
    /// - [`CartError::Storage`]: the change could not be persisted.
    pub fn add_item(
        &mut self,
        menu_item: MenuItem,
        quantity: u32,
        selected_options: Vec<SelectedOption>,
    ) -> Result<Fingerprint, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let fingerprint = fingerprint(&menu_item.id, &selected_options);
        let line_existed = self.lines.contains_key(&fingerprint);

        let line = self
            .lines
            .entry(fingerprint.clone())
            .and_modify(|line| {
                line.quantity = line.quantity.saturating_add(quantity);
                line.touch();
            })
            .or_insert_with(|| LineItem::new(menu_item, quantity, selected_options));

        self.operations.record_add(line, quantity, line_existed);

        debug!(%fingerprint, quantity = line.quantity, merged = line_existed, "added item");

        self.persist()?;

        Ok(fingerprint)
    }

    /// Set a line's quantity. Zero or negative quantities remove the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::LineNotFound`]: no line has this fingerprint.
    /// - [`CartError::Storage`]: the change could not be persisted.
    pub fn update_quantity(
        &mut self,
        fingerprint: &Fingerprint,
        new_quantity: i64,
    ) -> Result<(), CartError> {
        if new_quantity <= 0 {
            return self.remove_item(fingerprint);
        }

        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        let line = self
            .lines
            .get_mut(fingerprint)
            .ok_or_else(|| CartError::LineNotFound(fingerprint.clone()))?;

        line.quantity = quantity;
        line.touch();

        self.operations.record_update(fingerprint, quantity);

        debug!(%fingerprint, quantity, "updated quantity");

        self.persist()
    }

    /// Remove a line.
    ///
    /// Removing a fingerprint the cart knows nothing about is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the change could not be persisted.
    pub fn remove_item(&mut self, fingerprint: &Fingerprint) -> Result<(), CartError> {
        let removed = self.lines.remove(fingerprint).is_some();

        if !removed && !self.operations.contains(fingerprint) {
            debug!(%fingerprint, "nothing to remove");
            return Ok(());
        }

        self.operations.record_remove(fingerprint);

        debug!(%fingerprint, "removed item");

        self.persist()
    }

    /// Empty the cart locally and erase its stored entries. Nothing is sent to
    /// the server; use this after checkout.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the stored entries could not be erased.
    pub fn clear_cart(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.operations.clear();
        self.in_flight = None;

        info!(namespace = %self.namespace, "cleared cart");

        self.repository.clear(&self.namespace)?;

        Ok(())
    }

    /// Replace every line with the authoritative server cart.
    ///
    /// Fingerprints are derived locally so they match future edits; lines that
    /// collapse to the same fingerprint are merged. Pending operations are
    /// left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the new state could not be persisted.
    pub fn replace_lines(
        &mut self,
        lines: impl IntoIterator<Item = LineItem>,
    ) -> Result<(), CartError> {
        let mut replaced: FxHashMap<Fingerprint, LineItem> = FxHashMap::default();

        for mut line in lines {
            if line.quantity == 0 {
                continue;
            }

            line.fingerprint = fingerprint(&line.menu_item.id, &line.selected_options);

            if let Some(previous) = self.lines.get(&line.fingerprint) {
                line.created_at = previous.created_at;
            }

            match replaced.get_mut(&line.fingerprint) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
                None => {
                    replaced.insert(line.fingerprint.clone(), line);
                }
            }
        }

        self.lines = replaced;

        info!(namespace = %self.namespace, lines = self.lines.len(), "replaced lines from server");

        self.persist()
    }

    /// Take the pending log for submission. Edits made afterwards accumulate
    /// in a fresh log until [`LocalCart::finish_submission`] is called.
    ///
    /// Returns `None` when nothing is pending or a capture is already in
    /// flight.
    pub fn capture_pending(&mut self) -> Option<Vec<PendingOperation>> {
        if self.in_flight.is_some() || self.operations.is_empty() {
            return None;
        }

        let captured = self.operations.take();
        self.in_flight = Some(captured.clone());

        debug!(namespace = %self.namespace, operations = captured.len(), "captured pending operations");

        Some(captured)
    }

    /// Settle a capture taken with [`LocalCart::capture_pending`].
    ///
    /// On success the captured operations are dropped. On failure they are
    /// merged back under any edits made in the meantime so a retry sends them
    /// again. Captures taken for another namespace, or discarded by
    /// [`LocalCart::clear_cart`], are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the settled log could not be persisted.
    pub fn finish_submission(
        &mut self,
        namespace: &CartNamespace,
        succeeded: bool,
    ) -> Result<(), CartError> {
        if namespace != &self.namespace {
            debug!(captured = %namespace, active = %self.namespace, "ignoring submission for inactive namespace");
            return Ok(());
        }

        let Some(captured) = self.in_flight.take() else {
            return Ok(());
        };

        if !succeeded {
            self.operations = OperationLog::merge_captured(&captured, &self.operations);
        }

        debug!(
            namespace = %self.namespace,
            succeeded,
            pending = self.operations.len(),
            "settled submission"
        );

        self.persist()
    }

    /// Sum of every line total.
    pub fn total_amount(&self) -> Money<'static, Currency> {
        pricing::cart_total(self.lines.values(), self.currency)
    }

    /// The line with the given fingerprint.
    pub fn get_item_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<&LineItem> {
        self.lines.get(fingerprint)
    }

    /// Lines ordered by when they were first added.
    pub fn lines(&self) -> Vec<&LineItem> {
        let mut lines: Vec<&LineItem> = self.lines.values().collect();
        lines.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        lines
    }

    /// Operations not yet captured for submission.
    pub fn pending_operations(&self) -> &[PendingOperation] {
        self.operations.as_slice()
    }

    /// Operations captured by a submission that has not settled yet.
    pub fn in_flight_operations(&self) -> Option<&[PendingOperation]> {
        self.in_flight.as_deref()
    }

    /// Whether a submission is currently in flight.
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether anything still has to reach the server.
    pub fn has_pending_operations(&self) -> bool {
        !self.operations.is_empty() || self.in_flight.is_some()
    }

    /// Check the pending log before it is sent.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Invalid`] for the first malformed operation.
    pub fn validate_pending(&self) -> Result<(), OperationError> {
        self.operations.validate()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Namespace this cart owns.
    pub fn namespace(&self) -> &CartNamespace {
        &self.namespace
    }

    /// Currency totals are expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The log as it must survive a restart: captured operations merged with
    /// newer edits, so a crash mid-submission loses nothing.
    fn durable_operations(&self) -> Vec<PendingOperation> {
        match &self.in_flight {
            Some(captured) => OperationLog::merge_captured(captured, &self.operations)
                .as_slice()
                .to_vec(),
            None => self.operations.as_slice().to_vec(),
        }
    }

    fn persist(&self) -> Result<(), CartError> {
        let stored = StoredCart {
            lines: self.lines().into_iter().cloned().collect(),
            operations: self.durable_operations(),
        };

        self.repository.save(&self.namespace, &stored)?;

        Ok(())
    }
}
