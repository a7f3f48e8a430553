//! Cart state manager.

use std::sync::{Arc, Mutex};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::entities::NewCartItem;
use crate::domain::persist_worker::run_persist_worker;
use crate::domain::repositories::CartRepository;
use crate::domain::{CartCollection, CartSnapshot, PersistOutcome, PersistSettings, PersistStatus};
use crate::error::CartError;

/// Result of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The cart changed and now sits at `revision`. A write was scheduled.
    Applied { revision: u64 },
    /// The mutation had nothing to do (unknown id, or a product with a
    /// non-finite price). No write was scheduled.
    Unchanged,
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the canonical in-memory cart and keeps it synchronized with storage.
///
/// Mutations run to completion synchronously. Each applied mutation:
///
/// 1. swaps in a new [`CartSnapshot`] and notifies observers,
/// 2. hands that same snapshot to the persistence worker.
///
/// The in-memory cart is always the source of truth for the session; a failed
/// write never rolls a mutation back. Use [`Self::flush`] to wait for the
/// latest mutation to reach storage and learn whether it did.
pub struct CartStore {
    state: watch::Sender<CartSnapshot>,
    pending: watch::Sender<CartSnapshot>,
    persisted: watch::Receiver<PersistStatus>,
    restore_error: Option<CartError>,
    worker: Mutex<Option<WorkerHandle>>,
}

impl CartStore {
    /// Restores the cart from `repository` and starts the persistence worker.
    ///
    /// An absent snapshot starts an empty cart. An unreadable one (corrupt
    /// bytes or a failing backend) also starts an empty cart; the error is
    /// logged and kept in [`Self::restore_error`].
    ///
    /// Must be called within a Tokio runtime.
    pub async fn initialize<R>(repository: Arc<R>, settings: PersistSettings) -> Self
    where
        R: CartRepository + ?Sized + 'static,
    {
        let (cart, restore_error) = match repository.load().await {
            Ok(Some(cart)) => {
                info!(items = cart.len(), "Restored persisted cart");
                (cart, None)
            }
            Ok(None) => {
                info!("No persisted cart found, starting empty");
                (CartCollection::new(), None)
            }
            Err(e @ CartError::Deserialization(_)) => {
                warn!(error = %e, "Persisted cart is unreadable, starting empty");
                (CartCollection::new(), Some(e))
            }
            Err(e) => {
                error!(error = %e, "Failed to load persisted cart, starting empty");
                (CartCollection::new(), Some(e))
            }
        };

        let initial = CartSnapshot {
            revision: 0,
            cart: Arc::new(cart),
        };
        let (state, _) = watch::channel(initial.clone());
        let (pending, pending_rx) = watch::channel(initial);
        let (status_tx, persisted) = watch::channel(PersistStatus::restored(0));
        let (shutdown, shutdown_rx) = oneshot::channel();

        let join = tokio::spawn(run_persist_worker(
            pending_rx,
            repository,
            status_tx,
            settings,
            shutdown_rx,
        ));
        debug!("Cart persistence worker started");

        Self {
            state,
            pending,
            persisted,
            restore_error,
            worker: Mutex::new(Some(WorkerHandle { shutdown, join })),
        }
    }

    /// Current immutable cart.
    pub fn products(&self) -> Arc<CartCollection> {
        self.state.borrow().cart.clone()
    }

    /// Current cart together with its revision.
    pub fn snapshot(&self) -> CartSnapshot {
        self.state.borrow().clone()
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().revision
    }

    /// Subscribes to cart changes. The receiver yields a snapshot per applied mutation.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.state.subscribe()
    }

    /// Subscribes to persistence outcomes.
    pub fn persist_status(&self) -> watch::Receiver<PersistStatus> {
        self.persisted.clone()
    }

    /// Why the persisted cart could not be restored at startup, if it could not.
    pub fn restore_error(&self) -> Option<&CartError> {
        self.restore_error.as_ref()
    }

    /// Adds a product to the cart.
    ///
    /// A new id is appended with quantity 1. An existing id takes the new
    /// title, image and price, and its quantity goes up by one. A product
    /// whose price is NaN or infinite is rejected as [`Mutation::Unchanged`].
    pub fn add_to_cart(&self, item: NewCartItem) -> Mutation {
        let id = item.id.clone();
        let mutation = self.apply(|cart| cart.add(item));
        debug!(%id, ?mutation, "add_to_cart");
        mutation
    }

    /// Raises the quantity of `id` by one. Unknown ids are a no-op.
    pub fn increment(&self, id: &str) -> Mutation {
        let mutation = self.apply(|cart| cart.increment(id));
        debug!(%id, ?mutation, "increment");
        mutation
    }

    /// Lowers the quantity of `id` by one, removing it at one. Unknown ids are a no-op.
    pub fn decrement(&self, id: &str) -> Mutation {
        let mutation = self.apply(|cart| cart.decrement(id));
        debug!(%id, ?mutation, "decrement");
        mutation
    }

    /// Waits until the latest applied mutation has been written.
    ///
    /// # Errors
    ///
    /// Returns the write error if the most recent completed write for that
    /// revision failed. Returns [`CartError::ContextUnavailable`] if the
    /// persistence worker stopped before reaching it.
    pub async fn flush(&self) -> Result<(), CartError> {
        let target = self.revision();
        let mut persisted = self.persisted.clone();

        let status = persisted
            .wait_for(|status| status.revision >= target)
            .await
            .map_err(|_| CartError::ContextUnavailable)?;

        match &status.outcome {
            PersistOutcome::Failed(e) => Err(e.clone()),
            PersistOutcome::Saved | PersistOutcome::Restored => Ok(()),
        }
    }

    /// Stops the persistence worker after it writes any pending snapshot.
    ///
    /// Mutations applied after shutdown stay in memory only. Calling this
    /// more than once is harmless.
    pub async fn shutdown(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let Some(WorkerHandle { shutdown, join }) = handle else {
            return;
        };

        let _ = shutdown.send(());
        if let Err(e) = join.await {
            error!(error = %e, "Cart persistence worker panicked");
        }
    }

    /// Applies `op` to a copy of the current cart and publishes the result.
    ///
    /// The swap happens under the observer channel's lock, so concurrent
    /// mutations are serialized and each sees the previous one's result.
    fn apply(&self, op: impl FnOnce(&mut CartCollection) -> bool) -> Mutation {
        let mut applied = None;

        self.state.send_if_modified(|current| {
            let mut next = CartCollection::clone(&current.cart);
            if !op(&mut next) {
                return false;
            }
            *current = CartSnapshot {
                revision: current.revision + 1,
                cart: Arc::new(next),
            };
            applied = Some(current.clone());
            true
        });

        let Some(snapshot) = applied else {
            return Mutation::Unchanged;
        };
        let revision = snapshot.revision;

        offer_pending(&self.pending, snapshot);

        if self.pending.is_closed() {
            warn!(revision, "Cart persistence worker is stopped, change kept in memory only");
        }

        Mutation::Applied { revision }
    }
}

/// Hands `snapshot` to the persistence worker unless a newer one is already pending.
///
/// Two racing mutations may get here out of order. Returns whether the
/// snapshot was taken.
fn offer_pending(pending: &watch::Sender<CartSnapshot>, snapshot: CartSnapshot) -> bool {
    pending.send_if_modified(|current| {
        if snapshot.revision > current.revision {
            *current = snapshot;
            true
        } else {
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockCartRepository;
    use std::time::Duration;

    fn settings() -> PersistSettings {
        PersistSettings {
            debounce: Duration::ZERO,
            retry_attempts: 0,
            retry_base: Duration::from_millis(1),
        }
    }

    fn item(id: &str, price: f64) -> NewCartItem {
        NewCartItem::new(id, "T", "u", price)
    }

    fn ids_and_quantities(store: &CartStore) -> Vec<(String, u32)> {
        store
            .products()
            .iter()
            .map(|item| (item.id.clone(), item.quantity))
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_restores_persisted_cart() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().times(1).returning(|| {
            let mut cart = CartCollection::new();
            cart.add(NewCartItem::new("a", "T", "u", 10.0));
            Ok(Some(cart))
        });
        repo.expect_save().times(0);

        let store = CartStore::initialize(Arc::new(repo), settings()).await;

        assert_eq!(ids_and_quantities(&store), vec![("a".to_string(), 1)]);
        assert_eq!(store.revision(), 0);
        assert!(store.restore_error().is_none());
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_initialize_with_corrupt_data_starts_empty() {
        let mut repo = MockCartRepository::new();
        repo.expect_load()
            .returning(|| Err(CartError::Deserialization("bad json".to_string())));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;

        assert!(store.products().is_empty());
        assert!(matches!(
            store.restore_error(),
            Some(CartError::Deserialization(_))
        ));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_initialize_with_read_failure_starts_empty() {
        let mut repo = MockCartRepository::new();
        repo.expect_load()
            .returning(|| Err(CartError::StorageRead("connection refused".to_string())));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;

        assert!(store.products().is_empty());
        assert!(matches!(store.restore_error(), Some(CartError::StorageRead(_))));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_scenario_add_increment_decrement() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save().returning(|_| Ok(()));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;

        assert_eq!(
            store.add_to_cart(item("a", 10.0)),
            Mutation::Applied { revision: 1 }
        );
        assert_eq!(ids_and_quantities(&store), vec![("a".to_string(), 1)]);

        assert_eq!(store.increment("a"), Mutation::Applied { revision: 2 });
        assert_eq!(ids_and_quantities(&store), vec![("a".to_string(), 2)]);

        assert!(store.decrement("a").is_applied());
        assert!(store.decrement("a").is_applied());
        assert!(store.products().is_empty());

        assert_eq!(store.decrement("a"), Mutation::Unchanged);
        assert!(store.products().is_empty());
        assert_eq!(store.revision(), 4);

        store.flush().await.unwrap();
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_noop_mutations_do_not_write() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save().times(0);

        let store = CartStore::initialize(Arc::new(repo), settings()).await;

        assert_eq!(store.increment("missing"), Mutation::Unchanged);
        assert_eq!(store.decrement("missing"), Mutation::Unchanged);
        assert_eq!(store.revision(), 0);

        store.flush().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(*store.persist_status().borrow(), PersistStatus::restored(0));
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_carries_post_mutation_snapshot() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save()
            .withf(|cart| cart.get("a").map(|item| item.quantity) == Some(1))
            .times(1)
            .returning(|_| Ok(()));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;
        store.add_to_cart(item("a", 1.0));

        store.flush().await.unwrap();
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_merge_replaces_fields_and_increments() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save().returning(|_| Ok(()));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;
        store.add_to_cart(item("x", 1.0));
        store.increment("x");
        store.increment("x");

        store.add_to_cart(NewCartItem::new("x", "New title", "new-url", 99.5));

        let products = store.products();
        let x = products.get("x").unwrap();
        assert_eq!(x.quantity, 4);
        assert_eq!(x.title, "New title");
        assert_eq!(x.image_url, "new-url");
        assert_eq!(x.price, 99.5);
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_observers_see_each_applied_mutation() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save().returning(|_| Ok(()));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;
        let mut observer = store.subscribe();

        store.add_to_cart(item("a", 1.0));
        assert!(observer.has_changed().unwrap());
        let seen = observer.borrow_and_update().clone();
        assert_eq!(seen.revision, 1);
        assert_eq!(seen.cart.len(), 1);

        store.increment("missing");
        assert!(!observer.has_changed().unwrap());
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_flush_surfaces_write_failure_without_rollback() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save()
            .returning(|_| Err(CartError::StorageWrite("permission denied".to_string())));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;
        store.add_to_cart(item("a", 1.0));

        let result = store.flush().await;

        assert_eq!(
            result,
            Err(CartError::StorageWrite("permission denied".to_string()))
        );
        assert_eq!(ids_and_quantities(&store), vec![("a".to_string(), 1)]);
        store.shutdown().await;
    }

    #[tokio::test]
    async fn test_older_snapshot_never_replaces_newer_pending_one() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let sink = saved.clone();
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save().returning(move |cart| {
            sink.lock().unwrap().push(cart.len());
            Ok(())
        });

        let debounced = PersistSettings {
            debounce: Duration::from_secs(60),
            ..settings()
        };
        let store = CartStore::initialize(Arc::new(repo), debounced).await;

        let snapshot = |revision: u64, ids: &[&str]| {
            let mut cart = CartCollection::new();
            for id in ids {
                cart.add(item(id, 1.0));
            }
            CartSnapshot {
                revision,
                cart: Arc::new(cart),
            }
        };

        assert!(offer_pending(&store.pending, snapshot(2, &["a", "b"])));
        assert!(!offer_pending(&store.pending, snapshot(1, &["a"])));
        assert_eq!(store.pending.borrow().revision, 2);

        store.shutdown().await;

        assert_eq!(*saved.lock().unwrap(), vec![2]);
        assert_eq!(store.persist_status().borrow().revision, 2);
    }

    #[tokio::test]
    async fn test_flush_after_shutdown_reports_unavailable() {
        let mut repo = MockCartRepository::new();
        repo.expect_load().returning(|| Ok(None));
        repo.expect_save().returning(|_| Ok(()));

        let store = CartStore::initialize(Arc::new(repo), settings()).await;
        store.shutdown().await;
        store.shutdown().await;

        store.add_to_cart(item("a", 1.0));

        assert_eq!(store.flush().await, Err(CartError::ContextUnavailable));
        assert_eq!(store.products().len(), 1);
    }
}
