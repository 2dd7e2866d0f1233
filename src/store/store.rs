use super::action::{ActionResult, BoundAction};
use super::state::State;
use crate::error::Result;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

type Listener = Rc<dyn Fn(&State)>;

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    listener: Listener,
    active: Rc<Cell<bool>>,
}

struct StoreInner {
    state: RefCell<State>,
    listeners: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

/// A minimal state container.
///
/// Holds a [`State`] map, merges patches into it and notifies listeners
/// synchronously after every change. Clones share the same state.
///
/// # Examples
///
/// ```
/// use tincan_connect::{State, Store};
///
/// let store = Store::new(State::new().with("a", 1).with("b", 1));
/// store.set_state(State::new().with("b", 2));
///
/// assert_eq!(store.state().get("a").and_then(|v| v.as_f64()), Some(1.0));
/// assert_eq!(store.state().get("b").and_then(|v| v.as_f64()), Some(2.0));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

impl Store {
    /// Create a new store with the given initial state.
    pub fn new(initial: State) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                pool: RefCell::new(pool),
                spawner,
            }),
        }
    }

    /// Create a store seeded from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        State::from_json(json).map(Self::new)
    }

    /// Get a snapshot of the current state.
    pub fn state(&self) -> State {
        self.inner.state.borrow().clone()
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&State) -> R,
    {
        f(&self.inner.state.borrow())
    }

    /// Merge `patch` into the state and notify listeners.
    pub fn set_state(&self, patch: State) {
        self.inner.state.borrow_mut().merge(patch);
        self.notify();
    }

    /// Replace the whole state and notify listeners.
    pub fn replace_state(&self, state: State) {
        *self.inner.state.borrow_mut() = state;
        self.notify();
    }

    /// Update the state in place and notify listeners.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut State),
    {
        f(&mut self.inner.state.borrow_mut());
        self.notify();
    }

    /// Register a listener called with the new state after every change.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&State) + 'static,
    {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push(Registration {
            id,
            listener: Rc::new(listener),
            active: Rc::new(Cell::new(true)),
        });
        debug!(listener = id.0, "listener subscribed");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    ///
    /// A listener removed while a notification is in flight is skipped for
    /// the rest of that notification.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.inner.listeners.borrow_mut();
            listeners
                .iter()
                .position(|r| r.id == id)
                .map(|index| listeners.remove(index))
        };
        match removed {
            Some(registration) => {
                registration.active.set(false);
                debug!(listener = id.0, "listener unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Subscribe for as long as the returned guard lives.
    pub fn watch<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&State) + 'static,
    {
        Subscription {
            id: self.subscribe(listener),
            store: Rc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Bind an action to this store.
    ///
    /// The action receives the state at call time plus the caller's
    /// arguments; whatever it returns is applied as a merge patch.
    ///
    /// ```
    /// use tincan_connect::{State, Store};
    ///
    /// let store = Store::new(State::new().with("count", 1));
    /// let add = store.action(|state: &State, n: f64| {
    ///     let count = state.get("count").and_then(|v| v.as_f64()).unwrap_or(0.0);
    ///     State::new().with("count", count + n)
    /// });
    ///
    /// add.call(2.0);
    /// assert_eq!(store.state().get("count").and_then(|v| v.as_f64()), Some(3.0));
    /// ```
    pub fn action<A, F, R>(&self, action: F) -> BoundAction<A>
    where
        F: Fn(&State, A) -> R + 'static,
        R: Into<ActionResult>,
    {
        BoundAction::new(
            self.clone(),
            Rc::new(move |state: &State, args: A| -> ActionResult {
                action(state, args).into()
            }),
        )
    }

    /// Drive deferred action results until none can make progress.
    ///
    /// Results that are ready when the action returns land right away; this
    /// picks up the ones that resolve later. [`Root::act`] and
    /// [`Root::flush`] call it for every store provided in their tree.
    ///
    /// [`Root::act`]: crate::runtime::Root::act
    /// [`Root::flush`]: crate::runtime::Root::flush
    pub fn run_deferred(&self) {
        match self.inner.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => trace!("deferred actions already running"),
        }
    }

    /// Whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn apply(&self, result: ActionResult) {
        match result {
            ActionResult::Unchanged => {}
            ActionResult::Patch(patch) => self.set_state(patch),
            ActionResult::Deferred(future) => {
                let store = Rc::downgrade(&self.inner);
                let task = async move {
                    let result = future.await;
                    match store.upgrade() {
                        Some(inner) => Store { inner }.apply(result),
                        None => debug!("store dropped before deferred action resolved"),
                    }
                };
                if let Err(err) = self.inner.spawner.spawn_local(task) {
                    warn!(error = %err, "failed to spawn deferred action");
                    return;
                }
                self.run_deferred();
            }
        }
    }

    /// Notify all listeners of a state change.
    fn notify(&self) {
        let state = self.state();
        let listeners: Vec<_> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|r| (Rc::clone(&r.listener), Rc::clone(&r.active)))
            .collect();
        trace!(listeners = listeners.len(), "notifying listeners");
        for (listener, active) in listeners {
            if active.get() {
                listener(&state);
            }
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// RAII guard for a store listener.
pub struct Subscription {
    id: ListenerId,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// The listener this guard removes on drop.
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            Store { inner }.unsubscribe(self.id);
        }
    }
}
