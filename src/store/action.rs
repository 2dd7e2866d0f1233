use super::state::State;
use super::store::Store;
use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// What an action hands back to the store.
pub enum ActionResult {
    /// No state change.
    Unchanged,
    /// Merge this patch into the store.
    Patch(State),
    /// Apply the result once the future resolves.
    Deferred(LocalBoxFuture<'static, ActionResult>),
}

impl ActionResult {
    /// Wrap a future whose output is applied when it resolves.
    pub fn deferred<F, R>(future: F) -> Self
    where
        F: Future<Output = R> + 'static,
        R: Into<ActionResult> + 'static,
    {
        ActionResult::Deferred(future.map(|r| -> ActionResult { r.into() }).boxed_local())
    }
}

impl fmt::Debug for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Unchanged => f.write_str("Unchanged"),
            ActionResult::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            ActionResult::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<State> for ActionResult {
    fn from(patch: State) -> Self {
        ActionResult::Patch(patch)
    }
}

impl From<Option<State>> for ActionResult {
    fn from(patch: Option<State>) -> Self {
        patch.map_or(ActionResult::Unchanged, ActionResult::Patch)
    }
}

impl From<()> for ActionResult {
    fn from(_: ()) -> Self {
        ActionResult::Unchanged
    }
}

type ActionBody<A> = Rc<dyn Fn(&State, A) -> ActionResult>;

/// An action bound to a store.
///
/// Every call reads the store's state at call time and applies the result.
pub struct BoundAction<A> {
    store: Store,
    body: ActionBody<A>,
}

impl<A> BoundAction<A> {
    pub(crate) fn new(store: Store, body: ActionBody<A>) -> Self {
        Self { store, body }
    }

    /// Run the action against the current state.
    pub fn call(&self, args: A) {
        let result = (self.body)(&self.store.state(), args);
        self.store.apply(result);
    }

    /// The store this action is bound to.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl<A> Clone for BoundAction<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            body: Rc::clone(&self.body),
        }
    }
}

impl<A> fmt::Debug for BoundAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction").finish_non_exhaustive()
    }
}
