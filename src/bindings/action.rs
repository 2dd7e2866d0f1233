use super::provider::use_store;
use crate::error::Result;
use crate::store::{ActionResult, BoundAction, State};

/// Bind `action` to the store in context.
///
/// The returned callable runs `action` against the store's state at call
/// time and merges what it returns. Listeners, not the call, drive renders.
pub fn use_action<A, F, R>(action: F) -> Result<BoundAction<A>>
where
    F: Fn(&State, A) -> R + 'static,
    R: Into<ActionResult>,
{
    use_store().map(|store| store.action(action))
}
