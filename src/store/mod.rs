//! The state container that components bind to.
//!
//! A [`Store`] holds a [`State`] map of [`Value`]s, merges patches into it and
//! notifies listeners synchronously after every change. Actions bound with
//! [`Store::action`] always read the state at call time.

mod action;
mod state;
mod store;
mod value;

pub use action::{ActionResult, BoundAction};
pub use state::State;
pub use store::{ListenerId, Store, Subscription};
pub use value::{SameValue, Value};
