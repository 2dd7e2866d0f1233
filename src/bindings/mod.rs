//! Hooks and the `connect` wrapper that bind components to a [`Store`].
//!
//! - [`provider`] makes a store visible to a subtree.
//! - [`use_selector`] reads derived state and re-renders when it changes.
//! - [`use_action`] binds an action to the store.
//! - [`connect`] wraps a component so store state arrives as props.
//!
//! [`Store`]: crate::store::Store

mod action;
mod connect;
mod provider;
mod select;
mod selector;

pub use action::use_action;
pub use connect::{connect, Connector, STORE_PROP};
pub use provider::{provider, use_store};
pub use select::{action_fn, map_actions, select, ActionFn, ActionSet, Actions, MapState, Properties};
pub use selector::{use_selector, use_selector_with};
