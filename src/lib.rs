//! # Tincan Connect
//!
//! Bindings between a minimal state store and a component tree.
//!
//! Components read store state through hooks or a `connect` wrapper and
//! re-render only when the data they depend on changes.
//!
//! ## Store
//!
//! - `Store` - State container: merge patches, subscribe, bind actions
//! - `State` / `Value` - Keyed state of shared, dynamically typed values
//!
//! ## Bindings
//!
//! - `provider` / `use_store` - Hand a store down a subtree
//! - `use_selector` - Derived state, re-rendering on identity change
//! - `use_action` - Actions bound to the store in context
//! - `connect` - Wrap a component so store state arrives as props
//!
//! ## Runtime
//!
//! A small headless host (`Root`, `Component`, hooks) that drives renders,
//! context and mount/unmount lifecycle.

pub mod bindings;
pub mod error;
pub mod runtime;
pub mod store;

// Re-export main types for convenience
pub use bindings::{
    action_fn, connect, map_actions, provider, select, use_action, use_selector,
    use_selector_with, use_store, ActionFn, ActionSet, Actions, Connector, MapState, Properties,
    STORE_PROP,
};
pub use error::{Error, Result};
pub use runtime::{Component, Element, Node, Prop, Props, Root, Updater, View, ViewHandle};
pub use store::{ActionResult, BoundAction, SameValue, State, Store, Value};
