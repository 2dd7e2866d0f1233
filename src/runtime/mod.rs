//! Headless host runtime for components.
//!
//! This module provides what the bindings need from a UI library: context
//! propagation down an element tree, hook slots kept across renders, forced
//! re-renders, and mount/update/unmount lifecycle for class-like views.

mod context;
mod hooks;
mod props;
mod root;
mod view;

pub use context::{provide_context, use_context, ContextValue};
pub use hooks::{use_effect_once, use_force_update, use_ref};
pub use props::{Prop, Props};
pub use root::{Root, Updater, ViewHandle};
pub use view::{Component, Element, Node, View};
