use crate::store::{BoundAction, State, Store, Value};
use std::collections::btree_map::{self, BTreeMap};

/// A single prop handed to a component.
#[derive(Clone, Debug)]
pub enum Prop {
    Value(Value),
    Action(BoundAction<Vec<Value>>),
    Store(Store),
}

impl Prop {
    /// The plain value, if this prop is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Prop::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: Into<Value>> From<T> for Prop {
    fn from(value: T) -> Self {
        Prop::Value(value.into())
    }
}

/// Props passed to a component, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct Props(BTreeMap<String, Prop>);

impl Props {
    /// Create an empty prop set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a plain value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, Prop::Value(value.into()));
        self
    }

    /// Set `key`, returning the prop it replaced.
    pub fn insert(&mut self, key: impl Into<String>, prop: Prop) -> Option<Prop> {
        self.0.insert(key.into(), prop)
    }

    /// Get the prop under `key`.
    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.0.get(key)
    }

    /// Get `key` if it holds a plain value.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(Prop::as_value)
    }

    /// Get `key` if it holds a bound action.
    pub fn action(&self, key: &str) -> Option<&BoundAction<Vec<Value>>> {
        match self.get(key) {
            Some(Prop::Action(action)) => Some(action),
            _ => None,
        }
    }

    /// Get `key` if it holds a store.
    pub fn store(&self, key: &str) -> Option<&Store> {
        match self.get(key) {
            Some(Prop::Store(store)) => Some(store),
            _ => None,
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Overlay `other`; its entries win on duplicate keys.
    pub fn extend(&mut self, other: Props) {
        self.0.extend(other.0);
    }

    /// Overlay state values as plain props; they win on duplicate keys.
    pub fn extend_state(&mut self, state: &State) {
        self.0.extend(
            state
                .iter()
                .map(|(k, v)| (k.clone(), Prop::Value(v.clone()))),
        );
    }

    /// Iterate over prop names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over props in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Prop> {
        self.0.iter()
    }

    /// Number of props.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no props.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Prop)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, Prop)>>(iter: I) -> Self {
        Props(iter.into_iter().map(|(k, p)| (k.into(), p)).collect())
    }
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        let mut props = Props::new();
        props.extend_state(state);
        props
    }
}
