use crate::runtime::{Prop, Props};
use crate::store::{ActionResult, State, Store, Value};
use std::fmt;
use std::rc::Rc;

/// Property names picked out of state by [`select`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties(Vec<String>);

impl Properties {
    /// The property names, in order.
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// A comma-separated list; each name is trimmed.
impl From<&str> for Properties {
    fn from(csv: &str) -> Self {
        Properties(csv.split(',').map(|name| name.trim().to_string()).collect())
    }
}

impl From<String> for Properties {
    fn from(csv: String) -> Self {
        Properties::from(csv.as_str())
    }
}

impl From<Vec<String>> for Properties {
    fn from(names: Vec<String>) -> Self {
        Properties(names)
    }
}

impl From<Vec<&str>> for Properties {
    fn from(names: Vec<&str>) -> Self {
        Properties(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Properties {
    fn from(names: [&str; N]) -> Self {
        Properties(names.into_iter().map(String::from).collect())
    }
}

type MapFn = Rc<dyn Fn(&State, &Props) -> State>;

/// Maps store state (and the component's own props) to the props a
/// connected component receives.
#[derive(Clone)]
pub struct MapState(MapFn);

impl MapState {
    /// Map state with a function of the state and the component's own props.
    pub fn from_fn<F>(map: F) -> Self
    where
        F: Fn(&State, &Props) -> State + 'static,
    {
        MapState(Rc::new(map))
    }

    /// Compute the mapped state.
    pub fn call(&self, state: &State, props: &Props) -> State {
        (self.0)(state, props)
    }
}

impl Default for MapState {
    fn default() -> Self {
        select(Properties::default())
    }
}

impl<P: Into<Properties>> From<P> for MapState {
    fn from(properties: P) -> Self {
        select(properties)
    }
}

impl fmt::Debug for MapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MapState(..)")
    }
}

/// A mapper that copies the named keys out of state.
///
/// Every name appears in the result; keys missing from state map to `Null`.
///
/// ```
/// use tincan_connect::{select, Props, State};
///
/// let state = State::new().with("foo", 1).with("bar", 2).with("baz", 3);
/// let picked = select("foo, bar").call(&state, &Props::new());
///
/// assert_eq!(picked, State::new().with("foo", 1).with("bar", 2));
/// ```
pub fn select(properties: impl Into<Properties>) -> MapState {
    let properties = properties.into();
    MapState::from_fn(move |state, _| {
        properties
            .0
            .iter()
            .map(|name| (name.clone(), state.get(name).cloned().unwrap_or_default()))
            .collect()
    })
}

/// An action as used by [`connect`](crate::connect): current state plus
/// positional arguments.
pub type ActionFn = Rc<dyn Fn(&State, Vec<Value>) -> ActionResult>;

/// Box a closure as an [`ActionFn`].
pub fn action_fn<F, R>(action: F) -> ActionFn
where
    F: Fn(&State, Vec<Value>) -> R + 'static,
    R: Into<ActionResult>,
{
    Rc::new(move |state: &State, args: Vec<Value>| -> ActionResult {
        action(state, args).into()
    })
}

/// Named action functions.
#[derive(Clone, Default)]
pub struct ActionSet(Vec<(String, ActionFn)>);

impl ActionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional actions, named `"0"`, `"1"`, ... in order.
    pub fn indexed(actions: impl IntoIterator<Item = ActionFn>) -> Self {
        ActionSet(
            actions
                .into_iter()
                .enumerate()
                .map(|(i, action)| (i.to_string(), action))
                .collect(),
        )
    }

    /// Add a named action.
    pub fn with<F, R>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&State, Vec<Value>) -> R + 'static,
        R: Into<ActionResult>,
    {
        self.0.push((name.into(), action_fn(action)));
        self
    }

    /// Action names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no actions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Actions for a connected component: a fixed set, or a factory that builds
/// one from the store.
#[derive(Clone)]
pub enum Actions {
    Set(ActionSet),
    Factory(Rc<dyn Fn(&Store) -> ActionSet>),
}

impl Actions {
    /// Actions built from the store when a component binds them.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Store) -> ActionSet + 'static,
    {
        Actions::Factory(Rc::new(factory))
    }
}

impl From<ActionSet> for Actions {
    fn from(set: ActionSet) -> Self {
        Actions::Set(set)
    }
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actions::Set(set) => f.debug_tuple("Set").field(set).finish(),
            Actions::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Bind every action to `store`, keyed by name.
pub fn map_actions(actions: &Actions, store: &Store) -> Props {
    let set = match actions {
        Actions::Set(set) => set.clone(),
        Actions::Factory(factory) => factory(store),
    };
    set.0
        .into_iter()
        .map(|(name, action)| {
            let bound = store.action(move |state: &State, args: Vec<Value>| action(state, args));
            (name, Prop::Action(bound))
        })
        .collect()
}
