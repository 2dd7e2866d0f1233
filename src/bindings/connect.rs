use super::provider::use_store;
use super::select::{map_actions, Actions, MapState};
use crate::error::Result;
use crate::runtime::{Component, Node, Prop, Props, Updater, View};
use crate::store::{SameValue, State, Store, Subscription};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Prop name the raw store is passed under when no actions are given.
pub const STORE_PROP: &str = "store";

/// Wire components up to the store in context.
///
/// `map_state` is a mapping function ([`MapState::from_fn`]) or property
/// names (`"foo, bar"`, `["foo", "bar"]`). With `actions`, each one is bound
/// to the store and passed as a prop; without, the store itself is passed
/// as [`STORE_PROP`].
///
/// ```
/// use tincan_connect::{connect, provider, ActionSet, Component, Props, Root, State, Store};
///
/// let store = Store::new(State::new().with("count", 0));
/// let actions = ActionSet::new().with("increment", |state: &State, _| {
///     let count = state.get("count").and_then(|v| v.as_f64()).unwrap_or(0.0);
///     State::new().with("count", count + 1.0)
/// });
///
/// let counter = connect("count", Some(actions.into())).wrap(Component::function(|props| {
///     let count = props.value("count").and_then(|v| v.as_f64()).unwrap_or(0.0);
///     Ok(format!("count: {count}"))
/// }));
///
/// let root = Root::new();
/// let handles = root
///     .mount(provider(store.clone(), [counter.element(Props::new())]))
///     .unwrap();
/// assert_eq!(root.text(), "count: 0");
///
/// let increment = store.action(|state: &State, _: ()| {
///     let count = state.get("count").and_then(|v| v.as_f64()).unwrap_or(0.0);
///     State::new().with("count", count + 1.0)
/// });
/// root.act(|| increment.call(())).unwrap();
/// assert_eq!(root.text(), "count: 1");
/// assert_eq!(handles[0].render_count(), 2);
/// ```
pub fn connect(map_state: impl Into<MapState>, actions: Option<Actions>) -> Connector {
    Connector {
        map_state: map_state.into(),
        actions,
    }
}

/// Produced by [`connect`]; wraps components.
#[derive(Clone, Debug)]
pub struct Connector {
    map_state: MapState,
    actions: Option<Actions>,
}

impl Connector {
    /// A component that renders `child` with store-derived props.
    pub fn wrap(&self, child: Component) -> Component {
        let map_state = self.map_state.clone();
        let actions = self.actions.clone();
        Component::stateful(move |props, updater| {
            Connected::new(
                props,
                updater,
                map_state.clone(),
                actions.as_ref(),
                child.clone(),
            )
        })
        .named("connect")
    }
}

/// Whether newly mapped props call for a render.
///
/// Forward pass: a key mapped before whose value is no longer the same.
/// Backward pass: a key mapped before that is gone now. Keys that only
/// appear in `next` do not count.
pub(crate) fn mapped_props_changed(previous: &State, next: &State) -> bool {
    for (key, value) in next {
        if let Some(old) = previous.get(key) {
            if !old.same(value) {
                return true;
            }
        }
    }
    previous.keys().any(|key| !next.contains_key(key))
}

/// State shared between the connected view and its store listener.
struct Binding {
    store: Store,
    map_state: MapState,
    props: RefCell<Props>,
    mapped: RefCell<State>,
    updater: Updater,
}

impl Binding {
    fn update(&self) {
        let next = self
            .store
            .read(|state| self.map_state.call(state, &self.props.borrow()));
        if mapped_props_changed(&self.mapped.borrow(), &next) {
            trace!("mapped props changed, scheduling render");
            *self.mapped.borrow_mut() = next;
            self.updater.schedule();
        }
    }
}

struct Connected {
    binding: Rc<Binding>,
    bound: Props,
    child: Component,
    child_view: Option<Box<dyn View>>,
    subscription: Option<Subscription>,
}

impl Connected {
    fn new(
        props: &Props,
        updater: Updater,
        map_state: MapState,
        actions: Option<&Actions>,
        child: Component,
    ) -> Result<Self> {
        let store = use_store()?;
        let mapped = store.read(|state| map_state.call(state, props));
        let bound = match actions {
            Some(actions) => map_actions(actions, &store),
            None => Props::from_iter([(STORE_PROP, Prop::Store(store.clone()))]),
        };

        Ok(Self {
            binding: Rc::new(Binding {
                store,
                map_state,
                props: RefCell::new(props.clone()),
                mapped: RefCell::new(mapped),
                updater,
            }),
            bound,
            child,
            child_view: None,
            subscription: None,
        })
    }

    /// Bound actions (or the store), then own props, then mapped state.
    fn child_props(&self, own: &Props) -> Props {
        let mut props = self.bound.clone();
        props.extend(own.clone());
        props.extend_state(&self.binding.mapped.borrow());
        props
    }
}

impl View for Connected {
    fn receive_props(&mut self, props: &Props) -> Result<()> {
        *self.binding.props.borrow_mut() = props.clone();
        self.binding.update();
        Ok(())
    }

    fn mounted(&mut self) -> Result<()> {
        let binding: Weak<Binding> = Rc::downgrade(&self.binding);
        self.subscription = Some(self.binding.store.watch(move |_| {
            if let Some(binding) = binding.upgrade() {
                binding.update();
            }
        }));
        if let Some(child) = self.child_view.as_mut() {
            child.mounted()?;
        }
        Ok(())
    }

    fn unmounting(&mut self) {
        if let Some(child) = self.child_view.as_mut() {
            child.unmounting();
        }
        self.subscription = None;
    }

    fn render(&mut self, props: &Props) -> Result<Node> {
        let child_props = self.child_props(props);
        match self.child_view.as_mut() {
            Some(child) => {
                child.receive_props(&child_props)?;
                child.render(&child_props)
            }
            None => {
                let mut child = self
                    .child
                    .construct(&child_props, self.binding.updater.clone())?;
                let output = child.render(&child_props);
                self.child_view = Some(child);
                output
            }
        }
    }
}
