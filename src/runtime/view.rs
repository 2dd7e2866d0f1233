use super::context::ContextValue;
use super::props::Props;
use super::root::Updater;
use crate::error::Result;
use std::fmt;
use std::rc::Rc;

/// Rendered output of a component.
pub type Node = String;

/// A stateful component driven through its lifecycle by the host.
///
/// `receive_props` runs when the parent hands over new props, before the
/// render that commits them. `mounted` and `unmounting` bracket the time the
/// view is part of a tree.
pub trait View {
    fn receive_props(&mut self, _props: &Props) -> Result<()> {
        Ok(())
    }

    fn mounted(&mut self) -> Result<()> {
        Ok(())
    }

    fn unmounting(&mut self) {}

    fn render(&mut self, props: &Props) -> Result<Node>;
}

/// View for a plain render function; hooks keep its state.
struct FunctionView {
    render: Rc<dyn Fn(&Props) -> Result<Node>>,
}

impl View for FunctionView {
    fn render(&mut self, props: &Props) -> Result<Node> {
        (self.render)(props)
    }
}

type Construct = Rc<dyn Fn(&Props, Updater) -> Result<Box<dyn View>>>;

/// A component type: knows how to build a [`View`] for a set of props.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    construct: Construct,
}

impl Component {
    /// A function component. State lives in hooks.
    pub fn function<F>(render: F) -> Self
    where
        F: Fn(&Props) -> Result<Node> + 'static,
    {
        let render: Rc<dyn Fn(&Props) -> Result<Node>> = Rc::new(render);
        Self {
            name: "function",
            construct: Rc::new(move |_: &Props, _: Updater| {
                Ok(Box::new(FunctionView {
                    render: Rc::clone(&render),
                }) as Box<dyn View>)
            }),
        }
    }

    /// A class-like component built once per mount.
    ///
    /// The constructor runs with the mount point's context in scope and gets
    /// an [`Updater`] for forcing renders later.
    pub fn stateful<V, F>(construct: F) -> Self
    where
        V: View + 'static,
        F: Fn(&Props, Updater) -> Result<V> + 'static,
    {
        Self {
            name: "stateful",
            construct: Rc::new(move |props: &Props, updater: Updater| {
                construct(props, updater).map(|view| Box::new(view) as Box<dyn View>)
            }),
        }
    }

    /// Label used in logs.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// The component's log label.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self, props: &Props, updater: Updater) -> Result<Box<dyn View>> {
        (self.construct)(props, updater)
    }

    /// Place this component in a tree with the given props.
    pub fn element(&self, props: Props) -> Element {
        Element::Component {
            component: self.clone(),
            props,
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A description of what to mount.
#[derive(Clone, Debug)]
pub enum Element {
    /// Make `value` visible to everything in `children`.
    Provide {
        value: ContextValue,
        children: Vec<Element>,
    },
    Component {
        component: Component,
        props: Props,
    },
    Fragment(Vec<Element>),
}

impl Element {
    /// Provide `value` to `children`.
    pub fn provide<T: 'static>(value: T, children: impl IntoIterator<Item = Element>) -> Self {
        Element::Provide {
            value: ContextValue::new(value),
            children: children.into_iter().collect(),
        }
    }

    /// Group elements without providing anything.
    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Self {
        Element::Fragment(children.into_iter().collect())
    }
}
