use super::context::{self, Frame};
use super::hooks;
use super::props::Props;
use super::view::{Element, Node, View};
use crate::error::Result;
use crate::store::Store;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

// Render passes a single flush may take before it gives up on a component
// that keeps scheduling itself.
const MAX_FLUSH_PASSES: usize = 100;

pub(crate) type Effect = Box<dyn FnOnce() -> Box<dyn FnOnce()>>;

/// A mounted component.
pub(crate) struct Instance {
    id: usize,
    name: &'static str,
    view: RefCell<Option<Box<dyn View>>>,
    props: RefCell<Props>,
    pub(crate) slots: RefCell<Vec<Rc<dyn Any>>>,
    pub(crate) effects: RefCell<Vec<Effect>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    frame: Option<Rc<Frame>>,
    output: RefCell<Node>,
    renders: Cell<usize>,
    mounted: Cell<bool>,
    root: Weak<RootInner>,
}

impl Instance {
    pub(crate) fn updater(self: &Rc<Self>) -> Updater {
        Updater {
            instance: Rc::downgrade(self),
        }
    }

    fn render(self: &Rc<Self>) -> Result<()> {
        let props = self.props.borrow().clone();
        let output = context::with_frame(self.frame.clone(), || {
            hooks::with_instance(Rc::clone(self), || match self.view.borrow_mut().as_mut() {
                Some(view) => view.render(&props),
                None => Ok(Node::new()),
            })
        })?;
        *self.output.borrow_mut() = output;
        self.renders.set(self.renders.get() + 1);
        trace!(instance = self.id, component = self.name, "rendered");
        Ok(())
    }

    fn run_effects(&self) {
        let effects: Vec<Effect> = self.effects.borrow_mut().drain(..).collect();
        for effect in effects {
            let cleanup = effect();
            self.cleanups.borrow_mut().push(cleanup);
        }
    }

    fn commit_mount(&self) -> Result<()> {
        self.mounted.set(true);
        if let Some(view) = self.view.borrow_mut().as_mut() {
            view.mounted()?;
        }
        self.run_effects();
        debug!(instance = self.id, component = self.name, "mounted");
        Ok(())
    }

    fn unmount(&self) {
        if !self.mounted.replace(false) {
            return;
        }
        if let Some(view) = self.view.borrow_mut().as_mut() {
            view.unmounting();
        }
        let cleanups: Vec<_> = self.cleanups.borrow_mut().drain(..).collect();
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
        self.effects.borrow_mut().clear();
        debug!(instance = self.id, component = self.name, "unmounted");
    }
}

/// Forces a component to render again on the next flush.
///
/// Does nothing once the component has unmounted.
#[derive(Clone)]
pub struct Updater {
    instance: Weak<Instance>,
}

impl Updater {
    /// Queue a render of the component.
    pub fn schedule(&self) {
        let Some(instance) = self.instance.upgrade() else {
            return;
        };
        if !instance.mounted.get() {
            trace!(instance = instance.id, "update for unmounted component ignored");
            return;
        }
        if let Some(root) = instance.root.upgrade() {
            root.enqueue(instance.id);
        }
    }

    /// Whether the component is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.instance
            .upgrade()
            .is_some_and(|instance| instance.mounted.get())
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

pub(crate) struct RootInner {
    instances: RefCell<Vec<Rc<Instance>>>,
    dirty: RefCell<Vec<usize>>,
    stores: RefCell<Vec<Store>>,
    next_id: Cell<usize>,
    flushing: Cell<bool>,
}

/// Clears the `flushing` flag on every exit path, unwinding included.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl RootInner {
    fn track(&self, store: &Store) {
        let mut stores = self.stores.borrow_mut();
        if !stores.iter().any(|known| known.ptr_eq(store)) {
            stores.push(store.clone());
        }
    }

    fn run_deferred(&self) {
        let stores = self.stores.borrow().clone();
        for store in stores {
            store.run_deferred();
        }
    }

    fn enqueue(&self, id: usize) {
        let mut dirty = self.dirty.borrow_mut();
        if !dirty.contains(&id) {
            trace!(instance = id, "render scheduled");
            dirty.push(id);
        }
    }

    fn find(&self, id: usize) -> Option<Rc<Instance>> {
        self.instances
            .borrow()
            .iter()
            .find(|instance| instance.id == id)
            .cloned()
    }

    fn flush(&self) -> Result<()> {
        if self.flushing.replace(true) {
            return Ok(());
        }
        let _guard = FlushGuard(&self.flushing);
        self.run_deferred();
        self.drain()
    }

    fn drain(&self) -> Result<()> {
        for _ in 0..MAX_FLUSH_PASSES {
            let batch = std::mem::take(&mut *self.dirty.borrow_mut());
            if batch.is_empty() {
                return Ok(());
            }
            let mut batch = batch.into_iter();
            while let Some(id) = batch.next() {
                let Some(instance) = self.find(id) else {
                    continue;
                };
                if !instance.mounted.get() {
                    continue;
                }
                if let Err(err) = instance.render() {
                    // The rest of the batch stays pending for the next flush.
                    for rest in batch.by_ref() {
                        self.enqueue(rest);
                    }
                    return Err(err);
                }
                instance.run_effects();
            }
        }
        let pending = std::mem::take(&mut *self.dirty.borrow_mut());
        warn!(pending = pending.len(), "render loop did not settle, dropping updates");
        Ok(())
    }

    fn remove(&self, id: usize) {
        self.instances.borrow_mut().retain(|instance| instance.id != id);
        self.dirty.borrow_mut().retain(|&dirty| dirty != id);
    }
}

/// A headless host that mounts [`Element`] trees and re-renders components
/// when they schedule updates.
///
/// Updates are batched: they render on [`Root::flush`], or at the end of
/// [`Root::act`]. Dropping the root unmounts everything.
pub struct Root {
    inner: Rc<RootInner>,
}

impl Root {
    /// Create an empty root.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RootInner {
                instances: RefCell::new(Vec::new()),
                dirty: RefCell::new(Vec::new()),
                stores: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                flushing: Cell::new(false),
            }),
        }
    }

    /// Construct and render every component in `element`, then mount them.
    ///
    /// Returns a handle per component, in tree order.
    pub fn mount(&self, element: Element) -> Result<Vec<ViewHandle>> {
        let mut created = Vec::new();
        self.build(element, context::current_frame(), &mut created)?;

        self.inner
            .instances
            .borrow_mut()
            .extend(created.iter().cloned());
        for instance in &created {
            instance.commit_mount()?;
        }
        self.inner.flush()?;

        Ok(created
            .iter()
            .map(|instance| ViewHandle {
                instance: Rc::clone(instance),
            })
            .collect())
    }

    fn build(
        &self,
        element: Element,
        frame: Option<Rc<Frame>>,
        created: &mut Vec<Rc<Instance>>,
    ) -> Result<()> {
        match element {
            Element::Provide { value, children } => {
                if let Some(store) = value.downcast_ref::<Store>() {
                    self.inner.track(store);
                }
                let frame = Some(Frame::push(frame, value));
                for child in children {
                    self.build(child, frame.clone(), created)?;
                }
            }
            Element::Fragment(children) => {
                for child in children {
                    self.build(child, frame.clone(), created)?;
                }
            }
            Element::Component { component, props } => {
                let id = self.inner.next_id.get();
                self.inner.next_id.set(id + 1);

                let instance = Rc::new(Instance {
                    id,
                    name: component.name(),
                    view: RefCell::new(None),
                    props: RefCell::new(props.clone()),
                    slots: RefCell::new(Vec::new()),
                    effects: RefCell::new(Vec::new()),
                    cleanups: RefCell::new(Vec::new()),
                    frame,
                    output: RefCell::new(Node::new()),
                    renders: Cell::new(0),
                    mounted: Cell::new(false),
                    root: Rc::downgrade(&self.inner),
                });

                let updater = instance.updater();
                let view = context::with_frame(instance.frame.clone(), || {
                    component.construct(&props, updater)
                })?;
                *instance.view.borrow_mut() = Some(view);

                instance.render()?;
                created.push(instance);
            }
        }
        Ok(())
    }

    /// Run `f`, then drive deferred actions of provided stores and render
    /// everything that was scheduled.
    pub fn act<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        let result = f();
        self.inner.flush()?;
        Ok(result)
    }

    /// Drive deferred actions of provided stores, then render every
    /// component with a pending update.
    pub fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    /// Concatenated output of all mounted components.
    pub fn text(&self) -> String {
        self.inner
            .instances
            .borrow()
            .iter()
            .filter(|instance| instance.mounted.get())
            .map(|instance| instance.output.borrow().clone())
            .collect()
    }

    /// Unmount every component.
    pub fn unmount(&self) {
        let instances = std::mem::take(&mut *self.inner.instances.borrow_mut());
        self.inner.dirty.borrow_mut().clear();
        for instance in instances {
            instance.unmount();
        }
    }
}

impl Default for Root {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Handle to one mounted component.
#[derive(Clone)]
pub struct ViewHandle {
    instance: Rc<Instance>,
}

impl ViewHandle {
    /// Hand the component new props from its parent and render it.
    pub fn set_props(&self, props: Props) -> Result<()> {
        let instance = &self.instance;
        if !instance.mounted.get() {
            return Ok(());
        }
        *instance.props.borrow_mut() = props.clone();
        if let Some(view) = instance.view.borrow_mut().as_mut() {
            view.receive_props(&props)?;
        }
        match instance.root.upgrade() {
            Some(root) => {
                root.enqueue(instance.id);
                root.flush()
            }
            None => Ok(()),
        }
    }

    /// Unmount just this component.
    pub fn unmount(&self) {
        if let Some(root) = self.instance.root.upgrade() {
            root.remove(self.instance.id);
        }
        self.instance.unmount();
    }

    /// How many times the component has rendered.
    pub fn render_count(&self) -> usize {
        self.instance.renders.get()
    }

    /// The component's last rendered output.
    pub fn output(&self) -> Node {
        self.instance.output.borrow().clone()
    }

    /// Whether the component is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.instance.mounted.get()
    }
}

impl fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewHandle")
            .field("mounted", &self.is_mounted())
            .field("renders", &self.render_count())
            .finish()
    }
}
