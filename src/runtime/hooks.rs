use super::root::{Instance, Updater};
use crate::error::{Error, Result};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Cursor {
    instance: Rc<Instance>,
    next: usize,
}

// Stack of components currently rendering, with each one's next hook slot.
thread_local! {
    static RENDERING: RefCell<Vec<Cursor>> = const { RefCell::new(Vec::new()) };
}

/// Run `f` as the render of `instance`, so hooks resolve to its slots.
pub(crate) fn with_instance<F, R>(instance: Rc<Instance>, f: F) -> R
where
    F: FnOnce() -> R,
{
    RENDERING.with(|stack| {
        stack.borrow_mut().push(Cursor { instance, next: 0 });
    });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    RENDERING.with(|stack| {
        stack.borrow_mut().pop();
    });

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

fn rendering(hook: &'static str) -> Result<Rc<Instance>> {
    RENDERING.with(|stack| {
        stack
            .borrow()
            .last()
            .map(|cursor| Rc::clone(&cursor.instance))
            .ok_or(Error::OutsideRender { hook })
    })
}

/// Claim the next hook slot, creating it with `init` on first render.
fn slot<T: 'static>(hook: &'static str, init: impl FnOnce() -> T) -> Result<Rc<T>> {
    let (instance, index) = RENDERING.with(|stack| {
        let mut stack = stack.borrow_mut();
        let cursor = stack.last_mut().ok_or(Error::OutsideRender { hook })?;
        let index = cursor.next;
        cursor.next += 1;
        Ok::<_, Error>((Rc::clone(&cursor.instance), index))
    })?;

    let existing = instance.slots.borrow().get(index).cloned();
    match existing {
        Some(slot) => slot
            .downcast::<T>()
            .map_err(|_| Error::HookMismatch { index }),
        None => {
            let value = Rc::new(init());
            instance
                .slots
                .borrow_mut()
                .push(Rc::clone(&value) as Rc<dyn Any>);
            Ok(value)
        }
    }
}

/// A mutable cell kept across renders. Writing to it does not re-render.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> Result<Rc<RefCell<T>>> {
    slot("use_ref", || RefCell::new(init()))
}

/// A handle that forces the rendering component to render again.
pub fn use_force_update() -> Result<Updater> {
    rendering("use_force_update").map(|instance| instance.updater())
}

/// Run `effect` once, after the first render commits.
///
/// The cleanup it returns runs when the component unmounts.
pub fn use_effect_once<F, C>(effect: F) -> Result<()>
where
    F: FnOnce() -> C + 'static,
    C: FnOnce() + 'static,
{
    let scheduled = slot("use_effect_once", || Cell::new(false))?;
    if !scheduled.replace(true) {
        let instance = rendering("use_effect_once")?;
        instance
            .effects
            .borrow_mut()
            .push(Box::new(move || Box::new(effect()) as Box<dyn FnOnce()>));
    }
    Ok(())
}
