use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A type-erased value handed down a subtree.
#[derive(Clone)]
pub struct ContextValue {
    type_id: TypeId,
    value: Rc<dyn Any>,
}

impl ContextValue {
    /// Wrap `value` for [`Element::Provide`](super::Element::Provide).
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            value: Rc::new(value),
        }
    }

    /// The provided value, if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextValue")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

/// One link in the chain of provided values, innermost first.
pub(crate) struct Frame {
    value: ContextValue,
    parent: Option<Rc<Frame>>,
}

impl Frame {
    pub(crate) fn push(parent: Option<Rc<Frame>>, value: ContextValue) -> Rc<Frame> {
        Rc::new(Frame { value, parent })
    }

    fn lookup<T: Clone + 'static>(mut frame: Option<&Rc<Frame>>) -> Option<T> {
        let wanted = TypeId::of::<T>();
        while let Some(current) = frame {
            if current.value.type_id == wanted {
                return current.value.value.downcast_ref::<T>().cloned();
            }
            frame = current.parent.as_ref();
        }
        None
    }
}

// Thread-local stack of active context chains. The top entry is what hooks see.
thread_local! {
    static FRAME_STACK: RefCell<Vec<Option<Rc<Frame>>>> = const { RefCell::new(Vec::new()) };
}

/// The context chain currently in effect.
pub(crate) fn current_frame() -> Option<Rc<Frame>> {
    FRAME_STACK.with(|stack| stack.borrow().last().cloned().flatten())
}

/// Run `f` with `frame` as the active context chain.
pub(crate) fn with_frame<F, R>(frame: Option<Rc<Frame>>, f: F) -> R
where
    F: FnOnce() -> R,
{
    FRAME_STACK.with(|stack| {
        stack.borrow_mut().push(frame);
    });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    FRAME_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

/// Run `f` with `value` provided on top of the current context.
///
/// Useful for calling context-reading code outside a mounted tree.
///
/// ```
/// use tincan_connect::runtime::{provide_context, use_context};
///
/// let name = provide_context(String::from("outer"), || use_context::<String>());
/// assert_eq!(name.as_deref(), Some("outer"));
/// assert_eq!(use_context::<String>(), None);
/// ```
pub fn provide_context<T, F, R>(value: T, f: F) -> R
where
    T: 'static,
    F: FnOnce() -> R,
{
    let frame = Frame::push(current_frame(), ContextValue::new(value));
    with_frame(Some(frame), f)
}

/// Read the nearest provided value of type `T`.
pub fn use_context<T: Clone + 'static>() -> Option<T> {
    Frame::lookup(current_frame().as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_value_wins() {
        provide_context(1u32, || {
            assert_eq!(use_context::<u32>(), Some(1));
            provide_context(2u32, || {
                assert_eq!(use_context::<u32>(), Some(2));
            });
            assert_eq!(use_context::<u32>(), Some(1));
        });
        assert_eq!(use_context::<u32>(), None);
    }

    #[test]
    fn lookup_skips_other_types() {
        provide_context(7u32, || {
            provide_context("inner", || {
                assert_eq!(use_context::<u32>(), Some(7));
                assert_eq!(use_context::<&str>(), Some("inner"));
            });
        });
    }

    #[test]
    fn stack_is_restored_after_panic() {
        let caught = std::panic::catch_unwind(|| {
            provide_context(3u32, || panic!("boom"));
        });
        assert!(caught.is_err());
        assert_eq!(use_context::<u32>(), None);
    }
}
