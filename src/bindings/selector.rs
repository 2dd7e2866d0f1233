use super::provider::use_store;
use crate::error::Result;
use crate::runtime::{use_effect_once, use_force_update, use_ref};
use crate::store::{SameValue, State};
use std::rc::Rc;
use tracing::trace;

/// Read a value derived from store state.
///
/// The selector runs on every render and on every store notification. The
/// component renders again only when the selected value is not
/// [`SameValue::same`] as the one from its last render.
///
/// ```
/// use tincan_connect::{provider, use_selector, Component, Props, Root, State, Store};
///
/// let store = Store::new(State::new().with("a", 1).with("b", 1));
/// let child = Component::function(|_| {
///     let a = use_selector(|state: &State| state.get("a").cloned().unwrap_or_default())?;
///     Ok(format!("A = {}", a.as_f64().unwrap_or_default()))
/// });
///
/// let root = Root::new();
/// let handles = root
///     .mount(provider(store.clone(), [child.element(Props::new())]))
///     .unwrap();
///
/// root.act(|| store.set_state(State::new().with("b", 2))).unwrap();
/// assert_eq!(handles[0].render_count(), 1);
///
/// root.act(|| store.set_state(State::new().with("a", 2))).unwrap();
/// assert_eq!(handles[0].render_count(), 2);
/// assert_eq!(root.text(), "A = 2");
/// ```
pub fn use_selector<T, F>(selector: F) -> Result<T>
where
    T: SameValue + Clone + 'static,
    F: Fn(&State) -> T + 'static,
{
    use_selector_with(selector, T::same)
}

/// Like [`use_selector`], with a custom comparison.
///
/// `equality` is called as `(previous, next)`; returning `true` means the
/// value is unchanged and no render happens.
pub fn use_selector_with<T, F, E>(selector: F, equality: E) -> Result<T>
where
    T: Clone + 'static,
    F: Fn(&State) -> T + 'static,
    E: Fn(&T, &T) -> bool + 'static,
{
    let store = use_store()?;
    let force_update = use_force_update()?;
    let latest = use_ref(|| None::<T>)?;

    let selected = store.read(&selector);
    *latest.borrow_mut() = Some(selected.clone());

    // Only the first render's closures are kept; later ones are dropped.
    let previous = Rc::clone(&latest);
    use_effect_once(move || {
        let subscription = store.watch(move |state| {
            let next = selector(state);
            let changed = match previous.borrow().as_ref() {
                Some(previous) => !equality(previous, &next),
                None => true,
            };
            if changed {
                trace!("selected value changed, scheduling render");
                force_update.schedule();
            }
        });
        move || drop(subscription)
    })?;

    Ok(selected)
}
