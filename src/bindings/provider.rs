use crate::error::{Error, Result};
use crate::runtime::{use_context, Element};
use crate::store::Store;

/// Make `store` available to every hook and connected component in `children`.
pub fn provider(store: Store, children: impl IntoIterator<Item = Element>) -> Element {
    Element::provide(store, children)
}

/// The store provided by the nearest enclosing [`provider`].
pub fn use_store() -> Result<Store> {
    use_context::<Store>().ok_or(Error::MissingContext)
}
