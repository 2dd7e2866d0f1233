use thiserror::Error;

/// Errors raised by the bindings and the host runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A hook or connected component looked for a store and none was provided.
    #[error("Missing context. Ensure you've rendered a Provider.")]
    MissingContext,

    /// A hook was called while no component was rendering.
    #[error("`{hook}` called outside of a component render")]
    OutsideRender { hook: &'static str },

    /// Hook slot `index` was created with a different type on an earlier render.
    #[error("hook slot {index} changed type between renders")]
    HookMismatch { index: usize },

    /// Initial store state could not be built from the given input.
    #[error("invalid store state: {0}")]
    InvalidState(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
