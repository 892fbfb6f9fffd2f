//! Truthiness policy for bound modal values.
//!
//! This is the single place that decides what "the modal should be open"
//! means, so boolean and optional-payload fields share identical semantics.

/// A value type that can back a modal-state field.
///
/// The type decides statically how it maps onto the open/closed axis:
/// `bool` is open when `true`, `Option<T>` is open when it carries any
/// payload (`Some(false)` is still open).
pub trait ModalValue {
    /// Whether this value currently means "modal should be open".
    fn is_open(&self) -> bool;

    /// The value a field resets to when its modal is forced closed.
    fn closed() -> Self;
}

impl ModalValue for bool {
    fn is_open(&self) -> bool {
        *self
    }

    fn closed() -> Self {
        false
    }
}

impl<T> ModalValue for Option<T> {
    fn is_open(&self) -> bool {
        self.is_some()
    }

    fn closed() -> Self {
        None
    }
}
