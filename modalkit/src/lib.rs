//! Exclusive modal presentation coordination for reactive UIs.
//!
//! Many independent pieces of state can each claim "a modal should be
//! shown", but a presentation host can only display one modal per logical
//! slot at a time. `modalkit` arbitrates: a [`ModalRegistry`] serializes
//! competing open requests per [`Context`], tearing down the current
//! occupant before granting the next one, and [`ModalState`] binds a
//! boolean or optional value to that protocol so the UI layer only ever
//! renders what was actually granted.

pub mod registry;
pub mod state;
pub mod value;
pub mod wakeup;

pub use registry::{Context, MODAL_CLOSE_DELAY, ModalIdentity, ModalRegistry};
pub use state::ModalState;
pub use value::ModalValue;
pub use wakeup::{WakeupHandle, WakeupReceiver, WakeupSender};
