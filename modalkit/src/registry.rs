//! Presentation registry and open/close arbitration.
//!
//! The registry maps each [`Context`] (a logical presentation slot) to at
//! most one presented modal. Opening into an empty slot grants
//! synchronously. Opening into an occupied slot first tells the occupant to
//! dismiss itself, then grants after [`MODAL_CLOSE_DELAY`] so the host can
//! finish the outgoing dismissal; presenting immediately would be dropped
//! or rendered broken by the host.
//!
//! Every grant decision is sequenced: a deferred grant applies only if it
//! is still the latest open request for its context, so a burst of
//! competing opens resolves to exactly one visible modal.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

/// Time the presentation host needs to finish dismissing the outgoing
/// modal before a replacement may be presented.
pub const MODAL_CLOSE_DELAY: Duration = Duration::from_millis(250);

/// Logical presentation slot key.
///
/// Fields sharing a context compete for the same modal slot; distinct
/// contexts present independently. The default is a single well-known
/// shared slot, so by default all modal-state fields compete globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context(Arc<str>);

impl Context {
    /// The well-known shared context, `"Shared"`.
    pub fn shared() -> Self {
        Self(Arc::from("Shared"))
    }

    /// The context key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::shared()
    }
}

impl From<&str> for Context {
    fn from(key: &str) -> Self {
        Self(Arc::from(key))
    }
}

impl From<String> for Context {
    fn from(key: String) -> Self {
        Self(Arc::from(key.as_str()))
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique token distinguishing one presentation from another.
///
/// A stale or superseded closer can never evict a newer modal because
/// close requests are validated against the stored identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalIdentity(Uuid);

impl ModalIdentity {
    /// Mint a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModalIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

type CloseFn = Arc<dyn Fn() + Send + Sync>;
type CompletionFn = Box<dyn FnOnce() + Send>;

/// What currently occupies a context.
struct PresentedModal {
    identity: ModalIdentity,
    close: CloseFn,
}

/// An open request waiting out the close delay.
struct PendingOpen {
    identity: ModalIdentity,
    seq: u64,
    close: CloseFn,
    completion: Option<CompletionFn>,
}

#[derive(Default)]
struct Slot {
    occupant: Option<PresentedModal>,
    pending: Option<PendingOpen>,
}

#[derive(Default)]
struct RegistryInner {
    slots: HashMap<Context, Slot>,
    next_seq: u64,
}

/// Arbitrates exclusive modal presentation per context.
///
/// Explicitly constructed and passed by handle; `Clone` shares the same
/// slot table, so every adapter bound to the same registry competes in the
/// same arbitration. Dropping the last handle invalidates any pending
/// deferred grants.
///
/// Operations are total: a stale close or a superseded open is a silent
/// no-op, not an error. The contended open path spawns a timer task, so it
/// must run within a tokio runtime.
#[derive(Clone, Default)]
pub struct ModalRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl ModalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request presentation of a modal on `context`.
    ///
    /// If the context is free the request is granted synchronously:
    /// `completion` runs before this method returns. Otherwise the current
    /// occupant's close callback is invoked (telling it to reset its bound
    /// value) and the grant is deferred by [`MODAL_CLOSE_DELAY`].
    ///
    /// Exactly one of `completion` or `close_callback` eventually fires
    /// for every call: `close_callback` fires instead of `completion` when
    /// the request is preempted, or superseded by a later open for the
    /// same context before its deferred grant applied.
    pub fn open_modal(
        &self,
        identity: ModalIdentity,
        context: Context,
        close_callback: impl Fn() + Send + Sync + 'static,
        completion: impl FnOnce() + Send + 'static,
    ) {
        let close: CloseFn = Arc::new(close_callback);
        let completion: CompletionFn = Box::new(completion);

        let mut inner = self.lock();
        inner.next_seq += 1;
        let seq = inner.next_seq;
        let slot = inner.slots.entry(context.clone()).or_default();

        if slot.occupant.is_none() && slot.pending.is_none() {
            slot.occupant = Some(PresentedModal { identity, close });
            drop(inner);
            log::debug!("modal {identity} granted immediately on context {context}");
            completion();
            return;
        }

        // Contended: the occupant must dismiss first, and an earlier open
        // still waiting out the delay loses its turn.
        let displaced = slot.occupant.as_ref().map(|m| Arc::clone(&m.close));
        let superseded = slot.pending.take();
        slot.pending = Some(PendingOpen {
            identity,
            seq,
            close: Arc::clone(&close),
            completion: Some(completion),
        });
        drop(inner);

        log::debug!(
            "context {context} occupied, deferring modal {identity} by {MODAL_CLOSE_DELAY:?}"
        );

        // Callbacks run with no lock held: the occupant's close callback
        // may re-enter via close_modal.
        if let Some(close) = displaced {
            close();
        }
        if let Some(pending) = superseded {
            log::debug!(
                "pending modal {} superseded on context {context}",
                pending.identity
            );
            (pending.close)();
        }

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(MODAL_CLOSE_DELAY).await;
            let Some(inner) = weak.upgrade() else {
                log::trace!("registry gone before deferred grant, skipping");
                return;
            };
            let completion = {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                let Some(slot) = inner.slots.get_mut(&context) else {
                    return;
                };
                let pending = match slot.pending.take() {
                    Some(p) if p.seq == seq => p,
                    other => {
                        // A later open or a matching close won the slot.
                        slot.pending = other;
                        log::trace!("deferred grant for modal {identity} no longer current");
                        return;
                    }
                };
                slot.occupant = Some(PresentedModal {
                    identity: pending.identity,
                    close: pending.close,
                });
                pending.completion
            };
            log::debug!("modal {identity} granted on context {context} after close delay");
            if let Some(completion) = completion {
                completion();
            }
        });
    }

    /// Dismiss the modal identified by `identity` on `context`.
    ///
    /// Removes the occupant only if its identity matches; also cancels a
    /// matching open still waiting out the close delay, so a field toggled
    /// off before its grant applied does not resurrect. Idempotent.
    pub fn close_modal(&self, identity: ModalIdentity, context: &Context) {
        let mut inner = self.lock();
        let Some(slot) = inner.slots.get_mut(context) else {
            return;
        };
        if slot.occupant.as_ref().is_some_and(|m| m.identity == identity) {
            slot.occupant = None;
            log::debug!("modal {identity} closed on context {context}");
        }
        if slot.pending.as_ref().is_some_and(|p| p.identity == identity) {
            slot.pending = None;
            log::debug!("pending modal {identity} cancelled on context {context}");
        }
        if slot.occupant.is_none() && slot.pending.is_none() {
            inner.slots.remove(context);
        }
    }

    /// Identity of the modal currently presented on `context`, if any.
    pub fn presented(&self, context: &Context) -> Option<ModalIdentity> {
        self.lock()
            .slots
            .get(context)
            .and_then(|slot| slot.occupant.as_ref())
            .map(|m| m.identity)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
