//! Bound state adapter: a reactive value holder wired to the registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::registry::{Context, ModalIdentity, ModalRegistry};
use crate::value::ModalValue;
use crate::wakeup::{WakeupHandle, WakeupSender};

/// A modal-state field bound to a [`ModalRegistry`].
///
/// Holds a boolean or optional value with interior mutability, cheap to
/// clone and safe to move into async tasks. Writes go through [`set`],
/// which runs the arbitration protocol instead of committing directly:
/// a truthy write becomes an open request and only lands once the registry
/// grants it, a falsy write closes and lands immediately.
///
/// Each field mints one identity at construction, stable for its lifetime.
///
/// # Example
///
/// ```ignore
/// let registry = ModalRegistry::new();
/// let settings = ModalState::new(&registry, false);
/// let picker: ModalState<Option<Item>> = ModalState::new(&registry, None);
///
/// settings.set(true);              // granted, settings.get() == true
/// picker.set(Some(item));          // preempts settings: it resets to
///                                  // false, picker lands after the delay
/// ```
///
/// [`set`]: ModalState::set
pub struct ModalState<V> {
    registry: ModalRegistry,
    identity: ModalIdentity,
    context: Context,
    value: Arc<RwLock<V>>,
    dirty: Arc<AtomicBool>,
    wakeup: WakeupHandle,
}

impl<V> ModalState<V>
where
    V: ModalValue + Clone + Send + Sync + 'static,
{
    /// Create a field on the shared context.
    pub fn new(registry: &ModalRegistry, initial: V) -> Self {
        Self::with_context(registry, initial, Context::shared())
    }

    /// Create a field on a specific context.
    pub fn with_context(registry: &ModalRegistry, initial: V, context: impl Into<Context>) -> Self {
        Self {
            registry: registry.clone(),
            identity: ModalIdentity::new(),
            context: context.into(),
            value: Arc::new(RwLock::new(initial)),
            dirty: Arc::new(AtomicBool::new(false)),
            wakeup: WakeupHandle::new(),
        }
    }

    /// This field's identity.
    pub fn identity(&self) -> ModalIdentity {
        self.identity
    }

    /// The context this field presents on.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> V {
        self.value
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Assign a new value, running the write contract.
    ///
    /// Truthy: requests the modal slot; the value is committed by the
    /// registry's completion once granted (synchronously when the context
    /// is free). If this field is later preempted, the value resets to
    /// [`ModalValue::closed`] and observers are notified.
    ///
    /// Falsy: releases the slot and commits immediately. Closing never
    /// incurs the grant delay.
    pub fn set(&self, new_value: V) {
        if new_value.is_open() {
            log::trace!(
                "field {} requesting modal on context {}",
                self.identity,
                self.context
            );
            let close = {
                let value = Arc::clone(&self.value);
                let dirty = Arc::clone(&self.dirty);
                let wakeup = self.wakeup.clone();
                move || {
                    commit(&value, V::closed());
                    dirty.store(true, Ordering::SeqCst);
                    wakeup.send();
                }
            };
            let completion = {
                let value = Arc::clone(&self.value);
                let dirty = Arc::clone(&self.dirty);
                let wakeup = self.wakeup.clone();
                move || {
                    commit(&value, new_value);
                    dirty.store(true, Ordering::SeqCst);
                    wakeup.send();
                }
            };
            self.registry
                .open_modal(self.identity, self.context.clone(), close, completion);
        } else {
            self.registry.close_modal(self.identity, &self.context);
            commit(&self.value, new_value);
            self.dirty.store(true, Ordering::SeqCst);
            self.wakeup.send();
        }
    }

    /// Check if the value changed since the last render.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    /// Install a wakeup sender so commits notify the render loop.
    pub fn install_wakeup(&self, sender: WakeupSender) {
        self.wakeup.install(sender);
    }
}

impl<V> Clone for ModalState<V> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            identity: self.identity,
            context: self.context.clone(),
            value: Arc::clone(&self.value),
            dirty: Arc::clone(&self.dirty),
            wakeup: self.wakeup.clone(),
        }
    }
}

fn commit<V>(slot: &Arc<RwLock<V>>, value: V) {
    match slot.write() {
        Ok(mut guard) => *guard = value,
        Err(poisoned) => *poisoned.into_inner() = value,
    }
}
