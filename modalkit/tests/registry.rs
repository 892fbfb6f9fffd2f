//! Tests for the arbitration protocol.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use modalkit::{Context, MODAL_CLOSE_DELAY, ModalIdentity, ModalRegistry};

fn flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn raise(flag: &Arc<AtomicBool>) -> impl Fn() + Send + Sync + 'static {
    let flag = Arc::clone(flag);
    move || flag.store(true, Ordering::SeqCst)
}

fn up(flag: &Arc<AtomicBool>) -> bool {
    flag.load(Ordering::SeqCst)
}

/// Let the deferred grant task register its timer, elapse the close delay,
/// then let the task run to completion.
async fn run_close_delay() {
    tokio::task::yield_now().await;
    tokio::time::advance(MODAL_CLOSE_DELAY).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}

#[test]
fn test_uncontended_open_grants_synchronously() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();

    let closed = flag();
    let completed = flag();
    registry.open_modal(a, ctx.clone(), raise(&closed), raise(&completed));

    assert!(up(&completed));
    assert!(!up(&closed));
    assert_eq!(registry.presented(&ctx), Some(a));
}

#[test]
fn test_distinct_contexts_present_independently() {
    let registry = ModalRegistry::new();
    let left = Context::from("left");
    let right = Context::from("right");
    let a = ModalIdentity::new();
    let b = ModalIdentity::new();

    let a_completed = flag();
    let b_completed = flag();
    registry.open_modal(a, left.clone(), || {}, raise(&a_completed));
    registry.open_modal(b, right.clone(), || {}, raise(&b_completed));

    assert!(up(&a_completed));
    assert!(up(&b_completed));
    assert_eq!(registry.presented(&left), Some(a));
    assert_eq!(registry.presented(&right), Some(b));
}

#[test]
fn test_stale_close_is_noop() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();
    let stale = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});
    registry.close_modal(stale, &ctx);

    assert_eq!(registry.presented(&ctx), Some(a));
}

#[test]
fn test_close_then_reopen_grants_synchronously() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();
    let b = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});
    registry.close_modal(a, &ctx);
    assert_eq!(registry.presented(&ctx), None);

    let b_completed = flag();
    registry.open_modal(b, ctx.clone(), || {}, raise(&b_completed));
    assert!(up(&b_completed));
    assert_eq!(registry.presented(&ctx), Some(b));
}

#[test]
fn test_close_is_idempotent() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});
    registry.close_modal(a, &ctx);
    registry.close_modal(a, &ctx);

    assert_eq!(registry.presented(&ctx), None);
}

#[test]
fn test_clones_share_the_slot_table() {
    let registry = ModalRegistry::new();
    let handle = registry.clone();
    let ctx = Context::shared();
    let a = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});
    assert_eq!(handle.presented(&ctx), Some(a));

    handle.close_modal(a, &ctx);
    assert_eq!(registry.presented(&ctx), None);
}

#[tokio::test(start_paused = true)]
async fn test_preemption_defers_grant() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();
    let b = ModalIdentity::new();

    let a_closed = flag();
    registry.open_modal(a, ctx.clone(), raise(&a_closed), || {});
    assert_eq!(registry.presented(&ctx), Some(a));

    let b_completed = flag();
    registry.open_modal(b, ctx.clone(), || {}, raise(&b_completed));

    // The occupant is told to dismiss during the call itself, but the new
    // grant waits out the close delay.
    assert!(up(&a_closed));
    assert!(!up(&b_completed));
    assert_eq!(registry.presented(&ctx), Some(a));

    tokio::task::yield_now().await;
    assert!(!up(&b_completed));

    tokio::time::advance(MODAL_CLOSE_DELAY).await;
    tokio::task::yield_now().await;

    assert!(up(&b_completed));
    assert_eq!(registry.presented(&ctx), Some(b));
}

#[tokio::test(start_paused = true)]
async fn test_later_open_supersedes_pending_grant() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();
    let b = ModalIdentity::new();
    let c = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});

    let b_closed = flag();
    let b_completed = flag();
    registry.open_modal(b, ctx.clone(), raise(&b_closed), raise(&b_completed));

    let c_completed = flag();
    registry.open_modal(c, ctx.clone(), || {}, raise(&c_completed));

    // B lost its turn before ever being presented: its close callback
    // fires so its field resets, and its completion never will.
    assert!(up(&b_closed));
    assert!(!up(&b_completed));

    run_close_delay().await;

    assert!(up(&c_completed));
    assert!(!up(&b_completed));
    assert_eq!(registry.presented(&ctx), Some(c));

    // B's stale timer must not clobber the grant.
    tokio::task::yield_now().await;
    assert_eq!(registry.presented(&ctx), Some(c));
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_grant() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();
    let b = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});

    let b_completed = flag();
    registry.open_modal(b, ctx.clone(), || {}, raise(&b_completed));
    registry.close_modal(b, &ctx);

    run_close_delay().await;

    // The field was toggled off before the grant applied; presenting
    // anyway would show a modal the user already dismissed.
    assert!(!up(&b_completed));
    assert_eq!(registry.presented(&ctx), Some(a));
}

#[tokio::test(start_paused = true)]
async fn test_dropped_registry_skips_deferred_grant() {
    let registry = ModalRegistry::new();
    let ctx = Context::shared();
    let a = ModalIdentity::new();
    let b = ModalIdentity::new();

    registry.open_modal(a, ctx.clone(), || {}, || {});

    let b_completed = flag();
    registry.open_modal(b, ctx, || {}, raise(&b_completed));
    drop(registry);

    run_close_delay().await;

    assert!(!up(&b_completed));
}

#[tokio::test(start_paused = true)]
async fn test_at_most_one_occupant_through_interleavings() {
    let registry = ModalRegistry::new();
    let ctx = Context::from("slot");

    let mut granted = Vec::new();
    for _ in 0..4 {
        let id = ModalIdentity::new();
        granted.push(id);
        registry.open_modal(id, ctx.clone(), || {}, || {});
        // At every observation point the slot holds at most one identity,
        // and never one we did not request.
        if let Some(current) = registry.presented(&ctx) {
            assert!(granted.contains(&current));
        }
        run_close_delay().await;
        assert_eq!(registry.presented(&ctx), Some(id));
    }
}
