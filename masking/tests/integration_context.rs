//! Task-local activation under the tokio runtime.

#![cfg(all(feature = "tokio", feature = "algorithms"))]

use std::{collections::HashSet, sync::Arc, time::Duration};

use masking::{ActivationContext, Mask, MaskingEngine, PhoneCover};
use pretty_assertions::assert_eq;

#[derive(Clone, Mask)]
struct Caller {
    #[mask(PhoneCover)]
    phone: String,
}

fn caller() -> Caller {
    Caller {
        phone: "13812345678".into(),
    }
}

#[tokio::test]
async fn test_interleaved_tasks_keep_their_own_state() {
    let masked = ActivationContext::scope_async(async {
        ActivationContext::add_include_field("phone");
        tokio::task::yield_now().await;
        let fields = ActivationContext::include_fields();
        ActivationContext::stop();
        fields
    });
    let plain = ActivationContext::scope_async(async {
        tokio::task::yield_now().await;
        let active = ActivationContext::is_active();
        tokio::task::yield_now().await;
        active
    });

    let (fields, active) = tokio::join!(masked, plain);

    assert_eq!(fields, HashSet::from(["phone".to_string()]));
    assert!(!active);
}

#[tokio::test]
async fn test_task_scope_hides_thread_state() {
    ActivationContext::start();

    let inside = ActivationContext::scope_async(async { ActivationContext::is_active() }).await;

    assert!(!inside);
    assert!(ActivationContext::is_active());
    ActivationContext::stop();
}

#[tokio::test]
async fn test_task_state_ends_with_the_scope() {
    ActivationContext::scope_async(async {
        ActivationContext::start();
        tokio::task::yield_now().await;
        assert!(ActivationContext::is_active());
    })
    .await;

    assert!(!ActivationContext::is_active());
    let again = ActivationContext::scope_async(async { ActivationContext::is_active() }).await;
    assert!(!again);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_tasks_redact_per_their_own_context() {
    let engine = Arc::new(MaskingEngine::new());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(ActivationContext::scope_async(async move {
                let enabled = i % 2 == 0;
                if enabled {
                    ActivationContext::start();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;

                let mut value = caller();
                let phone = engine
                    .redact_if_active(&mut value)
                    .map(|value| value.phone.clone());
                ActivationContext::stop();
                (enabled, phone)
            }))
        })
        .collect();

    for handle in handles {
        let (enabled, phone) = handle.await.unwrap();
        let phone = phone.unwrap();
        if enabled {
            assert_eq!(phone, "138****5678");
        } else {
            assert_eq!(phone, "13812345678");
        }
    }
}

#[tokio::test]
async fn test_guards_inside_a_task_scope_restore_task_state() {
    let seen = ActivationContext::scope_async(async {
        let before = ActivationContext::is_active();
        let during = ActivationContext::scope(ActivationContext::is_active);
        let after = ActivationContext::is_active();
        (before, during, after)
    })
    .await;

    assert_eq!(seen, (false, true, false));
}
