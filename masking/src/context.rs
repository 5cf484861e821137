//! Per-unit-of-work activation state.
//!
//! Each thread carries its own state. With the `tokio` feature, a future run
//! through [`ActivationContext::scope_async`] carries a task-local state
//! instead, so tasks sharing a worker thread stay isolated; inside such a
//! scope every operation addresses the task's state.

use std::{cell::RefCell, collections::HashSet, marker::PhantomData};

use tracing::trace;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ActivationState {
    include_fields: HashSet<String>,
}

type Slot = RefCell<Option<ActivationState>>;

thread_local! {
    static THREAD_STATE: Slot = const { RefCell::new(None) };
}

#[cfg(feature = "tokio")]
tokio::task_local! {
    static TASK_STATE: Slot;
}

#[cfg(feature = "tokio")]
fn with_state<R>(f: impl FnOnce(&mut Option<ActivationState>) -> R) -> R {
    if TASK_STATE.try_with(|_| ()).is_ok() {
        TASK_STATE.with(|slot| f(&mut slot.borrow_mut()))
    } else {
        THREAD_STATE.with(|slot| f(&mut slot.borrow_mut()))
    }
}

#[cfg(not(feature = "tokio"))]
fn with_state<R>(f: impl FnOnce(&mut Option<ActivationState>) -> R) -> R {
    THREAD_STATE.with(|slot| f(&mut slot.borrow_mut()))
}

/// On/off switch for masking, local to the current unit of work.
///
/// The state is either inactive (no state at all) or active with a possibly
/// empty set of include fields. [`stop`](Self::stop) must run before the unit
/// of work ends; prefer [`enter`](Self::enter) or [`scope`](Self::scope),
/// which stop on every exit path.
#[derive(Clone, Copy, Debug)]
pub struct ActivationContext;

impl ActivationContext {
    /// Activates masking. Already registered include fields are kept.
    pub fn start() {
        with_state(|state| {
            state.get_or_insert_with(ActivationState::default);
        });
    }

    /// Deactivates masking and drops all state. Safe when never started.
    pub fn stop() {
        with_state(|state| {
            if state.take().is_some() {
                trace!("activation context stopped");
            }
        });
    }

    pub fn is_active() -> bool {
        with_state(|state| state.is_some())
    }

    /// Adds a field name to the include list, activating masking if needed.
    pub fn add_include_field(name: impl Into<String>) {
        let name = name.into();
        with_state(|state| {
            state
                .get_or_insert_with(ActivationState::default)
                .include_fields
                .insert(name);
        });
    }

    /// The include list, empty when inactive.
    pub fn include_fields() -> HashSet<String> {
        with_state(|state| {
            state
                .as_ref()
                .map(|state| state.include_fields.clone())
                .unwrap_or_default()
        })
    }

    /// Activates masking until the returned guard is dropped.
    ///
    /// Dropping the guard restores the state seen at `enter`, which for an
    /// outermost guard means stopping.
    #[must_use = "the context is stopped again as soon as the guard is dropped"]
    pub fn enter() -> ActivationGuard {
        let previous = with_state(|state| state.clone());
        Self::start();
        ActivationGuard {
            previous,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with masking active.
    pub fn scope<R>(f: impl FnOnce() -> R) -> R {
        let _guard = Self::enter();
        f()
    }

    /// Runs `future` with its own, initially inactive, task-local context.
    #[cfg(feature = "tokio")]
    pub async fn scope_async<F>(future: F) -> F::Output
    where
        F: std::future::Future,
    {
        TASK_STATE.scope(RefCell::new(None), future).await
    }
}

/// Restores the activation state when dropped.
///
/// Not `Send`: it restores the state of the thread (or task) it was created on.
#[derive(Debug)]
pub struct ActivationGuard {
    previous: Option<ActivationState>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        with_state(|state| *state = previous);
    }
}
