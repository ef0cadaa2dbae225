//! Termination triggers
//!
//! External stop conditions beyond the budget: a caller-held cancel
//! handle, or any custom trigger. Like the budget, triggers are polled at
//! iteration boundaries only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A stop condition polled between iterations
pub trait TerminationTrigger: std::fmt::Debug + Send + Sync {
    fn should_terminate(&self) -> bool;
}

/// Trigger flipped from outside the search (another thread, a signal
/// handler). Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl TerminationTrigger for CancelHandle {
    fn should_terminate(&self) -> bool {
        self.is_cancelled()
    }
}

/// Polls a set of triggers
#[derive(Debug, Default)]
pub struct TerminationManager {
    triggers: Vec<Box<dyn TerminationTrigger>>,
}

impl TerminationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trigger(&mut self, trigger: Box<dyn TerminationTrigger>) {
        self.triggers.push(trigger);
    }

    pub fn is_terminated(&self) -> bool {
        self.triggers.iter().any(|t| t.should_terminate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manager_never_terminates() {
        assert!(!TerminationManager::new().is_terminated());
    }

    #[test]
    fn cancel_handle_terminates_after_cancel() {
        let handle = CancelHandle::new();
        let mut manager = TerminationManager::new();
        manager.add_trigger(Box::new(handle.clone()));
        assert!(!manager.is_terminated());
        handle.cancel();
        assert!(manager.is_terminated());
    }

    #[test]
    fn any_tripped_trigger_terminates() {
        #[derive(Debug)]
        struct Always;
        impl TerminationTrigger for Always {
            fn should_terminate(&self) -> bool {
                true
            }
        }
        let mut manager = TerminationManager::new();
        manager.add_trigger(Box::new(CancelHandle::new()));
        manager.add_trigger(Box::new(Always));
        assert!(manager.is_terminated());
    }
}
