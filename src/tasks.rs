//! Re-entrancy guard shared by the periodic tasks.
//!
//! A tick that finds the guard held is skipped instead of queued, so a slow
//! detector or upload never overlaps with the next invocation of the same task.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone, Default)]
pub struct TickGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one tick; releases the guard on drop.
#[derive(Debug)]
pub struct TickPermit {
    busy: Arc<AtomicBool>,
}

impl TickGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` if another invocation still holds the guard.
    pub fn try_begin(&self) -> Option<TickPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for TickPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected_while_permit_is_held() {
        let guard = TickGuard::new();
        let permit = guard.try_begin();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_begin().is_none());

        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_some());
    }

    #[test]
    fn clones_share_the_same_flag() {
        let guard = TickGuard::new();
        let other = guard.clone();
        let _permit = guard.try_begin().expect("first permit");
        assert!(other.try_begin().is_none());
    }
}
