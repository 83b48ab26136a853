//! Owning-thread check for the invocation path.
//!
//! `&mut self` already rules out reentrancy; this catches the other half of the
//! audio-thread contract, an interpreter quietly migrating between threads
//! mid-stream. Debug builds only: release builds compile it to nothing.

#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
pub(crate) struct ThreadConfinement {
    #[cfg(debug_assertions)]
    owner: Option<ThreadId>,
}

impl ThreadConfinement {
    /// Claim the current thread on first use, assert it afterwards.
    #[inline]
    pub(crate) fn check(&mut self) {
        #[cfg(debug_assertions)]
        {
            let current = thread::current().id();
            match self.owner {
                Some(owner) => assert_eq!(
                    owner, current,
                    "interpreter invoked from a thread other than its owner"
                ),
                None => self.owner = Some(current),
            }
        }
    }

    /// Forget the owner so the next invocation may claim a new thread.
    #[inline]
    pub(crate) fn release(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.owner = None;
        }
    }
}
