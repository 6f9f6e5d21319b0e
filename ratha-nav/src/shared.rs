//! Lock-free input state shared between an input source and a manual driver.

use std::sync::atomic::{AtomicBool, Ordering};

/// Held-key flags for a human-controlled agent.
///
/// Written by whatever captures input, read once per tick by
/// [`ManualDriver`](crate::navigation::ManualDriver).
#[derive(Debug, Default)]
pub struct SharedInput {
    pub throttle: AtomicBool,
    pub left: AtomicBool,
    pub right: AtomicBool,
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_throttle(&self, on: bool) {
        self.throttle.store(on, Ordering::Relaxed);
    }

    /// Set the turn direction: negative is left, positive is right, zero is straight.
    pub fn set_turn(&self, direction: i8) {
        self.left.store(direction < 0, Ordering::Relaxed);
        self.right.store(direction > 0, Ordering::Relaxed);
    }

    pub fn release_all(&self) {
        self.throttle.store(false, Ordering::Relaxed);
        self.left.store(false, Ordering::Relaxed);
        self.right.store(false, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            throttle: self.throttle.load(Ordering::Relaxed),
            left: self.left.load(Ordering::Relaxed),
            right: self.right.load(Ordering::Relaxed),
        }
    }

    /// Apply a single-letter key command.
    ///
    /// `w` throttle on, `s` throttle off, `a` steer left, `d` steer right,
    /// `x` straight, `q` release everything. Unknown keys are ignored and
    /// reported as `false`.
    pub fn apply_key(&self, key: char) -> bool {
        match key.to_ascii_lowercase() {
            'w' => self.set_throttle(true),
            's' => self.set_throttle(false),
            'a' => self.set_turn(-1),
            'd' => self.set_turn(1),
            'x' => self.set_turn(0),
            'q' => self.release_all(),
            _ => return false,
        }
        true
    }
}

/// One consistent read of [`SharedInput`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub throttle: bool,
    pub left: bool,
    pub right: bool,
}
