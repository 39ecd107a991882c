//! Single-writer flags set from outside the control loop (signal handler,
//! mode input) and polled once per cycle.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::target::LockMode;

const NO_MODE: u8 = 0;

fn encode(mode: LockMode) -> u8 {
    match mode {
        LockMode::Peak => 1,
        LockMode::Null => 2,
        LockMode::QuadPlus => 3,
        LockMode::QuadMinus => 4,
    }
}

fn decode(v: u8) -> Option<LockMode> {
    match v {
        1 => Some(LockMode::Peak),
        2 => Some(LockMode::Null),
        3 => Some(LockMode::QuadPlus),
        4 => Some(LockMode::QuadMinus),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct ControlFlags {
    shutdown: AtomicBool,
    resweep: AtomicBool,
    pending_mode: AtomicU8,
}

impl ControlFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn request_resweep(&self) {
        self.resweep.store(true, Ordering::Relaxed);
    }

    /// Consume a pending re-sweep request.
    pub fn take_resweep(&self) -> bool {
        self.resweep.swap(false, Ordering::Relaxed)
    }

    pub fn request_mode(&self, mode: LockMode) {
        self.pending_mode.store(encode(mode), Ordering::Relaxed);
    }

    /// Consume a pending mode change. Only the latest request survives.
    pub fn take_mode(&self) -> Option<LockMode> {
        decode(self.pending_mode.swap(NO_MODE, Ordering::Relaxed))
    }
}
