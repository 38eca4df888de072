//! Mode flags port — read-only switches owned by the surrounding automation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait ModeFlags {
    /// State transitions and records happen, but no command is sent.
    fn dry_run(&self) -> bool;
    /// Short durations and sample delays, for testing on real hardware.
    fn quick_run(&self) -> bool;
    /// Runs are refused entirely.
    fn disabled(&self) -> bool;
    /// Daily runs are only planned while away mode is on.
    fn away_mode_enabled(&self) -> bool;
}

/// Flags held in shared atomics so the owner can flip them while the
/// sequencer holds a clone.
#[derive(Debug, Clone, Default)]
pub struct SharedModes {
    dry_run: Arc<AtomicBool>,
    quick_run: Arc<AtomicBool>,
    disabled: Arc<AtomicBool>,
    away_mode: Arc<AtomicBool>,
}

impl SharedModes {
    #[must_use]
    pub fn new(dry_run: bool, quick_run: bool, disabled: bool, away_mode: bool) -> Self {
        let modes = Self::default();
        modes.set_dry_run(dry_run);
        modes.set_quick_run(quick_run);
        modes.set_disabled(disabled);
        modes.set_away_mode(away_mode);
        modes
    }

    pub fn set_dry_run(&self, value: bool) {
        self.dry_run.store(value, Ordering::Relaxed);
    }

    pub fn set_quick_run(&self, value: bool) {
        self.quick_run.store(value, Ordering::Relaxed);
    }

    pub fn set_disabled(&self, value: bool) {
        self.disabled.store(value, Ordering::Relaxed);
    }

    pub fn set_away_mode(&self, value: bool) {
        self.away_mode.store(value, Ordering::Relaxed);
    }
}

impl ModeFlags for SharedModes {
    fn dry_run(&self) -> bool {
        self.dry_run.load(Ordering::Relaxed)
    }

    fn quick_run(&self) -> bool {
        self.quick_run.load(Ordering::Relaxed)
    }

    fn disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    fn away_mode_enabled(&self) -> bool {
        self.away_mode.load(Ordering::Relaxed)
    }
}
