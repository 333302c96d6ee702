use super::config::{InteractionConfig, TestFlag};
use super::progress::ProgressReporter;
use crate::core::models::structure::Structure;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// A non-fatal quality problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub flag: TestFlag,
    pub message: String,
}

/// Run-level, append-only list of quality warnings.
///
/// Appends are serialized through a lock so concurrent evaluations may record warnings
/// safely.
#[derive(Debug, Default)]
pub struct WarningRegister {
    warnings: Mutex<Vec<Warning>>,
}

impl WarningRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&self, flag: TestFlag, message: impl Into<String>) {
        let message = message.into();
        warn!("[{}] {}", flag, message);
        self.lock().push(Warning { flag, message });
    }

    /// Drops every warning previously recorded for `flag`, e.g. before the check that
    /// raises it is run again.
    pub fn remove_warnings(&self, flag: TestFlag) {
        self.lock().retain(|warning| warning.flag != flag);
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.lock().clone()
    }

    pub fn has_warnings(&self, flag: TestFlag) -> bool {
        self.lock().iter().any(|warning| warning.flag == flag)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Warning>> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only inputs shared by every step of an interactions run.
#[derive(Clone, Copy)]
pub struct RunContext<'a> {
    pub structure: &'a Structure,
    pub config: &'a InteractionConfig,
    pub register: &'a WarningRegister,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        structure: &'a Structure,
        config: &'a InteractionConfig,
        register: &'a WarningRegister,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            structure,
            config,
            register,
            reporter,
        }
    }

    pub fn has_mercy(&self, flag: TestFlag) -> bool {
        self.config.has_mercy(flag)
    }
}
