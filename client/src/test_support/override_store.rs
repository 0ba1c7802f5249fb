//! Override store and sleeper doubles.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::StatusOverrides;
use crate::domain::ports::{RefreshSleeper, StatusOverrideStore, StatusOverrideStoreError};

/// Sleeper that returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl RefreshSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records requested delays without waiting.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far.
    pub fn recorded(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RefreshSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        match self.0.lock() {
            Ok(mut entries) => entries.push(duration),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

/// In-memory store whose loads and saves can be made to fail.
#[derive(Default)]
pub struct FlakyOverrideStore {
    entries: Mutex<StatusOverrides>,
    fail_loads: bool,
    fail_saves: bool,
}

impl FlakyOverrideStore {
    /// Store seeded with `entries` that never fails.
    pub fn seeded(entries: StatusOverrides) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Make every `load` fail.
    #[must_use]
    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Make every `save` fail.
    #[must_use]
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Current contents, bypassing the failure switches.
    pub fn snapshot(&self) -> StatusOverrides {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("override store mutex"),
        }
    }
}

#[async_trait]
impl StatusOverrideStore for FlakyOverrideStore {
    async fn load(&self) -> Result<StatusOverrides, StatusOverrideStoreError> {
        if self.fail_loads {
            return Err(StatusOverrideStoreError::io("injected load failure"));
        }
        Ok(self.snapshot())
    }

    async fn save(&self, overrides: &StatusOverrides) -> Result<(), StatusOverrideStoreError> {
        if self.fail_saves {
            return Err(StatusOverrideStoreError::io("injected save failure"));
        }
        match self.entries.lock() {
            Ok(mut entries) => *entries = overrides.clone(),
            Err(_) => panic!("override store mutex"),
        }
        Ok(())
    }
}
