// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording render backend with failure injection.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use beacon_render_port::{
    AnchorDisplay, BackendError, BackendStats, DisplayHandle, ProviderError, RenderBackend,
};

#[derive(Default)]
struct Log {
    creates: usize,
    updates: usize,
    removes: usize,
    cleanups: usize,
    failures: u64,
    next_handle: u64,
    live: BTreeMap<DisplayHandle, AnchorDisplay>,
    fail_creates: bool,
    fail_updates: bool,
    fail_removes: bool,
    fail_keys: HashSet<String>,
}

/// Shared view of everything a [`RecordingBackend`] was asked to do.
///
/// Counters count successful calls only; failed calls go to
/// [`BackendLog::failures`].
#[derive(Clone, Default)]
pub struct BackendLog {
    inner: Arc<Mutex<Log>>,
}

impl BackendLog {
    /// A fresh log.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Successful creates.
    pub fn creates(&self) -> usize {
        self.lock().creates
    }

    /// Successful updates.
    pub fn updates(&self) -> usize {
        self.lock().updates
    }

    /// Successful removes.
    pub fn removes(&self) -> usize {
        self.lock().removes
    }

    /// Calls to `cleanup`.
    pub fn cleanups(&self) -> usize {
        self.lock().cleanups
    }

    /// Failed calls of any kind.
    pub fn failures(&self) -> u64 {
        self.lock().failures
    }

    /// Number of displays currently alive.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Keys of the displays currently alive, sorted.
    pub fn live_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().live.values().map(|d| d.key.clone()).collect();
        keys.sort();
        keys
    }

    /// The live display with `key`, if any.
    pub fn display(&self, key: &str) -> Option<AnchorDisplay> {
        self.lock().live.values().find(|d| d.key == key).cloned()
    }

    /// Makes every create fail.
    pub fn set_fail_creates(&self, fail: bool) {
        self.lock().fail_creates = fail;
    }

    /// Makes every update fail.
    pub fn set_fail_updates(&self, fail: bool) {
        self.lock().fail_updates = fail;
    }

    /// Makes every remove fail.
    pub fn set_fail_removes(&self, fail: bool) {
        self.lock().fail_removes = fail;
    }

    /// Makes creates and updates of the display with `key` fail.
    pub fn fail_key(&self, key: &str) {
        self.lock().fail_keys.insert(key.to_owned());
    }

    /// Clears every injected failure.
    pub fn clear_failures(&self) {
        let mut log = self.lock();
        log.fail_creates = false;
        log.fail_updates = false;
        log.fail_removes = false;
        log.fail_keys.clear();
    }
}

/// [`RenderBackend`] that keeps displays in memory and records every call.
pub struct RecordingBackend {
    log: BackendLog,
    available: bool,
}

impl RecordingBackend {
    /// An available backend writing to `log`.
    pub fn new(log: BackendLog) -> Self {
        Self {
            log,
            available: true,
        }
    }

    /// A backend that reports itself unavailable.
    pub fn unavailable(log: BackendLog) -> Self {
        Self {
            log,
            available: false,
        }
    }

    /// Boxed, ready for `DisplayOrchestrator::new`.
    pub fn boxed(log: BackendLog) -> Option<Box<dyn RenderBackend>> {
        Some(Box::new(Self::new(log)))
    }
}

fn injected(what: &str) -> BackendError {
    BackendError::Provider(ProviderError::Rejected(format!("injected {what} failure")))
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&mut self, display: &AnchorDisplay) -> Result<DisplayHandle, BackendError> {
        let mut log = self.log.lock();
        if log.fail_creates || log.fail_keys.contains(&display.key) {
            log.failures += 1;
            return Err(injected("create"));
        }
        log.next_handle += 1;
        let handle = DisplayHandle(log.next_handle);
        log.live.insert(handle, display.clone());
        log.creates += 1;
        Ok(handle)
    }

    fn update(
        &mut self,
        handle: DisplayHandle,
        display: &AnchorDisplay,
    ) -> Result<(), BackendError> {
        let mut log = self.log.lock();
        if log.fail_updates || log.fail_keys.contains(&display.key) {
            log.failures += 1;
            return Err(injected("update"));
        }
        let Some(slot) = log.live.get_mut(&handle) else {
            log.failures += 1;
            return Err(BackendError::UnknownHandle(handle));
        };
        *slot = display.clone();
        log.updates += 1;
        Ok(())
    }

    fn remove(&mut self, handle: DisplayHandle) -> Result<(), BackendError> {
        let mut log = self.log.lock();
        if log.fail_removes {
            log.failures += 1;
            return Err(injected("remove"));
        }
        if log.live.remove(&handle).is_none() {
            log.failures += 1;
            return Err(BackendError::UnknownHandle(handle));
        }
        log.removes += 1;
        Ok(())
    }

    fn cleanup(&mut self) {
        let mut log = self.log.lock();
        log.cleanups += 1;
        log.live.clear();
    }

    fn statistics(&self) -> BackendStats {
        let log = self.log.lock();
        BackendStats {
            backend: "recording",
            live: log.live.len(),
            created: log.creates as u64,
            updated: log.updates as u64,
            removed: log.removes as u64,
            failures: log.failures,
        }
    }
}
