use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::device::{DeviceIdentity, normalize_address};
use crate::error::CatalogError;

type CatalogObserver = Box<dyn Fn(&[DeviceIdentity]) + Send + Sync>;

/// Identifies one scan request. Only the newest ticket may replace the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScanTicket(u64);

struct CatalogState {
    entries: Arc<[DeviceIdentity]>,
    latest_ticket: u64,
}

/// Deduplicated, display-sorted list of discovered devices backing the picker.
///
/// The list is swapped wholesale on every replacement, so a [`snapshot`]
/// always sees either the old or the new content.
///
/// [`snapshot`]: DeviceCatalog::snapshot
pub struct DeviceCatalog {
    state: Mutex<CatalogState>,
    observers: Mutex<Vec<CatalogObserver>>,
}

impl DeviceCatalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                entries: Arc::from(Vec::new()),
                latest_ticket: 0,
            }),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Replace the whole catalog. The first occurrence of an address wins.
    pub fn replace_all<I>(&self, devices: I)
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        self.install(None, Self::normalize(devices));
    }

    /// Start a scan. Completing an older ticket after this one was issued is a no-op.
    pub fn begin_scan(&self) -> ScanTicket {
        let mut state = self.lock_state();
        state.latest_ticket += 1;
        ScanTicket(state.latest_ticket)
    }

    /// Apply a scan result if no newer scan has been started since `ticket`.
    /// Returns whether the catalog was replaced.
    pub fn complete_scan<I>(&self, ticket: ScanTicket, devices: I) -> bool
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        self.install(Some(ticket), Self::normalize(devices))
    }

    pub fn get(&self, index: usize) -> Result<DeviceIdentity, CatalogError> {
        let entries = self.snapshot();
        entries
            .get(index)
            .cloned()
            .ok_or(CatalogError::IndexOutOfRange {
                index,
                count: entries.len(),
            })
    }

    pub fn count(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn snapshot(&self) -> Arc<[DeviceIdentity]> {
        Arc::clone(&self.lock_state().entries)
    }

    /// Index of the device with `address`, compared in normalized form.
    pub fn position_of(&self, address: &str) -> Option<usize> {
        let address = normalize_address(address);
        self.snapshot().iter().position(|d| d.address() == address)
    }

    /// Register an observer called with the new content after each replacement.
    ///
    /// Observers may read the catalog but must not subscribe or replace it.
    pub fn subscribe(&self, observer: CatalogObserver) {
        self.lock_observers().push(observer);
    }

    fn normalize<I>(devices: I) -> Arc<[DeviceIdentity]>
    where
        I: IntoIterator<Item = DeviceIdentity>,
    {
        let mut seen = HashSet::new();
        let mut unique: Vec<DeviceIdentity> = devices
            .into_iter()
            .filter(|d| seen.insert(d.address().to_string()))
            .collect();
        unique.sort_by(|a, b| a.display_cmp(b));
        Arc::from(unique)
    }

    // The observer lock is held from before the write until every callback
    // returns, so callbacks run in the same order as the writes.
    fn install(&self, ticket: Option<ScanTicket>, entries: Arc<[DeviceIdentity]>) -> bool {
        let observers = self.lock_observers();
        {
            let mut state = self.lock_state();
            if let Some(ticket) = ticket {
                if ticket.0 != state.latest_ticket {
                    debug!(
                        "Discarding superseded scan result (ticket {}, latest {})",
                        ticket.0, state.latest_ticket
                    );
                    return false;
                }
            }
            state.entries = Arc::clone(&entries);
        }

        debug!("Catalog replaced with {} devices", entries.len());
        for observer in observers.iter() {
            observer(&entries);
        }
        true
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<CatalogObserver>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_state(&self) -> MutexGuard<'_, CatalogState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}
