use std::path::Path;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{Result, StateStoreErr};
use crate::store::SectorStateStore;

static GLOBAL: StoreHandle = StoreHandle::new();

/// The store shared by the whole process.
pub fn global() -> &'static StoreHandle {
    &GLOBAL
}

/// Builds a store at most once and hands the same instance to every caller
/// afterwards.
#[derive(Debug, Default)]
pub struct StoreHandle {
    cell: OnceCell<Arc<SectorStateStore>>,
}

impl StoreHandle {
    pub const fn new() -> StoreHandle {
        StoreHandle {
            cell: OnceCell::new(),
        }
    }

    /// Loads the ledger at `path` unless a store already exists, in which
    /// case that store is returned and the file is not read again. Concurrent
    /// callers block until the first load finishes. A failed load leaves the
    /// handle uninitialized.
    pub fn initialize<P: AsRef<Path>>(&self, path: P) -> Result<Arc<SectorStateStore>> {
        let path = path.as_ref();

        let store = self
            .cell
            .get_or_try_init(|| SectorStateStore::load(path).map(Arc::new))?;

        if store.path() != path {
            warn!(
                "sector state store already initialized from {:?}, ignoring {:?}",
                store.path(),
                path
            );
        }

        Ok(store.clone())
    }

    /// Returns the store, or `Uninitialized` if no load has succeeded yet.
    pub fn get(&self) -> Result<Arc<SectorStateStore>> {
        self.cell.get().cloned().ok_or(StateStoreErr::Uninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
