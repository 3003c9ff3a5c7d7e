use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::error::{err_not_found, err_phase, Result, StateStoreErr};
use crate::helpers::{encode_ledger, load_ledger, write_ledger, LedgerFormat};
use crate::metadata::{SectorId, SectorRecord};
use crate::state::SectorTable;

/// The authoritative map from sector id to pipeline progress.
///
/// Every operation holds the table lock for its whole duration, except that
/// `persist` releases it before touching the file system. Persists are
/// serialized among themselves so an older snapshot never lands on disk
/// after a newer one.
#[derive(Debug)]
pub struct SectorStateStore {
    path: PathBuf,
    table: RwLock<SectorTable>,
    persist_lock: Mutex<()>,
}

impl SectorStateStore {
    /// Loads the ledger at `path`, accepting either the canonical or the
    /// legacy format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SectorStateStore> {
        let path = path.as_ref();
        let (table, format) = load_ledger(path)?;

        if format == LedgerFormat::Legacy {
            info!("{:?} will be rewritten in the canonical format on the next persist", path);
        }

        Ok(SectorStateStore::with_records(path, table))
    }

    /// A store over an already-built table. Nothing is read from `path`.
    pub fn with_records<P: Into<PathBuf>>(path: P, table: SectorTable) -> SectorStateStore {
        SectorStateStore {
            path: path.into(),
            table: RwLock::new(table),
            persist_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    pub fn contains(&self, sector_id: &SectorId) -> bool {
        self.table.read().contains(sector_id)
    }

    /// Returns a copy of the record for `sector_id`.
    pub fn get(&self, sector_id: &SectorId) -> Result<SectorRecord> {
        self.table
            .read()
            .get(sector_id)
            .cloned()
            .ok_or_else(|| err_not_found(*sector_id))
    }

    /// Adds the record for a sector entering the pipeline.
    pub fn insert(&self, record: SectorRecord) -> Result<()> {
        let mut table = self.table.write();

        if table.contains(&record.sector_id) {
            return Err(StateStoreErr::RecordAlreadyExists(record.sector_id));
        }

        debug!("insert {} at phase {}", record.sector_id, record.sector_working_phase);
        table.insert(record.sector_id, record);

        Ok(())
    }

    /// Replaces the stored record with `record`. The working phase must not
    /// change through this path; phase transitions belong to the scheduler.
    /// Nothing is written to disk.
    pub fn update(&self, record: SectorRecord) -> Result<()> {
        let mut table = self.table.write();

        let stored = table
            .get_mut(&record.sector_id)
            .ok_or_else(|| err_not_found(record.sector_id))?;

        if stored.sector_working_phase != record.sector_working_phase {
            error!(
                "{} SectorWorkingPhase from {} to {}",
                record.sector_id, stored.sector_working_phase, record.sector_working_phase
            );
            return Err(err_phase(
                record.sector_id,
                stored.sector_working_phase,
                record.sector_working_phase,
            ));
        }

        *stored = record;

        Ok(())
    }

    /// Writes the whole table to the ledger file in the canonical format,
    /// first dropping commit phase 1 output from every sector already handed
    /// to commit phase 2.
    pub fn persist(&self) -> Result<()> {
        let _persisting = self.persist_lock.lock();

        let (serialized, records, cleared) = {
            let mut table = self.table.write();
            let cleared = table.sanitize();
            (encode_ledger(&table)?, table.len(), cleared)
        };

        write_ledger(&self.path, &serialized)?;

        info!(
            "persisted {} sector records to {:?}, dropped {} commit phase 1 outputs",
            records, self.path, cleared
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::metadata::SectorWorkingPhase;
    use crate::task::TaskType;

    fn store_with(dir: &tempfile::TempDir, records: Vec<SectorRecord>) -> SectorStateStore {
        SectorStateStore::with_records(
            dir.path().join("state_data"),
            SectorTable::from_records(records),
        )
    }

    #[test]
    fn test_get_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let id = SectorId::new(7, 42);
        let store = store_with(&dir, vec![SectorRecord::new(id, SectorWorkingPhase(2))]);

        let mut record = store.get(&id).unwrap();
        record.p1_worker_address = "10.0.0.9:2345".to_string();
        record.current_seal_task.task_type = TaskType::PreCommit1;
        store.update(record.clone()).unwrap();

        assert_eq!(store.get(&id).unwrap(), record);
    }

    #[test]
    fn test_unknown_sector() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, vec![SectorRecord::new(SectorId::new(1, 1), SectorWorkingPhase(0))]);
        let missing = SectorId::new(1, 2);

        match store.get(&missing) {
            Err(StateStoreErr::RecordNotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected not found, got {:?}", other),
        }

        match store.update(SectorRecord::new(missing, SectorWorkingPhase(0))) {
            Err(StateStoreErr::RecordNotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected not found, got {:?}", other),
        }

        assert_eq!(store.len(), 1);
        assert!(!store.contains(&missing));
    }

    #[test]
    fn test_phase_change_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let id = SectorId::new(7, 42);
        let original = SectorRecord::new(id, SectorWorkingPhase(5));
        let store = store_with(&dir, vec![original.clone()]);

        let mut stale = original.clone();
        stale.sector_working_phase = SectorWorkingPhase(6);
        stale.c1_worker_address = "c1:1".to_string();

        match store.update(stale) {
            Err(StateStoreErr::PhaseInvariantViolation {
                sector_id,
                stored,
                attempted,
            }) => {
                assert_eq!(sector_id, id);
                assert_eq!(stored, SectorWorkingPhase(5));
                assert_eq!(attempted, SectorWorkingPhase(6));
            }
            other => panic!("expected phase violation, got {:?}", other),
        }

        assert_eq!(store.get(&id).unwrap(), original);
    }

    #[test]
    fn test_insert() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, vec![]);
        let record = SectorRecord::new(SectorId::new(3, 3), SectorWorkingPhase(0));

        assert!(store.is_empty());
        store.insert(record.clone()).unwrap();

        match store.insert(record.clone()) {
            Err(StateStoreErr::RecordAlreadyExists(id)) => assert_eq!(id, record.sector_id),
            other => panic!("expected duplicate, got {:?}", other),
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&record.sector_id).unwrap(), record);
    }

    #[test]
    fn test_persist_sanitizes_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let id = SectorId::new(7, 42);

        let mut record = SectorRecord::new(id, SectorWorkingPhase(5));
        record.current_seal_task.task_type = TaskType::Commit2;
        record.current_seal_task.commit1_out = vec![0xab; 37];
        let store = store_with(&dir, vec![record]);

        store.persist().unwrap();

        // the in-memory copy is sanitized along with the file
        assert!(store.get(&id).unwrap().current_seal_task.commit1_out.is_empty());

        let reloaded = SectorStateStore::load(store.path()).unwrap();
        let record = reloaded.get(&id).unwrap();
        assert_eq!(record.sector_working_phase, SectorWorkingPhase(5));
        assert_eq!(record.current_seal_task.commit1_out.len(), 0);
    }

    #[test]
    fn test_persist_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(
            &dir,
            (0..16)
                .map(|n| SectorRecord::new(SectorId::new(1000 + n % 3, n), SectorWorkingPhase(1)))
                .collect(),
        );

        store.persist().unwrap();
        let first = fs::read(store.path()).unwrap();
        store.persist().unwrap();
        let second = fs::read(store.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_persist_failure_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"a file, not a directory").unwrap();

        let store = SectorStateStore::with_records(blocker.join("state_data"), SectorTable::default());

        match store.persist() {
            Err(err @ StateStoreErr::PersistIo { .. }) => assert!(!err.is_fatal()),
            other => panic!("expected persist failure, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_updates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_with(
            &dir,
            (0..8)
                .map(|n| SectorRecord::new(SectorId::new(1, n), SectorWorkingPhase(3)))
                .collect(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                thread::spawn(move || {
                    let id = SectorId::new(1, n);
                    for i in 0..50 {
                        let mut record = store.get(&id).unwrap();
                        record.current_seal_task.err_msg = format!("attempt {}", i);
                        store.update(record).unwrap();
                        if i % 10 == 0 {
                            store.persist().unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        store.persist().unwrap();

        let reloaded = SectorStateStore::load(store.path()).unwrap();
        assert_eq!(reloaded.len(), 8);
        for n in 0..8 {
            let record = reloaded.get(&SectorId::new(1, n)).unwrap();
            assert_eq!(record.current_seal_task.err_msg, "attempt 49");
        }
    }
}
