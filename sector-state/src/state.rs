use std::collections::{BTreeMap, HashMap};

use crate::metadata::{SectorId, SectorRecord};

/// The in-memory ledger: one record per sector, ordered by sector id so that
/// its serialized form is stable.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct SectorTable {
    sectors: BTreeMap<SectorId, SectorRecord>,
}

impl SectorTable {
    /// Indexes each record under its own sector id. A later record for the
    /// same id replaces an earlier one.
    pub fn from_records<I>(records: I) -> SectorTable
    where
        I: IntoIterator<Item = SectorRecord>,
    {
        let sectors = records
            .into_iter()
            .map(|record| (record.sector_id, record))
            .collect();

        SectorTable { sectors }
    }

    pub fn get(&self, sector_id: &SectorId) -> Option<&SectorRecord> {
        self.sectors.get(sector_id)
    }

    pub fn contains(&self, sector_id: &SectorId) -> bool {
        self.sectors.contains_key(sector_id)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &SectorRecord> {
        self.sectors.values()
    }

    pub(crate) fn insert(&mut self, sector_id: SectorId, record: SectorRecord) {
        self.sectors.insert(sector_id, record);
    }

    pub(crate) fn get_mut(&mut self, sector_id: &SectorId) -> Option<&mut SectorRecord> {
        self.sectors.get_mut(sector_id)
    }

    /// Clears commit phase 1 output on every record waiting on commit phase
    /// 2. Returns the number of records changed.
    pub fn sanitize(&mut self) -> usize {
        self.sectors
            .values_mut()
            .map(SectorRecord::sanitize)
            .filter(|cleared| *cleared)
            .count()
    }
}

/// Legacy ledgers are a map keyed by sector id; the keys are taken as-is.
impl From<HashMap<SectorId, SectorRecord>> for SectorTable {
    fn from(sectors: HashMap<SectorId, SectorRecord>) -> Self {
        SectorTable {
            sectors: sectors.into_iter().collect(),
        }
    }
}
