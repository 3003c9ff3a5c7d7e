use std::fmt;

use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::helpers::encoding::optional_cid;
use crate::task::{FileTask, SealTaskInfo};

pub type ActorId = u64;

pub type SectorNumber = u64;

/// Identifies a sector across the whole network: the mining actor that owns
/// it and the number that actor assigned.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SectorId {
    pub miner: ActorId,
    pub number: SectorNumber,
}

impl SectorId {
    pub fn new(miner: ActorId, number: SectorNumber) -> SectorId {
        SectorId { miner, number }
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s-t0{}-{}", self.miner, self.number)
    }
}

/// Position of a sector in the sealing pipeline. The enumeration belongs to
/// the scheduler; the store only compares values.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorWorkingPhase(pub i64);

impl fmt::Display for SectorWorkingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisteredSealProof(pub i64);

/// Size of a piece after fr32 padding. Always a power of two, and at least
/// 128 bytes (16 nodes) for BLS12-381.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaddedPieceSize(pub u64);

impl PaddedPieceSize {
    pub const MIN: PaddedPieceSize = PaddedPieceSize(128);

    pub fn is_valid(self) -> bool {
        self >= Self::MIN && self.0.is_power_of_two()
    }
}

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceInfo {
    #[serde(rename = "Size")]
    pub size: PaddedPieceSize,
    #[serde(rename = "PieceCID", with = "optional_cid")]
    pub piece_cid: Option<Cid>,
}

/// Output of pre-commit phase 2.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SectorCids {
    #[serde(with = "optional_cid")]
    pub unsealed: Option<Cid>,
    #[serde(with = "optional_cid")]
    pub sealed: Option<Cid>,
}

/// The pipeline machines that may hold a sector's files between stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    PreCommit1,
    PreCommit2,
    Commit1,
    Commit2,
}

/// Where one pipeline machine keeps a sector. Paths the stage never holds
/// are empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerLocation<'a> {
    pub address: &'a str,
    pub unsealed_sector_path: &'a str,
    pub sealed_sector_path: &'a str,
    pub cache_dir_path: &'a str,
}

/// Everything the scheduler remembers about one sector. This is the unit of
/// persistence.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SectorRecord {
    pub sector_id: SectorId,
    pub sector_working_phase: SectorWorkingPhase,
    pub current_seal_task: SealTaskInfo,
    pub current_file_task: FileTask,
    pub miner_unsealed_sector_path: String,
    pub miner_sealed_sector_path: String,
    pub miner_cache_dir_path: String,

    pub p1_worker_address: String,
    pub p1_unsealed_sector_path: String,
    pub p1_sealed_sector_path: String,
    pub p1_cache_dir_path: String,

    pub p2_worker_address: String,
    // NVMe scratch on the pre-commit 2 box
    pub p2_sealed_sector_path: String,
    pub p2_cache_dir_path: String,

    pub c1_worker_address: String,
    pub c1_sealed_sector_path: String,
    pub c1_cache_dir_path: String,

    pub c2_worker_address: String,
}

impl SectorRecord {
    pub fn new(sector_id: SectorId, sector_working_phase: SectorWorkingPhase) -> SectorRecord {
        SectorRecord {
            sector_id,
            sector_working_phase,
            ..Default::default()
        }
    }

    pub fn worker_address(&self, stage: PipelineStage) -> &str {
        self.worker_location(stage).address
    }

    pub fn worker_location(&self, stage: PipelineStage) -> WorkerLocation<'_> {
        match stage {
            PipelineStage::PreCommit1 => WorkerLocation {
                address: &self.p1_worker_address,
                unsealed_sector_path: &self.p1_unsealed_sector_path,
                sealed_sector_path: &self.p1_sealed_sector_path,
                cache_dir_path: &self.p1_cache_dir_path,
            },
            PipelineStage::PreCommit2 => WorkerLocation {
                address: &self.p2_worker_address,
                unsealed_sector_path: "",
                sealed_sector_path: &self.p2_sealed_sector_path,
                cache_dir_path: &self.p2_cache_dir_path,
            },
            PipelineStage::Commit1 => WorkerLocation {
                address: &self.c1_worker_address,
                unsealed_sector_path: "",
                sealed_sector_path: &self.c1_sealed_sector_path,
                cache_dir_path: &self.c1_cache_dir_path,
            },
            PipelineStage::Commit2 => WorkerLocation {
                address: &self.c2_worker_address,
                unsealed_sector_path: "",
                sealed_sector_path: "",
                cache_dir_path: "",
            },
        }
    }

    /// Drops the commit phase 1 output once the sector has moved on to
    /// commit phase 2. Returns whether anything was dropped.
    pub fn sanitize(&mut self) -> bool {
        let task = &mut self.current_seal_task;
        if task.is_commit2() && !task.commit1_out.is_empty() {
            task.commit1_out = Vec::new();
            return true;
        }
        false
    }
}
