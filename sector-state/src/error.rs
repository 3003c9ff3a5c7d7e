use std::path::PathBuf;

use crate::metadata::{SectorId, SectorWorkingPhase};

pub type Result<T> = std::result::Result<T, StateStoreErr>;

#[derive(Debug, thiserror::Error)]
pub enum StateStoreErr {
    #[error("could not determine the home directory to expand {}", _0)]
    HomeDirUnavailable(String),

    #[error("could not resolve ledger path {}: {}", path, source)]
    PathResolution {
        path: String,
        source: std::io::Error,
    },

    #[error("could not read ledger {:?}: {}", path, source)]
    LedgerUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "ledger {:?} is neither canonical ({}) nor legacy ({})",
        path,
        canonical,
        legacy
    )]
    LedgerFormatUnrecognized {
        path: PathBuf,
        canonical: String,
        legacy: String,
    },

    #[error("no record for sector {}", _0)]
    RecordNotFound(SectorId),

    #[error("a record for sector {} already exists", _0)]
    RecordAlreadyExists(SectorId),

    #[error(
        "{} working phase would change from {} to {} through an ordinary update",
        sector_id,
        stored,
        attempted
    )]
    PhaseInvariantViolation {
        sector_id: SectorId,
        stored: SectorWorkingPhase,
        attempted: SectorWorkingPhase,
    },

    #[error("could not encode ledger: {}", _0)]
    PersistEncode(#[from] serde_json::Error),

    #[error("could not write ledger {:?}: {}", path, source)]
    PersistIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("sector state store used before initialization")]
    Uninitialized,
}

impl StateStoreErr {
    /// Whether the owning process should stop rather than carry on against
    /// state of unknown quality.
    pub fn is_fatal(&self) -> bool {
        match self {
            StateStoreErr::RecordNotFound(_)
            | StateStoreErr::RecordAlreadyExists(_)
            | StateStoreErr::PersistEncode(_)
            | StateStoreErr::PersistIo { .. } => false,
            StateStoreErr::HomeDirUnavailable(_)
            | StateStoreErr::PathResolution { .. }
            | StateStoreErr::LedgerUnreadable { .. }
            | StateStoreErr::LedgerFormatUnrecognized { .. }
            | StateStoreErr::PhaseInvariantViolation { .. }
            | StateStoreErr::Uninitialized => true,
        }
    }
}

pub fn err_not_found(sector_id: SectorId) -> StateStoreErr {
    StateStoreErr::RecordNotFound(sector_id)
}

pub fn err_phase(
    sector_id: SectorId,
    stored: SectorWorkingPhase,
    attempted: SectorWorkingPhase,
) -> StateStoreErr {
    StateStoreErr::PhaseInvariantViolation {
        sector_id,
        stored,
        attempted,
    }
}

pub fn err_persist_io(path: PathBuf, source: std::io::Error) -> StateStoreErr {
    StateStoreErr::PersistIo { path, source }
}
