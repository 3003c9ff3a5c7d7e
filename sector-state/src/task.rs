use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::constants::*;
use crate::helpers::encoding::{bytes_base64, null_as_empty};
use crate::metadata::{PieceInfo, RegisteredSealProof, SectorCids, SectorId};

/// Tag naming the pipeline stage a seal task belongs to. Tags this crate
/// does not know survive a load/persist cycle untouched.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
pub enum TaskType {
    #[default]
    None,
    AddPiece,
    PreCommit1,
    PreCommit2,
    Commit1,
    Commit2,
    Finalize,
    Fetch,
    Unseal,
    ReadUnsealed,
    Other(String),
}

impl TaskType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskType::None => "",
            TaskType::AddPiece => TT_ADD_PIECE,
            TaskType::PreCommit1 => TT_PRE_COMMIT1,
            TaskType::PreCommit2 => TT_PRE_COMMIT2,
            TaskType::Commit1 => TT_COMMIT1,
            TaskType::Commit2 => TT_COMMIT2,
            TaskType::Finalize => TT_FINALIZE,
            TaskType::Fetch => TT_FETCH,
            TaskType::Unseal => TT_UNSEAL,
            TaskType::ReadUnsealed => TT_READ_UNSEALED,
            TaskType::Other(tag) => tag,
        }
    }
}

impl From<&str> for TaskType {
    fn from(tag: &str) -> Self {
        match tag {
            "" => TaskType::None,
            TT_ADD_PIECE => TaskType::AddPiece,
            TT_PRE_COMMIT1 => TaskType::PreCommit1,
            TT_PRE_COMMIT2 => TaskType::PreCommit2,
            TT_COMMIT1 => TaskType::Commit1,
            TT_COMMIT2 => TaskType::Commit2,
            TT_FINALIZE => TaskType::Finalize,
            TT_FETCH => TaskType::Fetch,
            TT_UNSEAL => TaskType::Unseal,
            TT_READ_UNSEALED => TaskType::ReadUnsealed,
            other => TaskType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let tag = Option::<String>::deserialize(deserializer)?;
            Ok(tag.as_deref().map(TaskType::from).unwrap_or_default())
        } else {
            String::deserialize(deserializer).map(|tag| TaskType::from(tag.as_str()))
        }
    }
}

/// One pipeline stage of work on one sector, together with everything the
/// earlier stages produced for it.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SealTaskInfo {
    #[serde(rename = "SectorID")]
    pub sector_id: SectorId,
    pub task_type: TaskType,
    pub seal_proof_type: RegisteredSealProof,
    pub cache_dir_path: String,
    pub staged_sector_path: String,
    pub sealed_sector_path: String,
    // chain randomness bound in at pre-commit
    #[serde(with = "bytes_base64")]
    pub ticket: Vec<u8>,
    // chain randomness bound in at the interactive commit
    #[serde(with = "bytes_base64")]
    pub seed: Vec<u8>,
    #[serde(deserialize_with = "null_as_empty")]
    pub pieces: Vec<PieceInfo>,
    #[serde(with = "bytes_base64")]
    pub pre_commit1_out: Vec<u8>,
    pub pre_commit2_out: SectorCids,
    #[serde(with = "bytes_base64")]
    pub commit1_out: Vec<u8>,
    #[serde(with = "bytes_base64")]
    pub commit2_out: Vec<u8>,
    pub finalized: bool,
    pub err_msg: String,
}

impl SealTaskInfo {
    pub fn is_commit2(&self) -> bool {
        self.task_type == TaskType::Commit2
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTaskType(pub String);

/// Moves a sector's files from one set of locations to another, e.g. when
/// handing a sector from one worker to the next.
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileTask {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "SectorID")]
    pub sector_id: SectorId,
    pub file_task_type: FileTaskType,
    pub seal_proof_type: RegisteredSealProof,
    pub source_unsealed_sector_path: String,
    pub source_sealed_sector_path: String,
    pub source_cache_path: String,
    pub target_unsealed_sector_path: String,
    pub target_sealed_sector_path: String,
    pub target_cache_path: String,
    pub err_msg: String,
    pub done: bool,
}

impl FileTask {
    /// A new relocation task with a fresh identifier.
    pub fn new(
        sector_id: SectorId,
        file_task_type: FileTaskType,
        seal_proof_type: RegisteredSealProof,
    ) -> FileTask {
        FileTask {
            id: Uuid::new_v4(),
            sector_id,
            file_task_type,
            seal_proof_type,
            ..Default::default()
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.id.is_nil()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_task_type_tags() {
        assert_eq!(serde_json::to_value(TaskType::Commit2).unwrap(), json!("seal/v0/commit/2"));
        assert_eq!(serde_json::to_value(TaskType::None).unwrap(), json!(""));

        let parsed: TaskType = serde_json::from_value(json!("seal/v0/precommit/1")).unwrap();
        assert_eq!(parsed, TaskType::PreCommit1);

        let parsed: TaskType = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(parsed, TaskType::None);
    }

    #[test]
    fn test_unknown_task_type_is_preserved() {
        let parsed: TaskType = serde_json::from_value(json!("seal/v1/replicaupdate")).unwrap();
        assert_eq!(parsed, TaskType::Other("seal/v1/replicaupdate".to_string()));
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!("seal/v1/replicaupdate")
        );
        assert!(!SealTaskInfo {
            task_type: parsed,
            ..Default::default()
        }
        .is_commit2());
    }

    #[test]
    fn test_file_task_ids_are_fresh() {
        let a = FileTask::new(SectorId::new(1, 1), FileTaskType::default(), RegisteredSealProof(3));
        let b = FileTask::new(SectorId::new(1, 1), FileTaskType::default(), RegisteredSealProof(3));

        assert!(a.is_assigned());
        assert_ne!(a.id, b.id);
        assert!(!FileTask::default().is_assigned());
    }

    #[test]
    fn test_file_task_json() {
        let value = serde_json::to_value(FileTask::default()).unwrap();

        assert_eq!(value["ID"], json!("00000000-0000-0000-0000-000000000000"));
        assert_eq!(value["FileTaskType"], json!(""));
        assert_eq!(value["TargetCachePath"], json!(""));
    }
}
