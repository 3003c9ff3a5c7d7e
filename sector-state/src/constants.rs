/// Where the scheduler keeps its ledger unless configured otherwise.
pub const DEFAULT_LEDGER_PATH: &str = "~/.lotus_scheduler/state_data";

/// Permission bits of a freshly written ledger file.
pub const LEDGER_FILE_MODE: u32 = 0o600;

pub const TT_ADD_PIECE: &str = "seal/v0/addpiece";
pub const TT_PRE_COMMIT1: &str = "seal/v0/precommit/1";
pub const TT_PRE_COMMIT2: &str = "seal/v0/precommit/2";
pub const TT_COMMIT1: &str = "seal/v0/commit/1";
pub const TT_COMMIT2: &str = "seal/v0/commit/2";
pub const TT_FINALIZE: &str = "seal/v0/finalize";
pub const TT_FETCH: &str = "seal/v0/fetch";
pub const TT_UNSEAL: &str = "seal/v0/unseal";
pub const TT_READ_UNSEALED: &str = "seal/v0/unsealread";
