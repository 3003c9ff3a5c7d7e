pub(crate) mod encoding;
pub(crate) mod snapshots;

pub use self::snapshots::*;
