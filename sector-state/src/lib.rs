#![deny(clippy::all, clippy::perf, clippy::correctness)]

#[macro_use]
extern crate log;

pub use crate::config::*;
pub use crate::constants::*;
pub use crate::error::*;
pub use crate::handle::*;
pub use crate::helpers::*;
pub use crate::metadata::*;
pub use crate::state::*;
pub use crate::store::*;
pub use crate::task::*;

pub(crate) mod config;
pub(crate) mod constants;
pub(crate) mod error;
pub(crate) mod handle;
pub(crate) mod helpers;
pub(crate) mod metadata;
pub(crate) mod state;
pub(crate) mod store;
pub(crate) mod task;
