use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use bincode::Options;
use tempfile::NamedTempFile;

use crate::constants::LEDGER_FILE_MODE;
use crate::error::{err_persist_io, Result, StateStoreErr};
use crate::metadata::{SectorId, SectorRecord};
use crate::state::SectorTable;

/// The encodings a ledger file may be in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerFormat {
    /// JSON array of records. The only format ever written.
    Canonical,
    /// bincode map from sector id to record, written by older releases.
    Legacy,
}

impl fmt::Display for LedgerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerFormat::Canonical => f.write_str("canonical"),
            LedgerFormat::Legacy => f.write_str("legacy"),
        }
    }
}

type Probe = fn(&[u8]) -> std::result::Result<SectorTable, String>;

// Tried in order; the first probe to succeed wins.
const PROBES: [(LedgerFormat, Probe); 2] = [
    (LedgerFormat::Canonical, decode_canonical),
    (LedgerFormat::Legacy, decode_legacy),
];

fn decode_canonical(bytes: &[u8]) -> std::result::Result<SectorTable, String> {
    let records: Option<Vec<SectorRecord>> =
        serde_json::from_slice(bytes).map_err(|err| err.to_string())?;

    Ok(SectorTable::from_records(records.unwrap_or_default()))
}

fn decode_legacy(bytes: &[u8]) -> std::result::Result<SectorTable, String> {
    let sectors: HashMap<SectorId, SectorRecord> = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .deserialize(bytes)
        .map_err(describe_legacy_error)?;

    Ok(SectorTable::from(sectors))
}

fn describe_legacy_error(err: bincode::Error) -> String {
    match *err {
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            "truncated legacy ledger: input ended early".to_string()
        }
        ref other => other.to_string(),
    }
}

/// Decodes ledger bytes, trying the canonical format before the legacy one.
/// `path` is only used for error reporting.
pub fn decode_ledger(path: &Path, bytes: &[u8]) -> Result<(SectorTable, LedgerFormat)> {
    let mut failures = Vec::with_capacity(PROBES.len());

    for (format, probe) in PROBES.iter() {
        match probe(bytes) {
            Ok(table) => return Ok((table, *format)),
            Err(reason) => {
                warn!("ledger {:?} is not {}: {}", path, format, reason);
                failures.push(reason);
            }
        }
    }

    let mut failures = failures.into_iter();
    Err(StateStoreErr::LedgerFormatUnrecognized {
        path: path.to_path_buf(),
        canonical: failures.next().unwrap_or_default(),
        legacy: failures.next().unwrap_or_default(),
    })
}

/// Reads the ledger at `path` and returns its table along with the format
/// it was found in.
pub fn load_ledger(path: &Path) -> Result<(SectorTable, LedgerFormat)> {
    let bytes = fs::read(path).map_err(|source| StateStoreErr::LedgerUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let (table, format) = decode_ledger(path, &bytes)?;

    info!(
        "loaded {} sector records from {:?} ({} format)",
        table.len(),
        path,
        format
    );

    Ok((table, format))
}

/// Serializes a table in the canonical format.
pub fn encode_ledger(table: &SectorTable) -> Result<Vec<u8>> {
    let records: Vec<&SectorRecord> = table.records().collect();
    let serialized = serde_json::to_vec(&records)?;
    Ok(serialized)
}

/// Replaces the file at `path` with `bytes`. The bytes are written to a
/// temporary file in the same directory and renamed over the target, so a
/// crash leaves either the old or the new ledger in place.
pub fn write_ledger(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source: std::io::Error| err_persist_io(path.to_path_buf(), source);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    set_ledger_permissions(file.as_file()).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;

    sync_directory(dir).map_err(io_err)?;

    debug!("wrote {} bytes to {:?}", bytes.len(), path);

    Ok(())
}

#[cfg(unix)]
fn set_ledger_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(LEDGER_FILE_MODE))
}

#[cfg(not(unix))]
fn set_ledger_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
