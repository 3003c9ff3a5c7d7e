//! Serde adapters giving the ledger's leaf values the same JSON shape the
//! Lotus tooling uses, while staying compact in binary encodings.

use std::str::FromStr;

use base64::engine::{general_purpose::STANDARD, Engine as _};
use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Usage: `#[serde(with = "bytes_base64")]`
///
/// Base64 text in human readable formats, raw bytes otherwise. A JSON `null`
/// reads back as an empty buffer.
pub mod bytes_base64 {
    use super::*;

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            Some(STANDARD.encode(value)).serialize(serializer)
        } else {
            serializer.serialize_bytes(value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            match Option::<String>::deserialize(deserializer)? {
                Some(encoded) => STANDARD
                    .decode(encoded)
                    .map_err(serde::de::Error::custom),
                None => Ok(Vec::new()),
            }
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}

/// Usage: `#[serde(deserialize_with = "null_as_empty")]`
///
/// Lotus writes empty slices as `null`; read those back as an empty list.
/// Binary encodings always carry the sequence itself.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    if deserializer.is_human_readable() {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    } else {
        Vec::<T>::deserialize(deserializer)
    }
}

/// Helper used to serialize a CID into a map with key "/"
#[derive(Serialize, Deserialize)]
struct CidMap {
    #[serde(rename = "/")]
    cid: String,
}

/// Usage: `#[serde(with = "optional_cid")]`
///
/// `None` is written as `null`, matching an undefined CID.
pub mod optional_cid {
    use super::*;

    pub fn serialize<S>(value: &Option<Cid>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .as_ref()
            .map(|cid| CidMap {
                cid: cid.to_string(),
            })
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Cid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<CidMap>::deserialize(deserializer)? {
            Some(CidMap { cid }) if !cid.is_empty() => Cid::from_str(&cid)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}
