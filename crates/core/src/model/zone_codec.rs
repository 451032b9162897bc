//! Persisted forms of a [`Zone`]: a JSON record, a compact human-editable
//! string and a URL-safe Base64 string.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::model::position::{NotePosition, PositionError};
use crate::model::zone::Zone;

/// Newest zone format this crate writes and fully understands.
pub const ZONE_FORMAT_VERSION: u32 = 1;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Failures while reading a persisted zone.
///
/// `Unparseable` means the input is not even the right kind of text (bad JSON,
/// bad Base64, missing compact prefix). The other variants mean the input
/// parsed but does not describe a valid zone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ZoneFormatError {
    #[error("zone data could not be parsed: {0}")]
    Unparseable(String),

    #[error("zone data is structurally invalid: {0}")]
    InvalidStructure(String),

    #[error("zone format version must be at least 1, got {0}")]
    InvalidVersion(u32),

    #[error("position #{index} is invalid: {source}")]
    InvalidPosition {
        index: usize,
        #[source]
        source: PositionError,
    },
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// JSON shape: `{ "version": 1, "name": "...", "positions": [{ "string": 1, "fret": 0 }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub positions: Vec<PositionRecord>,
}

/// Wide integers so out-of-range values survive parsing and get a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub string: i64,
    pub fret: i64,
}

impl From<NotePosition> for PositionRecord {
    fn from(pos: NotePosition) -> Self {
        Self {
            string: i64::from(pos.string),
            fret: i64::from(pos.fret),
        }
    }
}

impl Zone {
    #[must_use]
    pub fn to_record(&self) -> ZoneRecord {
        ZoneRecord {
            version: ZONE_FORMAT_VERSION,
            name: self.name().map(str::to_string),
            positions: self.positions().map(PositionRecord::from).collect(),
        }
    }

    /// Rebuilds a zone from its record. Duplicate positions are coalesced.
    /// A newer version than [`ZONE_FORMAT_VERSION`] is logged and parsed best-effort.
    ///
    /// # Errors
    ///
    /// Returns `ZoneFormatError::InvalidVersion` for version 0 and
    /// `ZoneFormatError::InvalidPosition` for any out-of-range position.
    pub fn from_record(record: &ZoneRecord) -> Result<Zone, ZoneFormatError> {
        check_version(record.version)?;

        let mut zone = Zone::new().with_name(record.name.as_deref());
        for (index, raw) in record.positions.iter().enumerate() {
            let position = NotePosition::try_new(raw.string, raw.fret)
                .map_err(|source| ZoneFormatError::InvalidPosition { index, source })?;
            zone.add(position);
        }
        Ok(zone)
    }

    /// JSON text of [`Zone::to_record`].
    ///
    /// # Errors
    ///
    /// Returns `ZoneFormatError::InvalidStructure` if serialization fails.
    pub fn to_json(&self) -> Result<String, ZoneFormatError> {
        serde_json::to_string(&self.to_record())
            .map_err(|e| ZoneFormatError::InvalidStructure(e.to_string()))
    }

    /// # Errors
    ///
    /// `Unparseable` for invalid JSON, `InvalidStructure` for missing or
    /// mistyped fields, plus anything [`Zone::from_record`] rejects.
    pub fn from_json(input: &str) -> Result<Zone, ZoneFormatError> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| ZoneFormatError::Unparseable(e.to_string()))?;
        let record: ZoneRecord = serde_json::from_value(value)
            .map_err(|e| ZoneFormatError::InvalidStructure(e.to_string()))?;
        Zone::from_record(&record)
    }

    /// Compact form: `v1:{url-encoded name}:s1f0,s2f3`.
    #[must_use]
    pub fn to_compact_string(&self) -> String {
        let name: String = self
            .name()
            .map(|n| form_urlencoded::byte_serialize(n.as_bytes()).collect())
            .unwrap_or_default();
        let tokens: Vec<String> = self.positions().map(|p| p.key()).collect();
        format!("v{ZONE_FORMAT_VERSION}:{name}:{}", tokens.join(","))
    }

    /// # Errors
    ///
    /// `Unparseable` when the `v{n}:{name}:{tokens}` frame is missing,
    /// `InvalidStructure` for a malformed position token, `InvalidPosition`
    /// for out-of-range tokens.
    pub fn from_compact_string(input: &str) -> Result<Zone, ZoneFormatError> {
        let mut parts = input.trim().splitn(3, ':');
        let (Some(version), Some(name), Some(tokens)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ZoneFormatError::Unparseable(
                "expected v{version}:{name}:{positions}".to_string(),
            ));
        };

        let version: u32 = version
            .strip_prefix('v')
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ZoneFormatError::Unparseable(format!("bad version tag {version:?}")))?;
        check_version(version)?;

        let mut zone = Zone::new().with_name(decode_name(name).as_deref());
        let tokens = tokens.trim();
        if tokens.is_empty() {
            return Ok(zone);
        }
        for (index, token) in tokens.split(',').enumerate() {
            let position = token.trim().parse::<NotePosition>().map_err(|source| match source {
                PositionError::MalformedKey(key) => {
                    ZoneFormatError::InvalidStructure(format!("malformed position token {key:?}"))
                }
                source => ZoneFormatError::InvalidPosition { index, source },
            })?;
            zone.add(position);
        }
        Ok(zone)
    }

    /// URL-safe form: unpadded URL-alphabet Base64 of the JSON record.
    ///
    /// # Errors
    ///
    /// Returns `ZoneFormatError::InvalidStructure` if serialization fails.
    pub fn to_url_string(&self) -> Result<String, ZoneFormatError> {
        Ok(URL_SAFE_NO_PAD.encode(self.to_json()?.as_bytes()))
    }

    /// # Errors
    ///
    /// `Unparseable` for invalid Base64 or non-UTF-8 payloads, plus anything
    /// [`Zone::from_json`] rejects.
    pub fn from_url_string(input: &str) -> Result<Zone, ZoneFormatError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(input.trim().trim_end_matches('='))
            .map_err(|e| ZoneFormatError::Unparseable(format!("invalid base64: {e}")))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| ZoneFormatError::Unparseable(format!("invalid utf-8: {e}")))?;
        Zone::from_json(&json)
    }
}

fn check_version(version: u32) -> Result<(), ZoneFormatError> {
    if version == 0 {
        return Err(ZoneFormatError::InvalidVersion(version));
    }
    if version > ZONE_FORMAT_VERSION {
        tracing::warn!(
            version,
            supported = ZONE_FORMAT_VERSION,
            "zone format is newer than supported, parsing best-effort"
        );
    }
    Ok(())
}

// Encoded names never contain a raw '&' or '=', so the whole segment is one key.
fn decode_name(raw: &str) -> Option<String> {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
}
