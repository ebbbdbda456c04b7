use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use reef_defence_core::TowerRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "reef";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "reef:v1";
/// Delimiter used to separate the prefix, tower count and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of every tower standing on the reef.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TowerLayoutSnapshot {
    /// Towers composing the layout, in placement order.
    pub(crate) towers: Vec<TowerRecord>,
}

impl TowerLayoutSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json =
            serde_json::to_vec(&self.towers).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{encoded}",
            self.towers.len()
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let count = parts.next().ok_or(LayoutTransferError::MissingCount)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let expected = count
            .trim()
            .parse::<usize>()
            .map_err(|_| LayoutTransferError::InvalidCount(count.to_owned()))?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let towers: Vec<TowerRecord> =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        if towers.len() != expected {
            return Err(LayoutTransferError::CountMismatch {
                expected,
                actual: towers.len(),
            });
        }

        Ok(Self { towers })
    }
}

/// Errors that can occur while encoding or decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include the tower count.
    #[error("layout string is missing the tower count")]
    MissingCount,
    /// The encoded snapshot did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The tower count could not be parsed.
    #[error("could not parse tower count '{0}'")]
    InvalidCount(String),
    /// The payload held a different number of towers than announced.
    #[error("layout announced {expected} towers but contained {actual}")]
    CountMismatch {
        /// Count written in the header.
        expected: usize,
        /// Towers found in the payload.
        actual: usize,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be (de)serialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}
