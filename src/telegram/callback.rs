//! Inline-button callback payload codec.
//!
//! Payloads have the shape `<action>:<record_id>` and travel through
//! Telegram's `callback_data`, which the platform echoes back verbatim and
//! caps at 64 bytes. Encoding refuses ids that would not fit instead of
//! truncating them, since a truncated id could address a different record.

use std::fmt::{Display, Formatter};

use crate::models::approval::ApprovalAction;
use crate::AppError;

/// Telegram's `callback_data` limit, in bytes.
pub const MAX_CALLBACK_DATA_BYTES: usize = 64;

const SEPARATOR: char = ':';

/// A decoded button press: what to do and to which record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackAction {
    /// Requested decision.
    pub action: ApprovalAction,
    /// Target record identifier.
    pub record_id: String,
}

/// Reasons a payload cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The record id is empty.
    EmptyRecordId,
    /// The encoded payload would exceed the platform limit.
    TooLong {
        /// Encoded length in bytes.
        len: usize,
    },
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRecordId => f.write_str("record id is empty"),
            Self::TooLong { len } => write!(
                f,
                "payload is {len} bytes, limit is {MAX_CALLBACK_DATA_BYTES}"
            ),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Reasons a payload cannot be decoded. Each variant is stable so callers
/// and tests can tell malformed shapes apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is empty.
    Empty,
    /// The payload has no `:` separator.
    MissingSeparator,
    /// The action keyword is not recognised.
    UnknownAction(String),
    /// Nothing follows the separator.
    EmptyRecordId,
    /// The payload exceeds the platform limit, so the platform cannot have
    /// produced it from one of our buttons.
    Oversized(usize),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("payload is empty"),
            Self::MissingSeparator => f.write_str("payload has no action separator"),
            Self::UnknownAction(keyword) => write!(f, "unknown action '{keyword}'"),
            Self::EmptyRecordId => f.write_str("payload has no record id"),
            Self::Oversized(len) => write!(
                f,
                "payload is {len} bytes, limit is {MAX_CALLBACK_DATA_BYTES}"
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        Self::InvalidPayload(err.to_string())
    }
}

/// Build the payload for an inline button.
///
/// # Errors
///
/// Returns `EncodeError::EmptyRecordId` for an empty id and
/// `EncodeError::TooLong` when the payload would not fit in
/// [`MAX_CALLBACK_DATA_BYTES`].
pub fn encode(action: ApprovalAction, record_id: &str) -> Result<String, EncodeError> {
    if record_id.is_empty() {
        return Err(EncodeError::EmptyRecordId);
    }

    let payload = format!("{}{SEPARATOR}{record_id}", action.keyword());
    if payload.len() > MAX_CALLBACK_DATA_BYTES {
        return Err(EncodeError::TooLong { len: payload.len() });
    }
    Ok(payload)
}

/// Parse a payload echoed back by the platform.
///
/// The first `:` separates the action from the id; everything after it is
/// the id, verbatim.
///
/// # Errors
///
/// Returns the [`DecodeError`] variant describing the first problem found.
pub fn decode(payload: &str) -> Result<CallbackAction, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    if payload.len() > MAX_CALLBACK_DATA_BYTES {
        return Err(DecodeError::Oversized(payload.len()));
    }

    let (keyword, record_id) = payload
        .split_once(SEPARATOR)
        .ok_or(DecodeError::MissingSeparator)?;

    let action = ApprovalAction::from_keyword(keyword)
        .ok_or_else(|| DecodeError::UnknownAction(keyword.to_owned()))?;

    if record_id.is_empty() {
        return Err(DecodeError::EmptyRecordId);
    }

    Ok(CallbackAction {
        action,
        record_id: record_id.to_owned(),
    })
}
