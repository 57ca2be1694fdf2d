//! Unit tests for the callback payload codec.

use ledger_bot::models::approval::ApprovalAction;
use ledger_bot::telegram::callback::{self, DecodeError, EncodeError, MAX_CALLBACK_DATA_BYTES};
use ledger_bot::AppError;

#[test]
fn encode_then_decode_recovers_action_and_id() {
    for action in [ApprovalAction::Approve, ApprovalAction::Reject] {
        let payload = callback::encode(action, "0f8e-41aa").expect("encode");
        let decoded = callback::decode(&payload).expect("decode");
        assert_eq!(decoded.action, action);
        assert_eq!(decoded.record_id, "0f8e-41aa");
    }
}

#[test]
fn empty_record_id_cannot_be_encoded() {
    assert_eq!(
        callback::encode(ApprovalAction::Approve, ""),
        Err(EncodeError::EmptyRecordId)
    );
}

#[test]
fn long_uuid_fits_within_limit() {
    let id = "3f2b8c1e-9d4a-4f7e-b6a2-1c5d8e9f0a7b";
    let payload = callback::encode(ApprovalAction::Reject, id).expect("encode");
    assert!(payload.len() <= MAX_CALLBACK_DATA_BYTES);
}

#[test]
fn decode_distinguishes_failure_kinds() {
    assert_eq!(callback::decode(""), Err(DecodeError::Empty));
    assert_eq!(
        callback::decode("approve"),
        Err(DecodeError::MissingSeparator)
    );
    assert_eq!(
        callback::decode("toggle:abc"),
        Err(DecodeError::UnknownAction("toggle".into()))
    );
    assert_eq!(callback::decode("reject:"), Err(DecodeError::EmptyRecordId));

    let oversized = format!("approve:{}", "x".repeat(MAX_CALLBACK_DATA_BYTES));
    assert_eq!(
        callback::decode(&oversized),
        Err(DecodeError::Oversized(oversized.len()))
    );
}

#[test]
fn codec_errors_map_to_invalid_payload() {
    let err: AppError = DecodeError::MissingSeparator.into();
    assert!(matches!(err, AppError::InvalidPayload(_)));

    let err: AppError = EncodeError::EmptyRecordId.into();
    assert!(matches!(err, AppError::InvalidPayload(_)));
}
