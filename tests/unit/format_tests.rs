//! Unit tests for Telegram HTML message builders.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;

use ledger_bot::models::approval::{ApprovalAction, ApprovalStatus};
use ledger_bot::models::record::{FinancialRecord, RecordKind};
use ledger_bot::models::supply::{SupplyItem, SupplyRequest};
use ledger_bot::telegram::format;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardButtonKind};

fn record(id: &str, amount: i64) -> FinancialRecord {
    let mut record = FinancialRecord::new(
        RecordKind::Expense,
        Decimal::from(amount),
        "Fuel".into(),
        "alice".into(),
    );
    record.id = id.into();
    record
}

#[test]
fn escape_html_covers_parser_specials() {
    assert_eq!(
        format::escape_html("<b>Tom & Jerry</b>"),
        "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"
    );
    assert_eq!(format::escape_html("plain \"quotes\""), "plain \"quotes\"");
}

#[test]
fn amounts_group_thousands() {
    assert_eq!(format::format_amount(Decimal::from(10_000), ""), "10 000");
    assert_eq!(format::format_amount(Decimal::from(999), ""), "999");
    assert_eq!(
        format::format_amount(Decimal::from(1_234_567), "UZS"),
        "1 234 567 UZS"
    );
    assert_eq!(
        format::format_amount(Decimal::new(-123_450, 2), ""),
        "-1 234.5"
    );
}

#[test]
fn transaction_omits_absent_optional_fields() {
    let text = format::transaction_announcement(&record("r1", 10_000), "");

    assert!(text.contains("New expense"));
    assert!(text.contains("Amount: <b>10 000</b>"));
    assert!(text.contains("Category: Fuel"));
    assert!(text.contains("Created by: alice"));
    for label in ["Payer", "Payee", "Project", "Stage", "Comment"] {
        assert!(!text.contains(label), "{label} should be omitted");
    }
}

#[test]
fn transaction_includes_present_optional_fields() {
    let mut record = record("r1", 500);
    record.kind = RecordKind::Income;
    record.payer = Some("Client <LLC>".into());
    record.project = Some("Tower A".into());
    record.stage = Some("   ".into());
    record.comment = Some("advance".into());

    let text = format::transaction_announcement(&record, "USD");

    assert!(text.contains("New income"));
    assert!(text.contains("Payer: Client &lt;LLC&gt;"));
    assert!(text.contains("Project: Tower A"));
    assert!(text.contains("Comment: advance"));
    assert!(!text.contains("Stage"), "blank values are omitted");
    assert!(!text.contains("Payee"));
}

#[test]
fn supply_lists_items_with_units() {
    let request = SupplyRequest::new(
        "Dilshod".into(),
        "Warehouse".into(),
        vec![
            SupplyItem {
                name: "Cement".into(),
                quantity: Decimal::from(40),
                unit: Some("bags".into()),
            },
            SupplyItem {
                name: "Rebar".into(),
                quantity: Decimal::from(1200),
                unit: None,
            },
        ],
    );

    let text = format::supply_announcement(&request);

    assert!(text.contains("Requested by: Dilshod"));
    assert!(text.contains("Cement"));
    assert!(text.contains("40 bags"));
    assert!(text.contains("1 200"));
    assert!(!text.contains("Deadline"));
}

#[test]
fn empty_queue_has_explicit_message() {
    let text = format::queue_message(&[], "");
    assert!(text.contains("Nothing pending"));
}

#[test]
fn queue_numbers_entries_in_order() {
    let mut second = record("r2", 25_000);
    second.payer = Some("Office".into());
    second.payee = Some("Shell".into());

    let text = format::queue_message(&[record("r1", 10_000), second], "");

    assert!(text.contains("Pending approvals (2)"));
    let first_at = text.find("1. <b>10 000</b>").expect("first entry");
    let second_at = text.find("2. <b>25 000</b>").expect("second entry");
    assert!(first_at < second_at);
    assert!(text.contains("Office \u{2192} Shell"));
    assert!(text.contains("<code>r2</code>"));
}

#[test]
fn outcome_line_names_actor_and_time() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
    let line = format::outcome_line(ApprovalStatus::Rejected, "@boss", at);

    assert!(line.contains("Rejected"));
    assert!(line.contains("@boss"));
    assert!(line.contains("2026-03-01 09:05 UTC"));
}

#[test]
fn with_outcome_escapes_origin() {
    let text = format::with_outcome("Fuel & oil", "<b>done</b>");
    assert_eq!(text, "Fuel &amp; oil\n\n<b>done</b>");
    assert_eq!(format::with_outcome("  ", "<b>done</b>"), "<b>done</b>");
}

#[test]
fn with_outcome_replaces_previous_outcome_line() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap();
    let first = format::with_outcome(
        "New expense\nAmount: 500",
        &format::outcome_line(ApprovalStatus::Approved, "@bob", at),
    );
    // Telegram hands the edited message back as plain text.
    let shown = first.replace("<b>", "").replace("</b>", "");

    let second = format::with_outcome(
        &shown,
        &format::outcome_line(ApprovalStatus::Rejected, "@boss", at),
    );

    assert!(second.starts_with("New expense\nAmount: 500\n\n"));
    assert!(second.contains("Rejected"));
    assert!(!second.contains("Approved"));
    assert_eq!(second.matches(" by ").count(), 1);
}

#[test]
fn with_outcome_keeps_text_that_only_mentions_a_status() {
    let text = format::with_outcome("Approved by the board\n\nsee notes", "<b>done</b>");
    assert_eq!(text, "Approved by the board\n\nsee notes\n\n<b>done</b>");
}

#[test]
fn ack_text_reflects_action() {
    assert!(format::action_ack_text(ApprovalAction::Approve).contains("Approved"));
    assert!(format::action_ack_text(ApprovalAction::Reject).contains("Rejected"));
}

fn callback_data(button: &InlineKeyboardButton) -> Option<&str> {
    match &button.kind {
        InlineKeyboardButtonKind::CallbackData(data) => Some(data),
        _ => None,
    }
}

#[test]
fn keyboard_carries_both_actions() {
    let keyboard = format::approval_keyboard("r1").expect("keyboard");
    let row = &keyboard.inline_keyboard[0];

    assert_eq!(row.len(), 2);
    assert_eq!(callback_data(&row[0]), Some("approve:r1"));
    assert_eq!(callback_data(&row[1]), Some("reject:r1"));
}

#[test]
fn keyboard_refuses_oversized_id() {
    assert!(format::approval_keyboard(&"x".repeat(64)).is_err());
}

#[test]
fn greeting_mentions_queue_command() {
    assert!(format::greeting().contains("/queue"));
}

#[test]
fn short_text_is_not_split() {
    assert_eq!(format::split_message("hello", 10), vec!["hello"]);
}

#[test]
fn split_prefers_line_boundaries() {
    let chunks = format::split_message("aaaa\nbbbb\ncccc", 10);
    assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
}

#[test]
fn split_respects_char_boundaries() {
    let text = "\u{00e9}".repeat(10);
    let chunks = format::split_message(&text, 5);

    assert!(chunks.iter().all(|chunk| chunk.len() <= 5));
    assert_eq!(chunks.concat(), text);
}

#[test]
fn split_never_cuts_inside_a_tag() {
    let text = "<b>bold</b>".repeat(3);
    let chunks = format::split_message(&text, 15);

    assert_eq!(chunks, vec!["<b>bold</b>"; 3]);
}

#[test]
fn split_never_cuts_inside_an_entity() {
    let text = "&amp;".repeat(10);
    let chunks = format::split_message(&text, 12);

    assert_eq!(chunks.concat(), text);
    for chunk in &chunks {
        assert!(chunk.len() <= 12);
        assert!(chunk.starts_with('&') && chunk.ends_with(';'), "{chunk}");
    }
}

#[test]
fn split_skips_spaces_inside_tags() {
    let text = "word <a href=\"https://example.com/x\">link</a>";
    let chunks = format::split_message(text, 20);

    assert_eq!(chunks[0], "word");
    assert!(chunks[1].starts_with("<a href="));
}
