//! Telegram HTML message builders.
//!
//! Every builder returns text for `parse_mode = HTML`; user-supplied values
//! pass through [`escape_html`]. Required fields are always rendered and
//! optional fields are left out entirely when absent or blank.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::models::approval::{ApprovalAction, ApprovalStatus};
use crate::models::record::{FinancialRecord, RecordKind};
use crate::models::supply::SupplyRequest;

use super::callback::{self, EncodeError};

/// Telegram rejects messages longer than 4096 characters; leave headroom.
pub const MESSAGE_CHUNK_LIMIT: usize = 4000;

/// Escape the three characters Telegram's HTML parser treats specially.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render an amount with space-grouped thousands and an optional currency.
///
/// `10000` renders as `10 000`, `-1234.50` as `-1 234.5`.
#[must_use]
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let plain = amount.normalize().to_string();
    let (sign, unsigned) = plain
        .strip_prefix('-')
        .map_or(("", plain.as_str()), |rest| ("-", rest));
    let (int_part, frac_part) = unsigned
        .split_once('.')
        .map_or((unsigned, None), |(i, f)| (i, Some(f)));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.iter().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*digit);
    }

    let mut out = format!("{sign}{grouped}");
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    let currency = currency.trim();
    if !currency.is_empty() {
        out.push(' ');
        out.push_str(currency);
    }
    out
}

/// Render a timestamp the way every outcome line shows it.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn push_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push('\n');
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&escape_html(value));
    }
}

/// Announcement for a newly created financial record.
#[must_use]
pub fn transaction_announcement(record: &FinancialRecord, currency: &str) -> String {
    let headline = match record.kind {
        RecordKind::Expense => "\u{1f4b8} <b>New expense</b>",
        RecordKind::Income => "\u{1f4b0} <b>New income</b>",
    };

    let mut out = String::from(headline);
    out.push_str(&format!(
        "\nAmount: <b>{}</b>",
        escape_html(&format_amount(record.amount, currency))
    ));
    push_field(&mut out, "Category", Some(record.category.as_str()));
    push_field(&mut out, "Payer", present(record.payer.as_ref()));
    push_field(&mut out, "Payee", present(record.payee.as_ref()));
    push_field(&mut out, "Created by", Some(record.creator.as_str()));
    push_field(&mut out, "Project", present(record.project.as_ref()));
    push_field(&mut out, "Stage", present(record.stage.as_ref()));
    push_field(&mut out, "Comment", present(record.comment.as_ref()));

    if !record.is_pending() {
        out.push_str(&format!("\nStatus: {}", record.approval_status));
    }
    out
}

/// Announcement for a new supply request.
#[must_use]
pub fn supply_announcement(request: &SupplyRequest) -> String {
    let mut out = String::from("\u{1f4e6} <b>New supply request</b>");
    push_field(&mut out, "Requested by", Some(request.requester.as_str()));
    push_field(&mut out, "Project", Some(request.project.as_str()));
    push_field(&mut out, "Location", present(request.location.as_ref()));

    out.push_str("\n<b>Items:</b>");
    if request.items.is_empty() {
        out.push_str("\n\u{2022} (none listed)");
    }
    for item in &request.items {
        let quantity = format_amount(item.quantity, "");
        let unit = present(item.unit.as_ref())
            .map(|u| format!(" {}", escape_html(u)))
            .unwrap_or_default();
        out.push_str(&format!(
            "\n\u{2022} {} \u{2014} {}{unit}",
            escape_html(&item.name),
            escape_html(&quantity)
        ));
    }

    let deadline = request.deadline.map(|d| d.format("%Y-%m-%d").to_string());
    push_field(&mut out, "Deadline", deadline.as_deref());
    push_field(&mut out, "Comment", present(request.comment.as_ref()));
    out
}

/// Render the pending queue. Never returns an empty body.
#[must_use]
pub fn queue_message(pending: &[FinancialRecord], currency: &str) -> String {
    if pending.is_empty() {
        return "\u{2705} <b>Nothing pending.</b> Every record has been reviewed.".into();
    }

    let mut out = format!("\u{23f3} <b>Pending approvals ({})</b>", pending.len());
    for (idx, record) in pending.iter().enumerate() {
        out.push_str(&format!(
            "\n\n{}. <b>{}</b> \u{00b7} {}",
            idx + 1,
            escape_html(&format_amount(record.amount, currency)),
            escape_html(&record.category)
        ));

        let parties = match (present(record.payer.as_ref()), present(record.payee.as_ref())) {
            (Some(payer), Some(payee)) => Some(format!(
                "{} \u{2192} {}",
                escape_html(payer),
                escape_html(payee)
            )),
            (Some(payer), None) => Some(format!("Payer: {}", escape_html(payer))),
            (None, Some(payee)) => Some(format!("Payee: {}", escape_html(payee))),
            (None, None) => None,
        };
        if let Some(parties) = parties {
            out.push_str("\n   ");
            out.push_str(&parties);
        }

        out.push_str(&format!("\n   by {}", escape_html(&record.creator)));
        if let Some(project) = present(record.project.as_ref()) {
            out.push_str(&format!(" \u{00b7} {}", escape_html(project)));
        }
        out.push_str(&format!("\n   <code>{}</code>", escape_html(&record.id)));
    }
    out
}

/// Short toast shown right after a button press.
#[must_use]
pub fn action_ack_text(action: ApprovalAction) -> &'static str {
    match action {
        ApprovalAction::Approve => "\u{2705} Approved",
        ApprovalAction::Reject => "\u{274c} Rejected",
    }
}

fn status_badge(status: ApprovalStatus) -> (&'static str, &'static str) {
    match status {
        ApprovalStatus::Approved => ("\u{2705}", "Approved"),
        ApprovalStatus::Rejected => ("\u{274c}", "Rejected"),
        ApprovalStatus::Pending => ("\u{23f3}", "Pending"),
        ApprovalStatus::Ignored => ("\u{1f6ab}", "Ignored"),
    }
}

/// Outcome line appended to an announcement once a decision is stored.
#[must_use]
pub fn outcome_line(status: ApprovalStatus, actor: &str, at: DateTime<Utc>) -> String {
    let (icon, word) = status_badge(status);
    format!(
        "{icon} <b>{word}</b> by {} \u{00b7} {}",
        escape_html(actor),
        format_timestamp(at)
    )
}

/// Drop a trailing outcome paragraph, as Telegram reports it in plain text.
fn without_outcome(origin: &str) -> &str {
    let (body, last) = origin.rsplit_once("\n\n").unwrap_or(("", origin));
    let is_outcome = [
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
        ApprovalStatus::Pending,
        ApprovalStatus::Ignored,
    ]
    .into_iter()
    .map(status_badge)
    .any(|(icon, word)| {
        last.strip_prefix(icon)
            .and_then(|rest| rest.strip_prefix(' '))
            .and_then(|rest| rest.strip_prefix(word))
            .is_some_and(|rest| rest.starts_with(" by "))
    });

    if is_outcome {
        body.trim_end()
    } else {
        origin
    }
}

/// Original message text with the outcome line appended.
///
/// The origin text arrives as plain text, so it is escaped before being
/// re-sent as HTML. An outcome line left by an earlier decision is
/// replaced rather than stacked.
#[must_use]
pub fn with_outcome(origin_text: &str, outcome: &str) -> String {
    let origin = without_outcome(origin_text.trim_end());
    if origin.is_empty() {
        outcome.to_owned()
    } else {
        format!("{}\n\n{outcome}", escape_html(origin))
    }
}

/// Approve / Reject keyboard for a pending record.
///
/// # Errors
///
/// Returns an [`EncodeError`] when the record id cannot be carried in a
/// callback payload.
pub fn approval_keyboard(record_id: &str) -> Result<InlineKeyboardMarkup, EncodeError> {
    Ok(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            "\u{2705} Approve",
            callback::encode(ApprovalAction::Approve, record_id)?,
        ),
        InlineKeyboardButton::callback(
            "\u{274c} Reject",
            callback::encode(ApprovalAction::Reject, record_id)?,
        ),
    ]]))
}

/// Greeting sent for `/start`.
#[must_use]
pub fn greeting() -> String {
    "\u{1f44b} <b>Ledger bot</b>\n\
     New expenses, income and supply requests are posted here.\n\n\
     /queue \u{2014} list records awaiting approval\n\
     /start \u{2014} show this message"
        .into()
}

/// Split long HTML text so each chunk fits in a single Telegram message.
///
/// Cuts prefer a line break, then a space, and never land inside a tag
/// (`<...>`) or an entity (`&...;`), which Telegram would refuse to parse.
#[must_use]
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = if rest.len() <= max_len {
            rest.len()
        } else {
            cut_point(rest, max_len)
        };
        let (head, tail) = rest.split_at(cut);
        let head = head.trim_end();
        if !head.is_empty() {
            chunks.push(head.to_owned());
        }
        rest = tail;
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Byte offset at which to end the next chunk of `text`. Always positive.
fn cut_point(text: &str, max_len: usize) -> usize {
    let mut end = max_len.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    if end == 0 {
        // A single character wider than the limit.
        return text.chars().next().map_or(text.len(), char::len_utf8);
    }

    let window = &text[..end];
    let safe = open_markup(window).unwrap_or(end);
    if safe == 0 {
        return end;
    }
    let window = &window[..safe];

    ['\n', ' ']
        .into_iter()
        .find_map(|sep| {
            window
                .match_indices(sep)
                .map(|(pos, _)| pos + 1)
                .rev()
                .find(|&cut| open_markup(&window[..cut]).is_none())
        })
        .unwrap_or(safe)
}

/// Start of a tag or entity left unterminated at the end of `text`.
fn open_markup(text: &str) -> Option<usize> {
    let tag = text.rfind('<').filter(|&at| !text[at..].contains('>'));
    let entity = text
        .rfind('&')
        .filter(|&at| !text[at..].contains(|c: char| c == ';' || c.is_whitespace()));
    match (tag, entity) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
