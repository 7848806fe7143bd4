use chrono::NaiveDate;

/// Today's date in the local timezone of the floor terminal
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Generate a fresh request identifier for one logical mutation attempt.
///
/// The identifier is the idempotency key the ledger dedupes on, so it must
/// be unique across clients; a v4 UUID is used.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a ledger date cell.
///
/// Sheets send `yyyy-MM-dd`, sometimes `yyyy/MM/dd`, and sometimes a full
/// ISO timestamp; only the calendar date is kept.
pub fn parse_ledger_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y/%m/%d"))
        .ok()
}

/// Format a date the way the ledger stores it
pub fn format_ledger_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
