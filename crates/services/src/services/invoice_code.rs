//! Sequential invoice codes of the form `FOLKS/TYPE/MM/NNN`.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub const CODE_ORGANISATION: &str = "FOLKS";
pub const MAX_TYPE_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceTypeError {
    #[error("invoiceType is required")]
    Empty,
    #[error("invoiceType must be 1-16 letters or digits")]
    Invalid,
}

/// Upper-case the type and make sure it is safe to embed in a code.
pub fn normalize_type(raw: &str) -> Result<String, InvoiceTypeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvoiceTypeError::Empty);
    }
    if trimmed.len() > MAX_TYPE_LEN || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(InvoiceTypeError::Invalid);
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// `FOLKS/TYPE/MM/` for an already normalized type.
pub fn code_prefix(invoice_type: &str, date: NaiveDate) -> String {
    format!("{}/{}/{:02}/", CODE_ORGANISATION, invoice_type, date.month())
}

/// One past the highest numeric suffix under `prefix`, or 1 when there is none.
pub fn next_sequence<I, S>(prefix: &str, codes: I) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    codes
        .into_iter()
        .filter_map(|code| {
            let suffix = code.as_ref().strip_prefix(prefix)?;
            if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            suffix.parse::<u32>().ok()
        })
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

pub fn format_code(prefix: &str, sequence: u32) -> String {
    format!("{prefix}{sequence:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, 14).unwrap()
    }

    #[test]
    fn prefix_pads_month() {
        assert_eq!(code_prefix("INV", date(8)), "FOLKS/INV/08/");
        assert_eq!(code_prefix("DP", date(12)), "FOLKS/DP/12/");
    }

    #[test]
    fn normalize_type_uppercases_and_validates() {
        assert_eq!(normalize_type(" inv ").unwrap(), "INV");
        assert_eq!(normalize_type(""), Err(InvoiceTypeError::Empty));
        assert_eq!(normalize_type("IN/V"), Err(InvoiceTypeError::Invalid));
        assert_eq!(normalize_type("INV%"), Err(InvoiceTypeError::Invalid));
        assert_eq!(
            normalize_type("ABCDEFGHIJKLMNOPQ"),
            Err(InvoiceTypeError::Invalid)
        );
    }

    #[test]
    fn first_code_in_a_month_starts_at_one() {
        let codes: Vec<String> = Vec::new();
        assert_eq!(next_sequence("FOLKS/INV/08/", &codes), 1);
    }

    #[test]
    fn next_sequence_takes_max_not_count() {
        let codes = ["FOLKS/INV/08/001", "FOLKS/INV/08/007", "FOLKS/INV/08/003"];
        assert_eq!(next_sequence("FOLKS/INV/08/", codes), 8);
    }

    #[test]
    fn next_sequence_ignores_other_prefixes_and_junk_suffixes() {
        let codes = [
            "FOLKS/INV/09/050",
            "FOLKS/DP/08/020",
            "FOLKS/INV/08/",
            "FOLKS/INV/08/00A",
            "FOLKS/INV/08/+12",
            "FOLKS/INV/08/004",
        ];
        assert_eq!(next_sequence("FOLKS/INV/08/", codes), 5);
    }

    #[test]
    fn format_code_pads_to_three_digits_and_grows_past_999() {
        assert_eq!(format_code("FOLKS/INV/08/", 7), "FOLKS/INV/08/007");
        assert_eq!(format_code("FOLKS/INV/08/", 1000), "FOLKS/INV/08/1000");
        let codes = ["FOLKS/INV/08/999"];
        assert_eq!(
            format_code("FOLKS/INV/08/", next_sequence("FOLKS/INV/08/", codes)),
            "FOLKS/INV/08/1000"
        );
    }
}
