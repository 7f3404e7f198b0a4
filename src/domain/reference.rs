//! Cell address codec.
//!
//! Converts between zero-based `(row, col)` grid coordinates and
//! spreadsheet-style addresses such as `A1` or `AB12`. Columns use the
//! bijective base-26 convention: `A` is 0, `Z` is 25, `AA` is 26.

use once_cell::sync::Lazy;
use regex::Regex;

static REF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").expect("valid reference pattern"));

/// Matches every cell reference embedded in a larger formula string.
pub(crate) static EMBEDDED_REF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z]+\d+").expect("valid embedded reference pattern"));

/// Converts a zero-based column index to its letter form.
///
/// # Examples
///
/// ```
/// use wsgrid::domain::reference::index_to_letters;
///
/// assert_eq!(index_to_letters(0), "A");
/// assert_eq!(index_to_letters(25), "Z");
/// assert_eq!(index_to_letters(26), "AA");
/// assert_eq!(index_to_letters(701), "ZZ");
/// ```
pub fn index_to_letters(index: usize) -> String {
    let mut letters = Vec::new();
    // i128 so that usize::MAX survives the `- 1` step without wrapping.
    let mut i = index as i128;
    while i >= 0 {
        letters.push(char::from(b'A' + (i % 26) as u8));
        i = i / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Converts a column letter string back to its zero-based index.
///
/// Case-insensitive. Returns `None` for empty input, non-letters, or a value
/// that does not fit in `usize`.
pub fn letters_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }

    let mut acc = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

/// Parses an address such as `A1` or `b10` into `(row, col)`.
///
/// Rows are 1-based in text and 0-based in the result. Returns `None` when
/// the token is not letters followed by digits, or when the row number is 0.
///
/// # Examples
///
/// ```
/// use wsgrid::domain::reference::parse_ref;
///
/// assert_eq!(parse_ref("A1"), Some((0, 0)));
/// assert_eq!(parse_ref("b10"), Some((9, 1)));
/// assert_eq!(parse_ref("1A"), None);
/// ```
pub fn parse_ref(token: &str) -> Option<(usize, usize)> {
    let caps = REF_PATTERN.captures(token)?;
    let col = letters_to_index(&caps[1])?;
    let row = caps[2].parse::<usize>().ok()?.checked_sub(1)?;
    Some((row, col))
}

/// Formats `(row, col)` as an address, the inverse of [`parse_ref`].
pub fn format_ref(row: usize, col: usize) -> String {
    format!("{}{}", index_to_letters(col), row + 1)
}
