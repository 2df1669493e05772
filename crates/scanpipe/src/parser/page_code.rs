//! Legacy 11-byte page codes.
//!
//! Layout: `MNNNNNNSEEE`. `M` is a modifier (`0` for none), `NNNNNN` a
//! zero-padded ordinal, `S` the page-type separator and `EEE` a zero-padded
//! continuation ordinal. Both page-list grammars are normalized to this form.

use std::fmt;

use thiserror::Error;

use crate::catalog::model::PageType;

pub const PAGE_CODE_LEN: usize = 11;
const SEPARATOR_INDEX: usize = 7;

/// Why a token is not a page code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("expected {PAGE_CODE_LEN} bytes, found {0}")]
    WrongLength(usize),

    #[error("unknown type separator '{0}'")]
    UnknownSeparator(char),

    #[error("non-numeric ordinal in '{0}'")]
    NonNumericOrdinal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCode {
    raw: String,
    modifier: char,
    ordinal: u32,
    page_type: PageType,
    continuation: u32,
}

impl PageCode {
    pub fn decode(raw: &str) -> Result<Self, Rejection> {
        let bytes = raw.as_bytes();
        if bytes.len() != PAGE_CODE_LEN {
            return Err(Rejection::WrongLength(bytes.len()));
        }
        if !raw.is_ascii() {
            return Err(Rejection::NonNumericOrdinal(raw.to_string()));
        }

        let separator = bytes[SEPARATOR_INDEX];
        let page_type = PageType::from_separator(separator)
            .ok_or(Rejection::UnknownSeparator(separator as char))?;

        let ordinal = parse_ordinal(&raw[1..SEPARATOR_INDEX])
            .ok_or_else(|| Rejection::NonNumericOrdinal(raw.to_string()))?;
        let continuation = parse_ordinal(&raw[SEPARATOR_INDEX + 1..])
            .ok_or_else(|| Rejection::NonNumericOrdinal(raw.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            modifier: bytes[0] as char,
            ordinal,
            page_type,
            continuation,
        })
    }

    /// The validity predicate used to filter list-file tokens.
    pub fn is_valid(raw: &str) -> bool {
        Self::decode(raw).is_ok()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    pub fn modifier(&self) -> Option<char> {
        (self.modifier != '0').then_some(self.modifier)
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn continuation(&self) -> u32 {
        self.continuation
    }

    /// Human-readable label: `N1`, `N1-N2` when the continuation is non-zero,
    /// prefixed with `M-` when a modifier is present.
    pub fn label(&self) -> String {
        let number = if self.continuation > 0 {
            format!("{}-{}", self.ordinal, self.continuation)
        } else {
            self.ordinal.to_string()
        };

        match self.modifier() {
            Some(modifier) => format!("{}-{}", modifier, number),
            None => number,
        }
    }
}

impl fmt::Display for PageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_ordinal(digits: &str) -> Option<u32> {
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Maps a map-grammar type letter to the separator byte it stands for.
///
/// `M` has no entry in the separator table, so rows using it never decode.
pub fn separator_for_type_letter(letter: &str) -> Option<u8> {
    match letter {
        "1" => Some(b'.'),
        "C" => Some(b','),
        "B" => Some(b':'),
        "I" => Some(b'I'),
        "P" => Some(b'P'),
        "M" => Some(b'M'),
        _ => None,
    }
}

/// Splits a classic page-list row: the first 11 bytes are the code, the
/// trimmed remainder is an optional label.
pub fn split_classic_row(line: &str) -> (String, Option<String>) {
    let line = line.trim_end_matches(['\r', '\n']);
    let (name, rest) = match line.get(..PAGE_CODE_LEN) {
        Some(name) => (name, &line[PAGE_CODE_LEN..]),
        None => (line.trim_end(), ""),
    };

    let label = rest.trim();
    let label = (!label.is_empty()).then(|| label.to_string());
    (name.to_string(), label)
}

/// Splits a map-grammar row `code label? type?`, substituting byte 7 of the
/// code when a known type letter is present.
pub fn split_map_row(line: &str) -> (String, Option<String>) {
    let mut columns = line.split_whitespace();
    let code = columns.next().unwrap_or_default();
    let label = columns.next().map(str::to_string);
    let separator = columns.next().and_then(separator_for_type_letter);

    let name = separator
        .and_then(|separator| replace_separator(code, separator))
        .unwrap_or_else(|| code.to_string());

    (name, label)
}

fn replace_separator(code: &str, separator: u8) -> Option<String> {
    let head = code.get(..SEPARATOR_INDEX)?;
    let tail = code.get(SEPARATOR_INDEX + 1..)?;
    Some(format!("{}{}{}", head, separator as char, tail))
}
