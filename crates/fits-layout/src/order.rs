//! Required relative order of FITS header keywords.
//!
//! The mandatory structural keywords must open a header in a fixed sequence
//! and `END` must close it. Everything else may appear in any order in
//! between. [`HeaderOrder`] captures this as a total pre-order: fixed-rank
//! keywords compare strictly, free keywords compare equal to one another, so a
//! stable sort puts the structural keywords in place and leaves the relative
//! order of the rest untouched.

use core::cmp::Ordering;

/// Indexed keyword families whose trailing decimal suffix is part of the key.
///
/// Only `NAXIS` carries a rank of its own; the table families are recognised
/// so that their tokens parse consistently, and sort as free keywords.
pub const INDEXED_FAMILIES: [&str; 9] = [
    "NAXIS", "TBCOL", "TDISP", "TFORM", "TNULL", "TSCAL", "TTYPE", "TUNIT", "TZERO",
];

/// A header keyword, classified for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordToken<'a> {
    /// A plain keyword such as `BITPIX` or `OBJECT`.
    Named(&'a str),
    /// A member of an indexed family, such as `NAXIS3` (`("NAXIS", 3)`).
    Indexed(&'a str, u64),
    /// A card without a keyword (blank keyword field) or an absent key.
    NonKeyword,
}

impl<'a> KeywordToken<'a> {
    /// Classify a keyword string. Trailing spaces are ignored, so the raw
    /// 8-byte keyword field of a card can be passed directly.
    pub fn parse(keyword: &'a str) -> Self {
        let keyword = keyword.trim_end_matches(' ');
        if keyword.is_empty() {
            return KeywordToken::NonKeyword;
        }
        match split_index(keyword) {
            Some((prefix, index)) => KeywordToken::Indexed(prefix, index),
            None => KeywordToken::Named(keyword),
        }
    }

    fn rank(&self) -> Rank {
        match *self {
            KeywordToken::Named(name) => match name {
                "SIMPLE" | "XTENSION" => Rank::Leading,
                "BITPIX" => Rank::Bitpix,
                "NAXIS" => Rank::Naxis,
                "EXTEND" => Rank::Extend,
                "PCOUNT" => Rank::Pcount,
                "GCOUNT" => Rank::Gcount,
                "TFIELDS" => Rank::Tfields,
                "BLOCKED" => Rank::Blocked,
                "END" => Rank::End,
                _ => Rank::Free,
            },
            KeywordToken::Indexed("NAXIS", n) => Rank::AxisLength(n),
            KeywordToken::Indexed(..) | KeywordToken::NonKeyword => Rank::Free,
        }
    }
}

impl<'a> From<&'a str> for KeywordToken<'a> {
    fn from(keyword: &'a str) -> Self {
        KeywordToken::parse(keyword)
    }
}

impl<'a> From<Option<&'a str>> for KeywordToken<'a> {
    fn from(keyword: Option<&'a str>) -> Self {
        keyword.map_or(KeywordToken::NonKeyword, KeywordToken::parse)
    }
}

/// Split `NAXIS12` into `("NAXIS", 12)`. The remainder after a known
/// five-character family prefix must be a non-empty run of decimal digits.
fn split_index(keyword: &str) -> Option<(&str, u64)> {
    if keyword.len() <= 5 || !keyword.is_char_boundary(5) {
        return None;
    }
    let (prefix, digits) = keyword.split_at(5);
    let family = INDEXED_FAMILIES.iter().find(|f| **f == prefix)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse::<u64>().ok()?;
    Some((*family, index))
}

/// Position class of a keyword. Variant order is the required header order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Leading,
    Bitpix,
    Naxis,
    AxisLength(u64),
    Extend,
    Pcount,
    Gcount,
    Tfields,
    Blocked,
    Free,
    End,
}

/// Comparator deciding which of two header cards must be written first.
///
/// `Less` means `a` must precede `b`, `Greater` means `b` must precede `a`,
/// `Equal` means either order is legal.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderOrder;

impl HeaderOrder {
    /// Compare two keyword tokens.
    pub fn compare(a: &KeywordToken<'_>, b: &KeywordToken<'_>) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        a.rank().cmp(&b.rank())
    }

    /// Whether the two cards may be exchanged when written out.
    pub fn equal(a: &KeywordToken<'_>, b: &KeywordToken<'_>) -> bool {
        Self::compare(a, b) == Ordering::Equal
    }

    /// [`compare`](Self::compare) on raw keyword strings.
    pub fn compare_keywords(a: &str, b: &str) -> Ordering {
        Self::compare(&KeywordToken::parse(a), &KeywordToken::parse(b))
    }

    /// The comparison as the conventional `-1`, `0`, `1`.
    pub fn signum(a: &KeywordToken<'_>, b: &KeywordToken<'_>) -> i32 {
        match Self::compare(a, b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }
}
