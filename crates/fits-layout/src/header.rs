//! FITS header cards: just enough parsing and formatting to rebuild a header
//! with its keywords in legal order.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::str;

use crate::ascii;
use crate::block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, HEADER_PAD_BYTE};
use crate::data::Payload;
use crate::error::{Error, Result};
use crate::io::{Read, Write};
use crate::order::{HeaderOrder, KeywordToken};

// ── Cards ──

const END_KEYWORD: &[u8; 8] = b"END     ";

/// Keywords that never carry a value indicator. Their bytes 8..80 are free-form text.
const COMMENTARY_KEYWORDS: [&[u8; 8]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

/// One 80-byte header card image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    image: [u8; CARD_SIZE],
}

impl Card {
    /// The raw 80 bytes of this card.
    pub fn as_bytes(&self) -> &[u8; CARD_SIZE] {
        &self.image
    }

    /// Return the keyword as a trimmed string.
    pub fn keyword_str(&self) -> &str {
        let keyword = &self.image[..8];
        let end = keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&keyword[..end]).unwrap_or("")
    }

    /// The keyword classified for ordering.
    pub fn token(&self) -> KeywordToken<'_> {
        KeywordToken::parse(self.keyword_str())
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.image[..8] == END_KEYWORD
    }

    /// Returns `true` if this is a blank card (keyword is all spaces).
    pub fn is_blank(&self) -> bool {
        self.image[..8].iter().all(|&b| b == b' ')
    }

    /// Returns `true` if this card carries a commentary keyword
    /// (COMMENT, HISTORY, or blank).
    pub fn is_commentary(&self) -> bool {
        COMMENTARY_KEYWORDS.iter().any(|kw| &self.image[..8] == *kw)
    }

    fn value_field(&self) -> Option<&[u8]> {
        if self.is_commentary() || &self.image[8..10] != b"= " {
            return None;
        }
        Some(&self.image[10..])
    }

    fn value_text(&self) -> Option<&str> {
        let field = self.value_field()?;
        let field = str::from_utf8(field).ok()?;
        let text = match field.find('/') {
            Some(idx) => &field[..idx],
            None => field,
        };
        Some(text.trim())
    }

    /// Integer value of this card, if it has one.
    pub fn integer_value(&self) -> Option<i64> {
        self.value_text()?.parse().ok()
    }

    /// Logical (`T`/`F`) value of this card, if it has one.
    pub fn logical_value(&self) -> Option<bool> {
        match self.value_text()? {
            "T" => Some(true),
            "F" => Some(false),
            _ => None,
        }
    }

    /// Quoted string value of this card with trailing spaces removed.
    pub fn string_value(&self) -> Option<String> {
        let field = self.value_field()?;
        let start = field.iter().position(|&b| b != b' ')?;
        if field[start] != b'\'' {
            return None;
        }
        let mut out = Vec::new();
        let mut i = start + 1;
        while i < field.len() {
            if field[i] == b'\'' {
                if field.get(i + 1) == Some(&b'\'') {
                    out.push(b'\'');
                    i += 2;
                    continue;
                }
                let text = ascii::decode(&out)?;
                return Some(String::from(text.trim_end()));
            }
            out.push(field[i]);
            i += 1;
        }
        None
    }

    /// A card with an integer value, right-justified in columns 11-30.
    pub fn integer(keyword: &str, value: i64, comment: Option<&str>) -> Result<Card> {
        let mut card = Card::with_indicator(keyword)?;
        let text = alloc::format!("{value}");
        right_justify(text.as_bytes(), &mut card.image[10..30]);
        card.append_comment(30, comment)?;
        Ok(card)
    }

    /// A card with a logical value in column 30.
    pub fn logical(keyword: &str, value: bool, comment: Option<&str>) -> Result<Card> {
        let mut card = Card::with_indicator(keyword)?;
        card.image[29] = if value { b'T' } else { b'F' };
        card.append_comment(30, comment)?;
        Ok(card)
    }

    /// A card with a quoted string value starting in column 11.
    ///
    /// Embedded quotes are doubled and the string is padded to at least
    /// eight characters between the quotes.
    pub fn string(keyword: &str, value: &str, comment: Option<&str>) -> Result<Card> {
        let mut card = Card::with_indicator(keyword)?;
        let bytes = ascii::encode(value).ok_or(Error::InvalidValue)?;

        let mut pos = 10;
        card.image[pos] = b'\'';
        pos += 1;
        for b in bytes {
            let needed = if b == b'\'' { 2 } else { 1 };
            // Leave room for the closing quote.
            if pos + needed >= CARD_SIZE {
                return Err(Error::InvalidValue);
            }
            card.image[pos] = b;
            if b == b'\'' {
                card.image[pos + 1] = b'\'';
            }
            pos += needed;
        }
        pos = pos.max(19);
        card.image[pos] = b'\'';
        card.append_comment(pos + 1, comment)?;
        Ok(card)
    }

    /// A commentary card (`COMMENT`, `HISTORY` or blank keyword) holding
    /// free text in columns 9-80.
    pub fn commentary(keyword: &str, text: &str) -> Result<Card> {
        let mut card = Card::blank();
        card.image[..8].copy_from_slice(&keyword_field(keyword)?);
        if !card.is_commentary() {
            return Err(Error::InvalidKeyword);
        }
        let bytes = ascii::encode(text).ok_or(Error::InvalidValue)?;
        if bytes.len() > CARD_SIZE - 8 {
            return Err(Error::InvalidValue);
        }
        card.image[8..8 + bytes.len()].copy_from_slice(&bytes);
        Ok(card)
    }

    /// The END card.
    pub fn end() -> Card {
        let mut card = Card::blank();
        card.image[..8].copy_from_slice(END_KEYWORD);
        card
    }

    fn blank() -> Card {
        Card {
            image: [b' '; CARD_SIZE],
        }
    }

    fn with_indicator(keyword: &str) -> Result<Card> {
        let field = keyword_field(keyword)?;
        if COMMENTARY_KEYWORDS.contains(&&field) || &field == END_KEYWORD {
            return Err(Error::InvalidKeyword);
        }
        let mut card = Card::blank();
        card.image[..8].copy_from_slice(&field);
        card.image[8] = b'=';
        Ok(card)
    }

    /// Write ` / comment` after the value, starting at byte `after`.
    fn append_comment(&mut self, after: usize, comment: Option<&str>) -> Result<()> {
        let Some(comment) = comment else {
            return Ok(());
        };
        let bytes = ascii::encode(comment).ok_or(Error::InvalidValue)?;
        let start = after + 3;
        if start >= CARD_SIZE {
            return Ok(());
        }
        self.image[after + 1] = b'/';
        let len = bytes.len().min(CARD_SIZE - start);
        self.image[start..start + len].copy_from_slice(&bytes[..len]);
        Ok(())
    }
}

/// Validate a keyword and pad it to the 8-byte keyword field.
fn keyword_field(keyword: &str) -> Result<[u8; 8]> {
    let bytes = keyword.as_bytes();
    if bytes.len() > 8 || !bytes.iter().all(|&b| is_keyword_byte(b)) {
        return Err(Error::InvalidKeyword);
    }
    let mut field = [b' '; 8];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

fn is_keyword_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_')
}

/// Right-justify `src` within `dest`, padding the left with spaces.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[..start].fill(b' ');
    dest[start..].copy_from_slice(&src[..len]);
}

/// Parse a single 80-byte FITS header card.
///
/// Only the keyword alphabet and the 7-bit character set are checked; the
/// value field is kept verbatim.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card> {
    if !card_bytes[..8].iter().all(|&b| is_keyword_byte(b)) {
        return Err(Error::InvalidKeyword);
    }
    if ascii::decode(&card_bytes[8..]).is_none() {
        return Err(Error::InvalidHeader("non-ASCII card text"));
    }
    Ok(Card { image: *card_bytes })
}

// ── Headers ──

/// The cards of one header, in file order, without the END card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// An empty header.
    pub fn new() -> Self {
        Header::default()
    }

    /// Minimal primary header: `SIMPLE = T`, `BITPIX = 8`, `NAXIS = 0`.
    pub fn primary() -> Result<Self> {
        let mut header = Header::new();
        header.set_logical("SIMPLE", true, Some("conforms to FITS standard"))?;
        header.set_integer("BITPIX", 8, Some("array data type"))?;
        header.set_integer("NAXIS", 0, Some("number of array dimensions"))?;
        Ok(header)
    }

    /// Minimal IMAGE extension header with no data.
    pub fn image_extension() -> Result<Self> {
        let mut header = Header::new();
        header.set_string("XTENSION", "IMAGE", Some("image extension"))?;
        header.set_integer("BITPIX", 8, Some("array data type"))?;
        header.set_integer("NAXIS", 0, Some("number of array dimensions"))?;
        header.set_integer("PCOUNT", 0, Some("number of parameters"))?;
        header.set_integer("GCOUNT", 1, Some("number of groups"))?;
        Ok(header)
    }

    /// Parse consecutive 2880-byte header blocks until the END card.
    ///
    /// Trailing bytes shorter than a full block are ignored.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BLOCK_SIZE {
            return Err(Error::UnexpectedEof);
        }
        let mut header = Header::new();
        for block in data.chunks_exact(BLOCK_SIZE) {
            if header.push_block(block)? {
                return Ok(header);
            }
        }
        Err(Error::UnexpectedEof)
    }

    /// Parse the cards of one block, returning `true` once END is seen.
    fn push_block(&mut self, block: &[u8]) -> Result<bool> {
        for chunk in block.chunks_exact(CARD_SIZE) {
            let card_bytes: &[u8; CARD_SIZE] = chunk
                .try_into()
                .map_err(|_| Error::InvalidHeader("short card"))?;
            let card = parse_card(card_bytes)?;
            if card.is_end() {
                return Ok(true);
            }
            self.cards.push(card);
        }
        Ok(false)
    }

    /// All cards in file order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards, not counting END.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns `true` if the header holds no cards besides END.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Append a card. END is implied and cannot be added explicitly.
    pub fn push(&mut self, card: Card) -> Result<()> {
        if card.is_end() {
            return Err(Error::InvalidKeyword);
        }
        self.cards.push(card);
        Ok(())
    }

    /// First card with the given keyword.
    pub fn get(&self, keyword: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.keyword_str() == keyword)
    }

    /// Integer value of the first card with the given keyword.
    pub fn integer_value(&self, keyword: &str) -> Option<i64> {
        self.get(keyword)?.integer_value()
    }

    /// Logical value of the first card with the given keyword.
    pub fn logical_value(&self, keyword: &str) -> Option<bool> {
        self.get(keyword)?.logical_value()
    }

    /// String value of the first card with the given keyword.
    pub fn string_value(&self, keyword: &str) -> Option<String> {
        self.get(keyword)?.string_value()
    }

    /// Replace the first card with the same keyword, or append if absent.
    /// Commentary cards are always appended.
    pub fn set(&mut self, card: Card) -> Result<()> {
        if !card.is_commentary() {
            let keyword = card.keyword_str();
            if let Some(slot) = self.cards.iter_mut().find(|c| c.keyword_str() == keyword) {
                *slot = card;
                return Ok(());
            }
        }
        self.push(card)
    }

    /// Set an integer-valued keyword.
    pub fn set_integer(&mut self, keyword: &str, value: i64, comment: Option<&str>) -> Result<()> {
        self.set(Card::integer(keyword, value, comment)?)
    }

    /// Set a logical-valued keyword.
    pub fn set_logical(&mut self, keyword: &str, value: bool, comment: Option<&str>) -> Result<()> {
        self.set(Card::logical(keyword, value, comment)?)
    }

    /// Set a string-valued keyword.
    pub fn set_string(&mut self, keyword: &str, value: &str, comment: Option<&str>) -> Result<()> {
        self.set(Card::string(keyword, value, comment)?)
    }

    /// Remove every card with the given keyword, returning how many were removed.
    pub fn remove(&mut self, keyword: &str) -> usize {
        let before = self.cards.len();
        self.cards.retain(|c| c.keyword_str() != keyword);
        before - self.cards.len()
    }

    /// Stable-sort the cards into legal keyword order.
    ///
    /// Structural keywords move to the front in their required sequence;
    /// all other cards keep their relative order.
    pub fn sort_cards(&mut self) {
        self.cards
            .sort_by(|a, b| HeaderOrder::compare(&a.token(), &b.token()));
    }

    /// Index of the first card that must be written before its predecessor.
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.cards
            .windows(2)
            .position(|w| HeaderOrder::compare(&w[0].token(), &w[1].token()) == Ordering::Greater)
            .map(|i| i + 1)
    }

    /// Returns `true` if the cards are already in legal keyword order.
    pub fn is_ordered(&self) -> bool {
        self.first_out_of_order().is_none()
    }

    /// Serialize into complete header blocks: the cards, END, then
    /// space-filled padding up to the block boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let total_cards = self.cards.len() + 1;
        let total_bytes = total_cards.div_ceil(CARDS_PER_BLOCK) * BLOCK_SIZE;
        let mut buf = Vec::with_capacity(total_bytes);
        for card in &self.cards {
            buf.extend_from_slice(card.as_bytes());
        }
        buf.extend_from_slice(Card::end().as_bytes());
        buf.resize(total_bytes, HEADER_PAD_BYTE);
        buf
    }
}

impl Payload for Header {
    fn true_size(&self) -> u64 {
        ((self.cards.len() + 1) * CARD_SIZE) as u64
    }

    fn write_payload<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        for card in &self.cards {
            out.write_all(card.as_bytes())?;
        }
        out.write_all(Card::end().as_bytes())?;
        Ok(())
    }

    /// Reads whole blocks until the END card, which leaves the medium on the
    /// block boundary after the header.
    fn read_payload<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<()> {
        self.cards.clear();
        let mut block = [0u8; BLOCK_SIZE];
        loop {
            input.read_exact(&mut block)?;
            if self.push_block(&block)? {
                return Ok(());
            }
        }
    }

    fn pad_byte(&self) -> u8 {
        HEADER_PAD_BYTE
    }

    // A header segment describes itself.
    fn fill_header(&self, _header: &mut Header) -> Result<()> {
        Ok(())
    }
}

// ── Tests ──
