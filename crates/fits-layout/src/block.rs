use crate::io::Write;

/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Padding byte used for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = 0x20;

/// Padding byte used for data blocks (zero).
pub const DATA_PAD_BYTE: u8 = 0x00;

const BLOCK_BYTES: u64 = BLOCK_SIZE as u64;

/// Returns the number of FITS blocks required to hold `num_bytes` bytes.
///
/// A FITS file is organized in units of 2880 bytes. This computes the ceiling
/// division: 0 bytes requires 0 blocks, 1 byte requires 1 block, 2880 bytes
/// requires 1 block, 2881 bytes requires 2 blocks, etc.
pub const fn blocks_needed(num_bytes: u64) -> u64 {
    num_bytes.div_ceil(BLOCK_BYTES)
}

/// Returns the total byte length (in whole blocks) required to hold `num_bytes`.
///
/// This is simply `blocks_needed(num_bytes) * BLOCK_SIZE`.
pub const fn padded_byte_len(num_bytes: u64) -> u64 {
    blocks_needed(num_bytes) * BLOCK_BYTES
}

/// Like [`padded_byte_len`], but `None` when the padded length does not fit
/// in a `u64`.
pub const fn checked_padded_byte_len(num_bytes: u64) -> Option<u64> {
    blocks_needed(num_bytes).checked_mul(BLOCK_BYTES)
}

/// Number of filler bytes that follow a `num_bytes` payload up to the next
/// block boundary. Always in `0..BLOCK_SIZE`.
pub const fn padding_len(num_bytes: u64) -> u64 {
    padded_byte_len(num_bytes) - num_bytes
}

/// Write `len` copies of `pad_byte` to `out`, one block-sized chunk at a time.
pub fn write_padding<W: Write + ?Sized>(
    out: &mut W,
    len: u64,
    pad_byte: u8,
) -> crate::io::Result<()> {
    let chunk = [pad_byte; BLOCK_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(BLOCK_BYTES) as usize;
        out.write_all(&chunk[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}
