//! Walking and assembling the header/data records of a FITS medium.

use alloc::vec::Vec;

use log::debug;

use crate::block::{checked_padded_byte_len, BLOCK_SIZE};
use crate::data::{Payload, Segment};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::io::{
    is_unexpected_eof, stream_len, stream_position, Medium, Read, Seek, SeekFrom, Write,
};

/// Position of one Header Data Unit on a medium.
#[derive(Debug, Clone)]
pub struct HduLayout {
    /// The header, bound to where it was read.
    pub header: Segment<Header>,
    /// Unpadded length of the data segment that follows the header.
    pub data_len: u64,
}

impl HduLayout {
    /// Byte offset of the first data byte.
    pub fn data_start(&self) -> u64 {
        self.header.file_offset().unwrap_or(0) + self.header.padded_size()
    }

    /// Byte offset just past this HDU's padded data.
    ///
    /// Fails with [`Error::InvalidHeader`] when the offset does not fit in a
    /// `u64`.
    pub fn end(&self) -> Result<u64> {
        checked_padded_byte_len(self.data_len)
            .and_then(|padded| self.data_start().checked_add(padded))
            .ok_or(Error::InvalidHeader("data size overflow"))
    }
}

fn required(header: &Header, keyword: &'static str) -> Result<i64> {
    header
        .integer_value(keyword)
        .ok_or(Error::MissingKeyword(keyword))
}

fn non_negative(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::InvalidHeader("negative size keyword"))
}

/// Length in bytes of the data segment described by `header`, unpadded:
/// `|BITPIX| / 8 * GCOUNT * (PCOUNT + NAXIS1 * ... * NAXISn)`.
///
/// Random groups (`GROUPS = T`, `NAXIS1 = 0`) leave `NAXIS1` out of the
/// product.
pub fn data_byte_len(header: &Header) -> Result<u64> {
    let bitpix = required(header, "BITPIX")?;
    let naxis = non_negative(required(header, "NAXIS")?)?;
    if naxis == 0 {
        return Ok(0);
    }
    if naxis > 999 {
        return Err(Error::InvalidHeader("NAXIS out of range"));
    }

    let mut dims = Vec::with_capacity(naxis as usize);
    for i in 1..=naxis {
        let kw = alloc::format!("NAXIS{i}");
        let dim = header
            .integer_value(&kw)
            .ok_or(Error::MissingKeyword("NAXISn"))?;
        dims.push(non_negative(dim)?);
    }

    let groups = dims[0] == 0 && header.logical_value("GROUPS") == Some(true);
    let axes = if groups { &dims[1..] } else { &dims[..] };
    let pixels = axes
        .iter()
        .try_fold(1u64, |acc, &d| acc.checked_mul(d))
        .ok_or(Error::InvalidHeader("pixel count overflow"))?;

    let pcount = non_negative(header.integer_value("PCOUNT").unwrap_or(0))?;
    let gcount = match non_negative(header.integer_value("GCOUNT").unwrap_or(1))? {
        0 => 1,
        g => g,
    };
    let bytes_per_value = bitpix.unsigned_abs() / 8;

    pcount
        .checked_add(pixels)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bytes_per_value))
        .ok_or(Error::InvalidHeader("data size overflow"))
}

/// Walk every HDU from the current position of `medium` to its end.
///
/// Each header is read through a bound [`Segment`], so it can later be
/// rewritten in place. Trailing bytes shorter than one block are ignored.
/// The medium is left after the last HDU.
pub fn scan_hdus<M: Read + Seek + ?Sized>(medium: &mut M) -> Result<Vec<HduLayout>> {
    let len = stream_len(medium)?;
    let mut pos = stream_position(medium)?;
    let mut hdus = Vec::new();

    while pos + BLOCK_SIZE as u64 <= len {
        let mut header = Segment::new(Header::new());
        header.read(medium).map_err(|e| match e {
            Error::Io(ref io) if is_unexpected_eof(io) => Error::UnexpectedEof,
            other => other,
        })?;
        let data_len = data_byte_len(header.payload())?;
        let layout = HduLayout { header, data_len };
        pos = layout.end()?;
        debug!(
            "HDU {} at offset {}: {} data bytes",
            hdus.len(),
            layout.header.file_offset().unwrap_or(0),
            data_len
        );
        medium.seek(SeekFrom::Start(pos))?;
        hdus.push(layout);
    }

    Ok(hdus)
}

/// Append one HDU at the current position of `medium`.
///
/// `data` describes itself into `header`, the header is put into legal
/// keyword order, and both are written and bound.
pub fn append_hdu<M, P>(
    medium: &mut M,
    header: &mut Segment<Header>,
    data: &mut Segment<P>,
) -> Result<()>
where
    M: Write + Seek + ?Sized,
    P: Payload,
{
    data.payload().fill_header(header.payload_mut())?;
    header.payload_mut().sort_cards();
    header.write(medium)?;
    data.write(medium)?;
    Ok(())
}

/// Put every header on `medium` into legal keyword order, rewriting only
/// those that were out of order.
///
/// Returns the indices of the rewritten HDUs. Reordering never changes the
/// number of cards, so the footprint of each header is preserved.
pub fn reorder_headers<M: Medium + ?Sized>(medium: &mut M) -> Result<Vec<usize>> {
    medium.seek(SeekFrom::Start(0))?;
    let mut hdus = scan_hdus(medium)?;
    let mut rewritten = Vec::new();

    for (index, hdu) in hdus.iter_mut().enumerate() {
        if hdu.header.payload().is_ordered() {
            continue;
        }
        hdu.header.payload_mut().sort_cards();
        hdu.header.rewrite(medium)?;
        rewritten.push(index);
    }

    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Card;
    use crate::io::Cursor;
    use crate::raw::RawData;
    use alloc::vec;

    fn primary_with(cards: &[(&str, i64)]) -> Header {
        let mut header = Header::primary().unwrap();
        for &(kw, v) in cards {
            header.set_integer(kw, v, None).unwrap();
        }
        header
    }

    fn two_hdu_file() -> Cursor<Vec<u8>> {
        let mut medium = Cursor::new(Vec::new());
        let mut header = Segment::new(Header::primary().unwrap());
        let mut data = Segment::new(RawData::new(vec![1; 100]));
        append_hdu(&mut medium, &mut header, &mut data).unwrap();

        let mut ext = Segment::new(Header::image_extension().unwrap());
        let mut ext_data = Segment::new(RawData::new(vec![2; 3000]));
        append_hdu(&mut medium, &mut ext, &mut ext_data).unwrap();
        medium
    }

    // ---- data_byte_len ----

    #[test]
    fn data_len_no_axes() {
        assert_eq!(data_byte_len(&Header::primary().unwrap()).unwrap(), 0);
    }

    #[test]
    fn data_len_image() {
        let header = primary_with(&[("BITPIX", -32), ("NAXIS", 2), ("NAXIS1", 10), ("NAXIS2", 20)]);
        assert_eq!(data_byte_len(&header).unwrap(), 10 * 20 * 4);
    }

    #[test]
    fn data_len_with_heap() {
        let mut header = Header::image_extension().unwrap();
        header.set_integer("NAXIS", 2, None).unwrap();
        header.set_integer("NAXIS1", 8, None).unwrap();
        header.set_integer("NAXIS2", 3, None).unwrap();
        header.set_integer("PCOUNT", 100, None).unwrap();
        assert_eq!(data_byte_len(&header).unwrap(), 8 * 3 + 100);
    }

    #[test]
    fn data_len_random_groups() {
        let mut header = primary_with(&[
            ("BITPIX", 16),
            ("NAXIS", 3),
            ("NAXIS1", 0),
            ("NAXIS2", 4),
            ("NAXIS3", 5),
            ("PCOUNT", 2),
            ("GCOUNT", 3),
        ]);
        header.set_logical("GROUPS", true, None).unwrap();
        assert_eq!(data_byte_len(&header).unwrap(), 2 * 3 * (2 + 20));
    }

    #[test]
    fn data_len_missing_axis() {
        let header = primary_with(&[("NAXIS", 2), ("NAXIS1", 10)]);
        assert!(matches!(
            data_byte_len(&header),
            Err(Error::MissingKeyword("NAXISn"))
        ));
    }

    #[test]
    fn data_len_negative_axis() {
        let header = primary_with(&[("NAXIS", 1), ("NAXIS1", -10)]);
        assert!(matches!(
            data_byte_len(&header),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn data_len_overflow() {
        let header = primary_with(&[
            ("BITPIX", 64),
            ("NAXIS", 2),
            ("NAXIS1", i64::MAX),
            ("NAXIS2", i64::MAX),
        ]);
        assert!(matches!(
            data_byte_len(&header),
            Err(Error::InvalidHeader("pixel count overflow"))
        ));
    }

    // ---- append / scan ----

    #[test]
    fn append_fills_and_orders_header() {
        let mut medium = Cursor::new(Vec::new());
        let mut header = Segment::new(Header::primary().unwrap());
        header
            .payload_mut()
            .set(Card::commentary("COMMENT", "before the axes").unwrap())
            .unwrap();
        let mut data = Segment::new(RawData::new(vec![1; 100]));
        append_hdu(&mut medium, &mut header, &mut data).unwrap();

        assert!(header.payload().is_ordered());
        assert_eq!(header.payload().cards()[3].keyword_str(), "NAXIS1");
        assert_eq!(header.file_offset(), Some(0));
        assert_eq!(data.file_offset(), Some(2880));
        assert_eq!(medium.get_ref().len(), 5760);
    }

    #[test]
    fn scan_finds_every_hdu() {
        let mut medium = two_hdu_file();
        medium.seek(SeekFrom::Start(0)).unwrap();
        let hdus = scan_hdus(&mut medium).unwrap();

        assert_eq!(hdus.len(), 2);
        assert_eq!(hdus[0].header.file_offset(), Some(0));
        assert_eq!(hdus[0].data_start(), 2880);
        assert_eq!(hdus[0].data_len, 100);
        assert_eq!(hdus[1].header.file_offset(), Some(5760));
        assert_eq!(hdus[1].data_len, 3000);
        assert_eq!(hdus[1].end().unwrap(), medium.get_ref().len() as u64);
        assert_eq!(medium.position(), hdus[1].end().unwrap());
    }

    #[test]
    fn scan_ignores_short_trailer() {
        let mut medium = two_hdu_file();
        medium.get_mut().extend_from_slice(&[0u8; 100]);
        medium.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(scan_hdus(&mut medium).unwrap().len(), 2);
    }

    #[test]
    fn scan_truncated_header_is_eof() {
        let header = Header::primary().unwrap();
        let mut bytes = header.to_bytes();
        // Replace END with a blank card so the header runs off the end.
        bytes[3 * 80..3 * 80 + 3].copy_from_slice(b"   ");
        let mut medium = Cursor::new(bytes);
        assert!(matches!(
            scan_hdus(&mut medium),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn scan_data_size_past_u64_is_invalid() {
        let header = primary_with(&[("NAXIS", 2), ("NAXIS1", i64::MAX), ("NAXIS2", 2)]);
        assert_eq!(data_byte_len(&header).unwrap(), u64::MAX - 1);
        let mut medium = Cursor::new(header.to_bytes());
        assert!(matches!(
            scan_hdus(&mut medium),
            Err(Error::InvalidHeader("data size overflow"))
        ));
    }

    #[test]
    fn end_overflow_is_invalid() {
        let mut header = Segment::new(Header::primary().unwrap());
        header.bind_at(u64::MAX - 2880);
        let layout = HduLayout { header, data_len: 1 };
        assert!(matches!(layout.end(), Err(Error::InvalidHeader(_))));
    }

    #[cfg(feature = "std")]
    #[test]
    fn scan_read_failure_keeps_cause() {
        struct Unreadable(Cursor<Vec<u8>>);

        impl std::io::Read for Unreadable {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("device unplugged"))
            }
        }

        impl std::io::Seek for Unreadable {
            fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
                self.0.seek(pos)
            }
        }

        let mut medium = Unreadable(Cursor::new(Header::primary().unwrap().to_bytes()));
        match scan_hdus(&mut medium) {
            Err(Error::Io(e)) => assert_eq!(e.to_string(), "device unplugged"),
            other => panic!("expected Error::Io, got {other:?}"),
        }
    }

    #[test]
    fn scanned_data_segment_can_be_rewritten() {
        let mut medium = two_hdu_file();
        medium.seek(SeekFrom::Start(0)).unwrap();
        let hdus = scan_hdus(&mut medium).unwrap();

        let mut data = Segment::new(RawData::with_len(hdus[0].data_len as usize));
        medium
            .seek(SeekFrom::Start(hdus[0].data_start()))
            .unwrap();
        data.read(&mut medium).unwrap();
        data.payload_mut().bytes_mut().fill(7);
        data.rewrite(&mut medium).unwrap();

        let bytes = medium.get_ref();
        assert!(bytes[2880..2980].iter().all(|&b| b == 7));
        // The extension that follows is untouched.
        medium.seek(SeekFrom::Start(0)).unwrap();
        let again = scan_hdus(&mut medium).unwrap();
        assert_eq!(again[1].data_len, 3000);
    }

    // ---- reorder ----

    #[test]
    fn reorder_rewrites_only_misordered_headers() {
        let mut medium = Cursor::new(Vec::new());
        Segment::new(Header::primary().unwrap())
            .write(&mut medium)
            .unwrap();

        let mut ext = Header::new();
        ext.set_string("XTENSION", "IMAGE", None).unwrap();
        ext.set_integer("GCOUNT", 1, None).unwrap();
        ext.set_integer("BITPIX", 8, None).unwrap();
        ext.set_integer("PCOUNT", 0, None).unwrap();
        ext.set_integer("NAXIS", 0, None).unwrap();
        Segment::new(ext).write(&mut medium).unwrap();
        let before_len = medium.get_ref().len();

        let rewritten = reorder_headers(&mut medium).unwrap();
        assert_eq!(rewritten, vec![1]);
        assert_eq!(medium.get_ref().len(), before_len);

        medium.seek(SeekFrom::Start(0)).unwrap();
        let hdus = scan_hdus(&mut medium).unwrap();
        assert!(hdus.iter().all(|h| h.header.payload().is_ordered()));
        let keys: Vec<&str> = hdus[1]
            .header
            .payload()
            .cards()
            .iter()
            .map(|c| c.keyword_str())
            .collect();
        assert_eq!(keys, ["XTENSION", "BITPIX", "NAXIS", "PCOUNT", "GCOUNT"]);

        assert!(reorder_headers(&mut medium).unwrap().is_empty());
    }
}
