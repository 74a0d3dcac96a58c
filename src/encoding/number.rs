//! Varint codecs over byte streams.
//!
//! All decode failures are [`Error::Format`]: premature end of stream,
//! codewords that overflow the target width, and block counts larger than
//! the caller's buffer. Encoding failures are [`Error::Bounds`] (a value
//! that does not fit the requested fixed width, a block larger than
//! [`INT_BLOCK_MAX`]). Nothing is clamped or silently truncated.

use std::io::{ErrorKind, Read, Write};

use crate::error::{Error, Result};

/// Maximum number of values in one int block codeword.
pub const INT_BLOCK_MAX: usize = 128;

/// Byte-counting writer for the varint codecs.
pub struct NumberWriter<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> NumberWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Total bytes emitted so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flushes and returns the underlying stream.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.inner.write_all(&[byte])?;
        self.bytes_written += 1;
        Ok(())
    }

    /// Writes raw bytes unchanged.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Seven payload bits per byte, high bit set while more bytes follow.
    pub fn write_seven_bit_terminated(&mut self, mut value: u32) -> Result<()> {
        loop {
            let group = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                self.write_byte(group | 0x80)?;
            } else {
                return self.write_byte(group);
            }
        }
    }

    /// Six payload bits per byte, high bit set while more bytes follow.
    pub fn write_six_bit_terminated(&mut self, mut value: u32) -> Result<()> {
        loop {
            let group = (value & 0x3F) as u8;
            value >>= 6;
            if value != 0 {
                self.write_byte(group | 0x80)?;
            } else {
                return self.write_byte(group);
            }
        }
    }

    /// Exactly `length` seven-bit groups, LSB first, no continuation bit.
    ///
    /// The length is agreed out of band; a value that needs more groups than
    /// `length` is a bounds error.
    pub fn write_seven_bit_fixed(&mut self, mut value: u32, length: usize) -> Result<()> {
        for _ in 0..length {
            self.write_byte((value & 0x7F) as u8)?;
            value >>= 7;
        }
        if value != 0 {
            return Err(Error::bounds(format!(
                "value does not fit in {length} seven-bit groups"
            )));
        }
        Ok(())
    }

    /// Length-prefixed batch of up to [`INT_BLOCK_MAX`] values.
    pub fn write_int_block(&mut self, values: &[u32]) -> Result<()> {
        if values.len() > INT_BLOCK_MAX {
            return Err(Error::bounds(format!(
                "int block of {} values exceeds maximum {INT_BLOCK_MAX}",
                values.len()
            )));
        }
        self.write_seven_bit_terminated(values.len() as u32)?;
        for &value in values {
            self.write_seven_bit_terminated(value)?;
        }
        Ok(())
    }

    /// Seven-bit terminated scheme widened to 64 bits.
    ///
    /// Used by the binary tree format for full-width counts and scalars; the
    /// 32-bit codec above is the wire contract for everything else.
    pub fn write_seven_bit_terminated_u64(&mut self, mut value: u64) -> Result<()> {
        loop {
            let group = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                self.write_byte(group | 0x80)?;
            } else {
                return self.write_byte(group);
            }
        }
    }
}

/// Byte-counting reader for the varint codecs.
pub struct NumberReader<R: Read> {
    inner: R,
    bytes_read: u64,
    peeked: Option<u8>,
}

impl<R: Read> NumberReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
            peeked: None,
        }
    }

    /// Total bytes consumed so far (including one byte of lookahead).
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    fn fetch_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.bytes_read += 1;
                    return Ok(Some(buf[0]));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        self.fetch_byte()?
            .ok_or_else(|| Error::format("unexpected end of stream"))
    }

    /// Looks at the next byte without consuming it.
    pub fn peek_byte(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            self.peeked = self.fetch_byte()?;
        }
        Ok(self.peeked)
    }

    /// True when no further bytes are available.
    pub fn end_of_stream(&mut self) -> Result<bool> {
        Ok(self.peek_byte()?.is_none())
    }

    /// Fills `buf` exactly, failing with a format error on premature end.
    pub fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        let mut filled = 0;
        if let Some(byte) = self.peeked.take() {
            buf[0] = byte;
            filled = 1;
        }
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::format("unexpected end of stream")),
                Ok(n) => {
                    self.bytes_read += n as u64;
                    filled += n;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Inverse of [`NumberWriter::write_seven_bit_terminated`].
    pub fn read_seven_bit_terminated(&mut self) -> Result<u32> {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            let group = (byte & 0x7F) as u32;
            if shift > 28 || (shift == 28 && group > 0x0F) {
                return Err(Error::format("seven-bit codeword overflows u32"));
            }
            value |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Inverse of [`NumberWriter::write_six_bit_terminated`].
    pub fn read_six_bit_terminated(&mut self) -> Result<u32> {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let byte = self.read_byte()?;
            let group = (byte & 0x3F) as u32;
            if shift > 30 || (shift == 30 && group > 0x03) {
                return Err(Error::format("six-bit codeword overflows u32"));
            }
            value |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 6;
        }
    }

    /// Inverse of [`NumberWriter::write_seven_bit_fixed`].
    pub fn read_seven_bit_fixed(&mut self, length: usize) -> Result<u32> {
        let mut value = 0u64;
        for i in 0..length {
            let byte = self.read_byte()?;
            value |= ((byte & 0x7F) as u64) << (7 * i as u64);
        }
        u32::try_from(value)
            .map_err(|_| Error::format("fixed seven-bit codeword overflows u32"))
    }

    /// Inverse of [`NumberWriter::write_int_block`].
    ///
    /// Reads the count prefix then that many codewords into `buf`, returning
    /// the count actually read. A count exceeding `buf.len()` is a format
    /// error: the stream asked for more room than the caller provided.
    pub fn read_int_block(&mut self, buf: &mut [u32]) -> Result<usize> {
        let count = self.read_seven_bit_terminated()? as usize;
        if count > buf.len() {
            return Err(Error::format(format!(
                "int block count {count} exceeds buffer capacity {}",
                buf.len()
            )));
        }
        for slot in buf[..count].iter_mut() {
            *slot = self.read_seven_bit_terminated()?;
        }
        Ok(count)
    }

    /// Inverse of [`NumberWriter::write_seven_bit_terminated_u64`].
    pub fn read_seven_bit_terminated_u64(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u64;
        loop {
            let byte = self.read_byte()?;
            let group = (byte & 0x7F) as u64;
            if shift > 63 || (shift == 63 && group > 0x01) {
                return Err(Error::format("seven-bit codeword overflows u64"));
            }
            value |= group << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    /// Bion-style harness: write into a buffer, assert the writer's byte
    /// count, read everything back, assert the reader consumed exactly as
    /// many bytes.
    fn buffered_round_trip(
        write: impl FnOnce(&mut NumberWriter<Vec<u8>>) -> Result<()>,
        read: impl FnOnce(&mut NumberReader<&[u8]>) -> Result<()>,
    ) {
        let mut writer = NumberWriter::new(Vec::new());
        assert_eq!(writer.bytes_written(), 0);
        write(&mut writer).unwrap();
        let bytes_written = writer.bytes_written();
        let buffer = writer.into_inner().unwrap();
        assert_eq!(buffer.len() as u64, bytes_written);

        let mut reader = NumberReader::new(buffer.as_slice());
        read(&mut reader).unwrap();
        assert!(reader.end_of_stream().unwrap());
        assert_eq!(reader.bytes_read(), bytes_written);
    }

    #[test]
    fn round_trip_seven_bit_terminated() {
        buffered_round_trip(
            |writer| {
                for i in 0..100_000u32 {
                    writer.write_seven_bit_terminated(i)?;
                }
                Ok(())
            },
            |reader| {
                let mut expected = 0u32;
                while !reader.end_of_stream()? {
                    assert_eq!(reader.read_seven_bit_terminated()?, expected);
                    expected += 1;
                }
                assert_eq!(expected, 100_000);
                Ok(())
            },
        );
    }

    #[test]
    fn round_trip_six_bit_terminated() {
        buffered_round_trip(
            |writer| {
                for i in 0..100_000u32 {
                    writer.write_six_bit_terminated(i)?;
                }
                Ok(())
            },
            |reader| {
                let mut expected = 0u32;
                while !reader.end_of_stream()? {
                    assert_eq!(reader.read_six_bit_terminated()?, expected);
                    expected += 1;
                }
                assert_eq!(expected, 100_000);
                Ok(())
            },
        );
    }

    #[test]
    fn round_trip_seven_bit_fixed() {
        let fixed_length = 5;
        buffered_round_trip(
            |writer| {
                for i in 0..100_000u32 {
                    writer.write_seven_bit_fixed(i, fixed_length)?;
                }
                Ok(())
            },
            |reader| {
                let mut expected = 0u32;
                while !reader.end_of_stream()? {
                    assert_eq!(reader.read_seven_bit_fixed(fixed_length)?, expected);
                    expected += 1;
                }
                assert_eq!(expected, 100_000);
                Ok(())
            },
        );
    }

    #[test]
    fn round_trip_int_block() {
        buffered_round_trip(
            |writer| {
                let mut block = [0u32; INT_BLOCK_MAX];
                let mut filled = 0;
                for i in 0..100_000u32 {
                    block[filled] = i;
                    filled += 1;
                    if filled == INT_BLOCK_MAX {
                        writer.write_int_block(&block[..filled])?;
                        filled = 0;
                    }
                }
                writer.write_int_block(&block[..filled])
            },
            |reader| {
                let mut block = [0u32; INT_BLOCK_MAX];
                let mut expected = 0u32;
                while !reader.end_of_stream()? {
                    let count = reader.read_int_block(&mut block)?;
                    for &value in &block[..count] {
                        assert_eq!(value, expected);
                        expected += 1;
                    }
                }
                assert_eq!(expected, 100_000);
                Ok(())
            },
        );
    }

    #[test]
    fn boundary_values_round_trip() {
        let boundary = [
            0u32,
            1,
            0x7F,
            0x80,
            0x3FFF,
            0x4000,
            0x1F_FFFF,
            0x20_0000,
            0x0FFF_FFFF,
            0x1000_0000,
            u32::MAX,
        ];
        buffered_round_trip(
            |writer| {
                for &value in &boundary {
                    writer.write_seven_bit_terminated(value)?;
                    writer.write_six_bit_terminated(value)?;
                    writer.write_seven_bit_fixed(value, 5)?;
                }
                Ok(())
            },
            |reader| {
                for &value in &boundary {
                    assert_eq!(reader.read_seven_bit_terminated()?, value);
                    assert_eq!(reader.read_six_bit_terminated()?, value);
                    assert_eq!(reader.read_seven_bit_fixed(5)?, value);
                }
                Ok(())
            },
        );
    }

    #[test]
    fn zero_encodes_to_single_terminal_byte() {
        let mut writer = NumberWriter::new(Vec::new());
        writer.write_seven_bit_terminated(0).unwrap();
        writer.write_six_bit_terminated(0).unwrap();
        let buffer = writer.into_inner().unwrap();
        assert_eq!(buffer, vec![0x00, 0x00]);
    }

    #[test]
    fn seven_bit_byte_layout() {
        let mut writer = NumberWriter::new(Vec::new());
        writer.write_seven_bit_terminated(300).unwrap();
        let buffer = writer.into_inner().unwrap();
        // 300 = 0b10_0101100: low group 0x2C with continuation, high group 0x02
        assert_eq!(buffer, vec![0xAC, 0x02]);
    }

    #[test]
    fn six_bit_byte_layout() {
        let mut writer = NumberWriter::new(Vec::new());
        writer.write_six_bit_terminated(300).unwrap();
        let buffer = writer.into_inner().unwrap();
        // 300 = 0b100_101100: low group 0x2C with continuation, high group 0x04
        assert_eq!(buffer, vec![0xAC, 0x04]);
    }

    #[test]
    fn fixed_width_has_no_continuation_bits() {
        let mut writer = NumberWriter::new(Vec::new());
        writer.write_seven_bit_fixed(300, 5).unwrap();
        let buffer = writer.into_inner().unwrap();
        assert_eq!(buffer, vec![0x2C, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn fixed_width_rejects_values_that_do_not_fit() {
        let mut writer = NumberWriter::new(Vec::new());
        assert!(matches!(
            writer.write_seven_bit_fixed(300, 1),
            Err(Error::Bounds(_))
        ));
    }

    #[test]
    fn truncated_codeword_is_a_format_error() {
        let mut reader = NumberReader::new([0x80u8].as_slice());
        assert!(matches!(
            reader.read_seven_bit_terminated(),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn overlong_codeword_is_a_format_error() {
        let bytes = [0xFFu8, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let mut reader = NumberReader::new(bytes.as_slice());
        assert!(matches!(
            reader.read_seven_bit_terminated(),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn int_block_rejects_oversized_writes() {
        let values = vec![1u32; INT_BLOCK_MAX + 1];
        let mut writer = NumberWriter::new(Vec::new());
        assert!(matches!(
            writer.write_int_block(&values),
            Err(Error::Bounds(_))
        ));
    }

    #[test]
    fn int_block_count_beyond_buffer_is_a_format_error() {
        let mut writer = NumberWriter::new(Vec::new());
        writer.write_int_block(&[1, 2, 3, 4]).unwrap();
        let buffer = writer.into_inner().unwrap();

        let mut reader = NumberReader::new(buffer.as_slice());
        let mut small = [0u32; 2];
        assert!(matches!(
            reader.read_int_block(&mut small),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn u64_extension_round_trips_full_width() {
        buffered_round_trip(
            |writer| {
                for &value in &[0u64, 1, u32::MAX as u64, u64::MAX / 2, u64::MAX] {
                    writer.write_seven_bit_terminated_u64(value)?;
                }
                Ok(())
            },
            |reader| {
                for &value in &[0u64, 1, u32::MAX as u64, u64::MAX / 2, u64::MAX] {
                    assert_eq!(reader.read_seven_bit_terminated_u64()?, value);
                }
                Ok(())
            },
        );
    }

    #[test]
    fn round_trip_through_a_real_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("numbers.bin");

        let bytes_written;
        {
            let mut writer = NumberWriter::new(File::create(&path).unwrap());
            for i in 1000..1050u32 {
                writer.write_seven_bit_terminated(i).unwrap();
            }
            bytes_written = writer.bytes_written();
            writer.into_inner().unwrap();
        }
        assert_eq!(std::fs::metadata(&path).unwrap().len(), bytes_written);

        let mut reader = NumberReader::new(File::open(&path).unwrap());
        assert!(!reader.end_of_stream().unwrap());
        for i in 1000..1050u32 {
            assert_eq!(reader.read_seven_bit_terminated().unwrap(), i);
        }
        assert!(reader.end_of_stream().unwrap());
        assert_eq!(reader.bytes_read(), bytes_written);
    }
}
