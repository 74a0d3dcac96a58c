//! Compact binary implementation of the tree serialization protocol.
//!
//! A document is a token stream: one marker byte per token, payloads encoded
//! with the number codec. Strings are length-prefixed UTF-8; unsigned values
//! use the seven-bit terminated scheme (widened to 64 bits); signed values
//! are zigzag-mapped first; floats are eight raw little-endian bytes.
//!
//! `skip` walks one whole value generically, which is what makes unknown
//! members cheap to tolerate in this format too.

use std::io::{Read, Write};

use crate::encoding::{NumberReader, NumberWriter};
use crate::error::{Error, Result};
use crate::tree::{TreeReader, TreeWriter};

const START_OBJECT: u8 = 0xE0;
const END_OBJECT: u8 = 0xE1;
const FIELD: u8 = 0xE2;
const START_LIST: u8 = 0xE3;
const END_LIST: u8 = 0xE4;
const U64: u8 = 0xE5;
const I64: u8 = 0xE6;
const F64: u8 = 0xE7;
const TRUE: u8 = 0xE8;
const FALSE: u8 = 0xE9;
const STR: u8 = 0xEA;
const NULL: u8 = 0xEB;

fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Emits the binary token stream onto any `io::Write`.
pub struct BinaryTreeWriter<W: Write> {
    out: NumberWriter<W>,
}

impl<W: Write> BinaryTreeWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: NumberWriter::new(out),
        }
    }

    /// Total bytes emitted so far.
    pub fn bytes_written(&self) -> u64 {
        self.out.bytes_written()
    }

    /// Flushes and returns the underlying stream.
    pub fn into_inner(self) -> Result<W> {
        self.out.into_inner()
    }

    fn marker(&mut self, marker: u8) -> Result<()> {
        self.out.write_raw(&[marker])
    }

    fn string_payload(&mut self, value: &str) -> Result<()> {
        self.out
            .write_seven_bit_terminated_u64(value.len() as u64)?;
        self.out.write_raw(value.as_bytes())
    }
}

impl<W: Write> TreeWriter for BinaryTreeWriter<W> {
    fn start_object(&mut self) -> Result<()> {
        self.marker(START_OBJECT)
    }

    fn end_object(&mut self) -> Result<()> {
        self.marker(END_OBJECT)
    }

    fn field(&mut self, name: &str) -> Result<()> {
        self.marker(FIELD)?;
        self.string_payload(name)
    }

    fn start_list(&mut self) -> Result<()> {
        self.marker(START_LIST)
    }

    fn end_list(&mut self) -> Result<()> {
        self.marker(END_LIST)
    }

    fn value_u64(&mut self, value: u64) -> Result<()> {
        self.marker(U64)?;
        self.out.write_seven_bit_terminated_u64(value)
    }

    fn value_i64(&mut self, value: i64) -> Result<()> {
        self.marker(I64)?;
        self.out.write_seven_bit_terminated_u64(zigzag(value))
    }

    fn value_f64(&mut self, value: f64) -> Result<()> {
        self.marker(F64)?;
        self.out.write_raw(&value.to_le_bytes())
    }

    fn value_bool(&mut self, value: bool) -> Result<()> {
        self.marker(if value { TRUE } else { FALSE })
    }

    fn value_str(&mut self, value: &str) -> Result<()> {
        self.marker(STR)?;
        self.string_payload(value)
    }

    fn value_null(&mut self) -> Result<()> {
        self.marker(NULL)
    }
}

/// Pulls the binary token stream off any `io::Read`.
pub struct BinaryTreeReader<R: Read> {
    input: NumberReader<R>,
}

impl<R: Read> BinaryTreeReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: NumberReader::new(input),
        }
    }

    /// Total bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.input.bytes_read()
    }

    /// True when the stream is exhausted.
    pub fn end_of_stream(&mut self) -> Result<bool> {
        self.input.end_of_stream()
    }

    fn next_marker(&mut self) -> Result<u8> {
        let mut marker = [0u8; 1];
        self.input.read_raw(&mut marker)?;
        Ok(marker[0])
    }

    fn peek_marker(&mut self) -> Result<Option<u8>> {
        self.input.peek_byte()
    }

    fn expect(&mut self, marker: u8, what: &str) -> Result<()> {
        let found = self.next_marker()?;
        if found != marker {
            return Err(Error::format(format!(
                "expected {what}, found marker 0x{found:02X}"
            )));
        }
        Ok(())
    }

    fn string_payload(&mut self) -> Result<String> {
        let length = self.input.read_seven_bit_terminated_u64()? as usize;
        let mut bytes = vec![0u8; length];
        self.input.read_raw(&mut bytes)?;
        String::from_utf8(bytes).map_err(|_| Error::format("invalid UTF-8 in string payload"))
    }

    fn skip_members(&mut self) -> Result<()> {
        loop {
            match self.peek_marker()? {
                Some(END_OBJECT) => {
                    self.next_marker()?;
                    return Ok(());
                }
                Some(FIELD) => {
                    self.next_marker()?;
                    self.string_payload()?;
                    self.skip()?;
                }
                Some(found) => {
                    return Err(Error::format(format!(
                        "expected field or object end, found marker 0x{found:02X}"
                    )))
                }
                None => return Err(Error::format("unexpected end of stream in object")),
            }
        }
    }

    fn skip_elements(&mut self) -> Result<()> {
        loop {
            match self.peek_marker()? {
                Some(END_LIST) => {
                    self.next_marker()?;
                    return Ok(());
                }
                Some(_) => self.skip()?,
                None => return Err(Error::format("unexpected end of stream in list")),
            }
        }
    }
}

impl<R: Read> TreeReader for BinaryTreeReader<R> {
    fn read_object(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn TreeReader, &str) -> Result<bool>,
    ) -> Result<()> {
        self.expect(START_OBJECT, "object start")?;
        loop {
            match self.peek_marker()? {
                Some(END_OBJECT) => {
                    self.next_marker()?;
                    return Ok(());
                }
                Some(FIELD) => {
                    self.next_marker()?;
                    let name = self.string_payload()?;
                    let handled = visit(self, &name)?;
                    if !handled {
                        self.skip()?;
                    }
                }
                Some(found) => {
                    return Err(Error::format(format!(
                        "expected field or object end, found marker 0x{found:02X}"
                    )))
                }
                None => return Err(Error::format("unexpected end of stream in object")),
            }
        }
    }

    fn read_list(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn TreeReader) -> Result<()>,
    ) -> Result<()> {
        self.expect(START_LIST, "list start")?;
        loop {
            match self.peek_marker()? {
                Some(END_LIST) => {
                    self.next_marker()?;
                    return Ok(());
                }
                Some(_) => visit(self)?,
                None => return Err(Error::format("unexpected end of stream in list")),
            }
        }
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.expect(U64, "unsigned value")?;
        self.input.read_seven_bit_terminated_u64()
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.expect(I64, "signed value")?;
        Ok(unzigzag(self.input.read_seven_bit_terminated_u64()?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.expect(F64, "float value")?;
        let mut bytes = [0u8; 8];
        self.input.read_raw(&mut bytes)?;
        Ok(f64::from_le_bytes(bytes))
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.next_marker()? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            found => Err(Error::format(format!(
                "expected boolean value, found marker 0x{found:02X}"
            ))),
        }
    }

    fn read_str(&mut self) -> Result<String> {
        self.expect(STR, "string value")?;
        self.string_payload()
    }

    fn skip(&mut self) -> Result<()> {
        match self.next_marker()? {
            START_OBJECT => self.skip_members(),
            START_LIST => self.skip_elements(),
            U64 | I64 => {
                self.input.read_seven_bit_terminated_u64()?;
                Ok(())
            }
            F64 => {
                let mut bytes = [0u8; 8];
                self.input.read_raw(&mut bytes)
            }
            STR => {
                self.string_payload()?;
                Ok(())
            }
            TRUE | FALSE | NULL => Ok(()),
            found => Err(Error::format(format!(
                "cannot skip marker 0x{found:02X}"
            ))),
        }
    }
}
