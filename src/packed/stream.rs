//! Little-endian framed streams for the parts of a file outside the packed
//! region: the header, sequence records and the material list.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::util::{Error, Result};

/// Input stream with position tracking and truncation reporting.
pub struct IStream<R> {
    reader: R,
    pos: u64,
}

impl<R: Read> IStream<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, pos: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    fn map_err(&self, what: &'static str, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::truncated(what, self.pos)
        } else {
            Error::Io(err)
        }
    }

    pub fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        let v = self.reader.read_u8().map_err(|e| self.map_err(what, e))?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_bool(&mut self, what: &'static str) -> Result<bool> {
        Ok(self.read_u8(what)? != 0)
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        let v = self.reader.read_u32::<LittleEndian>().map_err(|e| self.map_err(what, e))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32> {
        let v = self.reader.read_i32::<LittleEndian>().map_err(|e| self.map_err(what, e))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_f32(&mut self, what: &'static str) -> Result<f32> {
        let v = self.reader.read_f32::<LittleEndian>().map_err(|e| self.map_err(what, e))?;
        self.pos += 4;
        Ok(v)
    }

    /// Read exactly `len` bytes.
    ///
    /// The buffer grows with the data actually read, so a corrupt length
    /// cannot force a huge allocation up front.
    pub fn read_bytes(&mut self, what: &'static str, len: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let result = {
            let mut limited = (&mut self.reader).take(len as u64);
            limited.read_to_end(&mut out)
        };
        let read = result.map_err(|e| self.map_err(what, e))?;
        self.pos += read as u64;
        if read != len {
            return Err(Error::truncated(what, self.pos));
        }
        Ok(out)
    }

    /// Read a string prefixed with its u8 length.
    pub fn read_string(&mut self, what: &'static str) -> Result<Vec<u8>> {
        let len = self.read_u8(what)? as usize;
        self.read_bytes(what, len)
    }
}

/// Output stream mirroring [`IStream`].
pub struct OStream<W> {
    writer: W,
    pos: u64,
}

impl<W: Write> OStream<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, pos: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.pos += 1;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.writer.write_i32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.writer.write_f32::<LittleEndian>(value)?;
        self.pos += 4;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.pos += data.len() as u64;
        Ok(())
    }

    /// Write a u8-length-prefixed string, truncated to 255 bytes.
    pub fn write_string(&mut self, s: &[u8]) -> Result<()> {
        let s = &s[..s.len().min(u8::MAX as usize)];
        self.write_u8(s.len() as u8)?;
        self.write_bytes(s)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
