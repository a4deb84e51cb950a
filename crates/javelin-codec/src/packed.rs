//! The packed integer primitive shared by every format version: big-endian
//! base-128, seven payload bits per byte, high bit set on every byte except
//! the last. One to five bytes per `u32`.

use std::io::{self, Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{Error, Result};

pub(crate) fn write_packed_u32<W: Write>(out: &mut W, mut value: u32) -> io::Result<()> {
    let mut buf = [0u8; 5];
    let mut start = 4;
    buf[4] = (value & 0x7F) as u8;
    value >>= 7;
    while value != 0 {
        start -= 1;
        buf[start] = ((value & 0x7F) as u8) | 0x80;
        value >>= 7;
    }
    out.write_all(&buf[start..])
}

pub(crate) fn write_packed_usize<W: Write>(out: &mut W, value: usize) -> Result<()> {
    let value = u32::try_from(value).map_err(|_| Error::Corrupt("section too large"))?;
    write_packed_u32(out, value)?;
    Ok(())
}

pub(crate) fn read_packed_u32<R: Read>(input: &mut R) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..5 {
        let byte = input.read_u8()?;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Corrupt("overlong packed integer"))
}

/// Forwards to an inner writer while counting bytes, so writers can report
/// the serialized size.
pub(crate) struct CountingWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> CountingWriter<W> {
        CountingWriter { inner, written: 0 }
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
