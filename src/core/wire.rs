// Bounded stream cursor and little-endian field helpers for fixed records.
use std::io::{self, Read, Seek, SeekFrom};

use crate::core::error::{Error, ErrorKind};

/// Seekable view over the dataset stream that knows the stream length, so every
/// seek and read can be checked against the end before touching the source.
pub(crate) struct StreamCursor<'a, R> {
    stream: &'a mut R,
    len: u64,
    pos: u64,
}

impl<'a, R: Read + Seek> StreamCursor<'a, R> {
    pub fn new(stream: &'a mut R, len: u64) -> Self {
        Self {
            stream,
            len,
            pos: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    pub fn seek_to(&mut self, offset: u64) -> Result<(), Error> {
        if offset > self.len {
            return Err(Error::corrupt("offset points past end of stream").with_offset(offset));
        }
        self.stream
            .seek(SeekFrom::Start(offset))
            .map_err(|err| io_error(err, offset))?;
        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, len: u64) -> Result<(), Error> {
        let target = self
            .pos
            .checked_add(len)
            .ok_or_else(|| Error::corrupt("skip length overflow").with_offset(self.pos))?;
        self.seek_to(target)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        if len as u64 > self.remaining() {
            return Err(Error::corrupt("short read").with_offset(self.pos));
        }
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(i32::from_le_bytes(self.read_array::<4>()?))
    }

    /// Reads a signed 32-bit count or length and rejects negative values.
    pub fn read_len(&mut self, what: &str) -> Result<usize, Error> {
        let at = self.pos;
        let value = self.read_i32()?;
        usize::try_from(value)
            .map_err(|_| Error::corrupt(format!("negative {what}: {value}")).with_offset(at))
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let at = self.pos;
        self.stream
            .read_exact(buf)
            .map_err(|err| io_error(err, at))?;
        self.pos += buf.len() as u64;
        Ok(())
    }
}

fn io_error(err: io::Error, offset: u64) -> Error {
    let kind = match err.kind() {
        io::ErrorKind::UnexpectedEof => ErrorKind::Corrupt,
        _ => ErrorKind::Io,
    };
    let message = if kind == ErrorKind::Corrupt {
        "short read"
    } else {
        "stream read failed"
    };
    Error::new(kind)
        .with_message(message)
        .with_offset(offset)
        .with_source(err)
}

/// Returns the total length of a seekable stream and rewinds it to the start.
pub(crate) fn stream_len<R: Seek>(stream: &mut R) -> Result<u64, Error> {
    let len = stream.seek(SeekFrom::End(0)).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to size stream")
            .with_source(err)
    })?;
    stream.seek(SeekFrom::Start(0)).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to rewind stream")
            .with_source(err)
    })?;
    Ok(len)
}

pub(crate) fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(read_4(buf, offset))
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(read_4(buf, offset))
}

pub(crate) fn read_i64(buf: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(read_8(buf, offset))
}

pub(crate) fn read_4(buf: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[offset..offset + 4]);
    out
}

pub(crate) fn read_8(buf: &[u8], offset: usize) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&buf[offset..offset + 8]);
    out
}
