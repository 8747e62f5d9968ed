//! Low level parsing building blocks shared by the PLY header parser and the
//! two body decoders.

use std::{
    cmp::min,
    fmt,
    io,
    ops,
};

use byteorder::ByteOrder;
use failure::Fail;


pub(crate) mod buf;

/// Chunk size used by [`Input::skip`] so that skipping large lists never
/// requires a large look-ahead.
const SKIP_CHUNK_SIZE: usize = 4 * 1024;

/// A byte source with look-ahead. The bytes that are already buffered are
/// available via `Deref`.
pub(crate) trait Input: ops::Deref<Target = [u8]> {
    /// Makes sure at least `num_bytes` bytes are buffered. Returns
    /// `UnexpectedEof` if the input ends before.
    fn prepare(&mut self, num_bytes: usize) -> Result<(), Error>;

    /// Like `prepare`, but hitting EOF is not an error: afterwards, fewer
    /// than `num_bytes` bytes might be buffered.
    fn saturating_prepare(&mut self, num_bytes: usize) -> Result<(), Error>;

    /// Discards the first `num_bytes` buffered bytes. Panics if fewer bytes
    /// are buffered.
    fn consume(&mut self, num_bytes: usize);

    fn is_eof(&mut self) -> Result<bool, Error>;

    /// Number of bytes consumed since the start of the input.
    fn offset(&self) -> usize;


    fn spanned_data(&self, num_bytes: usize) -> SpannedData<'_> {
        SpannedData {
            data: &self[..num_bytes],
            span: Span::new(self.offset(), self.offset() + num_bytes),
        }
    }

    /// Skips exactly `num_bytes` bytes.
    fn skip(&mut self, num_bytes: usize) -> Result<(), Error> {
        let mut remaining = num_bytes;
        while remaining > 0 {
            let chunk = min(remaining, SKIP_CHUNK_SIZE);
            self.prepare(chunk)?;
            self.consume(chunk);
            remaining -= chunk;
        }

        Ok(())
    }

    /// Passes the next line (without the `\n` and an optional `\r` before it)
    /// to `func` and consumes it including the line break. The last line of
    /// the input does not need a line break. Returns `None` if the input is
    /// already exhausted.
    fn take_line<F, O, E>(&mut self, func: F) -> Result<Option<O>, E>
    where
        F: FnOnce(SpannedData) -> Result<O, E>,
        E: From<Error>,
    {
        let mut pos = 0;
        loop {
            if self.len() <= pos {
                self.saturating_prepare(pos + 1)?;
                if self.len() <= pos {
                    break;
                }
            }

            if self[pos] == b'\n' {
                break;
            }

            pos += 1;
        }

        if pos == 0 && self.is_eof()? {
            return Ok(None);
        }

        let line_len = if pos > 0 && self[pos - 1] == b'\r' { pos - 1 } else { pos };
        let out = func(self.spanned_data(line_len))?;

        let linebreak = if self.len() > pos { 1 } else { 0 };
        self.consume(pos + linebreak);

        Ok(Some(out))
    }
}

#[derive(Debug)]
pub struct SpannedData<'a> {
    pub data: &'a [u8],
    pub span: Span,
}

impl SpannedData<'_> {
    pub fn error(&self, msg: impl Into<String>) -> Error {
        Error::Custom(msg.into(), self.span)
    }
}

/// A byte range in the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
}

impl Span {
    pub fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.lo, self.hi)
    }
}

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "unexpected EOF while parsing (at {})", _0)]
    UnexpectedEof(usize),

    #[fail(
        display = "parsing lookahead got too big (due to a really degenerated \
            file or a parser bug)"
    )]
    LookAheadTooBig,

    #[fail(display = "{} (at {})", _0, _1)]
    Custom(String, Span)
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}


// ===========================================================================
// ===== Fixed width words
// ===========================================================================

pub(crate) fn u8_word(input: &mut impl Input) -> Result<u8, Error> {
    input.prepare(1)?;
    let v = input[0];
    input.consume(1);
    Ok(v)
}

pub(crate) fn i8_word(input: &mut impl Input) -> Result<i8, Error> {
    u8_word(input).map(|v| v as i8)
}

macro_rules! gen_word_parser {
    ($name:ident, $ty:ident, $method:ident, $len:expr) => {
        pub(crate) fn $name<B: ByteOrder>(input: &mut impl Input) -> Result<$ty, Error> {
            input.prepare($len)?;
            let v = B::$method(&input[..$len]);
            input.consume($len);
            Ok(v)
        }
    }
}

gen_word_parser!(u16_word, u16, read_u16, 2);
gen_word_parser!(i16_word, i16, read_i16, 2);
gen_word_parser!(u32_word, u32, read_u32, 4);
gen_word_parser!(i32_word, i32, read_i32, 4);
gen_word_parser!(f32_word, f32, read_f32, 4);
gen_word_parser!(f64_word, f64, read_f64, 8);


pub fn debug_fmt_bytes(data: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(data) {
        format!("{:?}", s)
    } else {
        format!("{:?}", data)
    }
}


#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, LittleEndian};

    use super::*;
    use super::buf::Buffer;

    #[test]
    fn lines() -> Result<(), Error> {
        let mut buf = Buffer::new(b"ply\r\nformat ascii 1.0\n\nlast" as &[u8])?;

        let read = |buf: &mut Buffer<&[u8]>| {
            buf.take_line(|sd| Ok::<_, Error>(sd.data.to_vec()))
        };

        assert_eq!(read(&mut buf)?, Some(b"ply".to_vec()));
        assert_eq!(read(&mut buf)?, Some(b"format ascii 1.0".to_vec()));
        assert_eq!(read(&mut buf)?, Some(vec![]));
        assert_eq!(read(&mut buf)?, Some(b"last".to_vec()));
        assert_eq!(read(&mut buf)?, None);
        assert_eq!(buf.offset(), 27);

        Ok(())
    }

    #[test]
    fn words_in_both_byte_orders() -> Result<(), Error> {
        let data: [u8; 5] = [0x01, 0x02, 0x01, 0x02, 0xff];
        let mut buf = Buffer::new(&data as &[u8])?;

        assert_eq!(u16_word::<LittleEndian>(&mut buf)?, 0x0201);
        assert_eq!(u16_word::<BigEndian>(&mut buf)?, 0x0102);
        assert_eq!(i8_word(&mut buf)?, -1);

        match u8_word(&mut buf) {
            Err(Error::UnexpectedEof(5)) => {}
            other => panic!("expected EOF error, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn skip_is_exact() -> Result<(), Error> {
        let data: Vec<u8> = (0..=255).cycle().take(3 * SKIP_CHUNK_SIZE + 7).collect();
        let mut buf = Buffer::new(&data[..])?;

        buf.skip(2 * SKIP_CHUNK_SIZE + 3)?;
        assert_eq!(buf.offset(), 2 * SKIP_CHUNK_SIZE + 3);
        assert_eq!(u8_word(&mut buf)?, data[2 * SKIP_CHUNK_SIZE + 3]);
        assert!(buf.skip(SKIP_CHUNK_SIZE + 4).is_err());

        Ok(())
    }
}
