//! Reading PLY files.
//!
//! PLY is a simple format for polygon meshes. A file starts with a textual
//! header which declares *elements* (e.g. `vertex` and `face`), how many
//! records of each element follow and which typed *properties* each record
//! has. The body holds the records in the same order, either as
//! whitespace-separated text (`ascii`) or as fixed-width binary words in
//! little or big endian byte order.
//!
//! Only triangle meshes are read: vertex positions, an optional RGB color
//! per vertex and the vertex indices of each triangle. All other elements
//! and properties are parsed according to their declaration and skipped.
//!
//! The main type is [`Reader`]. See its documentation for an example.

use std::io;

use failure::Fail;

use crate::io::{IsFormat, parse};


mod ascii;
mod binary;
mod header;
mod line;
mod read;
mod record;

pub mod schema;



pub use self::{
    read::{Reader, ReadSummary},
    schema::{NumericKind, PropertyDescriptor, PropertyRole, Schema, SchemaError},
};


/// The encoding of a PLY body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Encoding {
    #[display(fmt = "ascii")]
    Ascii,
    #[display(fmt = "binary_big_endian")]
    BinaryBigEndian,
    #[display(fmt = "binary_little_endian")]
    BinaryLittleEndian,
}

/// What to do with faces whose vertex index list does not have exactly three
/// entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonTrianglePolicy {
    /// Read all indices of the face and discard it. It is counted in
    /// [`ReadSummary::dropped_faces`].
    Skip,

    /// Fail with [`Error::RecordDecode`].
    Reject,
}

/// Used to configure [`Reader::read_into`].
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    /// How to treat non-triangle faces in binary files. *Default*: `Skip`.
    ///
    /// ASCII face lines that do not start with `3` are malformed lines and
    /// governed by `strict_ascii_faces` instead.
    pub non_triangle_faces: NonTrianglePolicy,

    /// If `true`, an ASCII face line that is not a triangle of unsigned
    /// indices is an error. Otherwise such lines are skipped and counted in
    /// [`ReadSummary::skipped_face_lines`]. *Default*: `false`.
    pub strict_ascii_faces: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            non_triangle_faces: NonTrianglePolicy::Skip,
            strict_ascii_faces: false,
        }
    }
}

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Parse(#[cause] parse::Error),

    #[fail(display = "invalid PLY format: {}", _0)]
    Format(String),

    #[fail(display = "invalid PLY header (line {}): {}", line, msg)]
    HeaderGrammar {
        line: usize,
        msg: String,
    },

    #[fail(display = "unsupported PLY schema: {}", _0)]
    Schema(#[cause] SchemaError),

    #[fail(display = "invalid {} record #{}: {}", element, index, msg)]
    RecordDecode {
        element: String,
        index: u64,
        msg: String,
    },
}

impl From<parse::Error> for Error {
    fn from(src: parse::Error) -> Self {
        Error::Parse(src)
    }
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Parse(parse::Error::Io(src))
    }
}

impl From<SchemaError> for Error {
    fn from(src: SchemaError) -> Self {
        Error::Schema(src)
    }
}

/// The first three bytes of every PLY file.
pub(crate) const MAGIC: &[u8] = b"ply";

/// Checks if the given data is the start of a PLY file. Only the magic
/// number is inspected, the header is not parsed.
pub fn is_file_start(data: &[u8]) -> IsFormat {
    if data.len() >= MAGIC.len() + 1 {
        if data.starts_with(MAGIC) {
            IsFormat::Probably
        } else {
            IsFormat::No
        }
    } else if MAGIC.starts_with(data) {
        IsFormat::Maybe
    } else {
        IsFormat::No
    }
}
