use std::{
    fs::File,
    io,
    path::Path,
};

use byteorder::{BigEndian, LittleEndian};
use tracing::{debug, warn};

use crate::io::{
    ColorBinding, MaterialSink, MeshSink,
    parse::{self, Input, buf::Buffer},
};
use super::{
    Encoding, Error, MAGIC, ReadOptions,
    ascii, binary,
    header::parse_header,
    record::Decoded,
    schema::Schema,
};


/// A reader able to read PLY files.
///
/// Creating a reader with [`Reader::open`] or [`Reader::new`] already parses
/// and validates the header. The body is decoded by
/// [`read_into`][Reader::read_into].
///
/// ```no_run
/// use ply_mesh::{
///     io::ply::Reader,
///     mesh::{Material, MeshKernel},
/// };
///
/// # fn main() -> Result<(), ply_mesh::io::ply::Error> {
/// let reader = Reader::open("bunny.ply")?;
/// println!("{} vertices", reader.schema().vertex_count());
///
/// let mut mesh = MeshKernel::new();
/// let mut material = Material::new();
/// let summary = reader.read_into(&mut mesh, Some(&mut material))?;
/// println!("{} faces ({} dropped)", summary.faces, summary.dropped_faces);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reader<R: io::Read> {
    buf: Buffer<R>,
    schema: Schema,
    options: ReadOptions,
}

/// Counts of a successful [`Reader::read_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadSummary {
    /// Number of vertices passed to the mesh sink.
    pub vertices: u64,

    /// Number of triangles passed to the mesh sink.
    pub faces: u64,

    /// Faces that were read but dropped, either because an index was out of
    /// range or because they were not triangles.
    pub dropped_faces: u64,

    /// Malformed face lines in ASCII files that were skipped.
    pub skipped_face_lines: u64,
}

impl Reader<File> {
    /// Tries to open the file specified by the given path and creates a new
    /// `Reader` from that file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        // We don't need a `BufReader` here, because we will use our internal
        // parse buffer anyway.
        Self::new(File::open(path)?)
    }
}

impl<R: io::Read> Reader<R> {
    /// Creates a new `Reader` from the given `io::Read` instance, parses the
    /// header and validates the schema.
    ///
    /// If you want to open a file, rather use [`Reader::open`].
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut buf = Buffer::new(reader)?;

        // The magic number is followed by a single byte, usually '\n'.
        match buf.prepare(MAGIC.len() + 1) {
            Ok(()) => {}
            Err(parse::Error::UnexpectedEof(_)) => {
                return Err(Error::Format("file too short to be a PLY file".into()));
            }
            Err(e) => return Err(e.into()),
        }
        if !buf.starts_with(MAGIC) {
            return Err(Error::Format(format!(
                "does not start with \"ply\", found {}",
                parse::debug_fmt_bytes(&buf[..MAGIC.len()]),
            )));
        }
        buf.consume(MAGIC.len() + 1);

        let schema = parse_header(&mut buf)?;
        debug!(
            "PLY header: {} encoding, {} vertices ({} properties), {} faces, {} element blocks",
            schema.encoding(),
            schema.vertex_count(),
            schema.vertex_properties().len(),
            schema.face_count(),
            schema.blocks().len(),
        );

        schema.validate()?;

        Ok(Self {
            buf,
            schema,
            options: ReadOptions::default(),
        })
    }

    /// Replaces the options used by [`read_into`][Reader::read_into].
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// The schema declared by the header.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The `comment` lines of the header in order, without the keyword.
    pub fn comments(&self) -> &[String] {
        self.schema.comments()
    }

    /// Decodes the body and hands the result to the sinks.
    ///
    /// The mesh sink receives all points and triangles with a single call to
    /// [`MeshSink::adopt`]. Vertex colors are only decoded if the file has
    /// them and a material sink is given. Neither sink is touched if an
    /// error occurs.
    pub fn read_into(
        mut self,
        mesh: &mut impl MeshSink,
        material: Option<&mut dyn MaterialSink>,
    ) -> Result<ReadSummary, Error> {
        let with_color = self.schema.has_vertex_colors() && material.is_some();
        let mut decoded = Decoded::new(&self.schema, with_color);

        let buf = &mut self.buf;
        match self.schema.encoding() {
            Encoding::Ascii => {
                ascii::decode(buf, &self.schema, &self.options, &mut decoded)?;
            }
            Encoding::BinaryBigEndian => {
                binary::decode::<BigEndian, _>(buf, &self.schema, &self.options, &mut decoded)?;
            }
            Encoding::BinaryLittleEndian => {
                binary::decode::<LittleEndian, _>(buf, &self.schema, &self.options, &mut decoded)?;
            }
        }

        let summary = ReadSummary {
            vertices: decoded.points.len() as u64,
            faces: decoded.facets.len() as u64,
            dropped_faces: decoded.dropped_faces,
            skipped_face_lines: decoded.skipped_face_lines,
        };

        if summary.dropped_faces > 0 || summary.skipped_face_lines > 0 {
            warn!(
                "{} of {} declared faces were dropped and {} face lines were skipped",
                summary.dropped_faces,
                self.schema.face_count(),
                summary.skipped_face_lines,
            );
        }

        if let Some(material) = material {
            if decoded.with_color() {
                material.set_binding(ColorBinding::PerVertex);
                material.reserve_colors(decoded.colors.len());
                if material.binding() == ColorBinding::PerVertex {
                    for &color in &decoded.colors {
                        material.push_color(color);
                    }
                }
            }
        }

        mesh.adopt(decoded.points, decoded.facets);
        debug!("read {} vertices and {} faces", summary.vertices, summary.faces);

        Ok(summary)
    }
}
