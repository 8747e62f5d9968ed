//! Decoding triangle meshes from PLY files.
//!
//! The PLY reader lives in [`io::ply`]. It parses the header into a
//! [`Schema`][io::ply::Schema], decodes ASCII or binary bodies and passes
//! the result to a [`MeshSink`] and, optionally, a [`MaterialSink`]. The
//! [`mesh`] module contains simple implementations of both.
//!
//! ```no_run
//! use ply_mesh::mesh::MeshKernel;
//!
//! # fn main() -> Result<(), ply_mesh::io::ply::Error> {
//! let mut mesh = MeshKernel::new();
//! ply_mesh::load(std::fs::File::open("cube.ply")?, &mut mesh, None)?;
//! println!("{} facets", mesh.num_facets());
//! # Ok(())
//! # }
//! ```

#[cfg(test)]
#[macro_use]
mod test_utils;

pub mod io;
pub mod mesh;

pub use self::io::{ColorBinding, MaterialSink, MeshSink};


/// Reads a PLY file from `reader` into the given sinks with default options.
///
/// This is a shortcut for [`io::ply::Reader::new`] followed by
/// [`read_into`][io::ply::Reader::read_into].
pub fn load(
    reader: impl std::io::Read,
    mesh: &mut impl MeshSink,
    material: Option<&mut dyn MaterialSink>,
) -> Result<io::ply::ReadSummary, io::ply::Error> {
    io::ply::Reader::new(reader)?.read_into(mesh, material)
}
