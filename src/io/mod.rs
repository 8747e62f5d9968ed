//! Reading meshes from files and the interfaces decoded data is passed to.

use cgmath::Point3;


pub mod parse;
pub mod ply;


/// Receives the geometry of a successfully decoded file.
pub trait MeshSink {
    /// Replaces the content of the sink with the given points and triangles.
    ///
    /// This is called exactly once per successful read and never if reading
    /// fails. Each facet stores three indices into `points`. The indices are
    /// all in range, but facets might still be degenerate or duplicated; it
    /// is up to the sink to clean them up.
    fn adopt(&mut self, points: Vec<Point3<f32>>, facets: Vec<[u32; 3]>);
}

/// How colors of a material are attached to the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBinding {
    /// One color for the whole mesh.
    Overall,

    /// One color per point, in point order.
    PerVertex,
}

/// Receives per-vertex colors.
pub trait MaterialSink {
    fn binding(&self) -> ColorBinding;
    fn set_binding(&mut self, binding: ColorBinding);

    /// Hints that `additional` colors will be pushed.
    fn reserve_colors(&mut self, additional: usize);

    /// Adds one RGB color. Each channel is usually in `0.0..=1.0`.
    fn push_color(&mut self, color: [f32; 3]);
}

/// Result of the `is_file_start` functions of the format modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsFormat {
    /// The file is very likely a file of the specified format, e.g. because
    /// the magic number was found.
    Probably,

    /// Not enough data to decide.
    Maybe,

    /// The file is definitely not of the specified format.
    No,
}
