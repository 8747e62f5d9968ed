//! Turning raw per-record values into points, colors and triangles.

use std::{
    cmp::min,
    convert::TryFrom,
};

use cgmath::Point3;
use tracing::trace;

use super::schema::{PropertyRole, RoleArray, Schema};


/// Upper bound for the capacity we reserve up front based on the counts
/// declared in the header. The vectors still grow beyond that if the file
/// really contains that many records.
const MAX_CAPACITY_HINT: u64 = 1 << 20;

/// The values of one vertex record, one slot per role. Slots of roles the
/// schema does not have stay `0.0`.
pub(crate) type RawRecord = RoleArray<f64>;

/// One vertex after assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedVertex {
    pub position: Point3<f32>,

    /// RGB in `0.0..=1.0` for well-formed files. Values are divided by 255
    /// and not clamped.
    pub color: Option<[f32; 3]>,
}

/// A triangle whose indices all refer to existing vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFace(pub [u32; 3]);

/// Assembles a vertex from its raw record. The color is only extracted if
/// `with_color` is set.
pub(crate) fn assemble_vertex(raw: &RawRecord, with_color: bool) -> DecodedVertex {
    let position = Point3::new(
        raw[PropertyRole::X] as f32,
        raw[PropertyRole::Y] as f32,
        raw[PropertyRole::Z] as f32,
    );

    let color = if with_color {
        Some([
            (raw[PropertyRole::Red] / 255.0) as f32,
            (raw[PropertyRole::Green] / 255.0) as f32,
            (raw[PropertyRole::Blue] / 255.0) as f32,
        ])
    } else {
        None
    };

    DecodedVertex { position, color }
}

/// Returns a face if all three indices are in `0..vertex_count`.
pub(crate) fn assemble_face(indices: [i64; 3], vertex_count: u64) -> Option<DecodedFace> {
    let check = |idx: i64| {
        u64::try_from(idx).ok()
            .filter(|&idx| idx < vertex_count)
            .and_then(|idx| u32::try_from(idx).ok())
    };

    Some(DecodedFace([check(indices[0])?, check(indices[1])?, check(indices[2])?]))
}

/// Everything decoded from the body so far. Nothing of this is visible to
/// the sinks until the whole body was decoded successfully.
#[derive(Debug)]
pub(crate) struct Decoded {
    pub(crate) points: Vec<Point3<f32>>,

    /// Empty if colors are not decoded, otherwise one entry per point.
    pub(crate) colors: Vec<[f32; 3]>,
    pub(crate) facets: Vec<[u32; 3]>,
    pub(crate) dropped_faces: u64,
    pub(crate) skipped_face_lines: u64,

    with_color: bool,
    vertex_count: u64,
}

impl Decoded {
    pub(crate) fn new(schema: &Schema, with_color: bool) -> Self {
        let hint = |count: u64| min(count, MAX_CAPACITY_HINT) as usize;

        Self {
            points: Vec::with_capacity(hint(schema.vertex_count())),
            colors: if with_color {
                Vec::with_capacity(hint(schema.vertex_count()))
            } else {
                vec![]
            },
            facets: Vec::with_capacity(hint(schema.face_count())),
            dropped_faces: 0,
            skipped_face_lines: 0,
            with_color,
            vertex_count: schema.vertex_count(),
        }
    }

    pub(crate) fn with_color(&self) -> bool {
        self.with_color
    }

    pub(crate) fn push_vertex(&mut self, raw: &RawRecord) {
        let vertex = assemble_vertex(raw, self.with_color);
        self.points.push(vertex.position);
        if let Some(color) = vertex.color {
            self.colors.push(color);
        }
    }

    /// Adds the triangle or, if an index is out of range, counts it as
    /// dropped. `record` is only used for logging.
    pub(crate) fn push_face(&mut self, indices: [i64; 3], record: u64) {
        match assemble_face(indices, self.vertex_count) {
            Some(DecodedFace(face)) => self.facets.push(face),
            None => {
                trace!(
                    "dropping face #{} with out of range indices {:?} ({} vertices)",
                    record,
                    indices,
                    self.vertex_count,
                );
                self.dropped_faces += 1;
            }
        }
    }

    /// Counts a face that was read but is not a triangle.
    pub(crate) fn drop_face(&mut self) {
        self.dropped_faces += 1;
    }

    pub(crate) fn skip_face_line(&mut self, record: u64, line: &str) {
        trace!("skipping malformed face line #{}: {:?}", record, line);
        self.skipped_face_lines += 1;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: [f64; 7]) -> RawRecord {
        RoleArray(values)
    }

    #[test]
    fn vertex_position_and_color() {
        let r = raw([1.0, -2.5, 3.0, 255.0, 0.0, 51.0, 99.0]);

        let v = assemble_vertex(&r, false);
        assert_eq!(v.position, Point3::new(1.0, -2.5, 3.0));
        assert_eq!(v.color, None);

        let v = assemble_vertex(&r, true);
        assert_eq!(v.color, Some([1.0, 0.0, 0.2]));
    }

    #[test]
    fn colors_are_not_clamped() {
        let v = assemble_vertex(&raw([0.0, 0.0, 0.0, 510.0, -255.0, 0.0, 0.0]), true);
        assert_eq!(v.color, Some([2.0, -1.0, 0.0]));
    }

    #[test]
    fn face_range_check() {
        assert_eq!(assemble_face([0, 1, 2], 3), Some(DecodedFace([0, 1, 2])));
        assert_eq!(assemble_face([0, 1, 3], 3), None);
        assert_eq!(assemble_face([-1, 1, 2], 3), None);
        assert_eq!(assemble_face([0, 0, 0], 1), Some(DecodedFace([0, 0, 0])));
        assert_eq!(assemble_face([0, 1, 2], 0), None);
        assert_eq!(assemble_face([0, 1, 1 << 33], 1 << 40), None);
    }
}
