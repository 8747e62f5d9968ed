//! Simple in-memory sinks for decoded meshes.

use std::ops;

use cgmath::Point3;
use fxhash::FxHashSet;
use tracing::debug;

use crate::io::{ColorBinding, MaterialSink, MeshSink};


/// A triangle of a [`MeshKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facet {
    /// Indices of the three corner points.
    pub corners: [u32; 3],

    /// `neighbours[i]` is the facet sharing the edge from `corners[i]` to
    /// `corners[(i + 1) % 3]`, if any. For non-manifold edges, this is the
    /// facet with the smallest index.
    pub neighbours: [Option<u32>; 3],
}

/// A triangle mesh stored as a point list and a facet list, with the
/// connectivity computed on [`adopt`][MeshSink::adopt].
///
/// Adopting removes facets that reference missing points, degenerate facets
/// (two equal corners) and duplicate facets (same set of corners). Points are
/// never removed, so per-point data like colors stays valid.
#[derive(Debug, Clone, Default)]
pub struct MeshKernel {
    points: Vec<Point3<f32>>,
    facets: Vec<Facet>,

    /// For each point the indices of all facets it is a corner of.
    point_facets: Vec<Vec<u32>>,
}

impl MeshKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Point3<f32>] {
        &self.points
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_facets(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.facets.is_empty()
    }

    /// Indices of all facets having the given point as corner. Panics if
    /// the point does not exist.
    pub fn facets_of_point(&self, point: u32) -> &[u32] {
        &self.point_facets[point as usize]
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.facets.clear();
        self.point_facets.clear();
    }

    /// Returns the facet sharing the given (undirected) edge with `facet`.
    fn neighbour_across(&self, facet: u32, a: u32, b: u32) -> Option<u32> {
        let of_b = &self.point_facets[b as usize];
        self.point_facets[a as usize].iter()
            .copied()
            .filter(|&f| f != facet)
            .find(|f| of_b.contains(f))
    }
}

/// Removes facets with out of range, repeated or duplicated corners. Keeps
/// the first of several facets with the same corner set.
fn remove_invalid_facets(facets: &mut Vec<[u32; 3]>, num_points: usize) {
    let mut seen = FxHashSet::default();
    facets.retain(|&[a, b, c]| {
        let in_range = [a, b, c].iter().all(|&i| (i as usize) < num_points);
        let degenerate = a == b || b == c || a == c;
        if !in_range || degenerate {
            return false;
        }

        let mut key = [a, b, c];
        key.sort_unstable();
        seen.insert(key)
    });
}

impl MeshSink for MeshKernel {
    fn adopt(&mut self, points: Vec<Point3<f32>>, mut facets: Vec<[u32; 3]>) {
        let before = facets.len();
        remove_invalid_facets(&mut facets, points.len());
        if facets.len() != before {
            debug!("removed {} invalid facets", before - facets.len());
        }

        let mut point_facets = vec![vec![]; points.len()];
        for (i, corners) in facets.iter().enumerate() {
            for &p in corners {
                point_facets[p as usize].push(i as u32);
            }
        }

        self.points = points;
        self.point_facets = point_facets;
        self.facets = facets.into_iter()
            .map(|corners| Facet { corners, neighbours: [None; 3] })
            .collect();

        for i in 0..self.facets.len() {
            let [a, b, c] = self.facets[i].corners;
            let f = i as u32;
            self.facets[i].neighbours = [
                self.neighbour_across(f, a, b),
                self.neighbour_across(f, b, c),
                self.neighbour_across(f, c, a),
            ];
        }
    }
}

impl ops::Index<u32> for MeshKernel {
    type Output = Point3<f32>;
    fn index(&self, idx: u32) -> &Self::Output {
        &self.points[idx as usize]
    }
}


/// Colors of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub binding: ColorBinding,
    pub diffuse: Vec<[f32; 3]>,
}

impl Material {
    /// Creates a material with `Overall` binding and no colors.
    pub fn new() -> Self {
        Self {
            binding: ColorBinding::Overall,
            diffuse: vec![],
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialSink for Material {
    fn binding(&self) -> ColorBinding {
        self.binding
    }

    fn set_binding(&mut self, binding: ColorBinding) {
        self.binding = binding;
    }

    fn reserve_colors(&mut self, additional: usize) {
        self.diffuse.reserve(additional);
    }

    fn push_color(&mut self, color: [f32; 3]) {
        self.diffuse.push(color);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<Point3<f32>> {
        (0..n).map(|i| Point3::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn cleanup() {
        let mut mesh = MeshKernel::new();
        mesh.adopt(points(4), vec![
            [0, 1, 2],
            [2, 1, 0],  // duplicate (other orientation)
            [0, 0, 3],  // degenerate
            [0, 1, 4],  // out of range
            [1, 3, 2],
            [1, 2, 0],  // duplicate (rotated)
        ]);

        assert_eq!(mesh.num_points(), 4);
        let corners: Vec<_> = mesh.facets().iter().map(|f| f.corners).collect();
        assert_eq!(corners, [[0, 1, 2], [1, 3, 2]]);
    }

    #[test]
    fn adjacency() {
        //   3
        //  / \
        // 0---2
        //  \ /
        //   1
        let mut mesh = MeshKernel::new();
        mesh.adopt(points(5), vec![[0, 1, 2], [0, 2, 3]]);

        assert_eq!(mesh.facets_of_point(0), &[0, 1]);
        assert_eq!(mesh.facets_of_point(1), &[0]);
        assert_eq!(mesh.facets_of_point(3), &[1]);
        assert!(mesh.facets_of_point(4).is_empty());

        assert_eq!(mesh.facets()[0].neighbours, [None, None, Some(1)]);
        assert_eq!(mesh.facets()[1].neighbours, [Some(0), None, None]);
    }

    #[test]
    fn adopt_replaces_content() {
        let mut mesh = MeshKernel::new();
        mesh.adopt(points(3), vec![[0, 1, 2]]);
        mesh.adopt(points(1), vec![]);

        assert_eq!(mesh.num_points(), 1);
        assert_eq!(mesh.num_facets(), 0);
        assert_eq!(mesh[0], Point3::new(0.0, 0.0, 0.0));

        mesh.clear();
        assert!(mesh.is_empty());
    }

    #[test]
    fn material_sink() {
        let mut material = Material::new();
        assert_eq!(material.binding(), ColorBinding::Overall);

        material.set_binding(ColorBinding::PerVertex);
        material.reserve_colors(2);
        material.push_color([1.0, 0.0, 0.5]);

        assert_eq!(material.binding, ColorBinding::PerVertex);
        assert_eq!(material.diffuse, vec![[1.0, 0.0, 0.5]]);
    }
}
