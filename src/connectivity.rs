//! Cell connectivity for triangle meshes.
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// Local vertex pairs of the three edges of a triangle.
///
/// Edge `k` is the edge opposite local vertex `k`. In particular, edge `0` is the refinement
/// edge used by newest vertex bisection, with local vertex `0` being the newest vertex.
pub const TRIANGLE_LOCAL_EDGES: [[usize; 2]; 3] = [[1, 2], [2, 0], [0, 1]];

pub trait Connectivity: Clone {
    fn vertex_indices(&self) -> &[usize];
}

/// Connectivity for a line segment between two vertices.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Segment2d2Connectivity(pub [usize; 2]);

impl Segment2d2Connectivity {
    /// The vertex indices in ascending order, which identifies the segment independently of
    /// its orientation.
    pub fn canonical(&self) -> [usize; 2] {
        let [a, b] = self.0;
        [a.min(b), a.max(b)]
    }
}

impl Connectivity for Segment2d2Connectivity {
    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

/// Connectivity for a linear triangle in two dimensions.
///
/// Vertices are expected to be ordered counter-clockwise, although the measures computed by
/// [`TriangleMesh2d`](crate::mesh::TriangleMesh2d) do not depend on the orientation.
///
/// ```text
/// 2
/// |`\
/// |  `\
/// 1    `0
/// |      `\
/// |        `\
/// 0-----2----1
/// ```
/// Vertex indices on the corners, local edge indices on the sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Tri3d2Connectivity(pub [usize; 3]);

impl Tri3d2Connectivity {
    /// The global vertex indices of the local edge `index`.
    pub fn edge(&self, index: usize) -> Option<Segment2d2Connectivity> {
        TRIANGLE_LOCAL_EDGES
            .get(index)
            .map(|&[a, b]| Segment2d2Connectivity([self.0[a], self.0[b]]))
    }
}

impl Connectivity for Tri3d2Connectivity {
    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl Deref for Tri3d2Connectivity {
    type Target = [usize; 3];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Tri3d2Connectivity {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
