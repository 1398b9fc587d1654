//! Affine triangle elements and Lagrange bases on the reference triangle.
//!
//! The reference triangle is the triangle with corners $(0, 0)$, $(1, 0)$ and $(0, 1)$. Points
//! in the reference triangle are denoted by $\xi = (\xi_1, \xi_2)$ and the corresponding
//! barycentric coordinates are $\lambda = (1 - \xi_1 - \xi_2, \xi_1, \xi_2)$.
use crate::connectivity::TRIANGLE_LOCAL_EDGES;
use crate::{PoissonError, Real};
use itertools::Itertools;
use nalgebra::{distance, Matrix2, Matrix2x3, Point2, Vector2, Vector3};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// The largest number of nodes of any supported basis.
pub const MAX_NODES_PER_ELEMENT: usize = 6;

/// Barycentric coordinates of the given reference coordinates.
pub fn barycentric_coordinates<T: Real>(xi: &Point2<T>) -> Vector3<T> {
    Vector3::new(T::one() - xi.x - xi.y, xi.x, xi.y)
}

/// Gradients of the barycentric coordinates with respect to reference coordinates, as columns.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn reference_barycentric_gradients<T: Real>() -> Matrix2x3<T> {
    Matrix2x3::new(-1.0, 1.0, 0.0, -1.0, 0.0, 1.0)
}

/// A triangle in two dimensions with an affine map from the reference triangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tri3d2Element<T: Real> {
    vertices: [Point2<T>; 3],
}

impl<T: Real> Tri3d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 3]) -> Self {
        Self { vertices }
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn reference() -> Self {
        Self::from_vertices([Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)])
    }

    pub fn vertices(&self) -> &[Point2<T>; 3] {
        &self.vertices
    }

    /// The (constant) Jacobian of the map from the reference triangle.
    pub fn reference_jacobian(&self) -> Matrix2<T> {
        let [x0, x1, x2] = self.vertices;
        Matrix2::from_columns(&[x1 - x0, x2 - x0])
    }

    pub fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T> {
        self.vertices[0] + self.reference_jacobian() * xi.coords
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn area(&self) -> T {
        0.5 * self.reference_jacobian().determinant().abs()
    }

    pub fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }

    /// Gradients of the barycentric coordinates in physical coordinates, as columns.
    ///
    /// Returns an error if the triangle is degenerate.
    pub fn barycentric_gradients(&self) -> Result<Matrix2x3<T>, PoissonError> {
        let j_inv_t = self
            .reference_jacobian()
            .try_inverse()
            .filter(|_| self.area() > T::zero())
            .ok_or_else(|| {
                PoissonError::MalformedMesh(format!("degenerate triangle with vertices {:?}", self.vertices))
            })?
            .transpose();
        Ok(j_inv_t * reference_barycentric_gradients::<T>())
    }
}

/// Nodal Lagrange basis of degree one or two on a triangle.
///
/// The first three nodes are the vertices. For degree two, node `3 + k` is the midpoint of
/// local edge `k`, i.e. of the edge opposite local vertex `k`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LagrangeBasis {
    degree: usize,
}

impl LagrangeBasis {
    pub fn new(degree: usize) -> Result<Self, PoissonError> {
        match degree {
            1 | 2 => Ok(Self { degree }),
            _ => Err(PoissonError::UnsupportedConfiguration(format!(
                "Lagrange elements of degree {degree} are not supported (expected 1 or 2)"
            ))),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn num_nodes(&self) -> usize {
        (self.degree + 1) * (self.degree + 2) / 2
    }

    /// Nodes of the basis in reference coordinates.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn reference_nodes<T: Real>(&self) -> Vec<Point2<T>> {
        let vertices = *Tri3d2Element::<T>::reference().vertices();
        let mut nodes = vertices.to_vec();
        if self.degree == 2 {
            for [a, b] in TRIANGLE_LOCAL_EDGES {
                nodes.push(Point2::from((vertices[a].coords + vertices[b].coords) * 0.5));
            }
        }
        nodes
    }

    /// Evaluates each basis function at the given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length does not equal the number of nodes.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn populate_basis<T: Real>(&self, basis_values: &mut [T], xi: &Point2<T>) {
        assert_eq!(basis_values.len(), self.num_nodes(), "Basis buffer length mismatch");
        let lambda = barycentric_coordinates(xi);
        match self.degree {
            1 => basis_values.copy_from_slice(lambda.as_slice()),
            _ => {
                for i in 0..3 {
                    basis_values[i] = lambda[i] * (2.0 * lambda[i] - 1.0);
                }
                for (k, [a, b]) in TRIANGLE_LOCAL_EDGES.into_iter().enumerate() {
                    basis_values[3 + k] = 4.0 * lambda[a] * lambda[b];
                }
            }
        }
    }

    /// Computes the gradient of each basis function at the given reference coordinates.
    ///
    /// The gradients are taken with respect to whichever coordinates `lambda_gradients`
    /// refers to: pass [`reference_barycentric_gradients`] for reference gradients or
    /// [`Tri3d2Element::barycentric_gradients`] for physical gradients.
    ///
    /// # Panics
    ///
    /// Panics if the buffer length does not equal the number of nodes.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn populate_basis_gradients<T: Real>(
        &self,
        basis_gradients: &mut [Vector2<T>],
        xi: &Point2<T>,
        lambda_gradients: &Matrix2x3<T>,
    ) {
        assert_eq!(basis_gradients.len(), self.num_nodes(), "Gradient buffer length mismatch");
        let g = |i: usize| -> Vector2<T> { lambda_gradients.column(i).into_owned() };
        match self.degree {
            1 => {
                for (i, gradient) in basis_gradients.iter_mut().enumerate() {
                    *gradient = g(i);
                }
            }
            _ => {
                let lambda = barycentric_coordinates(xi);
                for i in 0..3 {
                    basis_gradients[i] = g(i) * (4.0 * lambda[i] - 1.0);
                }
                for (k, [a, b]) in TRIANGLE_LOCAL_EDGES.into_iter().enumerate() {
                    basis_gradients[3 + k] = g(b) * (4.0 * lambda[a]) + g(a) * (4.0 * lambda[b]);
                }
            }
        }
    }
}
