//! Lagrange finite element spaces on triangle meshes.
use crate::element::{LagrangeBasis, Tri3d2Element, MAX_NODES_PER_ELEMENT};
use crate::mesh::{EntityKind, TriangleMesh2d};
use crate::{PoissonError, Real};
use nalgebra::{DVector, Matrix2x3, Point2, SVector, Vector2};

mod function;

pub use function::{FieldEvaluator, FiniteElementFunction};

/// A continuous, piecewise polynomial Lagrange space of degree one or two.
///
/// Degrees of freedom are numbered with all mesh vertices first, followed (for degree two)
/// by one degree of freedom per edge, ordered as in
/// [`TriangleMesh2d::edge_topology`](crate::mesh::TriangleMesh2d::edge_topology).
#[derive(Debug, Clone)]
pub struct LagrangeSpace<T: Real> {
    mesh: TriangleMesh2d<T>,
    basis: LagrangeBasis,
    elements: Vec<Tri3d2Element<T>>,
    lambda_gradients: Vec<Matrix2x3<T>>,
    cell_dofs: Vec<usize>,
    num_dofs: usize,
    boundary_dofs: Vec<usize>,
}

impl<T: Real> LagrangeSpace<T> {
    /// Builds the space for the given mesh.
    ///
    /// Returns an error if the degree is unsupported, if a cell references a vertex that does
    /// not exist or if a cell is degenerate.
    pub fn new(mesh: TriangleMesh2d<T>, degree: usize) -> Result<Self, PoissonError> {
        let basis = LagrangeBasis::new(degree)?;
        mesh.check_connectivity()?;

        let elements: Vec<_> = (0..mesh.num_cells())
            .map(|i| Tri3d2Element::from_vertices(mesh.cell_vertices(i)))
            .collect();
        let lambda_gradients = elements
            .iter()
            .enumerate()
            .map(|(i, element)| {
                element.barycentric_gradients().map_err(|err| match err {
                    PoissonError::MalformedMesh(msg) => PoissonError::MalformedMesh(format!("cell {i}: {msg}")),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n = mesh.num_vertices();
        let mut boundary_dofs = mesh.find_boundary_vertices();
        let (cell_dofs, num_dofs) = match degree {
            1 => (mesh.connectivity().iter().flat_map(|cell| cell.0).collect(), n),
            _ => {
                let topology = mesh.edge_topology();
                let cell_dofs = mesh
                    .connectivity()
                    .iter()
                    .zip(&topology.cell_edges)
                    .flat_map(|(cell, edges)| cell.0.into_iter().chain(edges.map(|e| n + e)))
                    .collect();
                boundary_dofs.extend(
                    topology
                        .edge_cell_counts
                        .iter()
                        .enumerate()
                        .filter(|&(_, &count)| count == 1)
                        .map(|(e, _)| n + e),
                );
                (cell_dofs, n + topology.edges.len())
            }
        };

        Ok(Self {
            mesh,
            basis,
            elements,
            lambda_gradients,
            cell_dofs,
            num_dofs,
            boundary_dofs,
        })
    }

    pub fn mesh(&self) -> &TriangleMesh2d<T> {
        &self.mesh
    }

    pub fn basis(&self) -> &LagrangeBasis {
        &self.basis
    }

    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    pub fn num_cells(&self) -> usize {
        self.elements.len()
    }

    pub fn number_of_global_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn number_of_local_dofs(&self) -> usize {
        self.basis.num_nodes()
    }

    /// Global degrees of freedom of the given cell, in local node order.
    pub fn cell_dofs(&self, cell: usize) -> &[usize] {
        let n = self.number_of_local_dofs();
        &self.cell_dofs[n * cell..n * (cell + 1)]
    }

    pub fn element(&self, cell: usize) -> &Tri3d2Element<T> {
        &self.elements[cell]
    }

    /// Physical gradients of the barycentric coordinates of the given cell.
    pub fn lambda_gradients(&self, cell: usize) -> &Matrix2x3<T> {
        &self.lambda_gradients[cell]
    }

    /// Sorted degrees of freedom located on the boundary of the mesh.
    pub fn boundary_dofs(&self) -> &[usize] {
        &self.boundary_dofs
    }

    pub fn cell_measure(&self) -> Vec<T> {
        self.mesh.entity_measure(EntityKind::Cell)
    }

    /// The physical location of every degree of freedom.
    pub fn interpolation_points(&self) -> Vec<Point2<T>> {
        let mut points = vec![Point2::origin(); self.num_dofs];
        let reference_nodes = self.basis.reference_nodes::<T>();
        for (cell, element) in self.elements.iter().enumerate() {
            for (&dof, xi) in self.cell_dofs(cell).iter().zip(&reference_nodes) {
                points[dof] = element.map_reference_coords(xi);
            }
        }
        points
    }

    /// Nodal interpolation of the given function.
    ///
    /// The returned coefficient vector stores the `S` components of each degree of freedom
    /// contiguously.
    pub fn interpolate<const S: usize>(&self, f: impl Fn(&Point2<T>) -> SVector<T, S>) -> DVector<T> {
        let mut coefficients = DVector::zeros(S * self.num_dofs);
        for (dof, x) in self.interpolation_points().iter().enumerate() {
            coefficients
                .rows_mut(S * dof, S)
                .copy_from(&f(x));
        }
        coefficients
    }

    /// Evaluates the basis functions at reference coordinates `xi`, which are the same for
    /// every cell.
    ///
    /// Only the first [`number_of_local_dofs`](Self::number_of_local_dofs) entries of the
    /// returned buffer are meaningful.
    pub fn cell_basis(&self, xi: &Point2<T>) -> [T; MAX_NODES_PER_ELEMENT] {
        let mut phi = [T::zero(); MAX_NODES_PER_ELEMENT];
        self.basis
            .populate_basis(&mut phi[..self.number_of_local_dofs()], xi);
        phi
    }

    /// Evaluates the physical gradients of the basis functions of the given cell at reference
    /// coordinates `xi`.
    ///
    /// Only the first [`number_of_local_dofs`](Self::number_of_local_dofs) entries of the
    /// returned buffer are meaningful.
    pub fn cell_basis_gradients(&self, cell: usize, xi: &Point2<T>) -> [Vector2<T>; MAX_NODES_PER_ELEMENT] {
        let mut gradients = [Vector2::zeros(); MAX_NODES_PER_ELEMENT];
        self.basis.populate_basis_gradients(
            &mut gradients[..self.number_of_local_dofs()],
            xi,
            &self.lambda_gradients[cell],
        );
        gradients
    }
}
