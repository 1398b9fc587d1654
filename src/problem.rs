//! Poisson problems $-\Delta u = f$ with known exact solutions.
use crate::mesh::procedural::{create_lshape_uniform_tri_mesh_2d, create_unit_square_uniform_tri_mesh_2d};
use crate::mesh::refinement::refine_uniformly_repeat;
use crate::mesh::TriangleMesh2d;
use crate::Real;
use nalgebra::{Point2, Vector2};
use numeric_literals::replace_float_literals;

/// A Poisson problem with an exact solution, evaluated pointwise.
pub trait PoissonProblem<T: Real> {
    fn solution(&self, p: &Point2<T>) -> T;

    fn gradient(&self, p: &Point2<T>) -> Vector2<T>;

    /// The source term $f = -\Delta u$.
    fn source(&self, p: &Point2<T>) -> T;

    /// Dirichlet data on the boundary. Defaults to the exact solution.
    fn dirichlet(&self, p: &Point2<T>) -> T {
        self.solution(p)
    }

    /// The coarse mesh of the problem domain, refined uniformly `n` times.
    fn init_mesh(&self, n: usize) -> TriangleMesh2d<T>;
}

fn unit_square_mesh<T: Real>(n: usize) -> TriangleMesh2d<T> {
    refine_uniformly_repeat(&create_unit_square_uniform_tri_mesh_2d(1), n)
}

/// $u = \cos(\pi x) \cos(\pi y)$ on the unit square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CosCosData;

impl<T: Real> PoissonProblem<T> for CosCosData {
    fn solution(&self, p: &Point2<T>) -> T {
        let pi = T::pi();
        (pi * p.x).cos() * (pi * p.y).cos()
    }

    fn gradient(&self, p: &Point2<T>) -> Vector2<T> {
        let pi = T::pi();
        let (sx, cx) = (pi * p.x).sin_cos();
        let (sy, cy) = (pi * p.y).sin_cos();
        Vector2::new(-pi * sx * cy, -pi * cx * sy)
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn source(&self, p: &Point2<T>) -> T {
        let pi = T::pi();
        2.0 * pi * pi * self.solution(p)
    }

    fn init_mesh(&self, n: usize) -> TriangleMesh2d<T> {
        unit_square_mesh(n)
    }
}

/// $u = \sin(\pi x) \sin(\pi y)$ on the unit square, with homogeneous boundary values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinSinData;

impl<T: Real> PoissonProblem<T> for SinSinData {
    fn solution(&self, p: &Point2<T>) -> T {
        let pi = T::pi();
        (pi * p.x).sin() * (pi * p.y).sin()
    }

    fn gradient(&self, p: &Point2<T>) -> Vector2<T> {
        let pi = T::pi();
        let (sx, cx) = (pi * p.x).sin_cos();
        let (sy, cy) = (pi * p.y).sin_cos();
        Vector2::new(pi * cx * sy, pi * sx * cy)
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn source(&self, p: &Point2<T>) -> T {
        let pi = T::pi();
        2.0 * pi * pi * self.solution(p)
    }

    fn init_mesh(&self, n: usize) -> TriangleMesh2d<T> {
        unit_square_mesh(n)
    }
}

/// $u = \sin(x) \cos(y)$ on the unit square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinCosData;

impl<T: Real> PoissonProblem<T> for SinCosData {
    fn solution(&self, p: &Point2<T>) -> T {
        p.x.sin() * p.y.cos()
    }

    fn gradient(&self, p: &Point2<T>) -> Vector2<T> {
        let (sx, cx) = p.x.sin_cos();
        let (sy, cy) = p.y.sin_cos();
        Vector2::new(cx * cy, -sx * sy)
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn source(&self, p: &Point2<T>) -> T {
        2.0 * self.solution(p)
    }

    fn init_mesh(&self, n: usize) -> TriangleMesh2d<T> {
        unit_square_mesh(n)
    }
}

/// $u = 1 + 2x + 3y$ on the unit square, which linear elements reproduce exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearData;

impl<T: Real> PoissonProblem<T> for LinearData {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn solution(&self, p: &Point2<T>) -> T {
        1.0 + 2.0 * p.x + 3.0 * p.y
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn gradient(&self, _p: &Point2<T>) -> Vector2<T> {
        Vector2::new(2.0, 3.0)
    }

    fn source(&self, _p: &Point2<T>) -> T {
        T::zero()
    }

    fn init_mesh(&self, n: usize) -> TriangleMesh2d<T> {
        unit_square_mesh(n)
    }
}

/// $u = r^{2/3} \sin(2 \theta / 3)$ on the L-shaped domain $[-1, 1]^2 \setminus (0, 1] \times [-1, 0)$.
///
/// The solution is harmonic but its gradient is singular at the re-entrant corner, so that
/// uniform refinement converges at a reduced rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LShapeRSinData;

impl LShapeRSinData {
    /// Polar coordinates with the angle in $[0, 2\pi)$.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn polar<T: Real>(p: &Point2<T>) -> (T, T) {
        let r = p.coords.norm();
        let mut theta = p.y.atan2(p.x);
        if theta < 0.0 {
            theta += T::two_pi();
        }
        (r, theta)
    }
}

impl<T: Real> PoissonProblem<T> for LShapeRSinData {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn solution(&self, p: &Point2<T>) -> T {
        let (r, theta) = Self::polar(p);
        r.powf(2.0 / 3.0) * (2.0 * theta / 3.0).sin()
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn gradient(&self, p: &Point2<T>) -> Vector2<T> {
        let (r, theta) = Self::polar(p);
        if r == 0.0 {
            // Singular at the corner
            return Vector2::zeros();
        }
        let (s, c) = (theta / 3.0).sin_cos();
        Vector2::new(-s, c) * (2.0 / 3.0 * r.powf(-1.0 / 3.0))
    }

    fn source(&self, _p: &Point2<T>) -> T {
        T::zero()
    }

    fn init_mesh(&self, n: usize) -> TriangleMesh2d<T> {
        refine_uniformly_repeat(&create_lshape_uniform_tri_mesh_2d(2), n)
    }
}
