//! Quadrature rules on the reference triangle.
//!
//! The reference triangle has vertices $(0, 0)$, $(1, 0)$ and $(0, 1)$. Weights of every rule
//! sum to one, i.e. they are normalized by the area of the reference triangle, so that
//! $\int_K f \\, dx \approx |K| \sum_q w_q f(x_q)$ for any triangle $K$.
use crate::Real;
use fenris_quadrature::polyquad;
use nalgebra::{convert, Point2};

/// Errors returned by quadrature methods.
pub use fenris_quadrature::Error as QuadratureError;

pub type QuadraturePair2d<T> = (Vec<T>, Vec<Point2<T>>);

/// A quadrature rule on the reference triangle consisting of weights and points.
pub trait Quadrature<T>
where
    T: Real,
{
    fn weights(&self) -> &[T];
    fn points(&self) -> &[Point2<T>];

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<Function>(&self, f: Function) -> T
    where
        Function: Fn(&Point2<T>) -> T,
    {
        let mut integral = T::zero();
        for (&w, p) in self.weights().iter().zip(self.points()) {
            integral += f(p) * w;
        }
        integral
    }

    fn num_points(&self) -> usize {
        self.weights().len()
    }
}

impl<T> Quadrature<T> for QuadraturePair2d<T>
where
    T: Real,
{
    fn weights(&self) -> &[T] {
        &self.0
    }

    fn points(&self) -> &[Point2<T>] {
        &self.1
    }
}

impl<T, X> Quadrature<T> for &X
where
    T: Real,
    X: Quadrature<T>,
{
    fn weights(&self) -> &[T] {
        X::weights(self)
    }

    fn points(&self) -> &[Point2<T>] {
        X::points(self)
    }
}

/// A symmetric triangle quadrature rule that integrates polynomials up to a given total
/// degree (its strength) exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleQuadrature<T: Real> {
    strength: usize,
    weights: Vec<T>,
    points: Vec<Point2<T>>,
}

impl<T: Real> TriangleQuadrature<T> {
    /// Constructs the rule of the given strength. Strengths `0` through `20` are available.
    pub fn new(strength: usize) -> Result<Self, QuadratureError> {
        let (weights, points) = polyquad::triangle(strength)?;
        // The rules live on the triangle (-1, -1), (1, -1), (-1, 1), which has area 2
        let weights = weights
            .into_iter()
            .map(|w| convert(0.5 * w))
            .collect();
        let points = points
            .into_iter()
            .map(|[x, y]| Point2::new(convert(0.5 * (x + 1.0)), convert(0.5 * (y + 1.0))))
            .collect();
        Ok(Self {
            strength,
            weights,
            points,
        })
    }

    pub fn strength(&self) -> usize {
        self.strength
    }
}

impl<T: Real> Quadrature<T> for TriangleQuadrature<T> {
    fn weights(&self) -> &[T] {
        &self.weights
    }

    fn points(&self) -> &[Point2<T>] {
        &self.points
    }
}

/// Convenience function for [`TriangleQuadrature::new`].
pub fn triangle<T: Real>(strength: usize) -> Result<TriangleQuadrature<T>, QuadratureError> {
    TriangleQuadrature::new(strength)
}
