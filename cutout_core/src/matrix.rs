// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D affine matrix with a lazily cached inverse.

use core::cell::Cell;
use core::fmt;

use kurbo::{Affine, Point};

/// A 2D affine map `(x, y) -> (a*x + c*y + tx, b*x + d*y + ty)`.
///
/// Mutators compose new operations *after* the ones already applied, so
/// `Matrix::identity().scale(2.0, 2.0).translate(5.0, 0.0)` first doubles a
/// point and then shifts it. Each mutator with a neutral argument returns
/// without touching the matrix, which keeps the cached inverse alive.
///
/// The inverse is computed on first read after a mutation. A singular
/// matrix (zero determinant, e.g. a scale of zero) yields non-finite
/// coefficients; callers that need an inverse must avoid singular scales.
#[derive(Clone, Default)]
pub struct Matrix {
    affine: Affine,
    inverse: Cell<Option<Affine>>,
}

impl Matrix {
    /// Creates an identity matrix.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_affine(Affine::IDENTITY)
    }

    /// Creates a matrix from the six coefficients `a, b, c, d, tx, ty`.
    #[inline]
    #[must_use]
    pub fn from_coeffs(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self::from_affine(Affine::new([a, b, c, d, tx, ty]))
    }

    /// Wraps an existing [`Affine`].
    #[inline]
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        Self {
            affine,
            inverse: Cell::new(None),
        }
    }

    /// Returns the underlying [`Affine`].
    #[inline]
    #[must_use]
    pub fn as_affine(&self) -> Affine {
        self.affine
    }

    /// Returns the coefficients as `[a, b, c, d, tx, ty]`.
    #[inline]
    #[must_use]
    pub fn coeffs(&self) -> [f64; 6] {
        self.affine.as_coeffs()
    }

    /// Resets to the identity.
    pub fn identity(&mut self) -> &mut Self {
        self.replace(Affine::IDENTITY)
    }

    /// Copies every coefficient from `other`.
    pub fn copy_from(&mut self, other: &Self) -> &mut Self {
        self.affine = other.affine;
        self.inverse.set(other.inverse.get());
        self
    }

    /// Appends a translation.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        if dx == 0.0 && dy == 0.0 {
            return self;
        }
        self.replace(Affine::translate((dx, dy)) * self.affine)
    }

    /// Appends a non-uniform scale.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        if sx == 1.0 && sy == 1.0 {
            return self;
        }
        self.replace(Affine::scale_non_uniform(sx, sy) * self.affine)
    }

    /// Appends a rotation by `angle` radians (clockwise with y pointing down).
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        if angle == 0.0 {
            return self;
        }
        self.replace(Affine::rotate(angle) * self.affine)
    }

    /// Appends a shear: `x += skew_x * y` and `y += skew_y * x`, both taken
    /// from the coordinates before the shear.
    pub fn skew(&mut self, skew_x: f64, skew_y: f64) -> &mut Self {
        if skew_x == 0.0 && skew_y == 0.0 {
            return self;
        }
        self.replace(Affine::skew(skew_x, skew_y) * self.affine)
    }

    /// Appends `other`: the result maps a point through `self` first and
    /// `other` second.
    pub fn concat(&mut self, other: &Self) -> &mut Self {
        self.replace(other.affine * self.affine)
    }

    /// Returns the inverse matrix, computing it if a mutation happened since
    /// the last call.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inverse = match self.inverse.get() {
            Some(inv) => inv,
            None => {
                let inv = self.affine.inverse();
                self.inverse.set(Some(inv));
                inv
            }
        };
        Self::from_affine(inverse)
    }

    /// Maps a point through this matrix.
    #[inline]
    #[must_use]
    pub fn map_point(&self, p: Point) -> Point {
        self.affine * p
    }

    /// Maps a point through the inverse of this matrix.
    #[must_use]
    pub fn unmap_point(&self, p: Point) -> Point {
        self.inverse().affine * p
    }

    /// Horizontal scale coefficient.
    #[inline]
    #[must_use]
    pub fn a(&self) -> f64 {
        self.coeffs()[0]
    }

    /// Vertical shear coefficient.
    #[inline]
    #[must_use]
    pub fn b(&self) -> f64 {
        self.coeffs()[1]
    }

    /// Horizontal shear coefficient.
    #[inline]
    #[must_use]
    pub fn c(&self) -> f64 {
        self.coeffs()[2]
    }

    /// Vertical scale coefficient.
    #[inline]
    #[must_use]
    pub fn d(&self) -> f64 {
        self.coeffs()[3]
    }

    /// Horizontal translation.
    #[inline]
    #[must_use]
    pub fn tx(&self) -> f64 {
        self.coeffs()[4]
    }

    /// Vertical translation.
    #[inline]
    #[must_use]
    pub fn ty(&self) -> f64 {
        self.coeffs()[5]
    }

    /// Returns whether the inverse is cached (for tests and diagnostics).
    #[inline]
    #[must_use]
    pub fn has_cached_inverse(&self) -> bool {
        self.inverse.get().is_some()
    }

    fn replace(&mut self, affine: Affine) -> &mut Self {
        self.affine = affine;
        self.inverse.set(None);
        self
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        Self::from_affine(affine)
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.affine == other.affine
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, tx, ty] = self.coeffs();
        write!(f, "Matrix[{a}, {b}, {c}, {d}, {tx}, {ty}]")
    }
}
