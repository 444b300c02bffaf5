//! Points, rectangles, and a row-vector 3x3 affine matrix (`spec.md` §4.10),
//! grounded in `geometry.cpp`'s `Point`/`Rect`/`Matrix` classes. `Matrix`
//! multiplies and transforms as row vectors: `point' = point * M`.

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::object_id::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// An axis-aligned box, `left` is the bottom-left corner and `right` the
/// top-right, matching `/MediaBox`-style `[llx lly urx ury]` arrays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: Point,
    pub right: Point,
}

impl Rect {
    pub fn new(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Rect { left: Point::new(llx, lly), right: Point::new(urx, ury) }
    }

    pub fn width(&self) -> f64 {
        self.right.x - self.left.x
    }

    pub fn height(&self) -> f64 {
        self.right.y - self.left.y
    }

    pub fn is_zero(&self) -> bool {
        self.left.x == 0.0 && self.left.y == 0.0 && self.right.x == 0.0 && self.right.y == 0.0
    }

    pub fn is_landscape(&self) -> bool {
        self.right.x > self.right.y
    }

    /// Reads a 4-number array object (resolving one indirect hop first, as
    /// `getFromObject` does), warning and skipping non-numeric entries and
    /// extra items past the fourth.
    pub fn get_from_object(obj: &Object, resolver: &dyn Fn(ObjectId) -> Option<Object>) -> Result<Rect> {
        let resolved;
        let obj = match obj {
            Object::Reference(id) => {
                resolved = resolver(*id).ok_or(Error::MissingXrefEntry)?;
                &resolved
            }
            other => other,
        };
        let items = obj.as_array()?;
        let mut values = [0.0f64; 4];
        let mut count = 0;
        for item in items.iter() {
            let v = match item {
                Object::Integer(n) => *n as f64,
                Object::Real(r) => *r,
                _ => {
                    log::warn!("failed to get Rect: array item isn't a number");
                    continue;
                }
            };
            if count < 4 {
                values[count] = v.round();
            }
            count += 1;
        }
        if count < 4 {
            return Err(Error::InvalidStream("rectangle array has fewer than 4 numbers".into()));
        }
        Ok(Rect::new(values[0], values[1], values[2], values[3]))
    }

    pub fn set_to_object(&self, dict: &mut Dictionary, key: &str) {
        dict.set(
            key.as_bytes().to_vec(),
            Object::Array(vec![
                Object::Real(self.left.x),
                Object::Real(self.left.y),
                Object::Real(self.right.x),
                Object::Real(self.right.y),
            ]),
        );
    }
}

/// A 3x3 row-vector affine matrix, stored row-major exactly as the PDF `cm`
/// operator spells it: `[a b 0; c d 0; e f 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    mat: [[f64; 3]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Matrix { mat: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] }
    }

    pub fn new(m00: f64, m01: f64, m02: f64, m10: f64, m11: f64, m12: f64, m20: f64, m21: f64, m22: f64) -> Self {
        Matrix { mat: [[m00, m01, m02], [m10, m11, m12], [m20, m21, m22]] }
    }

    pub fn is_identity(&self) -> bool {
        *self == Matrix::identity()
    }

    /// `self = self * b`, matching `Matrix::multiply`'s "A.B = AB" contract.
    pub fn multiply(&mut self, b: &Matrix) {
        let mut out = [[0.0f64; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = (0..3).map(|k| self.mat[i][k] * b.mat[k][j]).sum();
            }
        }
        self.mat = out;
    }

    /// Right-multiplies by a uniform scale. Composition order across
    /// `scale`/`rotate`/`translate` calls is "scale -> rotate -> translate",
    /// achieved purely by calling them in that sequence.
    pub fn scale(&mut self, factor: f64) {
        self.multiply(&Matrix::new(factor, 0.0, 0.0, 0.0, factor, 0.0, 0.0, 0.0, 1.0));
    }

    pub fn rotate(&mut self, angle_deg: f64) {
        let radians = angle_deg * std::f64::consts::PI / 180.0;
        let (sinx, cosx) = radians.sin_cos();
        self.multiply(&Matrix::new(cosx, -sinx, 0.0, sinx, cosx, 0.0, 0.0, 0.0, 1.0));
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.multiply(&Matrix::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, dx, dy, 1.0));
    }

    pub fn transform_point(&self, point: Point) -> Point {
        Point {
            x: point.x * self.mat[0][0] + point.y * self.mat[1][0] + self.mat[2][0],
            y: point.x * self.mat[0][1] + point.y * self.mat[1][1] + self.mat[2][1],
        }
    }

    /// Transforms both corners of `rect`, then re-derives bottom-left/top-right
    /// from their per-axis min/max — necessary because a 90-degree rotation
    /// can swap which corner ends up lower-left.
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        let p1 = self.transform_point(rect.left);
        let p2 = self.transform_point(rect.right);
        Rect {
            left: Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            right: Point::new(p1.x.max(p2.x), p1.y.max(p2.y)),
        }
    }

    /// Renders as the six operands of a PDF `cm` operator: `a b c d e f`.
    pub fn to_cm_operands(&self) -> [f64; 6] {
        [self.mat[0][0], self.mat[0][1], self.mat[1][0], self.mat[1][1], self.mat[2][0], self.mat[2][1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_noop() {
        let m = Matrix::identity();
        let p = m.transform_point(Point::new(3.0, 4.0));
        assert_eq!(p, Point::new(3.0, 4.0));
    }

    #[test]
    fn scale_then_translate_composes_in_order() {
        let mut m = Matrix::identity();
        m.scale(2.0);
        m.translate(10.0, 0.0);
        let p = m.transform_point(Point::new(1.0, 1.0));
        // scaled to (2,2), then translated by (10,0) -> (12, 2)
        assert_eq!(p, Point::new(12.0, 2.0));
    }

    #[test]
    fn rotate_90_degrees_swaps_axes() {
        let mut m = Matrix::identity();
        m.rotate(90.0);
        let p = m.transform_point(Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn transform_rect_reorders_corners_after_rotation() {
        let mut m = Matrix::identity();
        m.rotate(90.0);
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let transformed = m.transform_rect(rect);
        assert!(transformed.left.x <= transformed.right.x);
        assert!(transformed.left.y <= transformed.right.y);
    }

    #[test]
    fn is_landscape_compares_width_to_height() {
        assert!(Rect::new(0.0, 0.0, 800.0, 600.0).is_landscape());
        assert!(!Rect::new(0.0, 0.0, 600.0, 800.0).is_landscape());
    }

    #[test]
    fn get_from_object_resolves_one_indirect_hop() {
        let target = Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(612.0),
            Object::Real(792.0),
        ]);
        let rect = Rect::get_from_object(&Object::Reference((9, 0)), &|id| if id == (9, 0) { Some(target.clone()) } else { None }).unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 612.0, 792.0));
    }
}
