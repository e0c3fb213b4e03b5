/*!
Affine transform stack: projection, model transform, and their cached
product (the MVP) applied to every vertex a geometry kernel emits.
*/

use crate::types::Vec2f;

/// Default depth of the transform push/pop stack.
///
/// Mirrors `TINYGP_TRANSFORM_STACK_DEPTH` in the reference; kept as a
/// runtime-configurable capacity (see [`crate::Options::transform_stack_depth`])
/// rather than a const generic since every other arena in this crate is
/// sized from `Options` the same way.
pub const DEFAULT_TRANSFORM_STACK_DEPTH: usize = 16;

/// A 2x3 row-major affine matrix acting on homogeneous 2D points.
///
/// ```text
/// | m00 m01 m02 |   | x |
/// | m10 m11 m12 | * | y |
///                   | 1 |
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mat2x3 {
	pub m: [[f32; 3]; 2],
}

impl Mat2x3 {
	/// The identity transform.
	pub const IDENTITY: Mat2x3 = Mat2x3 { m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] };

	/// Applies this matrix to a point.
	#[inline]
	pub fn apply(&self, p: Vec2f) -> Vec2f {
		let m = &self.m;
		Vec2f::new(
			m[0][0] * p.x + m[0][1] * p.y + m[0][2],
			m[1][0] * p.x + m[1][1] * p.y + m[1][2],
		)
	}

	/// Projection mapping `[left, right] x [bottom, top]` onto `[-1, 1]^2`.
	#[inline]
	pub fn project(left: f32, right: f32, top: f32, bottom: f32) -> Mat2x3 {
		let w = right - left;
		let h = top - bottom;
		Mat2x3 {
			m: [
				[2.0 / w, 0.0, -(right + left) / w],
				[0.0, 2.0 / h, -(top + bottom) / h],
			],
		}
	}

	/// Default projection for a `w x h` viewport: x maps `[0, w]` to
	/// `[-1, 1]`, y maps `[0, h]` to `[1, -1]` (inverted, since window-space
	/// y grows downward and clip-space y grows upward).
	#[inline]
	pub fn viewport_projection(w: i32, h: i32) -> Mat2x3 {
		debug_assert!(w > 0 && h > 0, "viewport dimensions must be positive");
		Mat2x3 {
			m: [
				[2.0 / w as f32, 0.0, -1.0],
				[0.0, -2.0 / h as f32, 1.0],
			],
		}
	}

	/// Post-multiplies a translation by `(x, y)`.
	#[inline]
	pub fn translate(&mut self, x: f32, y: f32) {
		self.m[0][2] += x * self.m[0][0] + y * self.m[0][1];
		self.m[1][2] += x * self.m[1][0] + y * self.m[1][1];
	}

	/// Post-multiplies a scale by `(sx, sy)`.
	#[inline]
	pub fn scale(&mut self, sx: f32, sy: f32) {
		self.m[0][0] *= sx;
		self.m[1][0] *= sx;
		self.m[0][1] *= sy;
		self.m[1][1] *= sy;
	}

	/// Post-multiplies a rotation by `theta` radians.
	#[inline]
	pub fn rotate(&mut self, theta: f32) {
		let (s, c) = theta.sin_cos();
		*self = Mat2x3 {
			m: [
				[c * self.m[0][0] + s * self.m[0][1], -s * self.m[0][0] + c * self.m[0][1], self.m[0][2]],
				[c * self.m[1][0] + s * self.m[1][1], -s * self.m[1][0] + c * self.m[1][1], self.m[1][2]],
			],
		};
	}

	/// `translate(x, y); op; translate(-x, -y)` around a pivot point.
	#[inline]
	fn around<F: FnOnce(&mut Mat2x3)>(&mut self, x: f32, y: f32, op: F) {
		self.translate(x, y);
		op(self);
		self.translate(-x, -y);
	}

	#[inline]
	pub fn scale_at(&mut self, sx: f32, sy: f32, x: f32, y: f32) {
		self.around(x, y, |t| t.scale(sx, sy));
	}

	#[inline]
	pub fn rotate_at(&mut self, theta: f32, x: f32, y: f32) {
		self.around(x, y, |t| t.rotate(theta));
	}

	/// Computes `projection * transform`, exploiting the projection's
	/// diagonal form (it is always axis-aligned scale + translate): only
	/// four multiplies and two adds per output row.
	#[inline]
	pub fn mul_proj(proj: &Mat2x3, transform: &Mat2x3) -> Mat2x3 {
		let x = proj.m[0][0];
		let y = proj.m[1][1];
		Mat2x3 {
			m: [
				[x * transform.m[0][0], x * transform.m[0][1], x * transform.m[0][2] + proj.m[0][2]],
				[y * transform.m[1][0], y * transform.m[1][1], y * transform.m[1][2] + proj.m[1][2]],
			],
		}
	}
}

impl Default for Mat2x3 {
	#[inline]
	fn default() -> Mat2x3 {
		Mat2x3::IDENTITY
	}
}

/// Fixed-depth push/pop stack for the model transform.
///
/// Overflow and underflow are programmer errors (mismatched push/pop
/// pairs) and abort via `assert!`, matching the reference's
/// `TINYGP_ASSERT` on the same conditions.
pub struct TransformStack {
	stack: Box<[Mat2x3]>,
	len: usize,
}

impl TransformStack {
	pub fn new(depth: usize) -> TransformStack {
		TransformStack { stack: vec![Mat2x3::IDENTITY; depth].into_boxed_slice(), len: 0 }
	}

	#[inline]
	pub fn reset(&mut self) {
		self.len = 0;
	}

	#[track_caller]
	#[inline]
	pub fn push(&mut self, transform: Mat2x3) {
		assert!(self.len < self.stack.len(), "transform stack overflow (depth {})", self.stack.len());
		self.stack[self.len] = transform;
		self.len += 1;
	}

	#[track_caller]
	#[inline]
	pub fn pop(&mut self) -> Mat2x3 {
		assert!(self.len > 0, "transform stack underflow");
		self.len -= 1;
		self.stack[self.len]
	}
}
