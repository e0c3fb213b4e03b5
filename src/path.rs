/*!
A scratch point list for higher-level stroking/filling routines to build
up before handing geometry to the recorder.
*/

use crate::arena::Arena;
use crate::types::Vec2f;

/// Append-only, fixed-capacity point buffer. Not itself drawable — a
/// consumer reads it back and feeds [`crate::Context::draw_convex_polygon`]
/// or [`crate::Context::draw_vertices`] with the accumulated points.
pub struct PathBuffer {
	points: Arena<Vec2f>,
}

impl PathBuffer {
	pub fn new(capacity: usize) -> PathBuffer {
		PathBuffer { points: Arena::new(capacity) }
	}

	#[inline]
	pub fn clear(&mut self) {
		self.points.clear();
	}

	#[inline]
	pub fn as_slice(&self) -> &[Vec2f] {
		self.points.as_slice()
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.points.len()
	}

	/// Appends `p` unconditionally.
	///
	/// Overflow is a programmer error: the path buffer has no merge or
	/// off-screen escape hatch to fail silently into, so running it past
	/// capacity aborts rather than dropping the point.
	#[track_caller]
	#[inline]
	pub fn path_to(&mut self, p: Vec2f) {
		let at = self.points.reserve(1).expect("path buffer overflow");
		*self.points.get_mut(at) = p;
	}

	/// Appends `p` only if it differs from the last recorded point (or
	/// the buffer is empty).
	#[track_caller]
	#[inline]
	pub fn path_to_merge_duplicate(&mut self, p: Vec2f) {
		if let Some(&last) = self.points.as_slice().last() {
			if last == p {
				return;
			}
		}
		self.path_to(p);
	}
}
