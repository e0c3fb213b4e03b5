/*!
Geometry kernels: the operations that actually write vertices and indices.

Every kernel here follows the same shape: reserve arena space, write
untransformed positions (and, for the polygon fringe, per-vertex color),
then hand off to [`Context::transform_and_queue`] which applies the MVP,
computes the clip-space region, and queues the draw (merge or append).
*/

use crate::command::Command;
use crate::context::Context;
use crate::error::CapacityError;
use crate::types::{Color, Index, Vec2f};
use crate::vertex::Vertex;

/// Squared-length clamp applied to the averaged edge normal before scaling
/// it into a fringe offset, matching the reference's `fixnormal` guard.
const MAX_INVLEN2: f32 = 100.0;

/// Below this squared length an edge (or averaged normal) is treated as
/// zero and left unnormalized rather than dividing by ~zero.
const NORMALIZE_EPSILON: f32 = 1e-6;

impl<K: PartialEq + Copy + Default> Context<K> {
	/// Appends a `Clear(color)` command carrying the current color. Always
	/// a fresh command slot — a clear never coalesces with a preceding one.
	pub fn clear(&mut self) {
		let color = self.color();
		if !self.push_command(Command::Clear(color)) {
			log::warn!("{}, clear dropped", CapacityError::CommandArenaFull { capacity: self.options().max_commands });
		}
	}

	/// Records `points` as a raw triangle list: every three consecutive
	/// points form one triangle, addressed `0, 1, 2, 3, 4, 5, ...` (no
	/// shared vertices between triangles). `points.len()` must be a
	/// multiple of 3; any remainder is silently ignored, matching "zero
	/// triangles" being a no-op rather than an error.
	///
	/// A no-op if the current color is fully transparent, or if there
	/// isn't room in the arenas.
	pub fn draw_vertices(&mut self, points: &[Vec2f]) {
		let num_triangles = points.len() / 3;
		let num_vertices = num_triangles * 3;
		if num_vertices == 0 || self.color().is_transparent() {
			return;
		}
		let num_indices = num_triangles * 3;

		let (vtx_offset, idx_offset, cmd_vtx_offset) = match self.reserve(num_vertices, num_indices) {
			Ok(offsets) => offsets,
			Err(err) => {
				log::trace!("{}, draw_vertices dropped", err);
				return;
			}
		};

		{
			let vertices = self.vertices_mut().as_mut_slice();
			for (i, &p) in points[..num_vertices].iter().enumerate() {
				vertices[vtx_offset as usize + i] = Vertex::new(p, Vec2f::new(0.0, 0.0), Color::WHITE);
			}
		}
		self.write_indices(idx_offset, (0..num_vertices as Index).map(|i| cmd_vtx_offset as Index + i));

		self.transform_and_queue(vtx_offset, idx_offset, num_vertices as u32, num_indices as u32, true, true);
	}

	/// Records a convex polygon, triangulated as a fan from vertex 0.
	///
	/// `points` must be wound clockwise for the antialiasing fringe (when
	/// enabled) to sit outside the shape; counter-clockwise input puts the
	/// fringe "inside" instead. A no-op for fewer than 3 points or a fully
	/// transparent current color.
	///
	/// Without antialiasing this emits exactly `points.len()` vertices and
	/// `3 * (points.len() - 2)` indices. With it (the default, see
	/// [`crate::Options::antialiasing`]) each input point is duplicated
	/// into an inner (opaque) and outer (alpha-zero) sample, doubling the
	/// vertex count and adding six fringe indices per edge.
	pub fn draw_convex_polygon(&mut self, points: &[Vec2f]) {
		if points.len() < 3 || self.color().is_transparent() {
			return;
		}
		if self.antialiasing() {
			self.draw_convex_polygon_aa(points);
		} else {
			self.draw_convex_polygon_flat(points);
		}
	}

	fn draw_convex_polygon_flat(&mut self, points: &[Vec2f]) {
		let n = points.len();
		let num_vertices = n;
		let num_indices = (n - 2) * 3;

		let (vtx_offset, idx_offset, cmd_vtx_offset) = match self.reserve(num_vertices, num_indices) {
			Ok(offsets) => offsets,
			Err(err) => {
				log::trace!("{}, draw_convex_polygon dropped", err);
				return;
			}
		};

		{
			let vertices = self.vertices_mut().as_mut_slice();
			for (i, &p) in points.iter().enumerate() {
				vertices[vtx_offset as usize + i] = Vertex::new(p, Vec2f::new(0.0, 0.0), Color::WHITE);
			}
		}

		let base = cmd_vtx_offset as Index;
		let mut indices = Vec::with_capacity(num_indices);
		for i in 2..n {
			indices.push(base);
			indices.push(base + (i - 1) as Index);
			indices.push(base + i as Index);
		}
		self.write_indices(idx_offset, indices.into_iter());

		self.transform_and_queue(vtx_offset, idx_offset, num_vertices as u32, num_indices as u32, true, true);
	}

	fn draw_convex_polygon_aa(&mut self, points: &[Vec2f]) {
		let n = points.len();
		let num_vertices = n * 2;
		let num_indices = (n - 2) * 3 + n * 6;

		let (vtx_offset, idx_offset, cmd_vtx_offset) = match self.reserve(num_vertices, num_indices) {
			Ok(offsets) => offsets,
			Err(err) => {
				log::trace!("{}, draw_convex_polygon (aa) dropped", err);
				return;
			}
		};

		let color = self.color();
		let color_trans = color.transparent();
		let fringe = self.fringe_scale();

		let normals = edge_normals(points);

		let mut indices = Vec::with_capacity(num_indices);
		let inner = cmd_vtx_offset as Index;
		let outer = cmd_vtx_offset as Index + 1;

		// fan triangles over the inner ring
		for i in 2..n {
			indices.push(inner);
			indices.push(inner + (((i - 1) << 1) as Index));
			indices.push(inner + ((i << 1) as Index));
		}

		let mut verts = Vec::with_capacity(num_vertices);
		let mut i0 = n - 1;
		for i1 in 0..n {
			let n0 = normals[i0];
			let n1 = normals[i1];
			let mut dm = Vec2f::new((n0.x + n1.x) * 0.5, (n0.y + n1.y) * 0.5);
			dm = fixnormal(dm);
			dm = dm * (fringe * 0.5);

			let p = points[i1];
			verts.push(Vertex::new(p - dm, Vec2f::new(0.0, 0.0), color));
			verts.push(Vertex::new(p + dm, Vec2f::new(0.0, 0.0), color_trans));

			indices.push(inner + ((i1 << 1) as Index));
			indices.push(inner + ((i0 << 1) as Index));
			indices.push(outer + ((i0 << 1) as Index));
			indices.push(outer + ((i0 << 1) as Index));
			indices.push(outer + ((i1 << 1) as Index));
			indices.push(inner + ((i1 << 1) as Index));

			i0 = i1;
		}

		{
			let vertices = self.vertices_mut().as_mut_slice();
			vertices[vtx_offset as usize..vtx_offset as usize + num_vertices].copy_from_slice(&verts);
		}
		self.write_indices(idx_offset, indices.into_iter());

		// color is already set per-vertex above; only texcoord needs filling in.
		self.transform_and_queue(vtx_offset, idx_offset, num_vertices as u32, num_indices as u32, false, true);
	}

	fn write_indices<I: Iterator<Item = Index>>(&mut self, idx_offset: u32, values: I) {
		let indices = self.indices_mut().as_mut_slice();
		for (i, v) in values.enumerate() {
			indices[idx_offset as usize + i] = v;
		}
	}
}

/// Unit outward edge normal `(dy, -dx) / |d|` for each edge `(p_i,
/// p_{i+1})`, indexed by `i` (the edge starting at `points[i]`). Degenerate
/// (near-zero-length) edges are left as the zero vector.
fn edge_normals(points: &[Vec2f]) -> Vec<Vec2f> {
	let n = points.len();
	let mut normals = vec![Vec2f::new(0.0, 0.0); n];
	let mut i0 = n - 1;
	for i1 in 0..n {
		let p0 = points[i0];
		let p1 = points[i1];
		let d = normalize_over_zero(p1 - p0);
		normals[i0] = Vec2f::new(d.y, -d.x);
		i0 = i1;
	}
	normals
}

/// Normalizes `v`, leaving it untouched if its squared length is below
/// [`NORMALIZE_EPSILON`] (matches `TGP_NORMALIZE2F_OVER_ZERO`'s zero-length
/// guard rather than producing `NaN`).
#[inline]
fn normalize_over_zero(v: Vec2f) -> Vec2f {
	let len_sqr = v.x * v.x + v.y * v.y;
	if len_sqr > 0.0 {
		let inv_len = len_sqr.sqrt().recip();
		Vec2f::new(v.x * inv_len, v.y * inv_len)
	} else {
		v
	}
}

/// Clamps the averaged edge normal's magnitude so a sharp, near-degenerate
/// corner doesn't produce an enormous fringe offset (`TGP_FIXNORMAL2F`).
#[inline]
fn fixnormal(v: Vec2f) -> Vec2f {
	let len_sqr = v.x * v.x + v.y * v.y;
	if len_sqr > NORMALIZE_EPSILON {
		let mut inv_len_sqr = 1.0 / len_sqr;
		if inv_len_sqr > MAX_INVLEN2 {
			inv_len_sqr = MAX_INVLEN2;
		}
		Vec2f::new(v.x * inv_len_sqr, v.y * inv_len_sqr)
	} else {
		v
	}
}
