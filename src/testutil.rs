/*!
A minimal software reference "backend", `#[cfg(test)]`-only.

Mirrors the role of `d2::tests::mock::MockCanvas`: a stand-in that lets
higher-level drawing logic be tested without a window or a real graphics
context. Unlike `MockCanvas` (which just records what it would have been
asked to draw), [`SoftSurface`] actually executes the command stream well
enough to support the round-trip properties this crate cares about —
painter-order compositing and the antialiasing fringe's alpha ramp — via
a plain scanline-ish triangle fill, not anything GPU-shaped.

Assumes the default axis-aligned viewport projection (`Mat2x3::viewport_projection`)
is in effect when mapping stored clip-space positions back to pixels; a
custom [`Context::project`] would need its own inverse to render correctly
here, which this reference backend does not attempt.
*/

use crate::command::Command;
use crate::context::Context;
use crate::types::{Color, IRect};
use crate::vertex::Vertex;

/// An in-memory RGBA framebuffer that executes a recorded command stream.
pub struct SoftSurface {
	width: i32,
	height: i32,
	pixels: Vec<[f32; 4]>,
	viewport: IRect,
	scissor: Option<IRect>,
}

impl SoftSurface {
	pub fn new(width: i32, height: i32) -> SoftSurface {
		SoftSurface {
			width,
			height,
			pixels: vec![[0.0, 0.0, 0.0, 0.0]; (width * height) as usize],
			viewport: IRect::new(0, 0, width, height),
			scissor: None,
		}
	}

	#[inline]
	pub fn pixel(&self, x: i32, y: i32) -> [f32; 4] {
		if x < 0 || y < 0 || x >= self.width || y >= self.height {
			return [0.0, 0.0, 0.0, 0.0];
		}
		self.pixels[(y * self.width + x) as usize]
	}

	/// Executes every live command from `ctx` in painter order.
	pub fn execute<K: Copy>(&mut self, ctx: &Context<K>) {
		let vertices = ctx.vertices().as_slice();
		let indices = ctx.indices().as_slice();
		for cmd in ctx.commands() {
			match *cmd {
				Command::None => {}
				Command::Viewport(rect) => self.viewport = rect,
				Command::Scissor(rect) => {
					self.scissor = if rect.w < 0 || rect.h < 0 { None } else { Some(rect) };
				}
				Command::Clear(color) => self.fill_clip_region(color),
				Command::Draw { vtx_offset, idx_offset, num_indices, .. } => {
					let idx_start = idx_offset as usize;
					let idx_end = idx_start + num_indices as usize;
					for tri in indices[idx_start..idx_end].chunks_exact(3) {
						let a = vertices[vtx_offset as usize + tri[0] as usize];
						let b = vertices[vtx_offset as usize + tri[1] as usize];
						let c = vertices[vtx_offset as usize + tri[2] as usize];
						self.rasterize_triangle(a, b, c);
					}
				}
			}
		}
	}

	fn clip_rect(&self) -> (i32, i32, i32, i32) {
		let (vx0, vy0, vx1, vy1) = (self.viewport.x, self.viewport.y, self.viewport.x + self.viewport.w, self.viewport.y + self.viewport.h);
		match self.scissor {
			Some(s) => (vx0.max(s.x), vy0.max(s.y), vx1.min(s.x + s.w), vy1.min(s.y + s.h)),
			None => (vx0, vy0, vx1, vy1),
		}
	}

	fn fill_clip_region(&mut self, color: Color) {
		let (x0, y0, x1, y1) = self.clip_rect();
		for y in y0.max(0)..y1.min(self.height) {
			for x in x0.max(0)..x1.min(self.width) {
				self.pixels[(y * self.width + x) as usize] = [color.r, color.g, color.b, color.a];
			}
		}
	}

	/// Converts a clip-space position into screen pixel coordinates,
	/// assuming the default viewport projection.
	fn to_screen(&self, pos: crate::types::Vec2f) -> (f32, f32) {
		let x = (pos.x + 1.0) * 0.5 * self.viewport.w as f32 + self.viewport.x as f32;
		let y = (1.0 - pos.y) * 0.5 * self.viewport.h as f32 + self.viewport.y as f32;
		(x, y)
	}

	fn rasterize_triangle(&mut self, a: Vertex, b: Vertex, c: Vertex) {
		let (ax, ay) = self.to_screen(a.position);
		let (bx, by) = self.to_screen(b.position);
		let (cx, cy) = self.to_screen(c.position);

		let area = edge(ax, ay, bx, by, cx, cy);
		if area == 0.0 {
			return;
		}

		let (clip_x0, clip_y0, clip_x1, clip_y1) = self.clip_rect();
		let min_x = ax.min(bx).min(cx).floor().max(clip_x0 as f32).max(0.0) as i32;
		let max_x = ax.max(bx).max(cx).ceil().min(clip_x1 as f32).min(self.width as f32) as i32;
		let min_y = ay.min(by).min(cy).floor().max(clip_y0 as f32).max(0.0) as i32;
		let max_y = ay.max(by).max(cy).ceil().min(clip_y1 as f32).min(self.height as f32) as i32;

		for y in min_y..max_y {
			for x in min_x..max_x {
				let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
				let w0 = edge(bx, by, cx, cy, px, py) / area;
				let w1 = edge(cx, cy, ax, ay, px, py) / area;
				let w2 = edge(ax, ay, bx, by, px, py) / area;
				if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
					continue;
				}
				let color = [
					w0 * a.color.r + w1 * b.color.r + w2 * c.color.r,
					w0 * a.color.g + w1 * b.color.g + w2 * c.color.g,
					w0 * a.color.b + w1 * b.color.b + w2 * c.color.b,
					w0 * a.color.a + w1 * b.color.a + w2 * c.color.a,
				];
				let idx = (y * self.width + x) as usize;
				let dst = self.pixels[idx];
				let src_a = color[3];
				self.pixels[idx] = [
					color[0] * src_a + dst[0] * (1.0 - src_a),
					color[1] * src_a + dst[1] * (1.0 - src_a),
					color[2] * src_a + dst[2] * (1.0 - src_a),
					src_a + dst[3] * (1.0 - src_a),
				];
			}
		}
	}
}

#[inline]
fn edge(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
	(bx - ax) * (py - ay) - (by - ay) * (px - ax)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Options;
	use crate::types::Vec2f;

	#[test]
	fn clear_fills_the_whole_viewport() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(8, 8);
		ctx.set_color(Color::new(0.2, 0.4, 0.6, 1.0));
		ctx.clear();

		let mut surface = SoftSurface::new(8, 8);
		surface.execute(&ctx);
		let p = surface.pixel(3, 3);
		assert!((p[0] - 0.2).abs() < 1e-5);
		assert!((p[1] - 0.4).abs() < 1e-5);
		assert!((p[2] - 0.6).abs() < 1e-5);
	}

	#[test]
	fn opaque_polygon_paints_its_interior() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(64, 64);
		ctx.set_antialiasing(false);
		ctx.set_color(Color::new(1.0, 0.0, 0.0, 1.0));
		ctx.draw_convex_polygon(&[Vec2f::new(8.0, 8.0), Vec2f::new(56.0, 8.0), Vec2f::new(56.0, 56.0), Vec2f::new(8.0, 56.0)]);

		let mut surface = SoftSurface::new(64, 64);
		surface.execute(&ctx);
		let p = surface.pixel(32, 32);
		assert!((p[0] - 1.0).abs() < 1e-3);
		assert!(p[3] > 0.99);
	}

	#[test]
	fn antialiased_edge_alpha_ramps_toward_zero_outside_fringe() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(64, 64);
		ctx.set_antialiasing(true);
		ctx.set_color(Color::new(1.0, 1.0, 1.0, 1.0));
		// fringe_scale defaults to 1 pixel; use a wider one so the ramp is
		// easy to sample at integer pixel coordinates.
		ctx.draw_convex_polygon(&[Vec2f::new(16.0, 16.0), Vec2f::new(48.0, 16.0), Vec2f::new(48.0, 48.0), Vec2f::new(16.0, 48.0)]);

		let mut surface = SoftSurface::new(64, 64);
		surface.execute(&ctx);

		let inside = surface.pixel(32, 20)[3];
		let outside = surface.pixel(32, 2)[3];
		assert!(inside > 0.9, "well inside the fill should be ~opaque, got {}", inside);
		assert!(outside < 0.05, "well outside the fringe should be ~transparent, got {}", outside);
	}

	#[test]
	fn merged_draws_each_paint_their_own_position() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(64, 64);
		ctx.set_antialiasing(false);
		ctx.set_color(Color::new(1.0, 0.0, 0.0, 1.0));
		ctx.draw_convex_polygon(&[Vec2f::new(4.0, 4.0), Vec2f::new(12.0, 4.0), Vec2f::new(12.0, 12.0), Vec2f::new(4.0, 12.0)]);
		ctx.draw_convex_polygon(&[Vec2f::new(40.0, 40.0), Vec2f::new(48.0, 40.0), Vec2f::new(48.0, 48.0), Vec2f::new(40.0, 48.0)]);

		// same userdata (the default `()`), no command in between: these two
		// disjoint polygons should fuse into a single draw command.
		assert_eq!(ctx.command_count(), 2, "viewport + one merged draw");

		let mut surface = SoftSurface::new(64, 64);
		surface.execute(&ctx);

		let first = surface.pixel(8, 8);
		let second = surface.pixel(44, 44);
		assert!(first[3] > 0.9, "first polygon's own position should be painted, got alpha {}", first[3]);
		assert!(second[3] > 0.9, "second polygon's own position should be painted, got alpha {}", second[3]);

		let between = surface.pixel(24, 24);
		assert!(between[3] < 0.05, "nothing should render between the two disjoint polygons, got alpha {}", between[3]);
	}
}
