/*!
The recorder itself: a single-threaded, non-reentrant object owning the
vertex/index/command/path arenas plus the small amount of state (viewport,
scissor, transform, color) that every drawing operation reads.

One frame is bracketed by [`Context::begin`] and an implicit end when the
backend walks [`Context::commands`].
*/

use crate::arena::Arena;
use crate::batch::{self, MergeOutcome, MergeScratch, PendingDraw};
use crate::command::{Command, CommandBuffer};
use crate::config::Options;
use crate::error::CapacityError;
use crate::path::PathBuffer;
use crate::transform::{Mat2x3, TransformStack};
use crate::types::{Color, IRect, Index, Region, Vec2f};
use crate::vertex::Vertex;

/// The painter context.
///
/// `K` is the per-draw userdata key used by the batch optimizer to decide
/// whether two draws share state (see [`crate::batch`]); it defaults to
/// `()`, under which every draw is mergeable with every other. Swap it for
/// a small `Copy + PartialEq` key (a shader/texture id, say) to scope
/// merging to draws a real backend could actually submit together.
///
/// Construct with [`Context::new`], sized from an [`Options`]; arenas are
/// freed when the `Context` drops. Every mutating method takes `&mut self`:
/// there is no interior mutability and no way to record from two threads
/// at once without `unsafe`.
pub struct Context<K = ()> {
	options: Options,

	screen_size: (i32, i32),
	viewport: IRect,
	scissor: IRect,

	vertices: Arena<Vertex>,
	indices: Arena<Index>,
	commands: CommandBuffer<K>,
	path: PathBuffer,

	// Per-command-local vertex/index counters. Reset whenever a brand new
	// command slot is appended (fresh `Draw`, `Viewport`, `Scissor`, or
	// `Clear`); left alone across a merge-into-previous, which extends an
	// existing command's vertex/index run instead of starting a new one.
	// Geometry kernels write indices relative to this so a later
	// merge-into-previous needs no index rewriting, only relocation.
	cur_cmd_vertex: u32,
	cur_cmd_index: u32,

	antialiasing: bool,
	fringe_scale: f32,

	projection: Mat2x3,
	transform: Mat2x3,
	mvp: Mat2x3,
	transform_stack: TransformStack,

	color: Color,
	current_userdata: K,

	merge_scratch: MergeScratch,
}

impl<K: PartialEq + Copy + Default> Context<K> {
	/// Allocates all arenas up front per `options`. No further allocation
	/// happens during recording.
	pub fn new(options: Options) -> Context<K> {
		Context {
			vertices: Arena::new(options.max_vertices),
			indices: Arena::new(options.max_indices),
			commands: CommandBuffer::new(options.max_commands),
			path: PathBuffer::new(options.max_path),
			cur_cmd_vertex: 0,
			cur_cmd_index: 0,
			antialiasing: options.antialiasing,
			fringe_scale: options.fringe_scale,
			screen_size: (0, 0),
			viewport: IRect::new(0, 0, -1, -1),
			scissor: IRect::new(0, 0, -1, -1),
			projection: Mat2x3::IDENTITY,
			transform: Mat2x3::IDENTITY,
			mvp: Mat2x3::IDENTITY,
			transform_stack: TransformStack::new(options.transform_stack_depth),
			color: Color::WHITE,
			current_userdata: K::default(),
			merge_scratch: MergeScratch::new(options.batch_optimizer_depth.max(1)),
			options,
		}
	}

	/// Resets all cursors, installs the default projection for `(width,
	/// height)`, sets viewport/scissor to sentinels, resets the color to
	/// opaque white, and records an explicit `Viewport(0, 0, width,
	/// height)` so every frame starts with one.
	pub fn begin(&mut self, width: i32, height: i32) {
		self.vertices.clear();
		self.indices.clear();
		self.commands.clear();
		self.path.clear();
		self.transform_stack.reset();
		self.cur_cmd_vertex = 0;
		self.cur_cmd_index = 0;

		self.screen_size = (width, height);
		self.viewport = IRect::new(0, 0, -1, -1);
		self.scissor = IRect::new(0, 0, -1, -1);
		self.projection = Mat2x3::viewport_projection(width, height);
		self.transform = Mat2x3::IDENTITY;
		self.update_mvp();
		self.color = Color::WHITE;

		self.viewport(0, 0, width, height);
	}

	/// Returns the command at `index`, or `None` past the end of the
	/// current frame. Tombstoned (`Command::None`) slots are returned as
	/// such — callers that want to skip them should use [`Context::commands`].
	#[inline]
	pub fn get_command(&self, index: usize) -> Option<&Command<K>> {
		self.commands.get(index)
	}

	/// The number of recorded command slots in the current frame
	/// (including tombstones).
	#[inline]
	pub fn command_count(&self) -> usize {
		self.commands.len()
	}

	/// Iterates live (non-tombstoned) commands in painter order. This is
	/// what a backend should walk.
	#[inline]
	pub fn commands(&self) -> impl Iterator<Item = &Command<K>> {
		self.commands.commands()
	}

	#[inline]
	pub(crate) fn vertices(&self) -> &Arena<Vertex> {
		&self.vertices
	}

	#[inline]
	pub(crate) fn indices(&self) -> &Arena<Index> {
		&self.indices
	}

	// ---- Transform stack ----------------------------------------------

	/// Sets the projection to map `[left, right] x [bottom, top]` onto
	/// `[-1, 1]^2`.
	pub fn project(&mut self, left: f32, right: f32, top: f32, bottom: f32) {
		self.projection = Mat2x3::project(left, right, top, bottom);
		self.update_mvp();
	}

	/// Installs the default projection for the current viewport's
	/// dimensions.
	pub fn reset_projection(&mut self) {
		self.projection = Mat2x3::viewport_projection(self.screen_size.0, self.screen_size.1);
		self.update_mvp();
	}

	/// Pushes the current transform onto the stack. Overflowing the
	/// configured depth is a programmer error and panics.
	#[track_caller]
	pub fn push_transform(&mut self) {
		self.transform_stack.push(self.transform);
	}

	/// Pops the transform stack, restoring the transform that was active
	/// at the matching [`Context::push_transform`]. Underflow is a
	/// programmer error and panics.
	#[track_caller]
	pub fn pop_transform(&mut self) {
		self.transform = self.transform_stack.pop();
		self.update_mvp();
	}

	/// Installs the identity transform.
	pub fn reset_transform(&mut self) {
		self.transform = Mat2x3::IDENTITY;
		self.update_mvp();
	}

	/// Post-multiplies a translation onto the current transform.
	pub fn translate(&mut self, x: f32, y: f32) {
		self.transform.translate(x, y);
		self.update_mvp();
	}

	/// Post-multiplies a scale onto the current transform.
	pub fn scale(&mut self, sx: f32, sy: f32) {
		self.transform.scale(sx, sy);
		self.update_mvp();
	}

	/// Scales around the pivot `(x, y)`: `translate(x,y); scale; translate(-x,-y)`.
	pub fn scale_at(&mut self, sx: f32, sy: f32, x: f32, y: f32) {
		self.transform.scale_at(sx, sy, x, y);
		self.update_mvp();
	}

	/// Post-multiplies a rotation (radians) onto the current transform.
	pub fn rotate(&mut self, theta: f32) {
		self.transform.rotate(theta);
		self.update_mvp();
	}

	/// Rotates around the pivot `(x, y)`.
	pub fn rotate_at(&mut self, theta: f32, x: f32, y: f32) {
		self.transform.rotate_at(theta, x, y);
		self.update_mvp();
	}

	#[inline]
	fn update_mvp(&mut self) {
		self.mvp = Mat2x3::mul_proj(&self.projection, &self.transform);
	}

	#[inline]
	pub(crate) fn mvp(&self) -> Mat2x3 {
		self.mvp
	}

	// ---- State ----------------------------------------------------------

	/// Sets the current draw color.
	#[inline]
	pub fn set_color(&mut self, color: Color) {
		self.color = color;
	}

	/// Resets the current draw color to opaque white.
	#[inline]
	pub fn reset_color(&mut self) {
		self.color = Color::WHITE;
	}

	#[inline]
	pub(crate) fn color(&self) -> Color {
		self.color
	}

	/// Sets the userdata key attached to subsequent draws, scoping which
	/// future draws the batch optimizer considers mergeable with them.
	#[inline]
	pub fn set_userdata(&mut self, userdata: K) {
		self.current_userdata = userdata;
	}

	/// Whether [`Context::antialiasing`] should be applied to polygons by
	/// default (see [`Options::antialiasing`]).
	#[inline]
	pub fn antialiasing(&self) -> bool {
		self.antialiasing
	}

	#[inline]
	pub fn set_antialiasing(&mut self, enabled: bool) {
		self.antialiasing = enabled;
	}

	/// Changes the render viewport.
	///
	/// A no-op if `(x, y, w, h)` already matches the current viewport.
	/// Otherwise coalesces with an immediately preceding `Viewport`
	/// command, or appends a new one if the command arena has room. If a
	/// scissor is active, its stored (screen-space) origin is shifted by
	/// the viewport delta so it keeps pointing at the same screen pixels.
	/// Installs the default projection for `(w, h)`.
	pub fn viewport(&mut self, x: i32, y: i32, w: i32, h: i32) {
		let rect = IRect::new(x, y, w, h);
		if self.viewport == rect {
			return;
		}
		let dx = x - self.viewport.x;
		let dy = y - self.viewport.y;

		let appended = match self.commands.record_viewport(rect) {
			Some(appended) => appended,
			None => {
				log::warn!("{}, viewport change dropped", CapacityError::CommandArenaFull { capacity: self.options.max_commands });
				return;
			}
		};
		if appended {
			self.reset_cmd_cursor();
		}

		if self.scissor.w >= 0 && self.scissor.h >= 0 {
			self.scissor.x += dx;
			self.scissor.y += dy;
		}
		self.viewport = rect;
		self.projection = Mat2x3::viewport_projection(w, h);
		self.update_mvp();
	}

	/// Resets the viewport to cover the whole screen as set by the last
	/// [`Context::begin`].
	pub fn reset_viewport(&mut self) {
		let (w, h) = self.screen_size;
		self.viewport(0, 0, w, h);
	}

	/// Changes the scissor rectangle, in viewport-relative coordinates.
	///
	/// `w < 0 && h < 0` disables clipping (a full-screen scissor is
	/// recorded). Otherwise the rectangle stored in the command is offset
	/// into screen coordinates by the current viewport origin.
	pub fn scissor(&mut self, x: i32, y: i32, w: i32, h: i32) {
		let rect = IRect::new(x, y, w, h);
		if self.scissor == rect {
			return;
		}

		let stored = if w < 0 && h < 0 {
			IRect::new(0, 0, self.screen_size.0, self.screen_size.1)
		} else {
			IRect::new(self.viewport.x + x, self.viewport.y + y, w, h)
		};

		let appended = match self.commands.record_scissor(stored) {
			Some(appended) => appended,
			None => {
				log::warn!("{}, scissor change dropped", CapacityError::CommandArenaFull { capacity: self.options.max_commands });
				return;
			}
		};
		if appended {
			self.reset_cmd_cursor();
		}
		self.scissor = rect;
	}

	/// Disables clipping (equivalent to `scissor(0, 0, -1, -1)`).
	pub fn reset_scissor(&mut self) {
		self.scissor(0, 0, -1, -1);
	}

	/// Resets color, projection, scissor, transform, and viewport to their
	/// defaults, in that order.
	pub fn reset_state(&mut self) {
		self.reset_color();
		self.reset_projection();
		self.reset_scissor();
		self.reset_transform();
		self.reset_viewport();
	}

	// ---- Path buffer ------------------------------------------------------

	/// Clears the scratch path buffer.
	#[inline]
	pub fn path_clear(&mut self) {
		self.path.clear();
	}

	/// Appends a point to the path buffer unconditionally.
	#[track_caller]
	#[inline]
	pub fn path_to(&mut self, p: Vec2f) {
		self.path.path_to(p);
	}

	/// Appends a point to the path buffer unless it equals the last one.
	#[track_caller]
	#[inline]
	pub fn path_to_merge_duplicate(&mut self, p: Vec2f) {
		self.path.path_to_merge_duplicate(p);
	}

	/// The points accumulated in the path buffer so far.
	#[inline]
	pub fn path(&self) -> &[Vec2f] {
		self.path.as_slice()
	}

	// ---- Internal plumbing shared with `geometry` ------------------------

	#[inline]
	fn reset_cmd_cursor(&mut self) {
		self.cur_cmd_vertex = 0;
		self.cur_cmd_index = 0;
	}

	/// Atomically reserves `vtx_count` vertices and `idx_count` indices, or
	/// leaves both arenas untouched and returns which one is out of room.
	pub(crate) fn reserve(&mut self, vtx_count: usize, idx_count: usize) -> Result<(u32, u32, u32), CapacityError> {
		let vtx_offset = self.vertices.reserve(vtx_count).ok_or(CapacityError::VertexArenaFull { capacity: self.options.max_vertices })?;
		match self.indices.reserve(idx_count) {
			Some(idx_offset) => {
				let cmd_vtx_offset = self.cur_cmd_vertex;
				self.cur_cmd_vertex += vtx_count as u32;
				self.cur_cmd_index += idx_count as u32;
				Ok((vtx_offset as u32, idx_offset as u32, cmd_vtx_offset))
			}
			None => {
				self.vertices.rewind_to(vtx_offset);
				Err(CapacityError::IndexArenaFull { capacity: self.options.max_indices })
			}
		}
	}

	#[inline]
	pub(crate) fn vertices_mut(&mut self) -> &mut Arena<Vertex> {
		&mut self.vertices
	}

	#[inline]
	pub(crate) fn indices_mut(&mut self) -> &mut Arena<Index> {
		&mut self.indices
	}

	#[inline]
	pub(crate) fn options(&self) -> &Options {
		&self.options
	}

	#[inline]
	pub(crate) fn fringe_scale(&self) -> f32 {
		self.fringe_scale
	}

	#[inline]
	pub(crate) fn push_command(&mut self, cmd: Command<K>) -> bool {
		match self.commands.push(cmd) {
			Some(_) => {
				self.reset_cmd_cursor();
				true
			}
			None => false,
		}
	}

	/// Applies the current MVP to every vertex in `[vtx_offset, vtx_offset +
	/// num_vertices)`, accumulating the clip-space region; optionally
	/// overwrites color and/or texcoord while doing so. Then hands off to
	/// [`Context::queue_draw`].
	pub(crate) fn transform_and_queue(
		&mut self,
		vtx_offset: u32,
		idx_offset: u32,
		num_vertices: u32,
		num_indices: u32,
		set_color: bool,
		set_texcoord: bool,
	) {
		let mvp = self.mvp;
		let color = self.color;
		let mut region = Region::EMPTY;
		let start = vtx_offset as usize;
		let end = start + num_vertices as usize;
		for vertex in &mut self.vertices.as_mut_slice()[start..end] {
			let pos = mvp.apply(vertex.position);
			region.include(pos);
			vertex.position = pos;
			if set_color {
				vertex.color = color;
			}
			if set_texcoord {
				vertex.texcoord = Vec2f::new(0.0, 0.0);
			}
		}
		self.queue_draw(region, vtx_offset, idx_offset, num_vertices, num_indices);
	}

	/// Culls off-screen draws, otherwise tries a batch merge and falls back
	/// to appending a new `Draw` command. Never leaves the arenas in a
	/// partially-mutated state: every exit path either commits the full
	/// reservation or rewinds both the vertex and index cursors.
	fn queue_draw(&mut self, region: Region, vtx_offset: u32, idx_offset: u32, num_vertices: u32, num_indices: u32) {
		if region.is_offscreen() {
			self.vertices.rewind_to(vtx_offset as usize);
			self.indices.rewind_to(idx_offset as usize);
			log::trace!("draw culled off-screen (region {:?})", region);
			return;
		}

		let pending = PendingDraw { region, vtx_offset, idx_offset, num_vertices, num_indices, userdata: self.current_userdata };
		let outcome = batch::try_merge(
			&mut self.commands,
			&mut self.vertices,
			&mut self.indices,
			&mut self.merge_scratch,
			self.options.batch_optimizer_depth,
			self.options.max_vertices,
			self.options.max_indices,
			&pending,
		);
		match outcome {
			MergeOutcome::MergedIntoPrevious => return,
			MergeOutcome::MergedIntoNext => {
				self.reset_cmd_cursor();
				return;
			}
			MergeOutcome::NotMerged => {}
		}

		let cmd = Command::Draw { vtx_offset, idx_offset, num_vertices, num_indices, region, userdata: self.current_userdata };
		match self.commands.push(cmd) {
			Some(_) => self.reset_cmd_cursor(),
			None => {
				self.vertices.rewind_to(vtx_offset as usize);
				self.indices.rewind_to(idx_offset as usize);
				log::warn!("{}, draw dropped", CapacityError::CommandArenaFull { capacity: self.options.max_commands });
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::Vec2f;

	#[test]
	fn begin_records_one_explicit_viewport() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(800, 600);
		assert_eq!(ctx.command_count(), 1);
		assert_eq!(ctx.get_command(0), Some(&Command::Viewport(IRect::new(0, 0, 800, 600))));
	}

	#[test]
	fn viewport_shifts_active_scissor_with_it() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(800, 600);
		ctx.scissor(100, 100, 200, 200);
		ctx.viewport(50, 0, 800, 600);
		// the viewport delta (50, 0) is folded into the viewport-relative
		// scissor state so a later re-issued scissor stays pointed at the
		// same screen pixels; the already-recorded `Scissor` command at
		// index 1 is never rewritten (only a new `Viewport` is appended).
		assert_eq!(ctx.scissor, IRect::new(150, 100, 200, 200));
		match ctx.get_command(1) {
			Some(&Command::Scissor(rect)) => assert_eq!(rect, IRect::new(100, 100, 200, 200)),
			other => panic!("expected scissor command, got {:?}", other),
		}
	}

	#[test]
	fn push_pop_transform_restores_state() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(100, 100);
		ctx.push_transform();
		ctx.translate(10.0, 10.0);
		ctx.scale(2.0, 2.0);
		ctx.pop_transform();
		assert_eq!(ctx.transform, Mat2x3::IDENTITY);
	}

	#[test]
	fn reset_state_restores_defaults() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.begin(100, 100);
		ctx.set_color(Color::new(1.0, 0.0, 0.0, 1.0));
		ctx.translate(5.0, 5.0);
		ctx.scissor(1, 1, 2, 2);
		ctx.reset_state();
		assert_eq!(ctx.color, Color::WHITE);
		assert_eq!(ctx.transform, Mat2x3::IDENTITY);
	}

	#[test]
	fn path_round_trips_points() {
		let mut ctx: Context = Context::new(Options::default());
		ctx.path_to(Vec2f::new(1.0, 1.0));
		ctx.path_to_merge_duplicate(Vec2f::new(1.0, 1.0));
		ctx.path_to(Vec2f::new(2.0, 2.0));
		assert_eq!(ctx.path().len(), 2);
		ctx.path_clear();
		assert_eq!(ctx.path().len(), 0);
	}
}
