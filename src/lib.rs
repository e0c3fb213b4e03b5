/*!
Immediate-mode 2D vector painter with a batching command recorder.

Applications call a sequence of state and drawing operations per frame;
[`Context`] accumulates transformed vertices, triangle indices, and
viewport/scissor/clear commands into fixed-capacity arenas. A thin backend
walks [`Context::commands`] in painter order and translates them into GPU
draw calls — this crate has no GPU backend, windowing, or texture
management of its own; it only records what one would consume.

The centerpiece is the [`batch`] optimizer: it opportunistically merges
adjacent draws with compatible state across an intervening command window,
so that two calls to [`Context::draw_convex_polygon`] back to back can end
up as a single GPU draw call instead of two.

```
use vecpaint::{Context, Options, Vec2f};

let mut ctx: Context = Context::new(Options::default());
ctx.begin(800, 600);
ctx.set_color(vecpaint::Color::new(1.0, 0.0, 0.0, 1.0));
ctx.draw_convex_polygon(&[
	Vec2f::new(10.0, 10.0),
	Vec2f::new(100.0, 10.0),
	Vec2f::new(100.0, 100.0),
	Vec2f::new(10.0, 100.0),
]);
for cmd in ctx.commands() {
	// hand `cmd` to a real backend
	let _ = cmd;
}
```
*/

mod arena;
mod batch;
mod command;
mod config;
mod context;
mod error;
mod geometry;
mod path;
mod transform;
mod types;
mod vertex;

#[cfg(test)]
mod testutil;

pub use self::command::{Command, CommandBuffer};
pub use self::config::{Options, DEFAULT_BATCH_OPTIMIZER_DEPTH};
pub use self::context::Context;
pub use self::error::CapacityError;
pub use self::path::PathBuffer;
pub use self::transform::{Mat2x3, TransformStack, DEFAULT_TRANSFORM_STACK_DEPTH};
pub use self::types::{Color, IRect, Index, Region, Vec2f};
pub use self::vertex::{Vertex, VertexAttribute, VertexLayout, VERTEX_LAYOUT};
