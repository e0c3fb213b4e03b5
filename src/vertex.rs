/*!
The single vertex format the recorder emits: position, texcoord, color.
*/

use crate::types::{Color, Vec2f};

/// A recorded vertex, 32 bytes at single precision: `position`,
/// `texcoord`, `color`.
///
/// Positions are stored in clip space, after MVP application — the
/// backend uploads them unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq, dataview::Pod)]
#[repr(C)]
pub struct Vertex {
	pub position: Vec2f,
	pub texcoord: Vec2f,
	pub color: Color,
}

impl Vertex {
	#[inline]
	pub const fn new(position: Vec2f, texcoord: Vec2f, color: Color) -> Vertex {
		Vertex { position, texcoord, color }
	}
}

/// Describes the memory layout of [`Vertex`] for a backend that needs to
/// bind it to a shader's vertex attributes.
///
/// Mirrors the `VertexLayout`/`VertexAttribute` pair other vertex types in
/// this ecosystem use (`d2::ColorVertex`'s `TVertex` impl) without depending
/// on the shader-binding machinery that layout type ships alongside, since
/// this crate has no shader/backend concept of its own.
#[derive(Copy, Clone, Debug)]
pub struct VertexAttribute {
	pub name: &'static str,
	pub components: u8,
	pub offset: u16,
}

#[derive(Copy, Clone, Debug)]
pub struct VertexLayout {
	pub size: u16,
	pub attributes: &'static [VertexAttribute],
}

pub static VERTEX_LAYOUT: VertexLayout = VertexLayout {
	size: core::mem::size_of::<Vertex>() as u16,
	attributes: &[
		VertexAttribute { name: "position", components: 2, offset: dataview::offset_of!(Vertex.position) as u16 },
		VertexAttribute { name: "texcoord", components: 2, offset: dataview::offset_of!(Vertex.texcoord) as u16 },
		VertexAttribute { name: "color", components: 4, offset: dataview::offset_of!(Vertex.color) as u16 },
	],
};

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn layout_matches_32_byte_vertex() {
		assert_eq!(VERTEX_LAYOUT.size, 32);
		assert_eq!(VERTEX_LAYOUT.attributes[0].offset, 0);
		assert_eq!(VERTEX_LAYOUT.attributes[1].offset, 8);
		assert_eq!(VERTEX_LAYOUT.attributes[2].offset, 16);
	}
}
