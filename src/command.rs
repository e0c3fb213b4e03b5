/*!
The recorded command stream: a tagged sequence read by index, in painter
order, by a GPU backend.
*/

use crate::arena::Arena;
use crate::types::{Color, IRect, Region};

/// One recorded operation.
///
/// `None` is a tombstone: the batch optimizer marks a superseded
/// predecessor dead by overwriting its slot with this variant rather
/// than shifting the command array. A backend must never act on a
/// tombstoned command; [`crate::Context::commands`] skips them.
///
/// `K` is the per-draw userdata key used to decide whether two draws are
/// eligible to merge (see [`crate::batch`]). It defaults to `()`, under
/// which every draw is mergeable with every other.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command<K = ()> {
	None,
	Viewport(IRect),
	Scissor(IRect),
	Clear(Color),
	Draw {
		vtx_offset: u32,
		idx_offset: u32,
		num_vertices: u32,
		num_indices: u32,
		region: Region,
		userdata: K,
	},
}

impl<K> Default for Command<K> {
	#[inline]
	fn default() -> Command<K> {
		Command::None
	}
}

impl<K> Command<K> {
	#[inline]
	pub fn is_tombstone(&self) -> bool {
		matches!(self, Command::None)
	}
}

/// Fixed-capacity command stream with viewport/scissor run-coalescing.
pub struct CommandBuffer<K> {
	arena: Arena<Command<K>>,
}

impl<K: Copy + Default> CommandBuffer<K> {
	pub fn new(capacity: usize) -> CommandBuffer<K> {
		CommandBuffer { arena: Arena::new(capacity) }
	}

	#[inline]
	pub fn clear(&mut self) {
		self.arena.clear();
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.arena.len()
	}

	#[inline]
	pub fn get(&self, index: usize) -> Option<&Command<K>> {
		if index < self.arena.len() { Some(self.arena.get(index)) } else { None }
	}

	#[inline]
	pub fn commands(&self) -> impl Iterator<Item = &Command<K>> {
		self.arena.as_slice().iter().filter(|c| !c.is_tombstone())
	}

	#[inline]
	pub fn as_slice(&self) -> &[Command<K>] {
		self.arena.as_slice()
	}

	#[inline]
	pub fn as_mut_slice(&mut self) -> &mut [Command<K>] {
		self.arena.as_mut_slice()
	}

	#[inline]
	fn last_mut(&mut self) -> Option<&mut Command<K>> {
		let len = self.arena.len();
		if len == 0 { None } else { Some(self.arena.get_mut(len - 1)) }
	}

	/// Appends a command if there's room. Returns its index on success.
	#[inline]
	pub fn push(&mut self, cmd: Command<K>) -> Option<usize> {
		let at = self.arena.reserve(1)?;
		*self.arena.get_mut(at) = cmd;
		Some(at)
	}

	/// Records a viewport change, coalescing with an immediately
	/// preceding `Viewport` command. Idempotency against the current
	/// viewport state is the caller's responsibility (it owns that
	/// state, the command stream doesn't).
	///
	/// Returns `None` only when the command arena is full and no in-place
	/// coalesce was possible. Otherwise returns whether a brand new
	/// command was appended (`true`) or an existing one was overwritten in
	/// place (`false`) — callers that track a per-command-local vertex
	/// cursor need to know which happened, since only a freshly appended
	/// command resets it.
	pub fn record_viewport(&mut self, rect: IRect) -> Option<bool> {
		if let Some(Command::Viewport(slot)) = self.last_mut() {
			*slot = rect;
			return Some(false);
		}
		self.push(Command::Viewport(rect)).map(|_| true)
	}

	/// Records a scissor change, coalescing with an immediately
	/// preceding `Scissor` command. See [`CommandBuffer::record_viewport`].
	pub fn record_scissor(&mut self, rect: IRect) -> Option<bool> {
		if let Some(Command::Scissor(slot)) = self.last_mut() {
			*slot = rect;
			return Some(false);
		}
		self.push(Command::Scissor(rect)).map(|_| true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn consecutive_viewports_coalesce_into_one_command() {
		let mut cmds: CommandBuffer<()> = CommandBuffer::new(8);
		assert_eq!(cmds.record_viewport(IRect::new(0, 0, 800, 600)), Some(true));
		assert_eq!(cmds.record_viewport(IRect::new(0, 0, 1024, 768)), Some(false));
		assert_eq!(cmds.record_viewport(IRect::new(0, 0, 1280, 720)), Some(false));
		assert_eq!(cmds.len(), 1);
		assert_eq!(cmds.get(0), Some(&Command::Viewport(IRect::new(0, 0, 1280, 720))));
	}

	#[test]
	fn viewport_then_scissor_both_survive() {
		let mut cmds: CommandBuffer<()> = CommandBuffer::new(8);
		cmds.record_viewport(IRect::new(0, 0, 800, 600));
		cmds.record_scissor(IRect::new(10, 10, 50, 50));
		assert_eq!(cmds.len(), 2);
	}

	#[test]
	fn tombstones_are_skipped_by_commands_iterator() {
		let mut cmds: CommandBuffer<()> = CommandBuffer::new(8);
		cmds.push(Command::Viewport(IRect::new(0, 0, 800, 600)));
		cmds.push(Command::Clear(Color::WHITE));
		*cmds.as_mut_slice().last_mut().unwrap() = Command::None;
		assert_eq!(cmds.commands().count(), 1);
	}
}
