/*!
The batch optimizer: opportunistically fuses a freshly-recorded draw into
a recent compatible one, reordering vertices and indices in place across
whatever non-matching commands sit between them.

This is the part of the recorder that makes it worth using over a bare
vertex buffer: without it, every primitive is its own draw call.
*/

use crate::arena::Arena;
use crate::command::{Command, CommandBuffer};
use crate::types::Region;
use crate::vertex::Vertex;

/// Reusable scratch space for the backward search, so a typical frame
/// records zero heap allocations. Only grows past its initial capacity
/// in the rare case where many tombstoned commands sit between two live
/// draws (each tombstone extends the search without counting against
/// the configured depth) — see [`crate::Context`]'s construction.
pub(crate) struct MergeScratch {
	intervening: Vec<usize>,
}

impl MergeScratch {
	pub fn new(depth: usize) -> MergeScratch {
		MergeScratch { intervening: Vec::with_capacity(depth) }
	}
}

/// What [`try_merge`] did, so the caller knows whether a fresh command
/// slot was appended.
///
/// A merge into previous extends an existing live `Draw` in place and
/// appends nothing; a merge into next tombstones `prev` and appends a new
/// trailing command, which resets the per-command-local vertex/index
/// cursor the same way a plain (non-merging) append would.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MergeOutcome {
	NotMerged,
	MergedIntoPrevious,
	MergedIntoNext,
}

/// The not-yet-recorded draw the caller wants to fuse into the stream.
pub(crate) struct PendingDraw<K> {
	pub region: Region,
	pub vtx_offset: u32,
	pub idx_offset: u32,
	pub num_vertices: u32,
	pub num_indices: u32,
	pub userdata: K,
}

/// Attempts to merge `pending` into a recent draw command. On anything but
/// [`MergeOutcome::NotMerged`] the caller must not additionally append a
/// new command for `pending`.
///
/// `depth` is the lookback budget (`0` disables merging entirely).
/// `vertices`/`indices` are relocated in place; `commands`' intervening
/// entries have their offsets rewritten, and on a merge-into-next the
/// fused-from command is tombstoned.
pub(crate) fn try_merge<K: PartialEq + Copy + Default>(
	commands: &mut CommandBuffer<K>,
	vertices: &mut Arena<Vertex>,
	indices: &mut Arena<crate::types::Index>,
	scratch: &mut MergeScratch,
	depth: usize,
	max_vertices: usize,
	max_indices: usize,
	pending: &PendingDraw<K>,
) -> MergeOutcome {
	if depth == 0 {
		return MergeOutcome::NotMerged;
	}

	scratch.intervening.clear();
	let total = commands.len();

	let mut prev_idx = None;
	let mut lookup_depth = depth;
	let mut walked = 0usize;
	while walked < lookup_depth {
		let idx = match total.checked_sub(1 + walked) {
			Some(idx) => idx,
			None => break,
		};
		walked += 1;
		match commands.as_slice()[idx] {
			Command::None => {
				// tombstones are transparent: they don't count against the depth
				lookup_depth += 1;
			}
			Command::Draw { userdata, .. } if userdata == pending.userdata => {
				prev_idx = Some(idx);
				break;
			}
			Command::Draw { .. } => {
				scratch.intervening.push(idx);
			}
			_ => break, // non-draw, non-tombstone command halts the search
		}
	}

	let prev_idx = match prev_idx {
		Some(idx) => idx,
		None => return MergeOutcome::NotMerged,
	};

	let prev_region = match commands.as_slice()[prev_idx] {
		Command::Draw { region, .. } => region,
		_ => unreachable!(),
	};

	let mut overlaps_next = false;
	let mut overlaps_prev = false;
	for &i in &scratch.intervening {
		let inter_region = match commands.as_slice()[i] {
			Command::Draw { region, .. } => region,
			_ => unreachable!(),
		};
		if pending.region.overlaps(inter_region) {
			overlaps_next = true;
			if overlaps_prev {
				return MergeOutcome::NotMerged;
			}
		}
		if prev_region.overlaps(inter_region) {
			overlaps_prev = true;
			if overlaps_next {
				return MergeOutcome::NotMerged;
			}
		}
	}

	if !overlaps_next {
		if merge_into_previous(commands, vertices, indices, scratch, max_vertices, max_indices, prev_idx, prev_region, pending) {
			MergeOutcome::MergedIntoPrevious
		} else {
			MergeOutcome::NotMerged
		}
	} else {
		debug_assert!(!scratch.intervening.is_empty());
		if merge_into_next(commands, vertices, indices, max_vertices, max_indices, prev_idx, prev_region, pending) {
			MergeOutcome::MergedIntoNext
		} else {
			MergeOutcome::NotMerged
		}
	}
}

/// The new draw commutes past every intervening command: fold it into
/// `prev` by relocating its vertices/indices to sit right after `prev`'s.
fn merge_into_previous<K: Copy>(
	commands: &mut CommandBuffer<K>,
	vertices: &mut Arena<Vertex>,
	indices: &mut Arena<crate::types::Index>,
	scratch: &MergeScratch,
	max_vertices: usize,
	max_indices: usize,
	prev_idx: usize,
	prev_region: Region,
	pending: &PendingDraw<K>,
) -> bool {
	let (prev_vtx_offset, prev_num_vertices, prev_idx_offset, prev_num_indices) = match commands.as_slice()[prev_idx] {
		Command::Draw { vtx_offset, num_vertices, idx_offset, num_indices, .. } => (vtx_offset, num_vertices, idx_offset, num_indices),
		_ => unreachable!(),
	};

	if !scratch.intervening.is_empty() {
		if vertices.len() + pending.num_vertices as usize > max_vertices || indices.len() + pending.num_indices as usize > max_indices {
			return false;
		}

		relocate_into_gap(vertices, prev_vtx_offset + prev_num_vertices, pending.vtx_offset, pending.num_vertices);
		relocate_into_gap(indices, prev_idx_offset + prev_num_indices, pending.idx_offset, pending.num_indices);

		for &i in &scratch.intervening {
			if let Command::Draw { vtx_offset, idx_offset, .. } = &mut commands.as_mut_slice()[i] {
				*vtx_offset += pending.num_vertices;
				*idx_offset += pending.num_indices;
			}
		}
	}

	// `pending`'s indices were written relative to its own vtx_offset
	// (0-based, command-local); folded into `prev` they now address vertices
	// that sit at `prev_num_vertices..prev_num_vertices+pending.num_vertices`
	// within the unified command's (unchanged) vtx_offset, so every relocated
	// index needs rebiasing by `prev_num_vertices`.
	rebias_indices(indices, prev_idx_offset + prev_num_indices, pending.num_indices, prev_num_vertices);

	let merged_region = prev_region.union(pending.region);
	if let Command::Draw { num_vertices, num_indices, region, .. } = &mut commands.as_mut_slice()[prev_idx] {
		*num_vertices += pending.num_vertices;
		*num_indices += pending.num_indices;
		*region = merged_region;
	}
	true
}

/// Shifts `[gap_end, arena.len())` forward by `count` to open a hole at
/// `gap_end`, then copies the `count` elements that used to live at
/// `moved_from` (now relocated by the shift) into that hole.
///
/// Mirrors `tgp_merge_command`'s vertex/index rearrangement, with the
/// index-arena call sites actually reading from the index arena (the
/// reference reads from the vertex arena there by mistake).
fn relocate_into_gap<T: Copy>(arena: &mut Arena<T>, gap_end: u32, moved_from: u32, count: u32) {
	let gap_end = gap_end as usize;
	let count = count as usize;
	let moved_from = moved_from as usize;
	let move_count = arena.len() - gap_end;
	arena.copy_range(gap_end, gap_end + count, move_count);
	// `moved_from`'s contents shifted forward by `count` along with everything else.
	arena.copy_range(moved_from + count, gap_end, count);
}

/// Adds `bias` to each of the `count` index values starting at `start`.
///
/// A merged-in index run is still written relative to its own draw's
/// original `vtx_offset`; once that draw's vertices move to sit after
/// another draw's within one unified command, every index needs shifting
/// by the vertex count it now sits behind, or it addresses the wrong
/// draw's vertices.
fn rebias_indices(indices: &mut Arena<crate::types::Index>, start: u32, count: u32, bias: u32) {
	let bias = bias as crate::types::Index;
	for idx in &mut indices.as_mut_slice()[start as usize..(start + count) as usize] {
		*idx += bias;
	}
}

/// `prev` commutes forward past every intervening command and fuses with
/// the new draw: append a trailing command describing the pair, and
/// tombstone `prev`.
fn merge_into_next<K: Copy>(
	commands: &mut CommandBuffer<K>,
	vertices: &mut Arena<Vertex>,
	indices: &mut Arena<crate::types::Index>,
	max_vertices: usize,
	max_indices: usize,
	prev_idx: usize,
	prev_region: Region,
	pending: &PendingDraw<K>,
) -> bool {
	let (prev_vtx_offset, prev_num_vertices, prev_idx_offset, prev_num_indices) = match commands.as_slice()[prev_idx] {
		Command::Draw { vtx_offset, num_vertices, idx_offset, num_indices, .. } => (vtx_offset, num_vertices, idx_offset, num_indices),
		_ => unreachable!(),
	};

	if vertices.len() + prev_num_vertices as usize > max_vertices || indices.len() + prev_num_indices as usize > max_indices {
		return false;
	}

	// make room for prev's vertices at the front of the new draw's range, then copy them in
	vertices.copy_range(pending.vtx_offset as usize, pending.vtx_offset as usize + prev_num_vertices as usize, pending.num_vertices as usize);
	vertices.copy_range(prev_vtx_offset as usize, pending.vtx_offset as usize, prev_num_vertices as usize);

	indices.copy_range(pending.idx_offset as usize, pending.idx_offset as usize + prev_num_indices as usize, pending.num_indices as usize);
	indices.copy_range(prev_idx_offset as usize, pending.idx_offset as usize, prev_num_indices as usize);

	vertices.set_len(vertices.len() + prev_num_vertices as usize);
	indices.set_len(indices.len() + prev_num_indices as usize);

	// `pending`'s own indices (now sitting right after prev's) were written
	// relative to `pending.vtx_offset` (0-based); prev's vertices now occupy
	// the front of the merged range, so they need rebiasing by `prev_num_vertices`
	// to keep addressing the unified command's (unchanged) `vtx_offset`.
	rebias_indices(indices, pending.idx_offset + prev_num_indices, pending.num_indices, prev_num_vertices);

	let merged = Command::Draw {
		vtx_offset: pending.vtx_offset,
		idx_offset: pending.idx_offset,
		num_vertices: pending.num_vertices + prev_num_vertices,
		num_indices: pending.num_indices + prev_num_indices,
		region: prev_region.union(pending.region),
		userdata: pending.userdata,
	};
	if commands.push(merged).is_none() {
		return false;
	}

	commands.as_mut_slice()[prev_idx] = Command::None;
	true
}
