/*!
Construction-time capacity and feature knobs.
*/

use crate::transform::DEFAULT_TRANSFORM_STACK_DEPTH;

/// Lookback depth for the batch optimizer. `0` disables merging.
pub const DEFAULT_BATCH_OPTIMIZER_DEPTH: usize = 8;

/// Arena capacities and feature defaults for a new [`crate::Context`].
///
/// Mirrors `tgp_default_options` from the reference one for one; see
/// DESIGN.md for why every quantity here is a runtime option rather than
/// a const generic.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
	pub max_vertices: usize,
	pub max_indices: usize,
	pub max_path: usize,
	pub max_commands: usize,
	pub antialiasing: bool,
	pub fringe_scale: f32,
	pub batch_optimizer_depth: usize,
	pub transform_stack_depth: usize,
}

impl Default for Options {
	fn default() -> Options {
		Options {
			max_vertices: 65536,
			max_indices: 65536 * 3,
			max_path: 16384,
			max_commands: 16384,
			antialiasing: true,
			fringe_scale: 1.0,
			batch_optimizer_depth: DEFAULT_BATCH_OPTIMIZER_DEPTH,
			transform_stack_depth: DEFAULT_TRANSFORM_STACK_DEPTH,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_reference_table() {
		let opts = Options::default();
		assert_eq!(opts.max_vertices, 65536);
		assert_eq!(opts.max_indices, 196608);
		assert_eq!(opts.max_path, 16384);
		assert_eq!(opts.max_commands, 16384);
		assert!(opts.antialiasing);
		assert_eq!(opts.fringe_scale, 1.0);
	}
}
