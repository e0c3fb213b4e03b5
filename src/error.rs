/*!
Diagnostic-only error taxonomy.

Capacity exhaustion is never surfaced to the caller as a `Result` — arena
exhaustion is a silent no-op so the frame stays consistent — but it is
useful to name the condition for logging, and a future version of this
crate may promote it to a first-class return value without inventing a
new taxonomy at that point.
*/

use thiserror::Error;

/// Why a recording operation ran out of room.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
	#[error("vertex arena exhausted (capacity {capacity})")]
	VertexArenaFull { capacity: usize },
	#[error("index arena exhausted (capacity {capacity})")]
	IndexArenaFull { capacity: usize },
	#[error("command arena exhausted (capacity {capacity})")]
	CommandArenaFull { capacity: usize },
}
