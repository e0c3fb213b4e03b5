/*!
Fixed-capacity bump-allocated buffers.

The recorder never grows a buffer mid-frame: every arena is sized once
at construction time from [`crate::Options`] and every operation either
succeeds and advances the cursor, or leaves the arena untouched. This is
a deliberate departure from the `Vec`-backed `DrawBuilder` buffers common
elsewhere in this ecosystem, which grow on demand — this library's
contract is "fail silently, continue" rather than "reallocate".
*/

/// A flat, fixed-capacity buffer with a bump-allocating cursor.
///
/// Used for the vertex, index, and path buffers. Reservation is
/// all-or-nothing: [`Arena::reserve`] either returns the start offset of
/// `count` freshly available slots and advances the cursor, or returns
/// `None` and leaves the arena exactly as it was.
pub struct Arena<T> {
	buf: Box<[T]>,
	len: usize,
}

impl<T: Copy + Default> Arena<T> {
	pub fn new(capacity: usize) -> Arena<T> {
		Arena { buf: vec![T::default(); capacity].into_boxed_slice(), len: 0 }
	}
}

impl<T> Arena<T> {
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	#[inline]
	pub fn capacity(&self) -> usize {
		self.buf.len()
	}

	#[inline]
	pub fn as_slice(&self) -> &[T] {
		&self.buf[..self.len]
	}

	#[inline]
	pub fn as_mut_slice(&mut self) -> &mut [T] {
		&mut self.buf[..self.len]
	}

	/// Reserves `count` contiguous slots at the end of the live range.
	///
	/// Returns the start offset on success. On failure the arena is
	/// unchanged — no partial mutation.
	#[inline]
	pub fn reserve(&mut self, count: usize) -> Option<usize> {
		let start = self.len;
		let end = start.checked_add(count)?;
		if end > self.buf.len() {
			return None;
		}
		self.len = end;
		Some(start)
	}

	/// Rewinds the cursor to `len`, discarding everything written past it.
	///
	/// `len` must not exceed the current length; this is the only way an
	/// already-reserved allocation is released before commit.
	#[inline]
	pub fn rewind_to(&mut self, len: usize) {
		debug_assert!(len <= self.len, "rewind_to must not grow the arena");
		self.len = len;
	}

	/// Clears the arena entirely (called at `begin`).
	#[inline]
	pub fn clear(&mut self) {
		self.len = 0;
	}

	#[inline]
	pub fn get(&self, index: usize) -> &T {
		&self.buf[index]
	}

	#[inline]
	pub fn get_mut(&mut self, index: usize) -> &mut T {
		&mut self.buf[index]
	}

	/// Directly sets the cursor. Used by the batch optimizer's
	/// merge-into-next path, which genuinely adds live elements (the
	/// previous draw's vertices/indices now appear at a later offset)
	/// without going through [`Arena::reserve`]'s double-write.
	#[inline]
	pub fn set_len(&mut self, len: usize) {
		debug_assert!(len <= self.buf.len());
		self.len = len;
	}
}

impl<T: Copy> Arena<T> {
	/// Writes `values` starting at `offset`, bounded only by capacity —
	/// not by the live cursor. The batch optimizer relocates data into
	/// slots beyond the current cursor as scratch space before the
	/// cursor catches up (or, in the merge-into-previous case, never
	/// does: the relocated range stays dead space until the next frame).
	#[inline]
	pub fn write(&mut self, offset: usize, values: &[T]) {
		self.buf[offset..offset + values.len()].copy_from_slice(values);
	}

	/// Moves `count` elements from `src` to `dest`, like `memmove`:
	/// overlapping source and destination ranges are handled correctly.
	/// Bounded only by capacity, not the live cursor — see [`Arena::write`].
	#[inline]
	pub fn copy_range(&mut self, src: usize, dest: usize, count: usize) {
		if count == 0 {
			return;
		}
		self.buf.copy_within(src..src + count, dest);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reserve_then_overflow_leaves_arena_untouched() {
		let mut a: Arena<u32> = Arena::new(4);
		assert_eq!(a.reserve(3), Some(0));
		assert_eq!(a.len(), 3);
		assert_eq!(a.reserve(2), None, "would exceed capacity");
		assert_eq!(a.len(), 3, "failed reserve must not mutate cursor");
	}

	#[test]
	fn rewind_releases_reservation() {
		let mut a: Arena<u32> = Arena::new(4);
		let before = a.len();
		a.reserve(4).unwrap();
		a.rewind_to(before);
		assert_eq!(a.len(), before);
		assert_eq!(a.reserve(4), Some(0), "capacity should be fully available again");
	}

	#[test]
	fn copy_range_handles_overlap_like_memmove() {
		let mut a: Arena<u32> = Arena::new(8);
		a.reserve(4).unwrap();
		a.write(0, &[10, 20, 30, 40]);
		a.copy_range(0, 2, 4);
		assert_eq!(&a.as_slice()[2..], &[10, 20]);
		assert_eq!(a.get(4), &30);
		assert_eq!(a.get(5), &40);
	}

	#[test]
	fn set_len_extends_cursor_directly() {
		let mut a: Arena<u32> = Arena::new(4);
		a.reserve(2).unwrap();
		a.set_len(4);
		assert_eq!(a.len(), 4);
	}
}
