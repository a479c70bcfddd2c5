//! Append-only, chunked storage with stable element addresses and an
//! O(1) mark/reset.
//!
//! Grounded on `original_source/List_array.hpp` (`containers::List_array`):
//! a list of fixed-size arrays, never reallocated once opened, with a
//! cursor (current array, offset) that can be bookmarked and rewound.
//! Unlike the original, element addresses here are plain `usize` indices
//! rather than raw pointers — see `DESIGN.md` for why.
//!
//! A reservation that does not fit in the remainder of the current chunk
//! opens a fresh chunk; the unused tail of the old one is abandoned, not
//! reused (spec §4.1).

/// Default chunk size. Must exceed the largest single reservation (nodes
/// here have at most 2 children), and is sized so a full Monte Carlo path
/// (on the order of a few hundred ops) never needs more than a handful of
/// chunks.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 16;

pub struct ChunkedArena<T> {
    chunk_size: usize,
    chunks: Vec<Vec<T>>,
    chunk_idx: usize,
    offset: usize,
    mark: Option<(usize, usize)>,
}

impl<T: Clone> ChunkedArena<T> {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        assert!(chunk_size >= 2, "chunk size must hold at least 2 elements");
        Self {
            chunk_size,
            chunks: vec![Vec::with_capacity(chunk_size)],
            chunk_idx: 0,
            offset: 0,
            mark: None,
        }
    }

    fn open_new_chunk(&mut self) {
        self.chunk_idx += 1;
        self.offset = 0;
        if self.chunk_idx == self.chunks.len() {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
        } else {
            self.chunks[self.chunk_idx].clear();
        }
    }

    fn write_at_offset(&mut self, value: T) {
        let chunk = &mut self.chunks[self.chunk_idx];
        if self.offset == chunk.len() {
            chunk.push(value);
        } else {
            chunk[self.offset] = value;
        }
        self.offset += 1;
    }

    /// Place `value` at the cursor and advance by one; returns its stable
    /// index.
    pub fn emplace(&mut self, value: T) -> usize {
        if self.offset == self.chunk_size {
            self.open_new_chunk();
        }
        let idx = self.chunk_idx * self.chunk_size + self.offset;
        self.write_at_offset(value);
        idx
    }

    /// Reserve `n` contiguous slots, filled with `fill`, and return the
    /// stable index of the first one.
    pub fn reserve(&mut self, n: usize, fill: T) -> usize {
        assert!(
            n <= self.chunk_size,
            "reservation of {n} exceeds chunk size {}",
            self.chunk_size
        );
        if self.offset + n > self.chunk_size {
            self.open_new_chunk();
        }
        let start = self.chunk_idx * self.chunk_size + self.offset;
        for _ in 0..n {
            self.write_at_offset(fill.clone());
        }
        start
    }

    #[inline]
    fn locate(&self, idx: usize) -> (usize, usize) {
        (idx / self.chunk_size, idx % self.chunk_size)
    }

    pub fn get(&self, idx: usize) -> &T {
        let (c, o) = self.locate(idx);
        &self.chunks[c][o]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut T {
        let (c, o) = self.locate(idx);
        &mut self.chunks[c][o]
    }

    /// Number of elements recorded so far (the cursor's logical position).
    pub fn len(&self) -> usize {
        self.chunk_idx * self.chunk_size + self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_mark(&mut self) {
        self.mark = Some((self.chunk_idx, self.offset));
    }

    pub fn has_mark(&self) -> bool {
        self.mark.is_some()
    }

    pub fn mark_index(&self) -> usize {
        let (c, o) = self
            .mark
            .expect("ChunkedArena::mark_index called with no mark set");
        c * self.chunk_size + o
    }

    /// Rewind the cursor to the last mark. Does not free any chunk;
    /// subsequent writes overwrite previous contents at and after the
    /// mark.
    pub fn reset_to_mark(&mut self) {
        let (c, o) = self
            .mark
            .expect("ChunkedArena::reset_to_mark called with no mark set");
        self.chunk_idx = c;
        self.offset = o;
    }

    /// Rewind to the very start and invalidate the mark.
    pub fn clear(&mut self) {
        self.chunk_idx = 0;
        self.offset = 0;
        self.mark = None;
        for chunk in &mut self.chunks {
            chunk.clear();
        }
    }
}

impl<T: Clone> Default for ChunkedArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emplace_returns_increasing_stable_indices() {
        let mut a = ChunkedArena::with_chunk_size(4);
        let i0 = a.emplace(10);
        let i1 = a.emplace(20);
        assert_eq!(i1, i0 + 1);
        assert_eq!(*a.get(i0), 10);
        assert_eq!(*a.get(i1), 20);
    }

    #[test]
    fn reservation_spanning_chunk_boundary_abandons_remainder() {
        let mut a: ChunkedArena<i32> = ChunkedArena::with_chunk_size(4);
        a.emplace(1);
        a.emplace(2);
        a.emplace(3);
        // only one slot left in this chunk; reserving 2 must open a new one
        let start = a.reserve(2, 0);
        assert_eq!(start, 4);
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn mark_and_reset_round_trips_cursor() {
        let mut a: ChunkedArena<i32> = ChunkedArena::with_chunk_size(4);
        a.emplace(1);
        a.emplace(2);
        let len_before = a.len();
        a.set_mark();
        a.emplace(3);
        a.emplace(4);
        a.emplace(5);
        assert_eq!(a.len(), len_before + 3);
        a.reset_to_mark();
        assert_eq!(a.len(), len_before);
        // overwritten, not appended
        let idx = a.emplace(99);
        assert_eq!(*a.get(idx), 99);
        assert_eq!(a.len(), len_before + 1);
    }

    #[test]
    #[should_panic]
    fn reset_without_mark_panics() {
        let mut a: ChunkedArena<i32> = ChunkedArena::with_chunk_size(4);
        a.emplace(1);
        a.reset_to_mark();
    }

    #[test]
    fn clear_empties_the_arena() {
        let mut a: ChunkedArena<i32> = ChunkedArena::with_chunk_size(4);
        a.emplace(1);
        a.reserve(3, 0);
        a.clear();
        assert_eq!(a.len(), 0);
        assert!(!a.has_mark());
    }
}
