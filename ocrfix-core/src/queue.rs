//! Append-only segment queue with a single movable cursor.
//!
//! The queue only knows mechanics: where the cursor is and whether it has reached the
//! last loaded segment. Deciding *when* to fetch more work belongs to the controller.

use crate::types::Segment;

/// Ordered segments plus a cursor that starts before the first element.
#[derive(Debug, Default)]
pub struct SegmentQueue {
    segments: Vec<Segment>,
    /// `None` is the "before the first element" position.
    cursor: Option<usize>,
}

impl SegmentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `segments` to the back in arrival order. Duplicate ids are accepted.
    pub fn append(&mut self, segments: impl IntoIterator<Item = Segment>) {
        self.segments.extend(segments);
    }

    /// The segment under the cursor, or `None` before the first element.
    pub fn current(&self) -> Option<&Segment> {
        self.cursor.and_then(|i| self.segments.get(i))
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Segment> {
        self.cursor.and_then(|i| self.segments.get_mut(i))
    }

    /// Moves forward one position if another loaded segment exists.
    ///
    /// Returns `false` at the last loaded element; the cursor never passes `len - 1`.
    pub fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i + 1);
        if next < self.segments.len() {
            self.cursor = Some(next);
            true
        } else {
            false
        }
    }

    /// Moves back one position; from the first element this returns to "before first".
    pub fn retreat(&mut self) -> bool {
        match self.cursor {
            Some(0) => {
                self.cursor = None;
                true
            }
            Some(i) => {
                self.cursor = Some(i - 1);
                true
            }
            None => false,
        }
    }

    /// True when no loaded segment lies beyond the cursor.
    pub fn is_near_end(&self) -> bool {
        match self.cursor {
            Some(i) => i + 1 >= self.segments.len(),
            None => self.segments.is_empty(),
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Segment> {
        self.segments.get_mut(index)
    }
}
