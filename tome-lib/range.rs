//! Linear ranges over document data.
//!
//! A [`Range`] is an ordered pair of offsets into the linear data. The
//! endpoints keep the direction they were given in: `from` is where the range
//! was opened, `to` where it ends, and `to < from` is a legal backwards
//! range. Consumers that only care about the covered span use the normalized
//! accessors:
//!
//! ```text
//! from=2, to=7: items [2, 7) selected forwards
//! from=7, to=2: items [2, 7) selected backwards
//! from=5, to=5: insertion point, zero length
//! ```
//!
//! `start()`/`end()` return the bounds regardless of direction, while
//! `is_backwards()` tells you which endpoint was the origin. Direction
//! matters to consumers that extend a selection, so it is carried explicitly
//! rather than inferred.

use serde::{
  Deserialize,
  Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
  pub from: usize,
  pub to:   usize,
}

impl Range {
  pub fn new(from: usize, to: usize) -> Self {
    Self { from, to }
  }

  /// A zero-length range: an insertion point.
  #[inline]
  pub fn point(offset: usize) -> Self {
    Self::new(offset, offset)
  }

  /// Start of the range, regardless of direction.
  #[inline]
  #[must_use]
  pub fn start(&self) -> usize {
    std::cmp::min(self.from, self.to)
  }

  /// End of the range, regardless of direction.
  #[inline]
  #[must_use]
  pub fn end(&self) -> usize {
    std::cmp::max(self.from, self.to)
  }

  #[inline]
  #[must_use]
  pub fn len(&self) -> usize {
    self.end() - self.start()
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.from == self.to
  }

  #[inline]
  #[must_use]
  pub fn is_backwards(&self) -> bool {
    self.to < self.from
  }

  /// Swaps the endpoints.
  #[inline]
  #[must_use]
  pub fn flip(&self) -> Self {
    Self::new(self.to, self.from)
  }

  /// Returns the forward-ordered equivalent of this range.
  #[inline]
  #[must_use]
  pub fn normalize(&self) -> Self {
    if self.is_backwards() {
      self.flip()
    } else {
      *self
    }
  }

  /// Smallest range containing both `self` and `other`, keeping the
  /// direction of `self`.
  #[must_use]
  pub fn cover(&self, other: Self) -> Self {
    let start = self.start().min(other.start());
    let end = self.end().max(other.end());
    if self.is_backwards() {
      Self::new(end, start)
    } else {
      Self::new(start, end)
    }
  }

  #[inline]
  pub fn contains(&self, offset: usize) -> bool {
    self.start() <= offset && offset < self.end()
  }

  #[inline]
  pub fn contains_range(&self, other: &Self) -> bool {
    self.start() <= other.start() && self.end() >= other.end()
  }

  pub fn overlaps(&self, other: &Self) -> bool {
    self.start() == other.start() || (self.end() > other.start() && other.end() > self.start())
  }

  /// Intersection of two ranges, forward-ordered. `None` if they do not
  /// share a span (or a common boundary for an empty result).
  pub fn intersect(&self, other: &Self) -> Option<Self> {
    let start = self.start().max(other.start());
    let end = self.end().min(other.end());
    (start <= end).then(|| Self::new(start, end))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn normalize_swaps_backwards_ranges() {
    let range = Range::new(7, 2);
    assert!(range.is_backwards());
    assert_eq!(range.normalize(), Range::new(2, 7));
    assert_eq!(range.start(), 2);
    assert_eq!(range.end(), 7);
    assert_eq!(range.len(), 5);

    let forward = Range::new(2, 7);
    assert_eq!(forward.normalize(), forward);
  }

  #[test]
  fn cover_keeps_direction() {
    let forward = Range::new(2, 4);
    let backwards = Range::new(9, 6);

    let covered = forward.cover(backwards);
    assert_eq!(covered, Range::new(2, 9));

    let covered = backwards.cover(forward);
    assert_eq!(covered, Range::new(9, 2));
    assert!(covered.is_backwards());
  }

  #[test]
  fn containment_and_overlap() {
    let range = Range::new(2, 7);

    assert!(range.contains(2));
    assert!(range.contains(6));
    assert!(!range.contains(7));

    assert!(range.contains_range(&Range::new(3, 5)));
    assert!(!range.contains_range(&Range::new(3, 8)));

    assert!(range.overlaps(&Range::new(6, 10)));
    assert!(!range.overlaps(&Range::new(7, 10)));
    // Empty ranges at the same offset overlap.
    assert!(Range::point(3).overlaps(&Range::point(3)));
  }

  #[test]
  fn intersect_clips() {
    let range = Range::new(2, 7);
    assert_eq!(range.intersect(&Range::new(5, 10)), Some(Range::new(5, 7)));
    assert_eq!(range.intersect(&Range::new(7, 10)), Some(Range::new(7, 7)));
    assert_eq!(range.intersect(&Range::new(8, 10)), None);
  }

  #[test]
  fn point_is_empty() {
    let point = Range::point(5);
    assert!(point.is_empty());
    assert_eq!(point.len(), 0);
  }
}
