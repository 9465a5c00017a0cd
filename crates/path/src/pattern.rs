//! Dash patterns.
//!
//! A pattern is a sequence of lengths alternating between dashes and gaps,
//! starting with a dash. It repeats along the contour as many times as needed.
//! When the pattern has an odd number of entries, each repetition swaps the
//! roles of dashes and gaps, so that the sequence keeps alternating.

use crate::EPSILON;

/// Walks the runs of a dash pattern.
#[derive(Clone, Debug)]
pub struct PatternIterator<'l> {
    pattern: &'l [f32],
    pattern_length: f32,
    offset: f32,
    current: usize,
    solid: bool,
    segment_length: f32,
}

impl<'l> PatternIterator<'l> {
    /// Starts walking `pattern` shifted by `offset`.
    ///
    /// An empty pattern, or one that sums to zero, is a single infinite dash.
    pub fn new(pattern: &'l [f32], offset: f32) -> Self {
        let pattern_length: f32 = pattern.iter().map(|len| len.max(0.0)).sum();
        let mut it = PatternIterator {
            pattern,
            pattern_length,
            offset,
            current: 0,
            solid: true,
            segment_length: f32::MAX,
        };

        if it.is_infinite() {
            return it;
        }

        if offset == 0.0 {
            it.segment_length = it.entry(0);
        } else {
            let (solid, index, remaining) = it.run_at(0.0);
            it.solid = solid;
            it.current = index;
            it.segment_length = remaining;
        }

        it
    }

    fn is_infinite(&self) -> bool {
        self.pattern.is_empty() || self.pattern_length < EPSILON
    }

    // Negative lengths count as empty runs.
    #[inline]
    fn entry(&self, index: usize) -> f32 {
        self.pattern[index % self.pattern.len()].max(0.0)
    }

    /// Moves to the next run of the pattern.
    pub fn advance(&mut self) {
        if self.is_infinite() {
            return;
        }

        self.current = (self.current + 1) % self.pattern.len();
        self.solid = !self.solid;
        self.segment_length = self.entry(self.current);
    }

    /// Whether the current run is a dash.
    #[inline]
    pub fn is_solid(&self) -> bool {
        self.solid
    }

    /// Length of the current run.
    #[inline]
    pub fn segment_length(&self) -> f32 {
        self.segment_length
    }

    /// Whether the pattern is covered by a dash at `distance` units from the
    /// start of the contour.
    pub fn is_solid_at(&self, distance: f32) -> bool {
        self.run_at(distance).0
    }

    /// The run found at `distance` units from the start of the contour.
    ///
    /// Returns whether it is a dash, the index of its pattern entry and the
    /// distance left until the run ends.
    pub fn run_at(&self, distance: f32) -> (bool, usize, f32) {
        if self.is_infinite() {
            return (true, 0, f32::MAX);
        }

        let n = self.pattern.len();
        // Odd patterns need two repetitions to get back to a dash.
        let period = if n % 2 == 0 {
            self.pattern_length
        } else {
            self.pattern_length * 2.0
        };

        let d = distance + self.offset;
        let mut pos = d % period;
        if pos < 0.0 {
            pos += period;
        }

        let mut solid = true;
        let mut k = 0;
        while pos > self.entry(k) && k + 1 < 2 * n {
            pos -= self.entry(k);
            solid = !solid;
            k += 1;
        }

        (solid, k % n, self.entry(k) - pos)
    }
}

#[test]
fn no_pattern() {
    let mut it = PatternIterator::new(&[], 3.0);
    assert!(it.is_solid());
    assert_eq!(it.segment_length(), f32::MAX);
    it.advance();
    assert!(it.is_solid());
    assert!(it.is_solid_at(1000.0));

    let it = PatternIterator::new(&[0.0, 0.0], 0.0);
    assert!(it.is_solid());
    assert_eq!(it.segment_length(), f32::MAX);
}

#[test]
fn simple_dashes() {
    let pattern = [4.0, 2.0];
    let mut it = PatternIterator::new(&pattern, 0.0);
    assert!(it.is_solid());
    assert_eq!(it.segment_length(), 4.0);
    it.advance();
    assert!(!it.is_solid());
    assert_eq!(it.segment_length(), 2.0);
    it.advance();
    assert!(it.is_solid());
    assert_eq!(it.segment_length(), 4.0);

    assert!(it.is_solid_at(1.0));
    assert!(!it.is_solid_at(5.0));
    assert!(it.is_solid_at(7.0));
    assert!(!it.is_solid_at(-1.0));
    assert!(it.is_solid_at(-3.0));
}

#[test]
fn offset_pattern() {
    let pattern = [4.0, 2.0];
    let mut it = PatternIterator::new(&pattern, 5.0);
    assert!(!it.is_solid());
    assert!((it.segment_length() - 1.0).abs() < 1e-6);
    it.advance();
    assert!(it.is_solid());
    assert_eq!(it.segment_length(), 4.0);

    let it = PatternIterator::new(&pattern, -1.0);
    assert!(!it.is_solid());
    assert!((it.segment_length() - 1.0).abs() < 1e-6);
}

#[test]
fn odd_pattern_alternates() {
    let pattern = [3.0];
    let it = PatternIterator::new(&pattern, 0.0);
    assert!(it.is_solid_at(1.0));
    assert!(!it.is_solid_at(4.0));
    assert!(it.is_solid_at(7.0));

    // Offsets agree with the unshifted pattern.
    let shifted = PatternIterator::new(&pattern, 1.0);
    assert!(shifted.is_solid());
    assert!((shifted.segment_length() - 2.0).abs() < 1e-6);
    assert_eq!(shifted.is_solid_at(2.5), it.is_solid_at(3.5));

    let odd = [1.0, 2.0, 3.0];
    let it = PatternIterator::new(&odd, 0.0);
    // Second repetition starts with a gap.
    assert!(!it.is_solid_at(6.5));
    assert!(it.is_solid_at(7.5));
}

#[test]
fn dash_coverage_does_not_depend_on_offset() {
    let pattern = [2.0, 1.0, 0.5, 1.5];
    let on_length: f32 = 2.5;

    for offset in &[0.0f32, 0.3, 1.7, 4.9, -2.2] {
        let mut it = PatternIterator::new(&pattern, *offset);
        let mut walked = 0.0;
        let mut solid = 0.0;
        while walked < 5.0 - 1e-4 {
            let len = it.segment_length().min(5.0 - walked);
            if it.is_solid() {
                solid += len;
            }
            walked += len;
            it.advance();
        }
        assert!((solid - on_length).abs() < 1e-4);
    }
}
