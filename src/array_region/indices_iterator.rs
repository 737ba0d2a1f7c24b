use std::iter::FusedIterator;

use itertools::izip;

use super::ArrayRegion;

/// Iterates over element indices in an array region.
pub struct IndicesIterator {
    region: ArrayRegion,
    index: u64,
    num_elements: u64,
}

impl IndicesIterator {
    /// Create a new indices iterator.
    #[must_use]
    pub fn new(region: ArrayRegion) -> Self {
        let num_elements = region.num_elements();
        Self {
            region,
            index: 0,
            num_elements,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.num_elements {
            return None;
        }
        let mut current = self.index;
        let mut indices = vec![0; self.region.dimensionality()];
        for (out, &origin, &span) in izip!(
            indices.iter_mut().rev(),
            self.region.origin.iter().rev(),
            self.region.span.iter().rev(),
        ) {
            *out = current % span + origin;
            current /= span;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.num_elements - self.index).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}
