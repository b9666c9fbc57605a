//! Precomputed sparse regridding weights.

use crate::error::{RegridError, Result};

/// A sparse linear operator mapping a field on the source cell centers to a
/// field on the destination cell centers.
///
/// Each destination cell holds a short list of `(source_index, weight)`
/// pairs. An empty list marks an unmapped destination cell, which always
/// yields NaN on application.
#[derive(Debug, Clone)]
pub struct RemapWeights {
    source_len: usize,
    dest_len: usize,
    entries: Vec<Vec<(u32, f64)>>,
    /// Conservative weights skip NaN sources and renormalize; stencil
    /// weights let NaN propagate into the destination.
    skip_nan: bool,
}

impl RemapWeights {
    pub(crate) fn new(
        source_len: usize,
        dest_len: usize,
        entries: Vec<Vec<(u32, f64)>>,
        skip_nan: bool,
    ) -> Self {
        debug_assert_eq!(entries.len(), dest_len);
        Self {
            source_len,
            dest_len,
            entries,
            skip_nan,
        }
    }

    /// Number of source cells the weights were built for.
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Number of destination cells.
    pub fn dest_len(&self) -> usize {
        self.dest_len
    }

    /// Number of destination cells with no source contribution.
    pub fn unmapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_empty()).count()
    }

    /// Apply the weights to a field on the source cell centers.
    pub fn apply(&self, field: &[f64]) -> Result<Vec<f64>> {
        if field.len() != self.source_len {
            return Err(RegridError::FieldLength {
                expected: self.source_len,
                got: field.len(),
            });
        }

        let mut out = Vec::with_capacity(self.dest_len);
        for entry in &self.entries {
            if entry.is_empty() {
                out.push(f64::NAN);
                continue;
            }

            if self.skip_nan {
                let mut sum = 0.0;
                let mut wsum = 0.0;
                for &(idx, w) in entry {
                    let v = field[idx as usize];
                    if !v.is_nan() {
                        sum += w * v;
                        wsum += w;
                    }
                }
                out.push(if wsum > 0.0 { sum / wsum } else { f64::NAN });
            } else {
                // NaN sources propagate through the stencil sum
                let mut sum = 0.0;
                for &(idx, w) in entry {
                    sum += w * field[idx as usize];
                }
                out.push(sum);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_simple_weights() {
        let w = RemapWeights::new(
            4,
            2,
            vec![vec![(0, 0.5), (1, 0.5)], vec![]],
            false,
        );
        let out = w.apply(&[1.0, 3.0, 0.0, 0.0]).unwrap();
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!(out[1].is_nan(), "unmapped cell should be NaN");
    }

    #[test]
    fn test_apply_rejects_wrong_length() {
        let w = RemapWeights::new(4, 1, vec![vec![(0, 1.0)]], false);
        assert!(matches!(
            w.apply(&[1.0, 2.0]),
            Err(RegridError::FieldLength { .. })
        ));
    }

    #[test]
    fn test_nan_propagates_through_stencil() {
        let w = RemapWeights::new(2, 1, vec![vec![(0, 0.5), (1, 0.5)]], false);
        let out = w.apply(&[1.0, f64::NAN]).unwrap();
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_conservative_skips_nan_and_renormalizes() {
        let w = RemapWeights::new(2, 1, vec![vec![(0, 0.5), (1, 0.5)]], true);
        let out = w.apply(&[3.0, f64::NAN]).unwrap();
        assert!((out[0] - 3.0).abs() < 1e-12);
    }
}
