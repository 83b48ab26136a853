//! Post-processing helpers for classifier outputs.

/// Index of the largest element.
///
/// Strict `>` against a running maximum that starts at `f32::MIN`, so ties
/// resolve to the lowest index. `None` when no element beats `f32::MIN`
/// (empty slice, all NaN, or all `f32::MIN`/`-inf`).
#[inline]
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut max = f32::MIN;
    let mut index = None;
    for (i, &v) in values.iter().enumerate() {
        if v > max {
            max = v;
            index = Some(i);
        }
    }
    index
}

/// In-place softmax over a logits buffer.
///
/// For graphs without a terminal normalization layer. The maximum is
/// subtracted before exponentiating so large logits cannot overflow.
pub fn softmax(logits: &mut [f32]) {
    if logits.is_empty() {
        return;
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in logits.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in logits.iter_mut() {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_argmax_ties_resolve_low() {
        assert_eq!(argmax(&[0.2, 0.9, 0.9, 0.1]), Some(1));
    }

    #[test]
    fn test_argmax_negative_values() {
        assert_eq!(argmax(&[-3.0, -1.5, -2.0]), Some(1));
    }

    #[test]
    fn test_argmax_degenerate() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), None);
        assert_eq!(argmax(&[f32::NEG_INFINITY]), None);
        assert_eq!(argmax(&[f32::NAN, 0.5]), Some(1));
    }

    #[test]
    fn test_softmax_uniform() {
        let mut logits = [1.0f32, 1.0, 1.0];
        softmax(&mut logits);
        for p in logits {
            assert_relative_eq!(p, 1.0 / 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let mut logits = [1000.0f32, 1000.0, 999.0];
        softmax(&mut logits);
        assert!(logits.iter().all(|p| p.is_finite()));
        assert_relative_eq!(logits[0], logits[1]);
        assert!(logits[2] < logits[0]);
    }

    #[test]
    fn test_softmax_empty_is_noop() {
        let mut logits: [f32; 0] = [];
        softmax(&mut logits);
    }

    proptest! {
        #[test]
        fn softmax_sums_to_one(logits in prop::collection::vec(-50.0f32..50.0, 1..64)) {
            let mut probs = logits.clone();
            softmax(&mut probs);
            let sum: f32 = probs.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-4);
            prop_assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        }

        #[test]
        fn softmax_is_monotonic(logits in prop::collection::vec(-50.0f32..50.0, 2..64)) {
            let mut probs = logits.clone();
            softmax(&mut probs);
            for i in 0..logits.len() {
                for j in 0..logits.len() {
                    if logits[i] > logits[j] {
                        prop_assert!(probs[i] >= probs[j]);
                    }
                }
            }
        }
    }
}
