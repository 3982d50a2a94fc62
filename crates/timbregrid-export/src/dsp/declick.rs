//! Single-sample click removal.
//!
//! A click is a sample that jumps away from its predecessor and straight back,
//! so two consecutive first differences both exceed the threshold. Ordinary
//! slopes produce at most one large difference and are left alone.

/// Indices `c` where `|a[c+1] - a[c]|` and `|a[c+2] - a[c+1]|` both exceed `threshold`.
///
/// The offending sample is `c + 1`.
pub fn find_clicks(samples: &[f32], threshold: f32) -> Vec<usize> {
    let above: Vec<usize> = samples
        .windows(2)
        .enumerate()
        .filter(|(_, w)| (w[1] - w[0]).abs() > threshold)
        .map(|(i, _)| i)
        .collect();

    above
        .windows(2)
        .filter(|pair| pair[0] + 1 == pair[1])
        .map(|pair| pair[0])
        .collect()
}

/// Replace every click sample with the midpoint of its neighbours, in place.
///
/// Clicks are located on the input first and repaired in ascending order, so a
/// repair sees the already-repaired sample before it. Returns the number of
/// samples changed.
pub fn declick(samples: &mut [f32], threshold: f32) -> usize {
    let clicks = find_clicks(samples, threshold);
    for &c in &clicks {
        samples[c + 1] = (samples[c] + samples[c + 2]) / 2.0;
    }
    clicks.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_spike_is_replaced() {
        let mut audio = vec![0.0, 0.1, 1.5, 0.2, 0.1];
        assert_eq!(find_clicks(&audio, 1.0), vec![1]);
        assert_eq!(declick(&mut audio, 1.0), 1);
        assert_relative_eq!(audio[2], 0.15);
        assert_eq!(audio[..2], [0.0, 0.1]);
        assert_eq!(audio[3..], [0.2, 0.1]);
    }

    #[test]
    fn test_step_is_not_a_click() {
        let mut audio = vec![-0.9, -0.9, 0.9, 0.9, 0.9];
        let before = audio.clone();
        assert_eq!(declick(&mut audio, 1.0), 0);
        assert_eq!(audio, before);
    }

    #[test]
    fn test_clean_signal_unchanged() {
        let mut audio: Vec<f32> = (0..1000)
            .map(|i| 0.8 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 16000.0).sin())
            .collect();
        let before = audio.clone();
        assert_eq!(declick(&mut audio, 1.0), 0);
        assert_eq!(audio, before);
    }

    #[test]
    fn test_consecutive_clicks_repair_in_order() {
        // Differences 2.0, -2.0, 2.0 flag c = 0 and c = 1.
        let mut audio = vec![0.0, 2.0, 0.0, 2.0];
        assert_eq!(find_clicks(&audio, 1.0), vec![0, 1]);
        declick(&mut audio, 1.0);
        // a[1] = (0 + 0) / 2, then a[2] = (a[1] + a[3]) / 2 with the repaired a[1].
        assert_eq!(audio, vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_short_inputs() {
        assert!(find_clicks(&[], 1.0).is_empty());
        assert!(find_clicks(&[5.0], 1.0).is_empty());
        assert!(find_clicks(&[0.0, 5.0], 1.0).is_empty());
    }
}
