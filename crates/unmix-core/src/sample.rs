//! Sample type and level helpers

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_amplitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear amplitude to decibels (-inf for silence)
#[inline]
pub fn amplitude_to_db(amplitude: f64) -> f64 {
    if amplitude <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * amplitude.log10()
    }
}

/// Peak absolute value of a signal
pub fn peak(signal: &[Sample]) -> Sample {
    signal.iter().map(|s| s.abs()).fold(0.0, f64::max)
}

/// Root-mean-square level of a signal (0 for empty input)
pub fn rms(signal: &[Sample]) -> Sample {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|s| s * s).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// Total energy (sum of squares)
pub fn energy(signal: &[Sample]) -> Sample {
    signal.iter().map(|s| s * s).sum()
}

/// Return `signal * gain`
pub fn scaled(signal: &[Sample], gain: f64) -> Vec<Sample> {
    signal.iter().map(|s| s * gain).collect()
}

/// Weighted sum `a * wa + b * wb`; the shorter input is treated as zero-padded
pub fn mix(a: &[Sample], wa: f64, b: &[Sample], wb: f64) -> Vec<Sample> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0);
            let y = b.get(i).copied().unwrap_or(0.0);
            x * wa + y * wb
        })
        .collect()
}

/// Apply gain in dB
pub fn apply_gain_db(signal: &[Sample], gain_db: f64) -> Vec<Sample> {
    if gain_db == 0.0 {
        return signal.to_vec();
    }
    scaled(signal, db_to_amplitude(gain_db))
}

/// Linear fade in and fade out of `fade_secs` each.
///
/// Signals shorter than two fades are returned unchanged.
pub fn fade_in_out(signal: &[Sample], sample_rate: u32, fade_secs: f64) -> Vec<Sample> {
    let fade = (fade_secs * sample_rate as f64) as usize;
    let mut out = signal.to_vec();
    if fade == 0 || out.len() <= 2 * fade {
        return out;
    }

    let len = out.len();
    let step = if fade > 1 { 1.0 / (fade - 1) as f64 } else { 0.0 };
    for i in 0..fade {
        let ramp = i as f64 * step;
        out[i] *= ramp;
        out[len - 1 - i] *= ramp;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_conversion() {
        assert_relative_eq!(db_to_amplitude(0.0), 1.0);
        assert_relative_eq!(db_to_amplitude(-20.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(amplitude_to_db(0.1), -20.0, epsilon = 1e-9);
        assert_eq!(amplitude_to_db(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_levels() {
        let signal = [0.5, -0.8, 0.3, -0.2];
        assert_relative_eq!(peak(&signal), 0.8);
        assert_relative_eq!(energy(&signal), 0.25 + 0.64 + 0.09 + 0.04, epsilon = 1e-12);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_mix_pads_shorter_input() {
        let out = mix(&[1.0, 1.0, 1.0], 0.3, &[1.0], 0.7);
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(out[2], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_fade_in_out() {
        let signal = vec![1.0; 100];
        let faded = fade_in_out(&signal, 100, 0.1);

        assert_eq!(faded[0], 0.0);
        assert_eq!(faded[99], 0.0);
        assert_relative_eq!(faded[9], 1.0, epsilon = 1e-12);
        assert_eq!(faded[50], 1.0);

        // Too short for two fades: untouched
        let short = vec![1.0; 15];
        assert_eq!(fade_in_out(&short, 100, 0.1), short);
    }
}
