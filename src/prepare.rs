use log::debug;

use crate::error::{CycleError, CycleResult};
use crate::table::RecordTable;
use crate::types::PreparedSignal;

/// Low-pass cutoff for smoothing both series, in Hz.
const CUTOFF_HZ: f64 = 2.0;

/// Extract the position series, derive velocity, smooth both.
///
/// The raw table is left untouched; the returned series are new allocations.
pub fn prepare(table: &RecordTable, position_col: &str, fs: f64) -> CycleResult<PreparedSignal> {
    if position_col.is_empty() {
        return Err(CycleError::Configuration(
            "position column name must be provided".to_string(),
        ));
    }
    if fs <= 0.0 {
        return Err(CycleError::Configuration(format!(
            "sampling frequency must be positive, got {fs}"
        )));
    }

    let position = table.column(position_col).ok_or_else(|| {
        CycleError::Schema(format!("position column '{position_col}' not found in data"))
    })?;

    let velocity = gradient(position);
    let position = smooth_low_pass(position, CUTOFF_HZ, fs)?;
    let velocity = smooth_low_pass(&velocity, CUTOFF_HZ, fs)?;

    Ok(PreparedSignal { position, velocity, fs })
}

/// Central-difference gradient: one-sided at both ends, `(x[i+1]-x[i-1])/2`
/// in the interior. Output length equals input length.
pub fn gradient(series: &[f64]) -> Vec<f64> {
    let n = series.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut out = Vec::with_capacity(n);
    out.push(series[1] - series[0]);
    for i in 1..n - 1 {
        out.push((series[i + 1] - series[i - 1]) / 2.0);
    }
    out.push(series[n - 1] - series[n - 2]);
    out
}

/// Zero-phase low-pass smoothing: 1st-order Butterworth applied forward and
/// backward so no time shift is introduced.
pub fn smooth_low_pass(data: &[f64], cutoff: f64, fs: f64) -> CycleResult<Vec<f64>> {
    let nyquist = 0.5 * fs;
    let normal_cutoff = cutoff / nyquist;
    debug!("normal_cutoff: {normal_cutoff}");
    if normal_cutoff >= 1.0 {
        return Err(CycleError::Configuration(format!(
            "low-pass cutoff {cutoff} Hz needs a sampling rate above {} Hz, got {fs} Hz",
            2.0 * cutoff
        )));
    }

    let (b, a) = butter_lowpass(normal_cutoff);
    Ok(filtfilt(b, a, data))
}

/// First-order Butterworth low-pass via the bilinear transform.
/// `wn` is the cutoff as a fraction of the Nyquist frequency, in (0, 1).
fn butter_lowpass(wn: f64) -> ([f64; 2], [f64; 2]) {
    let k = (std::f64::consts::PI * wn / 2.0).tan();
    let b0 = k / (1.0 + k);
    ([b0, b0], [1.0, (k - 1.0) / (k + 1.0)])
}

/// Single pass of the first-order IIR filter, direct form II transposed.
fn lfilter(b: [f64; 2], a: [f64; 2], x: &[f64], zi: f64) -> Vec<f64> {
    let mut z = zi;
    x.iter()
        .map(|&xi| {
            let y = b[0] * xi + z;
            z = b[1] * xi - a[1] * y;
            y
        })
        .collect()
}

/// Forward-backward filtering with odd-extension padding and steady-state
/// initial conditions, so step edges do not ring and no phase lag remains.
fn filtfilt(b: [f64; 2], a: [f64; 2], x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n < 2 {
        return x.to_vec();
    }
    let padlen = usize::min(6, n - 1);

    // Odd extension mirrors the series about its end points.
    let mut ext = Vec::with_capacity(n + 2 * padlen);
    for i in (1..=padlen).rev() {
        ext.push(2.0 * x[0] - x[i]);
    }
    ext.extend_from_slice(x);
    for i in 1..=padlen {
        ext.push(2.0 * x[n - 1] - x[n - 1 - i]);
    }

    // State that makes a constant input pass through unchanged.
    let dc_gain = (b[0] + b[1]) / (1.0 + a[1]);
    let zi = b[1] - a[1] * dc_gain;

    let forward = lfilter(b, a, &ext, zi * ext[0]);
    let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
    let backward = lfilter(b, a, &reversed, zi * reversed[0]);
    reversed = backward.into_iter().rev().collect();

    reversed[padlen..padlen + n].to_vec()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn table_from_csv(contents: &str) -> RecordTable {
        use std::io::Write;
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        RecordTable::from_csv(file.path()).unwrap()
    }

    fn sine_csv(n: usize, freq: f64, fs: f64) -> String {
        let mut csv = String::from("Position\n");
        for i in 0..n {
            let t = i as f64 / fs;
            csv.push_str(&format!("{}\n", (2.0 * std::f64::consts::PI * freq * t).sin()));
        }
        csv
    }

    #[test]
    fn test_gradient_matches_central_difference() {
        let series = [0.0, 1.0, 4.0, 9.0, 16.0];
        assert_eq!(gradient(&series), vec![1.0, 2.0, 4.0, 6.0, 7.0]);
    }

    #[test]
    fn test_gradient_short_series() {
        assert_eq!(gradient(&[]), Vec::<f64>::new());
        assert_eq!(gradient(&[3.0]), vec![0.0]);
        assert_eq!(gradient(&[1.0, 3.0]), vec![2.0, 2.0]);
    }

    #[test]
    fn test_prepare_lengths_match_and_finite() {
        let table = table_from_csv(&sine_csv(200, 0.5, 100.0));
        let prepared = prepare(&table, "Position", 100.0).unwrap();

        assert_eq!(prepared.position.len(), prepared.velocity.len());
        assert_eq!(prepared.position.len(), 200);
        assert!(prepared.position.iter().all(|v| v.is_finite()));
        assert!(prepared.velocity.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_prepare_rejects_empty_column_name() {
        let table = table_from_csv("Position\n0.1\n0.2\n");
        let err = prepare(&table, "", 100.0).unwrap_err();
        assert!(matches!(err, CycleError::Configuration(_)));
    }

    #[test]
    fn test_prepare_rejects_bad_sampling_rate() {
        let table = table_from_csv("Position\n0.1\n0.2\n");
        assert!(matches!(
            prepare(&table, "Position", 0.0).unwrap_err(),
            CycleError::Configuration(_)
        ));
        assert!(matches!(
            prepare(&table, "Position", -5.0).unwrap_err(),
            CycleError::Configuration(_)
        ));
    }

    #[test]
    fn test_prepare_missing_column_is_schema_error() {
        let table = table_from_csv("SomeOtherColumn\n0.1\n0.2\n");
        let err = prepare(&table, "Position", 100.0).unwrap_err();
        assert!(matches!(err, CycleError::Schema(_)));
    }

    #[test]
    fn test_cutoff_at_or_above_nyquist_rejected() {
        // 2 Hz cutoff needs fs > 4 Hz
        let err = smooth_low_pass(&[0.0, 1.0, 0.0, 1.0], 2.0, 4.0).unwrap_err();
        assert!(matches!(err, CycleError::Configuration(_)));
        assert!(smooth_low_pass(&[0.0, 1.0, 0.0, 1.0], 2.0, 4.1).is_ok());
    }

    #[test]
    fn test_filter_preserves_constant_signal() {
        let data = vec![3.5; 50];
        let smoothed = smooth_low_pass(&data, 2.0, 100.0).unwrap();
        for value in smoothed {
            assert_relative_eq!(value, 3.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_filter_attenuates_high_frequency() {
        // 20 Hz sine at 100 Hz sampling, way above the 2 Hz cutoff. The
        // forward-backward pass squares the single-pole response, so the
        // residual amplitude should be tiny away from the edges.
        let fs = 100.0;
        let data: Vec<f64> = (0..400)
            .map(|i| (2.0 * std::f64::consts::PI * 20.0 * i as f64 / fs).sin())
            .collect();
        let smoothed = smooth_low_pass(&data, 2.0, fs).unwrap();
        let peak = smoothed[50..350].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(peak < 0.05, "high-frequency residual too large: {peak}");
    }

    #[test]
    fn test_filter_passes_low_frequency() {
        // 0.2 Hz sine is an order of magnitude below the cutoff and should
        // come through nearly intact.
        let fs = 100.0;
        let data: Vec<f64> = (0..2000)
            .map(|i| (2.0 * std::f64::consts::PI * 0.2 * i as f64 / fs).sin())
            .collect();
        let smoothed = smooth_low_pass(&data, 2.0, fs).unwrap();
        let peak = smoothed[200..1800].iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        assert!(peak > 0.9, "low-frequency component over-attenuated: {peak}");
    }

    #[test]
    fn test_filter_short_input() {
        let smoothed = smooth_low_pass(&[1.0], 2.0, 100.0).unwrap();
        assert_eq!(smoothed, vec![1.0]);
        assert_eq!(smooth_low_pass(&[], 2.0, 100.0).unwrap(), Vec::<f64>::new());
    }
}
