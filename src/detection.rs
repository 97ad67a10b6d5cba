use std::cmp::Ordering;

use log::{debug, info};

use crate::error::{CycleError, CycleResult};
use crate::types::{DetectionParameters, Pattern, PreparedSignal, SignalKind};

/// Detect cycle boundaries in the prepared signal.
///
/// Returns an ascending index sequence that always starts at 0 and ends at
/// the last sample. Pure function of its inputs: identical signal and
/// parameters always yield identical boundaries.
pub fn detect(
    signal: &PreparedSignal,
    params: &DetectionParameters,
    fs: f64,
) -> CycleResult<Vec<usize>> {
    let series: Vec<f64> = match params.signal {
        SignalKind::Position => {
            if signal.position.is_empty() {
                return Err(CycleError::Schema(
                    "data must contain a 'Position' series".to_string(),
                ));
            }
            signal.position.clone()
        }
        SignalKind::Velocity => {
            if signal.velocity.is_empty() {
                return Err(CycleError::Schema(
                    "data must contain a 'Velocity' series".to_string(),
                ));
            }
            signal.velocity.clone()
        }
        SignalKind::AbsVelocity => {
            if signal.velocity.is_empty() {
                return Err(CycleError::Schema(
                    "data must contain a 'Velocity' series to compute its absolute value".to_string(),
                ));
            }
            signal.velocity.iter().map(|v| v.abs()).collect()
        }
    };

    // Seconds to samples.
    let min_distance = (params.distance * fs).floor() as i64;
    if min_distance < 1 {
        return Err(CycleError::Configuration(format!(
            "peak distance of {} s at {} Hz is below one sample",
            params.distance, fs
        )));
    }
    let min_distance = min_distance as usize;
    debug!("min_distance: {min_distance}");

    let mut boundaries: Vec<usize> = Vec::new();

    if matches!(params.pattern, Pattern::OnPeak | Pattern::Both) {
        let peaks = find_peaks(&series, params.threshold, min_distance);
        let max = series.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let min = series.iter().fold(f64::INFINITY, |m, &v| m.min(v));
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        debug!(
            "peaks: {peaks:?} (series max {max:.3}, min {min:.3}, mean {mean:.3}, threshold {})",
            params.threshold
        );
        boundaries.extend(&peaks);
    }

    if matches!(params.pattern, Pattern::BetweenPeak | Pattern::Both) {
        // The peak set is recomputed here on purpose, independent of whether
        // the on-peak pass already ran.
        let anchors = find_peaks(&series, params.threshold, min_distance);
        boundaries.extend(anchors.windows(2).map(|pair| (pair[0] + pair[1]) / 2));
    }

    boundaries.sort_unstable();
    boundaries.dedup();

    if boundaries.is_empty() {
        return Err(CycleError::Detection);
    }

    // Bound the set so the whole signal is covered. Duplicate 0/last entries
    // are tolerated here.
    boundaries.insert(0, 0);
    boundaries.push(series.len() - 1);

    info!("detected {} cycles", boundaries.len() - 1);
    Ok(boundaries)
}

/// Local maxima with a minimum height and minimum mutual separation.
///
/// A plateau counts once, at its midpoint; the first and last samples never
/// qualify. The separation constraint is enforced greedily, highest peak
/// first, with equal heights resolved in favor of the earlier index.
pub fn find_peaks(series: &[f64], height: f64, min_distance: usize) -> Vec<usize> {
    let n = series.len();
    let mut candidates: Vec<usize> = Vec::new();

    let mut i = 1;
    while i + 1 < n {
        if series[i - 1] < series[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && series[ahead] == series[i] {
                ahead += 1;
            }
            if series[ahead] < series[i] {
                candidates.push((i + ahead - 1) / 2);
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    candidates.retain(|&idx| series[idx] >= height);

    if candidates.len() < 2 || min_distance <= 1 {
        return candidates;
    }

    // Highest peaks claim their neighborhood first.
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&l, &r| {
        series[candidates[r]]
            .partial_cmp(&series[candidates[l]])
            .unwrap_or(Ordering::Equal)
            .then(candidates[l].cmp(&candidates[r]))
    });

    let mut keep = vec![true; candidates.len()];
    for &k in &order {
        if !keep[k] {
            continue;
        }
        let mut j = k;
        while j > 0 {
            j -= 1;
            if candidates[k] - candidates[j] < min_distance {
                keep[j] = false;
            } else {
                break;
            }
        }
        let mut j = k + 1;
        while j < candidates.len() {
            if candidates[j] - candidates[k] < min_distance {
                keep[j] = false;
                j += 1;
            } else {
                break;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect()
}
