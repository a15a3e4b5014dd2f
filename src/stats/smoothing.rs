//! Masked rolling mean and discrete gradients

/// Centered NaN-aware moving average.
///
/// Each output sample is the mean of the finite values inside a window of
/// width `window` (floored at 3) around it, NaN when the window holds no
/// finite value. Near the ends the window is truncated, not padded. For an
/// even window it reaches one sample further back than forward.
///
/// Returns all NaN when the series is shorter than the window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let w = window.max(3);
    let n = values.len();
    if n < w {
        return vec![f64::NAN; n];
    }

    let offset = (w - 1) / 2;
    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let hi = (k + offset).min(n - 1);
        let lo = (k + offset).saturating_sub(w - 1);
        let (sum, count) = values[lo..=hi]
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0_f64, 0_usize), |(s, c), v| (s + v, c + 1));
        out.push(if count > 0 { sum / count as f64 } else { f64::NAN });
    }
    out
}

/// Gradient of `values` with respect to non-uniform `coords`.
///
/// Second-order accurate central differences in the interior, first-order
/// one-sided differences at both ends. Series shorter than 2 yield zeros.
pub fn gradient(values: &[f64], coords: &[f64]) -> Vec<f64> {
    let n = values.len().min(coords.len());
    if n < 2 {
        return vec![0.0; values.len()];
    }

    let mut out = vec![0.0; n];
    out[0] = (values[1] - values[0]) / (coords[1] - coords[0]);
    for i in 1..n - 1 {
        let h1 = coords[i] - coords[i - 1];
        let h2 = coords[i + 1] - coords[i];
        let a = -h2 / (h1 * (h1 + h2));
        let b = (h2 - h1) / (h1 * h2);
        let c = h1 / (h2 * (h1 + h2));
        out[i] = a * values[i - 1] + b * values[i] + c * values[i + 1];
    }
    out[n - 1] = (values[n - 1] - values[n - 2]) / (coords[n - 1] - coords[n - 2]);
    out
}

/// Gradient with unit sample spacing.
pub fn gradient_unit(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = vec![0.0; n];
    out[0] = values[1] - values[0];
    for i in 1..n - 1 {
        out[i] = 0.5 * (values[i + 1] - values[i - 1]);
    }
    out[n - 1] = values[n - 1] - values[n - 2];
    out
}
