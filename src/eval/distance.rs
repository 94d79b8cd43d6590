/// Clip non-finite and negative entries to zero and rescale to sum 1.
/// An all-zero row becomes uniform.
pub fn ensure_prob_vector(mut p: Vec<f64>) -> Vec<f64> {
    if p.is_empty() {
        return p;
    }
    for v in p.iter_mut() {
        if !v.is_finite() || *v < 0.0 {
            *v = 0.0;
        }
    }
    let s: f64 = p.iter().sum();
    if s <= 0.0 {
        vec![1.0 / p.len() as f64; p.len()]
    } else {
        p.into_iter().map(|v| v / s).collect()
    }
}

/// Hellinger distance between the one-hot truth and a distribution that
/// puts `p_true` on the true class; only `p_true` matters for normalised rows.
pub fn hellinger_one_hot(p_true: f64) -> f64 {
    (1.0 - p_true.clamp(0.0, 1.0).sqrt()).max(0.0).sqrt()
}

/// Precision credited to one row: 1 for a perfect prediction, 0 when no
/// mass is on the true class.
pub fn row_precision(p_true: f64) -> f64 {
    1.0 - hellinger_one_hot(p_true)
}
