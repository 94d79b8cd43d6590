use serde::Serialize;

use crate::config::CurveKind;

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

/// Monotone non-increasing step curve over x in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub kind: CurveKind,
    /// `(x, y)` pairs in drawing order.
    pub points: Vec<(f64, f64)>,
}

impl Curve {
    /// Build the step curve of `values`, each covering `weights[i]` of the
    /// x axis. Values are sorted in descending order; neighbouring values
    /// within `tolerance` of the first value of their run share one step
    /// whose height is the run's weighted mean.
    pub fn from_weighted(kind: CurveKind, values: &[f64], weights: &[f64], tolerance: f64) -> Self {
        debug_assert_eq!(values.len(), weights.len());
        let mut pairs: Vec<(f64, f64)> = values.iter().copied().zip(weights.iter().copied()).collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

        // (run start value, total weight, weighted sum)
        let mut steps: Vec<(f64, f64, f64)> = Vec::new();
        for (v, w) in pairs {
            if let Some((start, sw, swv)) = steps.last_mut() {
                if (*start - v).abs() <= tolerance {
                    *sw += w;
                    *swv += w * v;
                    continue;
                }
            }
            steps.push((v, w, w * v));
        }

        let mut points = Vec::with_capacity(steps.len() * 2);
        let mut x = NeumaierSum::default();
        for (_, sw, swv) in steps {
            let y = if sw > 0.0 { swv / sw } else { 0.0 };
            let x0 = x.value();
            x.add(sw);
            points.push((x0, y));
            points.push((x.value(), y));
        }

        // Weights sum to 1 up to rounding.
        if let Some(last) = points.last_mut() {
            if (last.0 - 1.0).abs() <= tolerance.max(1e-12) {
                last.0 = 1.0;
            }
        }

        Curve { kind, points }
    }

    /// Area under the curve (trapezoidal rule), clamped to [0, 1] when it
    /// overshoots by no more than `tolerance`.
    pub fn area(&self, tolerance: f64) -> f64 {
        let mut sum = NeumaierSum::default();
        for pair in self.points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            sum.add((x1 - x0) * (y0 + y1) / 2.0);
        }
        let area = sum.value();
        if area > 1.0 && area - 1.0 <= tolerance {
            1.0
        } else if area < 0.0 && -area <= tolerance {
            0.0
        } else {
            area
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Compensated summation
// ---------------------------------------------------------------------------

/// Neumaier's variant of Kahan summation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    pub fn add(&mut self, v: f64) {
        let t = self.sum + v;
        if self.sum.abs() >= v.abs() {
            self.compensation += (self.sum - t) + v;
        } else {
            self.compensation += (v - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl FromIterator<f64> for NeumaierSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut s = NeumaierSum::default();
        for v in iter {
            s.add(v);
        }
        s
    }
}
