use ndarray::{Array1, ArrayView1};

/// cumulative hazard from survival: H = -ln(S).
/// S = 0 gives +inf, which is kept as a value.
pub fn cumulative_hazard(survival: ArrayView1<f64>) -> Array1<f64> {
    survival.mapv(|s| -s.ln())
}
