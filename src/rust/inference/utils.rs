use ndarray::{ArrayView1, ArrayViewMut1};

/// Scales a row to unit L2 norm. Zero rows are left untouched.
pub(crate) fn l2_normalize(mut row: ArrayViewMut1<f64>) {
    let norm = row.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 1e-12 {
        row.mapv_inplace(|x| x / norm);
    }
}

/// Scales a row so its absolute values sum to one. Zero rows are left untouched.
pub(crate) fn l1_normalize(mut row: ArrayViewMut1<f64>) {
    let norm = row.iter().map(|x| x.abs()).sum::<f64>();
    if norm > 1e-12 {
        row.mapv_inplace(|x| x / norm);
    }
}

/// Numerically stable softmax, in place.
pub(crate) fn softmax_inplace(mut row: ArrayViewMut1<f64>) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    row.mapv_inplace(|x| (x - max).exp());
    let sum = row.sum();
    row.mapv_inplace(|x| x / sum);
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Index of the first maximum. `None` for an empty row.
pub(crate) fn argmax(row: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in row.iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}
