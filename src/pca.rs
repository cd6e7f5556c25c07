use ndarray::{Array1, Array2, ArrayView2, Axis};

const MAX_SWEEPS: usize = 100;
const OFF_DIAGONAL_TOLERANCE: f64 = 1e-22;

/// Principal-component projection fitted on one population.
///
/// Components are ordered by descending eigenvalue (ties keep the lower
/// original index first) and each one is oriented so its largest-magnitude
/// loading is positive. The same input therefore always produces the same
/// projection.
#[derive(Debug, Clone)]
pub struct PcaProjection {
    /// Column means of the fitted data.
    pub mean: Array1<f64>,
    /// `dimensions × features`, one unit-length component per row.
    pub components: Array2<f64>,
    pub explained_variance: Array1<f64>,
    pub explained_variance_ratio: Array1<f64>,
    /// The fitted data in component space, `rows × dimensions`.
    pub projected: Array2<f64>,
}

impl PcaProjection {
    /// `dimensions` is clamped to `[1, min(rows, features)]`.
    pub fn fit_transform(data: ArrayView2<'_, f64>, dimensions: usize) -> Self {
        let (rows, features) = data.dim();
        let dims = dimensions.clamp(1, rows.min(features).max(1)).min(features);

        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(features));
        let centered = &data - &mean;

        let denom = rows.saturating_sub(1).max(1) as f64;
        let covariance = centered.t().dot(&centered) / denom;
        let (eigenvalues, eigenvectors) = symmetric_eigen(covariance);

        let mut order = (0..features).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .total_cmp(&eigenvalues[a])
                .then(a.cmp(&b))
        });

        let total = eigenvalues.iter().map(|v| v.max(0.0)).sum::<f64>();
        let mut components = Array2::zeros((dims, features));
        let mut explained_variance = Array1::zeros(dims);
        for (slot, &idx) in order.iter().take(dims).enumerate() {
            let mut component = eigenvectors.column(idx).to_owned();
            orient(&mut component);
            components.row_mut(slot).assign(&component);
            explained_variance[slot] = eigenvalues[idx].max(0.0);
        }
        let explained_variance_ratio = if total > 0.0 {
            &explained_variance / total
        } else {
            Array1::zeros(dims)
        };

        let projected = centered.dot(&components.t());
        Self {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
            projected,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.components.nrows()
    }

    /// Share of total variance kept by the retained components.
    pub fn total_explained_ratio(&self) -> f64 {
        self.explained_variance_ratio.sum()
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Array2<f64> {
        (&data - &self.mean).dot(&self.components.t())
    }
}

/// Largest-magnitude entry made positive; first one wins on ties.
fn orient(component: &mut Array1<f64>) {
    let mut pivot = 0usize;
    for (i, v) in component.iter().enumerate() {
        if v.abs() > component[pivot].abs() {
            pivot = i;
        }
    }
    if component.get(pivot).is_some_and(|v| *v < 0.0) {
        component.mapv_inplace(|v| -v);
    }
}

/// Cyclic Jacobi rotations. Returns eigenvalues and the matrix whose columns
/// are the matching unit eigenvectors.
pub fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>();

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= OFF_DIAGONAL_TOLERANCE * scale || off == 0.0 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}
