use ndarray::{Array2, ArrayView1};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub row: usize,
    pub distance: f64,
}

#[derive(Debug, Clone)]
pub struct NeighborIndex {
    points: Array2<f64>,
}

impl NeighborIndex {
    pub fn new(points: Array2<f64>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn point(&self, row: usize) -> Option<ArrayView1<'_, f64>> {
        (row < self.points.nrows()).then(|| self.points.row(row))
    }

    /// Ties keep row order.
    pub fn nearest(&self, query: ArrayView1<'_, f64>, count: usize) -> Vec<Hit> {
        let mut hits = self
            .points
            .rows()
            .into_iter()
            .enumerate()
            .map(|(row, point)| Hit {
                row,
                distance: euclidean(point, query),
            })
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.row.cmp(&b.row)));
        hits.truncate(count);
        hits
    }
}

pub fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
