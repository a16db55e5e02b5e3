//! Square joint intensity histogram and its mutual information.

/// `levels x levels` weighted co-occurrence table; rows index the synthetic
/// image, columns the film.
#[derive(Debug, Clone, PartialEq)]
pub struct JointHistogram {
    levels: usize,
    cells: Vec<f64>,
}

impl JointHistogram {
    pub fn new(levels: usize) -> Self {
        Self {
            levels,
            cells: vec![0.0; levels * levels],
        }
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    #[inline]
    pub fn add(&mut self, synthetic: usize, film: usize, weight: f64) {
        debug_assert!(synthetic < self.levels && film < self.levels);
        self.cells[synthetic * self.levels + film] += weight;
    }

    pub fn get(&self, synthetic: usize, film: usize) -> f64 {
        self.cells[synthetic * self.levels + film]
    }

    /// Adds `other` cell by cell.
    ///
    /// # Panics
    ///
    /// Panics if the histograms have different sizes.
    pub fn merge(&mut self, other: &JointHistogram) {
        assert_eq!(self.levels, other.levels, "joint histogram size mismatch");
        for (a, b) in self.cells.iter_mut().zip(&other.cells) {
            *a += b;
        }
    }

    pub fn total(&self) -> f64 {
        self.cells.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() <= 0.0
    }

    /// Scales the cells to unit sum. Returns `false` for an empty histogram.
    pub fn normalize(&mut self) -> bool {
        let total = self.total();
        if total <= 0.0 {
            return false;
        }
        self.cells.iter_mut().for_each(|c| *c /= total);
        true
    }

    /// Row sums (synthetic) and column sums (film).
    pub fn marginals(&self) -> (Vec<f64>, Vec<f64>) {
        let mut synthetic = vec![0.0; self.levels];
        let mut film = vec![0.0; self.levels];
        for (row, cells) in self.cells.chunks_exact(self.levels).enumerate() {
            for (col, &c) in cells.iter().enumerate() {
                synthetic[row] += c;
                film[col] += c;
            }
        }
        (synthetic, film)
    }

    /// `sum p(a,b) ln(p(a,b) / (p(a) p(b)))` over occupied cells, in nats.
    ///
    /// Works on unnormalized counts. `None` when the histogram is empty.
    pub fn mutual_information(&self) -> Option<f64> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        let (synthetic, film) = self.marginals();

        let mut mi = 0.0;
        for (row, cells) in self.cells.chunks_exact(self.levels).enumerate() {
            let pa = synthetic[row] / total;
            if pa <= 0.0 {
                continue;
            }
            for (col, &c) in cells.iter().enumerate() {
                let pb = film[col] / total;
                if c > 0.0 && pb > 0.0 {
                    let pab = c / total;
                    mi += pab * (pab / (pa * pb)).ln();
                }
            }
        }
        Some(mi)
    }
}
