use super::{IndexError, NearestNeighborIndex};

/// Exact brute-force index over squared Euclidean distance.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimensions: usize,
    /// Row-major vectors; row `i` is vector id `i`.
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
        }
    }

    fn row(&self, id: usize) -> &[f32] {
        &self.data[id * self.dimensions..(id + 1) * self.dimensions]
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl NearestNeighborIndex for FlatL2Index {
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|id| (id, squared_l2(self.row(id), query)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
