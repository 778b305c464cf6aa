use serde::{Deserialize, Serialize};

/// Per-column standardisation fitted on the training partition only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Population standard deviation; constant columns get a scale of 1.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let count = rows.len().max(1) as f64;

        let means: Vec<f64> = (0..width)
            .map(|column| rows.iter().map(|row| row[column]).sum::<f64>() / count)
            .collect();
        let scales = means
            .iter()
            .enumerate()
            .map(|(column, mean)| {
                let variance =
                    rows.iter().map(|row| (row[column] - mean).powi(2)).sum::<f64>() / count;
                let std = variance.sqrt();
                if std.is_finite() && std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Self { means, scales }
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::StandardScaler;

    #[test]
    fn columns_are_centered_and_scaled() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows);

        assert_eq!(scaler.n_features(), 2);
        assert_eq!(scaler.transform_row(&[1.0, 10.0]), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform_row(&[3.0, 12.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn statistics_come_from_fit_rows_only() {
        let scaler = StandardScaler::fit(&[vec![0.0], vec![2.0]]);
        let transformed = scaler.transform(&[vec![100.0]]);
        assert_eq!(transformed, vec![vec![99.0]]);
    }
}
