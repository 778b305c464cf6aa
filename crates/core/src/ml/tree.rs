//! CART regression tree.
//!
//! Nodes are stored in pre-order. A node with `feature == -1` is a leaf and
//! carries `value`; internal nodes send a sample left when its feature is NaN
//! or `<= threshold`.

use serde::{Deserialize, Serialize};

const LEAF: i32 = -1;
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub value: Option<f64>,
}

impl RegressionNode {
    fn leaf(value: f64) -> Self {
        Self { feature: LEAF, threshold: 0.0, left: LEAF, right: LEAF, value: Some(value) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self { max_depth: None, min_samples_split: 2, min_samples_leaf: 1 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    n_features: usize,
    nodes: Vec<RegressionNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
}

impl RegressionTree {
    /// Fits on the rows of `x` selected by `sample`. Duplicated indices act as weights.
    pub fn fit(x: &[Vec<f64>], y: &[f64], sample: &[usize], params: TreeParams) -> Self {
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let mut nodes = Vec::new();
        if sample.is_empty() {
            nodes.push(RegressionNode::leaf(0.0));
        } else {
            build(&mut nodes, x, y, sample.to_vec(), 0, params, n_features);
        }
        Self { n_features, nodes }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0usize;
        loop {
            let Some(node) = self.nodes.get(index) else {
                return 0.0;
            };
            if node.feature == LEAF {
                return node.value.unwrap_or(0.0);
            }

            let value = features.get(node.feature as usize).copied().unwrap_or(f64::NAN);
            let next = if value.is_nan() || value <= node.threshold { node.left } else { node.right };
            index = next as usize;
        }
    }

    /// Structural checks applied to deserialized trees.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        let n_nodes = self.nodes.len() as i32;
        for (index, node) in self.nodes.iter().enumerate() {
            if node.feature == LEAF {
                if node.value.is_none() {
                    return Err(format!("leaf node {index} missing value"));
                }
                continue;
            }
            if node.feature < 0 || node.feature as usize >= self.n_features {
                return Err(format!("node {index} has invalid feature index {}", node.feature));
            }
            // Pre-order layout: children always follow their parent.
            let in_range = |child: i32| child > index as i32 && child < n_nodes;
            if !in_range(node.left) || !in_range(node.right) {
                return Err(format!("node {index} has invalid children"));
            }
        }
        Ok(())
    }
}

fn build(
    nodes: &mut Vec<RegressionNode>,
    x: &[Vec<f64>],
    y: &[f64],
    sample: Vec<usize>,
    depth: usize,
    params: TreeParams,
    n_features: usize,
) -> i32 {
    let node_id = nodes.len();
    let (sum, sum_sq) = sample.iter().fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
    let count = sample.len() as f64;
    nodes.push(RegressionNode::leaf(sum / count));

    let depth_exhausted = params.max_depth.is_some_and(|max| depth >= max);
    let parent_sse = sum_sq - sum * sum / count;
    if depth_exhausted || sample.len() < params.min_samples_split || parent_sse <= MIN_IMPURITY_DECREASE {
        return node_id as i32;
    }

    let Some(split) = best_split(x, y, &sample, params.min_samples_leaf.max(1), n_features, parent_sse)
    else {
        return node_id as i32;
    };

    let (left, right): (Vec<usize>, Vec<usize>) =
        sample.into_iter().partition(|&i| x[i][split.feature] <= split.threshold);
    let left_id = build(nodes, x, y, left, depth + 1, params, n_features);
    let right_id = build(nodes, x, y, right, depth + 1, params, n_features);

    nodes[node_id] = RegressionNode {
        feature: split.feature as i32,
        threshold: split.threshold,
        left: left_id,
        right: right_id,
        value: None,
    };
    node_id as i32
}

fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    sample: &[usize],
    min_leaf: usize,
    n_features: usize,
    parent_sse: f64,
) -> Option<Split> {
    let n = sample.len();
    if n < 2 * min_leaf {
        return None;
    }

    let total_sum: f64 = sample.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| y[i] * y[i]).sum();
    let mut best: Option<(f64, Split)> = None;
    let mut order = sample.to_vec();

    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let moved = y[order[k - 1]];
            left_sum += moved;
            left_sq += moved * moved;

            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            let lower = x[order[k - 1]][feature];
            let upper = x[order[k]][feature];
            if lower >= upper {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if parent_sse - sse <= MIN_IMPURITY_DECREASE {
                continue;
            }
            if best.as_ref().map_or(true, |(best_sse, _)| sse < *best_sse) {
                let midpoint = lower + (upper - lower) / 2.0;
                let threshold = if midpoint >= upper { lower } else { midpoint };
                best = Some((sse, Split { feature, threshold }));
            }
        }
    }

    best.map(|(_, split)| split)
}

#[cfg(test)]
mod tests {
    use super::{RegressionTree, TreeParams};

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 0.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 3.0 }).collect();
        (x, y)
    }

    #[test]
    fn stump_learns_a_step_function() {
        let (x, y) = step_data();
        let sample: Vec<usize> = (0..x.len()).collect();
        let tree = RegressionTree::fit(&x, &y, &sample, TreeParams::default());

        assert_eq!(tree.predict(&[2.0, 0.0]), 1.0);
        assert_eq!(tree.predict(&[7.0, 0.0]), 3.0);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn constant_target_yields_single_leaf() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let y = vec![2.5; 6];
        let sample: Vec<usize> = (0..6).collect();
        let tree = RegressionTree::fit(&x, &y, &sample, TreeParams::default());

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict(&[100.0]), 2.5);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();
        let sample: Vec<usize> = (0..32).collect();
        let params = TreeParams { max_depth: Some(2), ..TreeParams::default() };
        let tree = RegressionTree::fit(&x, &y, &sample, params);

        assert!(tree.node_count() <= 7);
    }

    #[test]
    fn nan_and_missing_features_go_left() {
        let (x, y) = step_data();
        let sample: Vec<usize> = (0..x.len()).collect();
        let tree = RegressionTree::fit(&x, &y, &sample, TreeParams::default());

        assert_eq!(tree.predict(&[f64::NAN, 0.0]), 1.0);
        assert_eq!(tree.predict(&[]), 1.0);
    }

    #[test]
    fn corrupt_children_fail_validation() -> Result<(), serde_json::Error> {
        let tree: RegressionTree = serde_json::from_str(
            r#"{"n_features": 1, "nodes": [
                {"feature": 0, "threshold": 0.5, "left": 1, "right": 9, "value": null},
                {"feature": -1, "threshold": 0.0, "left": -1, "right": -1, "value": 1.0}
            ]}"#,
        )?;
        assert!(tree.validate().is_err());
        Ok(())
    }
}
