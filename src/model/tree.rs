//! A single regression tree of a boosted ensemble.
//!
//! Nodes are stored flat, addressed by index, with the root at `0`. Children
//! always have a larger index than their parent, which makes every traversal
//! terminate and lets the loader validate the shape in one pass.

use crate::error::AppError;

/// One tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split {
        feature: usize,
        /// Go left iff `(x as f32) < threshold`.
        threshold: f32,
        /// Direction taken when the feature value is missing (NaN).
        default_left: bool,
        left: usize,
        right: usize,
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    /// Training weight (sum of hessians) that reached this node.
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Validate and wrap a flat node list.
    pub fn new(nodes: Vec<Node>) -> Result<Self, AppError> {
        if nodes.is_empty() {
            return Err(AppError::model("Tree has no nodes."));
        }
        for (idx, node) in nodes.iter().enumerate() {
            let cover = node.cover();
            if !cover.is_finite() || cover <= 0.0 {
                return Err(AppError::model(format!(
                    "Node {idx} has invalid cover {cover}; the model must be saved with node statistics (sum_hessian)."
                )));
            }
            match node {
                Node::Split { left, right, threshold, .. } => {
                    for &child in [left, right] {
                        if child <= idx || child >= nodes.len() {
                            return Err(AppError::model(format!(
                                "Node {idx} points to invalid child {child}."
                            )));
                        }
                    }
                    if threshold.is_nan() {
                        return Err(AppError::model(format!("Node {idx} has a NaN split threshold.")));
                    }
                }
                Node::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(AppError::model(format!("Leaf {idx} has non-finite value {value}.")));
                    }
                }
            }
        }
        Ok(Self { nodes })
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    /// Largest feature index used by any split, if the tree splits at all.
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }

    /// The child a split node routes `x` to. Leaves return themselves.
    pub fn next_node(&self, idx: usize, x: &[f64]) -> usize {
        match &self.nodes[idx] {
            Node::Split {
                feature,
                threshold,
                default_left,
                left,
                right,
                ..
            } => {
                let v = x.get(*feature).copied().unwrap_or(f64::NAN);
                let go_left = if v.is_nan() {
                    *default_left
                } else {
                    (v as f32) < *threshold
                };
                if go_left { *left } else { *right }
            }
            Node::Leaf { .. } => idx,
        }
    }

    /// Index of the leaf `x` lands in.
    pub fn leaf_index(&self, x: &[f64]) -> usize {
        let mut idx = 0;
        while let Node::Split { .. } = self.nodes[idx] {
            idx = self.next_node(idx, x);
        }
        idx
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        match self.nodes[self.leaf_index(x)] {
            Node::Leaf { value, .. } => value,
            Node::Split { .. } => unreachable!("leaf_index always stops on a leaf"),
        }
    }

    /// Cover-weighted mean leaf value: the tree's output with every feature unknown.
    pub fn expected_value(&self) -> f64 {
        self.node_expectation(0)
    }

    fn node_expectation(&self, idx: usize) -> f64 {
        match &self.nodes[idx] {
            Node::Leaf { value, .. } => *value,
            Node::Split { left, right, cover, .. } => {
                let wl = self.nodes[*left].cover() / cover;
                let wr = self.nodes[*right].cover() / cover;
                wl * self.node_expectation(*left) + wr * self.node_expectation(*right)
            }
        }
    }

    /// Depth of the deepest leaf (a lone leaf has depth 0).
    pub fn max_depth(&self) -> usize {
        let mut depth = vec![0usize; self.nodes.len()];
        let mut max = 0;
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split { left, right, .. } = node {
                depth[*left] = depth[idx] + 1;
                depth[*right] = depth[idx] + 1;
                max = max.max(depth[idx] + 1);
            }
        }
        max
    }

    /// Multiply every leaf by `weight` (DART tree weights).
    pub fn scale_leaves(&mut self, weight: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value, .. } = node {
                *value *= weight;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `x[0] < 10 ? (x[1] < 5 ? -1 : 1) : 2`, covers 10 = 6 + 4, 6 = 3 + 3.
    pub(crate) fn small_tree() -> Tree {
        Tree::new(vec![
            Node::Split { feature: 0, threshold: 10.0, default_left: true, left: 1, right: 2, cover: 10.0 },
            Node::Split { feature: 1, threshold: 5.0, default_left: false, left: 3, right: 4, cover: 6.0 },
            Node::Leaf { value: 2.0, cover: 4.0 },
            Node::Leaf { value: -1.0, cover: 3.0 },
            Node::Leaf { value: 1.0, cover: 3.0 },
        ])
        .unwrap()
    }

    #[test]
    fn routes_by_threshold() {
        let t = small_tree();
        assert_eq!(t.predict(&[3.0, 1.0]), -1.0);
        assert_eq!(t.predict(&[3.0, 5.0]), 1.0);
        assert_eq!(t.predict(&[10.0, 0.0]), 2.0);
    }

    #[test]
    fn missing_values_follow_default_direction() {
        let t = small_tree();
        assert_eq!(t.predict(&[f64::NAN, f64::NAN]), 1.0);
        assert_eq!(t.predict(&[]), 1.0);
    }

    #[test]
    fn expected_value_is_cover_weighted() {
        let t = small_tree();
        // 0.6 * (0.5 * -1 + 0.5 * 1) + 0.4 * 2
        assert!((t.expected_value() - 0.8).abs() < 1e-12);
        assert_eq!(t.max_depth(), 2);
        assert_eq!(t.max_feature(), Some(1));
    }

    #[test]
    fn rejects_backward_children_and_zero_cover() {
        let cyclic = Tree::new(vec![
            Node::Split { feature: 0, threshold: 1.0, default_left: true, left: 0, right: 1, cover: 1.0 },
            Node::Leaf { value: 0.0, cover: 1.0 },
        ]);
        assert!(cyclic.is_err());

        let no_cover = Tree::new(vec![Node::Leaf { value: 0.0, cover: 0.0 }]);
        assert!(no_cover.is_err());
    }

    #[test]
    fn scale_leaves_multiplies_outputs() {
        let mut t = small_tree();
        t.scale_leaves(0.5);
        assert_eq!(t.predict(&[10.0, 0.0]), 1.0);
    }
}
