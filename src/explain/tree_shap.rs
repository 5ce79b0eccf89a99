//! Exact path-dependent TreeSHAP for a single tree.
//!
//! Implements the polynomial-time algorithm of Lundberg et al. (2018),
//! "Consistent Individualized Feature Attribution for Tree Ensembles",
//! Algorithm 2. Conditional expectations are taken over the training
//! distribution recorded in node covers, so the attributions of a tree always
//! sum to `tree.predict(x) - tree.expected_value()`.
//!
//! The algorithm walks every root-to-leaf path once while maintaining, for the
//! set of distinct features seen on the current path, the proportion of feature
//! subsets of each size that reach the current node.

use crate::model::tree::{Node, Tree};

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` only for the sentinel element at depth 0.
    feature: Option<usize>,
    /// Fraction of "feature unknown" paths that flow through this split.
    zero_fraction: f64,
    /// 1 if `x` follows this split, 0 otherwise.
    one_fraction: f64,
    /// Subset-size weight (the permutation coefficient).
    weight: f64,
}

/// Add the attributions of `tree` at `x` into `phi` (indexed by feature).
pub fn tree_shap(tree: &Tree, x: &[f64], phi: &mut [f64]) {
    let path: Vec<PathElement> = Vec::with_capacity(tree.max_depth() + 2);
    recurse(tree, x, phi, 0, &path, 1.0, 1.0, None);
}

#[allow(clippy::too_many_arguments)]
fn recurse(
    tree: &Tree,
    x: &[f64],
    phi: &mut [f64],
    node: usize,
    parent_path: &[PathElement],
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) {
    let mut path = Vec::with_capacity(parent_path.len() + 1);
    path.extend_from_slice(parent_path);
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    match tree.node(node) {
        Node::Leaf { value, .. } => {
            for i in 1..path.len() {
                let w = unwound_path_sum(&path, i);
                let el = path[i];
                if let Some(f) = el.feature {
                    if let Some(slot) = phi.get_mut(f) {
                        *slot += w * (el.one_fraction - el.zero_fraction) * value;
                    }
                }
            }
        }
        Node::Split {
            feature: split,
            left,
            right,
            cover,
            ..
        } => {
            let hot = tree.next_node(node, x);
            let cold = if hot == *left { *right } else { *left };
            let hot_zero = tree.node(hot).cover() / cover;
            let cold_zero = tree.node(cold).cover() / cover;

            // A feature already on the path is folded into a single element.
            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;
            if let Some(k) = path.iter().position(|e| e.feature == Some(*split)) {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind_path(&mut path, k);
            }

            recurse(tree, x, phi, hot, &path, hot_zero * incoming_zero, incoming_one, Some(*split));
            recurse(tree, x, phi, cold, &path, cold_zero * incoming_zero, 0.0, Some(*split));
        }
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

/// Remove element `index` from the path, undoing its `extend_path`.
fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one);
            next_one_portion = tmp - path[i].weight * zero * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero * (depth - i) as f64);
        }
    }

    // Weights stay in place; identities shift down over the removed slot.
    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed.
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero * ((depth - i) as f64 / denom);
        } else if zero != 0.0 {
            total += (path[i].weight / zero) / ((depth - i) as f64 / denom);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree::tests::small_tree;

    fn shap(tree: &Tree, x: &[f64]) -> Vec<f64> {
        let mut phi = vec![0.0; x.len()];
        tree_shap(tree, x, &mut phi);
        phi
    }

    #[test]
    fn single_split_splits_difference_to_mean() {
        let tree = Tree::new(vec![
            Node::Split { feature: 0, threshold: 1.0, default_left: true, left: 1, right: 2, cover: 4.0 },
            Node::Leaf { value: 2.0, cover: 1.0 },
            Node::Leaf { value: 6.0, cover: 3.0 },
        ])
        .unwrap();
        // E = 0.25 * 2 + 0.75 * 6 = 5
        let phi = shap(&tree, &[0.0, 9.0]);
        assert!((phi[0] - (2.0 - 5.0)).abs() < 1e-12);
        assert_eq!(phi[1], 0.0);
    }

    #[test]
    fn two_feature_tree_matches_brute_force() {
        let tree = small_tree();
        let x = [3.0, 1.0];
        let phi = shap(&tree, &x);

        // v(S) with covers: v({}) = 0.8, v({0}) = 0, v({1}) = 0.6 * -1 + 0.4 * 2 = 0.2, v({0,1}) = -1
        let (v0, v_a, v_b, v_ab) = (0.8, 0.0, 0.2, -1.0);
        let phi_a = 0.5 * ((v_a - v0) + (v_ab - v_b));
        let phi_b = 0.5 * ((v_b - v0) + (v_ab - v_a));
        assert!((phi[0] - phi_a).abs() < 1e-12);
        assert!((phi[1] - phi_b).abs() < 1e-12);
        assert!((phi.iter().sum::<f64>() + tree.expected_value() - tree.predict(&x)).abs() < 1e-12);
    }

    #[test]
    fn repeated_feature_on_path_is_additive() {
        // Same feature split twice along one path.
        let tree = Tree::new(vec![
            Node::Split { feature: 0, threshold: 3.0, default_left: true, left: 1, right: 2, cover: 10.0 },
            Node::Leaf { value: -1.0, cover: 2.0 },
            Node::Split { feature: 0, threshold: 7.0, default_left: false, left: 3, right: 4, cover: 8.0 },
            Node::Leaf { value: 0.5, cover: 5.0 },
            Node::Leaf { value: 1.5, cover: 3.0 },
        ])
        .unwrap();
        for v in [0.0, 5.0, 9.0] {
            let x = [v];
            let phi = shap(&tree, &x);
            assert!((phi[0] - (tree.predict(&x) - tree.expected_value())).abs() < 1e-12);
        }
    }

    #[test]
    fn unwind_reverses_extend() {
        let mut path = Vec::new();
        extend_path(&mut path, 1.0, 1.0, None);
        extend_path(&mut path, 0.4, 1.0, Some(3));
        let snapshot: Vec<f64> = path.iter().map(|e| e.weight).collect();
        extend_path(&mut path, 0.7, 0.0, Some(5));
        unwind_path(&mut path, 2);
        assert_eq!(path.len(), 2);
        for (e, w) in path.iter().zip(snapshot) {
            assert!((e.weight - w).abs() < 1e-12);
        }
    }
}
