//! Boosted tree ensemble evaluation.
//!
//! A forest sums its trees per output group on top of a base margin, then maps
//! the margins to class probabilities according to the training objective.

use serde::Serialize;

use crate::error::AppError;
use crate::model::tree::Tree;

/// Training objective, as far as inference cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// One output: log-odds of the positive class.
    BinaryLogistic,
    /// One output, stored untransformed; probabilities still use the logistic link.
    BinaryLogitRaw,
    /// One output per class, softmax link.
    MultiSoftprob,
}

impl Objective {
    pub fn display_name(self) -> &'static str {
        match self {
            Objective::BinaryLogistic => "binary:logistic",
            Objective::BinaryLogitRaw => "binary:logitraw",
            Objective::MultiSoftprob => "multi:softprob",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    tree_groups: Vec<usize>,
    base_margin: Vec<f64>,
    objective: Objective,
}

impl Forest {
    /// Assemble a forest. `tree_groups[i]` is the output group of `trees[i]`;
    /// `base_margin` has one entry per group.
    pub fn new(
        trees: Vec<Tree>,
        tree_groups: Vec<usize>,
        base_margin: Vec<f64>,
        objective: Objective,
    ) -> Result<Self, AppError> {
        if trees.len() != tree_groups.len() {
            return Err(AppError::model(format!(
                "Model has {} trees but {} tree group entries.",
                trees.len(),
                tree_groups.len()
            )));
        }
        let expected_groups = match objective {
            Objective::BinaryLogistic | Objective::BinaryLogitRaw => 1,
            Objective::MultiSoftprob => 2,
        };
        if base_margin.len() != expected_groups {
            return Err(AppError::model(format!(
                "Objective {} needs {expected_groups} output group(s), model declares {}.",
                objective.display_name(),
                base_margin.len()
            )));
        }
        if let Some(&bad) = tree_groups.iter().find(|&&g| g >= expected_groups) {
            return Err(AppError::model(format!(
                "Tree assigned to output group {bad}, but the model has {expected_groups} group(s)."
            )));
        }
        if base_margin.iter().any(|m| !m.is_finite()) {
            return Err(AppError::model("Model base score is not finite."));
        }
        Ok(Self {
            trees,
            tree_groups,
            base_margin,
            objective,
        })
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// `(group, tree)` pairs in model order.
    pub fn grouped_trees(&self) -> impl Iterator<Item = (usize, &Tree)> {
        self.tree_groups.iter().copied().zip(self.trees.iter())
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn num_groups(&self) -> usize {
        self.base_margin.len()
    }

    pub fn base_margin(&self) -> &[f64] {
        &self.base_margin
    }

    /// Largest feature index any tree splits on.
    pub fn max_feature(&self) -> Option<usize> {
        self.trees.iter().filter_map(Tree::max_feature).max()
    }

    /// Raw (pre-link) outputs, one per group.
    pub fn predict_margin(&self, x: &[f64]) -> Vec<f64> {
        let mut out = self.base_margin.clone();
        for (group, tree) in self.grouped_trees() {
            out[group] += tree.predict(x);
        }
        out
    }

    /// `[p(class 0), p(class 1)]`.
    pub fn predict_proba(&self, x: &[f64]) -> Result<[f64; 2], AppError> {
        let margin = self.predict_margin(x);
        let proba = match self.objective {
            Objective::BinaryLogistic | Objective::BinaryLogitRaw => {
                let p = sigmoid(margin[0]);
                [1.0 - p, p]
            }
            Objective::MultiSoftprob => softmax2(margin[0], margin[1]),
        };
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(AppError::runtime(format!(
                "Model produced non-finite probabilities from margin {margin:?}."
            )));
        }
        Ok(proba)
    }

    /// Raw output explained for `class_index`.
    ///
    /// Single-output models explain the positive-class log-odds for both classes.
    pub fn class_output(&self, x: &[f64], class_index: usize) -> Result<f64, AppError> {
        let margin = self.predict_margin(x);
        match (self.num_groups(), class_index) {
            (1, 0 | 1) => Ok(margin[0]),
            (n, c) if c < n => Ok(margin[c]),
            (n, c) => Err(AppError::runtime(format!(
                "Class index {c} is out of range for a model with {} classes.",
                n.max(2)
            ))),
        }
    }
}

pub fn sigmoid(m: f64) -> f64 {
    if m >= 0.0 {
        1.0 / (1.0 + (-m).exp())
    } else {
        let e = m.exp();
        e / (1.0 + e)
    }
}

fn softmax2(a: f64, b: f64) -> [f64; 2] {
    let max = a.max(b);
    let ea = (a - max).exp();
    let eb = (b - max).exp();
    let sum = ea + eb;
    [ea / sum, eb / sum]
}

/// Inverse of `sigmoid`, used to turn a probability base score into a margin.
pub fn logit(p: f64) -> Result<f64, AppError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(AppError::model(format!(
            "base_score {p} must lie strictly between 0 and 1 for a logistic objective."
        )));
    }
    Ok((p / (1.0 - p)).ln())
}
