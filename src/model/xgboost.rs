//! XGBoost JSON model loading.
//!
//! Reads the native JSON format written by `Booster.save_model("*.json")`
//! (XGBoost 1.x through 3.x). Only the parts needed for inference and exact
//! tree attribution are parsed; unknown fields are ignored.
//!
//! Supported:
//! - boosters `gbtree` and `dart` (dart weights are folded into leaf values)
//! - objectives `binary:logistic`, `reg:logistic`, `binary:logitraw`,
//!   `multi:softprob` / `multi:softmax` with two classes
//! - numerical splits only

use std::path::Path;

use serde::Deserialize;

use crate::domain::FeatureSchema;
use crate::error::AppError;
use crate::model::forest::{Forest, Objective, logit};
use crate::model::tree::{Node, Tree};

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveSection,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "name")]
enum GradientBooster {
    #[serde(rename = "gbtree")]
    GbTree { model: TreeModel },
    #[serde(rename = "dart")]
    Dart {
        gbtree: DartTrees,
        weight_drop: Vec<f64>,
    },
}

#[derive(Debug, Deserialize)]
struct DartTrees {
    model: TreeModel,
}

#[derive(Debug, Deserialize)]
struct TreeModel {
    trees: Vec<TreeJson>,
    tree_info: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    sum_hessian: Vec<f64>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// `default_left` is written as 0/1 integers by newer releases and as booleans
/// by some older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct ObjectiveSection {
    name: String,
}

/// Load and validate a model file against the feature schema.
pub fn load_forest(path: &Path, schema: &FeatureSchema) -> Result<Forest, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::model(format!("Failed to read model file '{}': {e}", path.display()))
    })?;
    parse_forest(&text, schema)
        .map_err(|e| AppError::model(format!("Invalid model file '{}': {e}", path.display())))
}

/// Parse a model from JSON text and validate it against the feature schema.
pub fn parse_forest(json: &str, schema: &FeatureSchema) -> Result<Forest, AppError> {
    let file: ModelFile = serde_json::from_str(json)
        .map_err(|e| AppError::model(format!("not an XGBoost JSON model: {e}")))?;
    let learner = file.learner;

    check_feature_alignment(&learner, schema)?;

    let (trees_json, weights) = match learner.gradient_booster {
        GradientBooster::GbTree { model } => (model, None),
        GradientBooster::Dart { gbtree, weight_drop } => (gbtree.model, Some(weight_drop)),
    };
    if trees_json.trees.is_empty() {
        return Err(AppError::model("model contains no trees"));
    }

    let mut trees = trees_json
        .trees
        .iter()
        .enumerate()
        .map(|(i, t)| convert_tree(t).map_err(|e| AppError::model(format!("tree {i}: {e}"))))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(weights) = weights {
        if weights.len() != trees.len() {
            return Err(AppError::model(format!(
                "dart model has {} trees but {} tree weights",
                trees.len(),
                weights.len()
            )));
        }
        for (tree, w) in trees.iter_mut().zip(weights) {
            tree.scale_leaves(w);
        }
    }

    let objective = resolve_objective(&learner.objective.name)?;
    let num_class = parse_count(learner.learner_model_param.num_class.as_deref().unwrap_or("0"), "num_class")?;
    match objective {
        Objective::MultiSoftprob if num_class != 2 => {
            return Err(AppError::model(format!(
                "expected a two-class model, found num_class={num_class}"
            )));
        }
        Objective::BinaryLogistic | Objective::BinaryLogitRaw if num_class > 1 => {
            return Err(AppError::model(format!(
                "objective {} cannot have num_class={num_class}",
                learner.objective.name
            )));
        }
        _ => {}
    }

    let base_scores = parse_base_score(&learner.learner_model_param.base_score)?;
    let groups = if objective == Objective::MultiSoftprob { 2 } else { 1 };
    let base_margin = broadcast(base_scores, groups)?
        .into_iter()
        .map(|s| match objective {
            // Both logistic objectives store base_score as a probability.
            Objective::BinaryLogistic | Objective::BinaryLogitRaw => logit(s),
            Objective::MultiSoftprob => Ok(s),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let forest = Forest::new(trees, trees_json.tree_info, base_margin, objective)?;
    if let Some(max) = forest.max_feature() {
        if max >= schema.len() {
            return Err(AppError::model(format!(
                "a tree splits on feature index {max}, but the schema has {} features",
                schema.len()
            )));
        }
    }

    log::debug!(
        "parsed XGBoost model (version {:?}): {} trees, objective {}",
        file.version,
        forest.trees().len(),
        objective.display_name()
    );
    Ok(forest)
}

fn check_feature_alignment(learner: &Learner, schema: &FeatureSchema) -> Result<(), AppError> {
    let num_feature = parse_count(&learner.learner_model_param.num_feature, "num_feature")?;
    if num_feature != schema.len() {
        return Err(AppError::model(format!(
            "model expects {num_feature} features, the schema defines {}",
            schema.len()
        )));
    }
    if learner.feature_names.is_empty() {
        log::warn!("model carries no feature names; assuming training order matches the schema");
        return Ok(());
    }
    if learner.feature_names.as_slice() != schema.names() {
        let first_diff = learner
            .feature_names
            .iter()
            .zip(schema.names())
            .position(|(a, b)| a != b)
            .unwrap_or(learner.feature_names.len().min(schema.len()));
        return Err(AppError::model(format!(
            "feature order mismatch at position {first_diff}: model has {:?}, schema has {:?}",
            learner.feature_names.get(first_diff),
            schema.name(first_diff)
        )));
    }
    Ok(())
}

fn convert_tree(t: &TreeJson) -> Result<Tree, AppError> {
    let n = t.left_children.len();
    let lens = [
        t.right_children.len(),
        t.split_indices.len(),
        t.split_conditions.len(),
        t.default_left.len(),
        t.sum_hessian.len(),
    ];
    if lens.iter().any(|&l| l != n) {
        return Err(AppError::model(format!(
            "node arrays disagree in length (left_children={n}, others={lens:?})"
        )));
    }
    if !t.split_type.is_empty() && t.split_type.len() != n {
        return Err(AppError::model("split_type length disagrees with node count"));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let cover = t.sum_hessian[i];
        let (left, right) = (t.left_children[i], t.right_children[i]);
        if left < 0 {
            if right >= 0 {
                return Err(AppError::model(format!("node {i} has only a right child")));
            }
            nodes.push(Node::Leaf {
                value: f64::from(t.split_conditions[i]),
                cover,
            });
            continue;
        }
        if right < 0 {
            return Err(AppError::model(format!("node {i} has only a left child")));
        }
        if t.split_type.get(i).copied().unwrap_or(0) != 0 {
            return Err(AppError::model(format!("node {i} uses a categorical split (unsupported)")));
        }
        let feature = usize::try_from(t.split_indices[i])
            .map_err(|_| AppError::model(format!("node {i} has negative split index")))?;
        nodes.push(Node::Split {
            feature,
            threshold: t.split_conditions[i],
            default_left: t.default_left[i].is_set(),
            left: left as usize,
            right: right as usize,
            cover,
        });
    }
    Tree::new(nodes)
}

fn resolve_objective(name: &str) -> Result<Objective, AppError> {
    match name {
        "binary:logistic" | "reg:logistic" => Ok(Objective::BinaryLogistic),
        "binary:logitraw" => Ok(Objective::BinaryLogitRaw),
        "multi:softprob" | "multi:softmax" => Ok(Objective::MultiSoftprob),
        other => Err(AppError::model(format!(
            "unsupported objective '{other}' (expected a binary classifier)"
        ))),
    }
}

fn parse_count(raw: &str, field: &str) -> Result<usize, AppError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| AppError::model(format!("invalid {field} '{raw}': {e}")))
}

/// `"5E-1"`, `"[5E-1]"` and `"[0,0]"` are all valid encodings.
fn parse_base_score(raw: &str) -> Result<Vec<f64>, AppError> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let values = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| AppError::model(format!("invalid base_score '{raw}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err(AppError::model(format!("empty base_score '{raw}'")));
    }
    Ok(values)
}

fn broadcast(values: Vec<f64>, groups: usize) -> Result<Vec<f64>, AppError> {
    match values.len() {
        1 => Ok(vec![values[0]; groups]),
        n if n == groups => Ok(values),
        n => Err(AppError::model(format!(
            "base_score has {n} entries for {groups} output group(s)"
        ))),
    }
}
