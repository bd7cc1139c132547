//! Random Forest Classifier
//!
//! CART trees (Gini impurity) grown on bootstrap samples with per-split
//! feature subsampling. Class probabilities are the mean of the per-tree
//! leaf class distributions.
//!
//! Training is fully deterministic: tree `i` draws from a `StdRng` seeded
//! with `seed + i`, split search visits candidates in a fixed order, and the
//! first best split wins on ties.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::logic::features::FEATURE_COUNT;
use super::classes::CLASS_COUNT;

/// Probabilities indexed by class
pub type ClassProbabilities = [f64; CLASS_COUNT];

// ============================================================================
// CONFIG
// ============================================================================

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features tried per split; `None` means `floor(sqrt(FEATURE_COUNT))`
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    fn effective_max_features(&self) -> usize {
        self.max_features
            .unwrap_or_else(|| (FEATURE_COUNT as f64).sqrt().floor() as usize)
            .clamp(1, FEATURE_COUNT)
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForestError {
    #[error("training data is empty")]
    EmptyDataset,

    #[error("{samples} samples but {targets} targets")]
    ShapeMismatch { samples: usize, targets: usize },

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("malformed tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },
}

// ============================================================================
// TREE
// ============================================================================

/// Tree node; children always sit after their parent in `nodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: ClassProbabilities,
    },
}

/// A single decision tree stored as a flat arena, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Leaf distribution reached by `x`
    pub fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> ClassProbabilities {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return *distribution,
                Node::Split { feature, threshold, left, right } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Structural checks so traversal can neither panic nor loop
    fn check(&self, tree: usize) -> Result<(), ForestError> {
        let malformed = |reason: String| ForestError::MalformedTree { tree, reason };

        if self.nodes.is_empty() {
            return Err(malformed("no nodes".into()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(malformed(format!("node {index} splits on feature {feature}")));
                    }
                    if !threshold.is_finite() {
                        return Err(malformed(format!("node {index} has a non-finite threshold")));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(malformed(format!("node {index} points to {child}")));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    let sum: f64 = distribution.iter().sum();
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) || (sum - 1.0).abs() > 1e-6 {
                        return Err(malformed(format!("leaf {index} is not a distribution")));
                    }
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// FOREST
// ============================================================================

/// Trained ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

/// Output of `RandomForest::fit`
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub forest: RandomForest,
    /// Mean decrease in impurity, normalized to sum to 1
    pub feature_importances: [f64; FEATURE_COUNT],
}

impl RandomForest {
    /// Grow a forest on `(n_samples, FEATURE_COUNT)` features
    pub fn fit(x: &Array2<f64>, y: &[usize], config: &TrainingConfig) -> Result<FitOutput, ForestError> {
        if x.nrows() == 0 {
            return Err(ForestError::EmptyDataset);
        }
        if x.nrows() != y.len() {
            return Err(ForestError::ShapeMismatch { samples: x.nrows(), targets: y.len() });
        }
        if x.ncols() != FEATURE_COUNT {
            return Err(ForestError::InvalidConfig(format!(
                "expected {} feature columns, got {}",
                FEATURE_COUNT,
                x.ncols()
            )));
        }
        if config.n_estimators == 0 {
            return Err(ForestError::InvalidConfig("n_estimators must be at least 1".into()));
        }
        if config.min_samples_split < 2 {
            return Err(ForestError::InvalidConfig("min_samples_split must be at least 2".into()));
        }
        if let Some(&bad) = y.iter().find(|&&t| t >= CLASS_COUNT) {
            return Err(ForestError::InvalidConfig(format!("target {bad} out of range")));
        }

        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut importances = [0.0; FEATURE_COUNT];

        for tree_index in 0..config.n_estimators {
            let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree_index as u64));
            let n = x.nrows();
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

            let mut builder = TreeBuilder {
                x,
                y,
                config,
                max_features: config.effective_max_features(),
                rng,
                nodes: Vec::new(),
                importances: [0.0; FEATURE_COUNT],
                total_samples: bootstrap.len() as f64,
            };
            builder.build(&bootstrap, 0);

            let total: f64 = builder.importances.iter().sum();
            if total > 0.0 {
                for (acc, imp) in importances.iter_mut().zip(builder.importances.iter()) {
                    *acc += imp / total;
                }
            }

            trees.push(DecisionTree { nodes: builder.nodes });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in importances.iter_mut() {
                *imp /= total;
            }
        }

        log::debug!("Random forest trained: {} trees, max depth {:?}", trees.len(), config.max_depth);

        Ok(FitOutput {
            forest: RandomForest { trees },
            feature_importances: importances,
        })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean of per-tree class distributions
    pub fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> ClassProbabilities {
        let mut sum = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            let dist = tree.predict_proba(x);
            for (acc, p) in sum.iter_mut().zip(dist.iter()) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        sum.map(|s| s / n)
    }

    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> usize {
        argmax(&self.predict_proba(x))
    }

    /// Mean accuracy on already-scaled samples
    pub fn score(&self, x: &Array2<f64>, y: &[usize]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let correct = x
            .rows()
            .into_iter()
            .zip(y.iter())
            .filter(|(row, target)| self.predict(&row_array(row.view())) == **target)
            .count();
        correct as f64 / y.len() as f64
    }

    /// Reject forests that could panic or loop during traversal
    pub fn check(&self) -> Result<(), ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::InvalidConfig("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(i)?;
        }
        Ok(())
    }
}

/// Index of the highest probability; ties go to the lowest index
pub fn argmax(probabilities: &[f64]) -> usize {
    let mut best = 0;
    for (i, p) in probabilities.iter().enumerate().skip(1) {
        if *p > probabilities[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn row_array(row: ArrayView1<'_, f64>) -> [f64; FEATURE_COUNT] {
    let mut out = [0.0; FEATURE_COUNT];
    for (dst, src) in out.iter_mut().zip(row.iter()) {
        *dst = *src;
    }
    out
}

// ============================================================================
// TREE BUILDER
// ============================================================================

struct Split {
    feature: usize,
    threshold: f64,
    /// n_left * gini_left + n_right * gini_right
    weighted_impurity: f64,
}

struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    config: &'a TrainingConfig,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
    total_samples: f64,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `samples` and return its root index
    fn build(&mut self, samples: &[usize], depth: usize) -> usize {
        let index = self.nodes.len();
        let counts = self.class_counts(samples);
        let n = samples.len() as f64;
        let impurity = gini(&counts, n);

        let depth_reached = self.config.max_depth.map_or(false, |max| depth >= max);
        if depth_reached || samples.len() < self.config.min_samples_split || impurity <= 0.0 {
            self.nodes.push(leaf(&counts, n));
            return index;
        }

        let Some(split) = self.best_split(samples) else {
            self.nodes.push(leaf(&counts, n));
            return index;
        };

        self.importances[split.feature] += (n * impurity - split.weighted_impurity) / self.total_samples;

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .copied()
            .partition(|&s| self.x[[s, split.feature]] <= split.threshold);

        // Placeholder until both children exist
        self.nodes.push(leaf(&counts, n));
        let left = self.build(&left_samples, depth + 1);
        let right = self.build(&right_samples, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        index
    }

    /// Try `max_features` random features; keep drawing if none of them can split
    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<Split> = None;
        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_split_on(samples, feature) {
                let better = best
                    .as_ref()
                    .map_or(true, |b| candidate.weighted_impurity < b.weighted_impurity);
                if better {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_split_on(&self, samples: &[usize], feature: usize) -> Option<Split> {
        let mut points: Vec<(f64, usize)> = samples
            .iter()
            .map(|&s| (self.x[[s, feature]], self.y[s]))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = points.len();
        let mut left = [0usize; CLASS_COUNT];
        let mut right = [0usize; CLASS_COUNT];
        for &(_, class) in &points {
            right[class] += 1;
        }

        let mut best: Option<Split> = None;
        for i in 0..n - 1 {
            let (value, class) = points[i];
            left[class] += 1;
            right[class] -= 1;

            let next = points[i + 1].0;
            if next <= value {
                continue;
            }

            let n_left = (i + 1) as f64;
            let n_right = (n - i - 1) as f64;
            let weighted = n_left * gini(&left, n_left) + n_right * gini(&right, n_right);

            if best.as_ref().map_or(true, |b| weighted < b.weighted_impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Split { feature, threshold, weighted_impurity: weighted });
            }
        }
        best
    }

    fn class_counts(&self, samples: &[usize]) -> [usize; CLASS_COUNT] {
        let mut counts = [0; CLASS_COUNT];
        for &s in samples {
            counts[self.y[s]] += 1;
        }
        counts
    }
}

fn gini(counts: &[usize; CLASS_COUNT], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn leaf(counts: &[usize; CLASS_COUNT], n: f64) -> Node {
    Node::Leaf {
        distribution: counts.map(|c| c as f64 / n),
    }
}

// ============================================================================
// TESTS
// ============================================================================
