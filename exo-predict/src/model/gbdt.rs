//! Gradient-boosted decision trees for binary classification
//!
//! Logistic loss with second-order (gradient + hessian) split gain and L2
//! regularised leaf weights. Trees grow level by level using an exact greedy
//! search over presorted feature columns.
//!
//! Tree layout is a flat node vector; traversal starts at node 0 and a row
//! goes left when `x[feature] < threshold`.

use super::{ModelError, ProbabilityModel};
use serde::{Deserialize, Serialize};

/// Smallest loss reduction that counts as a split
const MIN_SPLIT_GAIN: f64 = 1e-9;

/// Hessian floor keeping leaf weights finite on saturated predictions
const MIN_HESSIAN: f64 = 1e-16;

/// Boosting hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Maximum tree depth (root is depth 0)
    pub max_depth: usize,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: f64,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Minimum loss reduction required to split
    pub gamma: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
    /// Initial probability before any tree
    pub base_score: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.3,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
            base_score: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Leaf value reached by a feature row
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Reject layouts `predict` cannot walk: children must sit after their
    /// parent and inside the vector, split features inside the row width
    pub fn check_structure(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("node {} has a non-finite leaf value", idx));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} of {}",
                            idx, feature, n_features
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", idx));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} points at child {} (tree has {} nodes)",
                                idx,
                                child,
                                self.nodes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Boosted tree ensemble producing P(positive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    params: BoostingParams,
    n_features: usize,
    base_margin: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedClassifier {
    /// Fit on feature rows and 0/1 labels
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[f64],
        params: &BoostingParams,
    ) -> Result<Self, ModelError> {
        validate(rows, labels, params)?;

        let n_features = rows[0].len();
        let base_margin = logit(params.base_score);
        let presorted = presort(rows, n_features);

        let mut margins = vec![base_margin; rows.len()];
        let mut grad = vec![0.0; rows.len()];
        let mut hess = vec![0.0; rows.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            for i in 0..rows.len() {
                let p = sigmoid(margins[i]);
                grad[i] = p - labels[i];
                hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let tree = TreeBuilder {
                rows,
                grad: &grad,
                hess: &hess,
                presorted: &presorted,
                params,
            }
            .build();

            for (margin, row) in margins.iter_mut().zip(rows) {
                *margin += tree.predict(row);
            }

            tracing::trace!(round, nodes = tree.nodes.len(), "Boosting round complete");
            trees.push(tree);
        }

        Ok(Self {
            params: params.clone(),
            n_features,
            base_margin,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Structural check for a deserialized ensemble
    pub fn check_structure(&self) -> Result<(), ModelError> {
        if !self.base_margin.is_finite() {
            return Err(ModelError::CorruptModel("non-finite base margin".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check_structure(self.n_features)
                .map_err(|reason| ModelError::CorruptModel(format!("tree {}: {}", i, reason)))?;
        }
        Ok(())
    }

    /// Raw additive score before the sigmoid
    pub fn margin(&self, features: &[f64]) -> f64 {
        self.base_margin + self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
    }
}

impl ProbabilityModel for GradientBoostedClassifier {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.margin(features))
    }

    fn family(&self) -> &'static str {
        "gbdt"
    }
}

fn validate(rows: &[Vec<f64>], labels: &[f64], params: &BoostingParams) -> Result<(), ModelError> {
    if rows.is_empty() {
        return Err(ModelError::Training("no training rows".to_string()));
    }
    if rows.len() != labels.len() {
        return Err(ModelError::Training(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    let width = rows[0].len();
    if let Some(bad) = rows.iter().find(|r| r.len() != width) {
        return Err(ModelError::FeatureMismatch {
            expected: width,
            found: bad.len(),
        });
    }
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ModelError::Training("non-finite feature value".to_string()));
    }
    if labels.iter().any(|&y| y != 0.0 && y != 1.0) {
        return Err(ModelError::Training("labels must be 0 or 1".to_string()));
    }
    if !(params.base_score > 0.0 && params.base_score < 1.0) {
        return Err(ModelError::Training("base_score must be in (0, 1)".to_string()));
    }
    Ok(())
}

fn presort(rows: &[Vec<f64>], n_features: usize) -> Vec<Vec<usize>> {
    (0..n_features)
        .map(|f| {
            let mut order: Vec<usize> = (0..rows.len()).collect();
            order.sort_by(|&a, &b| rows[a][f].total_cmp(&rows[b][f]));
            order
        })
        .collect()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Gradient statistics of a node still open for splitting
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    id: usize,
    grad: f64,
    hess: f64,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_grad: f64,
    left_hess: f64,
}

/// Running left-side sums while scanning one feature
#[derive(Debug, Clone, Copy, Default)]
struct Scan {
    grad: f64,
    hess: f64,
    last: Option<f64>,
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    presorted: &'a [Vec<usize>],
    params: &'a BoostingParams,
}

impl TreeBuilder<'_> {
    fn build(self) -> Tree {
        let n = self.rows.len();
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        // Open node each row currently sits in; None once its leaf is final
        let mut node_of: Vec<Option<usize>> = vec![Some(0); n];
        let mut open = vec![OpenNode {
            id: 0,
            grad: self.grad.iter().sum(),
            hess: self.hess.iter().sum(),
        }];

        for _depth in 0..self.params.max_depth {
            if open.is_empty() {
                break;
            }

            let best = self.find_splits(&open, &node_of, nodes.len());

            let mut next_open = Vec::new();
            for (node, candidate) in open.iter().zip(best) {
                match candidate {
                    Some(c) => {
                        let left = nodes.len();
                        let right = left + 1;
                        nodes.push(Node::Leaf { value: 0.0 });
                        nodes.push(Node::Leaf { value: 0.0 });
                        nodes[node.id] = Node::Split {
                            feature: c.feature,
                            threshold: c.threshold,
                            left,
                            right,
                        };
                        next_open.push(OpenNode {
                            id: left,
                            grad: c.left_grad,
                            hess: c.left_hess,
                        });
                        next_open.push(OpenNode {
                            id: right,
                            grad: node.grad - c.left_grad,
                            hess: node.hess - c.left_hess,
                        });
                    }
                    None => nodes[node.id] = self.leaf(node.grad, node.hess),
                }
            }

            for (i, slot) in node_of.iter_mut().enumerate() {
                if let Some(id) = *slot {
                    *slot = match &nodes[id] {
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => Some(if self.rows[i][*feature] < *threshold {
                            *left
                        } else {
                            *right
                        }),
                        Node::Leaf { .. } => None,
                    };
                }
            }

            open = next_open;
        }

        // Depth limit reached: whatever is still open becomes a leaf
        for node in open {
            nodes[node.id] = self.leaf(node.grad, node.hess);
        }

        Tree { nodes }
    }

    /// Best split per open node across all features
    fn find_splits(
        &self,
        open: &[OpenNode],
        node_of: &[Option<usize>],
        node_count: usize,
    ) -> Vec<Option<SplitCandidate>> {
        let mut slot_of = vec![usize::MAX; node_count];
        for (slot, node) in open.iter().enumerate() {
            slot_of[node.id] = slot;
        }

        let mut best: Vec<Option<SplitCandidate>> = vec![None; open.len()];

        for (feature, order) in self.presorted.iter().enumerate() {
            let mut scans = vec![Scan::default(); open.len()];

            for &i in order {
                let Some(id) = node_of[i] else { continue };
                let slot = slot_of[id];
                if slot == usize::MAX {
                    continue;
                }

                let value = self.rows[i][feature];
                let scan = &mut scans[slot];
                if let Some(last) = scan.last {
                    if value > last {
                        let node = &open[slot];
                        let gain = self.gain(node, scan.grad, scan.hess);
                        if gain > MIN_SPLIT_GAIN
                            && best[slot].map_or(true, |b| gain > b.gain)
                        {
                            best[slot] = Some(SplitCandidate {
                                feature,
                                threshold: midpoint(last, value),
                                gain,
                                left_grad: scan.grad,
                                left_hess: scan.hess,
                            });
                        }
                    }
                }
                scan.grad += self.grad[i];
                scan.hess += self.hess[i];
                scan.last = Some(value);
            }
        }

        best
    }

    /// Loss reduction of splitting `node` with the given left-side sums
    fn gain(&self, node: &OpenNode, left_grad: f64, left_hess: f64) -> f64 {
        let right_grad = node.grad - left_grad;
        let right_hess = node.hess - left_hess;
        if left_hess < self.params.min_child_weight || right_hess < self.params.min_child_weight {
            return f64::NEG_INFINITY;
        }
        let lambda = self.params.lambda;
        let score = |g: f64, h: f64| g * g / (h + lambda);
        0.5 * (score(left_grad, left_hess) + score(right_grad, right_hess)
            - score(node.grad, node.hess))
            - self.params.gamma
    }

    fn leaf(&self, grad: f64, hess: f64) -> Node {
        Node::Leaf {
            value: -grad / (hess + self.params.lambda) * self.params.learning_rate,
        }
    }
}

/// Threshold strictly above `low` so `low` always goes left
fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low + (high - low) / 2.0;
    if mid > low {
        mid
    } else {
        high
    }
}
