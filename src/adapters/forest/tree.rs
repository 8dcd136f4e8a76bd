//! CART decision tree with Gini impurity.
//!
//! Nodes are stored in a flat arena. Samples with `x[feature] <= threshold`
//! go left. Leaves hold the class distribution of the training samples that
//! reached them, already normalised to probabilities.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Weighted child impurity, lower is better
    impurity: f64,
}

/// Training inputs shared by every node of one tree.
struct FitContext<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    params: TreeParams,
}

/// A fitted classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    /// Total weighted impurity decrease per feature
    importances: Vec<f64>,
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &i in indices {
        counts[y[i]] += 1;
    }
    counts
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` selected by `indices`.
    ///
    /// `y` holds class indices in `0..n_classes`. Indices may repeat
    /// (bootstrap samples).
    pub(crate) fn fit<R: Rng + ?Sized>(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        mut indices: Vec<usize>,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        let mut tree = Self {
            nodes: Vec::new(),
            n_features,
            importances: vec![0.0; n_features],
        };
        let ctx = FitContext {
            x,
            y,
            n_classes,
            params,
        };
        tree.grow(&ctx, &mut indices, 0, rng);
        tree
    }

    fn push_leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let proba = if total == 0 {
            vec![1.0 / counts.len().max(1) as f64; counts.len()]
        } else {
            counts.iter().map(|&c| c as f64 / total as f64).collect()
        };
        self.nodes.push(Node::Leaf { proba });
        self.nodes.len() - 1
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        ctx: &FitContext<'_>,
        indices: &mut [usize],
        depth: usize,
        rng: &mut R,
    ) -> usize {
        let n = indices.len();
        let counts = class_counts(ctx.y, indices, ctx.n_classes);
        let impurity = gini(&counts, n);

        let p = ctx.params;
        if depth >= p.max_depth
            || n < p.min_samples_split
            || n < 2 * p.min_samples_leaf
            || impurity <= f64::EPSILON
        {
            return self.push_leaf(&counts, n);
        }

        let Some(split) = Self::best_split(ctx, indices, impurity, rng) else {
            return self.push_leaf(&counts, n);
        };

        // Partition in place: left block first.
        let mut boundary = 0;
        for k in 0..n {
            if ctx.x[indices[k]][split.feature] <= split.threshold {
                indices.swap(boundary, k);
                boundary += 1;
            }
        }

        self.importances[split.feature] += n as f64 * (impurity - split.impurity);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });

        let (left_idx, right_idx) = indices.split_at_mut(boundary);
        let left = self.grow(ctx, left_idx, depth + 1, rng);
        let right = self.grow(ctx, right_idx, depth + 1, rng);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Search a random subset of features for the best impurity decrease.
    ///
    /// Features are visited in random order. Constant features do not count
    /// towards `max_features`, and the search keeps going past
    /// `max_features` while no valid split has been found.
    fn best_split<R: Rng + ?Sized>(
        ctx: &FitContext<'_>,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut R,
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let min_leaf = ctx.params.min_samples_leaf.max(1);

        let mut features: Vec<usize> = (0..ctx.x[indices[0]].len()).collect();
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

        for feature in features {
            if visited >= ctx.params.max_features && best.is_some() {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (ctx.x[i][feature], ctx.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            if column[0].0 >= column[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left = vec![0usize; ctx.n_classes];
            let mut right = class_counts(ctx.y, indices, ctx.n_classes);

            for k in 1..n {
                let class = column[k - 1].1;
                left[class] += 1;
                right[class] -= 1;

                let (lo, hi) = (column[k - 1].0, column[k].0);
                if lo >= hi || k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let weighted = (k as f64 * gini(&left, k)
                    + (n - k) as f64 * gini(&right, n - k))
                    / n as f64;
                if weighted >= parent_impurity {
                    continue;
                }
                if best.map_or(true, |b| weighted < b.impurity) {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid >= hi { lo } else { mid };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity: weighted,
                    });
                }
            }
        }

        best
    }

    /// Class distribution of the leaf `x` falls into.
    pub(crate) fn leaf_proba(&self, x: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Impurity-based importances normalised to sum to one.
    ///
    /// All zeros for a tree that never split.
    pub(crate) fn normalized_importances(&self) -> Vec<f64> {
        let total: f64 = self.importances.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.n_features];
        }
        self.importances.iter().map(|v| v / total).collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Structural sanity check used after deserialization.
    pub(crate) fn validate(&self, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { proba } => {
                    if proba.len() != n_classes {
                        return Err(format!(
                            "leaf {id} has {} classes, expected {n_classes}",
                            proba.len()
                        ));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    // Children are always pushed after their parent.
                    if *feature >= self.n_features
                        || *left <= id
                        || *right <= id
                        || *left >= self.nodes.len()
                        || *right >= self.nodes.len()
                    {
                        return Err(format!("split node {id} is malformed"));
                    }
                }
            }
        }
        Ok(())
    }
}
