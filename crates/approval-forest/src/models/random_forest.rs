use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters,
};

use crate::models::classifier_trait::{EnsembleClassifier, TrainedModel};

type DenseTree = DecisionTreeClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Bagged decision trees (smartcore trees, one bootstrap sample per tree).
///
/// The bootstrap masks are kept while fitting so the out-of-bag error only
/// counts votes from trees that did not see a row.
pub struct RandomForestClassifier {
    tree_count: usize,
    seed: Option<u64>,
}

impl RandomForestClassifier {
    pub fn new(tree_count: usize, seed: Option<u64>) -> Self {
        RandomForestClassifier { tree_count, seed }
    }
}

/// A single member of the ensemble. A bootstrap sample holding one class
/// cannot be split, so it becomes a constant vote.
enum Tree {
    Constant(u32),
    Fitted(DenseTree),
}

impl Tree {
    fn predict(&self, x: &DenseMatrix<f64>, n_rows: usize) -> Result<Vec<u32>> {
        match self {
            Tree::Constant(label) => Ok(vec![*label; n_rows]),
            Tree::Fitted(tree) => tree
                .predict(x)
                .map_err(|e| anyhow!("decision tree predict failed: {}", e)),
        }
    }
}

fn rows_to_dense(rows: &[Vec<f64>]) -> DenseMatrix<f64> {
    DenseMatrix::from_2d_vec(&rows.to_vec())
}

/// Majority label of a vote table; ties go to the smallest label.
fn majority(votes: &BTreeMap<u32, usize>) -> Option<u32> {
    votes
        .iter()
        .fold(None, |best: Option<(u32, usize)>, (&label, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}

/// Fraction of rows whose out-of-bag majority vote disagrees with the label.
///
/// Rows that were in every bootstrap sample have no out-of-bag vote and are
/// skipped. When no row received a vote the error is 1.
pub fn out_of_bag_error(votes: &[BTreeMap<u32, usize>], y: &[u32]) -> f64 {
    let (voted, misclassified) = votes
        .iter()
        .zip(y)
        .filter_map(|(row_votes, &label)| majority(row_votes).map(|p| p != label))
        .fold((0usize, 0usize), |(voted, wrong), miss| {
            (voted + 1, wrong + usize::from(miss))
        });
    if voted == 0 {
        return 1.0;
    }
    misclassified as f64 / voted as f64
}

impl EnsembleClassifier for RandomForestClassifier {
    fn fit(&self, x: &Array2<f64>, y: &[u32]) -> Result<Arc<dyn TrainedModel>> {
        let n = y.len();
        if x.nrows() != n {
            return Err(anyhow!(
                "feature matrix has {} rows but {} labels were given",
                x.nrows(),
                n
            ));
        }
        if n == 0 || self.tree_count == 0 {
            return Err(anyhow!(
                "cannot fit {} trees on {} samples",
                self.tree_count,
                n
            ));
        }

        let rows = x.outer_iter().map(|row| row.to_vec()).collect::<Vec<_>>();
        let dense = rows_to_dense(&rows);
        let mut rng = StdRng::seed_from_u64(self.seed.unwrap_or_else(rand::random));

        let mut trees = Vec::with_capacity(self.tree_count);
        let mut votes = vec![BTreeMap::<u32, usize>::new(); n];
        for t in 0..self.tree_count {
            let mut in_bag = vec![false; n];
            let sample = (0..n).map(|_| rng.gen_range(0..n)).collect::<Vec<_>>();
            for &i in &sample {
                in_bag[i] = true;
            }

            let sample_y = sample.iter().map(|&i| y[i]).collect::<Vec<_>>();
            let tree = if sample_y.iter().all(|&l| l == sample_y[0]) {
                Tree::Constant(sample_y[0])
            } else {
                let sample_x = sample.iter().map(|&i| rows[i].clone()).collect::<Vec<_>>();
                let params = DecisionTreeClassifierParameters::default();
                let fitted = DenseTree::fit(&rows_to_dense(&sample_x), &sample_y, params)
                    .map_err(|e| anyhow!("decision tree fit failed: {}", e))
                    .with_context(|| format!("fitting tree {} of {}", t + 1, self.tree_count))?;
                Tree::Fitted(fitted)
            };

            let predictions = tree.predict(&dense, n)?;
            for (i, &p) in predictions.iter().enumerate() {
                if !in_bag[i] {
                    *votes[i].entry(p).or_default() += 1;
                }
            }
            trees.push(tree);
        }

        let oob_error = out_of_bag_error(&votes, y);
        log::debug!(
            "Fitted {} trees on {} samples, out-of-bag error {:.4}",
            self.tree_count,
            n,
            oob_error
        );

        Ok(Arc::new(RandomForestModel {
            trees,
            n_features: x.ncols(),
            oob_error,
        }))
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

pub struct RandomForestModel {
    trees: Vec<Tree>,
    n_features: usize,
    oob_error: f64,
}

impl fmt::Debug for RandomForestModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RandomForestModel")
            .field("trees", &self.trees.len())
            .field("n_features", &self.n_features)
            .field("oob_error", &self.oob_error)
            .finish()
    }
}

impl TrainedModel for RandomForestModel {
    fn predict(&self, row: &[f64]) -> Result<u32> {
        if row.len() != self.n_features {
            return Err(anyhow!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            ));
        }
        let x = rows_to_dense(&[row.to_vec()]);
        let mut votes = BTreeMap::<u32, usize>::new();
        for tree in &self.trees {
            if let Some(&p) = tree.predict(&x, 1)?.first() {
                *votes.entry(p).or_default() += 1;
            }
        }
        majority(&votes).ok_or_else(|| anyhow!("random forest returned no prediction"))
    }

    fn out_of_bag_error(&self) -> f64 {
        self.oob_error
    }
}
