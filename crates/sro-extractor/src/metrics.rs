//! Quality Metrics module
//!
//! Provides metrics for evaluating extracted triplets against a gold
//! standard: precision, recall, and F1 score.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use sro_core::Triplet;

// ============================================================================
// Triplet Metrics
// ============================================================================

/// Metrics for triplet extraction evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripletMetrics {
    /// True positives (predicted rows found in the gold standard)
    pub true_positives: usize,
    /// False positives (predicted rows not in the gold standard)
    pub false_positives: usize,
    /// False negatives (gold rows never predicted)
    pub false_negatives: usize,
    /// Distinct gold rows
    pub gold_total: usize,
    /// Distinct predicted rows
    pub predicted_total: usize,
}

impl TripletMetrics {
    /// Calculate precision (TP / (TP + FP))
    pub fn precision(&self) -> f32 {
        if self.true_positives + self.false_positives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_positives) as f32
        }
    }

    /// Calculate recall (TP / (TP + FN))
    pub fn recall(&self) -> f32 {
        if self.true_positives + self.false_negatives == 0 {
            0.0
        } else {
            self.true_positives as f32 / (self.true_positives + self.false_negatives) as f32
        }
    }

    /// Calculate F1 score (2 * P * R / (P + R))
    pub fn f1_score(&self) -> f32 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    fn add(&mut self, other: &TripletMetrics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.gold_total += other.gold_total;
        self.predicted_total += other.predicted_total;
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Evaluator for extraction quality
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Only compare subject and object, ignoring the relation text
    ignore_relation: bool,
}

impl Evaluator {
    /// Create an exact-match evaluator
    pub fn new() -> Self {
        Self::default()
    }

    /// Match on (subject, object) pairs only
    pub fn ignoring_relation(mut self) -> Self {
        self.ignore_relation = true;
        self
    }

    fn key(&self, t: &Triplet) -> (String, String, String) {
        let relation = if self.ignore_relation {
            String::new()
        } else {
            t.relation.clone()
        };
        (t.subject.clone(), relation, t.object.clone())
    }

    /// Set-based comparison; duplicate rows count once
    pub fn evaluate(&self, predicted: &[Triplet], gold: &[Triplet]) -> TripletMetrics {
        let predicted_set: HashSet<_> = predicted.iter().map(|t| self.key(t)).collect();
        let gold_set: HashSet<_> = gold.iter().map(|t| self.key(t)).collect();

        let true_positives = predicted_set.intersection(&gold_set).count();

        TripletMetrics {
            true_positives,
            false_positives: predicted_set.len() - true_positives,
            false_negatives: gold_set.len() - true_positives,
            gold_total: gold_set.len(),
            predicted_total: predicted_set.len(),
        }
    }
}

// ============================================================================
// Aggregate Metrics
// ============================================================================

/// Aggregate metrics for a batch of documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub exact: TripletMetrics,
    pub pairs: TripletMetrics,
    pub num_documents: usize,
}

impl AggregateMetrics {
    /// Evaluate one document and fold it into the aggregate
    pub fn add_document(&mut self, predicted: &[Triplet], gold: &[Triplet]) {
        self.exact.add(&Evaluator::new().evaluate(predicted, gold));
        self.pairs
            .add(&Evaluator::new().ignoring_relation().evaluate(predicted, gold));
        self.num_documents += 1;
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        let section = |name: &str, m: &TripletMetrics| {
            format!(
                "{}:\n  \
                   Precision: {:.1}%\n  \
                   Recall:    {:.1}%\n  \
                   F1 Score:  {:.1}%\n  \
                   Gold: {} | Predicted: {} | TP: {} | FP: {} | FN: {}\n",
                name,
                m.precision() * 100.0,
                m.recall() * 100.0,
                m.f1_score() * 100.0,
                m.gold_total,
                m.predicted_total,
                m.true_positives,
                m.false_positives,
                m.false_negatives,
            )
        };

        format!(
            "=== Triplet Quality Report ===\n\nDocuments evaluated: {}\n\n{}\n{}",
            self.num_documents,
            section("Exact triplets", &self.exact),
            section("Subject-object pairs", &self.pairs),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
