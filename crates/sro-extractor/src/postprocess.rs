//! Post-Processor module
//!
//! Whole-collection passes run after every sentence of a document has been
//! processed: subject merging, subject/object frequency pruning, and
//! self-loop pruning. Each pass preserves row order.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sro_core::{PostProcessConfig, Triplet};

use crate::span::collapse_whitespace;

// ============================================================================
// Passes
// ============================================================================

/// Fold extended subjects into their lexicographic predecessor.
///
/// Distinct subjects are walked in sorted order with a cursor. A subject
/// containing the cursor is rewritten to the cursor and the remainder is
/// prepended to its relation; any other subject becomes the new cursor.
/// Only the immediate cursor is compared, so merging is not transitive.
/// Returns the number of rows rewritten.
pub fn merge_subjects(triplets: &mut [Triplet]) -> usize {
    let subjects: BTreeSet<&str> = triplets.iter().map(|t| t.subject.as_str()).collect();
    let mut sorted = subjects.into_iter();
    let Some(mut cursor) = sorted.next() else {
        return 0;
    };

    let mut rewrites: HashMap<String, (String, String)> = HashMap::new();
    for subject in sorted {
        if subject.contains(cursor) {
            let extension = collapse_whitespace([subject.replace(cursor, "")]);
            debug!(subject, base = cursor, extension = %extension, "Merging subject");
            rewrites.insert(subject.to_string(), (cursor.to_string(), extension));
        } else {
            cursor = subject;
        }
    }

    let mut rewritten = 0;
    for triplet in triplets.iter_mut() {
        if let Some((base, extension)) = rewrites.get(&triplet.subject) {
            if !extension.is_empty() {
                triplet.relation = format!("{} {}", extension, triplet.relation);
            }
            triplet.subject = base.clone();
            rewritten += 1;
        }
    }
    rewritten
}

/// Drop rows whose subject occurs fewer than `threshold` times
pub fn prune_infrequent_subjects(triplets: &mut Vec<Triplet>, threshold: usize) -> usize {
    prune_by_count(triplets, threshold, |t| t.subject.as_str())
}

/// Drop rows whose object occurs fewer than `threshold` times
pub fn prune_infrequent_objects(triplets: &mut Vec<Triplet>, threshold: usize) -> usize {
    prune_by_count(triplets, threshold, |t| t.object.as_str())
}

fn prune_by_count<F>(triplets: &mut Vec<Triplet>, threshold: usize, key: F) -> usize
where
    F: Fn(&Triplet) -> &str,
{
    let counts: HashMap<String, usize> =
        triplets.iter().fold(HashMap::new(), |mut counts, t| {
            *counts.entry(key(t).to_string()).or_insert(0) += 1;
            counts
        });

    let before = triplets.len();
    triplets.retain(|t| counts.get(key(t)).copied().unwrap_or(0) >= threshold);
    before - triplets.len()
}

/// Drop rows whose subject equals their object
pub fn prune_self_loops(triplets: &mut Vec<Triplet>) -> usize {
    let before = triplets.len();
    triplets.retain(|t| !t.is_self_loop());
    before - triplets.len()
}

// ============================================================================
// Post-Processor
// ============================================================================

/// What each pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessReport {
    pub subjects_merged: usize,
    pub infrequent_subjects: usize,
    pub infrequent_objects: usize,
    pub self_loops: usize,
}

impl PostProcessReport {
    /// Rows removed by all passes
    pub fn rows_removed(&self) -> usize {
        self.infrequent_subjects + self.infrequent_objects + self.self_loops
    }
}

/// Runs the configured passes in their fixed order
#[derive(Debug, Clone, Default)]
pub struct PostProcessor {
    config: PostProcessConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    /// Merge first, since it changes which strings are counted
    pub fn run(&self, triplets: &mut Vec<Triplet>) -> PostProcessReport {
        let mut report = PostProcessReport::default();
        if triplets.is_empty() {
            return report;
        }

        if self.config.merge_subjects {
            report.subjects_merged = merge_subjects(triplets);
        }
        report.infrequent_subjects =
            prune_infrequent_subjects(triplets, self.config.subject_threshold);
        report.infrequent_objects =
            prune_infrequent_objects(triplets, self.config.object_threshold);
        if self.config.prune_self_loops {
            report.self_loops = prune_self_loops(triplets);
        }

        info!(
            merged = report.subjects_merged,
            removed = report.rows_removed(),
            remaining = triplets.len(),
            "Post-processing complete"
        );
        report
    }
}

// ============================================================================
// Tests
// ============================================================================
