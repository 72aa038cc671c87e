use crate::compose::estimated_length;
use tracing::debug;

/// A maximal run of fragments packed together under the length budget.
/// Sealed once the next fragment would overflow; fragments are never
/// reordered or split across batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBatch {
    fragments: Vec<String>,
}

impl PostBatch {
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Rendered batch text, fragments joined by single newlines.
    pub fn text(&self) -> String {
        self.fragments.join("\n")
    }
}

/// Greedily pack `fragments` into the minimum number of batches whose
/// estimated length stays within `budget`. Single pass, no backtracking,
/// deterministic. A fragment that alone exceeds the budget still gets its
/// own batch; callers are expected to keep fragments individually short.
pub fn pack(fragments: &[String], budget: usize) -> Vec<PostBatch> {
    let mut batches = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_text = String::new();

    for fragment in fragments {
        let candidate = if current.is_empty() {
            fragment.clone()
        } else {
            format!("{}\n{}", current_text, fragment)
        };

        if estimated_length(&candidate) <= budget || current.is_empty() {
            current.push(fragment.clone());
            current_text = candidate;
        } else {
            batches.push(PostBatch { fragments: current });
            current = vec![fragment.clone()];
            current_text = fragment.clone();
        }
    }

    if !current.is_empty() {
        batches.push(PostBatch { fragments: current });
    }

    debug!("Packed {} fragments into {} batches", fragments.len(), batches.len());

    batches
}
