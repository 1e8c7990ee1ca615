use std::collections::HashSet;

use tracing::trace;

use crate::error::{Result, WorkflowError};

use super::{AnalyzerConfig, ResetNet};

/// Transition with place references renumbered to the alive places of a [`ResetNet`].
struct CompactTransition {
    preset: Vec<usize>,
    postset: Vec<usize>,
    resets: Vec<usize>,
}

impl CompactTransition {
    /// Smallest marking from which firing this transition covers `marking`.
    ///
    /// Firing consumes the preset, produces the postset and then empties the reset places, so
    /// reset places must be empty in `marking` for this transition to be fired backwards. A reset
    /// place then only needs the token the preset consumes.
    fn predecessor(&self, marking: &[u32]) -> Option<Vec<u32>> {
        if self.resets.iter().any(|&p| marking[p] > 0) {
            return None;
        }
        let mut previous = marking.to_vec();
        for &p in &self.postset {
            previous[p] = previous[p].saturating_sub(1);
        }
        for &p in &self.preset {
            previous[p] += 1;
        }
        Some(previous)
    }
}

/// Backward coverability search on a restricted reset net.
pub(crate) struct Coverability<'a> {
    compact_index: Vec<Option<usize>>,
    transitions: Vec<CompactTransition>,
    source: Vec<u32>,
    config: &'a AnalyzerConfig,
}

fn leq(a: &[u32], b: &[u32]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y)
}

impl<'a> Coverability<'a> {
    /// `source` holds a token count for every place of the original workflow net.
    pub(crate) fn new(net: &ResetNet, source: &[u32], config: &'a AnalyzerConfig) -> Self {
        let mut compact_index = vec![None; net.places().len()];
        let mut compact_source = Vec::new();
        for (compact, idx) in net.alive_places().enumerate() {
            compact_index[idx] = Some(compact);
            // busy places are never marked: firings are atomic
            compact_source.push(source.get(idx).copied().unwrap_or(0));
        }
        let remap = |places: &[usize]| -> Vec<usize> {
            places.iter().filter_map(|&p| compact_index[p]).collect()
        };
        let transitions = net
            .transitions()
            .iter()
            .map(|tr| CompactTransition {
                preset: remap(tr.preset()),
                postset: remap(tr.postset()),
                resets: remap(tr.resets()),
            })
            .collect();
        Coverability { compact_index, transitions, source: compact_source, config }
    }

    /// Is some marking covering one token on each of `target` reachable from the source?
    ///
    /// `target` lists reset net place indices. Computes the minimal basis of backward reachable
    /// markings and stops as soon as one of them is covered by the source.
    pub(crate) fn is_coverable(&self, target: &[usize]) -> Result<bool> {
        let mut goal = vec![0u32; self.source.len()];
        for &p in target {
            match self.compact_index.get(p).copied().flatten() {
                Some(compact) => goal[compact] = 1,
                // dropped by restriction: nothing can put a token there
                None => return Ok(false),
            }
        }
        if leq(&goal, &self.source) {
            return Ok(true);
        }

        let mut basis: Vec<Vec<u32>> = vec![goal.clone()];
        let mut frontier: Vec<Vec<u32>> = vec![goal];
        let mut considered: HashSet<Vec<u32>> = HashSet::new();
        let mut iterations = 0usize;

        while !frontier.is_empty() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                return Err(WorkflowError::Complexity(format!(
                    "Coverability search did not converge within {} iterations",
                    self.config.max_iterations
                )));
            }

            let mut candidates: Vec<Vec<u32>> = Vec::new();
            for marking in frontier.drain(..) {
                if !considered.insert(marking.clone()) {
                    continue;
                }
                for tr in &self.transitions {
                    if let Some(previous) = tr.predecessor(&marking) {
                        if !leq(&marking, &previous) {
                            candidates.push(previous);
                        }
                    }
                }
            }

            let mut next = Vec::new();
            for candidate in minimal(candidates) {
                if leq(&candidate, &self.source) {
                    trace!(iterations, basis = basis.len(), "Target is coverable.");
                    return Ok(true);
                }
                if basis.iter().any(|known| leq(known, &candidate)) {
                    continue;
                }
                basis.retain(|known| !leq(&candidate, known));
                basis.push(candidate.clone());
                next.push(candidate);
                if basis.len() > self.config.max_basis_size {
                    return Err(WorkflowError::Complexity(format!(
                        "Predecessor basis grew beyond {} markings",
                        self.config.max_basis_size
                    )));
                }
            }
            next.retain(|marking| basis.contains(marking));
            frontier = next;
            trace!(iterations, basis = basis.len(), frontier = frontier.len(), "Backward step.");
        }
        Ok(false)
    }
}

/// Remove duplicates and every marking covering another one.
fn minimal(mut markings: Vec<Vec<u32>>) -> Vec<Vec<u32>> {
    markings.sort_unstable();
    markings.dedup();
    let mut result: Vec<Vec<u32>> = Vec::with_capacity(markings.len());
    for marking in markings {
        if result.iter().any(|kept| leq(kept, &marking)) {
            continue;
        }
        result.retain(|kept| !leq(&marking, kept));
        result.push(marking);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_keeps_antichain() {
        let result = minimal(vec![vec![1, 1], vec![0, 1], vec![1, 0], vec![0, 1], vec![2, 2]]);
        assert_eq!(result, vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn predecessor_with_resets() {
        let tr = CompactTransition { preset: vec![0], postset: vec![1, 2], resets: vec![2, 3] };
        // token required on a place emptied by the firing
        assert!(tr.predecessor(&[0, 1, 1, 0]).is_none());
        assert_eq!(tr.predecessor(&[0, 2, 0, 0]).unwrap(), vec![1, 1, 0, 0]);

        let consuming_reset = CompactTransition { preset: vec![0], postset: vec![1], resets: vec![0] };
        assert_eq!(consuming_reset.predecessor(&[0, 1]).unwrap(), vec![1, 0]);
    }
}
