//! Worklist construction of a [`Dfa`] from a combined, tagged root [`Expr`].

use indexmap::IndexMap;
use thiserror::Error;

use residua_core::{CodePointSet, Expr, ExprError, Interner, TokenId};

use crate::dfa::{Dfa, StateId, Transition};

/// Error surfaced by [`DfaBuilder::build`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The expression interner's identity space was exhausted.
    #[error("expression interner overflow during DFA construction")]
    Overflow,
}

impl From<ExprError> for BuildError {
    fn from(e: ExprError) -> Self {
        match e {
            ExprError::Overflow => BuildError::Overflow,
        }
    }
}

/// Knobs for [`DfaBuilder::build`].
#[derive(Clone, Copy, Debug)]
pub struct BuildOptions {
    /// Collapse every state from which no accepting state is reachable into
    /// a single sink state. Defaults to `true`; emitters and tests that want
    /// to inspect the pre-collapse state graph can set this to `false`.
    pub collapse_dead_states: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            collapse_dead_states: true,
        }
    }
}

/// Plain data describing the shape of a just-built [`Dfa`], returned instead
/// of logged for the caller to report however it likes (this crate carries
/// no logging dependency; see `SPEC_FULL.md` §10.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BuildStats {
    /// Number of states in the final (possibly collapsed) DFA.
    pub state_count: usize,
    /// Number of pre-collapse states that were folded into the sink.
    /// Zero when `collapse_dead_states` is `false`.
    pub dead_state_count: usize,
}

/// Constructs a [`Dfa`] by worklist exploration of Brzozowski derivatives.
pub struct DfaBuilder;

impl DfaBuilder {
    /// Build a DFA recognising `root` (typically the canonicalised `Alt` of
    /// every token's `Tag(token_id, expr)`, as produced by
    /// `residua_core::TokenSpecBuilder::resolve`).
    ///
    /// `names` gives each `TokenId`'s source name, in priority order, and is
    /// carried through unchanged onto [`Dfa::token_name`].
    pub fn build(
        interner: &mut Interner,
        root: Expr,
        names: Vec<String>,
        options: BuildOptions,
    ) -> Result<(Dfa, BuildStats), BuildError> {
        // `IndexMap` doubles as both the seen-set and the worklist: inserting
        // an already-seen key is a no-op that returns its existing (stable)
        // index, and new keys are appended, so iterating indices
        // `0..states.len()` while that length keeps growing is exactly a
        // FIFO worklist with no separate queue needed.
        let mut states: IndexMap<Expr, ()> = IndexMap::new();
        states.insert(root, ());

        let mut transitions: Vec<Vec<Transition>> = Vec::new();
        let mut accept: Vec<Option<TokenId>> = Vec::new();

        let mut cursor = 0;
        while cursor < states.len() {
            let e = *states.get_index(cursor).expect("cursor < len").0;
            cursor += 1;

            let parts = interner.alphabet_partition(e);
            let mut row = Vec::with_capacity(parts.len());
            for class in parts {
                let representative = class
                    .min()
                    .expect("alphabet_partition never yields an empty class");
                let next = interner.derivative(e, representative);
                let (next_id, _) = states.insert_full(next, ());
                row.push(Transition {
                    class,
                    target: StateId(next_id as u32),
                });
            }
            // Keep each row in the stable, lexicographic `CodePointSet` order
            // the emitter contract promises, not worklist-iteration order.
            row.sort_unstable_by(|a, b| a.class.cmp(&b.class));
            transitions.push(row);
            accept.push(interner.accepting_token(e));
        }

        let dfa = if options.collapse_dead_states {
            collapse_dead_states(transitions, accept)
        } else {
            RawDfa {
                transitions,
                accept,
                dead_state_count: 0,
            }
        };

        let stats = BuildStats {
            state_count: dfa.transitions.len(),
            dead_state_count: dfa.dead_state_count,
        };
        let dfa = Dfa::from_parts(StateId(0), dfa.transitions, dfa.accept, names);
        Ok((dfa, stats))
    }
}

struct RawDfa {
    transitions: Vec<Vec<Transition>>,
    accept: Vec<Option<TokenId>>,
    dead_state_count: usize,
}

/// Replace every state from which no accepting state is reachable with a
/// single non-accepting sink that self-loops on all of `Σ`.
fn collapse_dead_states(
    transitions: Vec<Vec<Transition>>,
    accept: Vec<Option<TokenId>>,
) -> RawDfa {
    let n = transitions.len();

    // Reverse adjacency: target -> predecessors.
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (from, row) in transitions.iter().enumerate() {
        for t in row {
            preds[t.target.0 as usize].push(from);
        }
    }

    // `live[q]` = true iff some accepting state is reachable from `q`
    // (including `q` itself, by a zero-length path).
    let mut live = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    for (q, label) in accept.iter().enumerate() {
        if label.is_some() {
            live[q] = true;
            stack.push(q);
        }
    }
    while let Some(q) = stack.pop() {
        for &p in &preds[q] {
            if !live[p] {
                live[p] = true;
                stack.push(p);
            }
        }
    }

    let dead_state_count = live.iter().filter(|&&l| !l).count();
    if dead_state_count == 0 {
        return RawDfa {
            transitions,
            accept,
            dead_state_count: 0,
        };
    }

    let mut remap = vec![StateId(0); n];
    let mut next_id = 0u32;
    for (old, &is_live) in live.iter().enumerate() {
        if is_live {
            remap[old] = StateId(next_id);
            next_id += 1;
        }
    }
    let sink = StateId(next_id);
    for (old, &is_live) in live.iter().enumerate() {
        if !is_live {
            remap[old] = sink;
        }
    }

    let mut new_transitions: Vec<Vec<Transition>> = Vec::with_capacity(next_id as usize + 1);
    let mut new_accept: Vec<Option<TokenId>> = Vec::with_capacity(next_id as usize + 1);
    for (old, row) in transitions.into_iter().enumerate() {
        if !live[old] {
            continue;
        }
        let remapped_row = row
            .into_iter()
            .map(|t| Transition {
                class: t.class,
                target: remap[t.target.0 as usize],
            })
            .collect();
        new_transitions.push(remapped_row);
        new_accept.push(accept[old]);
    }
    new_transitions.push(vec![Transition {
        class: CodePointSet::full(),
        target: sink,
    }]);
    new_accept.push(None);

    RawDfa {
        transitions: new_transitions,
        accept: new_accept,
        dead_state_count,
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod builder_tests;
