//! The compiled [`Dfa`] artifact and a reference maximal-munch scanner.

use std::fmt::Write as _;

use thiserror::Error;

use residua_core::{CodePointSet, TokenId};

/// Index of a state within a [`Dfa`]'s transition table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StateId(pub u32);

/// One outgoing edge: code points in `class` step to `target`. A state's
/// transition row partitions all of `Σ`, so exactly one `Transition` per row
/// matches any given code point.
#[derive(Clone, Debug)]
pub struct Transition {
    pub class: CodePointSet,
    pub target: StateId,
}

/// A minimal, total DFA over `char`, labelled with the highest-priority
/// [`TokenId`] accepted at each state.
///
/// Built by [`crate::builder::DfaBuilder::build`]; immutable once produced.
/// Every state has a transition row that partitions the full code-point
/// range, so [`Dfa::step`] never fails to find an edge.
#[derive(Clone, Debug)]
pub struct Dfa {
    start: StateId,
    transitions: Vec<Vec<Transition>>,
    accept: Vec<Option<TokenId>>,
    token_names: Vec<String>,
}

/// Error raised by [`Dfa::scan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ScanError {
    /// No token could be matched starting at `position` (byte offset into
    /// the scanned text), and the input was not yet exhausted.
    #[error("no token matched at byte offset {position} (code point {code_point:#x})")]
    UnmatchedInput { position: usize, code_point: u32 },
}

/// One maximal-munch token produced by [`Dfa::scan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub token_id: TokenId,
    /// Half-open byte range `[start, end)` within the scanned text.
    pub start: usize,
    pub end: usize,
}

impl Dfa {
    pub(crate) fn from_parts(
        start: StateId,
        transitions: Vec<Vec<Transition>>,
        accept: Vec<Option<TokenId>>,
        token_names: Vec<String>,
    ) -> Self {
        Self {
            start,
            transitions,
            accept,
            token_names,
        }
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn state_count(&self) -> usize {
        self.transitions.len()
    }

    /// The token accepted at `state`, if it is an accepting state.
    pub fn accept(&self, state: StateId) -> Option<TokenId> {
        self.accept[state.0 as usize]
    }

    pub fn token_name(&self, token: TokenId) -> &str {
        &self.token_names[token.0 as usize]
    }

    /// Render the full transition table and accept map as plain text, one
    /// state per block, transitions in their stored (lexicographic
    /// `CodePointSet`) order. Used to snapshot DFA shape in tests; not an
    /// emitter output format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        writeln!(out, "start: {}", self.start.0).unwrap();
        for (id, row) in self.transitions.iter().enumerate() {
            let label = match self.accept[id] {
                Some(t) => self.token_name(t),
                None => "-",
            };
            writeln!(out, "state {id}: accept={label}").unwrap();
            for t in row {
                for (lo, hi) in t.class.iter_ranges() {
                    writeln!(out, "  [{lo}, {hi}) -> {}", t.target.0).unwrap();
                }
            }
        }
        out
    }

    /// One transition step: the state reached from `state` on code point `c`.
    /// Total over every `c` in `0..=0x10FFFF`, since every row partitions `Σ`.
    pub fn step(&self, state: StateId, c: u32) -> StateId {
        let row = &self.transitions[state.0 as usize];
        row.iter()
            .find(|t| t.class.contains(c))
            .map(|t| t.target)
            .expect("a DFA transition row always partitions all of Σ")
    }

    /// A non-accepting state whose only edge is a `Σ` self-loop can never
    /// lead to a match; `scan` uses this to stop consuming input early
    /// instead of burning the rest of the line on a foregone failure.
    fn is_dead_sink(&self, state: StateId) -> bool {
        if self.accept(state).is_some() {
            return false;
        }
        match &self.transitions[state.0 as usize][..] {
            [t] => t.target == state && t.class.is_full(),
            _ => false,
        }
    }

    /// Scan `input` into a sequence of maximal-munch tokens.
    ///
    /// At each position, the scanner runs the DFA as far as it can and
    /// remembers the most recent accepting state it passed through (the
    /// longest match). Ties between tokens that accept at the same length
    /// are broken by priority: a state's [`Dfa::accept`] is always already
    /// the lowest-`TokenId` tag live at that state, so no extra tie-breaking
    /// is needed here.
    ///
    /// Stops (without consuming further input) at the first position from
    /// which no token can be matched at all.
    pub fn scan(&self, input: &str) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();
        let mut pos = 0usize;
        let bytes = input.as_bytes();

        while pos < bytes.len() {
            let mut state = self.start;
            let mut cursor = pos;
            let mut last_accept: Option<(TokenId, usize)> = None;

            for (offset, c) in input[pos..].char_indices() {
                let byte_pos = pos + offset;
                state = self.step(state, c as u32);
                cursor = byte_pos + c.len_utf8();
                if let Some(token) = self.accept(state) {
                    last_accept = Some((token, cursor));
                }
                if self.is_dead_sink(state) {
                    break;
                }
            }

            match last_accept {
                Some((token_id, end)) => {
                    tokens.push(Token {
                        token_id,
                        start: pos,
                        end,
                    });
                    pos = end;
                }
                None => {
                    let code_point = input[pos..]
                        .chars()
                        .next()
                        .expect("pos < bytes.len() implies at least one remaining char")
                        as u32;
                    return Err(ScanError::UnmatchedInput {
                        position: pos,
                        code_point,
                    });
                }
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
#[path = "dfa_tests.rs"]
mod dfa_tests;
