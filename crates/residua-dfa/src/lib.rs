//! Worklist DFA construction from a [`residua_core::Expr`] and the compiled
//! [`Dfa`] artifact, including a reference maximal-munch scanner.
//!
//! Out of scope here, by design: emitting the DFA as generated source code
//! in a target language, and any notion of a CLI or on-disk spec format —
//! both are downstream concerns for a separate emitter crate.

pub mod builder;
pub mod dfa;

pub use builder::{BuildError, BuildOptions, BuildStats, DfaBuilder};
pub use dfa::{Dfa, ScanError, StateId, Token, Transition};
