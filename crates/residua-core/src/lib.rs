//! Hash-consed regular-expression algebra, code-point sets, and token-spec
//! resolution for the `residua` scanner generator.
//!
//! This crate covers the data model that the DFA builder (in `residua-dfa`)
//! compiles from: canonical [`CodePointSet`]s, the hash-consed [`Expr`]
//! algebra with Brzozowski derivatives and alphabet partitioning, and
//! [`TokenSpecBuilder`] for combining named tokens (with fragment
//! interpolation) into one root expression.
//!
//! Out of scope here, by design: parsing regex *text* into [`RawExpr`],
//! Unicode property tables, and anything that consumes a built automaton
//! (code emitters, a CLI, a direct interpreter driver).

pub mod codepointset;
pub mod expr;
pub mod tokenspec;

pub use codepointset::{CodePointSet, CodePointSetError};
pub use expr::{Expr, ExprError, Interner, TokenId};
pub use tokenspec::{RawExpr, ResolveError, ResolvedSpec, TokenSpecBuilder};
