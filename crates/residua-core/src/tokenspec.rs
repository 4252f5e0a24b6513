//! Named tokens, priorities, and fragment interpolation.
//!
//! Consumes an already-parsed regex AST per token (the surface grammar and
//! its parser are external collaborators, out of scope here) and produces a
//! single combined `Expr` with one `Tag` per token, ready for the DFA
//! builder.

use indexmap::IndexMap;
use thiserror::Error;

use crate::codepointset::CodePointSet;
use crate::expr::{Expr, Interner, TokenId};

/// A parsed regular expression, as handed over by the (external) surface
/// parser. `Ref` nodes name a fragment to interpolate; the external parser
/// is responsible for desugaring quantifiers (`? + {n} {n,} {n,m}`),
/// character-class negation, `\p{...}` escapes and shorthand classes down to
/// this atomic algebra before calling into `residua-core`.
#[derive(Clone, Debug)]
pub enum RawExpr {
    Empty,
    Epsilon,
    Chars(CodePointSet),
    Concat(Box<RawExpr>, Box<RawExpr>),
    Alt(Vec<RawExpr>),
    And(Vec<RawExpr>),
    Not(Box<RawExpr>),
    Star(Box<RawExpr>),
    /// Reference to a fragment name (by convention, prefixed with `_`).
    Ref(String),
}

/// Error raised while building or resolving a [`TokenSpecBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A token name was registered twice.
    #[error("duplicate token name: {0}")]
    DuplicateToken(String),
    /// A fragment name was registered twice.
    #[error("duplicate fragment name: {0}")]
    DuplicateFragment(String),
    /// A token name started with `_`, which is reserved for fragments.
    #[error("token name `{0}` must not start with `_`")]
    ReservedTokenPrefix(String),
    /// A fragment name did not start with `_`.
    #[error("fragment name `{0}` must start with `_`")]
    MissingFragmentPrefix(String),
    /// Interpolation formed a cycle through this name.
    #[error("cyclic fragment interpolation through `{0}`")]
    CyclicFragment(String),
    /// An interpolation referenced a name that was never declared.
    #[error("undefined reference: `{0}`")]
    UndefinedReference(String),
}

/// A single named token: its declared name and priority-ordered position
/// (earliest declaration = highest priority = smallest [`TokenId`]).
#[derive(Clone, Debug)]
struct TokenEntry {
    name: String,
    body: RawExpr,
}

/// Builds a [`TokenSpec`] from tokens and fragments declared in source order.
#[derive(Default)]
pub struct TokenSpecBuilder {
    tokens: Vec<TokenEntry>,
    fragments: IndexMap<String, RawExpr>,
}

/// The result of resolving a [`TokenSpecBuilder`]: a single combined root
/// expression (the canonicalised `Alt` of every `Tag(token_id, expr)`) plus
/// the token names in priority order, and any tokens whose resolved
/// language is `∅` (a non-fatal warning per the error taxonomy).
pub struct ResolvedSpec {
    pub root: Expr,
    /// Token names indexed by `TokenId`.
    pub names: Vec<String>,
    /// Tokens whose resolved expression denotes the empty language.
    pub empty_language_warnings: Vec<TokenId>,
}

impl TokenSpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_token(&mut self, name: impl Into<String>, body: RawExpr) -> Result<(), ResolveError> {
        let name = name.into();
        if name.starts_with('_') {
            return Err(ResolveError::ReservedTokenPrefix(name));
        }
        if self.tokens.iter().any(|t| t.name == name) {
            return Err(ResolveError::DuplicateToken(name));
        }
        self.tokens.push(TokenEntry { name, body });
        Ok(())
    }

    pub fn add_fragment(&mut self, name: impl Into<String>, body: RawExpr) -> Result<(), ResolveError> {
        let name = name.into();
        if !name.starts_with('_') {
            return Err(ResolveError::MissingFragmentPrefix(name));
        }
        if self.fragments.contains_key(&name) {
            return Err(ResolveError::DuplicateFragment(name));
        }
        self.fragments.insert(name, body);
        Ok(())
    }

    /// Resolve all interpolations, wrap each token in `Tag(token_id, _)` in
    /// declaration order, and combine into one canonicalised root `Alt`.
    pub fn resolve(self, interner: &mut Interner) -> Result<ResolvedSpec, ResolveError> {
        let mut cache = IndexMap::new();
        let mut marks: IndexMap<String, Mark> = IndexMap::new();

        let mut names = Vec::with_capacity(self.tokens.len());
        let mut tags = Vec::with_capacity(self.tokens.len());
        let mut empty_language_warnings = Vec::new();

        for (idx, entry) in self.tokens.into_iter().enumerate() {
            let resolved_raw = substitute(&entry.body, &self.fragments, &mut cache, &mut marks)?;
            let resolved_expr = lower(&resolved_raw, interner);
            let token_id = TokenId(idx as u32);

            if resolved_expr == interner.empty() {
                empty_language_warnings.push(token_id);
            }

            let tagged = interner.tag(token_id, resolved_expr);
            tags.push(tagged);
            names.push(entry.name);
        }

        let root = interner.alt(tags);
        Ok(ResolvedSpec {
            root,
            names,
            empty_language_warnings,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Grey,
    Black,
}

/// Resolve every `Ref` in `expr` by substitution, detecting interpolation
/// cycles with a grey/black depth-first marking over fragment names.
fn substitute(
    expr: &RawExpr,
    fragments: &IndexMap<String, RawExpr>,
    cache: &mut IndexMap<String, RawExpr>,
    marks: &mut IndexMap<String, Mark>,
) -> Result<RawExpr, ResolveError> {
    match expr {
        RawExpr::Empty | RawExpr::Epsilon | RawExpr::Chars(_) => Ok(expr.clone()),
        RawExpr::Concat(a, b) => Ok(RawExpr::Concat(
            Box::new(substitute(a, fragments, cache, marks)?),
            Box::new(substitute(b, fragments, cache, marks)?),
        )),
        RawExpr::Alt(xs) => Ok(RawExpr::Alt(
            xs.iter()
                .map(|x| substitute(x, fragments, cache, marks))
                .collect::<Result<_, _>>()?,
        )),
        RawExpr::And(xs) => Ok(RawExpr::And(
            xs.iter()
                .map(|x| substitute(x, fragments, cache, marks))
                .collect::<Result<_, _>>()?,
        )),
        RawExpr::Not(a) => Ok(RawExpr::Not(Box::new(substitute(
            a, fragments, cache, marks,
        )?))),
        RawExpr::Star(a) => Ok(RawExpr::Star(Box::new(substitute(
            a, fragments, cache, marks,
        )?))),
        RawExpr::Ref(name) => resolve_fragment(name, fragments, cache, marks),
    }
}

fn resolve_fragment(
    name: &str,
    fragments: &IndexMap<String, RawExpr>,
    cache: &mut IndexMap<String, RawExpr>,
    marks: &mut IndexMap<String, Mark>,
) -> Result<RawExpr, ResolveError> {
    if let Some(cached) = cache.get(name) {
        return Ok(cached.clone());
    }
    match marks.get(name) {
        Some(Mark::Grey) => return Err(ResolveError::CyclicFragment(name.to_string())),
        Some(Mark::Black) | None => {}
    }
    let Some(body) = fragments.get(name) else {
        return Err(ResolveError::UndefinedReference(name.to_string()));
    };
    let body = body.clone();

    marks.insert(name.to_string(), Mark::Grey);
    let substituted = substitute(&body, fragments, cache, marks)?;
    marks.insert(name.to_string(), Mark::Black);
    cache.insert(name.to_string(), substituted.clone());
    Ok(substituted)
}

/// Lower a fully-substituted (atomic, `Ref`-free) [`RawExpr`] into an
/// interned, canonicalised [`Expr`].
fn lower(expr: &RawExpr, interner: &mut Interner) -> Expr {
    match expr {
        RawExpr::Empty => interner.empty(),
        RawExpr::Epsilon => interner.epsilon(),
        RawExpr::Chars(set) => interner.chars(set.clone()),
        RawExpr::Concat(a, b) => {
            let a = lower(a, interner);
            let b = lower(b, interner);
            interner.concat(a, b)
        }
        RawExpr::Alt(xs) => {
            let xs: Vec<Expr> = xs.iter().map(|x| lower(x, interner)).collect();
            interner.alt(xs)
        }
        RawExpr::And(xs) => {
            let xs: Vec<Expr> = xs.iter().map(|x| lower(x, interner)).collect();
            interner.and(xs)
        }
        RawExpr::Not(a) => {
            let a = lower(a, interner);
            interner.not(a)
        }
        RawExpr::Star(a) => {
            let a = lower(a, interner);
            interner.star(a)
        }
        RawExpr::Ref(name) => {
            unreachable!("Ref(\"{name}\") must have been substituted away before lowering")
        }
    }
}

#[cfg(test)]
#[path = "tokenspec_tests.rs"]
mod tokenspec_tests;
