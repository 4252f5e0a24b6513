//! Hash-consed regular-expression algebra.
//!
//! Every [`Expr`] is a cheap `Copy` handle into an [`Interner`]; structural
//! equality of the underlying node reduces to equality of the handle. Smart
//! constructors on [`Interner`] are the only way to build non-trivial nodes,
//! and they implement the canonicalisation laws that make two equivalent
//! residuals collapse to the same handle — this is what gives Brzozowski
//! derivative construction (see `residua-dfa`) a finite state space.

use std::collections::HashMap;

use thiserror::Error;

use crate::codepointset::CodePointSet;

/// Identifies a token within a `TokenSpec`; doubles as the accept label
/// carried by `Expr::Tag`. Smaller ids are higher priority.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TokenId(pub u32);

/// A hash-consed handle to an interned expression node.
///
/// Ordering is the stable total order given by creation order in the
/// interner, which is also insertion/assignment order — deterministic given
/// a deterministic sequence of constructor calls.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Expr(u32);

impl Expr {
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

/// The structural shape of one interned node. Children are already-interned
/// `Expr` handles, so structural equality of a `Node` is one level deep.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum Node {
    Empty,
    Epsilon,
    Chars(CodePointSet),
    Concat(Expr, Expr),
    Alt(Vec<Expr>),
    And(Vec<Expr>),
    Not(Expr),
    Star(Expr),
    Tag(TokenId, Expr),
}

/// Error surfaced by the interner layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The identity space (`u32`) was exhausted. Unreachable in practice.
    #[error("expression interner overflow")]
    Overflow,
}

/// Owns all `Expr` storage for one compilation. Implements hash-consing: a
/// structural hash table maps `Node` shape to the existing `Expr` handle, so
/// constructing an already-seen shape returns the existing handle rather than
/// allocating a new one.
#[derive(Default)]
pub struct Interner {
    nodes: Vec<Node>,
    table: HashMap<Node, Expr>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, e: Expr) -> &Node {
        &self.nodes[e.0 as usize]
    }

    /// Intern a structural node, deduplicating against an existing handle.
    fn intern(&mut self, node: Node) -> Result<Expr, ExprError> {
        if let Some(&existing) = self.table.get(&node) {
            return Ok(existing);
        }
        let id = u32::try_from(self.nodes.len()).map_err(|_| ExprError::Overflow)?;
        let handle = Expr(id);
        self.nodes.push(node.clone());
        self.table.insert(node, handle);
        Ok(handle)
    }

    // ---- leaf constructors -------------------------------------------------

    pub fn empty(&mut self) -> Expr {
        self.intern(Node::Empty).expect("Empty never overflows an empty interner")
    }

    pub fn epsilon(&mut self) -> Expr {
        self.intern(Node::Epsilon).expect("Epsilon never overflows an empty interner")
    }

    /// `Chars(S)`. `Chars(∅)` collapses to `Empty`.
    pub fn chars(&mut self, set: CodePointSet) -> Expr {
        if set.is_empty() {
            return self.empty();
        }
        self.intern(Node::Chars(set)).expect("interner overflow")
    }

    /// The universal language `Σ*`, kept explicitly as `Not(Empty)` per the
    /// algebra's normal form for the complement of the empty language.
    pub fn sigma_star(&mut self) -> Expr {
        let empty = self.empty();
        self.not(empty)
    }

    // ---- Concat -------------------------------------------------------------

    /// `Concat(a, b)`, right-associated, with `Empty`/`Epsilon` absorption.
    pub fn concat(&mut self, a: Expr, b: Expr) -> Expr {
        let empty = self.empty();
        let epsilon = self.epsilon();

        if a == empty || b == empty {
            return empty;
        }
        if a == epsilon {
            return b;
        }
        if b == epsilon {
            return a;
        }
        // Right-associate: Concat(Concat(x, y), z) -> Concat(x, Concat(y, z))
        if let Node::Concat(x, y) = *self.node(a) {
            let inner = self.concat(y, b);
            return self.concat(x, inner);
        }
        self.intern(Node::Concat(a, b)).expect("interner overflow")
    }

    pub fn concat_many(&mut self, items: impl IntoIterator<Item = Expr>) -> Expr {
        let mut items = items.into_iter();
        let Some(first) = items.next() else {
            return self.epsilon();
        };
        items.fold(first, |acc, x| self.concat(acc, x))
    }

    // ---- Alt ------------------------------------------------------------

    /// `Alt(xs)`: flatten, drop `Empty`, fold `Chars` siblings by union, sort
    /// and dedup by identity, collapse 0/1-element results.
    pub fn alt(&mut self, xs: impl IntoIterator<Item = Expr>) -> Expr {
        let empty = self.empty();
        let mut flat = Vec::new();
        for x in xs {
            match self.node(x).clone() {
                Node::Alt(children) => flat.extend(children),
                Node::Empty => {}
                _ => flat.push(x),
            }
        }

        let mut chars_union: Option<CodePointSet> = None;
        let mut rest = Vec::with_capacity(flat.len());
        for x in flat {
            if let Node::Chars(set) = self.node(x) {
                let set = set.clone();
                chars_union = Some(match chars_union {
                    Some(acc) => acc.union(&set),
                    None => set,
                });
            } else {
                rest.push(x);
            }
        }
        if let Some(set) = chars_union {
            rest.push(self.chars(set));
        }

        rest.sort_unstable();
        rest.dedup();

        match rest.len() {
            0 => empty,
            1 => rest[0],
            _ => self.intern(Node::Alt(rest)).expect("interner overflow"),
        }
    }

    pub fn alt2(&mut self, a: Expr, b: Expr) -> Expr {
        self.alt([a, b])
    }

    // ---- And ------------------------------------------------------------

    /// `And(xs)`: flatten, `Empty` absorbs, fold `Chars` siblings by
    /// intersection, sort/dedup, collapse 0/1-element results (0 → `Σ*`).
    pub fn and(&mut self, xs: impl IntoIterator<Item = Expr>) -> Expr {
        let empty = self.empty();
        let mut flat = Vec::new();
        for x in xs {
            if x == empty {
                return empty;
            }
            match self.node(x).clone() {
                Node::And(children) => flat.extend(children),
                _ => flat.push(x),
            }
        }

        let mut chars_inter: Option<CodePointSet> = None;
        let mut rest = Vec::with_capacity(flat.len());
        for x in flat {
            if let Node::Chars(set) = self.node(x) {
                let set = set.clone();
                let next = match chars_inter {
                    Some(acc) => acc.intersect(&set),
                    None => set,
                };
                if next.is_empty() {
                    return empty;
                }
                chars_inter = Some(next);
            } else {
                rest.push(x);
            }
        }
        if let Some(set) = chars_inter {
            rest.push(self.chars(set));
        }

        rest.sort_unstable();
        rest.dedup();

        match rest.len() {
            0 => self.sigma_star(),
            1 => rest[0],
            _ => self.intern(Node::And(rest)).expect("interner overflow"),
        }
    }

    pub fn and2(&mut self, a: Expr, b: Expr) -> Expr {
        self.and([a, b])
    }

    // ---- Not / Star -------------------------------------------------------

    /// `Not(a)`: `Not(Not(x)) = x`. Since `Σ*` is itself represented as
    /// `Not(Empty)`, this one rule also gives `Not(Σ*) = Empty` for free.
    /// `Not(Empty) = Σ*` is simply the base case: there is no further
    /// simplification, so it interns as `Not(Empty)` literally.
    pub fn not(&mut self, a: Expr) -> Expr {
        if let Node::Not(inner) = *self.node(a) {
            return inner;
        }
        self.intern(Node::Not(a)).expect("interner overflow")
    }

    /// `Star(a)`: `Star(Empty) = Star(Epsilon) = Epsilon`; `Star(Star(a)) =
    /// Star(a)`.
    pub fn star(&mut self, a: Expr) -> Expr {
        let empty = self.empty();
        let epsilon = self.epsilon();
        if a == empty || a == epsilon {
            return epsilon;
        }
        if let Node::Star(_) = *self.node(a) {
            return a;
        }
        self.intern(Node::Star(a)).expect("interner overflow")
    }

    // ---- Tag ----------------------------------------------------------------

    /// `Tag(t, a)`. Never folded through other constructors; a fresh `Tag`
    /// node is created (or deduplicated if an identical `(t, a)` pair was
    /// already interned).
    pub fn tag(&mut self, t: TokenId, a: Expr) -> Expr {
        self.intern(Node::Tag(t, a)).expect("interner overflow")
    }

    // ---- nullability --------------------------------------------------------

    /// `nu(e)`: `Epsilon` if `ε ∈ L(e)`, else `Empty`.
    pub fn nullable(&mut self, e: Expr) -> Expr {
        let mut memo = HashMap::new();
        self.nullable_memo(e, &mut memo)
    }

    /// Whether `e` accepts the empty string.
    pub fn is_nullable(&mut self, e: Expr) -> bool {
        let epsilon = self.epsilon();
        self.nullable(e) == epsilon
    }

    fn nullable_memo(&mut self, e: Expr, memo: &mut HashMap<Expr, Expr>) -> Expr {
        if let Some(&cached) = memo.get(&e) {
            return cached;
        }
        let result = match self.node(e).clone() {
            Node::Empty => self.empty(),
            Node::Epsilon => self.epsilon(),
            Node::Chars(_) => self.empty(),
            Node::Concat(a, b) => {
                let na = self.nullable_memo(a, memo);
                let nb = self.nullable_memo(b, memo);
                self.and2(na, nb)
            }
            Node::Alt(xs) => {
                let nxs: Vec<Expr> = xs.iter().map(|&x| self.nullable_memo(x, memo)).collect();
                self.alt(nxs)
            }
            Node::And(xs) => {
                let nxs: Vec<Expr> = xs.iter().map(|&x| self.nullable_memo(x, memo)).collect();
                self.and(nxs)
            }
            Node::Not(a) => {
                let na = self.nullable_memo(a, memo);
                let empty = self.empty();
                if na == empty {
                    self.epsilon()
                } else {
                    self.empty()
                }
            }
            Node::Star(_) => self.epsilon(),
            Node::Tag(_, a) => self.nullable_memo(a, memo),
        };
        memo.insert(e, result);
        result
    }

    // ---- derivative -----------------------------------------------------

    /// `d(e, c)`: the Brzozowski derivative of `e` with respect to a single
    /// code point `c`.
    pub fn derivative(&mut self, e: Expr, c: u32) -> Expr {
        let mut memo = HashMap::new();
        self.derivative_memo(e, c, &mut memo)
    }

    fn derivative_memo(&mut self, e: Expr, c: u32, memo: &mut HashMap<Expr, Expr>) -> Expr {
        if let Some(&cached) = memo.get(&e) {
            return cached;
        }
        let result = match self.node(e).clone() {
            Node::Empty | Node::Epsilon => self.empty(),
            Node::Chars(set) => {
                if set.contains(c) {
                    self.epsilon()
                } else {
                    self.empty()
                }
            }
            Node::Concat(a, b) => {
                let da = self.derivative_memo(a, c, memo);
                let left = self.concat(da, b);
                let na = self.nullable(a);
                let db = self.derivative_memo(b, c, memo);
                let right = self.concat(na, db);
                self.alt2(left, right)
            }
            Node::Alt(xs) => {
                let dxs: Vec<Expr> = xs
                    .iter()
                    .map(|&x| self.derivative_memo(x, c, memo))
                    .collect();
                self.alt(dxs)
            }
            Node::And(xs) => {
                let dxs: Vec<Expr> = xs
                    .iter()
                    .map(|&x| self.derivative_memo(x, c, memo))
                    .collect();
                self.and(dxs)
            }
            Node::Not(a) => {
                let da = self.derivative_memo(a, c, memo);
                self.not(da)
            }
            Node::Star(a) => {
                let da = self.derivative_memo(a, c, memo);
                self.concat(da, e)
            }
            Node::Tag(t, a) => {
                let da = self.derivative_memo(a, c, memo);
                self.tag(t, da)
            }
        };
        memo.insert(e, result);
        result
    }

    // ---- alphabet partition -------------------------------------------------

    /// `C(e)`: the coarsest partition of `Σ` such that every code point
    /// within one class has the same derivative under `e`.
    pub fn alphabet_partition(&mut self, e: Expr) -> Vec<CodePointSet> {
        let mut memo = HashMap::new();
        self.alphabet_partition_memo(e, &mut memo)
    }

    fn alphabet_partition_memo(
        &mut self,
        e: Expr,
        memo: &mut HashMap<Expr, Vec<CodePointSet>>,
    ) -> Vec<CodePointSet> {
        if let Some(cached) = memo.get(&e) {
            return cached.clone();
        }
        let result = match self.node(e).clone() {
            Node::Empty | Node::Epsilon => vec![CodePointSet::full()],
            Node::Chars(set) => {
                let comp = set.complement();
                if comp.is_empty() {
                    vec![set]
                } else {
                    vec![set, comp]
                }
            }
            Node::Concat(a, b) => {
                let pa = self.alphabet_partition_memo(a, memo);
                if self.nullable_is_empty(a) {
                    pa
                } else {
                    let pb = self.alphabet_partition_memo(b, memo);
                    refine(&pa, &pb)
                }
            }
            Node::Alt(xs) | Node::And(xs) => {
                let mut acc = vec![CodePointSet::full()];
                for x in xs {
                    let px = self.alphabet_partition_memo(x, memo);
                    acc = refine(&acc, &px);
                }
                acc
            }
            Node::Not(a) | Node::Star(a) | Node::Tag(_, a) => {
                self.alphabet_partition_memo(a, memo)
            }
        };
        memo.insert(e, result.clone());
        result
    }

    /// `true` iff `nu(a) = Empty`, i.e. `a` is not nullable.
    fn nullable_is_empty(&mut self, a: Expr) -> bool {
        !self.is_nullable(a)
    }

    // ---- accept labelling ---------------------------------------------------

    /// The smallest [`TokenId`] carried by a `Tag` node reachable from `e`
    /// whose subtree is nullable — i.e. the priority-resolved accept label
    /// for the DFA state keyed by `e`. `None` means `e` is not nullable under
    /// any tag, so the state is non-accepting.
    ///
    /// This walks `e`'s structure directly rather than going through
    /// [`Interner::nullable`], which collapses every `Tag` down to plain
    /// `Empty`/`Epsilon` and so cannot answer *which* tag matched.
    pub fn accepting_token(&mut self, e: Expr) -> Option<TokenId> {
        let mut memo = HashMap::new();
        self.accepting_token_memo(e, &mut memo)
    }

    fn accepting_token_memo(
        &mut self,
        e: Expr,
        memo: &mut HashMap<Expr, Option<TokenId>>,
    ) -> Option<TokenId> {
        if let Some(&cached) = memo.get(&e) {
            return cached;
        }
        let result = match self.node(e).clone() {
            Node::Empty | Node::Epsilon | Node::Chars(_) => None,
            Node::Concat(a, b) => {
                if self.is_nullable(a) && self.is_nullable(b) {
                    let ta = self.accepting_token_memo(a, memo);
                    let tb = self.accepting_token_memo(b, memo);
                    min_opt(ta, tb)
                } else {
                    None
                }
            }
            Node::Alt(xs) => xs.iter().fold(None, |acc, &x| {
                min_opt(acc, self.accepting_token_memo(x, memo))
            }),
            Node::And(xs) => {
                if xs.iter().all(|&x| self.is_nullable(x)) {
                    xs.iter().fold(None, |acc, &x| {
                        min_opt(acc, self.accepting_token_memo(x, memo))
                    })
                } else {
                    None
                }
            }
            // `Not`/`Star` nullability doesn't mean "a tagged child matched":
            // negation and zero-repetition carry no token identity of their own.
            Node::Not(_) | Node::Star(_) => None,
            Node::Tag(t, a) => {
                if self.is_nullable(a) {
                    Some(t)
                } else {
                    None
                }
            }
        };
        memo.insert(e, result);
        result
    }
}

fn min_opt(a: Option<TokenId>, b: Option<TokenId>) -> Option<TokenId> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (Some(x), Some(y)) => Some(x.min(y)),
    }
}

/// Refinement `Π₁ ∧ Π₂`: the set of non-empty pairwise intersections. The
/// result is again a partition of `Σ`.
fn refine(a: &[CodePointSet], b: &[CodePointSet]) -> Vec<CodePointSet> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    for x in a {
        for y in b {
            let i = x.intersect(y);
            if !i.is_empty() {
                out.push(i);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod expr_tests;
