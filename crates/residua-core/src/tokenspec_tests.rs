use super::*;
use crate::expr::Interner;

fn lit(s: &str) -> RawExpr {
    s.chars().rev().fold(RawExpr::Epsilon, |acc, c| {
        RawExpr::Concat(
            Box::new(RawExpr::Chars(CodePointSet::of_char(c as u32).unwrap())),
            Box::new(acc),
        )
    })
}

fn class(lo: char, hi: char) -> RawExpr {
    RawExpr::Chars(CodePointSet::of_range(lo as u32, hi as u32 + 1).unwrap())
}

fn star(e: RawExpr) -> RawExpr {
    RawExpr::Star(Box::new(e))
}

fn concat(a: RawExpr, b: RawExpr) -> RawExpr {
    RawExpr::Concat(Box::new(a), Box::new(b))
}

#[test]
fn rejects_token_name_with_underscore_prefix() {
    let mut spec = TokenSpecBuilder::new();
    let err = spec.add_token("_bad", RawExpr::Epsilon).unwrap_err();
    assert_eq!(err, ResolveError::ReservedTokenPrefix("_bad".to_string()));
}

#[test]
fn rejects_fragment_name_without_underscore_prefix() {
    let mut spec = TokenSpecBuilder::new();
    let err = spec.add_fragment("bad", RawExpr::Epsilon).unwrap_err();
    assert_eq!(
        err,
        ResolveError::MissingFragmentPrefix("bad".to_string())
    );
}

#[test]
fn rejects_duplicate_names() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_token("id", RawExpr::Epsilon).unwrap();
    let err = spec.add_token("id", RawExpr::Epsilon).unwrap_err();
    assert_eq!(err, ResolveError::DuplicateToken("id".to_string()));

    let mut spec = TokenSpecBuilder::new();
    spec.add_fragment("_x", RawExpr::Epsilon).unwrap();
    let err = spec.add_fragment("_x", RawExpr::Epsilon).unwrap_err();
    assert_eq!(err, ResolveError::DuplicateFragment("_x".to_string()));
}

#[test]
fn fragment_cycle_is_rejected() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_fragment("_a", RawExpr::Ref("_b".to_string())).unwrap();
    spec.add_fragment("_b", RawExpr::Ref("_a".to_string())).unwrap();
    spec.add_token("t", RawExpr::Ref("_a".to_string())).unwrap();

    let mut interner = Interner::new();
    let err = spec.resolve(&mut interner).unwrap_err();
    assert!(matches!(err, ResolveError::CyclicFragment(_)));
}

#[test]
fn undefined_reference_is_rejected() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_token("t", RawExpr::Ref("_missing".to_string())).unwrap();

    let mut interner = Interner::new();
    let err = spec.resolve(&mut interner).unwrap_err();
    assert_eq!(err, ResolveError::UndefinedReference("_missing".to_string()));
}

#[test]
fn priority_order_matches_declaration_order() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_token("kw", lit("if")).unwrap();
    spec.add_token("id", star(class('a', 'z'))).unwrap();

    let mut interner = Interner::new();
    let resolved = spec.resolve(&mut interner).unwrap();
    assert_eq!(resolved.names, vec!["kw".to_string(), "id".to_string()]);
}

#[test]
fn fragment_interpolation_is_substituted_before_lowering() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_fragment("_digit", class('0', '9')).unwrap();
    spec.add_token(
        "num",
        concat(RawExpr::Ref("_digit".to_string()), star(RawExpr::Ref("_digit".to_string()))),
    )
    .unwrap();

    let mut interner = Interner::new();
    let resolved = spec.resolve(&mut interner).unwrap();

    // num should behave like [0-9][0-9]*
    let mut cur = resolved.root;
    for c in "123".chars() {
        cur = interner.derivative(cur, c as u32);
    }
    assert!(interner.is_nullable(cur));
}

#[test]
fn empty_language_token_is_reported_as_a_warning_not_an_error() {
    let mut spec = TokenSpecBuilder::new();
    // `never` denotes the empty language directly.
    spec.add_token("never", RawExpr::Empty).unwrap();
    spec.add_token("id", star(class('a', 'z'))).unwrap();

    let mut interner = Interner::new();
    let resolved = spec.resolve(&mut interner).unwrap();
    assert_eq!(resolved.empty_language_warnings, vec![TokenId(0)]);
}

#[test]
fn distinct_tokens_with_identical_bodies_remain_distinct_tags() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_token("a", lit("x")).unwrap();
    spec.add_token("b", lit("x")).unwrap();

    let mut interner = Interner::new();
    let resolved = spec.resolve(&mut interner).unwrap();

    // Both tokens are reachable from the root: deriving on 'x' then checking
    // nullability must land on a nullable state (both tags alive and
    // nullable simultaneously), proving neither tag was collapsed away.
    let after_x = interner.derivative(resolved.root, 'x' as u32);
    assert!(interner.is_nullable(after_x));
}
