use rstest::rstest;

use super::*;
use crate::builder::{BuildOptions, DfaBuilder};
use residua_core::{CodePointSet, Interner, RawExpr, TokenSpecBuilder};

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

fn plus(e: RawExpr) -> RawExpr {
    RawExpr::Concat(
        Box::new(e.clone()),
        Box::new(RawExpr::Star(Box::new(e))),
    )
}

fn build(spec: TokenSpecBuilder) -> (Interner, Dfa) {
    let mut interner = Interner::new();
    let resolved = spec.resolve(&mut interner).unwrap();
    let (dfa, _) = DfaBuilder::build(
        &mut interner,
        resolved.root,
        resolved.names,
        BuildOptions::default(),
    )
    .unwrap();
    (interner, dfa)
}

fn ab_xy_spec() -> TokenSpecBuilder {
    let mut spec = TokenSpecBuilder::new();
    spec.add_token("a", RawExpr::Alt(vec![lit("x"), lit("y")]))
        .unwrap();
    spec.add_token("b", lit("xy")).unwrap();
    spec
}

/// Scenario: `a = x|y`, `b = xy`. Maximal munch prefers the longer match
/// over the ambiguous shorter one.
#[rstest]
#[case::longer_token_wins("xy", "b", "xy")]
#[case::unambiguous_short_match("x", "a", "x")]
fn maximal_munch_prefers_the_longest_match(
    #[case] input: &str,
    #[case] expected_name: &str,
    #[case] expected_text: &str,
) {
    let (_interner, dfa) = build(ab_xy_spec());
    let tokens = dfa.scan(input).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(dfa.token_name(tokens[0].token_id), expected_name);
    assert_eq!(&input[tokens[0].start..tokens[0].end], expected_text);
}

/// A partial match of `b = xy` followed by a code point neither token can
/// continue on is reported at the byte offset where matching stalled.
#[test]
fn maximal_munch_reports_unmatched_tail() {
    let (_interner, dfa) = build(ab_xy_spec());
    let err = dfa.scan("xz").unwrap_err();
    assert_eq!(
        err,
        ScanError::UnmatchedInput {
            position: 1,
            code_point: 'z' as u32,
        }
    );
}

/// Scenario: `neg = !a` where `a = [0-9]+`. `neg` denotes every string that
/// is *not* a full match of `a` — including the empty string and strings
/// with any non-digit anywhere, but not a bare run of digits.
///
/// Checked by re-resolving directly against the interner, not through the
/// scanner's maximal-munch framing: a string that is a proper prefix of a
/// longer digit run is still inside `L(neg)` for every length the scanner
/// would consider.
#[rstest]
#[case::non_digits("abc", true)]
#[case::pure_digit_run("12", false)]
#[case::empty_string_is_not_a_match_of_a("", true)]
#[case::digit_run_with_trailing_non_digit("12a", true)]
fn complement_is_over_the_whole_string_not_a_fixed_length(
    #[case] input: &str,
    #[case] expected: bool,
) {
    let mut spec = TokenSpecBuilder::new();
    let a = plus(class('0', '9'));
    spec.add_token("neg", RawExpr::Not(Box::new(a))).unwrap();
    let (mut interner, _dfa) = build(spec);

    let digits_only = {
        let first = interner.chars(CodePointSet::of_range('0' as u32, '9' as u32 + 1).unwrap());
        let star = interner.star(first);
        interner.concat(first, star)
    };
    let neg = interner.not(digits_only);

    let mut cur = neg;
    for c in input.chars() {
        cur = interner.derivative(cur, c as u32);
    }
    assert_eq!(interner.is_nullable(cur), expected);
}

/// Transition rows always partition `Σ`, and at most one dead sink remains
/// after collapsing.
#[test]
fn completeness_and_dead_state_minimality() {
    let mut spec = TokenSpecBuilder::new();
    spec.add_token("id", plus(class('a', 'z'))).unwrap();
    let (_interner, dfa) = build(spec);

    for state in 0..dfa.state_count() {
        let state = StateId(state as u32);
        for probe in [0u32, 'a' as u32, 'm' as u32, 'z' as u32, 0x10FFFF] {
            let _ = dfa.step(state, probe); // panics internally if a row fails to cover `probe`
        }
    }

    let is_self_loop_sink = |s: StateId| {
        dfa.accept(s).is_none()
            && [0u32, 'A' as u32, 'Z' as u32, '0' as u32, 0x10FFFF]
                .iter()
                .all(|&c| dfa.step(s, c) == s)
    };
    let sinks: Vec<StateId> = (0..dfa.state_count())
        .map(|i| StateId(i as u32))
        .filter(|&s| is_self_loop_sink(s))
        .collect();
    assert!(sinks.len() <= 1);
}
