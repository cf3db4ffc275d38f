use thiserror::Error;
use tracing::{debug, info};

use crate::term::Term;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("No normal form reached within {limit} steps")]
    StepLimit { limit: usize },
}
pub type Result<T> = std::result::Result<T, EvalError>;

/// Contracts the leftmost-outermost redex of `term` in place. Returns whether
/// there was one.
fn contract(term: &mut Term) -> bool {
    match term {
        Term::Var(_) => false,
        Term::Abs(_, body) => contract(body),
        Term::Apply(lhs, rhs) => {
            if let Term::Abs(bound, body) = lhs.as_mut() {
                body.replace(bound, rhs);
                let reduced = std::mem::replace(body.as_mut(), Term::Var(String::new()));
                *term = reduced;
                true
            } else {
                contract(lhs) || contract(rhs)
            }
        }
    }
}

/// One normal-order reduction step.
pub fn step(mut term: Term) -> (Term, bool) {
    let changed = contract(&mut term);
    (term, changed)
}

/// Reduces `term` to normal form. Never returns if there is none.
pub fn normalize(mut term: Term) -> Term {
    loop {
        let (next, changed) = step(term);
        term = next;
        if !changed {
            break term;
        }
    }
}

pub struct Normalized {
    pub term: Term,
    /// Number of contracted redexes.
    pub steps: usize,
}

/// Like [`normalize`], but reports every intermediate term to `on_step` and
/// gives up after `limit` contractions.
pub fn normalize_with(
    mut term: Term,
    limit: Option<usize>,
    mut on_step: impl FnMut(usize, &Term),
) -> Result<Normalized> {
    let mut steps = 0;
    loop {
        if let Some(limit) = limit.filter(|&limit| steps >= limit) {
            if is_reducible(&term) {
                break Err(EvalError::StepLimit { limit });
            }
        }
        if !contract(&mut term) {
            info!(steps, "reached normal form");
            break Ok(Normalized { term, steps });
        }
        steps += 1;
        debug!(steps, %term, "contracted");
        on_step(steps, &term);
    }
}

fn is_reducible(term: &Term) -> bool {
    match term {
        Term::Var(_) => false,
        Term::Abs(_, body) => is_reducible(body),
        Term::Apply(lhs, rhs) => {
            matches!(lhs.as_ref(), Term::Abs(..)) || is_reducible(lhs) || is_reducible(rhs)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{definitions::Definitions, parser::parse};

    fn parse_plain(s: &str) -> Term {
        parse(s, &Definitions::default()).unwrap()
    }

    fn eval(s: &str) -> String {
        normalize(parse_plain(s)).pretty()
    }

    #[test]
    fn test_step_is_leftmost_outermost() {
        let (term, changed) = step(parse_plain("(λx.x) ((λy.y) z)"));
        assert!(changed);
        assert_eq!(term.pretty(), "(λy.y) z");
        let (term, changed) = step(term);
        assert!(changed);
        assert_eq!(term.pretty(), "z");
        let (term, changed) = step(term);
        assert!(!changed);
        assert_eq!(term.pretty(), "z");
    }

    #[test]
    fn test_step_prefers_left_operand() {
        let (term, changed) = step(parse_plain("x ((λa.a) b) ((λc.c) d)"));
        assert!(changed);
        assert_eq!(term.pretty(), "x b ((λc.c) d)");
    }

    #[test]
    fn test_step_reduces_under_abstraction() {
        let (term, changed) = step(parse_plain("λx.(λy.y) x"));
        assert!(changed);
        assert_eq!(term.pretty(), "λx.x");
    }

    #[test]
    fn test_step_normal_form_is_unchanged() {
        for s in ["x", "λx.x", "x (λy.y z)", "λf.λx.f (f x)"] {
            let term = parse_plain(s);
            let (stepped, changed) = step(term.clone());
            assert!(!changed);
            assert_eq!(stepped, term);
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(eval("λx.x"), "λx.x");
        assert_eq!(eval("(λx.x) y"), "y");
        assert_eq!(eval("(λx.λy.x) a b"), "a");
        assert_eq!(eval("(λx.λy.y) a b"), "b");
    }

    #[test]
    fn test_normal_order_skips_divergent_argument() {
        assert_eq!(eval("(λx.y) ((λx.x x) (λx.x x))"), "y");
    }

    #[test]
    fn test_normalize_avoids_capture() {
        assert_eq!(eval("(λx.λy.x) y"), "λy0.y");
        assert_eq!(eval("(λf.λx.f x) x"), "λx0.x x0");
    }

    #[test]
    fn test_church_arithmetic() {
        let mut definitions = Definitions::default();
        definitions.add("succ", "λn.λf.λx.f (n f x)");
        definitions.add("plus", "λm.λn.λf.λx.m f (n f x)");
        definitions.add("mult", "λm.λn.λf.m (n f)");
        let eval = |s: &str| normalize(parse(s, &definitions).unwrap()).pretty();
        assert_eq!(eval("succ 2"), parse_plain("3").pretty());
        assert_eq!(eval("plus 2 3"), parse_plain("5").pretty());
        assert_eq!(eval("mult 2 3"), parse_plain("6").pretty());
    }

    #[test]
    fn test_normalize_with_counts_and_reports_steps() {
        let mut seen = vec![];
        let normalized = normalize_with(parse_plain("(λx.x) ((λy.y) z)"), None, |n, term| {
            seen.push((n, term.pretty()))
        })
        .unwrap();
        assert_eq!(normalized.term.pretty(), "z");
        assert_eq!(normalized.steps, 2);
        assert_eq!(
            seen,
            vec![(1, "(λy.y) z".to_string()), (2, "z".to_string())]
        );
    }

    #[test]
    fn test_normalize_with_limit() {
        let omega = parse_plain("(λx.x x) (λx.x x)");
        assert_eq!(
            normalize_with(omega, Some(100), |_, _| {}).err(),
            Some(EvalError::StepLimit { limit: 100 })
        );
        // reaching normal form exactly at the limit is not an error
        let normalized = normalize_with(parse_plain("(λx.x) y"), Some(1), |_, _| {}).unwrap();
        assert_eq!(normalized.term, Term::var("y"));
    }

    #[test]
    fn test_normalize_with_zero_limit() {
        let mut seen = 0;
        assert_eq!(
            normalize_with(parse_plain("(λx.x) y"), Some(0), |_, _| seen += 1).err(),
            Some(EvalError::StepLimit { limit: 0 })
        );
        assert_eq!(seen, 0);
        let normalized = normalize_with(parse_plain("λx.x"), Some(0), |_, _| {}).unwrap();
        assert_eq!(normalized.term, parse_plain("λx.x"));
        assert_eq!(normalized.steps, 0);
    }
}
