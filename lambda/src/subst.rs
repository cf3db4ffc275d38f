use rpds::HashTrieSet;

use crate::term::Term;

pub type Names = HashTrieSet<String>;

/// Appends `0` to `name` until `taken` no longer holds for it.
fn freshen(name: &mut String, taken: impl Fn(&str) -> bool) {
    while taken(name.as_str()) {
        name.push('0');
    }
}

impl Term {
    pub fn free_vars(&self) -> Names {
        match self {
            Term::Var(name) => Names::new().insert(name.clone()),
            Term::Abs(bound, body) => body.free_vars().remove(bound.as_str()),
            Term::Apply(lhs, rhs) => rhs
                .free_vars()
                .iter()
                .fold(lhs.free_vars(), |names, name| names.insert(name.clone())),
        }
    }

    /// Renames the free occurrences of `original` to `replacement`.
    ///
    /// A binder named `replacement` would capture the renamed occurrences, so
    /// it is moved to a fresh name first.
    pub fn rename(&mut self, original: &str, replacement: &str) {
        match self {
            Term::Var(name) => {
                if *name == original {
                    *name = replacement.to_string();
                }
            }
            // `original` is shadowed below this binder; descending would
            // re-point its bound occurrences at the outer binder
            Term::Abs(bound, _) if *bound == original => {}
            Term::Abs(bound, body) => {
                if *bound == replacement {
                    let inner = body.free_vars();
                    let old = bound.clone();
                    freshen(bound, |name| {
                        name == original || name == replacement || inner.contains(name)
                    });
                    body.rename(&old, bound);
                }
                body.rename(original, replacement);
            }
            Term::Apply(lhs, rhs) => {
                lhs.rename(original, replacement);
                rhs.rename(original, replacement);
            }
        }
    }

    /// Capture-avoiding substitution of `value` for the free occurrences of
    /// `variable`. Every occurrence receives its own copy of `value`.
    pub fn replace(&mut self, variable: &str, value: &Term) {
        if !self.free_vars().contains(variable) {
            return;
        }
        match self {
            Term::Var(_) => *self = value.clone(),
            Term::Abs(bound, body) => {
                let incoming = value.free_vars();
                if incoming.contains(bound.as_str()) {
                    let inner = body.free_vars();
                    let old = bound.clone();
                    freshen(bound, |name| {
                        incoming.contains(name) || inner.contains(name) || name == variable
                    });
                    body.rename(&old, bound);
                }
                body.replace(variable, value);
            }
            Term::Apply(lhs, rhs) => {
                lhs.replace(variable, value);
                rhs.replace(variable, value);
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn alpha_eq(lhs: &Term, rhs: &Term) -> bool {
    fn rec<'a>(lhs: &'a Term, rhs: &'a Term, scope: &mut Vec<(&'a str, &'a str)>) -> bool {
        match (lhs, rhs) {
            (Term::Var(a), Term::Var(b)) => {
                let a_bound = scope.iter().rev().position(|(x, _)| *x == a.as_str());
                let b_bound = scope.iter().rev().position(|(_, y)| *y == b.as_str());
                match (a_bound, b_bound) {
                    (None, None) => a == b,
                    (a_bound, b_bound) => a_bound == b_bound,
                }
            }
            (Term::Abs(a, a_body), Term::Abs(b, b_body)) => {
                scope.push((a.as_str(), b.as_str()));
                let eq = rec(a_body, b_body, scope);
                scope.pop();
                eq
            }
            (Term::Apply(a_lhs, a_rhs), Term::Apply(b_lhs, b_rhs)) => {
                rec(a_lhs, b_lhs, scope) && rec(a_rhs, b_rhs, scope)
            }
            _ => false,
        }
    }
    rec(lhs, rhs, &mut vec![])
}
