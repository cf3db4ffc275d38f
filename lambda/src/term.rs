#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    /// `x`
    Var(String),
    /// `λx.t`
    Abs(String, Box<Term>),
    /// `t t`
    Apply(Box<Term>, Box<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn abs(bound: impl Into<String>, body: Term) -> Self {
        Term::Abs(bound.into(), body.into())
    }

    pub fn apply(lhs: Term, rhs: Term) -> Self {
        Term::Apply(lhs.into(), rhs.into())
    }

    pub fn pretty(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(name) => f.write_str(name),
            Term::Abs(bound, body) => f.write_fmt(format_args!("λ{bound}.{body}")),
            Term::Apply(lhs, rhs) => {
                // application is left-associative, so only an abstraction needs
                // grouping on the left
                match lhs.as_ref() {
                    Term::Abs(..) => f.write_fmt(format_args!("({lhs})"))?,
                    _ => f.write_fmt(format_args!("{lhs}"))?,
                }
                f.write_str(" ")?;
                match rhs.as_ref() {
                    Term::Var(_) => f.write_fmt(format_args!("{rhs}")),
                    _ => f.write_fmt(format_args!("({rhs})")),
                }
            }
        }
    }
}
