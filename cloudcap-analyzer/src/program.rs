#![forbid(unsafe_code)]

use std::fmt::{self, Write as _};

/// Handle to an integer unknown declared in a [`ConstraintProgram`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Linear integer expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    Var(Variable),
    Int(i64),
    Sum(Vec<Term>),
}

impl Term {
    pub fn sum(terms: impl IntoIterator<Item = impl Into<Term>>) -> Self {
        Term::Sum(terms.into_iter().map(Into::into).collect())
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Var(v)
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Int(n)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ge,
    Le,
}

impl Relation {
    fn smt_operator(self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Ge => ">=",
            Relation::Le => "<=",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub lhs: Term,
    pub relation: Relation,
    pub rhs: Term,
}

impl Constraint {
    pub fn new(lhs: impl Into<Term>, relation: Relation, rhs: impl Into<Term>) -> Self {
        Self {
            lhs: lhs.into(),
            relation,
            rhs: rhs.into(),
        }
    }

    pub fn eq(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Self::new(lhs, Relation::Eq, rhs)
    }

    pub fn ge(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Self::new(lhs, Relation::Ge, rhs)
    }

    pub fn le(lhs: impl Into<Term>, rhs: impl Into<Term>) -> Self {
        Self::new(lhs, Relation::Le, rhs)
    }
}

/// Integer unknowns plus the conjunction of constraints over them.
///
/// Variables and constraints are kept in creation order, so the textual form of a program is a
/// deterministic function of the sequence of calls that built it.
#[derive(Clone, Debug, Default)]
pub struct ConstraintProgram {
    names: Vec<String>,
    constraints: Vec<Constraint>,
}

impl ConstraintProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>) -> Variable {
        let name = name.into();
        tracing::debug!(%name, "declare variable");
        self.names.push(name);
        Variable(self.names.len() - 1)
    }

    pub fn assert(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn name(&self, var: Variable) -> &str {
        &self.names[var.0]
    }

    pub fn variables(&self) -> impl Iterator<Item = (Variable, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (Variable(i), n.as_str()))
    }

    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// SMT-LIB 2 rendering: one `declare-fun` per variable, then one `assert` per constraint.
    pub fn to_smtlib(&self) -> String {
        let mut out = String::new();
        for name in &self.names {
            let _ = writeln!(out, "(declare-fun {} () Int)", Symbol(name));
        }
        for c in &self.constraints {
            let _ = writeln!(
                out,
                "(assert ({} {} {}))",
                c.relation.smt_operator(),
                self.render(&c.lhs),
                self.render(&c.rhs)
            );
        }
        out
    }

    fn render(&self, term: &Term) -> String {
        match term {
            Term::Var(v) => Symbol(self.name(*v)).to_string(),
            Term::Int(n) if *n < 0 => format!("(- {})", n.unsigned_abs()),
            Term::Int(n) => n.to_string(),
            Term::Sum(terms) => match terms.as_slice() {
                [] => "0".to_string(),
                [only] => self.render(only),
                many => {
                    let parts: Vec<String> = many.iter().map(|t| self.render(t)).collect();
                    format!("(+ {})", parts.join(" "))
                }
            },
        }
    }
}

/// `|`-quoted SMT-LIB symbol. `|` and `\` cannot appear inside one and are replaced.
struct Symbol<'a>(&'a str);

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('|')?;
        for c in self.0.chars() {
            f.write_char(if c == '|' || c == '\\' { '_' } else { c })?;
        }
        f.write_char('|')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_smtlib() {
        let mut p = ConstraintProgram::new();
        let q = p.declare("arn:aws:sqs:us-east-1:123:q.nrequests");
        let e1 = p.declare("a.b.nrequests");
        let e2 = p.declare("c.b.nrequests");
        p.assert(Constraint::eq(q, Term::sum([e1])));
        p.assert(Constraint::eq(q, Term::sum([e1, e2])));
        p.assert(Constraint::ge(e2, -3i64));

        assert_eq!(
            p.to_smtlib(),
            "(declare-fun |arn:aws:sqs:us-east-1:123:q.nrequests| () Int)\n\
             (declare-fun |a.b.nrequests| () Int)\n\
             (declare-fun |c.b.nrequests| () Int)\n\
             (assert (= |arn:aws:sqs:us-east-1:123:q.nrequests| |a.b.nrequests|))\n\
             (assert (= |arn:aws:sqs:us-east-1:123:q.nrequests| (+ |a.b.nrequests| |c.b.nrequests|)))\n\
             (assert (>= |c.b.nrequests| (- 3)))\n"
        );
    }

    #[test]
    fn symbols_never_contain_quote_characters() {
        let mut p = ConstraintProgram::new();
        p.declare("odd|name\\x");
        assert_eq!(p.to_smtlib(), "(declare-fun |odd_name_x| () Int)\n");
    }

    #[test]
    fn empty_sum_is_zero() {
        let mut p = ConstraintProgram::new();
        let v = p.declare("v");
        p.assert(Constraint::le(v, Term::Sum(Vec::new())));
        assert!(p.to_smtlib().ends_with("(assert (<= |v| 0))\n"));
    }
}
