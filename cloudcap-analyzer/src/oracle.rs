#![forbid(unsafe_code)]

use crate::{ConstraintProgram, OracleError};

/// Three-valued answer of a decision procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SatAnswer {
    Sat,
    Unsat,
    /// Timeout, resource limit or incompleteness.
    Unknown,
}

/// Decides satisfiability of a [`ConstraintProgram`].
pub trait Oracle {
    fn name(&self) -> &str;

    fn check(&mut self, program: &ConstraintProgram) -> Result<SatAnswer, OracleError>;
}

/// Fallback oracle when compiled without `--features z3`.
///
/// It never decides anything, so a build without a solver can only report `Unknown`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSolverOracle;

impl Oracle for NoSolverOracle {
    fn name(&self) -> &str {
        "none"
    }

    fn check(&mut self, program: &ConstraintProgram) -> Result<SatAnswer, OracleError> {
        tracing::warn!(
            constraints = program.constraints().len(),
            "no SMT solver is enabled; rebuild with `--features z3` to decide constraints"
        );
        Ok(SatAnswer::Unknown)
    }
}

/// The best oracle this build offers.
pub fn default_oracle(timeout_ms: u32) -> Box<dyn Oracle> {
    #[cfg(feature = "z3")]
    {
        Box::new(z3_oracle::Z3Oracle::new(timeout_ms))
    }
    #[cfg(not(feature = "z3"))]
    {
        tracing::debug!(timeout_ms, "z3 feature disabled");
        Box::new(NoSolverOracle)
    }
}

#[cfg(feature = "z3")]
pub mod z3_oracle {
    use super::{Oracle, SatAnswer};
    use crate::{ConstraintProgram, OracleError, Relation, Term};

    use z3::{
        ast::{Ast, Bool, Int},
        Config, Context, Params, SatResult, Solver,
    };

    /// Solves with Z3 over unbounded integers.
    ///
    /// Each check builds a fresh context, so no solver state survives between programs.
    #[derive(Clone, Debug)]
    pub struct Z3Oracle {
        timeout_ms: u32,
    }

    impl Z3Oracle {
        pub fn new(timeout_ms: u32) -> Self {
            Self { timeout_ms }
        }
    }

    impl Default for Z3Oracle {
        fn default() -> Self {
            Self::new(10_000)
        }
    }

    fn term<'ctx>(ctx: &'ctx Context, vars: &[Int<'ctx>], t: &Term) -> Int<'ctx> {
        match t {
            Term::Var(v) => vars[v.index()].clone(),
            Term::Int(n) => Int::from_i64(ctx, *n),
            Term::Sum(ts) => {
                if ts.is_empty() {
                    return Int::from_i64(ctx, 0);
                }
                let parts: Vec<Int<'ctx>> = ts.iter().map(|t| term(ctx, vars, t)).collect();
                let refs: Vec<&Int<'ctx>> = parts.iter().collect();
                Int::add(ctx, &refs)
            }
        }
    }

    impl Oracle for Z3Oracle {
        fn name(&self) -> &str {
            "z3"
        }

        fn check(&mut self, program: &ConstraintProgram) -> Result<SatAnswer, OracleError> {
            let cfg = Config::new();
            let ctx = Context::new(&cfg);
            let solver = Solver::new(&ctx);

            let mut params = Params::new(&ctx);
            params.set_u32("timeout", self.timeout_ms);
            // Fixed seeds keep answers reproducible.
            params.set_u32("smt.random_seed", 0);
            params.set_u32("sat.random_seed", 0);
            solver.set_params(&params);

            let vars: Vec<Int<'_>> = program
                .variables()
                .map(|(_, name)| Int::new_const(&ctx, name))
                .collect();
            for c in program.constraints() {
                let lhs = term(&ctx, &vars, &c.lhs);
                let rhs = term(&ctx, &vars, &c.rhs);
                let b: Bool<'_> = match c.relation {
                    Relation::Eq => lhs._eq(&rhs),
                    Relation::Ge => lhs.ge(&rhs),
                    Relation::Le => lhs.le(&rhs),
                };
                solver.assert(&b);
            }

            let answer = match solver.check() {
                SatResult::Sat => SatAnswer::Sat,
                SatResult::Unsat => SatAnswer::Unsat,
                SatResult::Unknown => {
                    tracing::warn!(
                        reason = ?solver.get_reason_unknown(),
                        "z3 could not decide the constraint program"
                    );
                    SatAnswer::Unknown
                }
            };
            tracing::debug!(?answer, "z3 answered");
            Ok(answer)
        }
    }
}
