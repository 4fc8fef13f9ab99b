//! The execution pass: expansion, ordering, and the fixture/case loops.
//!
//! Execution is strictly sequential and synchronous. Each selected fixture
//! type is instantiated exactly once; the fixture behavior chain wraps that
//! fixture's whole case sequence, and every expanded case runs inside its
//! own case behavior chain against the shared instance. One failing case
//! aborts only its own chain; a failure before the case loop (fixture
//! setup) means none of that fixture's case chains execute.

use crate::behavior::{CaseContext, CaseNext, FixtureAction, FixtureContext, FixtureNext};
use crate::convention::Convention;
use crate::dispatch::Dispatch;
use crate::errors::ConveneError;
use crate::metadata::{Registry, TypeMeta};
use crate::params::{resolve_parameters, Arg};

// ============================================================================
// CASES AND OUTCOMES
// ============================================================================

/// One concrete, independently-executable invocation: a selected method plus
/// its bound argument tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    fixture: String,
    method: String,
    args: Vec<Arg>,
}

impl Case {
    pub fn new(fixture: impl Into<String>, method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            fixture: fixture.into(),
            method: method.into(),
            args,
        }
    }

    pub fn fixture(&self) -> &str {
        &self.fixture
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The ordering/reporting name. Expanded tuples of one method share it;
    /// their relative order is the declaration order, kept by stable sort.
    pub fn name(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// The name with the bound argument list appended, for display.
    pub fn display_name(&self) -> String {
        if self.args.is_empty() {
            return self.method.clone();
        }
        let rendered: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        format!("{}({})", self.method, rendered.join(", "))
    }
}

/// What happened to one case.
#[derive(Debug)]
pub enum Outcome {
    Passed,
    Failed(ConveneError),
    /// The case never ran because its fixture's chain failed before the
    /// case loop; the shared precondition was unmet.
    SkippedFixture { cause: String },
}

#[derive(Debug)]
pub struct CaseOutcome {
    pub case: Case,
    pub outcome: Outcome,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    pub fn skipped(&self) -> bool {
        matches!(self.outcome, Outcome::SkippedFixture { .. })
    }
}

/// A failure raised by the fixture chain itself (setup, teardown, or a
/// custom fixture behavior), as opposed to any single case.
#[derive(Debug)]
pub struct FixtureFailure {
    pub fixture: String,
    pub error: ConveneError,
}

/// Everything one run produced. Nothing is swallowed: every failure is
/// either a case outcome or a fixture failure.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<CaseOutcome>,
    pub fixture_failures: Vec<FixtureFailure>,
}

impl RunReport {
    /// (passed, failed, skipped) counts over case outcomes.
    pub fn totals(&self) -> (usize, usize, usize) {
        let passed = self.outcomes.iter().filter(|o| o.passed()).count();
        let failed = self.outcomes.iter().filter(|o| o.failed()).count();
        let skipped = self.outcomes.iter().filter(|o| o.skipped()).count();
        (passed, failed, skipped)
    }

    pub fn success(&self) -> bool {
        let (_, failed, skipped) = self.totals();
        failed == 0 && skipped == 0 && self.fixture_failures.is_empty()
    }
}

// ============================================================================
// RUNNER
// ============================================================================

pub struct Runner<'e> {
    registry: &'e Registry,
    dispatch: &'e Dispatch,
    convention: &'e Convention,
}

impl<'e> Runner<'e> {
    pub fn new(registry: &'e Registry, dispatch: &'e Dispatch, convention: &'e Convention) -> Self {
        Self {
            registry,
            dispatch,
            convention,
        }
    }

    /// Runs every selected fixture, sequentially, and reports.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        for ty in self.convention.fixture_types(self.registry) {
            self.run_fixture(ty, &mut report);
        }
        report
    }

    /// Expands one fixture's selected methods into the ordered case list.
    ///
    /// A method with K declared tuples yields K cases bound verbatim in
    /// declaration order; a method with none yields exactly one case with
    /// the empty tuple. The final order is the convention's comparator over
    /// a stable sort, so equal names keep their expansion order.
    pub fn expand_cases(&self, ty: &TypeMeta) -> Vec<Case> {
        let mut cases = Vec::new();
        for method in self.convention.case_methods(self.registry, ty) {
            let tuples = resolve_parameters(self.convention.parameter_sources(), method);
            if tuples.is_empty() {
                cases.push(Case::new(ty.name(), method.name(), Vec::new()));
                continue;
            }
            for tuple in tuples {
                cases.push(Case::new(ty.name(), method.name(), tuple));
            }
        }
        cases.sort_by(|a, b| self.convention.compare(a, b));
        cases
    }

    fn run_fixture(&self, ty: &TypeMeta, report: &mut RunReport) {
        let cases = self.expand_cases(ty);

        // Instance-per-class lifecycle: one instance for the whole sequence.
        let mut instance = match self.dispatch.instantiate(ty.name()) {
            Ok(instance) => instance,
            Err(error) => {
                Self::skip_remaining(&cases, 0, &error, report);
                report.fixture_failures.push(FixtureFailure {
                    fixture: ty.name().to_string(),
                    error,
                });
                return;
            }
        };

        let mut executed = Vec::new();
        let result = {
            let mut case_loop = CaseLoop {
                convention: self.convention,
                cases: &cases,
                outcomes: &mut executed,
            };
            let mut ctx = FixtureContext {
                registry: self.registry,
                dispatch: self.dispatch,
                fixture: ty,
                instance: &mut instance,
            };
            FixtureNext::new(self.convention.fixture_behaviors(), &mut case_loop).run(&mut ctx)
        };

        let ran = executed.len();
        report.outcomes.extend(executed);
        if let Err(error) = result {
            // Cases whose chain never started share the fixture's failure.
            Self::skip_remaining(&cases, ran, &error, report);
            report.fixture_failures.push(FixtureFailure {
                fixture: ty.name().to_string(),
                error,
            });
        }
    }

    fn skip_remaining(cases: &[Case], ran: usize, error: &ConveneError, report: &mut RunReport) {
        for case in &cases[ran..] {
            report.outcomes.push(CaseOutcome {
                case: case.clone(),
                outcome: Outcome::SkippedFixture {
                    cause: error.to_string(),
                },
            });
        }
    }
}

/// The innermost action of the fixture chain: run every case through its
/// own chain, recording each outcome independently.
struct CaseLoop<'r> {
    convention: &'r Convention,
    cases: &'r [Case],
    outcomes: &'r mut Vec<CaseOutcome>,
}

impl FixtureAction for CaseLoop<'_> {
    fn run(&mut self, ctx: &mut FixtureContext<'_>) -> Result<(), ConveneError> {
        for case in self.cases {
            let mut case_ctx = CaseContext {
                registry: ctx.registry,
                dispatch: ctx.dispatch,
                fixture: ctx.fixture,
                instance: &mut *ctx.instance,
                case,
            };
            let chain = CaseNext::new(self.convention.case_behaviors());
            let outcome = match chain.run(&mut case_ctx) {
                Ok(()) => Outcome::Passed,
                Err(error) => Outcome::Failed(error),
            };
            self.outcomes.push(CaseOutcome {
                case: case.clone(),
                outcome,
            });
        }
        Ok(())
    }
}
