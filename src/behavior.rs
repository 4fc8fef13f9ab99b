//! Behavior chains: composable wrapping around execution.
//!
//! A behavior is a stateless orchestrator with a single operation
//! `execute(context, next)`, where `next` continues the rest of the chain
//! and, past the last behavior, the innermost action. Fixture behaviors wrap
//! the whole case loop of one fixture; case behaviors wrap one invocation.
//!
//! The built-in behaviors invoke every setup-tagged method before `next` and
//! every teardown-tagged method after it. Note the post-`next` step is
//! unprotected: when the wrapped action fails, teardown does not run. That
//! matches the system this engine reimplements; see DESIGN.md.

use crate::dispatch::{Dispatch, Instance};
use crate::errors::ConveneError;
use crate::metadata::{tags, Registry, Tag, TypeMeta};
use crate::runner::Case;

// ============================================================================
// EXECUTION CONTEXTS
// ============================================================================

/// What a fixture behavior sees: one fixture type and its live instance.
pub struct FixtureContext<'e> {
    pub registry: &'e Registry,
    pub dispatch: &'e Dispatch,
    pub fixture: &'e TypeMeta,
    pub instance: &'e mut Instance,
}

impl FixtureContext<'_> {
    /// Invokes every method of the fixture carrying `tag`, in enumeration
    /// order, with no arguments.
    pub fn invoke_all(&mut self, tag: Tag) -> Result<(), ConveneError> {
        self.dispatch
            .invoke_all(self.registry, self.fixture.name(), tag, self.instance)
    }
}

/// What a case behavior sees: one expanded case and the fixture instance it
/// shares with its siblings.
pub struct CaseContext<'e> {
    pub registry: &'e Registry,
    pub dispatch: &'e Dispatch,
    pub fixture: &'e TypeMeta,
    pub instance: &'e mut Instance,
    pub case: &'e Case,
}

impl CaseContext<'_> {
    /// Invokes every method of the fixture carrying `tag`, in enumeration
    /// order, with no arguments.
    pub fn invoke_all(&mut self, tag: Tag) -> Result<(), ConveneError> {
        self.dispatch
            .invoke_all(self.registry, self.fixture.name(), tag, self.instance)
    }

    /// Invokes the case method itself, with the case's bound arguments.
    pub fn invoke_case(&mut self) -> Result<(), ConveneError> {
        self.dispatch.invoke(
            self.fixture.name(),
            self.case.method(),
            self.instance,
            self.case.args(),
        )
    }
}

// ============================================================================
// CHAIN COMPOSITION
// ============================================================================

/// The innermost action of a fixture chain. The runner supplies the case
/// loop; tests may supply anything.
pub trait FixtureAction {
    fn run(&mut self, ctx: &mut FixtureContext<'_>) -> Result<(), ConveneError>;
}

/// A unit of wrapping around one fixture's whole case sequence.
pub trait FixtureBehavior {
    fn execute(
        &self,
        ctx: &mut FixtureContext<'_>,
        next: &mut FixtureNext<'_>,
    ) -> Result<(), ConveneError>;
}

/// A unit of wrapping around one case invocation.
pub trait CaseBehavior {
    fn execute(&self, ctx: &mut CaseContext<'_>, next: &CaseNext<'_>) -> Result<(), ConveneError>;
}

/// The rest of a fixture chain: remaining behaviors, then the innermost
/// action. Calling [`FixtureNext::run`] continues the chain exactly once.
pub struct FixtureNext<'c> {
    rest: &'c [Box<dyn FixtureBehavior>],
    innermost: &'c mut dyn FixtureAction,
}

impl<'c> FixtureNext<'c> {
    pub fn new(
        behaviors: &'c [Box<dyn FixtureBehavior>],
        innermost: &'c mut dyn FixtureAction,
    ) -> Self {
        Self {
            rest: behaviors,
            innermost,
        }
    }

    pub fn run(&mut self, ctx: &mut FixtureContext<'_>) -> Result<(), ConveneError> {
        match self.rest.split_first() {
            Some((head, rest)) => {
                let mut next = FixtureNext {
                    rest,
                    innermost: &mut *self.innermost,
                };
                head.execute(ctx, &mut next)
            }
            None => self.innermost.run(ctx),
        }
    }
}

/// The rest of a case chain: remaining behaviors, then the invocation.
pub struct CaseNext<'c> {
    rest: &'c [Box<dyn CaseBehavior>],
}

impl<'c> CaseNext<'c> {
    pub fn new(behaviors: &'c [Box<dyn CaseBehavior>]) -> Self {
        Self { rest: behaviors }
    }

    pub fn run(&self, ctx: &mut CaseContext<'_>) -> Result<(), ConveneError> {
        match self.rest.split_first() {
            Some((head, rest)) => head.execute(ctx, &CaseNext { rest }),
            None => ctx.invoke_case(),
        }
    }
}

// ============================================================================
// BUILT-IN BEHAVIORS
// ============================================================================

/// Fixture setup/teardown: `fixture-setup` methods before the case loop,
/// `fixture-teardown` methods after it.
pub struct FixtureSetUpTearDown;

impl FixtureBehavior for FixtureSetUpTearDown {
    fn execute(
        &self,
        ctx: &mut FixtureContext<'_>,
        next: &mut FixtureNext<'_>,
    ) -> Result<(), ConveneError> {
        ctx.invoke_all(tags::FIXTURE_SET_UP)?;
        next.run(ctx)?;
        ctx.invoke_all(tags::FIXTURE_TEAR_DOWN)
    }
}

/// Case setup/teardown: `setup` methods before each invocation, `teardown`
/// methods after it.
pub struct SetUpTearDown;

impl CaseBehavior for SetUpTearDown {
    fn execute(&self, ctx: &mut CaseContext<'_>, next: &CaseNext<'_>) -> Result<(), ConveneError> {
        ctx.invoke_all(tags::SET_UP)?;
        next.run(ctx)?;
        ctx.invoke_all(tags::TEAR_DOWN)
    }
}
