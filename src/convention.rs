//! Convention configuration: the single registration surface of the engine.
//!
//! A [`Convention`] bundles everything the runner needs to turn a candidate
//! pool into an execution plan: the fixture-type predicate, the case-method
//! predicate and its exclusion predicate, the case comparator, the ordered
//! behavior lists, and the ordered parameter sources.
//! [`Convention::standard`] is the built-in flavor: tag-driven selection,
//! ordinal ordering, setup/teardown behaviors, declared-tuple parameters.

use std::cmp::Ordering;

use crate::behavior::{CaseBehavior, FixtureBehavior, FixtureSetUpTearDown, SetUpTearDown};
use crate::metadata::{tags, MethodMeta, Registry, TypeMeta};
use crate::params::{FromCaseDeclarations, ParameterSource};
use crate::runner::Case;

type TypePredicate = Box<dyn Fn(&Registry, &TypeMeta) -> bool>;
type MethodPredicate = Box<dyn Fn(&MethodMeta) -> bool>;
type CaseComparator = Box<dyn Fn(&Case, &Case) -> Ordering>;

pub struct Convention {
    fixture_predicate: TypePredicate,
    case_predicate: MethodPredicate,
    exclusion_predicate: MethodPredicate,
    comparator: CaseComparator,
    fixture_behaviors: Vec<Box<dyn FixtureBehavior>>,
    case_behaviors: Vec<Box<dyn CaseBehavior>>,
    parameter_sources: Vec<Box<dyn ParameterSource>>,
}

impl Convention {
    /// An empty convention: selects nothing, excludes nothing, orders by
    /// name, wraps with nothing. Every piece is filled in by the builder
    /// methods.
    pub fn new() -> Self {
        Self {
            fixture_predicate: Box::new(|_, _| false),
            case_predicate: Box::new(|_| false),
            exclusion_predicate: Box::new(|_| false),
            comparator: Box::new(|a, b| a.name().cmp(b.name())),
            fixture_behaviors: Vec::new(),
            case_behaviors: Vec::new(),
            parameter_sources: Vec::new(),
        }
    }

    /// The standard tag-driven convention:
    /// - a type is a fixture iff it carries `fixture`, directly or inherited
    /// - a method is a case iff it carries `case` or `case-params`,
    ///   directly or inherited, and does not carry `skip` directly
    /// - cases sort by ordinal (byte-wise) name comparison
    /// - fixture execution is wrapped in fixture setup/teardown, each case
    ///   in case setup/teardown
    /// - parameters come from the method's declared case tuples
    pub fn standard() -> Self {
        Self::new()
            .fixtures(|registry, ty| registry.has_or_inherits(ty.name(), tags::FIXTURE))
            .cases(|m| m.has_or_inherits(tags::CASE) || m.has_or_inherits(tags::CASE_PARAMS))
            .exclude(|m| m.has_tag(tags::SKIP))
            .wrap_fixture(FixtureSetUpTearDown)
            .wrap_case(SetUpTearDown)
            .parameters(FromCaseDeclarations)
    }

    // =====================
    // Builder methods
    // =====================

    pub fn fixtures(mut self, predicate: impl Fn(&Registry, &TypeMeta) -> bool + 'static) -> Self {
        self.fixture_predicate = Box::new(predicate);
        self
    }

    pub fn cases(mut self, predicate: impl Fn(&MethodMeta) -> bool + 'static) -> Self {
        self.case_predicate = Box::new(predicate);
        self
    }

    pub fn exclude(mut self, predicate: impl Fn(&MethodMeta) -> bool + 'static) -> Self {
        self.exclusion_predicate = Box::new(predicate);
        self
    }

    pub fn sort_cases(mut self, comparator: impl Fn(&Case, &Case) -> Ordering + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    /// Appends a fixture-scoped behavior. Wrapping order is registration
    /// order, outermost first.
    pub fn wrap_fixture(mut self, behavior: impl FixtureBehavior + 'static) -> Self {
        self.fixture_behaviors.push(Box::new(behavior));
        self
    }

    /// Appends a case-scoped behavior. Wrapping order is registration
    /// order, outermost first.
    pub fn wrap_case(mut self, behavior: impl CaseBehavior + 'static) -> Self {
        self.case_behaviors.push(Box::new(behavior));
        self
    }

    /// Appends a parameter source. Sources contribute tuples in
    /// registration order.
    pub fn parameters(mut self, source: impl ParameterSource + 'static) -> Self {
        self.parameter_sources.push(Box::new(source));
        self
    }

    // =====================
    // Selection
    // =====================

    /// The fixture types to run, in registration order. Pure filtering; an
    /// empty result is valid.
    pub fn fixture_types<'r>(&self, registry: &'r Registry) -> Vec<&'r TypeMeta> {
        registry
            .types()
            .filter(|ty| (self.fixture_predicate)(registry, ty))
            .collect()
    }

    /// The case methods of one fixture, in enumeration order, with excluded
    /// methods filtered out.
    pub fn case_methods<'r>(&self, registry: &'r Registry, ty: &TypeMeta) -> Vec<&'r MethodMeta> {
        registry
            .effective_methods(ty.name())
            .iter()
            .filter(|m| (self.case_predicate)(m) && !(self.exclusion_predicate)(m))
            .collect()
    }

    pub fn compare(&self, a: &Case, b: &Case) -> Ordering {
        (self.comparator)(a, b)
    }

    pub fn fixture_behaviors(&self) -> &[Box<dyn FixtureBehavior>] {
        &self.fixture_behaviors
    }

    pub fn case_behaviors(&self) -> &[Box<dyn CaseBehavior>] {
        &self.case_behaviors
    }

    pub fn parameter_sources(&self) -> &[Box<dyn ParameterSource>] {
        &self.parameter_sources
    }
}

impl Default for Convention {
    fn default() -> Self {
        Self::standard()
    }
}
