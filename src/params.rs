//! Parameter sources: expansion of a case method into concrete argument
//! tuples.
//!
//! A [`ParameterSource`] is a pure strategy: given a method's metadata it
//! yields a finite sequence of argument tuples, one per data-driven case
//! declaration. Sources compose by concatenation in registration order; an
//! empty result is valid and simply means the method runs once with no
//! arguments.

use std::fmt;

use crate::metadata::MethodMeta;

/// A literal argument value bound into an expanded case.
///
/// # Examples
///
/// ```rust
/// use convene::params::Arg;
/// let n = Arg::Number(3.0);
/// assert_eq!(n.type_name(), "Number");
/// assert_eq!(n.as_number(), Some(3.0));
/// assert!(Arg::default().is_nil());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Arg {
    #[default]
    Nil,
    Number(f64),
    String(String),
    Bool(bool),
}

impl Arg {
    /// Returns the type name of the argument as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Nil => "Nil",
            Arg::Number(_) => "Number",
            Arg::String(_) => "String",
            Arg::Bool(_) => "Bool",
        }
    }

    /// Returns true if the argument is Nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Arg::Nil)
    }

    /// Returns the contained number if this is a Number argument.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained bool if this is a Bool argument.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained string if this is a String argument.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Nil => write!(f, "nil"),
            Arg::Number(n) => write!(f, "{}", n),
            Arg::String(s) => write!(f, "{:?}", s),
            Arg::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One argument tuple, as declared on a case method.
pub type ArgTuple = Vec<Arg>;

/// A strategy that expands a method declaration into concrete argument
/// tuples. Pure: no side effects, restartable, finite.
pub trait ParameterSource {
    fn parameters(&self, method: &MethodMeta) -> Vec<ArgTuple>;
}

/// The built-in source: emits the method's declared case tuples verbatim,
/// in declaration order.
pub struct FromCaseDeclarations;

impl ParameterSource for FromCaseDeclarations {
    fn parameters(&self, method: &MethodMeta) -> Vec<ArgTuple> {
        method.case_tuples().to_vec()
    }
}

/// Concatenates every source's output in registration order.
///
/// Absence of declarations yields an empty sequence, never an error.
pub fn resolve_parameters(
    sources: &[Box<dyn ParameterSource>],
    method: &MethodMeta,
) -> Vec<ArgTuple> {
    let mut tuples = Vec::new();
    for source in sources {
        tuples.extend(source.parameters(method));
    }
    tuples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tags;

    struct Fixed(Vec<ArgTuple>);

    impl ParameterSource for Fixed {
        fn parameters(&self, _method: &MethodMeta) -> Vec<ArgTuple> {
            self.0.clone()
        }
    }

    #[test]
    fn declared_tuples_are_emitted_verbatim_in_order() {
        let method = MethodMeta::new("holds_args")
            .tag(tags::CASE_PARAMS)
            .case(vec![Arg::Number(1.0), Arg::String("a".into())])
            .case(vec![Arg::Number(2.0), Arg::String("b".into())]);
        let tuples = FromCaseDeclarations.parameters(&method);
        assert_eq!(
            tuples,
            vec![
                vec![Arg::Number(1.0), Arg::String("a".into())],
                vec![Arg::Number(2.0), Arg::String("b".into())],
            ]
        );
    }

    #[test]
    fn no_declarations_yield_an_empty_sequence() {
        let method = MethodMeta::new("plain").tag(tags::CASE);
        assert!(FromCaseDeclarations.parameters(&method).is_empty());
    }

    #[test]
    fn sources_concatenate_in_registration_order() {
        let sources: Vec<Box<dyn ParameterSource>> = vec![
            Box::new(Fixed(vec![vec![Arg::Number(1.0)]])),
            Box::new(Fixed(vec![vec![Arg::Number(2.0)], vec![Arg::Number(3.0)]])),
        ];
        let method = MethodMeta::new("m").tag(tags::CASE_PARAMS);
        let tuples = resolve_parameters(&sources, &method);
        assert_eq!(
            tuples,
            vec![
                vec![Arg::Number(1.0)],
                vec![Arg::Number(2.0)],
                vec![Arg::Number(3.0)],
            ]
        );
    }
}
