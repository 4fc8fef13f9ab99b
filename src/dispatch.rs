//! Dispatch table: the engine's stand-in for a reflection substrate.
//!
//! Fixture factories and method callables are bound at registration time and
//! looked up by name at execution time. Calls cross a type-erased boundary
//! (`Box<dyn Any>` instance, `&[Arg]` arguments); a failure raised by the
//! invoked code arrives at that boundary wrapped, and [`Dispatch::invoke`]
//! unwraps it so the caller always observes the true cause, never the
//! wrapper. Boundary faults of the substrate itself (an instance that does
//! not match its binding's concrete type) propagate unchanged.

use std::any::Any;
use std::collections::BTreeMap;

use crate::errors::{ConveneError, Failure};
use crate::metadata::{Registry, Tag};
use crate::params::Arg;

/// A live fixture instance, owned by the execution pass that created it.
pub type Instance = Box<dyn Any>;

type Factory = Box<dyn Fn() -> Instance>;
type BoundMethod = Box<dyn Fn(&mut Instance, &[Arg]) -> Result<(), InvokeError>>;

/// Failure surface of the type-erased call boundary.
#[derive(Debug)]
enum InvokeError {
    /// The invoked method raised; the original cause is carried intact.
    Wrapped(Failure),
    /// The boundary itself failed (instance/binding type mismatch).
    Substrate(String),
}

/// Fixture factories and directly-callable method bindings, keyed by type
/// and method name.
#[derive(Default)]
pub struct Dispatch {
    factories: BTreeMap<String, Factory>,
    methods: BTreeMap<String, BTreeMap<String, BoundMethod>>,
}

impl Dispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for a fixture type.
    pub fn factory<T, F>(&mut self, type_name: impl Into<String>, make: F) -> &mut Self
    where
        T: 'static,
        F: Fn() -> T + 'static,
    {
        let factory: Factory = Box::new(move || {
            let instance: Instance = Box::new(make());
            instance
        });
        self.factories.insert(type_name.into(), factory);
        self
    }

    /// Binds a method of fixture type `T` to a directly-callable closure.
    ///
    /// The stored callable downcasts the erased instance back to `T` and
    /// wraps any failure the closure raises, mirroring a dynamic-dispatch
    /// boundary.
    pub fn bind<T, F>(
        &mut self,
        type_name: impl Into<String>,
        method: impl Into<String>,
        call: F,
    ) -> &mut Self
    where
        T: 'static,
        F: Fn(&mut T, &[Arg]) -> Result<(), Failure> + 'static,
    {
        let entry: BoundMethod = Box::new(move |instance, args| {
            let typed = instance.downcast_mut::<T>().ok_or_else(|| {
                InvokeError::Substrate("instance type does not match binding".to_string())
            })?;
            call(typed, args).map_err(InvokeError::Wrapped)
        });
        self.methods
            .entry(type_name.into())
            .or_default()
            .insert(method.into(), entry);
        self
    }

    /// Creates one instance of the fixture type.
    pub fn instantiate(&self, type_name: &str) -> Result<Instance, ConveneError> {
        match self.factories.get(type_name) {
            Some(factory) => Ok(factory()),
            None => Err(ConveneError::MissingFactory {
                type_name: type_name.to_string(),
            }),
        }
    }

    /// Invokes one bound method synchronously.
    ///
    /// A failure raised inside the invoked code is unwrapped to its original
    /// cause; a substrate fault becomes [`ConveneError::Invocation`] and
    /// propagates unchanged.
    pub fn invoke(
        &self,
        type_name: &str,
        method: &str,
        instance: &mut Instance,
        args: &[Arg],
    ) -> Result<(), ConveneError> {
        let bound = self
            .methods
            .get(type_name)
            .and_then(|methods| methods.get(method))
            .ok_or_else(|| ConveneError::MissingDispatch {
                type_name: type_name.to_string(),
                method: method.to_string(),
            })?;
        match bound(instance, args) {
            Ok(()) => Ok(()),
            // Discard the boundary wrapper; the caller sees the true cause.
            Err(InvokeError::Wrapped(cause)) => Err(ConveneError::Case(cause)),
            Err(InvokeError::Substrate(message)) => Err(ConveneError::Invocation {
                type_name: type_name.to_string(),
                method: method.to_string(),
                message,
            }),
        }
    }

    /// Invokes every method of the type that carries `tag`, directly or
    /// inherited, with no arguments, in enumeration order. Stops at the
    /// first failure.
    pub fn invoke_all(
        &self,
        registry: &Registry,
        type_name: &str,
        tag: Tag,
        instance: &mut Instance,
    ) -> Result<(), ConveneError> {
        for method in registry.methods_with_tag(type_name, tag) {
            self.invoke(type_name, method.name(), instance, &[])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{tags, MethodMeta, TypeMeta};

    struct Counter {
        calls: usize,
    }

    fn counter_dispatch() -> Dispatch {
        let mut dispatch = Dispatch::new();
        dispatch.factory("Counter", || Counter { calls: 0 });
        dispatch.bind("Counter", "bump", |counter: &mut Counter, _args| {
            counter.calls += 1;
            Ok(())
        });
        dispatch
    }

    #[test]
    fn invoke_reaches_the_bound_closure() {
        let dispatch = counter_dispatch();
        let mut instance = dispatch.instantiate("Counter").unwrap();
        dispatch.invoke("Counter", "bump", &mut instance, &[]).unwrap();
        dispatch.invoke("Counter", "bump", &mut instance, &[]).unwrap();
        assert_eq!(instance.downcast_ref::<Counter>().unwrap().calls, 2);
    }

    #[test]
    fn wrapped_failures_are_unwrapped_to_the_original_cause() {
        let original = Failure::new("assertion failed");
        let raised = original.clone();
        let mut dispatch = Dispatch::new();
        dispatch.factory("F", || ());
        dispatch.bind("F", "explode", move |_: &mut (), _args| Err(raised.clone()));

        let mut instance = dispatch.instantiate("F").unwrap();
        let err = dispatch
            .invoke("F", "explode", &mut instance, &[])
            .unwrap_err();
        let cause = err.as_failure().expect("expected the original cause");
        assert!(cause.same_cause(&original));
        assert_eq!(err.to_string(), "assertion failed");
    }

    #[test]
    fn type_mismatch_is_a_substrate_error_not_a_case_failure() {
        let dispatch = counter_dispatch();
        let mut wrong: Instance = Box::new(String::from("not a counter"));
        let err = dispatch
            .invoke("Counter", "bump", &mut wrong, &[])
            .unwrap_err();
        assert!(matches!(err, ConveneError::Invocation { .. }));
        assert!(err.as_failure().is_none());
    }

    #[test]
    fn missing_entries_are_configuration_errors() {
        let dispatch = counter_dispatch();
        assert!(matches!(
            dispatch.instantiate("Ghost").unwrap_err(),
            ConveneError::MissingFactory { .. }
        ));
        let mut instance = dispatch.instantiate("Counter").unwrap();
        assert!(matches!(
            dispatch
                .invoke("Counter", "ghost", &mut instance, &[])
                .unwrap_err(),
            ConveneError::MissingDispatch { .. }
        ));
    }

    #[test]
    fn invoke_all_follows_enumeration_order_and_stops_on_failure() {
        let mut registry = Registry::new();
        registry.register(
            TypeMeta::new("Counter")
                .method(MethodMeta::new("bump").tag(tags::SET_UP))
                .method(MethodMeta::new("explode").tag(tags::SET_UP))
                .method(MethodMeta::new("bump_again").tag(tags::SET_UP)),
        );
        let mut dispatch = counter_dispatch();
        dispatch.bind("Counter", "explode", |_: &mut Counter, _args| {
            Err(Failure::new("setup broke"))
        });
        dispatch.bind("Counter", "bump_again", |counter: &mut Counter, _args| {
            counter.calls += 1;
            Ok(())
        });

        let mut instance = dispatch.instantiate("Counter").unwrap();
        let err = dispatch
            .invoke_all(&registry, "Counter", tags::SET_UP, &mut instance)
            .unwrap_err();
        assert_eq!(err.to_string(), "setup broke");
        // bump ran, bump_again never did
        assert_eq!(instance.downcast_ref::<Counter>().unwrap().calls, 1);
    }
}
