use std::ops::Deref;

use gc::{Finalize, Gc, GcCell, Trace};
use gojo_common::error::{Error, NameError, Result, TypeError};
use gojo_common::types::Span;
use rustc_hash::FxHashMap;

use crate::value::{Namespace, Value};

/// A scope of variable bindings, chained to the scope that encloses it.
/// Cloning an `Env` clones the handle, not the bindings.
#[derive(Clone, Debug, Default, Finalize, Trace)]
pub struct Env(Gc<GcCell<EnvImpl>>);

impl Deref for Env {
    type Target = Gc<GcCell<EnvImpl>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Env {
    /// A root scope with the built-in namespaces bound.
    pub fn globals() -> Self {
        let env = Env::default();
        env.define("Math", Value::Namespace(Namespace::Math), true);
        env.define("console", Value::Namespace(Namespace::Console), true);
        env
    }

    pub fn with_parent(parent: &Env) -> Self {
        let env = EnvImpl { map: FxHashMap::default(), parent: Some(parent.clone()) };
        Self(Gc::new(GcCell::new(env)))
    }

    /// Binds `name` in this scope, replacing any earlier binding of the same
    /// name in this scope.
    pub fn define(&self, name: &str, value: Value, constant: bool) {
        self.borrow_mut().map.insert(name.to_string(), Binding { value, constant });
    }

    pub fn get(&self, name: &str, span: &Span) -> Result<Value> {
        let env = self.borrow();
        match env.map.get(name) {
            Some(binding) => Ok(binding.value.clone()),
            None => match &env.parent {
                Some(parent) => parent.get(name, span),
                None => Err((
                    Error::NameError(NameError::NotDefined { name: name.to_string() }),
                    span.clone(),
                )),
            },
        }
    }

    /// Updates the nearest binding of `name`.
    pub fn assign(&self, name: &str, value: Value, span: &Span) -> Result<()> {
        let mut env = self.borrow_mut();
        match env.map.get_mut(name) {
            Some(Binding { constant: true, .. }) => Err((
                Error::TypeError(TypeError::AssignToConstant { name: name.to_string() }),
                span.clone(),
            )),
            Some(binding) => {
                binding.value = value;
                Ok(())
            }
            None => match &env.parent {
                Some(parent) => parent.assign(name, value, span),
                None => Err((
                    Error::NameError(NameError::NotDefined { name: name.to_string() }),
                    span.clone(),
                )),
            },
        }
    }

    /// Bindings of this scope only, sorted by name.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = self
            .borrow()
            .map
            .iter()
            .map(|(name, binding)| (name.clone(), binding.value.clone()))
            .collect::<Vec<_>>();
        bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
        bindings
    }
}

#[derive(Debug, Default, Finalize, Trace)]
pub struct EnvImpl {
    map: FxHashMap<String, Binding>,
    parent: Option<Env>,
}

#[derive(Debug, Finalize, Trace)]
struct Binding {
    value: Value,
    constant: bool,
}
