/*!
 * Declarative registration of injectable functions
 *
 * A [`Registry`] maps `module::function` names to their injection options.
 * [`Registry::wrap`] pairs a function with those options and the shared
 * [`Injector`]; calling the resulting [`WrappedFunction`] goes through the
 * gateway exactly as a hand-written `maybe_inject` closure would, and the
 * unwrapped function stays reachable through
 * [`WrappedFunction::original`].
 *
 * ```
 * use havoc::registry::Registry;
 * use havoc::wrap_fn;
 * use havoc_core_chaos::{ChaosError, FailureKind, Injector, InvocationOptions};
 *
 * fn lookup(id: u32) -> Result<String, ChaosError> {
 *     Ok(format!("user-{}", id))
 * }
 *
 * let mut registry: Registry<ChaosError> = Registry::new(Injector::disabled());
 * registry
 *     .register(module_path!(), "lookup", InvocationOptions::new().with_failure_type(FailureKind::Null))
 *     .unwrap();
 *
 * let wrapped = wrap_fn!(registry, lookup);
 * assert_eq!(wrapped.call((7,)).unwrap(), Some("user-7".to_string()));
 * assert_eq!((wrapped.original())(7).unwrap(), "user-7");
 * ```
 */

use havoc_core_chaos::{ChaosError, Injector, InvocationOptions};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::FunctionProfile;
use crate::error::{HavocError, Result};

/// Identity of a registered function
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId {
    pub module: String,
    pub function: String,
}

impl FunctionId {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.function)
    }
}

/// Something callable with its arguments packed into a tuple
///
/// Implemented for every `Fn` of up to six arguments, so `f(a, b)` is
/// invoked as `f.invoke((a, b))` and a zero-argument `f()` as `f.invoke(())`.
pub trait Callable<Args> {
    type Output;

    fn invoke(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg),*> Callable<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out,
        {
            type Output = Out;

            #[allow(non_snake_case)]
            fn invoke(&self, ($($arg,)*): ($($arg,)*)) -> Out {
                self($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);

/// Registered per-function options
///
/// `E` is the application's error type; it receives both configured error
/// values and injected failures.
pub struct Registry<E> {
    injector: Injector,
    entries: HashMap<FunctionId, Arc<InvocationOptions<E>>>,
}

impl<E> Registry<E> {
    pub fn new(injector: Injector) -> Self {
        Self {
            injector,
            entries: HashMap::new(),
        }
    }

    /// Shared gateway used by every wrapped function
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// Register options for `module::function`
    ///
    /// Options are validated and stamped with the function's identity.
    pub fn register(
        &mut self,
        module: impl Into<String>,
        function: impl Into<String>,
        options: InvocationOptions<E>,
    ) -> Result<()> {
        let id = FunctionId::new(module, function);
        if self.entries.contains_key(&id) {
            return Err(HavocError::DuplicateFunction(id.to_string()));
        }
        options.validate()?;

        let options = options.with_caller(id.module.clone(), id.function.clone());
        tracing::debug!(function = %id, rate = ?options.failure_rate, "registered function");
        self.entries.insert(id, Arc::new(options));
        Ok(())
    }

    /// Register every profile from a config file
    ///
    /// `convert` turns the file's string error values into `E`. Stops at the
    /// first invalid or repeated profile.
    pub fn register_profiles<F>(&mut self, profiles: &[FunctionProfile], mut convert: F) -> Result<()>
    where
        F: FnMut(String) -> E,
    {
        for profile in profiles {
            let options = profile.options.clone().map_errors(&mut convert);
            self.register(profile.module.clone(), profile.function.clone(), options)?;
        }
        Ok(())
    }

    /// Options registered for `module::function`
    pub fn options(&self, module: &str, function: &str) -> Option<&InvocationOptions<E>> {
        self.entries
            .get(&FunctionId::new(module, function))
            .map(Arc::as_ref)
    }

    pub fn contains(&self, module: &str, function: &str) -> bool {
        self.options(module, function).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identities, sorted
    pub fn functions(&self) -> Vec<&FunctionId> {
        let mut ids: Vec<_> = self.entries.keys().collect();
        ids.sort();
        ids
    }

    /// Wrap `f` with the options registered for `module::function`
    ///
    /// Unregistered functions are wrapped with empty options, so the global
    /// defaults decide their behavior.
    pub fn wrap<F>(&self, module: &str, function: &str, f: F) -> WrappedFunction<F, E> {
        let id = FunctionId::new(module, function);
        let options = match self.entries.get(&id) {
            Some(options) => Arc::clone(options),
            None => Arc::new(InvocationOptions::new().with_caller(module, function)),
        };
        WrappedFunction {
            id,
            original: f,
            options,
            injector: self.injector.clone(),
        }
    }
}

impl<E> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.functions())
            .finish()
    }
}

/// A function paired with its injection options
pub struct WrappedFunction<F, E> {
    id: FunctionId,
    original: F,
    options: Arc<InvocationOptions<E>>,
    injector: Injector,
}

impl<F, E> WrappedFunction<F, E> {
    pub fn id(&self) -> &FunctionId {
        &self.id
    }

    /// The unmodified implementation
    pub fn original(&self) -> &F {
        &self.original
    }

    pub fn options(&self) -> &InvocationOptions<E> {
        &self.options
    }

    /// Call through the gateway
    ///
    /// Arguments are packed in a tuple: `call(())`, `call((a,))`,
    /// `call((a, b))`. `Ok(None)` is an injected `Null`.
    pub fn call<Args, T>(&self, args: Args) -> std::result::Result<Option<T>, E>
    where
        F: Callable<Args, Output = std::result::Result<T, E>>,
        E: From<ChaosError> + Clone,
    {
        self.injector
            .maybe_inject(|| self.original.invoke(args), &self.options)
    }

    /// Call an async function through the gateway
    pub async fn call_async<Args, T, Fut>(&self, args: Args) -> std::result::Result<Option<T>, E>
    where
        F: Callable<Args, Output = Fut>,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<ChaosError> + Clone,
    {
        self.injector
            .maybe_inject_async(|| self.original.invoke(args), &self.options)
            .await
    }
}

impl<F: Clone, E> Clone for WrappedFunction<F, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            original: self.original.clone(),
            options: Arc::clone(&self.options),
            injector: self.injector.clone(),
        }
    }
}

impl<F, E> fmt::Debug for WrappedFunction<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedFunction")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Wrap a function defined in the current module, picking up its identity
///
/// `wrap_fn!(registry, charge)` is `registry.wrap(module_path!(), "charge", charge)`.
/// Pass the module explicitly for functions defined elsewhere:
/// `wrap_fn!(registry, "app::billing", billing::charge)`.
#[macro_export]
macro_rules! wrap_fn {
    ($registry:expr, $func:ident) => {
        $registry.wrap(module_path!(), stringify!($func), $func)
    };
    ($registry:expr, $module:expr, $func:path) => {
        $registry.wrap(
            $module,
            $crate::registry::function_name(stringify!($func)),
            $func,
        )
    };
}

/// Last segment of a stringified path
#[doc(hidden)]
pub fn function_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}
