// vim: tw=80
//! A minimal mock object, and the call counting it relies on.
//!
//! [`InvocationMatcher`](crate::InvocationMatcher) doesn't intercept calls by
//! itself.  It registers a callback with anything that implements
//! [`CallInterceptor`].  [`Mock`] is a ready-made implementation that
//! dispatches calls by method name.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering}
    },
    thread
};
use tracing::trace;

use crate::{Arguments, CallResult, Reflect, TypeInfo, Value};

/// Handles one intercepted call.
pub type Callback = Box<dyn Fn(Arguments) -> CallResult + Send + Sync>;

/// Counts the calls made to one mocked method, which must be called exactly
/// `expected` times.
///
/// Calling it too often fails immediately.  Calling it too rarely fails when
/// the counter is dropped.
#[derive(Debug)]
pub struct InvokedCount {
    count: AtomicUsize,
    expected: usize,
}

impl InvokedCount {
    pub fn new(expected: usize) -> Self {
        InvokedCount { count: AtomicUsize::new(0), expected }
    }

    /// Record one call.
    pub fn call(&self) {
        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if count > self.expected {
            if self.expected == 0 {
                panic!("Expectation should not have been called");
            } else {
                panic!("Expectation called more than {} times", self.expected);
            }
        }
    }

    /// How many calls have been recorded so far, including the current one.
    pub fn invocations(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn is_satisfied(&self) -> bool {
        self.invocations() >= self.expected
    }
}

impl Drop for InvokedCount {
    fn drop(&mut self) {
        if !thread::panicking() && !self.is_satisfied() {
            panic!("Expectation called fewer than {} times", self.expected);
        }
    }
}

/// Something whose method calls can be routed to a registered callback.
///
/// The `Debug` representation identifies the object in error messages.
pub trait CallInterceptor: fmt::Debug {
    /// Description of the type whose methods are intercepted.
    fn type_info(&self) -> &TypeInfo;

    /// Route every later call of `method` through `count`, and then to
    /// `callback`.
    fn expects(&mut self, method: &str, count: Arc<InvokedCount>,
               callback: Callback);
}

struct Registration {
    count: Arc<InvokedCount>,
    callback: Callback,
}

/// A dynamic mock object for any type described by a [`TypeInfo`].
///
/// # Examples
/// ```
/// # use consecutive::*;
/// # use std::sync::Arc;
/// let mut mock = Mock::from_type_info(TypeInfo::new("Clock")
///     .method(MethodInfo::new("now")));
/// mock.expects("now", Arc::new(InvokedCount::new(1)),
///     Box::new(|_args| Ok(Box::new(42u64) as Box<dyn Value>)));
/// assert_eq!(42, mock.call_as::<u64>("NOW", args![]).unwrap());
/// ```
pub struct Mock {
    type_info: TypeInfo,
    registrations: HashMap<String, Registration>,
}

impl Mock {
    /// Mock the type `T`.
    pub fn new<T: Reflect>() -> Self {
        Self::from_type_info(T::type_info())
    }

    pub fn from_type_info(type_info: TypeInfo) -> Self {
        Mock { type_info, registrations: HashMap::new() }
    }

    /// Call `method`, whose name is matched without regard to case.
    ///
    /// # Panics
    ///
    /// If no callback is registered for `method`, or if it has already been
    /// called as many times as expected.
    pub fn call(&self, method: &str, args: Arguments) -> CallResult {
        let Some(r) = self.registrations.get(&method.to_lowercase()) else {
            panic!("{self:?}::{method}: No matching expectation found");
        };
        r.count.call();
        trace!(mock = self.type_info.name(), method,
            invocation = r.count.invocations(), "dispatching call");
        (r.callback)(args)
    }

    /// Like [`call`](Self::call), but downcast the returned value to `T`.
    ///
    /// # Panics
    ///
    /// If the returned value isn't a `T`.
    pub fn call_as<T: Value + Clone>(&self, method: &str, args: Arguments)
        -> Result<T, crate::Raised>
    {
        let value = self.call(method, args)?;
        match value.downcast_ref::<T>() {
            Ok(v) => Ok(v.clone()),
            Err(_) => panic!("{self:?}::{method} returned {value:?}, not a {}",
                std::any::type_name::<T>())
        }
    }

    /// Verify that every registered method was called as often as expected,
    /// and forget all registrations.
    ///
    /// # Panics
    ///
    /// If any method was called too few times.
    pub fn checkpoint(&mut self) {
        self.registrations.clear();
    }
}

impl CallInterceptor for Mock {
    fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    fn expects(&mut self, method: &str, count: Arc<InvokedCount>,
               callback: Callback)
    {
        self.registrations.insert(method.to_lowercase(),
            Registration { count, callback });
    }
}

impl fmt::Debug for Mock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Mock<{}>", self.type_info.name())
    }
}
