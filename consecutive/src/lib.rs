// vim: tw=80
//! Per-call argument verification for mocked methods that are called several
//! times in a row.
//!
//! A mocked method that is invoked `N` times during a test often needs to
//! receive different arguments, and to respond differently, on each of those
//! calls.  Consecutive lets you declare one expectation per call position, in
//! order.  On the `i`th call the `i`th expectation is consulted: its arguments
//! are compared against the actual arguments, and either its return value is
//! handed back, or the test fails with a diagnostic describing every
//! mismatch.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Default values and surplus arguments`](#default-values-and-surplus-arguments)
//! * [`Raising errors`](#raising-errors)
//! * [`Reflection`](#reflection)
//! * [`Strict sequences`](#strict-sequences)
//!
//! ## Getting Started
//! ```
//! use consecutive::*;
//!
//! struct Calendar;
//!
//! #[reflect]
//! impl Calendar {
//!     fn set_iso_date(&mut self, year: i32, week: i32, #[default(1)] day: i32)
//!         -> bool
//!     {
//!         unimplemented!()
//!     }
//! }
//!
//! let mut mock = Mock::new::<Calendar>();
//! InvocationMatcher::default()
//!     .expect_consecutive_calls(&mut mock, "set_iso_date", vec![
//!         MethodCall::returning(true).arg(1999).arg(42).into(),
//!         MethodCall::returning(false).arg(2000).arg(43).arg(2).into(),
//!     ])
//!     .unwrap();
//!
//! assert!(mock.call_as::<bool>("set_iso_date", args![1999, 42]).unwrap());
//! assert!(!mock.call_as::<bool>("set_iso_date", args![2000, 43, 2]).unwrap());
//! ```
//!
//! The mock must be called exactly as many times as there are expectations.
//! Calling it more often fails immediately; calling it less often fails when
//! the mock is dropped or [`Mock::checkpoint`] is called.
//!
//! ## Matching arguments
//!
//! Literal arguments are compared with strict equality: the actual argument
//! must have exactly the same type as the expected one, and compare equal.
//! `0i64` never matches `0i32`.  Arguments may instead be checked with any
//! [`Predicate`] from the [`predicates`](predicate/index.html) crate, or with a
//! fallible closure.
//!
//! ```
//! # use consecutive::*;
//! # struct Clock;
//! # #[reflect]
//! # impl Clock {
//! #     fn set_timestamp(&mut self, timestamp: i64) -> bool { unimplemented!() }
//! # }
//! let mut mock = Mock::new::<Clock>();
//! InvocationMatcher::default()
//!     .expect_consecutive_calls(&mut mock, "set_timestamp", vec![
//!         MethodCall::returning(true)
//!             .arg_with(predicate::gt(0i64))
//!             .into(),
//!         MethodCall::returning(true)
//!             .arg_withf(|t: &i64| -> Result<bool, std::num::TryFromIntError> {
//!                 Ok(u32::try_from(*t)? < 100)
//!             })
//!             .into(),
//!     ])
//!     .unwrap();
//! mock.call("set_timestamp", args![5i64]).unwrap();
//! mock.call("set_timestamp", args![42i64]).unwrap();
//! ```
//!
//! By default, checking stops at the first mismatching argument.  Use
//! [`InvocationMatcher::with_is_aborting_on_first_failure`] to report every
//! mismatch instead.
//!
//! ## Default values and surplus arguments
//!
//! When the expectation names fewer arguments than the method declares, the
//! trailing parameters that have default values are accepted without being
//! listed.  Arguments beyond the method's declared parameters are "surplus".
//!
//! Surplus detection is asymmetric.  A call is only checked for
//! surplus when it has more arguments than the method declares parameters,
//! and then it passes only if the expectation lists exactly as many arguments
//! as the call has (counting the omitted trailing defaults).  Expecting only
//! some of the surplus arguments is not enough: every argument beyond the
//! declared parameters is then reported, including the expected ones.
//! Conversely, a call that passes more arguments than the expectation lists
//! is never reported, as long as it stays within the declared parameters.
//!
//! Surplus checking can be turned off entirely with
//! [`MatcherConfig::with_is_ignoring_surplus_arguments`].
//!
//! ## Raising errors
//!
//! Any call position may raise an error instead of returning.  No argument
//! checking happens for such a call.
//!
//! ```
//! # use consecutive::*;
//! # struct Clock;
//! # #[reflect]
//! # impl Clock {
//! #     fn set_timestamp(&mut self, timestamp: i64) -> bool { unimplemented!() }
//! # }
//! let mut mock = Mock::new::<Clock>();
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "offline");
//! InvocationMatcher::default()
//!     .expect_consecutive_calls(&mut mock, "set_timestamp", vec![
//!         ExpectationCase::throws(error),
//!     ])
//!     .unwrap();
//! let raised = mock.call("set_timestamp", args![0i64]).unwrap_err();
//! assert_eq!("offline", raised.to_string());
//! ```
//!
//! ## Reflection
//!
//! Rust has no runtime reflection, so the parameter names, default values, and
//! type hierarchy that diagnostics rely on are described with [`TypeInfo`].
//! The [`#[reflect]`](macro@reflect) attribute derives that description from an
//! ordinary `impl` block or trait.  It can also be written by hand:
//!
//! ```
//! # use consecutive::*;
//! let info = TypeInfo::new("DateTime")
//!     .method(MethodInfo::new("setDate")
//!         .param(ParamInfo::required("year"))
//!         .param(ParamInfo::required("month"))
//!         .param(ParamInfo::required("day")));
//! let mock = Mock::from_type_info(info);
//! ```
//!
//! ## Strict sequences
//!
//! [`StrictSequenceMatcher`] is a lighter variant that compares every
//! argument by strict equality and always reports all differing positions.

use downcast::{downcast, Any};
use std::{
    any,
    error::Error as StdError,
    fmt,
    sync::Arc
};

mod config;
mod error;
mod expectation;
mod format;
mod host;
mod matcher;
mod reflect;
mod resolver;
mod strict;

// Lets #[reflect] be used within this crate's own unit tests.
extern crate self as consecutive;

pub use crate::config::MatcherConfig;
pub use crate::error::{Error, Result};
pub use crate::expectation::{
    ArgumentSpec,
    ExpectationCase,
    ExpectationSequence,
    Matcher,
    MethodCall,
    Verdict
};
pub use crate::format::{ArgumentFormatter, ArgumentName};
pub use crate::host::{CallInterceptor, Callback, InvokedCount, Mock};
pub use crate::matcher::{InvocationMatcher, InvocationMatcherBuilder};
pub use crate::reflect::{
    MethodInfo,
    ParamInfo,
    ParameterDescriptor,
    ParameterMetadataResolver,
    Reflect,
    TypeInfo
};
pub use crate::resolver::{MethodLocator, MethodResolver, ResolvedMethod};
pub use crate::strict::{FunctionCall, StrictSequenceMatcher};
pub use consecutive_derive::reflect;
pub use predicates::prelude::{Predicate, predicate};

/// Any error that a collaborator may fail with.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// An error raised by a mocked call, handed back to the caller verbatim.
pub type Raised = Arc<dyn StdError + Send + Sync>;

/// Outcome of one call to a mocked method.
pub type CallResult = std::result::Result<Box<dyn Value>, Raised>;

/// The actual arguments of one call, in positional order.
pub type Arguments = Vec<Box<dyn Value>>;

/// A dynamically typed argument, return value, or parameter default.
///
/// Implemented for every `'static` type that is `Debug`, `PartialEq`, `Clone`,
/// `Send` and `Sync`.
pub trait Value: Any + fmt::Debug + Send + Sync {
    /// Copy this value into a fresh box.
    fn clone_value(&self) -> Box<dyn Value>;

    /// Strict equality: `other` must have the very same concrete type, and
    /// compare equal.
    fn eq_value(&self, other: &dyn Value) -> bool;

    /// The fully qualified name of the concrete type.
    fn value_type(&self) -> &'static str;
}
downcast!(dyn Value);

impl<T> Value for T
    where T: Any + fmt::Debug + PartialEq + Clone + Send + Sync
{
    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Value) -> bool {
        other.downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn value_type(&self) -> &'static str {
        any::type_name::<T>()
    }
}

impl Clone for Box<dyn Value> {
    fn clone(&self) -> Self {
        (**self).clone_value()
    }
}

/// Build an [`Arguments`] list from a comma-separated list of values.
///
/// # Examples
/// ```
/// # use consecutive::*;
/// let a = args![1999, "week", 2.5f64];
/// assert_eq!(3, a.len());
/// assert!(a[1].eq_value(&"week"));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<::std::boxed::Box<dyn $crate::Value>>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![
            $(::std::boxed::Box::new($arg) as ::std::boxed::Box<dyn $crate::Value>),+
        ]
    };
}

/// Shorten every path in a type name to its final segment, eg
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub(crate) fn short_type_name(full: &str) -> String {
    fn flush(word: &mut String, out: &mut String) {
        if let Some(last) = word.rsplit("::").next() {
            out.push_str(last);
        }
        word.clear();
    }

    let mut out = String::with_capacity(full.len());
    let mut word = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}
