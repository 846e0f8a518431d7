// vim: tw=80
//! What each call in a sequence is expected to receive, and how it responds.

use predicates_tree::CaseTreeExt;
use std::{
    any,
    error::Error as StdError,
    fmt,
    ops::Index,
    panic::{self, AssertUnwindSafe},
    sync::Arc
};

use crate::{BoxError, Error, Predicate, Raised, Result, Value, short_type_name};

/// Result of checking one argument with a [`Matcher`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    Accepted,
    /// The argument was rejected, optionally with an explanation.
    Rejected(Option<String>),
}

type MatchFn = dyn Fn(&dyn Value) -> std::result::Result<Verdict, BoxError>
    + Send + Sync;

/// A custom check for a single argument.
///
/// Checking may fail, either by returning an error or by panicking.  Both
/// are reported as the matcher having "thrown".
pub struct Matcher {
    description: String,
    check: Box<MatchFn>,
}

impl Matcher {
    /// Check arguments with a [`Predicate`].  An argument whose type isn't
    /// `T` is rejected.
    pub fn predicate<T, P>(predicate: P) -> Self
        where T: Value,
              P: Predicate<T> + Send + Sync + 'static
    {
        let description = predicate.to_string();
        let check = move |actual: &dyn Value| {
            let Ok(actual) = actual.downcast_ref::<T>() else {
                return Ok(Verdict::Rejected(Some(type_mismatch::<T>(actual))));
            };
            let verdict = match predicate.find_case(false, actual) {
                Some(case) => Verdict::Rejected(Some(case.tree().to_string())),
                None => Verdict::Accepted
            };
            Ok(verdict)
        };
        Matcher { description, check: Box::new(check) }
    }

    /// Check arguments with a fallible closure.  An argument whose type isn't
    /// `T` is rejected.
    pub fn function<T, F, E>(f: F) -> Self
        where T: Value,
              F: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
              E: Into<BoxError>
    {
        let description = format!("fn(&{})",
            short_type_name(any::type_name::<T>()));
        let check = move |actual: &dyn Value| {
            let Ok(actual) = actual.downcast_ref::<T>() else {
                return Ok(Verdict::Rejected(Some(type_mismatch::<T>(actual))));
            };
            match f(actual) {
                Ok(true) => Ok(Verdict::Accepted),
                Ok(false) => Ok(Verdict::Rejected(None)),
                Err(e) => Err(e.into())
            }
        };
        Matcher { description, check: Box::new(check) }
    }

    /// Give this matcher a custom name for use in diagnostics.
    #[must_use]
    pub fn named<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Check `actual`, converting a panic inside the check into an error.
    pub fn evaluate(&self, actual: &dyn Value)
        -> std::result::Result<Verdict, BoxError>
    {
        panic::catch_unwind(AssertUnwindSafe(|| (self.check)(actual)))
            .unwrap_or_else(|payload| {
                let msg = payload.downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| String::from("Box<dyn Any>"));
                Err(format!("panicked: {msg}").into())
            })
    }
}

fn type_mismatch<T: Value>(actual: &dyn Value) -> String {
    format!("expected a value of type {}, but it is of type {}",
        short_type_name(any::type_name::<T>()),
        short_type_name(actual.value_type()))
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Matcher({})", self.description)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// How one expected argument is compared against the actual one.
#[derive(Debug)]
pub enum ArgumentSpec {
    /// Strict equality with the given value.
    Literal(Box<dyn Value>),
    /// A custom check.
    Predicate(Matcher),
}

/// The return value of one call, and the arguments that call must receive.
#[derive(Debug)]
pub struct MethodCall {
    value: Box<dyn Value>,
    arguments: Vec<ArgumentSpec>,
}

impl MethodCall {
    /// Return `value` from the call.  Expected arguments are added with the
    /// `arg*` methods, in positional order.
    pub fn returning<T: Value>(value: T) -> Self {
        MethodCall { value: Box::new(value), arguments: Vec::new() }
    }

    /// Expect the next argument to strictly equal `value`.
    #[must_use]
    pub fn arg<T: Value>(mut self, value: T) -> Self {
        self.arguments.push(ArgumentSpec::Literal(Box::new(value)));
        self
    }

    /// Expect the next arguments to strictly equal each of `values`.
    #[must_use]
    pub fn args(mut self, values: crate::Arguments) -> Self {
        self.arguments.extend(values.into_iter().map(ArgumentSpec::Literal));
        self
    }

    /// Check the next argument with a [`Predicate`].
    ///
    /// # Examples
    /// ```
    /// # use consecutive::*;
    /// let call = MethodCall::returning(())
    ///     .arg_with(predicate::in_iter(vec![1, 2, 3]));
    /// assert_eq!(1, call.arguments().len());
    /// ```
    #[must_use]
    pub fn arg_with<T, P>(self, predicate: P) -> Self
        where T: Value,
              P: Predicate<T> + Send + Sync + 'static
    {
        self.arg_matching(Matcher::predicate(predicate))
    }

    /// Check the next argument with a fallible closure.
    #[must_use]
    pub fn arg_withf<T, F, E>(self, f: F) -> Self
        where T: Value,
              F: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
              E: Into<BoxError>
    {
        self.arg_matching(Matcher::function(f))
    }

    /// Check the next argument with an already-built [`Matcher`].
    #[must_use]
    pub fn arg_matching(mut self, matcher: Matcher) -> Self {
        self.arguments.push(ArgumentSpec::Predicate(matcher));
        self
    }

    pub fn value(&self) -> &dyn Value {
        self.value.as_ref()
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }
}

/// What happens on one particular call of a sequence.
#[derive(Clone, Debug)]
pub enum ExpectationCase {
    /// Check the arguments, then return a value.
    Returns(Arc<MethodCall>),
    /// Raise the error, without looking at the arguments.
    Throws(Raised),
}

impl ExpectationCase {
    /// Raise `error` when this call position is reached.
    pub fn throws<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        ExpectationCase::Throws(Arc::new(error))
    }
}

impl From<MethodCall> for ExpectationCase {
    fn from(call: MethodCall) -> Self {
        ExpectationCase::Returns(Arc::new(call))
    }
}

/// An ordered, non-empty list of expectations, one per call.
#[derive(Clone, Debug)]
pub struct ExpectationSequence(Arc<[ExpectationCase]>);

impl ExpectationSequence {
    /// Fails if `cases` is empty.
    pub fn new<I>(cases: I) -> Result<Self>
        where I: IntoIterator<Item = ExpectationCase>
    {
        let cases: Arc<[ExpectationCase]> = cases.into_iter().collect();
        if cases.is_empty() {
            return Err(Error::Precondition(String::from(
                "Argument `expectations` = [] must not be empty")));
        }
        Ok(ExpectationSequence(cases))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExpectationCase> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExpectationCase> {
        self.0.iter()
    }
}

impl Index<usize> for ExpectationSequence {
    type Output = ExpectationCase;

    fn index(&self, index: usize) -> &ExpectationCase {
        &self.0[index]
    }
}
