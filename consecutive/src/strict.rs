// vim: tw=80
//! A simpler sequence matcher that compares every argument by strict
//! equality.

use std::{cmp, sync::Arc};
use tracing::debug;

use crate::{
    ArgumentFormatter,
    Arguments,
    CallInterceptor,
    CallResult,
    Error,
    InvokedCount,
    MethodLocator,
    ParameterDescriptor,
    ParameterMetadataResolver,
    Result,
    Value,
    matcher::{FORMATTER, LOCATOR, PARAMETERS, plural}
};

/// The return value of one call, and the exact arguments it must receive.
#[derive(Clone, Debug)]
pub struct FunctionCall {
    value: Box<dyn Value>,
    arguments: Arguments,
}

impl FunctionCall {
    pub fn returning<T: Value>(value: T) -> Self {
        FunctionCall { value: Box::new(value), arguments: Vec::new() }
    }

    #[must_use]
    pub fn arg<T: Value>(mut self, value: T) -> Self {
        self.arguments.push(Box::new(value));
        self
    }

    #[must_use]
    pub fn args(mut self, values: Arguments) -> Self {
        self.arguments.extend(values);
        self
    }

    pub fn value(&self) -> &dyn Value {
        self.value.as_ref()
    }

    pub fn arguments(&self) -> &[Box<dyn Value>] {
        &self.arguments
    }
}

/// Expects a method to be called once per [`FunctionCall`], with exactly the
/// listed arguments.
///
/// Unlike [`InvocationMatcher`](crate::InvocationMatcher), there are no
/// predicates and no configuration: every differing argument position is
/// always reported.  Trailing parameters with default values may be omitted
/// from a `FunctionCall`, as long as the actual call doesn't override them.
///
/// # Examples
/// ```
/// # use consecutive::*;
/// let mut mock = Mock::from_type_info(TypeInfo::new("Greeter")
///     .method(MethodInfo::new("greet")
///         .param(ParamInfo::required("name"))
///         .param(ParamInfo::with_default("punctuation", '!'))));
/// StrictSequenceMatcher::new()
///     .expect(&mut mock, "greet", vec![
///         FunctionCall::returning(1).arg("Alice"),
///         FunctionCall::returning(2).arg("Bob").arg('?'),
///     ])
///     .unwrap();
/// assert_eq!(1, mock.call_as::<i32>("greet", args!["Alice", '!']).unwrap());
/// assert_eq!(2, mock.call_as::<i32>("greet", args!["Bob", '?']).unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct StrictSequenceMatcher {
    formatter: Arc<ArgumentFormatter>,
    locator: Arc<dyn MethodLocator>,
    parameters: Arc<ParameterMetadataResolver>,
}

impl StrictSequenceMatcher {
    pub fn new() -> Self {
        StrictSequenceMatcher {
            formatter: FORMATTER.clone(),
            locator: LOCATOR.clone(),
            parameters: PARAMETERS.clone()
        }
    }

    #[must_use]
    pub fn with_method_locator<L>(&self, locator: L) -> Self
        where L: MethodLocator + 'static
    {
        StrictSequenceMatcher { locator: Arc::new(locator), ..self.clone() }
    }

    #[must_use]
    pub fn with_parameter_metadata_resolver(&self,
        parameters: Arc<ParameterMetadataResolver>) -> Self
    {
        StrictSequenceMatcher { parameters, ..self.clone() }
    }

    /// Expect `method_name` to be called once per element of `calls`, with
    /// exactly the arguments of the corresponding element.
    ///
    /// # Errors
    ///
    /// * [`Error::Precondition`] if `calls` is empty, or if `method_name`
    ///   can't be found.
    /// * [`Error::Registration`] if the method locator fails.
    pub fn expect<O, I>(&self, object: &mut O, method_name: &str, calls: I)
        -> Result<()>
        where O: CallInterceptor + ?Sized,
              I: IntoIterator<Item = FunctionCall>
    {
        let calls: Arc<[FunctionCall]> = calls.into_iter().collect();
        if calls.is_empty() {
            return Err(Error::Precondition(String::from(
                "Argument `expectations` = [] must not be empty")));
        }
        let located = self.locator.locate(object.type_info(), method_name)
            .map_err(|source| Error::Registration {
                call: format!("StrictSequenceMatcher::expect(object = {:?}, \
                    method_name = {:?}, expectations = ({}) {:?})",
                    object, method_name, calls.len(), calls),
                source
            })?;
        let Some(r) = located else {
            return Err(Error::Precondition(format!(
                "Was unable to locate the method named {method_name:?} on \
                `object` = {object:?}")));
        };
        let count = Arc::new(InvokedCount::new(calls.len()));
        let sequence = StrictSequence {
            formatter: self.formatter.clone(),
            type_name: r.declaring_type.name().to_owned(),
            method_name: r.method.name().to_owned(),
            parameters: self.parameters.resolve(r.declaring_type, r.method),
            calls,
            count: count.clone()
        };
        debug!(object = ?object, method = sequence.method_name.as_str(),
            expectations = sequence.calls.len(), "registering strict sequence");
        object.expects(method_name, count,
            Box::new(move |args| sequence.handle(args)));
        Ok(())
    }
}

impl Default for StrictSequenceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

struct StrictSequence {
    formatter: Arc<ArgumentFormatter>,
    type_name: String,
    method_name: String,
    parameters: Arc<[ParameterDescriptor]>,
    calls: Arc<[FunctionCall]>,
    count: Arc<InvokedCount>,
}

impl StrictSequence {
    fn handle(&self, actual: Arguments) -> CallResult {
        let position = self.count.invocations();
        let Some((index, call)) = position.checked_sub(1)
            .and_then(|i| self.calls.get(i).map(|call| (i, call)))
        else {
            return Err(Arc::new(Error::Precondition(format!(
                "Invocation {} of {}::{}: index not found among {} \
                expectations", position, self.type_name, self.method_name,
                self.calls.len()))));
        };

        let mut expected = call.arguments().iter()
            .map(|v| &**v)
            .collect::<Vec<&dyn Value>>();
        if actual.len() > expected.len() {
            let defaults = self.parameters.iter()
                .skip(expected.len())
                .take(actual.len() - expected.len())
                .map_while(ParameterDescriptor::default_value)
                .collect::<Vec<_>>();
            expected.extend(defaults);
        }

        let differences = (0..cmp::max(expected.len(), actual.len()))
            .filter(|&k| match (expected.get(k), actual.get(k)) {
                (Some(e), Some(a)) => !e.eq_value(&**a),
                _ => true
            }).collect::<Vec<_>>();
        if !differences.is_empty() {
            debug!(method = self.method_name.as_str(), invocation = index + 1,
                differences = differences.len(), "call did not match");
            panic!("{}", self.failure_message(index, &actual, &expected,
                &differences));
        }
        Ok(call.value().clone_value())
    }

    fn format<'v, I>(&self, values: I) -> Vec<String>
        where I: IntoIterator<Item = &'v dyn Value>
    {
        values.into_iter()
            .enumerate()
            .map(|(k, v)| format!("{{{k}}}: {}",
                self.formatter.format_argument_value(v)))
            .collect()
    }

    fn failure_message(&self, index: usize, actual: &[Box<dyn Value>],
        expected: &[&dyn Value], differences: &[usize]) -> String
    {
        let actual = self.format(actual.iter().map(|v| &**v));
        let expected = self.format(expected.iter().copied());
        format!("Method call {}::{}({}), on invocation {}/{}, has {} {} and \
            was expected the have the following {} {}, ...::{}({}), but the \
            values on the following {} parameter {} different: {:?}",
            self.type_name, self.method_name, actual.join(", "),
            index + 1, self.calls.len(),
            actual.len(), plural(actual.len(), "argument", "arguments"),
            expected.len(), plural(expected.len(), "argument", "arguments"),
            self.method_name, expected.join(", "),
            differences.len(), plural(differences.len(), "index is",
                                      "indexes are"),
            differences)
    }
}
