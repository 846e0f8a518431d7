// vim: tw=80
//! Registering a sequence of expectations, and checking each call against
//! its own expectation.

use lazy_static::lazy_static;
use std::sync::Arc;
use tracing::debug;

use crate::{
    ArgumentFormatter,
    ArgumentName,
    ArgumentSpec,
    Arguments,
    CallInterceptor,
    CallResult,
    Error,
    ExpectationCase,
    ExpectationSequence,
    InvokedCount,
    MatcherConfig,
    MethodCall,
    MethodLocator,
    MethodResolver,
    ParameterDescriptor,
    ParameterMetadataResolver,
    Result,
    Value,
    Verdict
};

lazy_static! {
    pub(crate) static ref FORMATTER: Arc<ArgumentFormatter> =
        Arc::new(ArgumentFormatter::new());
    pub(crate) static ref LOCATOR: Arc<dyn MethodLocator> =
        Arc::new(MethodResolver::new());
    pub(crate) static ref PARAMETERS: Arc<ParameterMetadataResolver> =
        Arc::new(ParameterMetadataResolver::new());
}

pub(crate) fn plural(n: usize, one: &'static str, many: &'static str)
    -> &'static str
{
    if n == 1 { one } else { many }
}

/// Makes a mocked method respond differently to each of several consecutive
/// calls, verifying the arguments of every call.
///
/// The matcher itself is immutable: every `with_*` method returns a modified
/// copy.  Copies share the same collaborators, which default to process-wide
/// instances.
///
/// # Examples
/// ```
/// # use consecutive::*;
/// # struct Clock;
/// # #[reflect]
/// # impl Clock {
/// #     fn set_timestamp(&mut self, timestamp: i64) -> bool { unimplemented!() }
/// # }
/// let matcher = InvocationMatcher::default()
///     .with_is_aborting_on_first_failure(false);
/// assert!(!matcher.is_aborting_on_first_failure());
/// assert!(InvocationMatcher::default().is_aborting_on_first_failure());
///
/// let mut mock = Mock::new::<Clock>();
/// matcher.expect_consecutive_calls(&mut mock, "set_timestamp", vec![
///     MethodCall::returning(true).arg(0i64).into(),
/// ]).unwrap();
/// assert!(mock.call_as::<bool>("set_timestamp", args![0i64]).unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct InvocationMatcher {
    config: MatcherConfig,
    formatter: Arc<ArgumentFormatter>,
    locator: Arc<dyn MethodLocator>,
    parameters: Arc<ParameterMetadataResolver>,
}

impl InvocationMatcher {
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Build a matcher with non-default collaborators.
    pub fn builder() -> InvocationMatcherBuilder {
        InvocationMatcherBuilder::default()
    }

    pub fn config(&self) -> MatcherConfig {
        self.config
    }

    pub fn argument_formatter(&self) -> &ArgumentFormatter {
        &self.formatter
    }

    pub fn method_locator(&self) -> &dyn MethodLocator {
        self.locator.as_ref()
    }

    pub fn parameter_metadata_resolver(&self) -> &ParameterMetadataResolver {
        &self.parameters
    }

    pub fn is_aborting_on_first_failure(&self) -> bool {
        self.config.is_aborting_on_first_failure()
    }

    pub fn is_ignoring_arguments_with_default_value(&self) -> bool {
        self.config.is_ignoring_arguments_with_default_value()
    }

    pub fn is_ignoring_surplus_arguments(&self) -> bool {
        self.config.is_ignoring_surplus_arguments()
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn with_config(&self, config: MatcherConfig) -> Self {
        InvocationMatcher { config, ..self.clone() }
    }

    #[must_use]
    pub fn with_is_aborting_on_first_failure(&self, value: bool) -> Self {
        self.with_config(self.config.with_is_aborting_on_first_failure(value))
    }

    #[must_use]
    pub fn with_is_ignoring_arguments_with_default_value(&self, value: bool)
        -> Self
    {
        self.with_config(
            self.config.with_is_ignoring_arguments_with_default_value(value))
    }

    #[must_use]
    pub fn with_is_ignoring_surplus_arguments(&self, value: bool) -> Self {
        self.with_config(self.config.with_is_ignoring_surplus_arguments(value))
    }

    /// Expect `method_name` to be called exactly once per element of
    /// `expectations`, and check the `i`th call against the `i`th
    /// expectation.
    ///
    /// A call that doesn't match its expectation panics with a message
    /// describing every mismatch found.
    ///
    /// # Errors
    ///
    /// * [`Error::Precondition`] if `expectations` is empty, or if no type in
    ///   `object`'s hierarchy declares `method_name`.
    /// * [`Error::Registration`] if the method locator fails.
    pub fn expect_consecutive_calls<O, I>(&self, object: &mut O,
        method_name: &str, expectations: I) -> Result<()>
        where O: CallInterceptor + ?Sized,
              I: IntoIterator<Item = ExpectationCase>
    {
        let cases = expectations.into_iter().collect::<Vec<_>>();
        let target = match self.locator.locate(object.type_info(), method_name)
        {
            Ok(located) => located.map(|r| Target {
                type_name: r.declaring_type.name().to_owned(),
                method_name: r.method.name().to_owned(),
                parameters: self.parameters.resolve(r.declaring_type, r.method)
            }),
            Err(source) => {
                let call = format!(
                    "InvocationMatcher::expect_consecutive_calls(\
                    object = {:?}, method_name = {:?}, \
                    expectations = ({}) {:?}) inside {:?}",
                    object, method_name, cases.len(), cases, self);
                return Err(Error::Registration { call, source });
            }
        };

        let sequence = ExpectationSequence::new(cases);
        let mut errors = Vec::new();
        if let Err(e) = &sequence {
            errors.push(e.to_string());
        }
        if target.is_none() {
            errors.push(format!(
                "Method named {method_name:?} does not exist on `object` = \
                {object:?}"));
        }
        let (Ok(sequence), Some(target)) = (sequence, target) else {
            return Err(Error::Precondition(errors.join(". ")));
        };

        debug!(object = ?object, method = target.method_name.as_str(),
            expectations = sequence.len(), config = ?self.config,
            "registering consecutive calls");
        let count = Arc::new(InvokedCount::new(sequence.len()));
        let invocation = Invocation {
            config: self.config,
            formatter: self.formatter.clone(),
            target,
            sequence,
            count: count.clone(),
        };
        object.expects(method_name, count,
            Box::new(move |args| invocation.handle(args)));
        Ok(())
    }
}

impl Default for InvocationMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an [`InvocationMatcher`].  Any collaborator that isn't supplied is
/// a process-wide shared instance.
#[derive(Debug, Default)]
pub struct InvocationMatcherBuilder {
    config: MatcherConfig,
    formatter: Option<Arc<ArgumentFormatter>>,
    locator: Option<Arc<dyn MethodLocator>>,
    parameters: Option<Arc<ParameterMetadataResolver>>,
}

impl InvocationMatcherBuilder {
    #[must_use]
    pub fn config(mut self, config: MatcherConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn argument_formatter(mut self, formatter: ArgumentFormatter) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    #[must_use]
    pub fn method_locator<L>(mut self, locator: L) -> Self
        where L: MethodLocator + 'static
    {
        self.locator = Some(Arc::new(locator));
        self
    }

    #[must_use]
    pub fn parameter_metadata_resolver(mut self,
        parameters: Arc<ParameterMetadataResolver>) -> Self
    {
        self.parameters = Some(parameters);
        self
    }

    pub fn build(self) -> InvocationMatcher {
        InvocationMatcher {
            config: self.config,
            formatter: self.formatter.unwrap_or_else(|| FORMATTER.clone()),
            locator: self.locator.unwrap_or_else(|| LOCATOR.clone()),
            parameters: self.parameters.unwrap_or_else(|| PARAMETERS.clone()),
        }
    }
}

/// The method that a sequence was registered for.
#[derive(Debug)]
struct Target {
    type_name: String,
    method_name: String,
    parameters: Arc<[ParameterDescriptor]>,
}

/// Everything the registered callback needs to check one call.
struct Invocation {
    config: MatcherConfig,
    formatter: Arc<ArgumentFormatter>,
    target: Target,
    sequence: ExpectationSequence,
    count: Arc<InvokedCount>,
}

impl Invocation {
    fn handle(&self, actual: Arguments) -> CallResult {
        let position = self.count.invocations();
        let Some((index, case)) = position.checked_sub(1)
            .and_then(|i| self.sequence.get(i).map(|case| (i, case)))
        else {
            return Err(Arc::new(Error::Precondition(format!(
                "Invocation {} of {}::{}: index not found among {} \
                expectations", position, self.target.type_name,
                self.target.method_name, self.sequence.len()))));
        };
        let call = match case {
            ExpectationCase::Throws(e) => {
                debug!(method = self.target.method_name.as_str(),
                    invocation = index + 1, "raising the expected error");
                return Err(e.clone());
            }
            ExpectationCase::Returns(call) => call
        };
        let errors = self.compare(call, &actual);
        if !errors.is_empty() {
            debug!(method = self.target.method_name.as_str(),
                invocation = index + 1, errors = errors.len(),
                "call did not match");
            panic!("{}", self.failure_message(index, &actual, errors));
        }
        debug!(method = self.target.method_name.as_str(),
            invocation = index + 1, "call matched");
        Ok(call.value().clone_value())
    }

    fn argument_name(&self, position: usize) -> ArgumentName<'_> {
        match self.target.parameters.get(position) {
            Some(p) => ArgumentName::Named(p.name()),
            None => ArgumentName::Position(position)
        }
    }

    /// Every mismatch between `actual` and the expectation `call`.
    fn compare(&self, call: &MethodCall, actual: &[Box<dyn Value>])
        -> Vec<String>
    {
        let aborting = self.config.is_aborting_on_first_failure();
        let f = &self.formatter;
        let mut errors = Vec::new();

        for (p, expected) in call.arguments().iter().enumerate() {
            let Some(value) = actual.get(p) else {
                errors.push(format!(
                    "Expected argument #{}, but it does not exist", p + 1));
                if aborting {
                    break;
                }
                continue;
            };
            let value: &dyn Value = &**value;
            let name = self.argument_name(p);
            let error = match expected {
                ArgumentSpec::Predicate(m) => match m.evaluate(value) {
                    Ok(Verdict::Accepted) => None,
                    Ok(Verdict::Rejected(why)) => {
                        let mut msg = format!(
                            "Argument {name} = {m}, a predicate, rejected the \
                            actual value {}", f.format_argument_value(value));
                        if let Some(why) = why {
                            msg.push_str("; ");
                            msg.push_str(why.trim_end());
                        }
                        Some(msg)
                    }
                    Err(e) => Some(format!(
                        "Argument {name} = {m}, a predicate, threw: {e}"))
                },
                ArgumentSpec::Literal(v) if v.eq_value(value) => None,
                ArgumentSpec::Literal(v) => Some(format!(
                    "Argument {name} = {} was expected to be {}, but it is not",
                    f.format_argument_value(value),
                    f.format_argument_value(&**v)))
            };
            if let Some(error) = error {
                errors.push(error);
                if aborting {
                    break;
                }
            }
        }

        if !self.config.is_ignoring_surplus_arguments()
            && (!aborting || errors.is_empty())
        {
            if let Some(error) = self.surplus(call, actual) {
                errors.push(error);
            }
        }
        errors
    }

    /// Arguments beyond the method's declared parameters, if they weren't
    /// expected.
    fn surplus(&self, call: &MethodCall, actual: &[Box<dyn Value>])
        -> Option<String>
    {
        let parameters = &self.target.parameters;
        let mut expected_count = call.arguments().len();
        if !self.config.is_ignoring_arguments_with_default_value() {
            expected_count += parameters.iter()
                .skip(expected_count)
                .take_while(|p| p.has_default_value())
                .count();
        }
        if actual.len() == expected_count || actual.len() <= parameters.len() {
            return None;
        }
        let required = parameters.iter()
            .take_while(|p| !p.is_optional())
            .count();
        let surplus = self.formatter.format_arguments(actual.iter()
            .enumerate()
            .skip(parameters.len())
            .map(|(i, v)| (ArgumentName::Position(i), Some(&**v))));
        Some(format!(
            "Method was expected to be called with {} {}, but was instead \
            called with {}, with the {} surplus {} being: {}",
            required, plural(required, "argument", "arguments"),
            actual.len(),
            surplus.len(), plural(surplus.len(), "argument", "arguments"),
            surplus.join(", ")))
    }

    fn failure_message(&self, index: usize, actual: &[Box<dyn Value>],
        mut errors: Vec<String>) -> String
    {
        let parameters = &self.target.parameters;
        let named = parameters.iter()
            .map(|p| (ArgumentName::Named(p.name()),
                      actual.get(p.position()).map(|v| &**v)));
        let surplus = actual.iter()
            .enumerate()
            .skip(parameters.len())
            .map(|(i, v)| (ArgumentName::Position(i), Some(&**v)));
        let arguments = self.formatter.format_arguments(named.chain(surplus));
        for e in errors.iter_mut() {
            if !e.ends_with('.') {
                e.push('.');
            }
        }
        format!("On invocation {}/{}, method call {}::{}({}) failed because \
            {} {} encountered:\n{}",
            index + 1, self.sequence.len(),
            self.target.type_name, self.target.method_name,
            arguments.join(", "),
            errors.len(), plural(errors.len(), "error was", "errors were"),
            errors.join("\n"))
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{BoxError, Callback, Mock, MethodInfo, ParamInfo,
                ResolvedMethod, TypeInfo, args};

    fn date_time() -> Mock {
        Mock::from_type_info(TypeInfo::new("DateTime")
            .method(MethodInfo::new("setTimestamp")
                .param(ParamInfo::required("timestamp")))
            .method(MethodInfo::new("setISODate")
                .param(ParamInfo::required("year"))
                .param(ParamInfo::required("week"))
                .param(ParamInfo::with_default("dayOfWeek", 1i32))))
    }

    #[derive(Debug, thiserror::Error)]
    #[error("reflection is offline")]
    struct Offline;

    struct BrokenLocator;
    impl MethodLocator for BrokenLocator {
        fn locate<'t>(&self, _ty: &'t TypeInfo, _method_name: &str)
            -> std::result::Result<Option<ResolvedMethod<'t>>, BoxError>
        {
            Err(Box::new(Offline))
        }
    }

    #[test]
    fn with_returns_a_copy() {
        let a = InvocationMatcher::default();
        let b = a.with_is_ignoring_surplus_arguments(true)
            .with_is_ignoring_arguments_with_default_value(true)
            .with_is_aborting_on_first_failure(false);
        assert_eq!(MatcherConfig::default(), a.config());
        assert!(b.is_ignoring_surplus_arguments());
        assert!(b.is_ignoring_arguments_with_default_value());
        assert!(!b.is_aborting_on_first_failure());
    }

    #[test]
    fn shared_collaborators() {
        let a = InvocationMatcher::default();
        let b = InvocationMatcher::new();
        assert!(std::ptr::eq(a.parameter_metadata_resolver(),
                             b.parameter_metadata_resolver()));
    }

    #[test]
    fn empty_expectations() {
        let mut mock = date_time();
        let e = InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "setTimestamp", Vec::new())
            .unwrap_err();
        assert!(matches!(e, Error::Precondition(_)));
        assert_eq!("Argument `expectations` = [] must not be empty",
                   e.to_string());
    }

    #[test]
    fn unknown_method() {
        let mut mock = date_time();
        let e = InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "setDate", vec![
                MethodCall::returning(()).into()
            ]).unwrap_err();
        assert_eq!(
            "Method named \"setDate\" does not exist on `object` = \
            Mock<DateTime>",
            e.to_string());
    }

    #[test]
    fn empty_expectations_and_unknown_method() {
        let mut mock = date_time();
        let e = InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "setDate", Vec::new())
            .unwrap_err();
        assert_eq!(
            "Argument `expectations` = [] must not be empty. Method named \
            \"setDate\" does not exist on `object` = Mock<DateTime>",
            e.to_string());
    }

    #[test]
    fn locator_failure_is_wrapped() {
        let mut mock = date_time();
        let e = InvocationMatcher::builder()
            .method_locator(BrokenLocator)
            .build()
            .expect_consecutive_calls(&mut mock, "setTimestamp", vec![
                MethodCall::returning(()).arg(0i64).into()
            ]).unwrap_err();
        let msg = e.to_string();
        assert!(msg.starts_with("Failure in InvocationMatcher::\
            expect_consecutive_calls(object = Mock<DateTime>, \
            method_name = \"setTimestamp\", expectations = (1) ["), "{msg}");
        assert!(msg.contains(") inside InvocationMatcher {"), "{msg}");
        let source = std::error::Error::source(&e).unwrap();
        assert_eq!("reflection is offline", source.to_string());
    }

    #[test]
    fn returns_in_order() {
        let mut mock = date_time();
        InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "settimestamp", vec![
                MethodCall::returning("a").arg(1i64).into(),
                MethodCall::returning("b").arg(2i64).into(),
            ]).unwrap();
        assert_eq!("a", mock.call_as::<&str>("setTimestamp", args![1i64])
                   .unwrap());
        assert_eq!("b", mock.call_as::<&str>("setTimestamp", args![2i64])
                   .unwrap());
    }

    #[test]
    fn trailing_default_is_accepted() {
        let mut mock = date_time();
        InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "setISODate", vec![
                MethodCall::returning(()).arg(1999).arg(42).into(),
            ]).unwrap();
        mock.call("setISODate", args![1999, 42]).unwrap();
    }

    #[test]
    #[should_panic(expected = "On invocation 1/1, method call \
        DateTime::setTimestamp($timestamp = (i64) 0) failed because 1 error \
        was encountered:\nExpected argument #2, but it does not exist.")]
    fn missing_argument() {
        let mut mock = date_time();
        InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "setTimestamp", vec![
                MethodCall::returning(()).arg(0i64).arg(1i64).into(),
            ]).unwrap();
        let _ = mock.call("setTimestamp", args![0i64]);
    }

    #[test]
    #[should_panic(expected = "Argument $timestamp = (i32) 0 was expected to \
        be (i64) 0, but it is not.")]
    fn literals_are_strict() {
        let mut mock = date_time();
        InvocationMatcher::default()
            .expect_consecutive_calls(&mut mock, "setTimestamp", vec![
                MethodCall::returning(()).arg(0i64).into(),
            ]).unwrap();
        let _ = mock.call("setTimestamp", args![0i32]);
    }

    /// An interceptor that never counts calls.
    struct Uncounted {
        info: TypeInfo,
        registered: Option<(Arc<InvokedCount>, Callback)>,
    }

    impl std::fmt::Debug for Uncounted {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("Uncounted")
        }
    }

    impl CallInterceptor for Uncounted {
        fn type_info(&self) -> &TypeInfo {
            &self.info
        }

        fn expects(&mut self, _method: &str, count: Arc<InvokedCount>,
                   callback: Callback)
        {
            self.registered = Some((count, callback));
        }
    }

    #[test]
    fn index_not_found() {
        let mut object = Uncounted {
            info: TypeInfo::new("Clock").method(MethodInfo::new("tick")),
            registered: None
        };
        InvocationMatcher::default()
            .expect_consecutive_calls(&mut object, "tick", vec![
                MethodCall::returning(()).into(),
            ]).unwrap();
        let (count, callback) = object.registered.take().unwrap();
        let e = callback(args![]).unwrap_err();
        assert_eq!("Invocation 0 of Clock::tick: index not found among 1 \
                   expectations", e.to_string());
        count.call();
    }
}
