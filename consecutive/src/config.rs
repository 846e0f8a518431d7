// vim: tw=80
//! Strictness toggles for argument comparison.

/// Controls how strictly an [`InvocationMatcher`](crate::InvocationMatcher)
/// compares actual arguments against an expectation.
///
/// `MatcherConfig` is a plain value.  Every `with_*` method returns a new
/// config, leaving the original untouched.
///
/// # Examples
/// ```
/// # use consecutive::*;
/// let lenient = MatcherConfig::default()
///     .with_is_ignoring_surplus_arguments(true);
/// assert!(lenient.is_ignoring_surplus_arguments());
/// assert!(!MatcherConfig::default().is_ignoring_surplus_arguments());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MatcherConfig {
    is_aborting_on_first_failure: bool,
    is_ignoring_arguments_with_default_value: bool,
    is_ignoring_surplus_arguments: bool,
}

impl MatcherConfig {
    pub const fn new() -> Self {
        MatcherConfig {
            is_aborting_on_first_failure: true,
            is_ignoring_arguments_with_default_value: false,
            is_ignoring_surplus_arguments: false,
        }
    }

    /// When true, argument checking stops at the first mismatch and only that
    /// mismatch is reported.  When false, every argument is checked and every
    /// mismatch is reported.
    pub const fn is_aborting_on_first_failure(&self) -> bool {
        self.is_aborting_on_first_failure
    }

    /// When true, trailing parameters with default values that the
    /// expectation doesn't mention are not counted as expected arguments.
    ///
    /// This only feeds the surplus check, which compares the call against the
    /// method's whole parameter list before the expected count matters.  So
    /// with the bundled matchers this toggle never changes whether a call
    /// passes.
    pub const fn is_ignoring_arguments_with_default_value(&self) -> bool {
        self.is_ignoring_arguments_with_default_value
    }

    /// When true, arguments beyond the method's declared parameters never
    /// cause an error.
    ///
    /// When false, such arguments are accepted only if the expectation lists
    /// every one of them.  If it lists just some, all of them are reported.
    pub const fn is_ignoring_surplus_arguments(&self) -> bool {
        self.is_ignoring_surplus_arguments
    }

    #[must_use]
    pub const fn with_is_aborting_on_first_failure(self, value: bool) -> Self {
        MatcherConfig { is_aborting_on_first_failure: value, ..self }
    }

    #[must_use]
    pub const fn with_is_ignoring_arguments_with_default_value(self, value: bool)
        -> Self
    {
        MatcherConfig { is_ignoring_arguments_with_default_value: value, ..self }
    }

    #[must_use]
    pub const fn with_is_ignoring_surplus_arguments(self, value: bool) -> Self {
        MatcherConfig { is_ignoring_surplus_arguments: value, ..self }
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}
