// vim: tw=80
//! Rendering argument names and values for diagnostics.

use std::fmt;

use crate::{Value, short_type_name};

/// How an argument is identified in a diagnostic: by its parameter name, or
/// by its position when no parameter declares it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArgumentName<'a> {
    Position(usize),
    Named(&'a str),
}

impl From<usize> for ArgumentName<'_> {
    fn from(position: usize) -> Self {
        ArgumentName::Position(position)
    }
}

impl<'a> From<&'a str> for ArgumentName<'a> {
    fn from(name: &'a str) -> Self {
        ArgumentName::Named(name)
    }
}

/// Renders arguments for failure messages.
///
/// # Examples
/// ```
/// # use consecutive::*;
/// let f = ArgumentFormatter::new();
/// assert_eq!("$year", f.format_argument_name("year"));
/// assert_eq!("{2}", f.format_argument_name(ArgumentName::Position(2)));
/// assert_eq!("(i32) 1999", f.format_argument_value(&1999));
/// assert_eq!("$year = (i32) 1999",
///            f.format_argument("year", Some(&1999 as &dyn Value)));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ArgumentFormatter;

impl ArgumentFormatter {
    pub fn new() -> Self {
        ArgumentFormatter
    }

    /// Purely numeric names render as `{N}`.  Names containing whitespace or
    /// NUL characters render as an escaped, quoted string inside `${...}`.
    /// Anything else renders as `$name`.
    pub fn format_argument_name<'a, N>(&self, name: N) -> String
        where N: Into<ArgumentName<'a>>
    {
        match name.into() {
            ArgumentName::Position(i) => format!("{{{i}}}"),
            ArgumentName::Named(s)
                if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) =>
            {
                format!("{{{s}}}")
            }
            ArgumentName::Named(s)
                if s.chars().any(|c| c == '\0' || c.is_whitespace()) =>
            {
                format!("${{{s:?}}}")
            }
            ArgumentName::Named(s) => format!("${s}")
        }
    }

    /// Render a value along with its type, like `(i32) 5`.  Never empty.
    pub fn format_argument_value(&self, value: &dyn Value) -> String {
        format!("({}) {:?}", short_type_name(value.value_type()), value)
    }

    /// Render `name = value`.  A missing value renders as `(none)`.
    pub fn format_argument<'a, N>(&self, name: N, value: Option<&dyn Value>)
        -> String
        where N: Into<ArgumentName<'a>>
    {
        let value = match value {
            Some(v) => self.format_argument_value(v),
            None => String::from("(none)")
        };
        format!("{} = {}", self.format_argument_name(name), value)
    }

    /// Render each `(name, value)` pair with
    /// [`format_argument`](Self::format_argument).
    pub fn format_arguments<'a, 'v, I>(&self, arguments: I) -> Vec<String>
        where I: IntoIterator<Item = (ArgumentName<'a>, Option<&'v dyn Value>)>
    {
        arguments.into_iter()
            .map(|(name, value)| self.format_argument(name, value))
            .collect()
    }
}

impl fmt::Display for ArgumentName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&ArgumentFormatter.format_argument_name(*self))
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn positional_names() {
        let f = ArgumentFormatter::new();
        assert_eq!("{0}", f.format_argument_name(0usize));
        assert_eq!("{42}", f.format_argument_name("42"));
    }

    #[test]
    fn plain_names() {
        let f = ArgumentFormatter::new();
        assert_eq!("$timestamp", f.format_argument_name("timestamp"));
        assert_eq!("$a1", f.format_argument_name("a1"));
    }

    #[test]
    fn names_with_whitespace_or_nul() {
        let f = ArgumentFormatter::new();
        assert_eq!("${\"a b\"}", f.format_argument_name("a b"));
        assert_eq!("${\"a\\nb\"}", f.format_argument_name("a\nb"));
        assert_eq!("${\"a\\0b\"}", f.format_argument_name("a\0b"));
    }

    #[test]
    fn values() {
        let f = ArgumentFormatter::new();
        assert_eq!("(&str) \"x\"", f.format_argument_value(&"x"));
        assert_eq!("(String) \"\"", f.format_argument_value(&String::new()));
        assert_eq!("(Option<u8>) None", f.format_argument_value(&None::<u8>));
        assert_eq!("(Vec<i64>) [1, 2]", f.format_argument_value(&vec![1i64, 2]));
    }

    #[test]
    fn arguments() {
        let f = ArgumentFormatter::new();
        let v: i32 = 7;
        let formatted = f.format_arguments([
            (ArgumentName::Named("a"), Some(&v as &dyn Value)),
            (ArgumentName::Named("b"), None),
            (ArgumentName::Position(2), Some(&v as &dyn Value)),
        ]);
        assert_eq!(vec!["$a = (i32) 7", "$b = (none)", "{2} = (i32) 7"],
                   formatted);
    }

    #[test]
    fn display() {
        assert_eq!("$x", ArgumentName::Named("x").to_string());
        assert_eq!("{3}", ArgumentName::Position(3).to_string());
    }
}
