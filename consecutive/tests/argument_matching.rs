// vim: tw=80
//! Actual arguments are compared against literals and predicates, and every
//! mismatch is described in the failure message.

use consecutive::*;
use std::num::TryFromIntError;

#[derive(Debug, thiserror::Error)]
#[error("bad hour")]
struct BadHour;

struct DateTime;

#[reflect]
#[allow(dead_code, unused_variables)]
impl DateTime {
    fn set_timestamp(&mut self, timestamp: i64) -> bool {
        unimplemented!()
    }

    fn set_time(&mut self, hour: u8, minute: u8, #[default(0u8)] second: u8)
        -> bool
    {
        unimplemented!()
    }
}

fn register(matcher: &InvocationMatcher, method: &str, call: MethodCall)
    -> Mock
{
    let mut mock = Mock::new::<DateTime>();
    matcher.expect_consecutive_calls(&mut mock, method, vec![call.into()])
        .unwrap();
    mock
}

mod literal {
    use super::*;

    #[test]
    fn ok() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true).arg(12u8).arg(30u8).arg(15u8));
        assert!(mock.call_as::<bool>("set_time", args![12u8, 30u8, 15u8])
                .unwrap());
    }

    #[test]
    #[should_panic(expected = "On invocation 1/1, method call \
        DateTime::set_timestamp($timestamp = (i64) 0) failed because 1 error \
        was encountered:\nExpected argument #2, but it does not exist.")]
    fn missing() {
        let mock = register(&InvocationMatcher::default(), "set_timestamp",
            MethodCall::returning(true).arg(0i64).arg(1i64));
        let _ = mock.call("set_timestamp", args![0i64]);
    }

    #[test]
    #[should_panic(expected = "On invocation 1/1, method call \
        DateTime::set_time($hour = (u8) 12, $minute = (u8) 31, \
        $second = (u8) 0) failed because 1 error was encountered:\n\
        Argument $minute = (u8) 31 was expected to be (u8) 30, but it is not.")]
    fn different() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true).arg(12u8).arg(30u8).arg(0u8));
        let _ = mock.call("set_time", args![12u8, 31u8, 0u8]);
    }

    /// Equality is strict: values of different types never match.
    #[test]
    #[should_panic(expected = "Argument $hour = (i32) 12 was expected to be \
        (u8) 12, but it is not.")]
    fn different_type() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true).arg(12u8).arg(30u8));
        let _ = mock.call("set_time", args![12i32, 30u8]);
    }

    /// Parameters that weren't passed are shown as missing.
    #[test]
    #[should_panic(expected = "method call DateTime::set_time($hour = (u8) 1, \
        $minute = (none), $second = (none)) failed")]
    fn absent_arguments_are_shown() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true).arg(12u8).arg(30u8));
        let _ = mock.call("set_time", args![1u8]);
    }
}

mod aborting {
    use super::*;

    #[test]
    #[should_panic(expected = "failed because 1 error was encountered:\n\
        Argument $hour = (u8) 1 was expected to be (u8) 12, but it is not.")]
    fn stops_at_the_first_failure() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true).arg(12u8).arg(30u8).arg(15u8));
        let _ = mock.call("set_time", args![1u8, 2u8]);
    }

    #[test]
    #[should_panic(expected = "failed because 2 errors were encountered:\n\
        Argument $hour = (u8) 1 was expected to be (u8) 12, but it is not.\n\
        Expected argument #3, but it does not exist.")]
    fn reports_every_failure() {
        let matcher = InvocationMatcher::default()
            .with_is_aborting_on_first_failure(false);
        let mock = register(&matcher, "set_time",
            MethodCall::returning(true).arg(12u8).arg(30u8).arg(15u8));
        let _ = mock.call("set_time", args![1u8, 30u8]);
    }

    #[test]
    #[should_panic(expected = "failed because 1 error was encountered:\n\
        Argument $hour = var > 20, a predicate, rejected the actual value \
        (u8) 12")]
    fn rejecting_predicate_stops_checking() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true)
                .arg_with(predicate::gt(20u8))
                .arg(30u8));
        let _ = mock.call("set_time", args![12u8, 31u8]);
    }

    #[test]
    #[should_panic(expected = "failed because 1 error was encountered:\n\
        Argument $hour = fn(&u8), a predicate, threw: bad hour.")]
    fn throwing_predicate_stops_checking() {
        let mock = register(&InvocationMatcher::default(), "set_time",
            MethodCall::returning(true)
                .arg_withf(|_: &u8| Err::<bool, _>(BadHour))
                .arg(30u8));
        let _ = mock.call("set_time", args![12u8, 31u8]);
    }

    #[test]
    #[should_panic(expected = "failed because 2 errors were encountered:\n\
        Argument $hour = fn(&u8), a predicate, rejected the actual value \
        (u8) 12.\n\
        Argument $minute = (u8) 31 was expected to be (u8) 30, but it is not.")]
    fn rejecting_predicate_continues_checking() {
        let matcher = InvocationMatcher::default()
            .with_is_aborting_on_first_failure(false);
        let mock = register(&matcher, "set_time",
            MethodCall::returning(true)
                .arg_withf(|h: &u8| Ok::<_, BadHour>(*h > 20))
                .arg(30u8));
        let _ = mock.call("set_time", args![12u8, 31u8]);
    }

    #[test]
    #[should_panic(expected = "failed because 2 errors were encountered:\n\
        Argument $hour = fn(&u8), a predicate, threw: bad hour.\n\
        Argument $minute = (u8) 31 was expected to be (u8) 30, but it is not.")]
    fn throwing_predicate_continues_checking() {
        let matcher = InvocationMatcher::default()
            .with_is_aborting_on_first_failure(false);
        let mock = register(&matcher, "set_time",
            MethodCall::returning(true)
                .arg_withf(|_: &u8| Err::<bool, _>(BadHour))
                .arg(30u8));
        let _ = mock.call("set_time", args![12u8, 31u8]);
    }

    #[test]
    #[should_panic(expected = "failed because 3 errors were encountered:\n\
        Argument $timestamp = fn(&i64), a predicate, rejected the actual value \
        (i64) 0.\n\
        Argument {1} = (&str) \"x\" was expected to be (&str) \"y\", but it is \
        not.\n\
        Method was expected to be called with 1 argument, but was instead \
        called with 3, with the 2 surplus arguments being: \
        {1} = (&str) \"x\", {2} = (bool) true.")]
    fn surplus_is_checked_after_other_failures() {
        let matcher = InvocationMatcher::default()
            .with_is_aborting_on_first_failure(false);
        let mock = register(&matcher, "set_timestamp",
            MethodCall::returning(true)
                .arg_withf(|t: &i64| Ok::<_, TryFromIntError>(*t > 0))
                .arg("y"));
        let _ = mock.call("set_timestamp", args![0i64, "x", true]);
    }
}

mod predicates {
    use super::*;

    #[test]
    fn accepted() {
        let mock = register(&InvocationMatcher::default(), "set_timestamp",
            MethodCall::returning(true).arg_with(predicate::gt(0i64)));
        assert!(mock.call_as::<bool>("set_timestamp", args![5i64]).unwrap());
    }

    #[test]
    #[should_panic(expected = "Argument $timestamp = var > 0, a predicate, \
        rejected the actual value (i64) -1")]
    fn rejected() {
        let mock = register(&InvocationMatcher::default(), "set_timestamp",
            MethodCall::returning(true).arg_with(predicate::gt(0i64)));
        let _ = mock.call("set_timestamp", args![-1i64]);
    }

    #[test]
    #[should_panic(expected = "Argument $timestamp = var > 0, a predicate, \
        rejected the actual value (i32) 5; expected a value of type i64, but \
        it is of type i32.")]
    fn rejected_type() {
        let mock = register(&InvocationMatcher::default(), "set_timestamp",
            MethodCall::returning(true).arg_with(predicate::gt(0i64)));
        let _ = mock.call("set_timestamp", args![5i32]);
    }

    #[test]
    #[should_panic(expected = "Argument $timestamp = fn(&i64), a predicate, \
        threw: out of range integral type conversion attempted.")]
    fn error() {
        let mock = register(&InvocationMatcher::default(), "set_timestamp",
            MethodCall::returning(true)
                .arg_withf(|t: &i64| -> Result<bool, TryFromIntError> {
                    Ok(u8::try_from(*t)? > 0)
                }));
        let _ = mock.call("set_timestamp", args![1000i64]);
    }

    #[test]
    #[should_panic(expected = "Argument $timestamp = is even, a predicate, \
        threw: panicked: odd timestamp.")]
    fn panic() {
        let even = Matcher::function(
            |t: &i64| -> Result<bool, TryFromIntError> {
                assert!(t % 2 == 0, "odd timestamp");
                Ok(true)
            }).named("is even");
        let mock = register(&InvocationMatcher::default(), "set_timestamp",
            MethodCall::returning(true).arg_matching(even));
        let _ = mock.call("set_timestamp", args![3i64]);
    }
}
