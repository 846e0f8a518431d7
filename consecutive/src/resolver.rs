// vim: tw=80
//! Locating the declaration of a method within a type's hierarchy.

use std::fmt;
use tracing::trace;

use crate::{BoxError, MethodInfo, TypeInfo};

/// A method together with the type that declares it.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedMethod<'t> {
    pub declaring_type: &'t TypeInfo,
    pub method: &'t MethodInfo,
}

/// Finds the declaration of a named method, starting from a given type.
///
/// [`MethodResolver`] is the usual implementation.  Others may be substituted
/// through [`InvocationMatcher::builder`](crate::InvocationMatcher::builder).
pub trait MethodLocator: Send + Sync {
    /// Return the declaration of `method_name`, or `None` if `ty` has no such
    /// method anywhere in its hierarchy.
    fn locate<'t>(&self, ty: &'t TypeInfo, method_name: &str)
        -> Result<Option<ResolvedMethod<'t>>, BoxError>;
}

/// Walks a type, its mixins, and its ancestors, looking for a method by name
/// without regard to case.
///
/// A type is visited before anything it composes.  Right after visiting a
/// type, its mixins are queued ahead of every type still waiting to be
/// visited, and its parent is queued behind them all.  So a mixin always takes
/// precedence over the parent of the type that composes it.
#[derive(Clone, Copy, Debug, Default)]
pub struct MethodResolver;

impl MethodResolver {
    pub fn new() -> Self {
        MethodResolver
    }

    /// Every type reachable from `ty`, in the order they're searched.
    pub fn hierarchy<'t>(&self, ty: &'t TypeInfo) -> Vec<&'t TypeInfo> {
        let mut queue = vec![ty];
        let mut cursor = 0;
        while let Some(current) = queue.get(cursor).copied() {
            cursor += 1;
            for (offset, mixin) in current.mixins().iter().enumerate() {
                queue.insert(cursor + offset, mixin);
            }
            if let Some(parent) = current.parent_type() {
                queue.push(parent);
            }
        }
        queue
    }
}

impl MethodLocator for MethodResolver {
    fn locate<'t>(&self, ty: &'t TypeInfo, method_name: &str)
        -> Result<Option<ResolvedMethod<'t>>, BoxError>
    {
        let resolved = self.hierarchy(ty)
            .into_iter()
            .find_map(|declaring_type| {
                trace!(type_name = declaring_type.name(), method_name,
                    "searching for method");
                declaring_type.own_method(method_name)
                    .map(|method| ResolvedMethod { declaring_type, method })
            });
        Ok(resolved)
    }
}

impl fmt::Debug for dyn MethodLocator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("MethodLocator")
    }
}
