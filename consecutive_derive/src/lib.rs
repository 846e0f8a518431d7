// vim: tw=80
//! Proc Macros for use with Consecutive
//!
//! You probably don't want to use this crate directly.  Instead, use
//! its reexports via the [`consecutive`](../consecutive/index.html) crate.

extern crate proc_macro;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute,
    BoundLifetimes,
    Error,
    Expr,
    FnArg,
    GenericParam,
    Generics,
    Ident,
    ImplItem,
    Item,
    ItemImpl,
    ItemTrait,
    Lifetime,
    LitStr,
    Pat,
    Path,
    Result,
    Signature,
    Token,
    TraitItem,
    Type,
    TypeImplTrait,
    ext::IdentExt,
    parenthesized,
    parse,
    parse2,
    punctuated::Punctuated,
    spanned::Spanned,
    visit_mut::{self, VisitMut}
};
#[cfg(test)]
use syn::File;

mod attrs;
mod reflect;
use crate::reflect::do_reflect;

/// Describe a type's methods, their parameters, and its place in a type
/// hierarchy, by implementing `consecutive::Reflect`.
///
/// Apply it either to an inherent `impl` block, or to a trait definition.  A
/// trait gets a companion unit struct named `Reflect<Trait>` that carries its
/// description, so it may be composed into other types as a mixin.
///
/// # Arguments
///
/// * `parent = Path` - The type's parent, which must implement `Reflect`.
/// * `mixins(Path, ...)` - Types whose methods this one composes, in order.
///
/// # Parameter attributes
///
/// * `#[default(expr)]` - The parameter is optional, and defaults to `expr`.
/// * `#[variadic]` - The parameter is optional, and has no default.
///
/// # Examples
/// ```ignore
/// # use consecutive::*;
/// #[reflect]
/// trait Greets {
///     fn greet(&self, name: &str, #[default("!")] punctuation: &str);
/// }
///
/// struct Person;
/// #[reflect(mixins(ReflectGreets))]
/// impl Person {
///     fn walk(&self, #[variadic] steps: Vec<u32>) {}
/// }
///
/// let info = Person::type_info();
/// assert_eq!("Person", info.name());
/// assert_eq!("Greets", info.mixins()[0].name());
/// ```
#[proc_macro_attribute]
pub fn reflect(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    do_reflect(attrs.into(), input.into())
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
