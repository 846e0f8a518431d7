// vim: tw=80
//! Static descriptions of types, methods, and parameters.
//!
//! These stand in for runtime reflection: they name each method's parameters,
//! say which ones are optional and what their default values are, and link a
//! type to the mixins it composes and to its parent.

use std::{
    any::{self, TypeId},
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError}
};
use tracing::trace;

use crate::Value;

/// Types that can describe themselves with a [`TypeInfo`].
///
/// Usually implemented with [`#[reflect]`](macro@crate::reflect).
pub trait Reflect {
    fn type_info() -> TypeInfo;
}

/// One declared parameter of a method.
pub struct ParamInfo {
    name: String,
    optional: bool,
    default: Option<Box<dyn Value>>,
}

impl ParamInfo {
    /// A parameter that every caller must supply.
    pub fn required<S: Into<String>>(name: S) -> Self {
        ParamInfo { name: name.into(), optional: false, default: None }
    }

    /// An optional parameter that falls back to `default` when omitted.
    pub fn with_default<T: Value>(name: impl Into<String>, default: T) -> Self {
        ParamInfo {
            name: name.into(),
            optional: true,
            default: Some(Box::new(default))
        }
    }

    /// An optional parameter without a default value, like a variadic tail.
    pub fn variadic<S: Into<String>>(name: S) -> Self {
        ParamInfo { name: name.into(), optional: true, default: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&dyn Value> {
        self.default.as_deref()
    }
}

impl fmt::Debug for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ParamInfo")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .field("default", &self.default)
            .finish()
    }
}

/// A declared method and its parameters, in declaration order.
#[derive(Debug)]
pub struct MethodInfo {
    name: String,
    params: Vec<ParamInfo>,
}

impl MethodInfo {
    pub fn new<S: Into<String>>(name: S) -> Self {
        MethodInfo { name: name.into(), params: Vec::new() }
    }

    /// Append the next parameter.
    #[must_use]
    pub fn param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }
}

/// A type's own methods, plus the mixins it composes and its parent type.
#[derive(Debug)]
pub struct TypeInfo {
    name: String,
    type_id: Option<TypeId>,
    methods: Vec<MethodInfo>,
    mixins: Vec<TypeInfo>,
    parent: Option<Box<TypeInfo>>,
}

impl TypeInfo {
    /// Describe a type known only by name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        TypeInfo {
            name: name.into(),
            type_id: None,
            methods: Vec::new(),
            mixins: Vec::new(),
            parent: None
        }
    }

    /// Describe the Rust type `T`.  Unlike [`TypeInfo::new`], the description
    /// is tied to `T`'s identity, so its parameter metadata can be cached.
    pub fn of<T: any::Any>(name: impl Into<String>) -> Self {
        TypeInfo {
            type_id: Some(TypeId::of::<T>()),
            ..TypeInfo::new(name)
        }
    }

    #[must_use]
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    /// Compose a mixin.  Mixins are searched, in the order they were added,
    /// before the parent.
    #[must_use]
    pub fn mixin(mut self, mixin: TypeInfo) -> Self {
        self.mixins.push(mixin);
        self
    }

    #[must_use]
    pub fn parent(mut self, parent: TypeInfo) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn mixins(&self) -> &[TypeInfo] {
        &self.mixins
    }

    pub fn parent_type(&self) -> Option<&TypeInfo> {
        self.parent.as_deref()
    }

    /// Look up a method declared directly on this type, ignoring case.
    pub fn own_method(&self, name: &str) -> Option<&MethodInfo> {
        let name = name.to_lowercase();
        self.methods.iter()
            .find(|m| m.name.to_lowercase() == name)
    }
}

/// A method parameter as seen by the argument comparison.
#[derive(Debug)]
pub struct ParameterDescriptor {
    position: usize,
    name: String,
    is_optional: bool,
    default: Option<Box<dyn Value>>,
}

impl ParameterDescriptor {
    /// Zero-based position in the parameter list.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn has_default_value(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&dyn Value> {
        self.default.as_deref()
    }
}

type CacheKey = (TypeId, String);

/// Turns a [`MethodInfo`] into an ordered list of [`ParameterDescriptor`]s.
///
/// Lists for types built with [`TypeInfo::of`] are cached per type and method,
/// and shared by every later lookup of the same method.  A cached list is
/// only reused while it still matches the method's parameters, so two
/// different descriptions of one type each get their own list.
#[derive(Default)]
pub struct ParameterMetadataResolver {
    cache: Mutex<HashMap<CacheKey, Arc<[ParameterDescriptor]>>>,
}

impl ParameterMetadataResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe the parameters of `method`, which is declared on
    /// `declaring_type`.
    pub fn resolve(&self, declaring_type: &TypeInfo, method: &MethodInfo)
        -> Arc<[ParameterDescriptor]>
    {
        let Some(type_id) = declaring_type.type_id() else {
            return Self::describe(method);
        };
        let key = (type_id, method.name().to_lowercase());
        let mut cache = self.cache.lock()
            .unwrap_or_else(PoisonError::into_inner);
        match cache.get(&key) {
            Some(descriptors) if Self::describes(descriptors, method) => {
                trace!(type_name = declaring_type.name(),
                    method = method.name(), "parameter metadata cache hit");
                return descriptors.clone();
            }
            Some(_) => trace!(type_name = declaring_type.name(),
                method = method.name(), "parameter metadata is stale"),
            None => ()
        }
        let descriptors = Self::describe(method);
        cache.insert(key, descriptors.clone());
        descriptors
    }

    fn describes(descriptors: &[ParameterDescriptor], method: &MethodInfo)
        -> bool
    {
        descriptors.len() == method.params().len()
            && descriptors.iter().zip(method.params()).all(|(d, p)| {
                let same_default = match (d.default_value(), p.default_value())
                {
                    (Some(a), Some(b)) => a.eq_value(b),
                    (None, None) => true,
                    _ => false
                };
                d.name == p.name() && d.is_optional == p.is_optional()
                    && same_default
            })
    }

    fn describe(method: &MethodInfo) -> Arc<[ParameterDescriptor]> {
        method.params().iter()
            .enumerate()
            .map(|(position, p)| ParameterDescriptor {
                position,
                name: p.name().to_owned(),
                is_optional: p.is_optional(),
                default: p.default_value().map(|d| d.clone_value())
            }).collect()
    }
}

impl fmt::Debug for ParameterMetadataResolver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ParameterMetadataResolver").finish_non_exhaustive()
    }
}
