// vim: tw=80
use super::*;
use crate::attrs::Attrs;

/// How a parameter is described to the runtime.
enum ParamKind {
    Required,
    Default(Box<Expr>),
    Variadic,
}

/// Remove the `#[default(..)]` and `#[variadic]` helper attributes from a
/// parameter, and return what they said about it.
fn take_param_kind(attrs: &mut Vec<Attribute>) -> Result<ParamKind> {
    let mut kind = ParamKind::Required;
    let mut error: Option<Error> = None;
    let mut seen = 0;
    attrs.retain(|attr| {
        let parsed = if attr.path().is_ident("default") {
            attr.parse_args::<Expr>().map(|e| ParamKind::Default(Box::new(e)))
        } else if attr.path().is_ident("variadic") {
            attr.meta.require_path_only().map(|_| ParamKind::Variadic)
        } else {
            return true;
        };
        seen += 1;
        match parsed {
            Ok(_) if seen > 1 => {
                error.get_or_insert_with(|| Error::new(attr.span(),
                    "A parameter may be either #[default] or #[variadic], \
                    but not both"));
            }
            Ok(k) => kind = k,
            Err(e) => {
                error.get_or_insert(e);
            }
        }
        false
    });
    match error {
        Some(e) => Err(e),
        None => Ok(kind)
    }
}

/// Rewrites a parameter's type so that it can name a default value inside
/// `Reflect::type_info`.  Default values are `'static`, so every named
/// lifetime becomes `'static`, except for those bound by a `for<..>`.  The
/// method's own type and const parameters aren't in scope there at all, so
/// they are an error.
struct Unbind {
    params: Vec<Ident>,
    higher_ranked: Vec<Ident>,
    error: Option<Error>,
}

impl Unbind {
    fn new(generics: &Generics) -> Self {
        let params = generics.params.iter()
            .filter_map(|param| match param {
                GenericParam::Type(t) => Some(t.ident.clone()),
                GenericParam::Const(c) => Some(c.ident.clone()),
                GenericParam::Lifetime(_) => None
            }).collect();
        Unbind { params, higher_ranked: Vec::new(), error: None }
    }

    /// The type of a `#[default]` parameter, as written in `type_info`.
    fn default_type(mut self, ty: &Type) -> Result<Type> {
        let mut ty = ty.clone();
        self.visit_type_mut(&mut ty);
        match self.error {
            Some(e) => Err(e),
            None => Ok(ty)
        }
    }
}

impl VisitMut for Unbind {
    fn visit_bound_lifetimes_mut(&mut self, bound: &mut BoundLifetimes) {
        for param in bound.lifetimes.iter() {
            if let GenericParam::Lifetime(l) = param {
                self.higher_ranked.push(l.lifetime.ident.clone());
            }
        }
    }

    fn visit_lifetime_mut(&mut self, lifetime: &mut Lifetime) {
        let ident = &lifetime.ident;
        if ident != "static" && ident != "_"
            && !self.higher_ranked.contains(ident)
        {
            *lifetime = Lifetime::new("'static", lifetime.span());
        }
    }

    fn visit_path_mut(&mut self, path: &mut Path) {
        let generic = path.leading_colon.is_none()
            .then(|| path.segments.first())
            .flatten()
            .filter(|seg| self.params.contains(&seg.ident));
        if let Some(seg) = generic {
            let msg = format!("#[default] can't be used on a parameter whose \
                type depends on the method's generic parameter `{}`",
                seg.ident);
            self.error.get_or_insert_with(|| Error::new(seg.ident.span(), msg));
        }
        visit_mut::visit_path_mut(self, path);
    }

    fn visit_type_impl_trait_mut(&mut self, ty: &mut TypeImplTrait) {
        self.error.get_or_insert_with(|| Error::new(ty.span(),
            "#[default] can't be used on an `impl Trait` parameter"));
    }
}

/// Build the `MethodInfo` expression for one method, stripping the helper
/// attributes from its signature along the way.
fn method_info(sig: &mut Signature) -> Result<TokenStream> {
    let name = LitStr::new(&sig.ident.unraw().to_string(), sig.ident.span());
    let generics = sig.generics.clone();
    let mut params = Vec::new();
    for input in sig.inputs.iter_mut() {
        let FnArg::Typed(pat_type) = input else {
            // The receiver isn't a parameter
            continue;
        };
        let kind = take_param_kind(&mut pat_type.attrs)?;
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(Error::new(pat_type.pat.span(),
                "#[reflect] requires every parameter to be a plain identifier"
            ));
        };
        let pname = LitStr::new(&pat_ident.ident.unraw().to_string(),
                                pat_ident.ident.span());
        params.push(match kind {
            ParamKind::Required => quote!(
                ::consecutive::ParamInfo::required(#pname)
            ),
            ParamKind::Default(expr) => {
                let ty = Unbind::new(&generics).default_type(&pat_type.ty)?;
                quote!({
                    let default: #ty = #expr;
                    ::consecutive::ParamInfo::with_default(#pname, default)
                })
            }
            ParamKind::Variadic => quote!(
                ::consecutive::ParamInfo::variadic(#pname)
            ),
        });
    }
    Ok(quote!(
        ::consecutive::MethodInfo::new(#name)
            #(.param(#params))*
    ))
}

/// The body of `Reflect::type_info`.
fn type_info(attrs: &Attrs, ctor: TokenStream, methods: &[TokenStream])
    -> TokenStream
{
    let mixins = &attrs.mixins;
    let parent = attrs.parent.iter();
    quote!(
        #ctor
            #(.method(#methods))*
            #(.mixin(<#mixins as ::consecutive::Reflect>::type_info()))*
            #(.parent(<#parent as ::consecutive::Reflect>::type_info()))*
    )
}

/// The name of a type, as it should appear in diagnostics.
fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(tp) if tp.qself.is_none() => {
            match tp.path.segments.last() {
                Some(seg) => seg.ident.unraw().to_string(),
                None => quote!(#ty).to_string()
            }
        }
        _ => quote!(#ty).to_string()
    }
}

fn reflect_impl(attrs: &Attrs, mut item_impl: ItemImpl)
    -> Result<TokenStream>
{
    if let Some((_, path, _)) = &item_impl.trait_ {
        return Err(Error::new(path.span(),
            "#[reflect] describes inherent impl blocks and traits.  Apply it \
            to the trait definition instead"));
    }
    let mut methods = Vec::new();
    for item in item_impl.items.iter_mut() {
        if let ImplItem::Fn(f) = item {
            methods.push(method_info(&mut f.sig)?);
        }
    }
    let name = LitStr::new(&type_name(&item_impl.self_ty),
                           item_impl.self_ty.span());
    // Only types without generic parameters are certainly 'static
    let ctor = if item_impl.generics.params.is_empty() {
        quote!(::consecutive::TypeInfo::of::<Self>(#name))
    } else {
        quote!(::consecutive::TypeInfo::new(#name))
    };
    let body = type_info(attrs, ctor, &methods);
    let (ig, _tg, wc) = item_impl.generics.split_for_impl();
    let self_ty = &item_impl.self_ty;
    let reflect = quote!(
        impl #ig ::consecutive::Reflect for #self_ty #wc {
            fn type_info() -> ::consecutive::TypeInfo {
                #body
            }
        }
    );
    Ok(quote!(#item_impl #reflect))
}

fn reflect_trait(attrs: &Attrs, mut item_trait: ItemTrait)
    -> Result<TokenStream>
{
    let mut methods = Vec::new();
    for item in item_trait.items.iter_mut() {
        if let TraitItem::Fn(f) = item {
            methods.push(method_info(&mut f.sig)?);
        }
    }
    let ident = &item_trait.ident;
    let name = LitStr::new(&ident.unraw().to_string(), ident.span());
    let reflect_ident = format_ident!("Reflect{}", ident);
    let doc = format!("Reflection metadata for the [`{ident}`] trait.");
    let vis = &item_trait.vis;
    let ctor = quote!(::consecutive::TypeInfo::of::<#reflect_ident>(#name));
    let body = type_info(attrs, ctor, &methods);
    Ok(quote!(
        #item_trait
        #[doc = #doc]
        #vis struct #reflect_ident;
        impl ::consecutive::Reflect for #reflect_ident {
            fn type_info() -> ::consecutive::TypeInfo {
                #body
            }
        }
    ))
}

pub(crate) fn do_reflect(attrs: TokenStream, input: TokenStream)
    -> Result<TokenStream>
{
    let attrs: Attrs = parse2(attrs)?;
    match parse2::<Item>(input)? {
        Item::Impl(item_impl) => reflect_impl(&attrs, item_impl),
        Item::Trait(item_trait) => reflect_trait(&attrs, item_trait),
        item => Err(Error::new(item.span(),
            "#[reflect] may only be applied to an impl block or a trait"))
    }
}
