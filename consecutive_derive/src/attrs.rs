// vim: tw=80
use super::*;
use syn::parse::{Parse, ParseStream};

mod kw {
    syn::custom_keyword!(parent);
    syn::custom_keyword!(mixins);
}

/// A single reflect attribute
enum Attr {
    Parent(Path),
    Mixins(Vec<Path>),
}

impl Parse for Attr {
    fn parse(input: ParseStream) -> parse::Result<Self> {
        let lookahead = input.lookahead1();
        if lookahead.peek(kw::parent) {
            input.parse::<kw::parent>()?;
            input.parse::<Token![=]>()?;
            input.parse().map(Attr::Parent)
        } else if lookahead.peek(kw::mixins) {
            input.parse::<kw::mixins>()?;
            let content;
            parenthesized!(content in input);
            let paths = Punctuated::<Path, Token![,]>::parse_terminated(
                &content)?;
            Ok(Attr::Mixins(paths.into_iter().collect()))
        } else {
            Err(lookahead.error())
        }
    }
}

/// reflect attributes
#[derive(Debug, Default)]
pub(crate) struct Attrs {
    pub parent: Option<Path>,
    pub mixins: Vec<Path>,
}

impl Parse for Attrs {
    fn parse(input: ParseStream) -> parse::Result<Self> {
        let mut attrs = Attrs::default();
        while !input.is_empty() {
            let span = input.span();
            match input.parse::<Attr>()? {
                Attr::Parent(_) if attrs.parent.is_some() => {
                    return Err(parse::Error::new(span,
                        "A type may have only one parent"));
                }
                Attr::Parent(path) => attrs.parent = Some(path),
                Attr::Mixins(paths) => attrs.mixins.extend(paths),
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(attrs)
    }
}
