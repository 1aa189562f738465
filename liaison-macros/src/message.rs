use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    DeriveInput, GenericParam, Generics, Ident, Path, Token, Type,
    parse::{Parse, ParseStream},
    parse_quote,
};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Request,
    Notification,
}

impl Kind {
    fn attribute(self) -> &'static str {
        match self {
            Kind::Request => "request",
            Kind::Notification => "notification",
        }
    }
}

#[derive(Default)]
struct MessageArgs {
    response: Option<Type>,
    shape: Option<Path>,
}

impl Parse for MessageArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = MessageArgs::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "response" => args.response = Some(input.parse()?),
                "shape" => args.shape = Some(input.parse()?),
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

fn parse_args(input: &DeriveInput, kind: Kind) -> syn::Result<MessageArgs> {
    let mut args = MessageArgs::default();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident(kind.attribute())) {
        let parsed: MessageArgs = attr.parse_args()?;
        if let Some(response) = parsed.response {
            if kind == Kind::Notification {
                return Err(syn::Error::new_spanned(
                    response,
                    "notifications have no response type",
                ));
            }
            args.response = Some(response);
        }
        if parsed.shape.is_some() {
            args.shape = parsed.shape;
        }
    }
    Ok(args)
}

/// Messages are `'static` and shared across tasks, so every type parameter must be too.
fn bounded_generics(generics: &Generics) -> syn::Result<Generics> {
    let mut generics = generics.clone();
    if let Some(lifetime) = generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "messages must be 'static and cannot have lifetime parameters",
        ));
    }
    let params: Vec<Ident> = generics.type_params().map(|param| param.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(parse_quote! {
            #param: ::core::marker::Send + ::core::marker::Sync + 'static
        });
    }
    Ok(generics)
}

pub(crate) fn expand(input: &DeriveInput, kind: Kind) -> syn::Result<TokenStream> {
    let args = parse_args(input, kind)?;
    let name = &input.ident;
    let generics = bounded_generics(&input.generics)?;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let type_params: Vec<&Ident> = input
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(param) => Some(&param.ident),
            _ => None,
        })
        .collect();

    // An instance of a generic message belongs to the family of its definition.
    let shape = match args.shape {
        Some(path) => Some(quote! {
            fn shape() -> ::liaison::Shape {
                #path()
            }
        }),
        None if !type_params.is_empty() => Some(quote! {
            fn shape() -> ::liaison::Shape {
                ::liaison::Shape::builder::<Self>()
                    .generic(
                        ::liaison::TypeKey::definition_of::<Self>(),
                        [#(::liaison::TypeKey::of::<#type_params>()),*],
                    )
                    .build()
            }
        }),
        None => None,
    };

    let kind_impl = match kind {
        Kind::Request => {
            let response = args
                .response
                .map(|ty| quote!(#ty))
                .unwrap_or_else(|| quote!(::liaison::Unit));
            quote! {
                impl #impl_generics ::liaison::Request for #name #ty_generics #where_clause {
                    type Response = #response;
                }
            }
        }
        Kind::Notification => quote! {
            impl #impl_generics ::liaison::Notification for #name #ty_generics #where_clause {}
        },
    };

    Ok(quote! {
        impl #impl_generics ::liaison::Message for #name #ty_generics #where_clause {
            #shape
        }

        #kind_impl
    })
}
