use crate::injectable::{generate_injectable_impl, strip_inject_attrs};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, ItemStruct, LitStr, Token};

struct ControllerArgs {
    path: String,
}

impl Parse for ControllerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        // `#[controller("/users")]` shorthand
        if input.peek(LitStr) {
            let lit: LitStr = input.parse()?;
            return Ok(ControllerArgs { path: lit.value() });
        }

        let mut path = None;
        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if name == "path" {
                let lit: LitStr = input.parse()?;
                path = Some(lit.value());
            } else {
                return Err(syn::Error::new_spanned(
                    name,
                    "unknown controller argument, expected `path`",
                ));
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(ControllerArgs {
            path: path.unwrap_or_default(),
        })
    }
}

pub fn controller_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ControllerArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let base_path = &args.path;
    let tag = quote! {
        annotator.controller(#base_path);
        <Self as ::kindling::RouteSet>::declare_routes(annotator);
    };
    TokenStream::from(generate_component_impl(input, tag))
}

pub fn component_attribute(kind: &str, attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = TokenStream2::from(attr);
        return TokenStream::from(
            syn::Error::new_spanned(attr, format!("#[{}] takes no arguments", kind))
                .to_compile_error(),
        );
    }
    let input = parse_macro_input!(item as ItemStruct);
    let tag_method = format_ident!("{}", kind);
    let tag = quote! { annotator.#tag_method(); };
    TokenStream::from(generate_component_impl(input, tag))
}

fn generate_component_impl(mut input: ItemStruct, tag: TokenStream2) -> TokenStream2 {
    let injectable_impl =
        generate_injectable_impl(&input.ident, &input.generics, &input.fields);
    strip_inject_attrs(&mut input.fields);

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        #input
        #injectable_impl
        impl #impl_generics ::kindling::Annotated for #struct_name #ty_generics #where_clause {
            fn annotate(annotator: &::kindling::Annotator<'_, Self>) {
                #tag
            }
        }
    }
}
