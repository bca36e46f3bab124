use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Type};

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Struct(data) => generate_injectable_impl(
            &input.ident,
            &input.generics,
            &data.fields,
        ),
        _ => syn::Error::new_spanned(
            &input.ident,
            "#[derive(Injectable)] can only be applied to structs",
        )
        .to_compile_error(),
    };
    TokenStream::from(expanded)
}

/// `impl Injectable` resolving every `Arc<T>` field from the container.
pub fn generate_injectable_impl(
    struct_name: &syn::Ident,
    generics: &syn::Generics,
    fields: &Fields,
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let construct = match fields {
        Fields::Named(fields) => {
            let field_injections = fields.named.iter().map(|field| {
                let field_name = &field.ident;
                if is_default_field(&field.attrs) {
                    return quote! { #field_name: ::core::default::Default::default() };
                }
                let field_type = extract_injectable_type(&field.ty);
                quote! { #field_name: container.resolve::<#field_type>()? }
            });
            quote! { Self { #(#field_injections),* } }
        }
        Fields::Unit => quote! { Self },
        Fields::Unnamed(_) => {
            return syn::Error::new_spanned(
                struct_name,
                "Injectable only supports structs with named fields or unit structs",
            )
            .to_compile_error();
        }
    };

    quote! {
        impl #impl_generics ::kindling::Injectable for #struct_name #ty_generics #where_clause {
            fn inject(
                #[allow(unused_variables)]
                container: &::kindling::Container
            ) -> ::kindling::Result<Self> {
                Ok(#construct)
            }
        }
    }
}

fn is_default_field(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("inject")
            && attr
                .parse_args::<syn::Ident>()
                .map_or(false, |arg| arg == "default")
    })
}

/// Remove `#[inject(..)]` helper attributes, which only derives may leave in place.
pub fn strip_inject_attrs(fields: &mut Fields) {
    for field in fields.iter_mut() {
        field.attrs.retain(|attr| !attr.path().is_ident("inject"));
    }
}

/// Extract the inner type from Arc<T>
fn extract_injectable_type(ty: &Type) -> Type {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Arc" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_type)) = args.args.first() {
                        return inner_type.clone();
                    }
                }
            }
        }
    }

    // If not Arc<T>, return as-is
    ty.clone()
}
