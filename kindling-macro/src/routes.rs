use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Type};

const VERBS: [(&str, &str); 7] = [
    ("get", "Get"),
    ("post", "Post"),
    ("put", "Put"),
    ("delete", "Delete"),
    ("patch", "Patch"),
    ("head", "Head"),
    ("options", "Options"),
];

const SOCKET_ATTRS: [&str; 3] = ["on_connect", "on_disconnect", "channel"];

const PARAM_ATTRS: [&str; 3] = ["body", "param", "query"];

enum Declaration {
    Route { verb: syn::Ident, path: String },
    Event { tag: syn::Ident, event: String },
}

#[derive(Clone, Copy, PartialEq)]
enum ParamKind {
    Body,
    Param,
    Query,
    Request,
    Raw,
}

struct ParamInfo {
    ty: Type,
    kind: ParamKind,
}

struct MethodInfo {
    fn_name: syn::Ident,
    declarations: Vec<Declaration>,
    middlewares: Vec<syn::Expr>,
    params: Vec<ParamInfo>,
}

/// Verb attributes are consumed by `#[routes]`; used elsewhere they leave the method as is.
pub fn pass_through(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ImplItemFn);
    TokenStream::from(quote! { #input })
}

pub fn routes_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    let expanded = generate_routes_impl(input).unwrap_or_else(|e| e.to_compile_error());
    TokenStream::from(expanded)
}

fn generate_routes_impl(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    let mut methods: Vec<MethodInfo> = Vec::new();

    for item in input.items.iter_mut() {
        if let ImplItem::Fn(method) = item {
            if let Some(info) = extract_method_info(method)? {
                methods.push(info);
                method.attrs.retain(|attr| !is_route_attr(attr));
                for input in method.sig.inputs.iter_mut() {
                    if let FnArg::Typed(pat_type) = input {
                        pat_type.attrs.retain(|attr| !is_param_attr(attr));
                    }
                }
            }
        }
    }

    let declarations = methods.iter().map(generate_method_declarations);
    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::kindling::RouteSet for #self_ty #where_clause {
            fn declare_routes(
                #[allow(unused_variables)]
                annotator: &::kindling::Annotator<'_, Self>
            ) {
                #(#declarations)*
            }
        }
    })
}

fn extract_method_info(method: &ImplItemFn) -> syn::Result<Option<MethodInfo>> {
    let mut declarations = Vec::new();
    let mut middlewares = Vec::new();

    for attr in &method.attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        let name = ident.to_string();
        if let Some((_, variant)) = VERBS.iter().find(|(attr_name, _)| *attr_name == name) {
            declarations.push(Declaration::Route {
                verb: format_ident!("{}", variant),
                path: optional_path(attr)?,
            });
        } else if name == "middleware" {
            middlewares.push(attr.parse_args::<syn::Expr>()?);
        } else if name == "channel" {
            let event: LitStr = attr.parse_args()?;
            declarations.push(Declaration::Event {
                tag: format_ident!("channel"),
                event: event.value(),
            });
        } else if name == "on_connect" || name == "on_disconnect" {
            let event = if name == "on_connect" { "connection" } else { "disconnect" };
            declarations.push(Declaration::Event {
                tag: format_ident!("{}", name),
                event: event.to_string(),
            });
        }
    }

    if declarations.is_empty() {
        if let Some(attr) = method.attrs.iter().find(|a| a.path().is_ident("middleware")) {
            return Err(syn::Error::new_spanned(
                attr,
                "#[middleware] needs a route attribute on the same method",
            ));
        }
        return Ok(None);
    }

    if !matches!(method.sig.inputs.first(), Some(FnArg::Receiver(_))) {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "route methods must take `&self`",
        ));
    }

    let mut params = Vec::new();
    for input in method.sig.inputs.iter() {
        if let FnArg::Typed(pat_type) = input {
            let ty = (*pat_type.ty).clone();
            let kind = get_param_kind(&pat_type.attrs, &ty);
            params.push(ParamInfo { ty, kind });
        }
    }
    let consuming = params
        .iter()
        .filter(|p| matches!(p.kind, ParamKind::Body | ParamKind::Request))
        .count();
    if consuming > 1 {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "a route method can consume the request body only once",
        ));
    }

    Ok(Some(MethodInfo {
        fn_name: method.sig.ident.clone(),
        declarations,
        middlewares,
        params,
    }))
}

/// `#[get]` means `/`; `#[get("/x")]` names the path.
fn optional_path(attr: &Attribute) -> syn::Result<String> {
    match &attr.meta {
        syn::Meta::Path(_) => Ok("/".to_string()),
        _ => Ok(attr.parse_args::<LitStr>()?.value()),
    }
}

fn generate_method_declarations(method: &MethodInfo) -> TokenStream2 {
    let fn_name = &method.fn_name;
    let middlewares = &method.middlewares;

    let declarations = method.declarations.iter().map(|declaration| match declaration {
        Declaration::Route { verb, path } => {
            let handler = generate_route_handler(method);
            quote! {
                let __method = __method.route(::kindling::routing::HttpVerb::#verb, #path, #handler);
            }
        }
        Declaration::Event { tag, event } => {
            let handler = generate_event_handler(method, event);
            match tag.to_string().as_str() {
                "channel" => quote! { let __method = __method.channel(#event, #handler); },
                _ => quote! { let __method = __method.#tag(#handler); },
            }
        }
    });

    quote! {
        {
            let __method = annotator.method(stringify!(#fn_name));
            #(let __method = __method.middleware(::std::sync::Arc::new(#middlewares));)*
            #(#declarations)*
            let _ = __method;
        }
    }
}

fn generate_route_handler(method: &MethodInfo) -> TokenStream2 {
    let fn_name = &method.fn_name;
    let args: Vec<_> = (0..method.params.len())
        .map(|i| format_ident!("__p_{}", i))
        .collect();

    let parts_extractions = method
        .params
        .iter()
        .zip(&args)
        .filter(|(p, _)| !matches!(p.kind, ParamKind::Body | ParamKind::Request))
        .map(|(p, arg)| {
            let ty = &p.ty;
            let (extractor, pattern) = match p.kind {
                ParamKind::Param => (
                    quote! { ::kindling::axum::extract::Path<#ty> },
                    quote! { ::kindling::axum::extract::Path(value) },
                ),
                ParamKind::Query => (
                    quote! { ::kindling::axum::extract::Query<#ty> },
                    quote! { ::kindling::axum::extract::Query(value) },
                ),
                _ => (quote! { #ty }, quote! { value }),
            };
            quote! {
                let #arg = match <#extractor as ::kindling::axum::extract::FromRequestParts<()>>::from_request_parts(&mut __parts, &()).await {
                    Ok(#pattern) => value,
                    Err(rejection) => return ::kindling::axum::response::IntoResponse::into_response(rejection),
                };
            }
        });

    let body_extraction = method
        .params
        .iter()
        .zip(&args)
        .find(|(p, _)| matches!(p.kind, ParamKind::Body | ParamKind::Request))
        .map(|(p, arg)| {
            let ty = &p.ty;
            if p.kind == ParamKind::Request {
                return quote! {
                    let #arg = ::kindling::axum::extract::Request::from_parts(__parts, __body);
                };
            }
            quote! {
                let #arg = match <::kindling::axum::Json<#ty> as ::kindling::axum::extract::FromRequest<()>>::from_request(
                    ::kindling::axum::extract::Request::from_parts(__parts, __body),
                    &(),
                ).await {
                    Ok(::kindling::axum::Json(value)) => value,
                    Err(rejection) => return ::kindling::axum::response::IntoResponse::into_response(rejection),
                };
            }
        });

    quote! {
        |__this: ::std::sync::Arc<Self>, __request: ::kindling::axum::extract::Request| async move {
            #[allow(unused_mut, unused_variables)]
            let (mut __parts, __body) = __request.into_parts();
            #(#parts_extractions)*
            #body_extraction
            ::kindling::axum::response::IntoResponse::into_response(
                __this.#fn_name(#(#args),*).await
            )
        }
    }
}

fn generate_event_handler(method: &MethodInfo, event: &str) -> TokenStream2 {
    let fn_name = &method.fn_name;
    let args: Vec<_> = (0..method.params.len())
        .map(|i| format_ident!("__p_{}", i))
        .collect();

    let extractions = method.params.iter().zip(&args).map(|(p, arg)| {
        let ty = &p.ty;
        if last_segment_is(ty, "SocketContext") {
            quote! { let #arg = __socket.clone(); }
        } else {
            quote! {
                let Some(#arg) = ::kindling::events::decode_payload::<#ty>(#event, &__payload) else {
                    return;
                };
            }
        }
    });

    quote! {
        |__this: ::std::sync::Arc<Self>,
         __socket: ::kindling::events::SocketContext,
         __payload: ::kindling::serde_json::Value| async move {
            #(#extractions)*
            let _ = __this.#fn_name(#(#args),*).await;
        }
    }
}

fn get_param_kind(attrs: &[Attribute], ty: &Type) -> ParamKind {
    for attr in attrs {
        if let Some(ident) = attr.path().get_ident() {
            match ident.to_string().as_str() {
                "body" => return ParamKind::Body,
                "param" => return ParamKind::Param,
                "query" => return ParamKind::Query,
                _ => {}
            }
        }
    }
    if last_segment_is(ty, "Request") {
        ParamKind::Request
    } else {
        ParamKind::Raw
    }
}

fn last_segment_is(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or(false, |segment| segment.ident == name),
        _ => false,
    }
}

fn is_route_attr(attr: &Attribute) -> bool {
    attr.path().get_ident().map_or(false, |ident| {
        let name = ident.to_string();
        VERBS.iter().any(|(verb, _)| *verb == name)
            || SOCKET_ATTRS.contains(&name.as_str())
            || name == "middleware"
    })
}

fn is_param_attr(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .map_or(false, |ident| PARAM_ATTRS.contains(&ident.to_string().as_str()))
}
