//! Implementation of #[rpc_method] attribute macro

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{FnArg, ItemFn, Meta, Pat, Result, ReturnType, Token, punctuated::Punctuated};

use crate::utils::{
    capitalize, extract_doc_comment, extract_param_meta, is_option_type, is_request_context_type,
    is_result_type, lit_str_value,
};

pub fn rpc_method_impl(args: Punctuated<Meta, Token![,]>, input: ItemFn) -> Result<TokenStream> {
    let mut method_name = None;
    let mut method_description = None;

    for arg in args {
        if arg.path().is_ident("name") {
            method_name = Some(lit_str_value(&arg)?);
        } else if arg.path().is_ident("description") {
            method_description = Some(lit_str_value(&arg)?);
        } else {
            return Err(syn::Error::new_spanned(
                arg,
                "unknown #[rpc_method] argument, expected `name` or `description`",
            ));
        }
    }

    if !input.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.sig.generics,
            "#[rpc_method] does not support generic functions",
        ));
    }

    let fn_name = &input.sig.ident;
    let fn_vis = &input.vis;
    let fn_name_str = fn_name.unraw().to_string();
    let method_name = method_name.unwrap_or_else(|| fn_name_str.clone());
    let description = method_description.or_else(|| extract_doc_comment(&input.attrs));

    let struct_name = format_ident!("{}Method", capitalize(&fn_name_str));
    let impl_fn_name = format_ident!("{}_impl", fn_name_str);

    let mut signature_calls = Vec::new();
    let mut param_extractions = Vec::new();
    let mut fn_call_args = Vec::new();
    let mut takes_context = false;
    let mut has_rest = false;
    let mut has_extra = false;
    let mut saw_default = false;
    let mut saw_named_only = false;

    for (index, input_arg) in input.sig.inputs.iter().enumerate() {
        let pat_type = match input_arg {
            FnArg::Typed(pat_type) => pat_type,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[rpc_method] cannot be used on methods taking `self`",
                ));
            }
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "#[rpc_method] parameters must be plain identifiers",
            ));
        };
        let param_type = &pat_type.ty;
        let local = format_ident!("__arg{}", index);

        // The context never takes a slot in the JSON signature
        if is_request_context_type(param_type) {
            if takes_context {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    "only one RequestContext parameter is allowed",
                ));
            }
            takes_context = true;
            let extraction = if is_option_type(param_type) {
                quote! { let #local: #param_type = context.clone(); }
            } else {
                quote! { let #local: #param_type = context.clone().unwrap_or_default(); }
            };
            param_extractions.push(extraction);
            fn_call_args.push(quote! { #local });
            continue;
        }

        let param_meta = extract_param_meta(&pat_type.attrs)?;
        let param_name = param_meta
            .rename
            .clone()
            .unwrap_or_else(|| pat_ident.ident.unraw().to_string());

        if param_meta.rest {
            if has_rest {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    "only one `rest` parameter is allowed",
                ));
            }
            has_rest = true;
            signature_calls.push(quote! { .rest(#param_name) });
            param_extractions.push(quote! { let #local: #param_type = args.rest_as()?; });
            fn_call_args.push(quote! { #local });
            continue;
        }

        if param_meta.extra {
            if has_extra {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    "only one `extra` parameter is allowed",
                ));
            }
            has_extra = true;
            signature_calls.push(quote! { .extra(#param_name) });
            param_extractions.push(quote! { let #local: #param_type = args.extra_as()?; });
            fn_call_args.push(quote! { #local });
            continue;
        }

        let default = match (&param_meta.default, is_option_type(param_type)) {
            (Some(expr), _) => Some(quote! {
                ::turul_json_rpc_dispatcher::serde_json::json!(#expr)
            }),
            (None, true) => Some(quote! {
                ::turul_json_rpc_dispatcher::serde_json::Value::Null
            }),
            (None, false) => None,
        };

        // Anything after the surplus-positional collector can only be named
        if param_meta.named_only || has_rest {
            saw_named_only = true;
            let default = match &default {
                Some(value) => quote! { ::core::option::Option::Some(#value) },
                None => quote! { ::core::option::Option::None },
            };
            signature_calls.push(quote! { .named_only(#param_name, #default) });
        } else {
            if saw_named_only {
                return Err(syn::Error::new_spanned(
                    pat_type,
                    "positional parameters must come before `named_only` ones",
                ));
            }
            match &default {
                Some(value) => {
                    saw_default = true;
                    signature_calls.push(quote! { .optional(#param_name, #value) });
                }
                None if saw_default => {
                    return Err(syn::Error::new_spanned(
                        pat_type,
                        "required parameter follows a parameter with a default",
                    ));
                }
                None => signature_calls.push(quote! { .param(#param_name) }),
            }
        }

        let extraction = if is_option_type(param_type) {
            quote! { let #local: #param_type = args.get_optional(#param_name)?; }
        } else {
            quote! { let #local: #param_type = args.get_as(#param_name)?; }
        };
        param_extractions.push(extraction);
        fn_call_args.push(quote! { #local });
    }

    // Keep the function under a new name so the constructor can take the original one
    let mut clean_input = input.clone();
    clean_input
        .attrs
        .retain(|attr| !attr.path().is_ident("rpc_method"));
    clean_input.sig.ident = impl_fn_name.clone();
    for input_arg in &mut clean_input.sig.inputs {
        if let FnArg::Typed(pat_type) = input_arg {
            pat_type.attrs.retain(|attr| !attr.path().is_ident("param"));
        }
    }

    let call = quote! { #impl_fn_name(#(#fn_call_args),*) };
    let call = if input.sig.asyncness.is_some() {
        quote! { #call.await }
    } else {
        call
    };
    let invocation = match &input.sig.output {
        ReturnType::Type(_, ty) if is_result_type(ty) => quote! {
            #call.map_err(::core::convert::Into::<::turul_json_rpc_dispatcher::HandlerError>::into)?
        },
        _ => call,
    };

    let description_tokens = match &description {
        Some(text) => quote! { ::core::option::Option::Some(#text) },
        None => quote! { ::core::option::Option::None },
    };
    let struct_doc = format!("JSON-RPC method `{}` generated by `#[rpc_method]`", method_name);

    let expanded = quote! {
        #clean_input

        #[doc = #struct_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #fn_vis struct #struct_name;

        #[automatically_derived]
        #[::turul_json_rpc_dispatcher::async_trait]
        impl ::turul_json_rpc_dispatcher::MethodHandler for #struct_name {
            #[allow(unused_variables, clippy::let_unit_value)]
            async fn call(
                &self,
                args: ::turul_json_rpc_dispatcher::BoundArguments,
                context: ::core::option::Option<::turul_json_rpc_dispatcher::RequestContext>,
            ) -> ::core::result::Result<
                ::turul_json_rpc_dispatcher::serde_json::Value,
                ::turul_json_rpc_dispatcher::HandlerError,
            > {
                #(#param_extractions)*

                let result = #invocation;
                ::turul_json_rpc_dispatcher::serde_json::to_value(result)
                    .map_err(::turul_json_rpc_dispatcher::HandlerError::Serialization)
            }
        }

        #[automatically_derived]
        impl ::turul_json_rpc_dispatcher::RpcMethod for #struct_name {
            fn name(&self) -> &str {
                #method_name
            }

            fn signature(&self) -> ::turul_json_rpc_dispatcher::Signature {
                ::turul_json_rpc_dispatcher::Signature::new()
                    #(#signature_calls)*
            }

            fn takes_context(&self) -> bool {
                #takes_context
            }

            fn description(&self) -> ::core::option::Option<&str> {
                #description_tokens
            }
        }

        // Constructor under the original function name, for `registry.add(name())`
        #fn_vis fn #fn_name() -> #struct_name {
            #struct_name
        }
    };

    Ok(expanded)
}
