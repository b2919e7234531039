//! Shared helpers for inspecting function signatures

use syn::{Attribute, Expr, Lit, Meta, Result, Type};

/// Per-parameter options from `#[param(...)]`
#[derive(Default)]
pub struct ParamMeta {
    pub rename: Option<String>,
    pub default: Option<Expr>,
    pub named_only: bool,
    pub rest: bool,
    pub extra: bool,
}

pub fn extract_param_meta(attrs: &[Attribute]) -> Result<ParamMeta> {
    let mut meta = ParamMeta::default();

    for attr in attrs {
        if attr.path().is_ident("param") {
            attr.parse_nested_meta(|nested_meta| {
                if nested_meta.path.is_ident("rename") {
                    let value = nested_meta.value()?;
                    let s: syn::LitStr = value.parse()?;
                    meta.rename = Some(s.value());
                } else if nested_meta.path.is_ident("default") {
                    let value = nested_meta.value()?;
                    meta.default = Some(value.parse()?);
                } else if nested_meta.path.is_ident("named_only") {
                    meta.named_only = true;
                } else if nested_meta.path.is_ident("rest") {
                    meta.rest = true;
                } else if nested_meta.path.is_ident("extra") {
                    meta.extra = true;
                } else {
                    return Err(nested_meta.error(
                        "unknown #[param] option, expected `rename`, `default`, `named_only`, `rest` or `extra`",
                    ));
                }
                Ok(())
            })?;
        }
    }

    if [meta.named_only, meta.rest, meta.extra]
        .iter()
        .filter(|flag| **flag)
        .count()
        > 1
    {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`named_only`, `rest` and `extra` are mutually exclusive",
        ));
    }
    if meta.default.is_some() && (meta.rest || meta.extra) {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`default` cannot be combined with `rest` or `extra`",
        ));
    }

    Ok(meta)
}

/// String literal value of `name = "..."`
pub fn lit_str_value(meta: &Meta) -> Result<String> {
    if let Meta::NameValue(nv) = meta
        && let Expr::Lit(expr_lit) = &nv.value
        && let Lit::Str(s) = &expr_lit.lit
    {
        return Ok(s.value());
    }
    Err(syn::Error::new_spanned(meta, "expected a string literal"))
}

/// Joined `///` doc comment lines, `None` when there are none
pub fn extract_doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| {
            let nv = attr.meta.require_name_value().ok()?;
            if let Expr::Lit(expr_lit) = &nv.value
                && let Lit::Str(s) = &expr_lit.lit
            {
                let line = s.value();
                Some(line.strip_prefix(' ').unwrap_or(&line).to_string())
            } else {
                None
            }
        })
        .collect();

    let doc = lines.join("\n");
    let doc = doc.trim();
    if doc.is_empty() {
        None
    } else {
        Some(doc.to_string())
    }
}

/// Convert snake_case to PascalCase
pub fn capitalize(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => {
                    let mut result = first.to_uppercase().collect::<String>();
                    result.push_str(chars.as_str());
                    result
                }
            }
        })
        .collect()
}

/// Inner type of `Option<T>`
pub fn option_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Option"
        && let syn::PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(syn::GenericArgument::Type(inner_type)) = args.args.first()
    {
        return Some(inner_type);
    }
    None
}

pub fn is_option_type(ty: &Type) -> bool {
    option_inner_type(ty).is_some()
}

/// Check if a type is `RequestContext` or `Option<RequestContext>`
pub fn is_request_context_type(ty: &Type) -> bool {
    if let Some(inner_type) = option_inner_type(ty) {
        return is_request_context_type(inner_type);
    }
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "RequestContext"),
        _ => false,
    }
}

/// Whether a return type is some `Result<T, ..>` (including aliases like `anyhow::Result<T>`)
pub fn is_result_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
    {
        return segment.ident == "Result";
    }
    false
}
