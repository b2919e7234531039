//! # JSON-RPC Derive Macros
//!
//! Procedural macros for registering plain Rust functions with
//! `turul-json-rpc-dispatcher`.
//!
//! - `#[rpc_method]` - turn a sync or async `fn` into an `RpcMethod` with a
//!   parameter signature derived from its arguments
//!
//! The generated code refers to `::turul_json_rpc_dispatcher`, so the
//! dispatcher crate must be a direct dependency of the crate using the macro.

use proc_macro::TokenStream;
use syn::{ItemFn, Meta, Token, parse_macro_input, punctuated::Punctuated};

mod method_attr;
mod utils;

/// Function attribute macro for creating JSON-RPC methods
///
/// The function is kept under the name `<name>_impl`, and a constructor
/// `fn <name>() -> <Name>Method` is emitted in its place so it can be handed
/// straight to `MethodRegistry::add`.
///
/// # Attributes
///
/// - `name = "..."` - wire name of the method (defaults to the function name)
/// - `description = "..."` - description for introspection (defaults to the
///   function's doc comment)
///
/// Parameters can carry `#[param(...)]`:
///
/// - `rename = "..."` - wire name of the argument
/// - `default = <expr>` - value used when the caller omits the argument
/// - `named_only` - the argument can only be passed by name
/// - `rest` - collects surplus positional values (e.g. `Vec<T>`)
/// - `extra` - collects surplus named values (e.g. `Map<String, Value>`)
///
/// A parameter typed `RequestContext` or `Option<RequestContext>` turns on
/// context injection and does not appear in the JSON signature. `Option<T>`
/// parameters are optional with a `null` default.
///
/// # Example
///
/// ```rust,ignore
/// use turul_json_rpc_dispatcher::{HandlerError, rpc_method};
///
/// /// Divide two numbers
/// #[rpc_method]
/// async fn divide(a: f64, b: f64) -> Result<f64, HandlerError> {
///     if b == 0.0 {
///         return Err(HandlerError::invalid_params("b must not be zero"));
///     }
///     Ok(a / b)
/// }
///
/// registry.add(divide())?;
/// ```
#[proc_macro_attribute]
pub fn rpc_method(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input = parse_macro_input!(input as ItemFn);

    method_attr::rpc_method_impl(args, input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
