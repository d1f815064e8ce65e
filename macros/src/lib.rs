//! Test attribute used across the rxkit test suites.
//!
//! `#[rxkit_macro::test]` expands to `#[test]` for sync functions and to
//! `#[tokio::test]` for async ones, and to `wasm_bindgen_test` on wasm32.
//! Async tests may pick a runtime flavor: `#[rxkit_macro::test(current)]`
//! (the default) or `#[rxkit_macro::test(threaded)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

const USAGE: &str = "rxkit_macro::test accepts no arguments, or one of `current` / `threaded` \
                     (optionally as a string literal) on async tests";

fn flavor_tokens(name: &str, span: proc_macro2::Span) -> syn::Result<proc_macro2::TokenStream> {
  match name {
    "current" => Ok(quote!(flavor = "current_thread")),
    "threaded" => Ok(quote!(flavor = "multi_thread", worker_threads = 2)),
    _ => Err(syn::Error::new(span, USAGE)),
  }
}

fn runtime_args(
  raw: proc_macro2::TokenStream, is_async: bool,
) -> syn::Result<proc_macro2::TokenStream> {
  if raw.is_empty() {
    return Ok(proc_macro2::TokenStream::new());
  }
  if !is_async {
    return Err(syn::Error::new(raw.span(), "runtime flavor arguments require an async test"));
  }
  if let Ok(ident) = syn::parse2::<Ident>(raw.clone()) {
    flavor_tokens(&ident.to_string(), ident.span())
  } else if let Ok(lit) = syn::parse2::<LitStr>(raw.clone()) {
    flavor_tokens(&lit.value(), lit.span())
  } else {
    Err(syn::Error::new(raw.span(), USAGE))
  }
}

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let tokio_args = match runtime_args(proc_macro2::TokenStream::from(attr), is_async) {
    Ok(args) => args,
    Err(err) => return TokenStream::from(err.to_compile_error()),
  };

  let wasm_attr = if is_async {
    quote!(wasm_bindgen_test::wasm_bindgen_test(async))
  } else {
    quote!(wasm_bindgen_test::wasm_bindgen_test)
  };
  let native_attr = if is_async { quote!(tokio::test(#tokio_args)) } else { quote!(test) };

  let expanded = quote! {
      #[cfg_attr(target_arch = "wasm32", #wasm_attr)]
      #[cfg_attr(not(target_arch = "wasm32"), #native_attr)]
      #input
  };
  TokenStream::from(expanded)
}
