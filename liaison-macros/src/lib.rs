//! Derive macros for Liaison messages.
//!
//! - `#[derive(Request)]` implements `Message` and `Request`. The response
//!   type is set with `#[request(response = T)]` and defaults to `Unit`,
//!   which makes the request a command.
//! - `#[derive(Notification)]` implements `Message` and `Notification`.
//!
//! Both accept `shape = path::to::fn`, a `fn() -> Shape` used as the
//! message's runtime shape instead of the plain default.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod message;

/// Derive `Message` and `Request`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Request)]
/// #[request(response = String)]
/// struct Ping;
///
/// #[derive(Request)]
/// struct Save { id: u64 }  // a command
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    message::expand(&input, message::Kind::Request)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive `Message` and `Notification`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Notification)]
/// struct Pinged { at: u64 }
/// ```
#[proc_macro_derive(Notification, attributes(notification))]
pub fn derive_notification(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    message::expand(&input, message::Kind::Notification)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
