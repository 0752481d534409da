//! Procedural macros for httper.
//!
//! `#[adapter]` turns an inherent `impl` block into an HTTP adapter at
//! compile time. The annotated block is the program model: its `pub` methods
//! returning a `Result` become handlers, and `handle_error`/`handle_success`
//! are picked up as finalizers.
//!
//! ```rust,ignore
//! use httper_macros::adapter;
//!
//! pub struct Controller;
//!
//! #[adapter(name = "ControllerHttp", mode = "extended")]
//! impl Controller {
//!     pub fn get_by_id(&self, urlID: i64) -> Result<Tomato, Error> {
//!         // ...
//!     }
//! }
//!
//! let http = ControllerHttp::new(Controller, None);
//! ```

mod adapter;

use proc_macro::TokenStream;
use syn::{ItemImpl, parse_macro_input};

/// Generates an adapter type for an inherent impl block.
///
/// # Attributes
///
/// - `name = "..."` - adapter type name (default: `<Type>Http`)
/// - `mode = "minimal" | "extended"` - facet set (legacy `std`/`gorilla` accepted)
/// - `runtime = "..."` - path of the runtime crate (default: `::httper_framework`)
/// - `raw_body`, `writer`, `request` - override reserved parameter names
/// - `strict_unbound` - make unbindable parameters a compile error
/// - `snake_case` - also accept `get_name` style boundaries
#[proc_macro_attribute]
pub fn adapter(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = adapter::AdapterArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let imp = parse_macro_input!(item as ItemImpl);

    match adapter::expand(&args, imp) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
