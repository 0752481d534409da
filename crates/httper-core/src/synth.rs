//! Handler synthesizer.
//!
//! Renders an [`AdapterPlan`] as Rust items: the adapter struct, its
//! constructor, one handler per planned method, a handler table and the
//! [`Finalizer`] implementation chosen at generation time.
//!
//! Every emitted handler follows the same four phases:
//!
//! 1. **Bind**: convention-bound values are resolved through one provider
//!    chain, then the raw body, cookie jars and session handles are made.
//! 2. **Coerce**: an integer that fails to parse goes to the error finalizer
//!    and the backend is never invoked.
//! 3. **Invoke**: the backend method is called with the arguments in
//!    declaration order.
//! 4. **Finalize**: cookie jars are flushed, then `Ok` goes to the success
//!    finalizer and `Err` to the error finalizer.
//!
//! [`Finalizer`]: httper_framework::Finalizer

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::Type;

use crate::config::GenerateConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::model::{ParamDescriptor, ParamShape};
use crate::plan::{AdapterPlan, BindingStrategy, Coercion, MethodPlan};
use httper_framework::{FacetKind, Mode};

/// Header written at the top of every generated file.
pub const GENERATED_HEADER: &str = "// Code generated by httper. DO NOT EDIT.";

/// How a parameter type receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Passing {
    Owned,
    Shared,
    Unique,
}

impl Passing {
    fn of(ty: &Type) -> Self {
        match ty {
            Type::Reference(r) if r.mutability.is_some() => Self::Unique,
            Type::Reference(_) => Self::Shared,
            Type::Paren(p) => Self::of(&p.elem),
            Type::Group(g) => Self::of(&g.elem),
            _ => Self::Owned,
        }
    }
}

/// Renders adapter plans into token streams.
pub struct Synthesizer {
    rt: syn::Path,
    mode: Mode,
}

impl Synthesizer {
    /// Creates a synthesizer for `config`.
    ///
    /// Fails if the configured runtime path does not parse.
    pub fn new(config: &GenerateConfig) -> GenerateResult<Self> {
        Ok(Self {
            rt: config.parse_runtime_path()?,
            mode: config.mode,
        })
    }

    /// Renders one adapter.
    pub fn adapter(&self, plan: &AdapterPlan) -> GenerateResult<TokenStream> {
        let rt = &self.rt;
        let dst = ident(&plan.target.dst)?;
        let src = plan.target.src_type()?;

        let handlers = plan
            .methods
            .iter()
            .map(|method| self.handler(method))
            .collect::<GenerateResult<Vec<_>>>()?;
        let table = plan
            .methods
            .iter()
            .map(|method| {
                let name = &method.name;
                let handler = ident(name)?;
                Ok(quote! { (#name, Self::#handler) })
            })
            .collect::<GenerateResult<Vec<_>>>()?;

        let struct_doc = format!(
            " HTTP adapter over [`{}`], exposing each of its handler methods.",
            plan.src_name
        );
        let constructor = self.constructor(&src);
        let finalizer = self.finalizer_impl(&dst, plan);

        Ok(quote! {
            #[doc = #struct_doc]
            pub struct #dst {
                embed: #src,
                cookier: #rt::CookieProvider,
                dataer: #rt::DataProvider,
                sessioner: #rt::SessionProvider,
            }

            impl #dst {
                #constructor

                /// Handlers by backend method name.
                pub const HANDLERS: &'static [(&'static str, #rt::Handler<Self>)] = &[#(#table),*];

                /// Returns the wrapped backend.
                pub fn embed(&self) -> &#src {
                    &self.embed
                }

                #(#handlers)*
            }

            #finalizer
        })
    }

    fn constructor(&self, src: &Type) -> TokenStream {
        let rt = &self.rt;
        match self.mode {
            Mode::Minimal => quote! {
                /// Wraps `embed`.
                pub fn new(embed: #src) -> Self {
                    Self {
                        embed,
                        cookier: #rt::CookieProvider::new(),
                        dataer: #rt::DataProvider::new(#rt::Mode::Minimal),
                        sessioner: #rt::SessionProvider::void(),
                    }
                }
            },
            Mode::Extended => quote! {
                /// Wraps `embed`. Without a session store the session facet is
                /// left out of the provider chain and sessions are void.
                pub fn new(embed: #src, sessions: ::core::option::Option<#rt::SessionConfig>) -> Self {
                    Self {
                        embed,
                        cookier: #rt::CookieProvider::new(),
                        dataer: #rt::DataProvider::new(#rt::Mode::Extended).with_sessions(sessions.clone()),
                        sessioner: #rt::SessionProvider::new(sessions),
                    }
                }
            },
        }
    }

    fn finalizer_impl(&self, dst: &Ident, plan: &AdapterPlan) -> TokenStream {
        let rt = &self.rt;
        let on_error = if plan.finalizers.error {
            quote! { self.embed.handle_error(err, w, r) }
        } else {
            quote! { #rt::Finalizer::handle_error(&#rt::HttpFinalizer, err, w, r) }
        };
        let on_success = if plan.finalizers.success {
            quote! { self.embed.handle_success(w, body) }
        } else {
            quote! { #rt::Finalizer::handle_success(&#rt::HttpFinalizer, w, body) }
        };

        quote! {
            impl #rt::Finalizer for #dst {
                fn handle_error(
                    &self,
                    err: &dyn ::core::fmt::Display,
                    w: &mut #rt::HttpResponse,
                    r: &#rt::HttpRequest,
                ) {
                    #on_error
                }

                fn handle_success(
                    &self,
                    w: &mut #rt::HttpResponse,
                    body: &mut dyn ::std::io::Read,
                ) -> ::std::io::Result<()> {
                    #on_success
                }
            }
        }
    }

    fn handler(&self, method: &MethodPlan) -> GenerateResult<TokenStream> {
        let rt = &self.rt;
        let name = ident(&method.name)?;
        let method_name = &method.name;
        let docs = &method.docs;

        let mut resolve = Vec::new();
        let mut bind = Vec::new();
        let mut args = Vec::new();
        let mut flush = Vec::new();

        for entry in &method.entries {
            let param = &entry.param;
            let var = ident(&param.name)?;
            let ty = param_type(param)?;
            let passing = Passing::of(&ty);

            match &entry.strategy {
                BindingStrategy::ConventionBound {
                    facet,
                    key,
                    coercion,
                } => {
                    let facet = facet_tokens(rt, *facet);
                    let lookup = quote! { __data.get_text(#facet, #key) };
                    let label = &param.name;
                    resolve.push(match coercion {
                        Coercion::ParseInt => quote! {
                            let #var: #ty = match #rt::coerce::<#ty>(#label, #lookup) {
                                ::core::result::Result::Ok(value) => value,
                                ::core::result::Result::Err(err) => {
                                    #rt::Finalizer::handle_error(self, &err, __w, __r);
                                    return;
                                }
                            };
                        },
                        Coercion::Identity => quote! {
                            let #var: #ty = #lookup.unwrap_or_default();
                        },
                    });
                    args.push(quote! { #var });
                }
                BindingStrategy::RawBody => {
                    bind.push(match passing {
                        Passing::Owned => quote! {
                            let #var: #ty = ::core::convert::From::from(__r.take_body());
                        },
                        Passing::Shared => quote! { let #var = __r.take_body(); },
                        Passing::Unique => quote! { let mut #var = __r.take_body(); },
                    });
                    args.push(pass(&var, passing, false));
                }
                BindingStrategy::CookieInjection => {
                    bind.push(match passing {
                        Passing::Unique => quote! { let mut #var = self.cookier.make(__r); },
                        _ => quote! { let #var = self.cookier.make(__r); },
                    });
                    args.push(pass(&var, passing, true));
                    flush.push(quote! { #var.write_to(__w); });
                }
                BindingStrategy::SessionInjection => {
                    bind.push(match passing {
                        Passing::Unique => quote! { let mut #var = self.sessioner.make(__w, __r); },
                        _ => quote! { let #var = self.sessioner.make(__w, __r); },
                    });
                    args.push(pass(&var, passing, false));
                }
                BindingStrategy::ContextPassthrough => {
                    args.push(match (param.shape, passing) {
                        (ParamShape::ResponseWriter, _) => quote! { &mut *__w },
                        (_, Passing::Unique) => quote! { &mut *__r },
                        _ => quote! { &*__r },
                    });
                }
                BindingStrategy::Unbound => {
                    bind.push(quote! {
                        let #var: #ty = ::core::default::Default::default();
                    });
                    args.push(quote! { #var });
                }
            }
        }

        let data = if method.uses_provider_chain() {
            quote! {
                let __data = self.dataer.make(__r);
                #(#resolve)*
                ::core::mem::drop(__data);
            }
        } else {
            TokenStream::new()
        };

        Ok(quote! {
            #(#[doc = #docs])*
            #[allow(non_snake_case)]
            pub fn #name(&self, __w: &mut #rt::HttpResponse, __r: &mut #rt::HttpRequest) {
                #data
                #(#bind)*

                let __res = self.embed.#name(#(#args),*);
                #(#flush)*

                match __res {
                    ::core::result::Result::Ok(mut __body) => {
                        if let ::core::result::Result::Err(err) =
                            #rt::Finalizer::handle_success(self, __w, &mut __body)
                        {
                            #rt::tracing::warn!(handler = #method_name, error = %err, "Failed to write response body");
                        }
                    }
                    ::core::result::Result::Err(err) => {
                        #rt::Finalizer::handle_error(self, &err, __w, __r);
                    }
                }
            }
        })
    }
}

/// Renders generated adapters as one formatted source file.
///
/// The file is meant to be `include!`d in the module declaring the backend
/// types. Runtime items are spelled through `runtime`, so no imports are
/// needed beyond a dependency on that crate.
pub fn render_file(adapters: &[TokenStream], runtime: &str) -> GenerateResult<String> {
    let tokens = quote! { #(#adapters)* };
    let file: syn::File =
        syn::parse2(tokens).map_err(|e| GenerateError::Render(e.to_string()))?;

    let mut out = String::from(GENERATED_HEADER);
    out.push_str("\n//\n");
    out.push_str("// Include this file next to the backend types, e.g. `include!(\"adapters.rs\");`.\n");
    out.push_str(&format!("// Runtime items are referenced through `{runtime}`; no imports are needed.\n\n"));
    out.push_str(&prettyplease::unparse(&file));
    Ok(out)
}

fn ident(name: &str) -> GenerateResult<Ident> {
    syn::parse_str(name).map_err(|_| GenerateError::InvalidIdent(name.to_string()))
}

fn param_type(param: &ParamDescriptor) -> GenerateResult<Type> {
    syn::parse_str(&param.ty).map_err(|e| GenerateError::invalid_type(&param.ty, &e))
}

fn pass(var: &Ident, passing: Passing, clone_owned: bool) -> TokenStream {
    match passing {
        Passing::Owned if clone_owned => quote! { #var.clone() },
        Passing::Owned => quote! { #var },
        Passing::Shared => quote! { &#var },
        Passing::Unique => quote! { &mut #var },
    }
}

fn facet_tokens(rt: &syn::Path, facet: FacetKind) -> TokenStream {
    let variant = match facet {
        FacetKind::Get => format_ident!("Get"),
        FacetKind::Post => format_ident!("Post"),
        FacetKind::Req => format_ident!("Req"),
        FacetKind::Cookie => format_ident!("Cookie"),
        FacetKind::Url => format_ident!("Url"),
        FacetKind::Route => format_ident!("Route"),
        FacetKind::Session => format_ident!("Session"),
    };
    quote! { #rt::FacetKind::#variant }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MethodDescriptor, Program, TypeDescriptor};
    use crate::plan::{Target, plan_adapter};

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn program(methods: Vec<MethodDescriptor>) -> Program {
        let mut program = Program::new();
        program.insert(TypeDescriptor {
            name: "Controller".into(),
            methods,
            docs: vec![],
        });
        program
    }

    fn render(methods: Vec<MethodDescriptor>, mode: Mode) -> TokenStream {
        let config = GenerateConfig::new(mode);
        let target = Target::new("Arc<Controller>", "ControllerHttp");
        let plan = plan_adapter(&program(methods), &target, &config).unwrap();
        Synthesizer::new(&config).unwrap().adapter(&plan).unwrap()
    }

    #[test]
    fn test_output_is_valid_rust() {
        let tokens = render(
            vec![
                MethodDescriptor::new("get_by_id").param("urlID", "i64", ParamShape::Integer),
                MethodDescriptor::new("update_by_id")
                    .param("urlID", "i64", ParamShape::Integer)
                    .param("req_body", "RequestBody", ParamShape::RawBody),
            ],
            Mode::Extended,
        );
        let file: syn::File = syn::parse2(tokens).unwrap();
        assert_eq!(file.items.len(), 3);
    }

    #[test]
    fn test_integer_coercion_short_circuits() {
        let out = compact(&render(
            vec![MethodDescriptor::new("get_by_id").param("urlID", "i64", ParamShape::Integer)],
            Mode::Extended,
        ));
        assert!(out.contains(
            "coerce::<i64>(\"urlID\",__data.get_text(::httper_framework::FacetKind::Url,\"id\"))"
        ));
        assert!(out.contains("handle_error(self,&err,__w,__r);return;"));
        assert!(out.contains("self.embed.get_by_id(urlID)"));
    }

    #[test]
    fn test_bind_order_and_passing() {
        let out = compact(&render(
            vec![MethodDescriptor::new("update")
                .param("req_body", "RequestBody", ParamShape::RawBody)
                .param("c", "&CookieJar", ParamShape::CookieAccessor)
                .param("getName", "String", ParamShape::Text)
                .param("w", "&mut HttpResponse", ParamShape::ResponseWriter)
                .param("r", "&HttpRequest", ParamShape::Request)],
            Mode::Minimal,
        ));

        let resolve = out.find("letgetName").unwrap();
        let release = out.find("drop(__data)").unwrap();
        let body = out.find("letreq_body").unwrap();
        let invoke = out.find("self.embed.update(").unwrap();
        let flush = out.find("c.write_to(__w)").unwrap();
        assert!(resolve < release && release < body && body < invoke && invoke < flush);

        assert!(out.contains("self.embed.update(req_body,&c,getName,&mut*__w,&*__r)"));
    }

    #[test]
    fn test_no_provider_chain_without_convention_params() {
        let out = compact(&render(
            vec![MethodDescriptor::new("list").param("w", "&mut HttpResponse", ParamShape::ResponseWriter)],
            Mode::Minimal,
        ));
        assert!(!out.contains("__data"));
    }

    #[test]
    fn test_unbound_is_default_valued() {
        let out = compact(&render(
            vec![MethodDescriptor::new("get_by_id").param("urlID", "i64", ParamShape::Integer)],
            Mode::Minimal,
        ));
        assert!(out.contains("leturlID:i64=::core::default::Default::default();"));
    }

    #[test]
    fn test_constructor_per_mode() {
        let minimal = compact(&render(vec![], Mode::Minimal));
        assert!(minimal.contains("pubfnnew(embed:Arc<Controller>)->Self"));
        assert!(minimal.contains("SessionProvider::void()"));

        let extended = compact(&render(vec![], Mode::Extended));
        assert!(extended.contains("sessions:::core::option::Option<::httper_framework::SessionConfig>"));
    }

    #[test]
    fn test_finalizer_delegation() {
        let handle_success = MethodDescriptor::new(crate::HANDLE_SUCCESS)
            .param("w", "&mut HttpResponse", ParamShape::ResponseWriter)
            .param("body", "&mut dyn Read", ParamShape::Opaque);
        let out = compact(&render(vec![handle_success], Mode::Minimal));

        assert!(out.contains("self.embed.handle_success(w,body)"));
        assert!(out.contains("Finalizer::handle_error(&::httper_framework::HttpFinalizer,err,w,r)"));
        assert!(!out.contains("pubfnhandle_success"));
    }

    #[test]
    fn test_render_file_header() {
        let file = render_file(&[render(vec![], Mode::Minimal)], "::httper_framework").unwrap();
        assert!(file.starts_with(GENERATED_HEADER));
        assert!(file.contains("include!"));
        assert!(file.contains("`::httper_framework`"));
        assert!(file.contains("ControllerHttp"));
    }

    #[test]
    fn test_render_file_is_formatted() {
        let file = render_file(&[render(vec![], Mode::Minimal)], "::httper_framework").unwrap();
        assert!(file.contains("\npub struct ControllerHttp {\n"));
        assert!(file.lines().count() > 10);
        assert!(file.ends_with('\n'));
    }

    #[test]
    fn test_render_file_rejects_unparsable_tokens() {
        let err = render_file(&[quote! { pub struct }], "::httper_framework").unwrap_err();
        assert!(matches!(err, GenerateError::Render(_)));
    }

    #[test]
    fn test_invalid_adapter_name() {
        let config = GenerateConfig::default();
        let target = Target::new("Controller", "not an ident");
        let plan = plan_adapter(&program(vec![]), &target, &config).unwrap();
        let err = Synthesizer::new(&config).unwrap().adapter(&plan).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidIdent(_)));
    }
}
