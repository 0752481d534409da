use httper_core::{Diagnostic, GenerateConfig, Mode, Program, Synthesizer, Target, plan_adapter, source};
use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, format_ident, quote, quote_spanned};
use syn::meta::ParseNestedMeta;
use syn::{FnArg, Ident, ImplItem, ItemImpl, LitStr, Pat};

// ============================================================================
// Arguments
// ============================================================================

/// Parsed `#[adapter(...)]` arguments.
#[derive(Default)]
pub struct AdapterArgs {
    name: Option<Ident>,
    mode: Option<Mode>,
    runtime: Option<LitStr>,
    raw_body: Option<LitStr>,
    writer: Option<LitStr>,
    request: Option<LitStr>,
    strict_unbound: bool,
    snake_case: bool,
}

impl AdapterArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let lit: LitStr = meta.value()?.parse()?;
            self.name = Some(lit.parse()?);
        } else if meta.path.is_ident("mode") {
            let lit: LitStr = meta.value()?.parse()?;
            let mode = lit
                .value()
                .parse::<Mode>()
                .map_err(|e| syn::Error::new(lit.span(), e))?;
            self.mode = Some(mode);
        } else if meta.path.is_ident("runtime") {
            self.runtime = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("raw_body") {
            self.raw_body = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("writer") {
            self.writer = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("request") {
            self.request = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("strict_unbound") {
            self.strict_unbound = true;
        } else if meta.path.is_ident("snake_case") {
            self.snake_case = true;
        } else {
            return Err(meta.error(
                "unknown adapter argument; expected name, mode, runtime, raw_body, writer, request, strict_unbound or snake_case",
            ));
        }
        Ok(())
    }

    fn config(&self) -> GenerateConfig {
        let mut config = GenerateConfig::new(self.mode.unwrap_or_default())
            .with_strict_unbound(self.strict_unbound)
            .with_snake_case_boundaries(self.snake_case);
        if let Some(runtime) = &self.runtime {
            config = config.with_runtime_path(runtime.value());
        }
        if let Some(name) = &self.raw_body {
            config.reserved.raw_body = name.value();
        }
        if let Some(name) = &self.writer {
            config.reserved.writer = name.value();
        }
        if let Some(name) = &self.request {
            config.reserved.request = name.value();
        }
        config
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Re-emits `imp` followed by the adapter generated from its methods.
pub fn expand(args: &AdapterArgs, imp: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &imp.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[adapter] must be placed on an inherent impl block",
        ));
    }
    if !imp.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &imp.generics,
            "#[adapter] does not support generic impl blocks",
        ));
    }

    let ty = source::type_from_impl(&imp)
        .ok_or_else(|| syn::Error::new_spanned(&imp.self_ty, "expected a named type"))?;

    let dst = args
        .name
        .clone()
        .unwrap_or_else(|| Ident::new(&format!("{}Http", ty.name), Span::call_site()));
    let target = Target::new(imp.self_ty.to_token_stream().to_string(), dst.to_string());

    let mut program = Program::new();
    program.insert(ty);

    let config = args.config();
    let to_syn = |e: httper_core::GenerateError| syn::Error::new_spanned(&imp.self_ty, e);
    let plan = plan_adapter(&program, &target, &config).map_err(to_syn)?;
    let adapter = Synthesizer::new(&config)
        .and_then(|synth| synth.adapter(&plan))
        .map_err(to_syn)?;

    let warnings = unbound_warnings(&imp, &plan.diagnostics);

    Ok(quote! {
        #imp
        #adapter
        #warnings
    })
}

// ============================================================================
// Warnings
// ============================================================================

/// Surfaces unbound parameters as compiler warnings.
///
/// Stable proc macros cannot emit warnings directly, so each diagnostic
/// becomes a use of a deprecated constant spanned on the parameter.
fn unbound_warnings(imp: &ItemImpl, diagnostics: &[Diagnostic]) -> TokenStream {
    let warnings = diagnostics
        .iter()
        .filter_map(|d| Some((d, d.param.as_deref()?)))
        .enumerate()
        .map(|(i, (diagnostic, param))| {
            let span = param_span(imp, &diagnostic.method, param).unwrap_or_else(Span::call_site);
            let name = format_ident!("__httper_unbound_{}", i, span = span);
            let note = warning_note(diagnostic);
            quote_spanned! {span=>
                const _: () = {
                    #[deprecated(note = #note)]
                    #[allow(non_upper_case_globals)]
                    const #name: () = ();
                    let _ = #name;
                };
            }
        });
    quote! { #(#warnings)* }
}

fn warning_note(diagnostic: &Diagnostic) -> String {
    format!("httper: unbound parameter in {diagnostic}")
}

/// Span of parameter `param` of method `method`, when both exist.
fn param_span(imp: &ItemImpl, method: &str, param: &str) -> Option<Span> {
    let f = imp.items.iter().find_map(|item| match item {
        ImplItem::Fn(f) if f.sig.ident == method => Some(f),
        _ => None,
    })?;
    f.sig.inputs.iter().find_map(|input| match input {
        FnArg::Typed(typed) => match &*typed.pat {
            Pat::Ident(pat) if pat.ident == param => Some(pat.ident.span()),
            _ => None,
        },
        FnArg::Receiver(_) => None,
    })
}
