//! Program model built from Rust sources.
//!
//! Every inherent `impl` block contributes its methods to the type it
//! implements; trait impls are ignored. Structs and enums declare their type
//! even when no methods are found, so an empty adapter can still be planned.

use quote::ToTokens;
use syn::{
    Attribute, FnArg, GenericArgument, ImplItem, ImplItemFn, Item, ItemImpl, Pat, PathArguments,
    ReturnType, Type, Visibility,
};

use crate::error::GenerateResult;
use crate::model::{MethodDescriptor, ParamDescriptor, ParamShape, Program, TypeDescriptor};

const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

const POINTERS: &[&str] = &["Arc", "Rc", "Box"];

/// Parses a Rust source file into a program model.
pub fn parse_source(src: &str) -> GenerateResult<Program> {
    let file = syn::parse_file(src)?;
    Ok(program_from_items(&file.items))
}

/// Builds a program model from parsed items, descending into inline modules.
pub fn program_from_items(items: &[Item]) -> Program {
    let mut program = Program::new();
    collect(items, &mut program);
    program
}

fn collect(items: &[Item], program: &mut Program) {
    for item in items {
        match item {
            Item::Struct(s) => {
                program.declare(&s.ident.to_string()).docs.extend(docs(&s.attrs));
            }
            Item::Enum(e) => {
                program.declare(&e.ident.to_string()).docs.extend(docs(&e.attrs));
            }
            Item::Impl(imp) => {
                if let Some(ty) = type_from_impl(imp) {
                    program.insert(ty);
                }
            }
            Item::Mod(m) => {
                if let Some((_, items)) = &m.content {
                    collect(items, program);
                }
            }
            _ => {}
        }
    }
}

/// Describes the methods of an inherent `impl` block.
///
/// Returns `None` for trait impls and for self types without a name.
pub fn type_from_impl(imp: &ItemImpl) -> Option<TypeDescriptor> {
    if imp.trait_.is_some() {
        return None;
    }
    let name = base_type_name(&imp.self_ty)?;
    let methods = imp
        .items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(f) => method_descriptor(f),
            _ => None,
        })
        .collect();

    Some(TypeDescriptor {
        name,
        methods,
        docs: Vec::new(),
    })
}

/// Describes a method; associated functions without a receiver yield `None`.
fn method_descriptor(f: &ImplItemFn) -> Option<MethodDescriptor> {
    let sig = &f.sig;
    if sig.receiver().is_none() {
        return None;
    }

    let params = sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pt) => Some(pt),
            FnArg::Receiver(_) => None,
        })
        .enumerate()
        .map(|(i, pt)| {
            let name = match pt.pat.as_ref() {
                Pat::Ident(p) => p.ident.to_string(),
                _ => format!("arg{i}"),
            };
            ParamDescriptor {
                name,
                shape: param_shape(&pt.ty),
                ty: pt.ty.to_token_stream().to_string(),
            }
        })
        .collect();

    Some(MethodDescriptor {
        name: sig.ident.to_string(),
        params,
        exported: matches!(f.vis, Visibility::Public(_)),
        returns_result: returns_result(&sig.output),
        docs: docs(&f.attrs),
    })
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => last_ident(ty).is_some_and(|id| id == "Result"),
        ReturnType::Default => false,
    }
}

/// Classifies a declared parameter type.
pub fn param_shape(ty: &Type) -> ParamShape {
    match ty {
        Type::Paren(p) => param_shape(&p.elem),
        Type::Group(g) => param_shape(&g.elem),
        Type::Reference(r) => match last_ident(&r.elem).as_deref() {
            Some("HttpResponse") if r.mutability.is_some() => ParamShape::ResponseWriter,
            Some("HttpRequest") => ParamShape::Request,
            Some("CookieJar") => ParamShape::CookieAccessor,
            Some("Session") => ParamShape::SessionAccessor,
            Some("RequestBody") => ParamShape::RawBody,
            _ => ParamShape::Opaque,
        },
        Type::Path(_) => match last_ident(ty).as_deref() {
            Some("String") if is_bare(ty) => ParamShape::Text,
            Some(id) if INTEGERS.contains(&id) && is_bare(ty) => ParamShape::Integer,
            Some("CookieJar") => ParamShape::CookieAccessor,
            Some("Session") => ParamShape::SessionAccessor,
            Some("RequestBody") => ParamShape::RawBody,
            _ => ParamShape::Opaque,
        },
        _ => ParamShape::Opaque,
    }
}

/// Returns the declared type name behind references and `Arc`/`Rc`/`Box`.
pub fn base_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Reference(r) => base_type_name(&r.elem),
        Type::Paren(p) => base_type_name(&p.elem),
        Type::Group(g) => base_type_name(&g.elem),
        Type::Path(tp) => {
            let segment = tp.path.segments.last()?;
            if POINTERS.contains(&segment.ident.to_string().as_str())
                && let PathArguments::AngleBracketed(args) = &segment.arguments
                && let Some(GenericArgument::Type(inner)) = args.args.first()
            {
                return base_type_name(inner);
            }
            Some(segment.ident.to_string())
        }
        _ => None,
    }
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(tp) => tp.path.segments.last().map(|s| s.ident.to_string()),
        Type::Paren(p) => last_ident(&p.elem),
        Type::Group(g) => last_ident(&g.elem),
        _ => None,
    }
}

fn is_bare(ty: &Type) -> bool {
    match ty {
        Type::Path(tp) => tp
            .path
            .segments
            .last()
            .is_some_and(|s| s.arguments.is_none()),
        _ => false,
    }
}

fn docs(attrs: &[Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgramModel;

    const SOURCE: &str = r#"
        /// Tomato resources.
        pub struct Controller {
            backend: Store,
        }

        impl Controller {
            pub fn new(backend: Store) -> Self {
                Self { backend }
            }

            /// Looks a tomato up.
            pub fn get_by_id(&self, urlID: i64) -> Result<Cursor<Vec<u8>>, Error> {
                todo!()
            }

            pub fn update_by_id(&self, urlID: u32, req_body: RequestBody) -> anyhow::Result<String> {
                todo!()
            }

            pub fn vars(&self, w: &mut HttpResponse, r: &HttpRequest, c: &CookieJar, s: Session) -> Result<(), Error> {
                todo!()
            }

            fn hidden(&self, getName: String) -> Result<(), Error> {
                todo!()
            }

            pub fn count(&self) -> usize {
                0
            }
        }

        impl Display for Controller {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                todo!()
            }
        }

        pub enum Empty {}
    "#;

    #[test]
    fn test_parse_source() {
        let program = parse_source(SOURCE).unwrap();
        let ty = program.lookup("Controller").unwrap();

        let names: Vec<_> = ty.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["get_by_id", "update_by_id", "vars", "hidden", "count"]);
        assert_eq!(ty.docs, vec!["Tomato resources."]);

        let get = ty.method("get_by_id").unwrap();
        assert!(get.exported);
        assert!(get.returns_result);
        assert_eq!(get.docs, vec!["Looks a tomato up."]);
        assert_eq!(get.params[0].name, "urlID");
        assert_eq!(get.params[0].shape, ParamShape::Integer);

        assert!(!ty.method("hidden").unwrap().exported);
        assert!(!ty.method("count").unwrap().returns_result);
        assert!(program.lookup("Empty").unwrap().methods.is_empty());
    }

    #[test]
    fn test_param_shapes() {
        let program = parse_source(SOURCE).unwrap();
        let ty = program.lookup("Controller").unwrap();

        let shapes: Vec<_> = ty
            .method("vars")
            .unwrap()
            .params
            .iter()
            .map(|p| p.shape)
            .collect();
        assert_eq!(
            shapes,
            vec![
                ParamShape::ResponseWriter,
                ParamShape::Request,
                ParamShape::CookieAccessor,
                ParamShape::SessionAccessor,
            ]
        );

        let update = ty.method("update_by_id").unwrap();
        assert_eq!(update.params[1].shape, ParamShape::RawBody);
    }

    #[test]
    fn test_shape_of_unsupported_types() {
        for text in ["&str", "Vec<String>", "Option<i64>", "f64", "&HttpResponse"] {
            let ty: Type = syn::parse_str(text).unwrap();
            assert_eq!(param_shape(&ty), ParamShape::Opaque, "{text}");
        }
    }

    #[test]
    fn test_base_type_name() {
        for (text, expected) in [
            ("Controller", "Controller"),
            ("&'static Controller", "Controller"),
            ("Arc<Controller>", "Controller"),
            ("crate::api::Controller", "Controller"),
            ("Box<Arc<Controller>>", "Controller"),
        ] {
            let ty: Type = syn::parse_str(text).unwrap();
            assert_eq!(base_type_name(&ty).as_deref(), Some(expected));
        }
    }
}
