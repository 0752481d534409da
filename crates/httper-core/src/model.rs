//! Program model consumed by the binding planner.
//!
//! The planner never loads code itself. It queries a [`ProgramModel`] for the
//! methods declared on a type. [`Program`] is the in-memory model built either
//! from Rust sources (see [`crate::source`]) or from a JSON manifest.

use serde::{Deserialize, Serialize};

/// Declared shape of a method parameter.
///
/// Only [`Text`](Self::Text) and [`Integer`](Self::Integer) values can be
/// resolved from request data. Other shapes are either injected structurally
/// or left unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamShape {
    /// `String`.
    Text,
    /// Any primitive integer type.
    Integer,
    /// Any other type.
    Opaque,
    /// `&mut HttpResponse`.
    ResponseWriter,
    /// `&HttpRequest` or `&mut HttpRequest`.
    Request,
    /// `CookieJar`.
    CookieAccessor,
    /// `Session`.
    SessionAccessor,
    /// `RequestBody`.
    RawBody,
}

/// A single method parameter: its identifier, shape and declared type text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter identifier as written in the signature.
    pub name: String,
    /// Classified shape.
    pub shape: ParamShape,
    /// Declared Rust type, e.g. `i64` or `&mut HttpResponse`.
    pub ty: String,
}

impl ParamDescriptor {
    /// Creates a parameter descriptor.
    pub fn new(name: impl Into<String>, ty: impl Into<String>, shape: ParamShape) -> Self {
        Self {
            name: name.into(),
            shape,
            ty: ty.into(),
        }
    }
}

fn yes() -> bool {
    true
}

/// A method declared on a backend type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name.
    pub name: String,
    /// Parameters in declaration order, receiver excluded.
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    /// Whether the method is visible outside its module.
    #[serde(default = "yes")]
    pub exported: bool,
    /// Whether the method returns a `Result` (the result/error pair).
    #[serde(default = "yes")]
    pub returns_result: bool,
    /// Documentation lines.
    #[serde(default)]
    pub docs: Vec<String>,
}

impl MethodDescriptor {
    /// Creates an exported method returning a `Result`, without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            exported: true,
            returns_result: true,
            docs: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>, shape: ParamShape) -> Self {
        self.params.push(ParamDescriptor::new(name, ty, shape));
        self
    }

    /// Marks the method as not exported.
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Marks the method as not returning a `Result`.
    pub fn without_result(mut self) -> Self {
        self.returns_result = false;
        self
    }

    /// Number of parameters, receiver excluded.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// A named type and the methods declared on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type name without path or generics.
    pub name: String,
    /// Methods in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Documentation lines.
    #[serde(default)]
    pub docs: Vec<String>,
}

impl TypeDescriptor {
    /// Creates an empty type descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns `true` if a method with this name is declared.
    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    /// Looks up a method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Read-only source of type declarations.
pub trait ProgramModel {
    /// Returns the declaration of `type_name`, or `None` if it is unknown.
    fn lookup(&self, type_name: &str) -> Option<&TypeDescriptor>;
}

/// In-memory program model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Declared types in discovery order.
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

impl Program {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor for `name`, declaring it if needed.
    pub fn declare(&mut self, name: &str) -> &mut TypeDescriptor {
        let index = match self.types.iter().position(|t| t.name == name) {
            Some(index) => index,
            None => {
                self.types.push(TypeDescriptor::new(name));
                self.types.len() - 1
            }
        };
        &mut self.types[index]
    }

    /// Adds a type, appending its methods and docs if it is already declared.
    pub fn insert(&mut self, ty: TypeDescriptor) {
        let existing = self.declare(&ty.name);
        existing.methods.extend(ty.methods);
        existing.docs.extend(ty.docs);
    }

    /// Merges every type of `other` into this program.
    pub fn merge(&mut self, other: Program) {
        for ty in other.types {
            self.insert(ty);
        }
    }
}

impl ProgramModel for Program {
    fn lookup(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.name == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_merges_impl_blocks() {
        let mut program = Program::new();
        program.insert(TypeDescriptor {
            name: "Controller".into(),
            methods: vec![MethodDescriptor::new("get_by_id")],
            docs: vec![],
        });
        program.insert(TypeDescriptor {
            name: "Controller".into(),
            methods: vec![MethodDescriptor::new("delete_by_id")],
            docs: vec![],
        });

        let ty = program.lookup("Controller").unwrap();
        assert_eq!(ty.methods.len(), 2);
        assert!(ty.has_method("delete_by_id"));
        assert!(program.lookup("Missing").is_none());
    }

    #[test]
    fn test_manifest_defaults() {
        let json = r#"{
            "types": [{
                "name": "Controller",
                "methods": [{
                    "name": "get_by_id",
                    "params": [{ "name": "urlId", "shape": "integer", "ty": "i64" }]
                }]
            }]
        }"#;
        let program: Program = serde_json::from_str(json).unwrap();
        let method = &program.lookup("Controller").unwrap().methods[0];

        assert!(method.exported);
        assert!(method.returns_result);
        assert_eq!(method.params[0].shape, ParamShape::Integer);
    }
}
