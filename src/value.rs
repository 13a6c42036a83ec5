use std::collections::HashMap;
use std::rc::Rc;

use crate::ast;
use crate::heap::{Heap, HeapId};

/// Name-to-value environment threaded mutably through execution. A method
/// invocation gets a fresh closure holding `self` and its arguments.
pub type Closure = HashMap<String, Value>;

/// A runtime value. Heap-resident variants carry an arena handle, so values
/// are cheap to copy and bindings share the referent.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    None,
    Number(i64),
    Bool(bool),
    Str(HeapId),
    Class(HeapId),
    Instance(HeapId),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Type {
    None,
    Number,
    Bool,
    Str,
    Class,
    Instance,
}

pub fn type_of(value: &Value) -> Type {
    match value {
        Value::None => Type::None,
        Value::Number(_) => Type::Number,
        Value::Bool(_) => Type::Bool,
        Value::Str(_) => Type::Str,
        Value::Class(_) => Type::Class,
        Value::Instance(_) => Type::Instance,
    }
}

/// Immutable after construction; the parent pointer forms an acyclic chain.
pub struct Class {
    pub name: String,
    pub methods: Vec<Method>,
    pub parent: Option<HeapId>,
}

/// `formal_params` excludes the receiver; `self` is bound separately at
/// call time.
pub struct Method {
    pub name: String,
    pub formal_params: Vec<String>,
    pub body: Rc<Vec<ast::Stmt>>,
}

pub struct Instance {
    pub class_id: HeapId,
    pub fields: HashMap<String, Value>,
}

impl Class {
    /// First method with a matching name, searching declaration order here
    /// and then the parent chain. Arity is not considered.
    pub fn find_method<'a>(&'a self, name: &str, heap: &'a Heap) -> Option<&'a Method> {
        match self.methods.iter().find(|m| m.name == name) {
            Some(method) => Some(method),
            None => self
                .parent
                .and_then(|parent| heap.get_class(parent).find_method(name, heap)),
        }
    }

    /// True when the resolved method exists and takes exactly `arity`
    /// arguments. A nearer method with the wrong arity shadows a farther
    /// one with the right arity.
    pub fn has_method(&self, name: &str, arity: usize, heap: &Heap) -> bool {
        self.find_method(name, heap)
            .map_or(false, |m| m.formal_params.len() == arity)
    }
}
