use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, Literal, LogicalOp, Stmt, UnaryOp};
use crate::heap::{Heap, HeapId};
use crate::value::{type_of, Class, Closure, Instance, Method, Value};

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum InterpreterError {
    Runtime(String),
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InterpreterError::Runtime(err) => write!(f, "mython runtime error: {}", err),
        }
    }
}

fn comparison_error(what: &str) -> InterpreterError {
    InterpreterError::Runtime(format!("Cannot compare values for {}.", what))
}

fn expect_bool(value: Value, method: &str) -> Result<bool, InterpreterError> {
    match value {
        Value::Bool(b) => Ok(b),
        _ => Err(InterpreterError::Runtime(format!(
            "Method {} must return True or False.",
            method
        ))),
    }
}

/// Tree-walk executor and owner of the runtime services: the object heap
/// and the output sink. Statements run against a caller-provided closure,
/// so top-level state can outlive a single program (the interactive prompt
/// relies on this).
pub struct Interpreter<'a> {
    pub heap: Heap,
    retval: Option<Value>,
    sink: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(sink: &'a mut dyn Write) -> Interpreter<'a> {
        Interpreter {
            heap: Heap::new(),
            retval: None,
            sink,
        }
    }

    pub fn interpret(
        &mut self,
        stmts: &[Stmt],
        closure: &mut Closure,
    ) -> Result<(), InterpreterError> {
        for stmt in stmts {
            self.execute(stmt, closure)?;
            if self.retval.is_some() {
                break;
            }
        }
        self.retval = None;
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, closure: &mut Closure) -> Result<(), InterpreterError> {
        if self.retval.is_some() {
            return Ok(());
        }

        match stmt {
            Stmt::Expr(expr) => {
                self.interpret_expr(expr, closure)?;
                Ok(())
            }
            Stmt::Assign(name, expr) => {
                let value = self.interpret_expr(expr, closure)?;
                closure.insert(name.clone(), value);
                Ok(())
            }
            Stmt::Set(object, field, expr) => {
                let target = self.interpret_expr(object, closure)?;
                let value = self.interpret_expr(expr, closure)?;
                match target {
                    Value::Instance(id) => {
                        self.heap
                            .get_instance_mut(id)
                            .fields
                            .insert(field.clone(), value);
                        Ok(())
                    }
                    Value::None => Err(InterpreterError::Runtime(
                        "Cannot assign a field of None.".to_string(),
                    )),
                    _ => Err(InterpreterError::Runtime(
                        "Only instances have fields.".to_string(),
                    )),
                }
            }
            Stmt::Print(args) => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    let value = self.interpret_expr(arg, closure)?;
                    parts.push(self.render(&value)?);
                }
                writeln!(self.sink, "{}", parts.join(" ")).map_err(|err| {
                    InterpreterError::Runtime(format!("Cannot write output: {}", err))
                })?;
                Ok(())
            }
            Stmt::If(cond, then_branch, else_branch) => {
                let value = self.interpret_expr(cond, closure)?;
                if self.is_true(&value) {
                    self.execute_block(then_branch, closure)
                } else {
                    self.execute_block(else_branch, closure)
                }
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.interpret_expr(expr, closure)?,
                    None => Value::None,
                };
                self.retval = Some(value);
                Ok(())
            }
            Stmt::ClassDecl(decl) => {
                let parent = match &decl.superclass {
                    Some(parent_name) => match closure.get(parent_name) {
                        Some(Value::Class(id)) => Some(*id),
                        Some(_) => {
                            return Err(InterpreterError::Runtime(format!(
                                "'{}' is not a class.",
                                parent_name
                            )))
                        }
                        None => {
                            return Err(InterpreterError::Runtime(format!(
                                "Undefined base class '{}'.",
                                parent_name
                            )))
                        }
                    },
                    None => None,
                };
                let methods = decl
                    .methods
                    .iter()
                    .map(|m| Method {
                        name: m.name.clone(),
                        formal_params: m.params.clone(),
                        body: Rc::new(m.body.clone()),
                    })
                    .collect();
                let class_id = self.heap.manage_class(Class {
                    name: decl.name.clone(),
                    methods,
                    parent,
                });
                closure.insert(decl.name.clone(), Value::Class(class_id));
                Ok(())
            }
        }
    }

    fn execute_block(
        &mut self,
        stmts: &[Stmt],
        closure: &mut Closure,
    ) -> Result<(), InterpreterError> {
        for stmt in stmts {
            self.execute(stmt, closure)?;
            if self.retval.is_some() {
                break;
            }
        }
        Ok(())
    }

    fn interpret_expr(
        &mut self,
        expr: &Expr,
        closure: &mut Closure,
    ) -> Result<Value, InterpreterError> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::Str(self.heap.manage_str(s.clone())),
                Literal::True => Value::Bool(true),
                Literal::False => Value::Bool(false),
                Literal::None => Value::None,
            }),
            Expr::Variable(name) => match closure.get(name) {
                Some(value) => Ok(*value),
                None => Err(InterpreterError::Runtime(format!(
                    "Undefined variable '{}'.",
                    name
                ))),
            },
            Expr::Get(object, field) => {
                let value = self.interpret_expr(object, closure)?;
                match value {
                    Value::Instance(id) => {
                        match self.heap.get_instance(id).fields.get(field) {
                            Some(value) => Ok(*value),
                            None => Err(InterpreterError::Runtime(format!(
                                "Undefined property '{}'.",
                                field
                            ))),
                        }
                    }
                    Value::None => Err(InterpreterError::Runtime(
                        "Cannot access a field of None.".to_string(),
                    )),
                    _ => Err(InterpreterError::Runtime(
                        "Only instances have fields.".to_string(),
                    )),
                }
            }
            Expr::MethodCall(object, name, args) => {
                let receiver = self.interpret_expr(object, closure)?;
                match receiver {
                    Value::Instance(id) => {
                        let mut actual = Vec::with_capacity(args.len());
                        for arg in args {
                            actual.push(self.interpret_expr(arg, closure)?);
                        }
                        self.call_method(id, name, &actual)
                    }
                    Value::None => Err(InterpreterError::Runtime(
                        "Cannot call a method of None.".to_string(),
                    )),
                    _ => Err(InterpreterError::Runtime(
                        "Only instances have methods.".to_string(),
                    )),
                }
            }
            Expr::Call(callee, args) => {
                let value = self.interpret_expr(callee, closure)?;
                match value {
                    Value::Class(class_id) => self.instantiate(class_id, args, closure),
                    _ => Err(InterpreterError::Runtime(format!(
                        "Value of type {:?} is not callable.",
                        type_of(&value)
                    ))),
                }
            }
            Expr::Unary(UnaryOp::Minus, operand) => {
                let value = self.interpret_expr(operand, closure)?;
                match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    _ => Err(InterpreterError::Runtime(format!(
                        "Cannot negate a value of type {:?}.",
                        type_of(&value)
                    ))),
                }
            }
            Expr::Unary(UnaryOp::Not, operand) => {
                let value = self.interpret_expr(operand, closure)?;
                Ok(Value::Bool(!self.is_true(&value)))
            }
            Expr::Binary(lhs, op, rhs) => {
                let left = self.interpret_expr(lhs, closure)?;
                let right = self.interpret_expr(rhs, closure)?;
                self.apply_binary(left, *op, right)
            }
            Expr::Logical(lhs, LogicalOp::Or, rhs) => {
                let left = self.interpret_expr(lhs, closure)?;
                if self.is_true(&left) {
                    return Ok(Value::Bool(true));
                }
                let right = self.interpret_expr(rhs, closure)?;
                Ok(Value::Bool(self.is_true(&right)))
            }
            Expr::Logical(lhs, LogicalOp::And, rhs) => {
                let left = self.interpret_expr(lhs, closure)?;
                if !self.is_true(&left) {
                    return Ok(Value::Bool(false));
                }
                let right = self.interpret_expr(rhs, closure)?;
                Ok(Value::Bool(self.is_true(&right)))
            }
        }
    }

    fn apply_binary(
        &mut self,
        lhs: Value,
        op: BinaryOp,
        rhs: Value,
    ) -> Result<Value, InterpreterError> {
        match op {
            BinaryOp::Plus => self.add(lhs, rhs),
            BinaryOp::Minus => {
                let (a, b) = self.expect_numbers(lhs, rhs, op)?;
                Ok(Value::Number(a - b))
            }
            BinaryOp::Star => {
                let (a, b) = self.expect_numbers(lhs, rhs, op)?;
                Ok(Value::Number(a * b))
            }
            BinaryOp::Slash => {
                let (a, b) = self.expect_numbers(lhs, rhs, op)?;
                if b == 0 {
                    return Err(InterpreterError::Runtime("Division by zero.".to_string()));
                }
                Ok(Value::Number(a / b))
            }
            BinaryOp::EqualEqual => self.equal(lhs, rhs).map(Value::Bool),
            BinaryOp::NotEqual => self.not_equal(lhs, rhs).map(Value::Bool),
            BinaryOp::Less => self.less(lhs, rhs).map(Value::Bool),
            BinaryOp::LessEqual => self.less_or_equal(lhs, rhs).map(Value::Bool),
            BinaryOp::Greater => self.greater(lhs, rhs).map(Value::Bool),
            BinaryOp::GreaterEqual => self.greater_or_equal(lhs, rhs).map(Value::Bool),
        }
    }

    fn add(&mut self, lhs: Value, rhs: Value) -> Result<Value, InterpreterError> {
        match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => {
                let text = format!("{}{}", self.heap.get_str(a), self.heap.get_str(b));
                Ok(Value::Str(self.heap.manage_str(text)))
            }
            (Value::Instance(id), _) => {
                let class_id = self.heap.get_instance(id).class_id;
                if self
                    .heap
                    .get_class(class_id)
                    .has_method("__add__", 1, &self.heap)
                {
                    self.call_method(id, "__add__", &[rhs])
                } else {
                    Err(InterpreterError::Runtime(format!(
                        "Cannot add values of type {:?} and {:?}.",
                        type_of(&lhs),
                        type_of(&rhs)
                    )))
                }
            }
            _ => Err(InterpreterError::Runtime(format!(
                "Cannot add values of type {:?} and {:?}.",
                type_of(&lhs),
                type_of(&rhs)
            ))),
        }
    }

    fn expect_numbers(
        &self,
        lhs: Value,
        rhs: Value,
        op: BinaryOp,
    ) -> Result<(i64, i64), InterpreterError> {
        match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok((a, b)),
            _ => Err(InterpreterError::Runtime(format!(
                "Expected numbers in {:?} expression, found {:?} and {:?}.",
                op,
                type_of(&lhs),
                type_of(&rhs)
            ))),
        }
    }

    /// Creates an instance of the class. Constructor arguments are only
    /// evaluated when the class chain resolves `__init__` at matching
    /// arity; otherwise the bare instance is returned.
    fn instantiate(
        &mut self,
        class_id: HeapId,
        args: &[Expr],
        closure: &mut Closure,
    ) -> Result<Value, InterpreterError> {
        let instance_id = self.heap.manage_instance(Instance {
            class_id,
            fields: HashMap::new(),
        });
        if self
            .heap
            .get_class(class_id)
            .has_method("__init__", args.len(), &self.heap)
        {
            let mut actual = Vec::with_capacity(args.len());
            for arg in args {
                actual.push(self.interpret_expr(arg, closure)?);
            }
            self.call_method(instance_id, "__init__", &actual)?;
        }
        Ok(Value::Instance(instance_id))
    }

    /// Invokes a method on an instance: a fresh closure binds `self` and
    /// the positional arguments, the stored body runs, and the result is
    /// the returned value or None when the body never returns.
    pub fn call_method(
        &mut self,
        instance_id: HeapId,
        method_name: &str,
        args: &[Value],
    ) -> Result<Value, InterpreterError> {
        let class_id = self.heap.get_instance(instance_id).class_id;
        let resolved = self
            .heap
            .get_class(class_id)
            .find_method(method_name, &self.heap)
            .filter(|m| m.formal_params.len() == args.len())
            .map(|m| (m.formal_params.clone(), Rc::clone(&m.body)));
        let (params, body) = match resolved {
            Some(found) => found,
            None => {
                return Err(InterpreterError::Runtime(format!(
                    "Cannot call {}.",
                    method_name
                )))
            }
        };
        let mut closure = Closure::new();
        closure.insert("self".to_string(), Value::Instance(instance_id));
        for (param, arg) in params.iter().zip(args) {
            closure.insert(param.clone(), *arg);
        }
        self.run_body(&body, closure)
    }

    // The frame's return value must not leak into or out of the enclosing
    // frame, so the pending retval is stashed around the body.
    fn run_body(
        &mut self,
        body: &[Stmt],
        mut closure: Closure,
    ) -> Result<Value, InterpreterError> {
        let saved = self.retval.take();
        let outcome = self.execute_block(body, &mut closure);
        let returned = self.retval.take();
        self.retval = saved;
        outcome?;
        Ok(returned.unwrap_or(Value::None))
    }

    fn class_method_body(&self, class_id: HeapId, name: &str) -> Option<Rc<Vec<Stmt>>> {
        self.heap
            .get_class(class_id)
            .find_method(name, &self.heap)
            .map(|m| Rc::clone(&m.body))
    }

    pub fn is_true(&self, value: &Value) -> bool {
        match value {
            Value::Number(n) => *n != 0,
            Value::Str(id) => !self.heap.get_str(*id).is_empty(),
            Value::Bool(b) => *b,
            _ => false,
        }
    }

    pub fn equal(&mut self, lhs: Value, rhs: Value) -> Result<bool, InterpreterError> {
        match (lhs, rhs) {
            (Value::None, Value::None) => Ok(true),
            (Value::None, _) => Err(comparison_error("equality")),
            (_, Value::None) => Err(InterpreterError::Runtime(
                "Cannot compare values for equality with None.".to_string(),
            )),
            (Value::Instance(id), _) => {
                let class_id = self.heap.get_instance(id).class_id;
                if self
                    .heap
                    .get_class(class_id)
                    .has_method("__eq__", 1, &self.heap)
                {
                    let result = self.call_method(id, "__eq__", &[rhs])?;
                    expect_bool(result, "__eq__")
                } else {
                    Err(comparison_error("equality"))
                }
            }
            // Comparing a class object consults its method table directly;
            // the body runs in a closure binding the method name to the
            // right operand, with no self.
            (Value::Class(id), _) => match self.class_method_body(id, "__eq__") {
                Some(body) => {
                    let mut fields = Closure::new();
                    fields.insert("__eq__".to_string(), rhs);
                    let result = self.run_body(&body, fields)?;
                    expect_bool(result, "__eq__")
                }
                None => Err(comparison_error("equality")),
            },
            (Value::Str(a), Value::Str(b)) => Ok(self.heap.get_str(a) == self.heap.get_str(b)),
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            _ => Err(comparison_error("equality")),
        }
    }

    pub fn less(&mut self, lhs: Value, rhs: Value) -> Result<bool, InterpreterError> {
        match (lhs, rhs) {
            (Value::None, _) | (_, Value::None) => Err(comparison_error("less")),
            (Value::Instance(id), _) => {
                let class_id = self.heap.get_instance(id).class_id;
                if self
                    .heap
                    .get_class(class_id)
                    .has_method("__lt__", 1, &self.heap)
                {
                    let result = self.call_method(id, "__lt__", &[rhs])?;
                    expect_bool(result, "__lt__")
                } else {
                    Err(comparison_error("less"))
                }
            }
            (Value::Class(id), _) => match self.class_method_body(id, "__lt__") {
                Some(body) => {
                    let mut fields = Closure::new();
                    fields.insert("__lt__".to_string(), rhs);
                    let result = self.run_body(&body, fields)?;
                    expect_bool(result, "__lt__")
                }
                None => Err(comparison_error("less")),
            },
            (Value::Str(a), Value::Str(b)) => Ok(self.heap.get_str(a) < self.heap.get_str(b)),
            (Value::Number(a), Value::Number(b)) => Ok(a < b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a < b),
            _ => Err(comparison_error("less")),
        }
    }

    pub fn not_equal(&mut self, lhs: Value, rhs: Value) -> Result<bool, InterpreterError> {
        match self.equal(lhs, rhs) {
            Ok(result) => Ok(!result),
            Err(_) => Err(comparison_error("not-equal")),
        }
    }

    // `greater` never consults `equal` once `less` holds, which matters
    // for classes that define __lt__ but not __eq__.
    pub fn greater(&mut self, lhs: Value, rhs: Value) -> Result<bool, InterpreterError> {
        if self
            .less(lhs, rhs)
            .map_err(|_| comparison_error("greater"))?
        {
            return Ok(false);
        }
        let equal = self
            .equal(lhs, rhs)
            .map_err(|_| comparison_error("greater"))?;
        Ok(!equal)
    }

    pub fn less_or_equal(&mut self, lhs: Value, rhs: Value) -> Result<bool, InterpreterError> {
        match self.greater(lhs, rhs) {
            Ok(result) => Ok(!result),
            Err(_) => Err(comparison_error("less-or-equal")),
        }
    }

    pub fn greater_or_equal(&mut self, lhs: Value, rhs: Value) -> Result<bool, InterpreterError> {
        match self.less(lhs, rhs) {
            Ok(result) => Ok(!result),
            Err(_) => Err(comparison_error("greater-or-equal")),
        }
    }

    /// Textual form of a value, as the print statement shows it. Instances
    /// defer to a zero-argument `__str__` when their class chain defines
    /// one, and otherwise render a stable identity marker.
    pub fn render(&mut self, value: &Value) -> Result<String, InterpreterError> {
        Ok(match value {
            Value::None => "None".to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Str(id) => self.heap.get_str(*id).to_string(),
            Value::Class(id) => format!("Class {}", self.heap.get_class(*id).name),
            Value::Instance(id) => {
                let class_id = self.heap.get_instance(*id).class_id;
                if self
                    .heap
                    .get_class(class_id)
                    .has_method("__str__", 0, &self.heap)
                {
                    let result = self.call_method(*id, "__str__", &[])?;
                    self.render(&result)?
                } else {
                    format!("<{} instance #{}>", self.heap.get_class(class_id).name, id)
                }
            }
        })
    }
}
