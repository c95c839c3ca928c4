use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use tetra_core::bytecode::{Bytecode, CodeUnit, Literal};

use crate::block::Block;
use crate::error::RuntimeError;
use crate::frame::Frame;
use crate::method::{Method, MethodKind};
use crate::universe::Universe;
use crate::value::Value;

/// The interpreter's execution state: the frame stack and the value stack.
///
/// Both depths are part of the observable contract: after a successful
/// top-level run `sp() == 1` (the program result) and `cfp() == 0`; after an
/// unrecovered error the frame stack stays at the fault depth and the error
/// value sits on top of the value stack.
pub struct Interpreter {
    /// The call-frame stack.
    pub frames: Vec<Frame>,
    /// The value stack, shared by all frames.
    pub stack: Vec<Value>,
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter {
            frames: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// The call-frame-pointer depth.
    pub fn cfp(&self) -> usize {
        self.frames.len()
    }

    /// The value-stack-pointer depth.
    pub fn sp(&self) -> usize {
        self.stack.len()
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("no active frame")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("no active frame")
    }

    /// The source file of the currently executing unit.
    pub fn current_file(&self) -> Rc<str> {
        self.frame().code.file.clone()
    }

    /// Push the base frame for a top-level unit.
    pub fn push_unit_frame(&mut self, code: Rc<CodeUnit>, self_value: Value) {
        let stack_base = self.sp();
        self.frames.push(Frame::from_unit(code, self_value, stack_base));
    }

    /// Run the pushed program to completion.
    ///
    /// On success the result is also left on the value stack. On error the
    /// error value is pushed at the fault site and the frame stack is left at
    /// the fault depth.
    pub fn run(&mut self, universe: &mut Universe) -> Result<Value, RuntimeError> {
        match self.run_until(universe, 0) {
            Ok(()) => Ok(self.stack.last().cloned().unwrap_or(Value::Nil)),
            Err(error) => {
                self.stack.push(Value::Error(Rc::new(error.clone())));
                Err(error)
            }
        }
    }

    fn run_until(&mut self, universe: &mut Universe, depth: usize) -> Result<(), RuntimeError> {
        while self.frames.len() > depth {
            self.step(universe)?;
        }
        Ok(())
    }

    fn step(&mut self, universe: &mut Universe) -> Result<(), RuntimeError> {
        let code = self.frame().code.clone();
        let pc = self.frame().pc;
        let bytecode = code.body[pc];
        self.frame_mut().pc += 1;
        self.execute(universe, &code, bytecode).map_err(|error| {
            error.with_location(&code.file, code.line_at(pc).unwrap_or_default())
        })
    }

    /// Synchronously invoke a method and return its result. Used by
    /// primitives that need a nested evaluation (`new` calling `initialize`).
    pub fn call_method(
        &mut self,
        universe: &mut Universe,
        method: &Rc<Method>,
        receiver: Value,
        args: Vec<Value>,
        block: Option<Rc<Block>>,
    ) -> Result<Value, RuntimeError> {
        let depth = self.frames.len();
        self.invoke(universe, method.clone(), receiver, args, block)?;
        if self.frames.len() > depth {
            self.run_until(universe, depth)?;
        }
        Ok(self.stack.pop().unwrap_or(Value::Nil))
    }

    /// Synchronously yield to a block and return its result. Used by
    /// block-taking primitives (`Hash#each_key`, `Array#each`, ...).
    pub fn call_block(
        &mut self,
        universe: &mut Universe,
        block: &Rc<Block>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let depth = self.frames.len();
        let stack_base = self.sp();
        self.frames.push(Frame::from_block(block, &args, stack_base));
        self.run_until(universe, depth)?;
        Ok(self.stack.pop().unwrap_or(Value::Nil))
    }

    /// Synchronously execute another compiled unit in the global environment.
    /// Used by `require`.
    pub fn call_unit(
        &mut self,
        universe: &mut Universe,
        code: Rc<CodeUnit>,
    ) -> Result<Value, RuntimeError> {
        let depth = self.frames.len();
        self.push_unit_frame(code, universe.main_object.clone());
        self.run_until(universe, depth)?;
        Ok(self.stack.pop().unwrap_or(Value::Nil))
    }

    fn execute(
        &mut self,
        universe: &mut Universe,
        code: &Rc<CodeUnit>,
        bytecode: Bytecode,
    ) -> Result<(), RuntimeError> {
        match bytecode {
            Bytecode::PushSelf => {
                let self_value = self.frame().self_value.clone();
                self.stack.push(self_value);
            }
            Bytecode::PushNil => self.stack.push(Value::Nil),
            Bytecode::PushBoolean(value) => self.stack.push(Value::Boolean(value)),
            Bytecode::PushConstant(idx) => {
                let value = match &code.literals[idx as usize] {
                    Literal::Integer(value) => Value::Integer(*value),
                    Literal::String(value) => Value::String(value.clone()),
                    Literal::Code(_) => unreachable!("code literals are not pushed directly"),
                };
                self.stack.push(value);
            }
            Bytecode::PushLocal(up_idx, idx) => {
                let value = self
                    .frame()
                    .scope
                    .borrow()
                    .lookup(up_idx as usize, idx as usize);
                self.stack.push(value);
            }
            Bytecode::SetLocal(up_idx, idx) => {
                let value = self.stack.last().cloned().unwrap_or(Value::Nil);
                self.frame()
                    .scope
                    .borrow_mut()
                    .assign(up_idx as usize, idx as usize, value);
            }
            Bytecode::PushInstVar(idx) => {
                let name = self.string_literal(code, idx);
                let value = self.frame().self_value.lookup_ivar(&name);
                self.stack.push(value);
            }
            Bytecode::SetInstVar(idx) => {
                let name = self.string_literal(code, idx);
                let value = self.stack.last().cloned().unwrap_or(Value::Nil);
                self.frame().self_value.assign_ivar(&name, value);
            }
            Bytecode::GetConstant(idx) => {
                let name = self.string_literal(code, idx);
                match universe.lookup_constant_lexical(&name, &code.lexical_scopes) {
                    Some(value) => self.stack.push(value),
                    None => return Err(RuntimeError::uninitialized_constant(&name)),
                }
            }
            Bytecode::GetScopedConstant(idx) => {
                let name = self.string_literal(code, idx);
                let scope = self.stack.pop().expect("value stack underflow");
                let class = scope
                    .as_class()
                    .ok_or_else(|| RuntimeError::wrong_argument_type("Class", &scope.class_name()))?;
                let value = class.borrow().lookup_constant(&name);
                match value {
                    Some(value) => self.stack.push(value),
                    None => {
                        let qualified = format!("{}::{}", class.borrow().name, name);
                        return Err(RuntimeError::uninitialized_constant(&qualified));
                    }
                }
            }
            Bytecode::SetConstant(idx) => {
                let name = self.string_literal(code, idx);
                let value = self.stack.last().cloned().unwrap_or(Value::Nil);
                let namespace = match &self.frame().self_value {
                    Value::Class(class) => class.clone(),
                    _ => universe.object_class(),
                };
                namespace.borrow_mut().constants.insert(name.to_string(), value);
            }
            Bytecode::NewArray(count) => {
                let split_at = self.stack.len() - count as usize;
                let elements = self.stack.split_off(split_at);
                self.stack.push(Value::Array(Rc::new(RefCell::new(elements))));
            }
            Bytecode::NewHash(count) => {
                let split_at = self.stack.len() - 2 * count as usize;
                let flat = self.stack.split_off(split_at);
                let mut entries = IndexMap::new();
                for pair in flat.chunks(2) {
                    let Value::String(key) = &pair[0] else {
                        unreachable!("hash literal keys are compiled as strings")
                    };
                    entries.insert(key.to_string(), pair[1].clone());
                }
                self.stack.push(Value::Hash(Rc::new(RefCell::new(entries))));
            }
            Bytecode::NewRange => {
                let end = self.stack.pop().expect("value stack underflow");
                let start = self.stack.pop().expect("value stack underflow");
                let start = start
                    .as_integer()
                    .ok_or_else(|| RuntimeError::wrong_argument_type("Integer", &start.class_name()))?;
                let end = end
                    .as_integer()
                    .ok_or_else(|| RuntimeError::wrong_argument_type("Integer", &end.class_name()))?;
                self.stack.push(Value::Range(start, end));
            }
            Bytecode::Dup => {
                let value = self.stack.last().cloned().expect("value stack underflow");
                self.stack.push(value);
            }
            Bytecode::Pop => {
                self.stack.pop();
            }
            Bytecode::Jump(target) => self.frame_mut().pc = target as usize,
            Bytecode::JumpOnFalsePop(target) => {
                let condition = self.stack.pop().expect("value stack underflow");
                if !condition.is_truthy() {
                    self.frame_mut().pc = target as usize;
                }
            }
            Bytecode::JumpOnTruePop(target) => {
                let condition = self.stack.pop().expect("value stack underflow");
                if condition.is_truthy() {
                    self.frame_mut().pc = target as usize;
                }
            }
            Bytecode::Send(sig_idx, nargs, block_idx) => {
                let name = self.string_literal(code, sig_idx);
                let split_at = self.stack.len() - nargs as usize;
                let args = self.stack.split_off(split_at);
                let receiver = self.stack.pop().expect("value stack underflow on send");
                let block = block_idx.map(|idx| {
                    let Literal::Code(block_code) = &code.literals[idx as usize] else {
                        unreachable!("send block operand must be a code literal")
                    };
                    let frame = self.frame();
                    Rc::new(Block {
                        code: block_code.clone(),
                        scope: frame.scope.clone(),
                        self_value: frame.self_value.clone(),
                        outer_block: frame.block.clone(),
                    })
                });
                self.do_send(universe, receiver, &name, args, block)?;
            }
            Bytecode::InvokeBlock(nargs) => {
                let split_at = self.stack.len() - nargs as usize;
                let args = self.stack.split_off(split_at);
                let block = self
                    .frame()
                    .block
                    .clone()
                    .ok_or_else(RuntimeError::yield_without_block)?;
                let stack_base = self.sp();
                self.frames.push(Frame::from_block(&block, &args, stack_base));
            }
            Bytecode::DefMethod(name_idx, body_idx) => {
                let name = self.string_literal(code, name_idx);
                let method_code = self.code_literal(code, body_idx);
                let target = match &self.frame().self_value {
                    Value::Class(class) => class.clone(),
                    other => universe.class_of(other),
                };
                let method = Rc::new(Method {
                    kind: MethodKind::Defined(method_code),
                    holder: Rc::downgrade(&target),
                    signature: name.to_string(),
                });
                target.borrow_mut().add_method(name.to_string(), method);
                self.stack.push(Value::Nil);
            }
            Bytecode::DefSelfMethod(name_idx, body_idx) => {
                let name = self.string_literal(code, name_idx);
                let method_code = self.code_literal(code, body_idx);
                let owner = match &self.frame().self_value {
                    Value::Class(class) => class.clone(),
                    other => universe.class_of(other),
                };
                let singleton = owner.borrow().singleton_class();
                let method = Rc::new(Method {
                    kind: MethodKind::Defined(method_code),
                    holder: Rc::downgrade(&singleton),
                    signature: name.to_string(),
                });
                singleton.borrow_mut().add_method(name.to_string(), method);
                self.stack.push(Value::Nil);
            }
            Bytecode::DefClass {
                name: name_idx,
                body: body_idx,
                is_module,
                has_superclass,
            } => {
                let name = self.string_literal(code, name_idx);
                let body_code = self.code_literal(code, body_idx);
                let super_class = if has_superclass {
                    // Peek before popping: a module superclass faults with the
                    // operands still on the stack.
                    let top = self.stack.last().cloned().expect("value stack underflow");
                    let class = top.as_class().ok_or_else(|| {
                        RuntimeError::wrong_argument_type("Class", &top.class_name())
                    })?;
                    if class.borrow().is_module {
                        let module_name = class.borrow().name.clone();
                        return Err(RuntimeError::module_inheritance(&module_name));
                    }
                    self.stack.pop();
                    Some(class)
                } else {
                    None
                };
                let self_value = self.stack.pop().expect("value stack underflow");
                let namespace = match &self_value {
                    Value::Class(class) => class.clone(),
                    _ => universe.object_class(),
                };
                let class = universe.define_class(&namespace, &name, super_class, is_module);
                let stack_base = self.sp();
                self.frames
                    .push(Frame::from_unit(body_code, Value::Class(class), stack_base));
            }
            Bytecode::Return => {
                let value = self.stack.pop().unwrap_or(Value::Nil);
                let frame = self.frames.pop().expect("no active frame");
                self.stack.truncate(frame.stack_base);
                self.stack.push(value);
            }
        }
        Ok(())
    }

    fn string_literal(&self, code: &CodeUnit, idx: u16) -> Rc<str> {
        match &code.literals[idx as usize] {
            Literal::String(value) => value.clone(),
            other => unreachable!("expected a string literal, found {other:?}"),
        }
    }

    fn code_literal(&self, code: &CodeUnit, idx: u16) -> Rc<CodeUnit> {
        match &code.literals[idx as usize] {
            Literal::Code(value) => value.clone(),
            other => unreachable!("expected a code literal, found {other:?}"),
        }
    }

    /// Resolve and dispatch a message, falling back to `method_missing`.
    fn do_send(
        &mut self,
        universe: &mut Universe,
        receiver: Value,
        name: &str,
        args: Vec<Value>,
        block: Option<Rc<Block>>,
    ) -> Result<(), RuntimeError> {
        let dispatch_class = universe.dispatch_class(&receiver);
        let method = dispatch_class.borrow().lookup_method(name);
        if let Some(method) = method {
            return self.invoke(universe, method, receiver, args, block);
        }
        let fallback = dispatch_class.borrow().lookup_method("method_missing");
        match fallback {
            Some(method) => {
                let mut fallback_args = Vec::with_capacity(args.len() + 1);
                fallback_args.push(Value::new_string(name));
                fallback_args.extend(args);
                self.invoke(universe, method, receiver, fallback_args, block)
            }
            None => Err(RuntimeError::undefined_method(name, &receiver.to_s())),
        }
    }

    /// Invoke a resolved method: push a frame for defined methods, call
    /// straight through for primitives and generated accessors.
    fn invoke(
        &mut self,
        universe: &mut Universe,
        method: Rc<Method>,
        receiver: Value,
        args: Vec<Value>,
        block: Option<Rc<Block>>,
    ) -> Result<(), RuntimeError> {
        match method.kind() {
            MethodKind::Defined(method_code) => {
                if method_code.params.len() != args.len() {
                    return Err(RuntimeError::wrong_number_of_arguments(
                        method_code.params.len(),
                        args.len(),
                    ));
                }
                let stack_base = self.sp();
                self.frames.push(Frame::from_method(
                    method_code.clone(),
                    receiver,
                    &args,
                    block,
                    stack_base,
                ));
            }
            MethodKind::Primitive(func) => {
                let value = func(self, universe, receiver, &args, block.as_ref())?;
                self.stack.push(value);
            }
            MethodKind::AttrReader(ivar_name) => {
                if !args.is_empty() {
                    return Err(RuntimeError::wrong_number_of_arguments(0, args.len()));
                }
                self.stack.push(receiver.lookup_ivar(ivar_name));
            }
            MethodKind::AttrWriter(ivar_name) => {
                if args.len() != 1 {
                    return Err(RuntimeError::wrong_number_of_arguments(1, args.len()));
                }
                receiver.assign_ivar(ivar_name, args[0].clone());
                self.stack.push(args[0].clone());
            }
        }
        Ok(())
    }
}
