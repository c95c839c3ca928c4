use std::cell::RefCell;
use std::rc::Rc;

use tetra_core::bytecode::CodeUnit;

use crate::block::Block;
use crate::value::Value;
use crate::TetraRef;

/// A local-variable scope.
///
/// Parameters occupy the first slots. Block scopes chain to the scope of
/// their defining frame, which is how captured variables stay shared.
pub struct Scope {
    pub locals: Vec<Value>,
    pub parent: Option<TetraRef<Scope>>,
}

impl Scope {
    pub fn new(nbr_locals: usize, parent: Option<TetraRef<Scope>>) -> TetraRef<Scope> {
        Rc::new(RefCell::new(Scope {
            locals: vec![Value::Nil; nbr_locals],
            parent,
        }))
    }

    /// Search for a local binding, `up_idx` scopes up the chain.
    pub fn lookup(&self, up_idx: usize, idx: usize) -> Value {
        if up_idx == 0 {
            return self.locals.get(idx).cloned().unwrap_or(Value::Nil);
        }
        self.parent
            .as_ref()
            .expect("scope chain shorter than the compiler assumed")
            .borrow()
            .lookup(up_idx - 1, idx)
    }

    /// Assign a value to a local binding, `up_idx` scopes up the chain.
    pub fn assign(&mut self, up_idx: usize, idx: usize, value: Value) {
        if up_idx == 0 {
            let slot = self
                .locals
                .get_mut(idx)
                .expect("local slot out of range for this scope");
            *slot = value;
            return;
        }
        self.parent
            .as_ref()
            .expect("scope chain shorter than the compiler assumed")
            .borrow_mut()
            .assign(up_idx - 1, idx, value);
    }
}

/// Represents a call frame on the frame stack.
pub struct Frame {
    /// The unit being executed.
    pub code: Rc<CodeUnit>,
    /// The instruction pointer into `code`.
    pub pc: usize,
    pub self_value: Value,
    pub scope: TetraRef<Scope>,
    /// The block supplied by the caller, if any.
    pub block: Option<Rc<Block>>,
    /// Value-stack depth at frame entry; the stack is truncated back to this
    /// depth on return.
    pub stack_base: usize,
}

impl Frame {
    /// A frame for a top-level unit (a program or a required file) or a class
    /// body.
    pub fn from_unit(code: Rc<CodeUnit>, self_value: Value, stack_base: usize) -> Frame {
        let scope = Scope::new(code.nbr_locals, None);
        Frame {
            code,
            pc: 0,
            self_value,
            scope,
            block: None,
            stack_base,
        }
    }

    /// A frame for a method invocation. Arity is checked by the caller.
    pub fn from_method(
        code: Rc<CodeUnit>,
        self_value: Value,
        args: &[Value],
        block: Option<Rc<Block>>,
        stack_base: usize,
    ) -> Frame {
        let scope = Scope::new(code.nbr_locals, None);
        bind_params(&scope, &code, args);
        Frame {
            code,
            pc: 0,
            self_value,
            scope,
            block,
            stack_base,
        }
    }

    /// A frame for yielding to a block. Parameters bind leniently: missing
    /// arguments read as NIL, extra arguments are dropped.
    pub fn from_block(block: &Rc<Block>, args: &[Value], stack_base: usize) -> Frame {
        let code = block.code.clone();
        let scope = Scope::new(code.nbr_locals, Some(block.scope.clone()));
        bind_params(&scope, &code, args);
        Frame {
            code,
            pc: 0,
            self_value: block.self_value.clone(),
            scope,
            block: block.outer_block.clone(),
            stack_base,
        }
    }
}

fn bind_params(scope: &TetraRef<Scope>, code: &CodeUnit, args: &[Value]) {
    let mut scope = scope.borrow_mut();
    for (idx, _) in code.params.iter().enumerate() {
        if let Some(value) = args.get(idx) {
            scope.locals[idx] = value.clone();
        }
    }
}
