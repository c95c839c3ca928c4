use std::fmt;
use std::rc::Rc;

/// A single instruction of the Tetra virtual machine.
///
/// Jump operands are absolute instruction indices within the enclosing
/// [`CodeUnit`]. Literal operands index into the unit's constant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bytecode {
    /// Push the current `self`.
    PushSelf,
    /// Push NIL.
    PushNil,
    /// Push TRUE or FALSE.
    PushBoolean(bool),
    /// Push a literal from the constant pool.
    PushConstant(u16),
    /// Push a local binding, resolved as (scope hops upward, slot index).
    PushLocal(u8, u8),
    /// Assign the value on top of the stack to a local binding (keeps it on the stack).
    SetLocal(u8, u8),
    /// Push the instance variable named by the string literal at the given index.
    PushInstVar(u16),
    /// Assign the top of the stack to an instance variable (keeps it on the stack).
    SetInstVar(u16),
    /// Resolve a constant through the lexical scope chain.
    GetConstant(u16),
    /// Pop a namespace value and resolve a constant strictly within it (`A::B`).
    GetScopedConstant(u16),
    /// Assign the top of the stack to a constant in the current namespace (keeps it).
    SetConstant(u16),
    /// Pop the given number of values and push them as a new array.
    NewArray(u16),
    /// Pop `2 * n` values (alternating key, value) and push them as a new hash.
    NewHash(u16),
    /// Pop two integers (start, end) and push an inclusive range.
    NewRange,
    /// Duplicate the value on top of the stack.
    Dup,
    /// Pop the value on top of the stack.
    Pop,
    /// Jump to an absolute instruction index.
    Jump(u16),
    /// Pop the top of the stack and jump if it is falsy (NIL or FALSE).
    JumpOnFalsePop(u16),
    /// Pop the top of the stack and jump if it is truthy.
    JumpOnTruePop(u16),
    /// Send a message: (signature literal, argument count, optional block literal).
    ///
    /// Expects the receiver followed by the arguments on the stack.
    Send(u16, u8, Option<u16>),
    /// Yield the given number of arguments to the current method's block.
    InvokeBlock(u8),
    /// Define an instance method: (name literal, code literal).
    DefMethod(u16, u16),
    /// Define a singleton (class-side) method: (name literal, code literal).
    DefSelfMethod(u16, u16),
    /// Define or reopen a class or module and execute its body.
    ///
    /// Expects `self` on the stack, topped by the superclass when
    /// `has_superclass` is set.
    DefClass {
        name: u16,
        body: u16,
        is_module: bool,
        has_superclass: bool,
    },
    /// Leave the current frame, producing the value on top of the stack.
    Return,
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bytecode::PushSelf => write!(f, "PUSH_SELF"),
            Bytecode::PushNil => write!(f, "PUSH_NIL"),
            Bytecode::PushBoolean(value) => write!(f, "PUSH_BOOLEAN {value}"),
            Bytecode::PushConstant(idx) => write!(f, "PUSH_CONSTANT {idx}"),
            Bytecode::PushLocal(up_idx, idx) => write!(f, "PUSH_LOCAL {up_idx} {idx}"),
            Bytecode::SetLocal(up_idx, idx) => write!(f, "SET_LOCAL {up_idx} {idx}"),
            Bytecode::PushInstVar(idx) => write!(f, "PUSH_INST_VAR {idx}"),
            Bytecode::SetInstVar(idx) => write!(f, "SET_INST_VAR {idx}"),
            Bytecode::GetConstant(idx) => write!(f, "GET_CONSTANT {idx}"),
            Bytecode::GetScopedConstant(idx) => write!(f, "GET_SCOPED_CONSTANT {idx}"),
            Bytecode::SetConstant(idx) => write!(f, "SET_CONSTANT {idx}"),
            Bytecode::NewArray(n) => write!(f, "NEW_ARRAY {n}"),
            Bytecode::NewHash(n) => write!(f, "NEW_HASH {n}"),
            Bytecode::NewRange => write!(f, "NEW_RANGE"),
            Bytecode::Dup => write!(f, "DUP"),
            Bytecode::Pop => write!(f, "POP"),
            Bytecode::Jump(target) => write!(f, "JUMP {target}"),
            Bytecode::JumpOnFalsePop(target) => write!(f, "JUMP_ON_FALSE_POP {target}"),
            Bytecode::JumpOnTruePop(target) => write!(f, "JUMP_ON_TRUE_POP {target}"),
            Bytecode::Send(sig, nargs, block) => match block {
                Some(blk) => write!(f, "SEND {sig} {nargs} block: {blk}"),
                None => write!(f, "SEND {sig} {nargs}"),
            },
            Bytecode::InvokeBlock(nargs) => write!(f, "INVOKE_BLOCK {nargs}"),
            Bytecode::DefMethod(name, body) => write!(f, "DEF_METHOD {name} {body}"),
            Bytecode::DefSelfMethod(name, body) => write!(f, "DEF_SELF_METHOD {name} {body}"),
            Bytecode::DefClass { name, body, .. } => write!(f, "DEF_CLASS {name} {body}"),
            Bytecode::Return => write!(f, "RETURN"),
        }
    }
}

/// An entry of a compiled unit's constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    String(Rc<str>),
    /// A nested unit: a method body, a block body, or a class body.
    Code(Rc<CodeUnit>),
}

/// A compiled unit: the instruction stream for one method, block, class body
/// or top-level program, together with its constant pool and line table.
///
/// Parameters occupy the first `params.len()` local slots; `nbr_locals` counts
/// parameters and locals together.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeUnit {
    /// Human-readable name (`"<main>"`, a method name, `"<block>"`, ...).
    pub name: String,
    /// Parameter names, in declaration order.
    pub params: Vec<String>,
    /// Total number of local slots, parameters included.
    pub nbr_locals: usize,
    /// The constant pool.
    pub literals: Vec<Literal>,
    /// The instruction stream.
    pub body: Vec<Bytecode>,
    /// Source line of each instruction, parallel to `body`.
    pub lines: Vec<u32>,
    /// The source file this unit was compiled from.
    pub file: Rc<str>,
    /// Fully qualified names of the lexically enclosing classes, innermost first.
    pub lexical_scopes: Vec<String>,
}

impl CodeUnit {
    /// The source line of the instruction at `pc`, if in range.
    pub fn line_at(&self, pc: usize) -> Option<u32> {
        self.lines.get(pc).copied()
    }
}
