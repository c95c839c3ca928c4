use std::fmt;
use std::rc::Rc;

use tetra_core::bytecode::CodeUnit;

use crate::frame::Scope;
use crate::value::Value;
use crate::TetraRef;

/// Represents an executable block.
///
/// A block is captured at the call site: it closes over the defining frame's
/// scope (for variable access), `self`, and block slot (so `yield` inside a
/// block reaches the defining method's block).
pub struct Block {
    pub code: Rc<CodeUnit>,
    /// The scope of the frame the block was created in.
    pub scope: TetraRef<Scope>,
    pub self_value: Value,
    /// The defining frame's own block, if any.
    pub outer_block: Option<Rc<Block>>,
}

impl Block {
    /// Retrieve the number of parameters this block accepts.
    pub fn nb_parameters(&self) -> usize {
        self.code.params.len()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Block")
            .field("params", &self.code.params)
            .finish()
    }
}
