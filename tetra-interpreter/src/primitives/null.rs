use std::rc::Rc;

use crate::block::Block;
use crate::error::RuntimeError;
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::PrimInfo;
use crate::universe::Universe;
use crate::value::Value;

// Equality, `nil?` and `to_s` come from Object; NIL only specializes JSON.
pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[("to_json", self::to_json)];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn to_json(
    _: &mut Interpreter,
    _: &mut Universe,
    _: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::new_string("null"))
}
