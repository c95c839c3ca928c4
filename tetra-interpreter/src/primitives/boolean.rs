use std::rc::Rc;

use crate::block::Block;
use crate::error::RuntimeError;
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::PrimInfo;
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("==", self::eq),
    ("!=", self::neq),
    ("to_s", self::to_s),
    ("to_json", self::to_json),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn eq(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    Ok(Value::Boolean(receiver == args[0]))
}

fn neq(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    Ok(Value::Boolean(receiver != args[0]))
}

fn to_s(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::new_string(receiver.to_s()))
}

fn to_json(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::new_string(receiver.to_s()))
}
