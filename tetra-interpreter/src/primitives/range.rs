use std::cell::RefCell;
use std::rc::Rc;

use crate::block::Block;
use crate::error::{ErrorKind, RuntimeError};
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::{expect_block, PrimInfo};
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("first", self::first),
    ("last", self::last),
    ("to_a", self::to_a),
    ("each", self::each),
    ("to_s", self::to_s),
    ("to_json", self::to_json),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn receiver_range(receiver: &Value) -> (i64, i64) {
    match receiver {
        Value::Range(start, end) => (*start, *end),
        _ => panic!("Range primitive dispatched on a non-range receiver"),
    }
}

fn first(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Integer(receiver_range(&receiver).0))
}

fn last(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Integer(receiver_range(&receiver).1))
}

fn to_a(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let (start, end) = receiver_range(&receiver);
    let elements: Vec<Value> = (start..=end).map(Value::Integer).collect();
    Ok(Value::Array(Rc::new(RefCell::new(elements))))
}

fn each(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let block = expect_block(block)?;
    let (start, end) = receiver_range(&receiver);
    for value in start..=end {
        interpreter.call_block(universe, block, vec![Value::Integer(value)])?;
    }
    Ok(receiver)
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
    let rendered = serde_json::to_string(&receiver.to_json())
        .map_err(|error| RuntimeError::new(ErrorKind::InternalError, error.to_string()))?;
    Ok(Value::new_string(rendered))
}
