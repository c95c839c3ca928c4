use std::rc::Rc;

use crate::block::Block;
use crate::error::RuntimeError;
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::{expect_integer, PrimInfo};
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("+", self::plus),
    ("-", self::minus),
    ("*", self::times),
    ("/", self::divide),
    ("%", self::modulo),
    ("-@", self::negate),
    ("==", self::eq),
    ("!=", self::neq),
    ("<", self::lt),
    ("<=", self::le),
    (">", self::gt),
    (">=", self::ge),
    ("even?", self::even),
    ("odd?", self::odd),
    ("to_s", self::to_s),
    ("to_json", self::to_json),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn receiver_integer(receiver: &Value) -> i64 {
    receiver
        .as_integer()
        .expect("Integer primitive dispatched on a non-integer receiver")
}

fn binary_operands(receiver: &Value, args: &[Value]) -> Result<(i64, i64), RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::wrong_number_of_arguments(1, args.len()));
    }
    Ok((receiver_integer(receiver), expect_integer(&args[0])?))
}

fn plus(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Integer(a.wrapping_add(b)))
}

fn minus(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Integer(a.wrapping_sub(b)))
}

fn times(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Integer(a.wrapping_mul(b)))
}

fn divide(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    if b == 0 {
        return Err(RuntimeError::divided_by_zero());
    }
    Ok(Value::Integer(a.wrapping_div(b)))
}

fn modulo(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    if b == 0 {
        return Err(RuntimeError::divided_by_zero());
    }
    Ok(Value::Integer(a.wrapping_rem(b)))
}

fn negate(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Integer(receiver_integer(&receiver).wrapping_neg()))
}

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

fn lt(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Boolean(a < b))
}

fn le(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Boolean(a <= b))
}

fn gt(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Boolean(a > b))
}

fn ge(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let (a, b) = binary_operands(&receiver, args)?;
    Ok(Value::Boolean(a >= b))
}

fn even(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Boolean(receiver_integer(&receiver) % 2 == 0))
}

fn odd(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Boolean(receiver_integer(&receiver) % 2 != 0))
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
