use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::block::Block;
use crate::error::{ErrorKind, RuntimeError};
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::{expect_block, expect_integer, PrimInfo};
use crate::universe::Universe;
use crate::value::{ArrayRef, Value};

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("push", self::push),
    ("pop", self::pop),
    ("length", self::length),
    ("[]", self::index),
    ("[]=", self::index_assign),
    ("first", self::first),
    ("last", self::last),
    ("empty?", self::empty),
    ("each", self::each),
    ("map", self::map),
    ("sort", self::sort),
    ("to_h", self::to_h),
    ("to_s", self::to_s),
    ("to_json", self::to_json),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn receiver_array(receiver: &Value) -> ArrayRef {
    receiver
        .as_array()
        .expect("Array primitive dispatched on a non-array receiver")
}

fn push(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let elements = receiver_array(&receiver);
    elements.borrow_mut().extend(args.iter().cloned());
    Ok(receiver)
}

fn pop(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let popped = elements.borrow_mut().pop();
    Ok(popped.unwrap_or(Value::Nil))
}

fn length(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let length = elements.borrow().len();
    Ok(Value::Integer(length as i64))
}

/// Resolve an index, counting from the end when negative.
fn resolve_index(idx: i64, length: usize) -> Option<usize> {
    if idx >= 0 {
        Some(idx as usize)
    } else {
        length.checked_sub(idx.unsigned_abs() as usize)
    }
}

fn index(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let idx = expect_integer(&args[0])?;
    let elements = receiver_array(&receiver);
    let elements = elements.borrow();
    let value = resolve_index(idx, elements.len())
        .and_then(|idx| elements.get(idx).cloned())
        .unwrap_or(Value::Nil);
    Ok(value)
}

fn index_assign(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 2);
    let idx = expect_integer(&args[0])?;
    let value = args[1].clone();
    let elements = receiver_array(&receiver);
    let mut elements = elements.borrow_mut();
    let resolved = resolve_index(idx, elements.len()).ok_or_else(|| {
        RuntimeError::new(
            ErrorKind::ArgumentError,
            format!(
                "Index value {idx} too small for array. minimum: -{}",
                elements.len()
            ),
        )
    })?;
    if resolved >= elements.len() {
        elements.resize(resolved + 1, Value::Nil);
    }
    elements[resolved] = value.clone();
    Ok(value)
}

fn first(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let value = elements.borrow().first().cloned();
    Ok(value.unwrap_or(Value::Nil))
}

fn last(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let value = elements.borrow().last().cloned();
    Ok(value.unwrap_or(Value::Nil))
}

fn empty(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let is_empty = elements.borrow().is_empty();
    Ok(Value::Boolean(is_empty))
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
    let elements = receiver_array(&receiver);
    let snapshot: Vec<Value> = elements.borrow().clone();
    for element in snapshot {
        interpreter.call_block(universe, block, vec![element])?;
    }
    Ok(receiver)
}

fn map(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let block = expect_block(block)?;
    let elements = receiver_array(&receiver);
    let snapshot: Vec<Value> = elements.borrow().clone();
    let mut mapped = Vec::with_capacity(snapshot.len());
    for element in snapshot {
        mapped.push(interpreter.call_block(universe, block, vec![element])?);
    }
    Ok(Value::Array(Rc::new(RefCell::new(mapped))))
}

fn sort(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let mut sorted: Vec<Value> = elements.borrow().clone();
    if sorted.iter().all(|value| value.as_integer().is_some()) {
        sorted.sort_by_key(|value| value.as_integer().unwrap_or_default());
    } else {
        sorted.sort_by_key(|value| value.to_s());
    }
    Ok(Value::Array(Rc::new(RefCell::new(sorted))))
}

fn to_h(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let elements = receiver_array(&receiver);
    let mut entries = IndexMap::new();
    for element in elements.borrow().iter() {
        let pair = element
            .as_array()
            .ok_or_else(|| RuntimeError::wrong_argument_type("Array", &element.class_name()))?;
        let pair = pair.borrow();
        let [Value::String(key), value] = pair.as_slice() else {
            return Err(RuntimeError::new(
                ErrorKind::TypeError,
                format!("Expect element to be a [key, value] pair. got: {}", element.to_s()),
            ));
        };
        entries.insert(key.to_string(), value.clone());
    }
    Ok(Value::Hash(Rc::new(RefCell::new(entries))))
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
