use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::block::Block;
use crate::error::{ErrorKind, RuntimeError};
use crate::expect_args;
use crate::interpreter::Interpreter;
use crate::primitives::{expect_block, expect_boolean, expect_hash, expect_string, PrimInfo};
use crate::universe::Universe;
use crate::value::{HashRef, Value};

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("[]", self::index),
    ("[]=", self::index_assign),
    ("clear", self::clear),
    ("delete", self::delete),
    ("empty?", self::empty),
    ("eql?", self::eql),
    ("has_key?", self::has_key),
    ("has_value?", self::has_value),
    ("keys", self::keys),
    ("length", self::length),
    ("sorted_keys", self::sorted_keys),
    ("values", self::values),
    ("merge", self::merge),
    ("each_key", self::each_key),
    ("each_value", self::each_value),
    ("map_values", self::map_values),
    ("transform_values", self::transform_values),
    ("to_a", self::to_a),
    ("to_json", self::to_json),
    ("to_s", self::to_s),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn receiver_hash(receiver: &Value) -> HashRef {
    receiver
        .as_hash()
        .expect("Hash primitive dispatched on a non-hash receiver")
}

/// Entries sorted ascending by key, for the `sorted_*`/`each_*` family.
fn sorted_entries(entries: &HashRef) -> Vec<(String, Value)> {
    let mut pairs: Vec<(String, Value)> = entries
        .borrow()
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

fn index(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let key = expect_string(&args[0])?;
    let entries = receiver_hash(&receiver);
    let value = entries.borrow().get(key.as_ref()).cloned();
    Ok(value.unwrap_or(Value::Nil))
}

fn index_assign(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 2);
    let key = expect_string(&args[0])?;
    let entries = receiver_hash(&receiver);
    entries.borrow_mut().insert(key.to_string(), args[1].clone());
    Ok(args[1].clone())
}

fn clear(
    _: &mut Interpreter,
    _: &mut Universe,
    _: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    Ok(Value::Hash(Rc::new(RefCell::new(IndexMap::new()))))
}

fn delete(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let key = expect_string(&args[0])?;
    let entries = receiver_hash(&receiver);
    entries.borrow_mut().shift_remove(key.as_ref());
    Ok(receiver)
}

fn empty(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let entries = receiver_hash(&receiver);
    let is_empty = entries.borrow().is_empty();
    Ok(Value::Boolean(is_empty))
}

fn eql(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    Ok(Value::Boolean(receiver == args[0]))
}

fn has_key(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let key = expect_string(&args[0])?;
    let entries = receiver_hash(&receiver);
    let present = entries.borrow().contains_key(key.as_ref());
    Ok(Value::Boolean(present))
}

fn has_value(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 1);
    let entries = receiver_hash(&receiver);
    let present = entries.borrow().values().any(|value| *value == args[0]);
    Ok(Value::Boolean(present))
}

fn keys(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let entries = receiver_hash(&receiver);
    let keys: Vec<Value> = entries.borrow().keys().map(Value::new_string).collect();
    Ok(Value::Array(Rc::new(RefCell::new(keys))))
}

fn length(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let entries = receiver_hash(&receiver);
    let length = entries.borrow().len();
    Ok(Value::Integer(length as i64))
}

fn sorted_keys(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let entries = receiver_hash(&receiver);
    let mut keys: Vec<String> = entries.borrow().keys().cloned().collect();
    keys.sort();
    let keys: Vec<Value> = keys.iter().map(Value::new_string).collect();
    Ok(Value::Array(Rc::new(RefCell::new(keys))))
}

fn values(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let entries = receiver_hash(&receiver);
    let values: Vec<Value> = entries.borrow().values().cloned().collect();
    Ok(Value::Array(Rc::new(RefCell::new(values))))
}

fn merge(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::wrong_number_of_arguments_at_least(1, 0));
    }
    let entries = receiver_hash(&receiver);
    let mut merged = entries.borrow().clone();
    for arg in args {
        let other = expect_hash(arg)?;
        for (key, value) in other.borrow().iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Hash(Rc::new(RefCell::new(merged))))
}

fn each_key(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let block = expect_block(block)?;
    let entries = receiver_hash(&receiver);
    let pairs = sorted_entries(&entries);
    let mut keys = Vec::with_capacity(pairs.len());
    for (key, _) in pairs {
        interpreter.call_block(universe, block, vec![Value::new_string(&key)])?;
        keys.push(Value::new_string(&key));
    }
    Ok(Value::Array(Rc::new(RefCell::new(keys))))
}

fn each_value(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let block = expect_block(block)?;
    let entries = receiver_hash(&receiver);
    let pairs = sorted_entries(&entries);
    let mut values = Vec::with_capacity(pairs.len());
    for (_, value) in pairs {
        interpreter.call_block(universe, block, vec![value.clone()])?;
        values.push(value);
    }
    Ok(Value::Array(Rc::new(RefCell::new(values))))
}

fn map_values(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let block = expect_block(block)?;
    let entries = receiver_hash(&receiver);
    for (key, value) in sorted_entries(&entries) {
        let mapped = interpreter.call_block(universe, block, vec![value])?;
        entries.borrow_mut().insert(key, mapped);
    }
    Ok(receiver)
}

fn transform_values(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let block = expect_block(block)?;
    let entries = receiver_hash(&receiver);
    let mut transformed = IndexMap::new();
    for (key, value) in sorted_entries(&entries) {
        let mapped = interpreter.call_block(universe, block, vec![value])?;
        transformed.insert(key, mapped);
    }
    Ok(Value::Hash(Rc::new(RefCell::new(transformed))))
}

fn to_a(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    if args.len() > 1 {
        return Err(RuntimeError::wrong_number_of_arguments_range(0, 1, args.len()));
    }
    let sorted = match args.first() {
        Some(value) => expect_boolean(value)?,
        None => false,
    };
    let entries = receiver_hash(&receiver);
    let pairs: Vec<(String, Value)> = if sorted {
        sorted_entries(&entries)
    } else {
        entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    };
    let pairs: Vec<Value> = pairs
        .into_iter()
        .map(|(key, value)| {
            Value::Array(Rc::new(RefCell::new(vec![Value::new_string(key), value])))
        })
        .collect();
    Ok(Value::Array(Rc::new(RefCell::new(pairs))))
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
