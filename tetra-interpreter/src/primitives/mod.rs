/// Primitives for the **Array** class.
pub mod array;
/// Primitives for the **Boolean** class.
pub mod boolean;
/// Primitives for the **Class** class.
pub mod class;
/// Primitives for the **Hash** class.
pub mod hash;
/// Primitives for the **Integer** class.
pub mod integer;
/// Primitives for the **Null** class.
pub mod null;
/// Primitives for the **Object** class.
pub mod object;
/// Primitives for the **Range** class.
pub mod range;
/// Primitives for the **String** class.
pub mod string;

use std::rc::Rc;

use crate::block::Block;
use crate::class::Class;
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::universe::Universe;
use crate::value::{HashRef, Value};
use crate::TetraRef;

/// The shared signature of every interpreter primitive:
/// `(thread, universe, receiver, args, block) -> value`.
pub type PrimitiveFn = fn(
    &mut Interpreter,
    &mut Universe,
    Value,
    &[Value],
    Option<&Rc<Block>>,
) -> Result<Value, RuntimeError>;

pub type PrimInfo = (&'static str, PrimitiveFn);

pub fn get_instance_primitives(class_name: &str) -> Option<&'static [PrimInfo]> {
    match class_name {
        "Array" => Some(self::array::INSTANCE_PRIMITIVES),
        "Boolean" => Some(self::boolean::INSTANCE_PRIMITIVES),
        "Class" => Some(self::class::INSTANCE_PRIMITIVES),
        "Hash" => Some(self::hash::INSTANCE_PRIMITIVES),
        "Integer" => Some(self::integer::INSTANCE_PRIMITIVES),
        "Null" => Some(self::null::INSTANCE_PRIMITIVES),
        "Object" => Some(self::object::INSTANCE_PRIMITIVES),
        "Range" => Some(self::range::INSTANCE_PRIMITIVES),
        "String" => Some(self::string::INSTANCE_PRIMITIVES),
        _ => None,
    }
}

pub fn get_class_primitives(class_name: &str) -> Option<&'static [PrimInfo]> {
    match class_name {
        "Array" => Some(self::array::CLASS_PRIMITIVES),
        "Boolean" => Some(self::boolean::CLASS_PRIMITIVES),
        "Class" => Some(self::class::CLASS_PRIMITIVES),
        "Hash" => Some(self::hash::CLASS_PRIMITIVES),
        "Integer" => Some(self::integer::CLASS_PRIMITIVES),
        "Null" => Some(self::null::CLASS_PRIMITIVES),
        "Object" => Some(self::object::CLASS_PRIMITIVES),
        "Range" => Some(self::range::CLASS_PRIMITIVES),
        "String" => Some(self::string::CLASS_PRIMITIVES),
        _ => None,
    }
}

/// Check an exact argument count, with the observable error text.
#[macro_export]
macro_rules! expect_args {
    ($args:expr, $count:expr) => {
        if $args.len() != $count {
            return Err($crate::error::RuntimeError::wrong_number_of_arguments(
                $count,
                $args.len(),
            ));
        }
    };
}

pub(crate) fn expect_string(value: &Value) -> Result<Rc<str>, RuntimeError> {
    match value {
        Value::String(string) => Ok(string.clone()),
        other => Err(RuntimeError::wrong_argument_type("String", &other.class_name())),
    }
}

pub(crate) fn expect_integer(value: &Value) -> Result<i64, RuntimeError> {
    value
        .as_integer()
        .ok_or_else(|| RuntimeError::wrong_argument_type("Integer", &value.class_name()))
}

pub(crate) fn expect_boolean(value: &Value) -> Result<bool, RuntimeError> {
    value
        .as_boolean()
        .ok_or_else(|| RuntimeError::wrong_argument_type("Boolean", &value.class_name()))
}

pub(crate) fn expect_hash(value: &Value) -> Result<HashRef, RuntimeError> {
    value
        .as_hash()
        .ok_or_else(|| RuntimeError::wrong_argument_type("Hash", &value.class_name()))
}

pub(crate) fn expect_class(value: &Value) -> Result<TetraRef<Class>, RuntimeError> {
    value
        .as_class()
        .ok_or_else(|| RuntimeError::wrong_argument_type("Class", &value.class_name()))
}

pub(crate) fn expect_block<'a>(
    block: Option<&'a Rc<Block>>,
) -> Result<&'a Rc<Block>, RuntimeError> {
    block.ok_or_else(RuntimeError::yield_without_block)
}
