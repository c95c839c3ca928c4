use std::rc::Rc;

use indexmap::IndexMap;

use crate::class::Class;
use crate::error::RuntimeError;
use crate::instance::Instance;
use crate::TetraRef;

/// The payload of an array value.
pub type ArrayRef = TetraRef<Vec<Value>>;
/// The payload of a hash value. Keys are strings; iteration follows insertion
/// order unless an operation sorts explicitly.
pub type HashRef = TetraRef<IndexMap<String, Value>>;

/// Represents a Tetra value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The `nil` value.
    Nil,
    /// The `true` and `false` values.
    Boolean(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// A string.
    String(Rc<str>),
    /// A mutable array.
    Array(ArrayRef),
    /// A mutable string-keyed hash.
    Hash(HashRef),
    /// An inclusive integer range.
    Range(i64, i64),
    /// A class (or module, or singleton class).
    Class(TetraRef<Class>),
    /// A user-defined class instance.
    Instance(TetraRef<Instance>),
    /// A runtime error, pushed onto the value stack at the fault site.
    Error(Rc<RuntimeError>),
}

impl Value {
    pub fn new_string(value: impl AsRef<str>) -> Value {
        Value::String(Rc::from(value.as_ref()))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only NIL and FALSE are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<ArrayRef> {
        match self {
            Value::Array(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<HashRef> {
        match self {
            Value::Hash(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<TetraRef<Class>> {
        match self {
            Value::Class(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<TetraRef<Instance>> {
        match self {
            Value::Instance(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Read an instance variable; both instances and class objects carry them.
    pub fn lookup_ivar(&self, name: &str) -> Value {
        match self {
            Value::Instance(instance) => instance.borrow().lookup_ivar(name),
            Value::Class(class) => class.borrow().lookup_ivar(name),
            _ => Value::Nil,
        }
    }

    /// Assign an instance variable, on receivers that can carry them.
    pub fn assign_ivar(&self, name: &str, value: Value) {
        match self {
            Value::Instance(instance) => instance.borrow_mut().assign_ivar(name, value),
            Value::Class(class) => class.borrow_mut().assign_ivar(name, value),
            _ => {}
        }
    }

    /// The name of this value's class, for diagnostics.
    pub fn class_name(&self) -> String {
        match self {
            Value::Nil => "Null".to_string(),
            Value::Boolean(_) => "Boolean".to_string(),
            Value::Integer(_) => "Integer".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Array(_) => "Array".to_string(),
            Value::Hash(_) => "Hash".to_string(),
            Value::Range(_, _) => "Range".to_string(),
            Value::Class(_) => "Class".to_string(),
            Value::Instance(instance) => instance.borrow().class.borrow().name.clone(),
            Value::Error(_) => "Error".to_string(),
        }
    }

    /// Plain rendering, as `puts` and receiver reporting use it: strings are
    /// unquoted, NIL is the empty string.
    pub fn to_s(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Boolean(value) => value.to_string(),
            Value::Integer(value) => value.to_string(),
            Value::String(value) => value.to_string(),
            Value::Array(elements) => {
                let rendered: Vec<String> =
                    elements.borrow().iter().map(|e| e.inspect()).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Hash(entries) => {
                let entries = entries.borrow();
                if entries.is_empty() {
                    return "{}".to_string();
                }
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                let rendered: Vec<String> = keys
                    .into_iter()
                    .map(|key| format!("{}: {}", key, entries[key].inspect()))
                    .collect();
                format!("{{ {} }}", rendered.join(", "))
            }
            Value::Range(start, end) => format!("({start}..{end})"),
            Value::Class(class) => class.borrow().name.clone(),
            Value::Instance(instance) => {
                format!("#<{}>", instance.borrow().class.borrow().name)
            }
            Value::Error(error) => error.to_string(),
        }
    }

    /// Rendering used inside containers: strings are double-quoted and NIL is
    /// spelled out.
    pub fn inspect(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::String(value) => format!("{value:?}"),
            other => other.to_s(),
        }
    }

    /// Convert to a JSON value; NIL maps to `null`. Values with no JSON
    /// counterpart (ranges, classes, instances) render as their string form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(value) => serde_json::Value::Bool(*value),
            Value::Integer(value) => serde_json::Value::from(*value),
            Value::String(value) => serde_json::Value::String(value.to_string()),
            Value::Array(elements) => {
                serde_json::Value::Array(elements.borrow().iter().map(|e| e.to_json()).collect())
            }
            Value::Hash(entries) => {
                let mut object = serde_json::Map::new();
                for (key, value) in entries.borrow().iter() {
                    object.insert(key.clone(), value.to_json());
                }
                serde_json::Value::Object(object)
            }
            other => serde_json::Value::String(other.to_s()),
        }
    }
}

/// Deep structural equality for primitives and containers; reference identity
/// for classes and instances.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Range(a1, a2), Value::Range(b1, b2)) => a1 == b1 && a2 == b2,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Hash(a), Value::Hash(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(key, value)| b.get(key) == Some(value))
            }
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    fn hash(entries: Vec<(&str, Value)>) -> Value {
        let map: IndexMap<String, Value> = entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Value::Hash(Rc::new(RefCell::new(map)))
    }

    #[test]
    fn hash_to_s_sorts_keys_and_quotes_strings() {
        let value = hash(vec![
            ("c", Value::Integer(1)),
            ("a", Value::new_string("x")),
        ]);
        assert_eq!(value.to_s(), r#"{ a: "x", c: 1 }"#);
        assert_eq!(hash(vec![]).to_s(), "{}");
    }

    #[test]
    fn array_to_s_uses_inspect_rendering() {
        let value = array(vec![Value::new_string("a"), Value::Integer(1), Value::Nil]);
        assert_eq!(value.to_s(), r#"["a", 1, nil]"#);
    }

    #[test]
    fn json_rendering() {
        let value = hash(vec![
            ("b", Value::Nil),
            ("a", array(vec![Value::Integer(1), Value::Boolean(true)])),
        ]);
        assert_eq!(
            serde_json::to_string(&value.to_json()).unwrap(),
            r#"{"a":[1,true],"b":null}"#,
        );
    }

    #[test]
    fn hash_equality_ignores_insertion_order() {
        let a = hash(vec![("x", Value::Integer(1)), ("y", Value::Integer(2))]);
        let b = hash(vec![("y", Value::Integer(2)), ("x", Value::Integer(1))]);
        assert_eq!(a, b);
        assert_ne!(a, hash(vec![("x", Value::Integer(1))]));
    }
}
