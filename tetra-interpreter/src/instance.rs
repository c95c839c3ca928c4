use std::fmt;

use indexmap::IndexMap;

use crate::class::Class;
use crate::value::Value;
use crate::TetraRef;

/// Represents a generic (non-primitive) class instance.
pub struct Instance {
    /// The class of which this is an instance from.
    pub class: TetraRef<Class>,
    /// This instance's variables, keyed by name (`@` included).
    pub ivars: IndexMap<String, Value>,
}

impl Instance {
    /// Construct an instance for a given class.
    pub fn from_class(class: TetraRef<Class>) -> Instance {
        Instance {
            class,
            ivars: IndexMap::new(),
        }
    }

    /// Get the class of which this is an instance from.
    pub fn class(&self) -> TetraRef<Class> {
        self.class.clone()
    }

    /// Read an instance variable; unset variables read as NIL.
    pub fn lookup_ivar(&self, name: &str) -> Value {
        self.ivars.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn assign_ivar(&mut self, name: impl Into<String>, value: Value) {
        self.ivars.insert(name.into(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.borrow().name)
            .finish()
    }
}
