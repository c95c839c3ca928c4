use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::method::Method;
use crate::value::Value;
use crate::TetraRef;

/// Represents a loaded class.
///
/// Modules and singleton classes share this representation; flags tell them
/// apart. Class-side methods live in the singleton class's `methods` table.
pub struct Class {
    /// The class' fully qualified name (`A::B::C` for nested classes).
    pub name: String,
    /// The singleton class of this class; hosts its class-side methods.
    /// `None` only transiently during bootstrap.
    pub class: Option<TetraRef<Class>>,
    /// The superclass of this class; the root `Object` has none.
    pub super_class: Option<TetraRef<Class>>,
    /// Included modules, innermost (most recently included) first.
    pub includes: Vec<TetraRef<Class>>,
    /// The class' instance methods.
    pub methods: IndexMap<String, Rc<Method>>,
    /// Constants defined under this class' namespace.
    pub constants: IndexMap<String, Value>,
    /// The class object's own instance variables.
    pub ivars: IndexMap<String, Value>,
    pub is_module: bool,
    pub is_singleton: bool,
    /// Whether `new` may allocate instances of this class.
    pub instantiable: bool,
}

impl Class {
    /// A blank class template; relations are wired by the universe.
    pub fn named(name: impl Into<String>) -> Class {
        Class {
            name: name.into(),
            class: None,
            super_class: None,
            includes: Vec::new(),
            methods: IndexMap::new(),
            constants: IndexMap::new(),
            ivars: IndexMap::new(),
            is_module: false,
            is_singleton: false,
            instantiable: true,
        }
    }

    /// Get the class' name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the singleton class of this class.
    pub fn singleton_class(&self) -> TetraRef<Class> {
        self.class.clone().expect("class without a singleton class")
    }

    /// Get the superclass of this class.
    pub fn super_class(&self) -> Option<TetraRef<Class>> {
        self.super_class.clone()
    }

    /// Search for a method: this class' table, then included modules in
    /// inclusion order, then the superclass chain.
    pub fn lookup_method(&self, name: &str) -> Option<Rc<Method>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        for module in &self.includes {
            if let Some(method) = module.borrow().lookup_method(name) {
                return Some(method);
            }
        }
        self.super_class
            .as_ref()
            .and_then(|super_class| super_class.borrow().lookup_method(name))
    }

    /// Define or overwrite a method.
    pub fn add_method(&mut self, name: impl Into<String>, method: Rc<Method>) {
        self.methods.insert(name.into(), method);
    }

    pub fn lookup_constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).cloned()
    }

    /// Read one of the class object's own instance variables.
    pub fn lookup_ivar(&self, name: &str) -> Value {
        self.ivars.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn assign_ivar(&mut self, name: impl Into<String>, value: Value) {
        self.ivars.insert(name.into(), value);
    }
}

/// Whether `target` appears in `candidate`'s ancestor chain (the class itself,
/// its included modules, and its superclasses).
pub fn ancestor_of(candidate: &TetraRef<Class>, target: &TetraRef<Class>) -> bool {
    if Rc::ptr_eq(candidate, target) {
        return true;
    }
    let class = candidate.borrow();
    for module in &class.includes {
        if ancestor_of(module, target) {
            return true;
        }
    }
    match &class.super_class {
        Some(super_class) => ancestor_of(super_class, target),
        None => false,
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Class").field("name", &self.name).finish()
    }
}
