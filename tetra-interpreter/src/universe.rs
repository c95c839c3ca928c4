use std::path::{Path, PathBuf};
use std::rc::Rc;

use std::cell::RefCell;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::class::Class;
use crate::instance::Instance;
use crate::method::{Method, MethodKind};
use crate::primitives;
use crate::value::Value;
use crate::TetraRef;

/// The core classes of the Tetra interpreter.
///
/// This struct allows to always keep a reference to important classes,
/// even in case of modifications to global bindings by user-defined code.
#[derive(Debug)]
pub struct CoreClasses {
    /// The **Object** class.
    pub object_class: TetraRef<Class>,
    /// The **Class** class.
    pub class_class: TetraRef<Class>,
    /// The **Integer** class.
    pub integer_class: TetraRef<Class>,
    /// The **String** class.
    pub string_class: TetraRef<Class>,
    /// The **Boolean** class.
    pub boolean_class: TetraRef<Class>,
    /// The **Null** class.
    pub null_class: TetraRef<Class>,
    /// The **Array** class.
    pub array_class: TetraRef<Class>,
    /// The **Hash** class.
    pub hash_class: TetraRef<Class>,
    /// The **Range** class.
    pub range_class: TetraRef<Class>,
}

/// The central data structure for the interpreter.
///
/// It represents the process-wide state of the interpreter: the core classes,
/// the registry of every defined class, the top-level `self`, and the load
/// path and loaded-unit set backing `require`.
pub struct Universe {
    /// The interpreter's core classes.
    pub core: CoreClasses,
    /// Every class ever defined, keyed by fully qualified name.
    pub registry: IndexMap<String, TetraRef<Class>>,
    /// The top-level `self`.
    pub main_object: Value,
    /// The directories `require` searches.
    pub load_path: Vec<PathBuf>,
    /// Canonical paths of units that have already been executed.
    loaded: IndexSet<PathBuf>,
}

impl Universe {
    /// Initialize the universe with the given load path.
    pub fn with_load_path(load_path: Vec<PathBuf>) -> Universe {
        // Object and Class come first: their singleton classes refer to each
        // other, so they are wired by hand before the generic helper applies.
        let object_class = Rc::new(RefCell::new(Class::named("Object")));
        let class_class = Rc::new(RefCell::new(Class::named("Class")));
        {
            let mut class_class_mut = class_class.borrow_mut();
            class_class_mut.super_class = Some(object_class.clone());
            class_class_mut.instantiable = false;
        }
        // `#<Class:Object>` terminates every singleton chain; its superclass
        // is `Class`, so class receivers reach the Class instance methods.
        let object_singleton = make_singleton("Object", class_class.clone(), &class_class);
        object_class.borrow_mut().class = Some(object_singleton.clone());
        let class_singleton = make_singleton("Class", object_singleton, &class_class);
        class_class.borrow_mut().class = Some(class_singleton);

        let integer_class = core_class("Integer", &object_class, &class_class, false);
        let string_class = core_class("String", &object_class, &class_class, false);
        let boolean_class = core_class("Boolean", &object_class, &class_class, false);
        let null_class = core_class("Null", &object_class, &class_class, false);
        let array_class = core_class("Array", &object_class, &class_class, true);
        let hash_class = core_class("Hash", &object_class, &class_class, false);
        let range_class = core_class("Range", &object_class, &class_class, false);

        let mut universe = Universe {
            core: CoreClasses {
                object_class,
                class_class,
                integer_class,
                string_class,
                boolean_class,
                null_class,
                array_class,
                hash_class,
                range_class,
            },
            registry: IndexMap::new(),
            main_object: Value::Nil,
            load_path,
            loaded: IndexSet::new(),
        };
        universe.install_primitives();
        universe.register_core_constants();
        universe.main_object = Value::Instance(Rc::new(RefCell::new(Instance::from_class(
            universe.core.object_class.clone(),
        ))));
        universe
    }

    fn core_classes(&self) -> [(&TetraRef<Class>, &'static str); 9] {
        [
            (&self.core.object_class, "Object"),
            (&self.core.class_class, "Class"),
            (&self.core.integer_class, "Integer"),
            (&self.core.string_class, "String"),
            (&self.core.boolean_class, "Boolean"),
            (&self.core.null_class, "Null"),
            (&self.core.array_class, "Array"),
            (&self.core.hash_class, "Hash"),
            (&self.core.range_class, "Range"),
        ]
    }

    fn install_primitives(&self) {
        for (class, name) in self.core_classes() {
            if let Some(prims) = primitives::get_instance_primitives(name) {
                let mut class_mut = class.borrow_mut();
                for (signature, func) in prims.iter() {
                    let method = Rc::new(Method {
                        kind: MethodKind::Primitive(*func),
                        holder: Rc::downgrade(class),
                        signature: (*signature).to_string(),
                    });
                    class_mut.add_method(*signature, method);
                }
            }
            if let Some(prims) = primitives::get_class_primitives(name) {
                let singleton = class.borrow().singleton_class();
                let mut singleton_mut = singleton.borrow_mut();
                for (signature, func) in prims.iter() {
                    let method = Rc::new(Method {
                        kind: MethodKind::Primitive(*func),
                        holder: Rc::downgrade(&singleton),
                        signature: (*signature).to_string(),
                    });
                    singleton_mut.add_method(*signature, method);
                }
            }
        }
    }

    fn register_core_constants(&mut self) {
        let pairs: Vec<(String, TetraRef<Class>)> = self
            .core_classes()
            .iter()
            .map(|(class, name)| ((*name).to_string(), (*class).clone()))
            .collect();
        for (name, class) in pairs {
            self.core
                .object_class
                .borrow_mut()
                .constants
                .insert(name.clone(), Value::Class(class.clone()));
            self.registry.insert(name, class);
        }
    }

    /// Get the **Object** class.
    pub fn object_class(&self) -> TetraRef<Class> {
        self.core.object_class.clone()
    }
    /// Get the **Class** class.
    pub fn class_class(&self) -> TetraRef<Class> {
        self.core.class_class.clone()
    }
    /// Get the **Integer** class.
    pub fn integer_class(&self) -> TetraRef<Class> {
        self.core.integer_class.clone()
    }
    /// Get the **String** class.
    pub fn string_class(&self) -> TetraRef<Class> {
        self.core.string_class.clone()
    }
    /// Get the **Boolean** class.
    pub fn boolean_class(&self) -> TetraRef<Class> {
        self.core.boolean_class.clone()
    }
    /// Get the **Null** class.
    pub fn null_class(&self) -> TetraRef<Class> {
        self.core.null_class.clone()
    }
    /// Get the **Array** class.
    pub fn array_class(&self) -> TetraRef<Class> {
        self.core.array_class.clone()
    }
    /// Get the **Hash** class.
    pub fn hash_class(&self) -> TetraRef<Class> {
        self.core.hash_class.clone()
    }
    /// Get the **Range** class.
    pub fn range_class(&self) -> TetraRef<Class> {
        self.core.range_class.clone()
    }

    /// The class of a value as user code observes it (`5.class`).
    pub fn class_of(&self, value: &Value) -> TetraRef<Class> {
        match value {
            Value::Nil => self.null_class(),
            Value::Boolean(_) => self.boolean_class(),
            Value::Integer(_) => self.integer_class(),
            Value::String(_) => self.string_class(),
            Value::Array(_) => self.array_class(),
            Value::Hash(_) => self.hash_class(),
            Value::Range(_, _) => self.range_class(),
            Value::Class(_) => self.class_class(),
            Value::Instance(instance) => instance.borrow().class(),
            Value::Error(_) => self.object_class(),
        }
    }

    /// The class method resolution starts from. For class receivers this is
    /// the singleton class, which makes class-side methods inherit along `<`.
    pub fn dispatch_class(&self, value: &Value) -> TetraRef<Class> {
        match value {
            Value::Class(class) => class.borrow().singleton_class(),
            other => self.class_of(other),
        }
    }

    /// Define a class or module under a namespace, or return the existing one
    /// when reopening.
    pub fn define_class(
        &mut self,
        namespace: &TetraRef<Class>,
        name: &str,
        super_class: Option<TetraRef<Class>>,
        is_module: bool,
    ) -> TetraRef<Class> {
        if let Some(Value::Class(existing)) = namespace.borrow().lookup_constant(name) {
            return existing;
        }

        let qualified = if Rc::ptr_eq(namespace, &self.core.object_class) {
            name.to_string()
        } else {
            format!("{}::{}", namespace.borrow().name, name)
        };
        debug!("defining {} {}", if is_module { "module" } else { "class" }, qualified);

        let class = Rc::new(RefCell::new(Class::named(qualified.clone())));
        {
            let mut class_mut = class.borrow_mut();
            class_mut.is_module = is_module;
            class_mut.instantiable = !is_module;
            if !is_module {
                class_mut.super_class =
                    Some(super_class.unwrap_or_else(|| self.core.object_class.clone()));
            }
        }
        let singleton_super = class
            .borrow()
            .super_class()
            .map(|super_class| super_class.borrow().singleton_class())
            .unwrap_or_else(|| self.core.class_class.clone());
        let singleton = make_singleton(&qualified, singleton_super, &self.core.class_class);
        class.borrow_mut().class = Some(singleton);

        namespace
            .borrow_mut()
            .constants
            .insert(name.to_string(), Value::Class(class.clone()));
        self.registry.insert(qualified, class.clone());
        class
    }

    /// Constant lookup for a bare name: each lexically enclosing class, then
    /// the `Object` namespace.
    pub fn lookup_constant_lexical(&self, name: &str, lexical_scopes: &[String]) -> Option<Value> {
        for scope_name in lexical_scopes {
            if let Some(class) = self.registry.get(scope_name) {
                if let Some(value) = class.borrow().lookup_constant(name) {
                    return Some(value);
                }
            }
        }
        self.core.object_class.borrow().lookup_constant(name)
    }

    /// Resolve a `require_relative` path against the requiring file.
    pub fn resolve_relative(&self, requiring_file: &str, path: &str) -> PathBuf {
        let base = Path::new(requiring_file)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        with_source_extension(base.join(path))
    }

    /// Resolve a `require` name against the load path.
    pub fn resolve_required(&self, name: &str) -> Option<PathBuf> {
        for dir in &self.load_path {
            let path = with_source_extension(dir.join(name));
            if path.is_file() {
                return Some(path);
            }
        }
        None
    }

    /// Record a unit as loaded. Returns `false` if it already was.
    pub fn mark_loaded(&mut self, canonical: PathBuf) -> bool {
        self.loaded.insert(canonical)
    }
}

fn with_source_extension(mut path: PathBuf) -> PathBuf {
    if path.extension().is_none() {
        path.set_extension("tet");
    }
    path
}

fn core_class(
    name: &str,
    super_class: &TetraRef<Class>,
    class_class: &TetraRef<Class>,
    instantiable: bool,
) -> TetraRef<Class> {
    let class = Rc::new(RefCell::new(Class::named(name)));
    {
        let mut class_mut = class.borrow_mut();
        class_mut.super_class = Some(super_class.clone());
        class_mut.instantiable = instantiable;
    }
    let singleton = make_singleton(name, super_class.borrow().singleton_class(), class_class);
    class.borrow_mut().class = Some(singleton);
    class
}

fn make_singleton(
    owner_name: &str,
    super_class: TetraRef<Class>,
    class_class: &TetraRef<Class>,
) -> TetraRef<Class> {
    let mut singleton = Class::named(format!("#<Class:{owner_name}>"));
    singleton.is_singleton = true;
    singleton.instantiable = false;
    singleton.super_class = Some(super_class);
    singleton.class = Some(class_class.clone());
    Rc::new(RefCell::new(singleton))
}
