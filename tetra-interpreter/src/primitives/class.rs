use std::cell::RefCell;
use std::rc::Rc;

use crate::block::Block;
use crate::error::RuntimeError;
use crate::expect_args;
use crate::instance::Instance;
use crate::interpreter::Interpreter;
use crate::method::{Method, MethodKind};
use crate::primitives::{expect_class, expect_string, PrimInfo};
use crate::universe::Universe;
use crate::value::Value;
use crate::TetraRef;

pub static INSTANCE_PRIMITIVES: &[PrimInfo] = &[
    ("name", self::name),
    ("superclass", self::superclass),
    ("singleton_class", self::singleton_class),
    ("new", self::new),
    ("include", self::include),
    ("attr_reader", self::attr_reader),
    ("attr_writer", self::attr_writer),
    ("attr_accessor", self::attr_accessor),
    ("to_s", self::to_s),
];
pub static CLASS_PRIMITIVES: &[PrimInfo] = &[];

fn receiver_class(receiver: &Value) -> TetraRef<crate::class::Class> {
    receiver
        .as_class()
        .expect("Class primitive dispatched on a non-class receiver")
}

fn name(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let class = receiver_class(&receiver);
    let name = class.borrow().name.clone();
    Ok(Value::new_string(name))
}

fn superclass(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let class = receiver_class(&receiver);
    let super_class = class.borrow().super_class();
    Ok(super_class.map(Value::Class).unwrap_or(Value::Nil))
}

fn singleton_class(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    expect_args!(args, 0);
    let class = receiver_class(&receiver);
    let singleton = class.borrow().singleton_class();
    Ok(Value::Class(singleton))
}

fn new(
    interpreter: &mut Interpreter,
    universe: &mut Universe,
    receiver: Value,
    args: &[Value],
    block: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    let class = receiver_class(&receiver);
    // `Array.new` allocates a primitive array, not a generic instance.
    if Rc::ptr_eq(&class, &universe.core.array_class) {
        expect_args!(args, 0);
        return Ok(Value::Array(Rc::new(RefCell::new(Vec::new()))));
    }
    let (instantiable, class_name) = {
        let class = class.borrow();
        (class.instantiable, class.name.clone())
    };
    if !instantiable {
        return Err(RuntimeError::unsupported_new(&class_name));
    }

    let instance = Value::Instance(Rc::new(RefCell::new(Instance::from_class(class.clone()))));
    let initializer = class.borrow().lookup_method("initialize");
    match initializer {
        Some(method) => {
            interpreter.call_method(
                universe,
                &method,
                instance.clone(),
                args.to_vec(),
                block.cloned(),
            )?;
        }
        None if !args.is_empty() => {
            return Err(RuntimeError::wrong_number_of_arguments(0, args.len()));
        }
        None => {}
    }
    Ok(instance)
}

fn include(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::wrong_number_of_arguments_at_least(1, 0));
    }
    let class = receiver_class(&receiver);
    for arg in args {
        let module = expect_class(arg)?;
        if !module.borrow().is_module {
            let got = module.borrow().name.clone();
            return Err(RuntimeError::wrong_argument_type("Module", &got));
        }
        // Innermost-first: the most recent include wins the method lookup.
        class.borrow_mut().includes.insert(0, module);
    }
    Ok(receiver)
}

fn define_accessors(
    receiver: &Value,
    args: &[Value],
    reader: bool,
    writer: bool,
) -> Result<Value, RuntimeError> {
    let class = receiver_class(receiver);
    for arg in args {
        let attr_name = expect_string(arg)?;
        let ivar_name = format!("@{attr_name}");
        if reader {
            let method = Rc::new(Method {
                kind: MethodKind::AttrReader(ivar_name.clone()),
                holder: Rc::downgrade(&class),
                signature: attr_name.to_string(),
            });
            class.borrow_mut().add_method(attr_name.to_string(), method);
        }
        if writer {
            let signature = format!("{attr_name}=");
            let method = Rc::new(Method {
                kind: MethodKind::AttrWriter(ivar_name),
                holder: Rc::downgrade(&class),
                signature: signature.clone(),
            });
            class.borrow_mut().add_method(signature, method);
        }
    }
    Ok(Value::Nil)
}

fn attr_reader(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    define_accessors(&receiver, args, true, false)
}

fn attr_writer(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    define_accessors(&receiver, args, false, true)
}

fn attr_accessor(
    _: &mut Interpreter,
    _: &mut Universe,
    receiver: Value,
    args: &[Value],
    _: Option<&Rc<Block>>,
) -> Result<Value, RuntimeError> {
    define_accessors(&receiver, args, true, true)
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
