//!
//! This is the interpreter for the Tetra language.
//!

use std::cell::RefCell;
use std::rc::Rc;

/// Executable blocks attached to message sends.
pub mod block;
/// Facilities for manipulating classes.
pub mod class;
/// Facilities for compiling code into bytecode.
pub mod compiler;
/// Typed runtime errors.
pub mod error;
/// Call frames and local scopes.
pub mod frame;
/// Facilities for manipulating class instances.
pub mod instance;
/// The interpreter's main data structure.
pub mod interpreter;
/// Facilities for manipulating class methods.
pub mod method;
/// Definitions for all supported primitives.
pub mod primitives;
/// The collection of all known Tetra objects during execution.
pub mod universe;
/// Facilities for manipulating values.
pub mod value;

/// A shared mutable reference to a runtime object.
pub type TetraRef<T> = Rc<RefCell<T>>;
