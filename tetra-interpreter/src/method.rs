use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tetra_core::bytecode::CodeUnit;

use crate::class::Class;
use crate::primitives::PrimitiveFn;
use crate::TetraRef;

/// The kind of a class method.
#[derive(Clone)]
pub enum MethodKind {
    /// A user-defined method compiled to bytecode.
    Defined(Rc<CodeUnit>),
    /// An interpreter primitive.
    Primitive(PrimitiveFn),
    /// A reader generated by `attr_reader`/`attr_accessor`; holds the
    /// `@`-prefixed variable name.
    AttrReader(String),
    /// A writer generated by `attr_writer`/`attr_accessor`.
    AttrWriter(String),
}

impl MethodKind {
    /// Whether this invocable is a primitive.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }
}

/// Represents a class method.
#[derive(Clone)]
pub struct Method {
    pub kind: MethodKind,
    /// The class this method was defined in. Weak: classes own their methods.
    pub holder: Weak<RefCell<Class>>,
    pub signature: String,
}

impl Method {
    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    pub fn holder(&self) -> Option<TetraRef<Class>> {
        self.holder.upgrade()
    }

    pub fn signature(&self) -> &str {
        self.signature.as_str()
    }

    /// Whether this invocable is a primitive.
    pub fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let holder = self
            .holder()
            .map(|class| class.borrow().name.clone())
            .unwrap_or_else(|| "?".to_string());
        write!(f, "#{}>>#{}", holder, self.signature)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            MethodKind::Defined(_) => "defined",
            MethodKind::Primitive(_) => "primitive",
            MethodKind::AttrReader(_) => "attr_reader",
            MethodKind::AttrWriter(_) => "attr_writer",
        };
        f.debug_struct("Method")
            .field("signature", &self.signature)
            .field("kind", &kind)
            .finish()
    }
}
