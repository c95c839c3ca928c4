//!
//! Common types for the Tetra language.
//!
//! This crate defines the data exchanged between the front end and the
//! interpreter: the AST produced by the parser and the compiled-unit format
//! (instructions, constant pool, line table) consumed by the evaluator.
//!

/// The abstract syntax tree produced by the parser.
pub mod ast;
/// The bytecode instruction set and compiled-unit format.
pub mod bytecode;
