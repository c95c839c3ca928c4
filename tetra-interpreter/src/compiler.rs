use std::rc::Rc;

use tetra_core::ast::{
    AssignTarget, BlockLiteral, Body, ClassDef, Expression, MethodCall, MethodDef, Statement,
};
use tetra_core::bytecode::{Bytecode, CodeUnit, Literal};
use tetra_parser::ParseError;

/// Parse and compile a whole source file into its top-level unit.
pub fn compile_source(source: &str, file: &str) -> Result<Rc<CodeUnit>, ParseError> {
    let program = tetra_parser::parse(source)?;
    Ok(compile_program(&program, file))
}

/// Compile a parsed program into its top-level unit.
pub fn compile_program(program: &Body, file: &str) -> Rc<CodeUnit> {
    let mut gen = CodeGen::new("<main>", Vec::new(), Rc::from(file), Vec::new(), Vec::new());
    gen.compile_body_value(program);
    gen.emit(Bytecode::Return);
    Rc::new(gen.finish())
}

fn compile_method(def: &MethodDef, file: Rc<str>, lexical_scopes: Vec<String>) -> Rc<CodeUnit> {
    let mut gen = CodeGen::new(&def.name, def.params.clone(), file, lexical_scopes, Vec::new());
    gen.line = def.line;
    gen.compile_body_value(&def.body);
    gen.emit(Bytecode::Return);
    Rc::new(gen.finish())
}

fn compile_class_body(def: &ClassDef, file: Rc<str>, lexical_scopes: Vec<String>) -> Rc<CodeUnit> {
    let name = format!("<class:{}>", def.name);
    let mut gen = CodeGen::new(&name, Vec::new(), file, lexical_scopes, Vec::new());
    gen.line = def.line;
    gen.compile_body_value(&def.body);
    gen.emit(Bytecode::Return);
    Rc::new(gen.finish())
}

fn compile_block(
    block: &BlockLiteral,
    file: Rc<str>,
    lexical_scopes: Vec<String>,
    enclosing_locals: Vec<Vec<String>>,
    line: u32,
) -> Rc<CodeUnit> {
    let mut gen = CodeGen::new(
        "<block>",
        block.params.clone(),
        file,
        lexical_scopes,
        enclosing_locals,
    );
    gen.line = line;
    gen.compile_body_value(&block.body);
    gen.emit(Bytecode::Return);
    Rc::new(gen.finish())
}

struct CodeGen {
    name: String,
    params: Vec<String>,
    /// Local slot names; parameters occupy the first slots.
    locals: Vec<String>,
    literals: Vec<Literal>,
    body: Vec<Bytecode>,
    lines: Vec<u32>,
    file: Rc<str>,
    lexical_scopes: Vec<String>,
    /// Local names of the enclosing scopes, innermost first; non-empty only
    /// for block units.
    enclosing_locals: Vec<Vec<String>>,
    /// The source line attributed to emitted instructions; updated as
    /// line-bearing nodes are compiled.
    line: u32,
}

impl CodeGen {
    fn new(
        name: &str,
        params: Vec<String>,
        file: Rc<str>,
        lexical_scopes: Vec<String>,
        enclosing_locals: Vec<Vec<String>>,
    ) -> CodeGen {
        CodeGen {
            name: name.to_string(),
            locals: params.clone(),
            params,
            literals: Vec::new(),
            body: Vec::new(),
            lines: Vec::new(),
            file,
            lexical_scopes,
            enclosing_locals,
            line: 1,
        }
    }

    fn finish(self) -> CodeUnit {
        CodeUnit {
            name: self.name,
            params: self.params,
            nbr_locals: self.locals.len(),
            literals: self.literals,
            body: self.body,
            lines: self.lines,
            file: self.file,
            lexical_scopes: self.lexical_scopes,
        }
    }

    fn emit(&mut self, bytecode: Bytecode) {
        self.body.push(bytecode);
        self.lines.push(self.line);
    }

    fn here(&self) -> u16 {
        self.body.len() as u16
    }

    /// Emit a placeholder jump to be patched once the target is known.
    fn emit_placeholder(&mut self) -> usize {
        self.emit(Bytecode::Jump(u16::MAX));
        self.body.len() - 1
    }

    fn patch(&mut self, at: usize, bytecode: Bytecode) {
        self.body[at] = bytecode;
    }

    fn literal(&mut self, literal: Literal) -> u16 {
        // Code literals are always distinct; plain literals are deduplicated.
        if !matches!(literal, Literal::Code(_)) {
            if let Some(idx) = self.literals.iter().position(|known| known == &literal) {
                return idx as u16;
            }
        }
        self.literals.push(literal);
        (self.literals.len() - 1) as u16
    }

    fn string_literal(&mut self, value: &str) -> u16 {
        self.literal(Literal::String(Rc::from(value)))
    }

    fn resolve_local(&self, name: &str) -> Option<(u8, u8)> {
        if let Some(idx) = self.locals.iter().position(|local| local == name) {
            return Some((0, idx as u8));
        }
        for (depth, scope) in self.enclosing_locals.iter().enumerate() {
            if let Some(idx) = scope.iter().position(|local| local == name) {
                return Some((depth as u8 + 1, idx as u8));
            }
        }
        None
    }

    /// Resolve a local for assignment, defining it in this scope on first use.
    fn define_local(&mut self, name: &str) -> (u8, u8) {
        if let Some(found) = self.resolve_local(name) {
            return found;
        }
        self.locals.push(name.to_string());
        (0, (self.locals.len() - 1) as u8)
    }

    /// Compile a body so that exactly one value (the last statement's, or NIL
    /// when empty) is left on the stack.
    fn compile_body_value(&mut self, body: &Body) {
        if body.statements.is_empty() {
            self.emit(Bytecode::PushNil);
            return;
        }
        let last = body.statements.len() - 1;
        for (idx, statement) in body.statements.iter().enumerate() {
            self.compile_statement(statement);
            if idx != last {
                self.emit(Bytecode::Pop);
            }
        }
    }

    /// Compile a statement; every statement leaves exactly one value.
    fn compile_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression(expression) => self.compile_expression(expression),
            Statement::Return { value, line } => {
                self.line = *line;
                match value {
                    Some(expression) => self.compile_expression(expression),
                    None => self.emit(Bytecode::PushNil),
                }
                self.emit(Bytecode::Return);
                // Unreachable; keeps the one-value-per-statement discipline.
                self.emit(Bytecode::PushNil);
            }
            Statement::MethodDef(def) => {
                self.line = def.line;
                let code = compile_method(def, self.file.clone(), self.lexical_scopes.clone());
                let body_idx = self.literal(Literal::Code(code));
                let name_idx = self.string_literal(&def.name);
                if def.is_singleton {
                    self.emit(Bytecode::DefSelfMethod(name_idx, body_idx));
                } else {
                    self.emit(Bytecode::DefMethod(name_idx, body_idx));
                }
            }
            Statement::ClassDef(def) => {
                self.line = def.line;
                self.emit(Bytecode::PushSelf);
                if let Some(super_class) = &def.super_class {
                    self.compile_expression(super_class);
                }
                let qualified = match self.lexical_scopes.first() {
                    Some(outer) => format!("{outer}::{}", def.name),
                    None => def.name.clone(),
                };
                let mut body_lexical = Vec::with_capacity(self.lexical_scopes.len() + 1);
                body_lexical.push(qualified);
                body_lexical.extend(self.lexical_scopes.iter().cloned());
                let code = compile_class_body(def, self.file.clone(), body_lexical);
                let body_idx = self.literal(Literal::Code(code));
                let name_idx = self.string_literal(&def.name);
                self.line = def.line;
                self.emit(Bytecode::DefClass {
                    name: name_idx,
                    body: body_idx,
                    is_module: def.is_module,
                    has_superclass: def.super_class.is_some(),
                });
            }
        }
    }

    fn compile_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Integer(value) => {
                let idx = self.literal(Literal::Integer(*value));
                self.emit(Bytecode::PushConstant(idx));
            }
            Expression::Str(value) => {
                let idx = self.string_literal(value);
                self.emit(Bytecode::PushConstant(idx));
            }
            Expression::Boolean(value) => self.emit(Bytecode::PushBoolean(*value)),
            Expression::Nil => self.emit(Bytecode::PushNil),
            Expression::SelfRef => self.emit(Bytecode::PushSelf),
            Expression::Identifier { name, line } => {
                self.line = *line;
                match self.resolve_local(name) {
                    Some((up_idx, idx)) => self.emit(Bytecode::PushLocal(up_idx, idx)),
                    None => {
                        // Not a known local: a zero-argument send to self.
                        let name_idx = self.string_literal(name);
                        self.emit(Bytecode::PushSelf);
                        self.emit(Bytecode::Send(name_idx, 0, None));
                    }
                }
            }
            Expression::InstanceVariable(name) => {
                let name_idx = self.string_literal(name);
                self.emit(Bytecode::PushInstVar(name_idx));
            }
            Expression::Constant { name, line } => {
                self.line = *line;
                let name_idx = self.string_literal(name);
                self.emit(Bytecode::GetConstant(name_idx));
            }
            Expression::ScopedConstant { scope, name, line } => {
                self.compile_expression(scope);
                self.line = *line;
                let name_idx = self.string_literal(name);
                self.emit(Bytecode::GetScopedConstant(name_idx));
            }
            Expression::Assign { target, value } => self.compile_assignment(target, value),
            Expression::Call(call) => self.compile_call(call),
            Expression::Yield { args, line } => {
                for arg in args {
                    self.compile_expression(arg);
                }
                self.line = *line;
                self.emit(Bytecode::InvokeBlock(args.len() as u8));
            }
            Expression::Array(elements) => {
                for element in elements {
                    self.compile_expression(element);
                }
                self.emit(Bytecode::NewArray(elements.len() as u16));
            }
            Expression::Hash(entries) => {
                for (key, value) in entries {
                    let key_idx = self.string_literal(key);
                    self.emit(Bytecode::PushConstant(key_idx));
                    self.compile_expression(value);
                }
                self.emit(Bytecode::NewHash(entries.len() as u16));
            }
            Expression::Range { start, end } => {
                self.compile_expression(start);
                self.compile_expression(end);
                self.emit(Bytecode::NewRange);
            }
            Expression::And(left, right) => {
                self.compile_expression(left);
                self.emit(Bytecode::Dup);
                let short_circuit = self.emit_placeholder();
                self.emit(Bytecode::Pop);
                self.compile_expression(right);
                let target = self.here();
                self.patch(short_circuit, Bytecode::JumpOnFalsePop(target));
            }
            Expression::Or(left, right) => {
                self.compile_expression(left);
                self.emit(Bytecode::Dup);
                let short_circuit = self.emit_placeholder();
                self.emit(Bytecode::Pop);
                self.compile_expression(right);
                let target = self.here();
                self.patch(short_circuit, Bytecode::JumpOnTruePop(target));
            }
            Expression::If {
                condition,
                then_body,
                else_body,
            } => {
                self.compile_expression(condition);
                let to_else = self.emit_placeholder();
                self.compile_body_value(then_body);
                let to_end = self.emit_placeholder();
                let else_target = self.here();
                self.patch(to_else, Bytecode::JumpOnFalsePop(else_target));
                match else_body {
                    Some(body) => self.compile_body_value(body),
                    None => self.emit(Bytecode::PushNil),
                }
                let end = self.here();
                self.patch(to_end, Bytecode::Jump(end));
            }
            Expression::While { condition, body } => {
                let start = self.here();
                self.compile_expression(condition);
                let to_end = self.emit_placeholder();
                self.compile_body_value(body);
                self.emit(Bytecode::Pop);
                self.emit(Bytecode::Jump(start));
                let end = self.here();
                self.patch(to_end, Bytecode::JumpOnFalsePop(end));
                self.emit(Bytecode::PushNil);
            }
        }
    }

    fn compile_assignment(&mut self, target: &AssignTarget, value: &Expression) {
        match target {
            AssignTarget::Local(name) => {
                self.compile_expression(value);
                let (up_idx, idx) = self.define_local(name);
                self.emit(Bytecode::SetLocal(up_idx, idx));
            }
            AssignTarget::InstanceVariable(name) => {
                self.compile_expression(value);
                let name_idx = self.string_literal(name);
                self.emit(Bytecode::SetInstVar(name_idx));
            }
            AssignTarget::Constant(name) => {
                self.compile_expression(value);
                let name_idx = self.string_literal(name);
                self.emit(Bytecode::SetConstant(name_idx));
            }
            AssignTarget::Index {
                receiver,
                index,
                line,
            } => {
                self.compile_expression(receiver);
                self.compile_expression(index);
                self.compile_expression(value);
                self.line = *line;
                let name_idx = self.string_literal("[]=");
                self.emit(Bytecode::Send(name_idx, 2, None));
            }
        }
    }

    fn compile_call(&mut self, call: &MethodCall) {
        match &call.receiver {
            Some(receiver) => self.compile_expression(receiver),
            None => self.emit(Bytecode::PushSelf),
        }
        for arg in &call.args {
            self.compile_expression(arg);
        }
        let block_idx = call.block.as_ref().map(|block| {
            let mut enclosing = Vec::with_capacity(self.enclosing_locals.len() + 1);
            enclosing.push(self.locals.clone());
            enclosing.extend(self.enclosing_locals.iter().cloned());
            let code = compile_block(
                block,
                self.file.clone(),
                self.lexical_scopes.clone(),
                enclosing,
                call.line,
            );
            self.literal(Literal::Code(code))
        });
        let name_idx = self.string_literal(&call.name);
        self.line = call.line;
        self.emit(Bytecode::Send(name_idx, call.args.len() as u8, block_idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_resolve_through_block_scopes() {
        let unit = compile_source("fifty = 50\nrun { |h| h + fifty }", "test.tet").unwrap();
        assert_eq!(unit.nbr_locals, 1);

        let block = unit
            .literals
            .iter()
            .find_map(|literal| match literal {
                Literal::Code(code) => Some(code.clone()),
                _ => None,
            })
            .expect("block literal not compiled");
        assert_eq!(block.params, vec!["h".to_string()]);
        // `h` is the block's own slot 0; `fifty` lives one scope up.
        assert!(block.body.contains(&Bytecode::PushLocal(0, 0)));
        assert!(block.body.contains(&Bytecode::PushLocal(1, 0)));
    }

    #[test]
    fn statements_pop_all_but_the_last_value(){
        let unit = compile_source("1\n2", "test.tet").unwrap();
        assert_eq!(
            unit.body,
            vec![
                Bytecode::PushConstant(0),
                Bytecode::Pop,
                Bytecode::PushConstant(1),
                Bytecode::Return,
            ],
        );
    }

    #[test]
    fn bare_identifier_compiles_to_a_self_send() {
        let unit = compile_source("foo", "test.tet").unwrap();
        assert_eq!(
            unit.body,
            vec![
                Bytecode::PushSelf,
                Bytecode::Send(0, 0, None),
                Bytecode::Return,
            ],
        );
    }

    #[test]
    fn class_bodies_record_their_lexical_scope() {
        let unit = compile_source("class A\nclass B\nend\nend", "test.tet").unwrap();
        let class_a = match &unit.literals[0] {
            Literal::Code(code) => code.clone(),
            other => panic!("expected a code literal, got {other:?}"),
        };
        assert_eq!(class_a.lexical_scopes, vec!["A".to_string()]);
        let class_b = class_a
            .literals
            .iter()
            .find_map(|literal| match literal {
                Literal::Code(code) => Some(code.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            class_b.lexical_scopes,
            vec!["A::B".to_string(), "A".to_string()],
        );
    }
}
