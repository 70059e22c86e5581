use tracing::trace;

use crate::{
    bytecode_vm::{
        compiler::{Bytecode, CompilerError, Constant, Opcode, Program},
        indices::{ConstantIndex, Index, LocalIndex},
    },
    domain::ExceptionKind,
    runtime::types::CodeObject,
};

/// A jump target. Created unbound with [`Assembler::label`] and attached to the next instruction
/// with [`Assembler::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label(usize);

/// Builds a [`Program`] one instruction at a time, interning constants and local names and
/// resolving labels into relative jump offsets.
///
/// ```
/// use memphis_gen::{Assembler, Opcode};
///
/// let mut asm = Assembler::with_args("countdown", &["n"]);
/// let top = asm.label();
/// let done = asm.label();
/// asm.bind(top)
///     .load_const(0)
///     .load_fast("n")
///     .emit(Opcode::LessThan)
///     .jump_if_false(done)
///     .load_fast("n")
///     .emit(Opcode::YieldValue)
///     .emit(Opcode::PopTop)
///     .load_fast("n")
///     .load_const(1)
///     .emit(Opcode::Sub)
///     .store_fast("n")
///     .jump(top)
///     .bind(done);
/// let code = asm.finish().unwrap();
/// assert_eq!(code.name(), "countdown");
/// ```
pub struct Assembler {
    name: String,
    filename: String,
    bytecode: Bytecode,
    varnames: Vec<String>,
    arg_count: usize,
    constants: Vec<Constant>,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
    error: Option<CompilerError>,
}

impl Assembler {
    pub fn new(name: &str) -> Self {
        Self::with_args(name, &[])
    }

    /// The named arguments become the first local variables, in order.
    pub fn with_args(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            filename: "<bytecode>".to_string(),
            bytecode: vec![],
            varnames: args.iter().map(|a| a.to_string()).collect(),
            arg_count: args.len(),
            constants: vec![],
            labels: vec![],
            fixups: vec![],
            error: None,
        }
    }

    pub fn filename(&mut self, filename: &str) -> &mut Self {
        self.filename = filename.to_string();
        self
    }

    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Point `label` at the next instruction emitted.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        match self.labels.get_mut(label.0) {
            Some(slot @ None) => *slot = Some(self.bytecode.len()),
            Some(Some(_)) => self.fail(CompilerError::DuplicateLabel(label.0)),
            None => self.fail(CompilerError::UnboundLabel(label.0)),
        }
        self
    }

    fn fail(&mut self, error: CompilerError) {
        self.error.get_or_insert(error);
    }

    pub fn emit(&mut self, opcode: Opcode) -> &mut Self {
        self.bytecode.push(opcode);
        self
    }

    fn emit_jump(&mut self, opcode: Opcode, target: Label) -> &mut Self {
        self.fixups.push((self.bytecode.len(), target));
        self.emit(opcode)
    }

    pub fn constant(&mut self, constant: impl Into<Constant>) -> ConstantIndex {
        let constant = constant.into();
        let index = match self.constants.iter().position(|c| *c == constant) {
            Some(index) => index,
            None => {
                self.constants.push(constant);
                self.constants.len() - 1
            }
        };
        Index::new(index)
    }

    pub fn local(&mut self, name: &str) -> LocalIndex {
        let index = match self.varnames.iter().position(|v| v == name) {
            Some(index) => index,
            None => {
                self.varnames.push(name.to_string());
                self.varnames.len() - 1
            }
        };
        Index::new(index)
    }

    pub fn load_const(&mut self, constant: impl Into<Constant>) -> &mut Self {
        let index = self.constant(constant);
        self.emit(Opcode::LoadConst(index))
    }

    pub fn load_fast(&mut self, name: &str) -> &mut Self {
        let index = self.local(name);
        self.emit(Opcode::LoadFast(index))
    }

    pub fn store_fast(&mut self, name: &str) -> &mut Self {
        let index = self.local(name);
        self.emit(Opcode::StoreFast(index))
    }

    pub fn jump(&mut self, target: Label) -> &mut Self {
        self.emit_jump(Opcode::Jump(0), target)
    }

    pub fn jump_if_false(&mut self, target: Label) -> &mut Self {
        self.emit_jump(Opcode::JumpIfFalse(0), target)
    }

    pub fn for_iter(&mut self, target: Label) -> &mut Self {
        self.emit_jump(Opcode::ForIter(0), target)
    }

    pub fn setup_except(&mut self, handler: Label) -> &mut Self {
        self.emit_jump(Opcode::SetupExcept(0), handler)
    }

    pub fn jump_if_not_exc_match(&mut self, kind: ExceptionKind, target: Label) -> &mut Self {
        self.emit_jump(Opcode::JumpIfNotExcMatch(kind, 0), target)
    }

    /// Resolve every label and produce the finished program.
    pub fn assemble(&self) -> Result<Program, CompilerError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let mut bytecode = self.bytecode.clone();
        for (index, label) in &self.fixups {
            let target = self
                .labels
                .get(label.0)
                .copied()
                .flatten()
                .ok_or(CompilerError::UnboundLabel(label.0))?;
            let offset = target as isize - (*index as isize + 1);
            bytecode[*index] = bytecode[*index].with_offset(offset);
        }

        trace!(name = %self.name, instructions = bytecode.len(), "assembled program");
        Ok(Program {
            bytecode,
            varnames: self.varnames.clone(),
            arg_count: self.arg_count,
            constants: self.constants.clone(),
        })
    }

    /// Assemble into a code object that generators can be created from.
    pub fn finish(&self) -> Result<CodeObject, CompilerError> {
        Ok(CodeObject::new(&self.name, &self.filename, self.assemble()?))
    }
}
