//! Hand-assembled generator bodies shared by the VM tests. Each one notes the Python it stands for.

use crate::{
    bytecode_vm::{compiler::Constant, Assembler, Opcode},
    domain::ExceptionKind,
    runtime::types::CodeObject,
};

/// ```python
/// def counter(n):
///     i = 0
///     while i < n:
///         yield i
///         i = i + 1
///     return i
/// ```
pub fn counter() -> CodeObject {
    let mut asm = Assembler::with_args("counter", &["n"]);
    let top = asm.label();
    let done = asm.label();
    asm.load_const(0)
        .store_fast("i")
        .bind(top)
        .load_fast("i")
        .load_fast("n")
        .emit(Opcode::LessThan)
        .jump_if_false(done)
        .load_fast("i")
        .emit(Opcode::YieldValue)
        .emit(Opcode::PopTop)
        .load_fast("i")
        .load_const(1)
        .emit(Opcode::Add)
        .store_fast("i")
        .jump(top)
        .bind(done)
        .load_fast("i")
        .emit(Opcode::ReturnValue);
    asm.finish().expect("counter assembles")
}

/// ```python
/// def echo():
///     x = 0
///     while True:
///         x = yield x
/// ```
pub fn echo() -> CodeObject {
    let mut asm = Assembler::new("echo");
    let top = asm.label();
    asm.load_const(0)
        .store_fast("x")
        .bind(top)
        .load_fast("x")
        .emit(Opcode::YieldValue)
        .store_fast("x")
        .jump(top);
    asm.finish().expect("echo assembles")
}

/// ```python
/// def catcher():
///     try:
///         yield 1
///     except ValueError:
///         yield 2
/// ```
pub fn catcher() -> CodeObject {
    let mut asm = Assembler::new("catcher");
    let handler = asm.label();
    let reraise = asm.label();
    let end = asm.label();
    asm.setup_except(handler)
        .load_const(1)
        .emit(Opcode::YieldValue)
        .emit(Opcode::PopTop)
        .emit(Opcode::PopBlock)
        .jump(end)
        .bind(handler)
        .jump_if_not_exc_match(ExceptionKind::ValueError, reraise)
        .emit(Opcode::PopTop)
        .load_const(2)
        .emit(Opcode::YieldValue)
        .emit(Opcode::PopTop)
        .jump(end)
        .bind(reraise)
        .emit(Opcode::Raise)
        .bind(end)
        .load_const(Constant::None)
        .emit(Opcode::ReturnValue);
    asm.finish().expect("catcher assembles")
}

/// ```python
/// def delegate(it):
///     return (yield from it)
/// ```
pub fn delegate() -> CodeObject {
    let mut asm = Assembler::with_args("delegate", &["it"]);
    asm.load_fast("it")
        .emit(Opcode::YieldFrom)
        .emit(Opcode::ReturnValue);
    asm.finish().expect("delegate assembles")
}

/// Appends every item to the closure list before yielding it.
///
/// ```python
/// def collector(source):
///     for item in source:
///         sink.append(item)
///         yield item
/// ```
pub fn collector() -> CodeObject {
    let mut asm = Assembler::with_args("collector", &["source"]);
    let top = asm.label();
    let done = asm.label();
    asm.load_fast("source")
        .emit(Opcode::GetIter)
        .bind(top)
        .for_iter(done)
        .store_fast("item")
        .emit(Opcode::LoadClosure)
        .load_fast("item")
        .emit(Opcode::ListAppend)
        .load_fast("item")
        .emit(Opcode::YieldValue)
        .emit(Opcode::PopTop)
        .jump(top)
        .bind(done)
        .load_const(Constant::None)
        .emit(Opcode::ReturnValue);
    asm.finish().expect("collector assembles")
}

/// ```python
/// def stubborn():
///     while True:
///         try:
///             yield 1
///         except BaseException:
///             pass
/// ```
pub fn stubborn() -> CodeObject {
    let mut asm = Assembler::new("stubborn");
    let top = asm.label();
    let handler = asm.label();
    asm.bind(top)
        .setup_except(handler)
        .load_const(1)
        .emit(Opcode::YieldValue)
        .emit(Opcode::PopTop)
        .emit(Opcode::PopBlock)
        .jump(top)
        .bind(handler)
        .emit(Opcode::PopTop)
        .jump(top);
    asm.finish().expect("stubborn assembles")
}
