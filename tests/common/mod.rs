#![allow(dead_code)]

use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
    sync::Once,
};

use memphis_gen::{
    Assembler, CodeObject, Constant, Exception, ExceptionKind, Frame, FrameOutcome, Generator,
    Iterable, Opcode, Value, VmResult,
};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route library logs to the test output. Set `RUST_LOG=memphis_gen=trace` to see them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An in-memory diagnostic stream that can be inspected after handing a clone to a thread state.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).to_string()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Iterates over its items, but raises `ValueError` from `close()`.
pub struct Refusing(pub Vec<Value>);

impl Iterable for Refusing {
    fn type_name(&self) -> &str {
        "refusing"
    }

    fn next(&mut self) -> VmResult<Option<Value>> {
        Ok(if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        })
    }

    fn close(&mut self) -> Option<VmResult<Value>> {
        Some(Err(Exception::value_error("close refused")))
    }
}

pub fn collect(generator: &Rc<Generator>) -> Vec<Value> {
    let mut items = vec![];
    while let Some(item) = generator.dunder_next().expect("generator raised") {
        items.push(item);
    }
    items
}

/// The same generator functions, provided by different implementations.
pub trait GeneratorBackend {
    /// `def counter(n): i = 0; while i < n: yield i; i += 1; return i`
    fn counter(&self) -> CodeObject;
    /// `def echo(): x = 0; while True: x = yield x`
    fn echo(&self) -> CodeObject;
    /// `def catcher(): try: yield 1; except ValueError: yield 2`
    fn catcher(&self) -> CodeObject;
    /// `def delegate(it): return (yield from it)`
    fn delegate(&self) -> CodeObject;
    /// `def guarded_delegate(it): try: yield from it; except GeneratorExit: yield "ignored"`
    fn guarded_delegate(&self) -> CodeObject;
}

pub struct BytecodeBackend;

impl GeneratorBackend for BytecodeBackend {
    fn counter(&self) -> CodeObject {
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
        asm.finish().unwrap()
    }

    fn echo(&self) -> CodeObject {
        let mut asm = Assembler::new("echo");
        let top = asm.label();
        asm.load_const(0)
            .store_fast("x")
            .bind(top)
            .load_fast("x")
            .emit(Opcode::YieldValue)
            .store_fast("x")
            .jump(top);
        asm.finish().unwrap()
    }

    fn catcher(&self) -> CodeObject {
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
        asm.finish().unwrap()
    }

    fn delegate(&self) -> CodeObject {
        let mut asm = Assembler::with_args("delegate", &["it"]);
        asm.load_fast("it")
            .emit(Opcode::YieldFrom)
            .emit(Opcode::ReturnValue);
        asm.finish().unwrap()
    }

    fn guarded_delegate(&self) -> CodeObject {
        let mut asm = Assembler::with_args("guarded_delegate", &["it"]);
        let handler = asm.label();
        let reraise = asm.label();
        asm.setup_except(handler)
            .load_fast("it")
            .emit(Opcode::YieldFrom)
            .emit(Opcode::PopTop)
            .emit(Opcode::PopBlock)
            .load_const(Constant::None)
            .emit(Opcode::ReturnValue)
            .bind(handler)
            .jump_if_not_exc_match(ExceptionKind::GeneratorExit, reraise)
            .emit(Opcode::PopTop)
            .load_const("ignored")
            .emit(Opcode::YieldValue)
            .emit(Opcode::PopTop)
            .load_const(Constant::None)
            .emit(Opcode::ReturnValue)
            .bind(reraise)
            .emit(Opcode::Raise);
        asm.finish().unwrap()
    }
}

/// The same bodies written directly against the frame, the way an embedder would.
pub struct NativeBackend;

fn int_local(locals: &[Value], index: usize) -> Result<i64, Exception> {
    locals
        .get(index)
        .and_then(Value::as_int)
        .ok_or_else(|| Exception::type_error("expected an int"))
}

impl GeneratorBackend for NativeBackend {
    fn counter(&self) -> CodeObject {
        CodeObject::from_fn("counter", "<native>", |_, frame, _, pending| {
            if let Some(e) = pending {
                frame.mark_finished();
                return Err(e);
            }
            if frame.is_started() {
                let i = int_local(&frame.locals, 1)?;
                frame.locals[1] = Value::Int(i + 1);
            } else {
                frame.locals.push(Value::Int(0));
            }

            let n = int_local(&frame.locals, 0)?;
            let i = int_local(&frame.locals, 1)?;
            if i < n {
                frame.last_instruction = 1;
                Ok(FrameOutcome::Yielded(Value::Int(i)))
            } else {
                frame.mark_finished();
                Ok(FrameOutcome::Returned(Value::Int(i)))
            }
        })
    }

    fn echo(&self) -> CodeObject {
        CodeObject::from_fn("echo", "<native>", |_, frame, _, pending| {
            if let Some(e) = pending {
                frame.mark_finished();
                return Err(e);
            }
            if frame.is_started() {
                let input = frame.take_generator_input();
                frame.locals[0] = input;
            } else {
                frame.locals = vec![Value::Int(0)];
            }
            frame.last_instruction = 1;
            Ok(FrameOutcome::Yielded(frame.locals[0].clone()))
        })
    }

    fn catcher(&self) -> CodeObject {
        CodeObject::from_fn("catcher", "<native>", |_, frame, _, pending| {
            match (frame.last_instruction, pending) {
                (0, None) => {
                    frame.last_instruction = 1;
                    Ok(FrameOutcome::Yielded(Value::Int(1)))
                }
                (1, Some(e)) if e.matches(ExceptionKind::ValueError) => {
                    frame.last_instruction = 2;
                    Ok(FrameOutcome::Yielded(Value::Int(2)))
                }
                (_, Some(e)) => {
                    frame.mark_finished();
                    Err(e)
                }
                (_, None) => {
                    frame.mark_finished();
                    Ok(FrameOutcome::Returned(Value::None))
                }
            }
        })
    }

    fn delegate(&self) -> CodeObject {
        CodeObject::from_fn("delegate", "<native>", |_, frame, _, pending| {
            if let Some(e) = pending {
                frame.mark_finished();
                return Err(e);
            }
            if frame.last_instruction == 2 {
                frame.mark_finished();
                return Ok(FrameOutcome::Returned(frame.take_delegation_result()));
            }
            delegation_step(frame)
        })
    }

    fn guarded_delegate(&self) -> CodeObject {
        CodeObject::from_fn("guarded_delegate", "<native>", |_, frame, _, pending| {
            match (frame.last_instruction, pending) {
                (1, Some(e)) if e.matches(ExceptionKind::GeneratorExit) => {
                    frame.yield_from = None;
                    frame.last_instruction = 3;
                    Ok(FrameOutcome::Yielded(Value::from("ignored")))
                }
                (_, Some(e)) => {
                    frame.mark_finished();
                    Err(e)
                }
                (0 | 1, None) => delegation_step(frame),
                (_, None) => {
                    frame.mark_finished();
                    Ok(FrameOutcome::Returned(Value::None))
                }
            }
        })
    }
}

/// One step of `yield from locals[0]`, suspended at instruction 1 while the delegate runs.
fn delegation_step(frame: &mut Frame) -> VmResult<FrameOutcome> {
    let inner = match frame.yield_from.clone() {
        Some(inner) => inner,
        None => {
            let inner = memphis_gen::get_iter(&frame.locals[0])?;
            frame.yield_from = Some(inner.clone());
            inner
        }
    };
    frame.last_instruction = 1;
    let sent = frame.take_generator_input();
    let step = match &inner {
        Value::Generator(generator) => generator.send(sent).map(Some),
        Value::Iterator(iterator) => iterator.borrow_mut().send(sent),
        _ => Err(Exception::type_error("not an iterator")),
    };
    match step {
        Ok(Some(value)) => Ok(FrameOutcome::Yielded(value)),
        Ok(None) => Ok(FrameOutcome::InnerExhausted(Value::None)),
        Err(e) if e.kind() == ExceptionKind::StopIteration => {
            Ok(FrameOutcome::InnerExhausted(e.stop_value()))
        }
        Err(e) => {
            frame.yield_from = None;
            frame.mark_finished();
            Err(e)
        }
    }
}
