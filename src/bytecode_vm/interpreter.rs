use std::mem;

use tracing::{debug, trace};

use crate::{
    bytecode_vm::compiler::{Opcode, Program, SignedOffset},
    domain::{ExceptionKind, ToDebugStackFrame},
    runtime::{
        get_iter,
        types::{Executable, Frame, FrameOutcome, HandlerBlock},
        Exception, ThreadState, Value, VmResult,
    },
};

impl Executable for Program {
    fn run(
        &self,
        _state: &ThreadState,
        frame: &mut Frame,
        closure: &Value,
        pending: Option<Exception>,
    ) -> VmResult<FrameOutcome> {
        let pc = usize::try_from(frame.last_instruction)
            .map_err(|_| Exception::system_error("cannot resume a finished frame"))?;
        let sent = frame.take_generator_input();
        Interpreter {
            program: self,
            frame,
            closure,
            pc,
            sent,
        }
        .resume(pending)
    }
}

/// What a delegation target did with a sent value.
enum Delegated {
    Yielded(Value),
    Finished(Value),
}

/// One resumption of a frame. The value stack, handler blocks and locals live in the frame, so
/// suspending only needs to record the resume point.
struct Interpreter<'a> {
    program: &'a Program,
    frame: &'a mut Frame,
    closure: &'a Value,
    pc: usize,
    /// The value sent by the caller, consumed by whichever instruction receives it.
    sent: Value,
}

impl Interpreter<'_> {
    fn resume(mut self, pending: Option<Exception>) -> VmResult<FrameOutcome> {
        match pending {
            Some(exception) => self.unwind(exception)?,
            None => self.push_resume_value(),
        }

        loop {
            let Some(opcode) = self.program.bytecode.get(self.pc).copied() else {
                return Ok(self.finish(Value::None));
            };
            trace!(pc = self.pc, %opcode, "executing");
            self.pc += 1;

            match self.execute(opcode) {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {}
                Err(exception) => self.unwind(exception)?,
            }
        }
    }

    /// Produce the value of the expression the frame was suspended in.
    fn push_resume_value(&mut self) {
        if self.pc == 0 || self.is_delegating() {
            return;
        }
        match self.program.bytecode.get(self.pc - 1) {
            Some(Opcode::YieldValue) => {
                let sent = mem::take(&mut self.sent);
                self.frame.stack.push(sent);
            }
            Some(Opcode::YieldFrom) => {
                let result = self.frame.take_delegation_result();
                self.frame.stack.push(result);
            }
            _ => {}
        }
    }

    fn is_delegating(&self) -> bool {
        self.frame.yield_from.is_some()
            && matches!(self.program.bytecode.get(self.pc), Some(Opcode::YieldFrom))
    }

    fn execute(&mut self, opcode: Opcode) -> VmResult<Option<FrameOutcome>> {
        match opcode {
            Opcode::LoadConst(index) => {
                let program = self.program;
                let constant = program
                    .constants
                    .get(*index)
                    .ok_or_else(|| Exception::system_error("constant index out of range"))?;
                self.push(constant.into());
            }
            Opcode::LoadFast(index) => {
                let value = self.frame.locals.get(*index).cloned().ok_or_else(|| {
                    Exception::name_error(&format!(
                        "local variable '{}' referenced before assignment",
                        self.program.varname(*index)
                    ))
                })?;
                self.push(value);
            }
            Opcode::StoreFast(index) => {
                let value = self.pop()?;
                if *index >= self.frame.locals.len() {
                    self.frame.locals.resize(*index + 1, Value::None);
                }
                self.frame.locals[*index] = value;
            }
            Opcode::LoadClosure => self.push(self.closure.clone()),
            Opcode::PopTop => {
                self.pop()?;
            }
            Opcode::Add => self.binary_op(add)?,
            Opcode::Sub => self.binary_op(sub)?,
            Opcode::LessThan => self.binary_op(less_than)?,
            Opcode::Jump(offset) => self.jump(offset)?,
            Opcode::JumpIfFalse(offset) => {
                if !self.pop()?.is_truthy() {
                    self.jump(offset)?;
                }
            }
            Opcode::GetIter => {
                let iterable = self.pop()?;
                self.push(get_iter(&iterable)?);
            }
            Opcode::ForIter(offset) => {
                let iterator = self.peek()?.clone();
                match next_item(&iterator)? {
                    Some(item) => self.push(item),
                    None => {
                        self.pop()?;
                        self.jump(offset)?;
                    }
                }
            }
            Opcode::ListAppend => {
                let item = self.pop()?;
                match self.pop()? {
                    Value::List(list) => list.borrow_mut().push(item),
                    other => return Err(Exception::attribute_error(&other.type_name(), "append")),
                }
            }
            Opcode::YieldValue => {
                let value = self.pop()?;
                self.frame.last_instruction = self.pc as isize;
                return Ok(Some(FrameOutcome::Yielded(value)));
            }
            Opcode::YieldFrom => return self.yield_from().map(Some),
            Opcode::SetupExcept(offset) => {
                let handler = self.target(offset)?;
                let stack_depth = self.frame.stack.len();
                self.frame.blocks.push(HandlerBlock {
                    handler,
                    stack_depth,
                });
            }
            Opcode::PopBlock => {
                self.frame.blocks.pop();
            }
            Opcode::JumpIfNotExcMatch(kind, offset) => {
                let matched = self
                    .peek()?
                    .as_exception()
                    .is_some_and(|exception| exception.matches(kind));
                if !matched {
                    self.jump(offset)?;
                }
            }
            Opcode::Raise => {
                let raised = self.pop()?;
                let exception = match Exception::normalize(&raised, None) {
                    Ok(exception) | Err(exception) => exception,
                };
                return Err(exception);
            }
            Opcode::ReturnValue => {
                let value = self.pop()?;
                return Ok(Some(self.finish(value)));
            }
        }

        Ok(None)
    }

    /// Delegate to the iterator of a `yield from`. The resume point stays on this instruction
    /// until the iterator is exhausted.
    fn yield_from(&mut self) -> VmResult<FrameOutcome> {
        let inner = match self.frame.yield_from.clone() {
            Some(inner) => inner,
            None => {
                let iterable = self.pop()?;
                let inner = get_iter(&iterable)?;
                debug!(delegate = %inner, "starting delegation");
                self.frame.yield_from = Some(inner.clone());
                inner
            }
        };
        self.frame.last_instruction = (self.pc - 1) as isize;

        let sent = mem::take(&mut self.sent);
        match send_into(&inner, sent) {
            Ok(Delegated::Yielded(value)) => Ok(FrameOutcome::Yielded(value)),
            Ok(Delegated::Finished(result)) => Ok(FrameOutcome::InnerExhausted(result)),
            Err(exception) => {
                self.frame.yield_from = None;
                Err(exception)
            }
        }
    }

    /// Hand `exception` to the innermost handler, or finish the frame if there is none.
    fn unwind(&mut self, mut exception: Exception) -> VmResult<()> {
        match self.frame.blocks.pop() {
            Some(block) => {
                trace!(handler = block.handler, exception = %exception, "handling exception");
                self.frame.stack.truncate(block.stack_depth);
                self.frame.stack.push(Value::from(exception));
                self.pc = block.handler;
                Ok(())
            }
            None => {
                self.frame.last_instruction = self.pc.saturating_sub(1) as isize;
                exception.push_stack_frame(self.frame.to_stack_frame());
                self.frame.stack.clear();
                self.frame.mark_finished();
                Err(exception)
            }
        }
    }

    fn finish(&mut self, value: Value) -> FrameOutcome {
        self.frame.mark_finished();
        self.frame.blocks.clear();
        self.frame.stack.clear();
        FrameOutcome::Returned(value)
    }

    fn push(&mut self, value: Value) {
        self.frame.stack.push(value);
    }

    fn pop(&mut self) -> VmResult<Value> {
        self.frame
            .stack
            .pop()
            .ok_or_else(|| Exception::system_error("pop from an empty value stack"))
    }

    fn peek(&self) -> VmResult<&Value> {
        self.frame
            .stack
            .last()
            .ok_or_else(|| Exception::system_error("empty value stack"))
    }

    fn binary_op(&mut self, op: fn(Value, Value) -> VmResult<Value>) -> VmResult<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(op(left, right)?);
        Ok(())
    }

    fn target(&self, offset: SignedOffset) -> VmResult<usize> {
        usize::try_from(self.pc as isize + offset)
            .map_err(|_| Exception::system_error("jump before the start of the bytecode"))
    }

    fn jump(&mut self, offset: SignedOffset) -> VmResult<()> {
        self.pc = self.target(offset)?;
        Ok(())
    }
}

fn send_into(inner: &Value, value: Value) -> VmResult<Delegated> {
    let step = match inner {
        Value::Generator(generator) => generator.send(value).map(Some),
        Value::Iterator(iterator) => iterator.borrow_mut().send(value),
        other => {
            return Err(Exception::type_error(&format!(
                "'{}' object is not an iterator",
                other.type_name()
            )))
        }
    };
    match step {
        Ok(Some(value)) => Ok(Delegated::Yielded(value)),
        Ok(None) => Ok(Delegated::Finished(Value::None)),
        Err(e) if e.kind() == ExceptionKind::StopIteration => Ok(Delegated::Finished(e.stop_value())),
        Err(e) => Err(e),
    }
}

fn next_item(iterator: &Value) -> VmResult<Option<Value>> {
    match iterator {
        Value::Generator(generator) => generator.dunder_next(),
        Value::Iterator(iterator) => iterator.borrow_mut().next(),
        other => Err(Exception::type_error(&format!(
            "'{}' object is not an iterator",
            other.type_name()
        ))),
    }
}

fn unsupported(op: &str, left: &Value, right: &Value) -> Exception {
    Exception::type_error(&format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn overflow() -> Exception {
    Exception::with_message(ExceptionKind::OverflowError, "integer overflow")
}

fn add(left: Value, right: Value) -> VmResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (left, right) => Err(unsupported("+", &left, &right)),
    }
}

fn sub(left: Value, right: Value) -> VmResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
        (left, right) => Err(unsupported("-", &left, &right)),
    }
}

fn less_than(left: Value, right: Value) -> VmResult<Value> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a < b)),
        _ => Err(Exception::type_error(&format!(
            "'<' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}
