//! The operation algebra.
//!
//! An [`Operation`] is a description: building one never touches the store.
//! Internally it is a tree of [`Step`]s whose intermediate results are type
//! erased, so a chain of any length is a single value of a single type and
//! the interpreter can walk it with an explicit continuation stack instead
//! of recursing.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::path::PathBuf;

use binstore_core::{Error, Request, Response, Result};
use bytes::Bytes;

use crate::ConnectionManager;

pub(crate) type Erased = Box<dyn Any + Send>;
pub(crate) type Decoder = Box<dyn FnOnce(Response) -> Result<Erased> + Send>;
pub(crate) type Continuation = Box<dyn FnOnce(Erased) -> Step + Send>;

/// One node of an operation tree.
pub(crate) enum Step {
    Pure(Erased),
    Fail(Error),
    Command { command: Command, decode: Decoder },
    Bind { first: Nested, next: Continuation },
}

impl Step {
    /// A value-less leaf used to hollow out a step before it is dropped.
    fn hollow() -> Self {
        Step::Pure(Box::new(()))
    }
}

/// The left side of a bind.
///
/// Chains built by folding nest to the left, one level per step, so the
/// nested step is released iteratively instead of by recursive drop glue.
pub(crate) struct Nested(Box<Step>);

impl Nested {
    fn new(step: Step) -> Self {
        Nested(Box::new(step))
    }

    pub(crate) fn into_step(mut self) -> Step {
        std::mem::replace(&mut *self.0, Step::hollow())
    }
}

impl Drop for Nested {
    fn drop(&mut self) {
        let mut current = std::mem::replace(&mut *self.0, Step::hollow());
        while let Step::Bind { first, .. } = &mut current {
            let inner = std::mem::replace(&mut *first.0, Step::hollow());
            current = inner;
        }
    }
}

/// What a command step asks of the store.
pub(crate) enum Command {
    Request(Request),
    Upload { source: ScriptSource, name: String },
}

/// Where an uploaded script's bytes come from. Paths are read when the
/// upload runs, not when it is described.
pub(crate) enum ScriptSource {
    Path(PathBuf),
    Inline(Bytes),
}

/// A description of store work that produces an `A` when run.
///
/// Operations compose with [`and_then`](Self::and_then); later steps may
/// depend on earlier results. Nothing executes until the operation is
/// handed to [`run`](Self::run) or a [`Runner`](crate::Runner).
///
/// ```rust,ignore
/// let swap = ops::get::<Account>(&a).and_then(move |account| match account {
///     Some(account) => ops::put(&b, &account).then(ops::delete(&a)),
///     None => Operation::pure(()),
/// });
/// ```
#[must_use = "operations do nothing until they are run"]
pub struct Operation<A> {
    step: Step,
    _result: PhantomData<fn() -> A>,
}

impl<A: Send + 'static> Operation<A> {
    /// An operation that succeeds with `value` without contacting the store.
    pub fn pure(value: A) -> Self {
        Self::from_step(Step::Pure(Box::new(value)))
    }

    /// An operation that fails with `error` without contacting the store.
    pub fn fail(error: Error) -> Self {
        Self::from_step(Step::Fail(error))
    }

    /// Lift a construction-time result: `Ok` is pure, `Err` fails at run.
    pub fn from_result(result: Result<A>) -> Self {
        match result {
            Ok(value) => Self::pure(value),
            Err(error) => Self::fail(error),
        }
    }

    pub(crate) fn request(
        request: Request,
        decode: impl FnOnce(Response) -> Result<A> + Send + 'static,
    ) -> Self {
        Self::command(Command::Request(request), decode)
    }

    pub(crate) fn command(
        command: Command,
        decode: impl FnOnce(Response) -> Result<A> + Send + 'static,
    ) -> Self {
        let decode: Decoder = Box::new(move |response| {
            decode(response).map(|value| Box::new(value) as Erased)
        });
        Self::from_step(Step::Command { command, decode })
    }

    /// Sequence `next` after this operation, feeding it the result.
    ///
    /// If this operation fails, `next` is never called.
    pub fn and_then<B, F>(self, next: F) -> Operation<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Operation<B> + Send + 'static,
    {
        let next: Continuation = Box::new(move |erased| match erased.downcast::<A>() {
            Ok(value) => next(*value).step,
            Err(_) => Step::Fail(type_mismatch::<A>()),
        });
        Operation::from_step(Step::Bind {
            first: Nested::new(self.step),
            next,
        })
    }

    /// Transform the result.
    pub fn map<B, F>(self, f: F) -> Operation<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        self.and_then(move |value| Operation::pure(f(value)))
    }

    /// Run `next` after this operation, discarding this result.
    pub fn then<B: Send + 'static>(self, next: Operation<B>) -> Operation<B> {
        self.and_then(move |_| next)
    }

    /// Run every operation in order, collecting the results.
    ///
    /// Stops at the first failure.
    pub fn sequence(operations: impl IntoIterator<Item = Operation<A>>) -> Operation<Vec<A>> {
        operations
            .into_iter()
            .fold(Operation::pure(Vec::new()), |acc, operation| {
                acc.and_then(move |mut results| {
                    operation.map(move |value| {
                        results.push(value);
                        results
                    })
                })
            })
    }

    /// Interpret this operation against `manager`.
    ///
    /// The returned future is lazy: no request is sent until it is polled.
    pub fn run(self, manager: &ConnectionManager) -> impl Future<Output = Result<A>> + Send + 'static {
        crate::runner::interpret(self, manager.clone())
    }

    pub(crate) fn into_step(self) -> Step {
        self.step
    }

    fn from_step(step: Step) -> Self {
        Self {
            step,
            _result: PhantomData,
        }
    }
}

impl<A> fmt::Debug for Operation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = match &self.step {
            Step::Pure(_) => "pure",
            Step::Fail(_) => "fail",
            Step::Command { .. } => "command",
            Step::Bind { .. } => "bind",
        };
        f.debug_struct("Operation")
            .field("result", &std::any::type_name::<A>())
            .field("node", &node)
            .finish()
    }
}

pub(crate) fn type_mismatch<A>() -> Error {
    Error::internal(format!(
        "operation result is not a {}",
        std::any::type_name::<A>()
    ))
}
