//! Interpreting operations.
//!
//! The interpreter walks an operation tree with an explicit continuation
//! stack, so neither long `and_then` chains nor deeply nested binds grow the
//! native stack.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use binstore_core::{Error, Expiration, Response, Result, StoreClient};
use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, warn, Instrument};

use crate::operation::{type_mismatch, Command, Continuation, Erased, ScriptSource, Step};
use crate::{ConnectionManager, Operation};

pub(crate) async fn interpret<A: Send + 'static>(
    operation: Operation<A>,
    manager: ConnectionManager,
) -> Result<A> {
    let span = debug_span!("binstore.run", result = std::any::type_name::<A>());
    async move {
        match walk(operation.into_step(), &manager).await {
            Ok(value) => value
                .downcast::<A>()
                .map(|value| *value)
                .map_err(|_| type_mismatch::<A>()),
            Err(error) => {
                warn!(%error, "operation failed");
                Err(error)
            }
        }
    }
    .instrument(span)
    .await
}

async fn walk(step: Step, manager: &ConnectionManager) -> Result<Erased> {
    let mut current = step;
    let mut continuations: Vec<Continuation> = Vec::new();
    loop {
        current = match current {
            Step::Pure(value) => match continuations.pop() {
                Some(next) => next(value),
                None => return Ok(value),
            },
            Step::Fail(error) => return Err(error),
            Step::Bind { first, next } => {
                continuations.push(next);
                first.into_step()
            }
            Step::Command { command, decode } => {
                let response = dispatch(command, manager).await?;
                Step::Pure(decode(response)?)
            }
        };
    }
}

async fn dispatch(command: Command, manager: &ConnectionManager) -> Result<Response> {
    let client = manager.client()?;
    match command {
        Command::Request(mut request) => {
            let default_expiration = manager.config().default_expiration;
            if let Some(policy) = request.policy_mut() {
                if policy.expiration == Expiration::NamespaceDefault {
                    policy.expiration = default_expiration;
                }
            }
            match request.key() {
                Some(key) => debug!(request = request.kind(), %key, "sending request"),
                None => debug!(request = request.kind(), "sending request"),
            }
            client.execute(request).await
        }
        Command::Upload { source, name } => {
            let source = match source {
                ScriptSource::Inline(source) => source,
                ScriptSource::Path(path) => {
                    debug!(path = %path.display(), "reading script");
                    Bytes::from(tokio::fs::read(&path).await?)
                }
            };
            debug!(script = %name, size = source.len(), "uploading script");
            client.upload_script(source, &name).await?;
            Ok(Response::Ok)
        }
    }
}

/// Runs operations as tasks on an explicit executor.
///
/// ```rust,ignore
/// let runner = Runner::new(tokio::runtime::Handle::current());
/// let pending = runner.run(ops::get::<User>(&key), &manager);
/// let user = pending.await?;
/// ```
#[derive(Clone, Debug)]
pub struct Runner {
    handle: Handle,
}

impl Runner {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// A runner on the ambient tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| Error::internal(format!("no tokio runtime: {}", e)))
    }

    /// Start interpreting `operation` and return a handle to its result.
    pub fn run<A: Send + 'static>(
        &self,
        operation: Operation<A>,
        manager: &ConnectionManager,
    ) -> Deferred<A> {
        Deferred {
            task: self.handle.spawn(operation.run(manager)),
        }
    }
}

/// The pending result of an operation started by a [`Runner`].
///
/// Resolves to the operation's result, or to `Error::Cancelled` if the run
/// was aborted.
#[derive(Debug)]
pub struct Deferred<A> {
    task: JoinHandle<Result<A>>,
}

impl<A> Deferred<A> {
    /// Stop the run at its next suspension point.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<A> Future for Deferred<A> {
    type Output = Result<A>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(Error::Cancelled)),
            Poll::Ready(Err(e)) => Poll::Ready(Err(Error::internal(format!(
                "operation task panicked: {}",
                e
            )))),
        }
    }
}
