//! One-shot waiters that resolve with the next matching frame.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::debug;
use znp_frame::{Command, CommandType, Frame, RPC_ERROR};

use crate::error::{Result, ZnpError};
use crate::handler::{HandlerAction, HandlerChain, HandlerId};

/// Register a one-shot waiter for `command_type`/`command`.
///
/// The first matching frame resolves the returned future and removes the
/// waiter. An `SRSP` waiter also accepts an `RPC_ERROR` response naming its
/// request and fails with [`ZnpError::Rpc`].
pub fn wait_for(
    chain: &Arc<HandlerChain>,
    command_type: CommandType,
    command: Command,
) -> PendingResponse {
    let (tx, rx) = oneshot::channel();
    let mut sink = Some(tx);

    let id = chain.register(
        false,
        Box::new(move |frame| {
            let Some(outcome) = match_frame(frame, command_type, command) else {
                return Ok(HandlerAction::PASS);
            };
            match sink.take() {
                Some(tx) if !tx.is_closed() => {
                    let _ = tx.send(outcome);
                    Ok(HandlerAction::CLAIM)
                }
                // Owner went away; leave the frame for someone else.
                _ => Ok(HandlerAction::RETIRE),
            }
        }),
    );

    PendingResponse {
        state: PendingState::Waiting {
            rx,
            _guard: WaiterGuard {
                chain: Arc::downgrade(chain),
                id,
            },
        },
    }
}

fn match_frame(
    frame: &Frame,
    command_type: CommandType,
    command: Command,
) -> Option<Result<Bytes>> {
    if frame.is(command_type, command) {
        return Some(Ok(frame.payload.clone()));
    }
    if command_type == CommandType::Srsp && frame.is(CommandType::Srsp, RPC_ERROR) {
        if let &[code, cmd0, cmd1, ..] = &frame.payload[..] {
            if Command::from_header(cmd0, cmd1).ok() == Some((CommandType::Sreq, command)) {
                debug!(%command, code, "request rejected by device");
                return Some(Err(ZnpError::Rpc { code }));
            }
        }
    }
    None
}

/// Unregisters its waiter when dropped.
struct WaiterGuard {
    chain: Weak<HandlerChain>,
    id: HandlerId,
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        if let Some(chain) = self.chain.upgrade() {
            chain.unregister(self.id);
        }
    }
}

enum PendingState {
    Waiting {
        rx: oneshot::Receiver<Result<Bytes>>,
        _guard: WaiterGuard,
    },
    Failed(Option<ZnpError>),
}

/// The payload of a response that has not arrived yet.
///
/// Dropping an unresolved `PendingResponse` unregisters its waiter.
#[must_use = "a pending response does nothing unless awaited"]
pub struct PendingResponse {
    state: PendingState,
}

impl PendingResponse {
    /// A response that fails with `err` as soon as it is polled.
    pub fn failed(err: ZnpError) -> Self {
        Self {
            state: PendingState::Failed(Some(err)),
        }
    }
}

impl Future for PendingResponse {
    type Output = Result<Bytes>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            PendingState::Waiting { rx, .. } => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(ZnpError::Closed))),
            PendingState::Failed(err) => Poll::Ready(Err(err.take().unwrap_or(ZnpError::Closed))),
        }
    }
}

impl std::fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            PendingState::Waiting { .. } => "waiting",
            PendingState::Failed(_) => "failed",
        };
        f.debug_struct("PendingResponse").field("state", &state).finish()
    }
}
