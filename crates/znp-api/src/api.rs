use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};
use znp_encoding::{decode, Wire};
use znp_frame::{Command, CommandType, Frame};
use znp_transport::{FrameSubscription, RawInterface};

use crate::error::{Result, ZnpError};
use crate::events::{EventBus, ZnpEvents};
use crate::handler::HandlerChain;
use crate::pending::{self, PendingResponse};
use crate::status::{check_only_status, check_status};
use crate::types::{DeviceState, IncomingMsg, ResetInfo};

/// Typed asynchronous access to a ZNP device.
///
/// Every request method sends its frame and registers its waiter before
/// returning, then hands back a `'static` future for the result. Nothing is
/// lost if the future is polled late; dropping it unregisters the waiter.
///
/// Frames are dispatched on whichever thread the transport delivers them,
/// one at a time and in arrival order.
pub struct ZnpApi {
    // Declared first so it is dropped first: no frame can reach the chain
    // once teardown has started.
    _on_frame: FrameSubscription,
    chain: Arc<HandlerChain>,
    events: ZnpEvents,
    raw: Arc<dyn RawInterface>,
}

impl ZnpApi {
    /// Attach to a transport and start dispatching its frames.
    pub fn new(raw: Arc<dyn RawInterface>) -> Self {
        let chain = Arc::new(HandlerChain::new());
        let events = ZnpEvents::new();
        events.attach(&chain);

        let weak_chain = Arc::downgrade(&chain);
        let on_frame = raw.subscribe(Box::new(move |frame: &Frame| {
            if let Some(chain) = weak_chain.upgrade() {
                chain.dispatch(frame);
            }
        }));
        debug!("ZNP engine attached to transport");

        Self {
            _on_frame: on_frame,
            chain,
            events,
            raw,
        }
    }

    /// All event categories.
    pub fn events(&self) -> &ZnpEvents {
        &self.events
    }

    pub fn sys_on_reset(&self) -> &EventBus<ResetInfo> {
        &self.events.reset
    }

    pub fn af_on_incoming_msg(&self) -> &EventBus<IncomingMsg> {
        &self.events.incoming_msg
    }

    pub fn zdo_on_state_change(&self) -> &EventBus<DeviceState> {
        &self.events.state_change
    }

    pub fn zdo_on_permit_join(&self) -> &EventBus<u8> {
        &self.events.permit_join
    }

    /// The frame handler chain, for registering custom handlers.
    pub fn handlers(&self) -> &Arc<HandlerChain> {
        &self.chain
    }

    /// Wait for the next frame matching `command_type`/`command`.
    pub fn wait_for(&self, command_type: CommandType, command: Command) -> PendingResponse {
        pending::wait_for(&self.chain, command_type, command)
    }

    /// Send a synchronous request and wait for its response payload.
    ///
    /// The waiter is registered before the frame is sent, so a response
    /// delivered while `send` is still running is not missed. If the send
    /// fails the waiter is removed again and the returned future fails with
    /// the transport error. Until that removal, a stray SRSP for the same
    /// command (say, the late answer to an abandoned request) can be claimed
    /// by the waiter and is then discarded with it.
    pub fn send_and_wait(&self, command: Command, payload: impl Into<Bytes>) -> PendingResponse {
        let response = self.wait_for(CommandType::Srsp, command);
        match self.send(CommandType::Sreq, command, payload.into()) {
            Ok(()) => response,
            Err(err) => PendingResponse::failed(err),
        }
    }

    /// Start a step with `start`, then wait for a frame that only follows
    /// once that step has succeeded.
    ///
    /// The waiter is registered before `start` runs, so a frame arriving
    /// right behind the step's own response cannot slip past. The returned
    /// future yields the frame's payload only after the step completes, and
    /// fails with the step's error if it fails.
    pub fn wait_after<S, P>(
        &self,
        start: S,
        command_type: CommandType,
        command: Command,
    ) -> impl Future<Output = Result<Bytes>> + Send + 'static
    where
        S: FnOnce() -> P,
        P: Future<Output = Result<()>> + Send + 'static,
    {
        let response = self.wait_for(command_type, command);
        let prior = start();
        async move {
            prior.await?;
            response.await
        }
    }

    /// Send an asynchronous request. No response is expected.
    pub fn send_areq(&self, command: Command, payload: impl Into<Bytes>) -> Result<()> {
        self.send(CommandType::Areq, command, payload.into())
    }

    fn send(&self, command_type: CommandType, command: Command, payload: Bytes) -> Result<()> {
        trace!(%command_type, %command, len = payload.len(), "sending frame");
        self.raw
            .send(&Frame::new(command_type, command, payload))
            .map_err(ZnpError::from)
    }

    /// Request whose response is only a status byte.
    pub(crate) fn request_status(
        &self,
        command: Command,
        payload: Bytes,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        let response = self.send_and_wait(command, payload);
        async move { check_only_status(&response.await?) }
    }

    /// Request whose response is a status byte followed by a `T`.
    pub(crate) fn request_checked<T>(
        &self,
        command: Command,
        payload: Bytes,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Wire + Send + 'static,
    {
        let response = self.send_and_wait(command, payload);
        async move { Ok(decode(check_status(&response.await?)?)?) }
    }

    /// Request whose response is a bare `T` with no status byte.
    pub(crate) fn request_decoded<T>(
        &self,
        command: Command,
        payload: Bytes,
    ) -> impl Future<Output = Result<T>> + Send + 'static
    where
        T: Wire + Send + 'static,
    {
        let response = self.send_and_wait(command, payload);
        async move { Ok(decode(&response.await?)?) }
    }
}

impl std::fmt::Debug for ZnpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZnpApi")
            .field("handlers", &self.chain.len())
            .finish_non_exhaustive()
    }
}
