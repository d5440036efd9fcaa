//! Waiting for the device's network state to converge.

use std::collections::HashSet;
use std::future::Future;

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::ZnpApi;
use crate::error::{Result, ZnpError};
use crate::events::EventBus;
use crate::types::DeviceState;

/// Wait until `bus` publishes a state in `end_states`.
///
/// Each published state is checked against `end_states` first, so an end
/// state need not be in `allowed_states`. Any other state outside
/// `allowed_states` fails the wait with [`ZnpError::UnexpectedState`].
///
/// Only transitions published after this call are observed: a device that
/// is already in an end state keeps the future pending until its next
/// state change.
pub fn wait_for_state(
    bus: &EventBus<DeviceState>,
    end_states: impl IntoIterator<Item = DeviceState>,
    allowed_states: impl IntoIterator<Item = DeviceState>,
) -> impl Future<Output = Result<DeviceState>> + Send + 'static {
    let end_states: HashSet<DeviceState> = end_states.into_iter().collect();
    let allowed_states: HashSet<DeviceState> = allowed_states.into_iter().collect();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = bus.subscribe(move |state: &DeviceState| {
        let _ = tx.send(*state);
    });

    async move {
        let _subscription = subscription;
        while let Some(state) = rx.recv().await {
            if end_states.contains(&state) {
                debug!(?state, "device reached end state");
                return Ok(state);
            }
            if !allowed_states.contains(&state) {
                return Err(ZnpError::UnexpectedState(state));
            }
            debug!(?state, "device in transitional state");
        }
        Err(ZnpError::Closed)
    }
}

impl ZnpApi {
    /// Wait for the device to report one of `end_states`, failing on any
    /// state that is neither an end state nor in `allowed_states`.
    ///
    /// See [`wait_for_state`] for the exact semantics.
    pub fn wait_for_state(
        &self,
        end_states: impl IntoIterator<Item = DeviceState>,
        allowed_states: impl IntoIterator<Item = DeviceState>,
    ) -> impl Future<Output = Result<DeviceState>> + Send + 'static {
        wait_for_state(self.zdo_on_state_change(), end_states, allowed_states)
    }
}
