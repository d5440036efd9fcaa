use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use znp_api::{DeviceState, IncomingMsg, ResetInfo, Subscription, ZnpEvents};

use crate::cmd::{runtime, ListenArgs, Session};
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{emit, hex, OutputFormat, Report};

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum EventOutput {
    Reset {
        reason: String,
        firmware: String,
    },
    IncomingMsg {
        src_addr: String,
        src_endpoint: u8,
        dst_endpoint: u8,
        cluster_id: String,
        link_quality: u8,
        data: String,
    },
    StateChange {
        state: String,
    },
    PermitJoin {
        duration: u8,
    },
}

impl From<&ResetInfo> for EventOutput {
    fn from(info: &ResetInfo) -> Self {
        Self::Reset {
            reason: format!("{:?}", info.reason),
            firmware: format!("{}.{}", info.major_rel, info.minor_rel),
        }
    }
}

impl From<&IncomingMsg> for EventOutput {
    fn from(msg: &IncomingMsg) -> Self {
        Self::IncomingMsg {
            src_addr: format!("{:#06x}", msg.src_addr),
            src_endpoint: msg.src_endpoint,
            dst_endpoint: msg.dst_endpoint,
            cluster_id: format!("{:#06x}", msg.cluster_id),
            link_quality: msg.link_quality,
            data: hex(&msg.data),
        }
    }
}

impl From<&DeviceState> for EventOutput {
    fn from(state: &DeviceState) -> Self {
        Self::StateChange {
            state: format!("{state:?}"),
        }
    }
}

impl Report for EventOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Reset { reason, firmware } => vec![
                ("event", "reset".into()),
                ("reason", reason.clone()),
                ("firmware", firmware.clone()),
            ],
            Self::IncomingMsg {
                src_addr,
                src_endpoint,
                dst_endpoint,
                cluster_id,
                link_quality,
                data,
            } => vec![
                ("event", "incoming_msg".into()),
                ("from", format!("{src_addr}/{src_endpoint}")),
                ("to endpoint", dst_endpoint.to_string()),
                ("cluster", cluster_id.clone()),
                ("lqi", link_quality.to_string()),
                ("data", data.clone()),
            ],
            Self::StateChange { state } => {
                vec![("event", "state_change".into()), ("state", state.clone())]
            }
            Self::PermitJoin { duration } => vec![
                ("event", "permit_join".into()),
                ("duration", format!("{duration}s")),
            ],
        }
    }
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let session = Session::open(&args.device)?;
    let rt = runtime()?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscriptions = forward_events(session.api.events(), &tx);
    drop(tx);

    let printed = rt.block_on(async {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut printed = 0usize;
        while args.count.map_or(true, |count| printed < count) {
            tokio::select! {
                signal = &mut ctrl_c => {
                    signal.map_err(|err| {
                        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
                    })?;
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    emit(&event, format);
                    printed += 1;
                }
            }
        }
        Ok::<_, CliError>(printed)
    })?;

    tracing::debug!(printed, "listen finished");
    Ok(SUCCESS)
}

fn forward_events(events: &ZnpEvents, tx: &UnboundedSender<EventOutput>) -> Vec<Subscription> {
    let reset = tx.clone();
    let incoming = tx.clone();
    let state = tx.clone();
    let permit = tx.clone();
    vec![
        events.reset.subscribe(move |info| {
            let _ = reset.send(info.into());
        }),
        events.incoming_msg.subscribe(move |msg| {
            let _ = incoming.send(msg.into());
        }),
        events.state_change.subscribe(move |s| {
            let _ = state.send(s.into());
        }),
        events.permit_join.subscribe(move |duration| {
            let _ = permit.send(EventOutput::PermitJoin {
                duration: *duration,
            });
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_a_tag() {
        let out = EventOutput::from(&DeviceState::ZbCoord);
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"event":"state_change","state":"ZbCoord"}"#
        );
    }

    #[test]
    fn forwarded_events_reach_the_channel() {
        let events = ZnpEvents::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subs = forward_events(&events, &tx);

        events.permit_join.publish(&60);
        events.state_change.publish(&DeviceState::Router);

        assert!(matches!(
            rx.try_recv(),
            Ok(EventOutput::PermitJoin { duration: 60 })
        ));
        assert!(matches!(rx.try_recv(), Ok(EventOutput::StateChange { .. })));

        drop(subs);
        drop(tx);
        assert!(rx.try_recv().is_err());
    }
}
