mod common;

use std::sync::{Arc, Mutex};

use common::{areq, setup, srsp, EVENT_HANDLERS};
use znp_api::{
    config, info, AddrMode, Capability, DataRequest, DeviceState, EndpointDescriptor, IeeeAddress,
    Latency, NvItemId, ResetReason, StartupFromAppResponse, ZnpError,
};
use znp_encoding::DecodeError;
use znp_frame::{af, encode_frame, sapi, sys, util, zdo, CommandType, FrameError};

const COORDINATOR: IeeeAddress = IeeeAddress(0x00124B0001020304);
const COORDINATOR_LE: [u8; 8] = [0x04, 0x03, 0x02, 0x01, 0x00, 0x4B, 0x12, 0x00];

#[tokio::test]
async fn ping_reports_capabilities() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sys::PING, [0x59, 0x06])]);

    let caps = api.sys_ping().await.unwrap();
    assert!(caps.contains(Capability::ZDO));
    assert!(!caps.contains(Capability::APP));

    let sent = mock.last_sent();
    assert_eq!(sent.command_type, CommandType::Sreq);
    assert_eq!(sent.command, sys::PING);
    assert!(sent.payload.is_empty());
}

#[tokio::test]
async fn reset_resolves_with_indication_and_notifies_subscribers() {
    let (mock, api) = setup();
    mock.respond_with(|frame| match frame.command {
        sys::RESET_REQ => vec![areq(sys::RESET_IND, [0x00, 0x02, 0x01, 0x02, 0x07, 0x01])],
        _ => Vec::new(),
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = api
        .sys_on_reset()
        .subscribe(move |info| sink.lock().unwrap().push(info.reason));

    let info = api.sys_reset(true).await.unwrap();
    assert_eq!(info.reason, ResetReason::PowerUp);
    assert_eq!((info.major_rel, info.minor_rel), (2, 7));
    assert_eq!(*seen.lock().unwrap(), vec![ResetReason::PowerUp]);

    let sent = mock.last_sent();
    assert_eq!(sent.command_type, CommandType::Areq);
    assert_eq!(sent.payload.as_ref(), &[0x01]);
}

#[tokio::test]
async fn nv_read_returns_value_after_status() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sys::OSAL_NV_READ, [0x00, 0x02, 0x62, 0x1A])]);

    let value = api.sys_osal_nv_read_raw(NvItemId::PAN_ID, 0).await.unwrap();
    assert_eq!(value, vec![0x62, 0x1A]);
    assert_eq!(mock.last_sent().payload.as_ref(), &[0x83, 0x00, 0x00]);
}

#[tokio::test]
async fn nv_read_failure_status_is_reported() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sys::OSAL_NV_READ, [0x0A, 0x00])]);

    let err = api.sys_osal_nv_read_raw(NvItemId::PAN_ID, 0).await.unwrap_err();
    assert!(matches!(err, ZnpError::Status(0x0A)));
}

#[tokio::test]
async fn nv_item_init_accepts_created_status() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sys::OSAL_NV_ITEM_INIT, [0x09])]);

    api.sys_osal_nv_item_init_raw(NvItemId::HAS_CONFIGURED_ZSTACK1, 1, vec![0x00])
        .await
        .unwrap();
    assert_eq!(
        mock.last_sent().payload.as_ref(),
        &[0x00, 0x0F, 0x01, 0x00, 0x01, 0x00]
    );

    mock.respond_with(|_| vec![srsp(sys::OSAL_NV_ITEM_INIT, [0x0A])]);
    let err = api
        .sys_osal_nv_item_init_raw(NvItemId::HAS_CONFIGURED_ZSTACK1, 1, vec![0x00])
        .await
        .unwrap_err();
    assert!(matches!(err, ZnpError::Status(0x0A)));
}

#[tokio::test]
async fn nv_length_has_no_status_byte() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sys::OSAL_NV_LENGTH, [0x02, 0x00])]);

    assert_eq!(api.sys_osal_nv_length(NvItemId::PAN_ID).await.unwrap(), 2);
}

#[tokio::test]
async fn af_register_encodes_descriptor() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(af::REGISTER, [0x00])]);

    let endpoint = EndpointDescriptor {
        endpoint: 1,
        profile_id: 0x0104,
        device_id: 0x0005,
        version: 0,
        latency: Latency::NoLatency,
        input_clusters: vec![0x0006],
        output_clusters: Vec::new(),
    };
    api.af_register(&endpoint).await.unwrap();
    assert_eq!(
        mock.last_sent().payload.as_ref(),
        &[0x01, 0x04, 0x01, 0x05, 0x00, 0x00, 0x00, 0x01, 0x06, 0x00, 0x00]
    );
}

#[tokio::test]
async fn af_data_request_failure_is_reported() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(af::DATA_REQUEST, [0xC2])]);

    let request = DataRequest {
        dst_addr: 0x1234,
        dst_endpoint: 1,
        src_endpoint: 1,
        cluster_id: 0x0006,
        trans_id: 7,
        options: 0,
        radius: 30,
        data: vec![0x01, 0x07, 0x01],
    };
    let err = api.af_data_request(&request).await.unwrap_err();
    assert!(matches!(err, ZnpError::Status(0xC2)));
}

#[tokio::test]
async fn mgmt_leave_resolves_with_answering_address() {
    let (mock, api) = setup();
    mock.respond_with(|frame| match frame.command {
        zdo::MGMT_LEAVE_REQ => vec![
            srsp(zdo::MGMT_LEAVE_REQ, [0x00]),
            areq(zdo::MGMT_LEAVE_RSP, [0x34, 0x12, 0x00]),
        ],
        _ => Vec::new(),
    });

    let src = api.zdo_mgmt_leave(0x0000, COORDINATOR, 0).await.unwrap();
    assert_eq!(src, 0x1234);
    assert_eq!(api.handlers().len(), EVENT_HANDLERS);
}

#[tokio::test]
async fn mgmt_leave_rejected_ack_drops_the_answer_waiter() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(zdo::MGMT_LEAVE_REQ, [0x01])]);

    let err = api.zdo_mgmt_leave(0x0000, COORDINATOR, 0).await.unwrap_err();
    assert!(matches!(err, ZnpError::Status(0x01)));
    assert_eq!(api.handlers().len(), EVENT_HANDLERS);
}

#[tokio::test]
async fn mgmt_leave_remote_failure_is_reported() {
    let (mock, api) = setup();
    let answer = api.zdo_mgmt_leave(0x1234, COORDINATOR, 0);
    mock.inject(srsp(zdo::MGMT_LEAVE_REQ, [0x00]));
    mock.inject(areq(zdo::MGMT_LEAVE_RSP, [0x34, 0x12, 0x8C]));

    assert!(matches!(answer.await, Err(ZnpError::Status(0x8C))));
}

#[tokio::test]
async fn ieee_address_lists_children() {
    let (mock, api) = setup();
    let mut answer = vec![0x00];
    answer.extend_from_slice(&COORDINATOR_LE);
    answer.extend_from_slice(&[0x00, 0x00, 0x00, 0x02, 0x34, 0x12, 0x78, 0x56]);
    mock.respond_with(move |_| {
        vec![
            srsp(zdo::IEEE_ADDR_REQ, [0x00]),
            areq(zdo::IEEE_ADDR_RSP, answer.clone()),
        ]
    });

    let response = api.zdo_ieee_address(0x0000, Some(0)).await.unwrap();
    assert_eq!(response.ieee_addr, COORDINATOR);
    assert_eq!(response.nwk_addr, 0x0000);
    assert_eq!(response.associated_devices, vec![0x1234, 0x5678]);
    assert_eq!(mock.last_sent().payload.as_ref(), &[0x00, 0x00, 0x01, 0x00]);
}

#[tokio::test]
async fn permit_join_sends_window_and_reports_source() {
    let (mock, api) = setup();
    mock.respond_with(|_| {
        vec![
            srsp(zdo::MGMT_PERMIT_JOIN_REQ, [0x00]),
            areq(zdo::MGMT_PERMIT_JOIN_RSP, [0x00, 0x00, 0x00]),
        ]
    });

    let src = api
        .zdo_mgmt_permit_join(AddrMode::Addr16Bit, 0x0000, 60, 0)
        .await
        .unwrap();
    assert_eq!(src, 0x0000);
    assert_eq!(
        mock.last_sent().payload.as_ref(),
        &[0x02, 0x00, 0x00, 0x3C, 0x00]
    );
}

#[tokio::test]
async fn startup_from_app_decodes_outcome() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(zdo::STARTUP_FROM_APP, [0x01])]);

    let outcome = api.zdo_startup_from_app(100).await.unwrap();
    assert_eq!(outcome, StartupFromAppResponse::NewNetworkState);
    assert_eq!(mock.last_sent().payload.as_ref(), &[0x64, 0x00]);
}

#[tokio::test]
async fn link_key_is_returned_with_its_address() {
    let (mock, api) = setup();
    let mut reply = vec![0x00];
    reply.extend_from_slice(&COORDINATOR_LE);
    reply.extend_from_slice(&[0xAB; 16]);
    mock.respond_with(move |_| vec![srsp(zdo::GET_LINK_KEY, reply.clone())]);

    let (addr, key) = api.zdo_get_link_key(COORDINATOR).await.unwrap();
    assert_eq!(addr, COORDINATOR);
    assert_eq!(key, [0xAB; 16]);
}

#[tokio::test]
async fn address_lookup_decodes_ieee_address() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(util::ADDRMGR_NWK_ADDR_LOOKUP, COORDINATOR_LE)]);

    let addr = api.util_addrmgr_nwk_addr_lookup(0x0000).await.unwrap();
    assert_eq!(addr, COORDINATOR);
}

#[tokio::test]
async fn typed_configuration_read() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sapi::READ_CONFIGURATION, [0x00, 0x83, 0x02, 0x62, 0x1A])]);

    let pan_id = api.sapi_read_configuration::<config::PanId>().await.unwrap();
    assert_eq!(pan_id, 0x1A62);
    assert_eq!(mock.last_sent().payload.as_ref(), &[0x83]);
}

#[tokio::test]
async fn configuration_read_rejects_foreign_item() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sapi::READ_CONFIGURATION, [0x00, 0x84, 0x02, 0x62, 0x1A])]);

    let err = api
        .sapi_read_configuration::<config::PanId>()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ZnpError::Decode(DecodeError::InvalidValue { ty: "ConfigId", .. })
    ));
}

#[tokio::test]
async fn typed_configuration_write() {
    let (mock, api) = setup();
    mock.respond_with(|_| vec![srsp(sapi::WRITE_CONFIGURATION, [0x00])]);

    api.sapi_write_configuration::<config::ChannelList>(&0x0000_0800)
        .await
        .unwrap();
    assert_eq!(
        mock.last_sent().payload.as_ref(),
        &[0x84, 0x04, 0x00, 0x08, 0x00, 0x00]
    );
}

#[tokio::test]
async fn typed_device_info_ignores_padding() {
    let (mock, api) = setup();
    mock.respond_with(|_| {
        vec![srsp(
            sapi::GET_DEVICE_INFO,
            [0x00, 0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        )]
    });

    let state = api.sapi_get_device_info::<info::State>().await.unwrap();
    assert_eq!(state, DeviceState::ZbCoord);
    assert_eq!(mock.last_sent().payload.as_ref(), &[0x00]);
}

#[test]
fn oversized_nv_write_cannot_be_framed() {
    let (mock, api) = setup();
    let _pending = api.sys_osal_nv_write_raw(NvItemId::PAN_ID, 0, vec![0xAB; 300]);

    let sent = mock.last_sent();
    assert_eq!(sent.payload.len(), 2 + 1 + 1 + 300);
    let err = encode_frame(&sent, &mut bytes::BytesMut::new()).unwrap_err();
    assert!(matches!(err, FrameError::PayloadTooLarge { size: 304, .. }));
}
