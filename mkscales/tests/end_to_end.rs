//! End-to-end tests against an emulator listening on loopback

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use mkscales::{Checksum, DeviceProfile, DivisionCode, Emulator, FrameCodec, Scales, TcpServer};
use mkscales_core::checksum;

async fn spawn_emulator(emulator: Emulator) -> SocketAddr {
    let server = TcpServer::bind("127.0.0.1:0", Arc::new(emulator))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(server.run());

    addr
}

async fn exchange(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(2), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();

    response
}

#[tokio::test]
async fn test_get_device_id_over_tcp() {
    let addr = spawn_emulator(Emulator::default()).await;

    let response = exchange(addr, &[0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x83, 0xB9]).await;

    let payload: [u8; 5] = [0x50, 0x31, 0x32, 0x33, 0x34];
    assert_eq!(&response[..3], &[0xF8, 0x55, 0xCE]);
    assert_eq!(response[3] as usize, payload.len());
    assert_eq!(&response[4..9], &payload);
    assert_eq!(&response[9..], &checksum::calculate(&payload).to_be_bytes());
}

#[tokio::test]
async fn test_legacy_client_frame() {
    let codec = FrameCodec::new().with_checksum(Checksum::new(0x1D0F));
    let addr = spawn_emulator(Emulator::with_profile(codec, &DeviceProfile::default())).await;

    let response = exchange(addr, &[0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x4F, 0x25]).await;

    let payload = codec.parse_response(&response).unwrap();
    assert_eq!(&payload[..], &[0x50, 0x31, 0x32, 0x33, 0x34]);
    assert_eq!(
        &response[9..],
        &Checksum::new(0x1D0F).compute(&payload).to_be_bytes()
    );
}

#[tokio::test]
async fn test_invalid_frames_close_without_response() {
    let addr = spawn_emulator(Emulator::default()).await;

    let bad_requests: [&[u8]; 4] = [
        // Wrong header
        &[0xF8, 0x55, 0xCF, 0x00, 0x01, 0x90, 0x83, 0xB9],
        // Wrong checksum
        &[0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x4F, 0x25],
        // Length runs past the buffer
        &[0xF8, 0x55, 0xCE, 0x00, 0x40, 0x90, 0x83, 0xB9],
        // Unknown opcode 0x91
        &[0xF8, 0x55, 0xCE, 0x00, 0x01, 0x91, 0x93, 0x98],
    ];

    for request in bad_requests {
        assert!(exchange(addr, request).await.is_empty());
    }

    // The listener is still serving
    let response = exchange(addr, &[0xF8, 0x55, 0xCE, 0x00, 0x01, 0xA0, 0xB5, 0xEA]).await;
    assert_eq!(&response[4..10], &[0x10, 0x00, 0x00, 0x00, 0x00, 0x03]);
}

#[tokio::test]
async fn test_client_commands() {
    let profile = DeviceProfile::new(2500, DivisionCode(2), "SC01").unwrap();
    let addr = spawn_emulator(Emulator::with_profile(FrameCodec::new(), &profile)).await;

    let scales = Scales::new("127.0.0.1", addr.port()).with_timeout(Duration::from_secs(2));

    let identity = scales.get_device_id().await.unwrap();
    assert_eq!(identity.serial_str(), "SC01");

    let reading = scales.get_weight().await.unwrap();
    assert_eq!(reading.weight, 2500);
    assert_eq!(reading.division, DivisionCode(2));
}

#[tokio::test]
async fn test_client_sees_closed_connection_on_unknown_opcode() {
    let addr = spawn_emulator(Emulator::default()).await;
    let scales = Scales::new("127.0.0.1", addr.port()).with_timeout(Duration::from_secs(2));

    let result = scales.request(&[0x77]).await;
    assert!(matches!(
        result,
        Err(mkscales::Error::Transport(
            mkscales_transport::Error::ConnectionClosed
        ))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connections() {
    let addr = spawn_emulator(Emulator::default()).await;

    // Open both connections before either sends
    let mut weight_stream = TcpStream::connect(addr).await.unwrap();
    let mut id_stream = TcpStream::connect(addr).await.unwrap();

    let weight = async move {
        weight_stream
            .write_all(&[0xF8, 0x55, 0xCE, 0x00, 0x01, 0xA0, 0xB5, 0xEA])
            .await
            .unwrap();
        let mut response = Vec::new();
        weight_stream.read_to_end(&mut response).await.unwrap();
        response
    };

    let id = async move {
        id_stream
            .write_all(&[0xF8, 0x55, 0xCE, 0x00, 0x01, 0x90, 0x83, 0xB9])
            .await
            .unwrap();
        let mut response = Vec::new();
        id_stream.read_to_end(&mut response).await.unwrap();
        response
    };

    let (weight_response, id_response) = tokio::join!(weight, id);

    let codec = FrameCodec::new();
    assert_eq!(
        &codec.parse_response(&weight_response).unwrap()[..],
        &[0x10, 0x00, 0x00, 0x00, 0x00, 0x03]
    );
    assert_eq!(
        &codec.parse_response(&id_response).unwrap()[..],
        &[0x50, 0x31, 0x32, 0x33, 0x34]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_clients() {
    let addr = spawn_emulator(Emulator::default()).await;
    let scales = Scales::new("127.0.0.1", addr.port()).with_timeout(Duration::from_secs(5));

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let scales = scales.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    scales.get_weight().await.map(|r| r.to_string())
                } else {
                    scales.get_device_id().await.map(|d| d.to_string())
                }
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let text = task.await.unwrap().unwrap();
        if i % 2 == 0 {
            assert_eq!(text, "Weight[0 div=0x03]");
        } else {
            assert_eq!(text, "Device[SN: 1234]");
        }
    }
}
