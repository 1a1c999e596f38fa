//! Ingest over a localhost UDP socket

use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use crate::orientation::{
    bind_socket, IngestExit, IngestHandle, OrientationBuffer, OrientationIngest,
    OrientationMessage,
};
use crate::signal::StopFlag;
use crate::tests::fixtures::wait_until;

fn spawn_listener(buffer: &Arc<OrientationBuffer>) -> (IngestHandle, UdpSocket) {
    let socket = bind_socket("127.0.0.1:0".parse().unwrap(), Duration::from_millis(10)).unwrap();
    let addr = socket.local_addr().unwrap();
    let handle =
        IngestHandle::spawn(OrientationIngest::new(socket, Arc::clone(buffer), StopFlag::new()))
            .unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender.connect(addr).unwrap();
    (handle, sender)
}

#[test]
fn test_datagrams_reach_buffer() {
    let buffer = Arc::new(OrientationBuffer::new(8));
    let (handle, sender) = spawn_listener(&buffer);

    for i in 0..10 {
        let msg = OrientationMessage {
            azimuth: 0.01 * i as f32,
            pitch: None,
        };
        sender.send(&msg.encode()).unwrap();
    }

    assert!(wait_until(Duration::from_secs(2), || buffer.received() == 10));
    let report = handle.stop_and_join().unwrap();
    assert_eq!(report.exit, IngestExit::Stopped);
    assert_eq!(report.stats.accepted, 10);

    // capacity 8 keeps samples 2..=9
    assert_eq!(buffer.len(), 8);
    assert!((buffer.average() - 0.055).abs() < 1e-6);
    assert!((buffer.latest() - 0.09).abs() < 1e-6);
}

#[test]
fn test_malformed_datagrams_are_dropped() {
    let buffer = Arc::new(OrientationBuffer::new(8));
    let (handle, sender) = spawn_listener(&buffer);

    sender.send(&[0x01, 0x02]).unwrap();
    sender.send(&f32::NAN.to_le_bytes()).unwrap();
    let good = OrientationMessage {
        azimuth: -0.5,
        pitch: Some(0.1),
    };
    sender.send(&good.encode()).unwrap();

    assert!(wait_until(Duration::from_secs(2), || buffer.received() == 1));
    let report = handle.stop_and_join().unwrap();
    assert_eq!(report.stats.accepted, 1);
    assert_eq!(report.stats.dropped, 2);

    // negative azimuth normalized, pitch offset by π/2
    let expected = std::f64::consts::TAU - 0.5;
    assert!((buffer.latest() - expected).abs() < 1e-6);
    assert!(buffer.has_pitch());
    assert!((buffer.average_pitch() - (0.1 + std::f64::consts::FRAC_PI_2)).abs() < 1e-6);
}

#[test]
fn test_stop_without_traffic() {
    let buffer = Arc::new(OrientationBuffer::new(8));
    let (handle, _sender) = spawn_listener(&buffer);

    std::thread::sleep(Duration::from_millis(30));
    let report = handle.stop_and_join().unwrap();
    assert_eq!(report.exit, IngestExit::Stopped);
    assert_eq!(report.stats.accepted, 0);
    assert!(buffer.is_empty());
    assert_eq!(buffer.average(), 0.0);
}
