//! Integration tests against an in-process mock daemon.
//!
//! Each test binds a loopback listener that speaks just enough of the
//! host protocol for the scenario under test, then points a [`Bridge`]
//! at it. No real daemon or device is required.

use adb_client::{AdbError, Bridge, Config};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Encode one frame: 4 uppercase hex digits, then the payload.
fn frame(payload: &[u8]) -> Vec<u8> {
    let mut bytes = format!("{:04X}", payload.len()).into_bytes();
    bytes.extend_from_slice(payload);
    bytes
}

/// Read one framed host command from the client.
async fn read_command(stream: &mut TcpStream) -> String {
    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix).await.unwrap();
    let length = usize::from_str_radix(std::str::from_utf8(&prefix).unwrap(), 16).unwrap();
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).await.unwrap();
    String::from_utf8(payload).unwrap()
}

/// Encode one sync chunk: id, little-endian length, payload.
fn sync_chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(id);
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// A bridge pointed at the mock daemon, with auto-start disabled.
fn bridge_for(port: u16) -> Bridge {
    let config = Config::builder()
        .host("127.0.0.1")
        .port(port)
        .auto_start(false)
        .build()
        .unwrap();
    Bridge::new(config)
}

async fn mock_daemon() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[tokio::test]
async fn test_version() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_command(&mut stream).await, "host:version");
        stream.write_all(b"OKAY").await.unwrap();
        stream.write_all(&frame(b"001d")).await.unwrap();
    });

    let version = bridge_for(port).version().await.unwrap();
    assert_eq!(version, 0x1d);
}

#[tokio::test]
async fn test_list_devices() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_command(&mut stream).await, "host:devices");
        stream.write_all(b"OKAY").await.unwrap();
        stream
            .write_all(&frame(b"emulator-5554\tdevice\n123.45.67.89:5555\toffline\n"))
            .await
            .unwrap();
    });

    let devices = bridge_for(port).list_devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].serial, "emulator-5554");
    assert_eq!(devices[0].state, "device");
    assert!(devices[0].is_emulator());
    assert_eq!(devices[1].serial, "123.45.67.89:5555");
    assert_eq!(devices[1].state, "offline");
    assert!(!devices[1].is_emulator());
}

#[tokio::test]
async fn test_command_failed() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"FAIL").await.unwrap();
        stream.write_all(&frame(b"device not found")).await.unwrap();
    });

    let err = bridge_for(port)
        .execute("host:transport:missing")
        .await
        .unwrap_err();
    match err {
        AdbError::CommandFailed(message) => assert_eq!(message, "device not found"),
        other => panic!("expected CommandFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_protocol_violation() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"WHAT").await.unwrap();
    });

    let err = bridge_for(port).execute("host:version").await.unwrap_err();
    assert!(matches!(err, AdbError::Protocol(_)));
}

#[tokio::test]
async fn test_track_devices() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(read_command(&mut stream).await, "host:track-devices");

        // Status and first update coalesced into one delivery.
        let mut burst = b"OKAY".to_vec();
        burst.extend_from_slice(&frame(b"emulator-5554\tdevice\n"));
        stream.write_all(&burst).await.unwrap();

        // Second update fragmented mid-frame.
        let update = frame(b"emulator-5554\tdevice\nemulator-5556\toffline\n");
        let (head, tail) = update.split_at(7);
        stream.write_all(head).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(tail).await.unwrap();

        // Third update: the empty list.
        stream.write_all(&frame(b"")).await.unwrap();
        // Dropping the socket ends the stream.
    });

    let mut tracker = bridge_for(port).track_devices().await.unwrap();

    let first = tracker.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].serial, "emulator-5554");

    let second = tracker.next().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].serial, "emulator-5556");
    assert_eq!(second[1].state, "offline");

    let third = tracker.next().await.unwrap().unwrap();
    assert!(third.is_empty());

    assert!(tracker.next().await.unwrap().is_none());
}

#[tokio::test]
async fn test_shell() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(
            read_command(&mut stream).await,
            "host:transport:emulator-5554"
        );
        stream.write_all(b"OKAY").await.unwrap();

        assert_eq!(read_command(&mut stream).await, "shell:ls /sdcard");
        stream.write_all(b"OKAY").await.unwrap();
        stream.write_all(b"Download\n").await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(b"Pictures\n").await.unwrap();
        // Close: end of output.
    });

    let bridge = bridge_for(port);
    let devices = vec![adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    }];
    let device = bridge.device(devices.into_iter().next().unwrap());

    // The quote in the argument is stripped before sending.
    let output = device.shell("ls", &["/sdcard\""]).await.unwrap();
    assert_eq!(output, "Download\nPictures\n");
}

#[tokio::test]
async fn test_pull_file() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        assert_eq!(
            read_command(&mut stream).await,
            "host:transport:emulator-5554"
        );
        stream.write_all(b"OKAY").await.unwrap();

        assert_eq!(read_command(&mut stream).await, "sync:");
        stream.write_all(b"OKAY").await.unwrap();

        // RECV request: id, length, path.
        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await.unwrap();
        assert_eq!(&header[..4], b"RECV");
        let path_len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
        let mut path = vec![0u8; path_len];
        stream.read_exact(&mut path).await.unwrap();
        assert_eq!(path, b"/system/build.prop");

        // DATA split mid-payload, then DONE.
        let mut reply = sync_chunk(b"DATA", b"hello");
        reply.extend_from_slice(&sync_chunk(b"DONE", b""));
        let (head, tail) = reply.split_at(10);
        stream.write_all(head).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(tail).await.unwrap();
    });

    let bridge = bridge_for(port);
    let device = bridge.device(adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    });

    let mut sink = Vec::new();
    let stats = device
        .pull_file("/system/build.prop", &mut sink)
        .await
        .unwrap();
    assert_eq!(sink, b"hello");
    assert_eq!(stats.total_bytes, 5);
}

#[tokio::test]
async fn test_pull_file_to_disk() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();

        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await.unwrap();
        let path_len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
        let mut path = vec![0u8; path_len];
        stream.read_exact(&mut path).await.unwrap();

        let mut reply = sync_chunk(b"DATA", &vec![0xAB; 4096]);
        reply.extend_from_slice(&sync_chunk(b"DATA", &vec![0xCD; 100]));
        reply.extend_from_slice(&sync_chunk(b"DONE", b""));
        stream.write_all(&reply).await.unwrap();
    });

    let bridge = bridge_for(port);
    let device = bridge.device(adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    });

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("pulled.bin");
    let mut sink = tokio::fs::File::create(&local).await.unwrap();
    let stats = device.pull_file("/data/blob.bin", &mut sink).await.unwrap();
    drop(sink);

    assert_eq!(stats.total_bytes, 4196);
    let contents = std::fs::read(&local).unwrap();
    assert_eq!(contents.len(), 4196);
    assert_eq!(contents[0], 0xAB);
    assert_eq!(contents[4196 - 1], 0xCD);
}

#[tokio::test]
async fn test_pull_file_daemon_failure() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();

        let mut header = [0u8; 8];
        stream.read_exact(&mut header).await.unwrap();
        let path_len = u32::from_le_bytes(header[4..8].try_into().unwrap()) as usize;
        let mut path = vec![0u8; path_len];
        stream.read_exact(&mut path).await.unwrap();

        stream.write_all(&sync_chunk(b"FAIL", b"bad")).await.unwrap();
    });

    let bridge = bridge_for(port);
    let device = bridge.device(adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    });

    let mut sink = Vec::new();
    let err = device.pull_file("/no/such/file", &mut sink).await.unwrap_err();
    match err {
        AdbError::Sync(message) => assert_eq!(message, "bad"),
        other => panic!("expected Sync, got {:?}", other),
    }
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_pull_file_path_too_long() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();
        // The client must not send a request for an oversized path.
    });

    let bridge = bridge_for(port);
    let device = bridge.device(adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    });

    let long_path = "/".repeat(1025);
    let mut sink = Vec::new();
    let err = device.pull_file(&long_path, &mut sink).await.unwrap_err();
    assert!(matches!(err, AdbError::PathTooLong(1025)));
}

#[tokio::test]
async fn test_take_snapshot() {
    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();

        assert_eq!(read_command(&mut stream).await, "framebuffer:");
        stream.write_all(b"OKAY").await.unwrap();

        // Version 16 capture: 2x2 RGB565, delivered in awkward pieces.
        let mut capture = Vec::new();
        for field in [16u32, 8, 2, 2] {
            capture.extend_from_slice(&field.to_le_bytes());
        }
        for value in [0xF800u16, 0x07E0, 0x001F, 0xFFFF] {
            capture.extend_from_slice(&value.to_le_bytes());
        }

        stream.write_all(&capture[..10]).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(&capture[10..19]).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(&capture[19..]).await.unwrap();
    });

    let bridge = bridge_for(port);
    let device = bridge.device(adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    });

    let frame = device.take_snapshot().await.unwrap();
    assert_eq!(frame.width(), 2);
    assert_eq!(frame.height(), 2);
    assert_eq!(frame.depth(), 16);
    assert!(frame.is_converted());
    assert_eq!(
        frame.pixels(),
        &[
            0, 0, 248, 0, // red
            0, 252, 0, 0, // green
            248, 0, 0, 0, // blue
            248, 252, 248, 0, // white
        ]
    );
}

#[tokio::test]
async fn test_logcat() {
    fn log_entry(pid: i32, msg: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(msg.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        for field in [pid, 1, 1_700_000_000, 0] {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        bytes.extend_from_slice(msg);
        bytes
    }

    let (listener, port) = mock_daemon().await;
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _ = read_command(&mut stream).await;
        stream.write_all(b"OKAY").await.unwrap();

        assert_eq!(read_command(&mut stream).await, "log:main");
        stream.write_all(b"OKAY").await.unwrap();

        // Two records: the first whole, the second split mid-header.
        stream.write_all(&log_entry(100, b"boot complete")).await.unwrap();
        let second = log_entry(200, b"service started");
        let (head, tail) = second.split_at(9);
        stream.write_all(head).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(tail).await.unwrap();
    });

    let bridge = bridge_for(port);
    let device = bridge.device(adb_client::DeviceRecord {
        serial: "emulator-5554".to_string(),
        state: "device".to_string(),
    });

    let mut log = device.logcat().await.unwrap();
    let first = log.next_entry().await.unwrap().unwrap();
    assert_eq!(first.pid, 100);
    assert_eq!(first.message, "boot complete");

    let second = log.next_entry().await.unwrap().unwrap();
    assert_eq!(second.pid, 200);
    assert_eq!(second.message, "service started");

    assert!(log.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn test_forward() {
    let (listener, port) = mock_daemon().await;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        read_command(&mut stream).await
    });

    bridge_for(port)
        .forward("tcp:6000", "tcp:7000")
        .await
        .unwrap();
    assert_eq!(server.await.unwrap(), "host:forward:tcp:6000;tcp:7000");
}

#[tokio::test]
async fn test_refused_with_auto_start_disabled() {
    let (listener, port) = mock_daemon().await;
    drop(listener);

    let err = bridge_for(port).list_devices().await.unwrap_err();
    assert!(matches!(err, AdbError::DaemonUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_auto_start_retries_exactly_once() {
    let (listener, port) = mock_daemon().await;
    drop(listener);

    // The start command succeeds but nothing begins listening, so the
    // single reconnect attempt fails; the client must not loop.
    let config = Config::builder()
        .host("127.0.0.1")
        .port(port)
        .auto_start(true)
        .daemon_executable("true")
        .build()
        .unwrap();

    let err = Bridge::new(config).list_devices().await.unwrap_err();
    match err {
        AdbError::DaemonUnavailable(message) => {
            assert!(message.contains("reconnect failed"), "message: {}", message)
        }
        other => panic!("expected DaemonUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_auto_start_daemon_exits_nonzero() {
    let (listener, port) = mock_daemon().await;
    drop(listener);

    let config = Config::builder()
        .host("127.0.0.1")
        .port(port)
        .auto_start(true)
        .daemon_executable("false")
        .build()
        .unwrap();

    let err = Bridge::new(config).list_devices().await.unwrap_err();
    match err {
        AdbError::DaemonUnavailable(message) => {
            assert!(message.contains("exited"), "message: {}", message)
        }
        other => panic!("expected DaemonUnavailable, got {:?}", other),
    }
}
