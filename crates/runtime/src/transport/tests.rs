use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;

#[test]
fn test_length_prefix_encoding() {
    let length: u32 = 1234;
    let bytes = length.to_le_bytes();

    assert_eq!(bytes[0], (length & 0xFF) as u8);
    assert_eq!(bytes[1], ((length >> 8) & 0xFF) as u8);
    assert_eq!(bytes[2], ((length >> 16) & 0xFF) as u8);
    assert_eq!(bytes[3], ((length >> 24) & 0xFF) as u8);

    assert_eq!(u32::from_le_bytes(bytes), length);
}

#[tokio::test]
async fn test_send_message() {
    let (stdin_read, stdin_write) = tokio::io::duplex(1024);
    let (stdout_read, _stdout_write) = tokio::io::duplex(1024);

    let (transport, _rx) = PipeTransport::new(stdin_write, stdout_read);
    let (mut sender, _receiver) = transport.into_parts();

    let test_message = serde_json::json!({
        "id": 1,
        "type": "accountInfo",
        "args": null
    });

    sender.send(test_message.clone()).await.unwrap();

    // Read the frame the transport wrote from our end of the pipe.
    let (mut read_half, _write_half) = tokio::io::split(stdin_read);
    let mut len_buf = [0u8; 4];
    read_half.read_exact(&mut len_buf).await.unwrap();
    let length = u32::from_le_bytes(len_buf) as usize;

    let mut msg_buf = vec![0u8; length];
    read_half.read_exact(&mut msg_buf).await.unwrap();

    let received: serde_json::Value = serde_json::from_slice(&msg_buf).unwrap();
    assert_eq!(received, test_message);
}

#[tokio::test]
async fn test_multiple_messages_in_sequence() {
    let (_stdin_read, stdin_write) = tokio::io::duplex(4096);
    let (stdout_read, mut stdout_write) = tokio::io::duplex(4096);

    let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);

    let read_task = tokio::spawn(async move { transport.run().await });

    let messages = vec![
        serde_json::json!({"id": 1, "type": "getInfo"}),
        serde_json::json!({"id": 2, "type": "getBalance"}),
        serde_json::json!({"id": 3, "type": "getInvoices"}),
    ];

    for msg in &messages {
        let json_bytes = serde_json::to_vec(msg).unwrap();
        let length = json_bytes.len() as u32;

        stdout_write.write_all(&length.to_le_bytes()).await.unwrap();
        stdout_write.write_all(&json_bytes).await.unwrap();
    }
    stdout_write.flush().await.unwrap();

    for expected in &messages {
        let received = rx.recv().await.unwrap();
        assert_eq!(&received, expected);
    }

    drop(stdout_write);
    drop(rx);
    let _ = read_task.await;
}

#[tokio::test]
async fn test_large_message() {
    let (_stdin_read, stdin_write) = tokio::io::duplex(1024 * 1024);
    let (stdout_read, mut stdout_write) = tokio::io::duplex(1024 * 1024);

    let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);

    let read_task = tokio::spawn(async move { transport.run().await });

    // A payload comfortably past any internal buffer size.
    let large_string = "x".repeat(100_000);
    let large_message = serde_json::json!({
        "id": 1,
        "data": large_string
    });

    let json_bytes = serde_json::to_vec(&large_message).unwrap();
    let length = json_bytes.len() as u32;
    assert!(length > 32_768, "Test message should be > 32KB");

    stdout_write.write_all(&length.to_le_bytes()).await.unwrap();
    stdout_write.write_all(&json_bytes).await.unwrap();
    stdout_write.flush().await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received, large_message);

    drop(stdout_write);
    drop(rx);
    let _ = read_task.await;
}

#[tokio::test]
async fn test_malformed_length_prefix() {
    let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
    let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

    let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

    // Only 2 bytes of the 4-byte length prefix, then EOF.
    stdout_write.write_all(&[0x01, 0x02]).await.unwrap();
    stdout_write.flush().await.unwrap();
    drop(stdout_write);

    let result = transport.run().await;
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read length prefix")
    );
}

#[tokio::test]
async fn test_clean_eof_is_graceful() {
    let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
    let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

    let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);

    let read_task = tokio::spawn(async move { transport.run().await });

    let message = serde_json::json!({"id": 1, "type": "status"});
    let json_bytes = serde_json::to_vec(&message).unwrap();
    let length = json_bytes.len() as u32;

    stdout_write.write_all(&length.to_le_bytes()).await.unwrap();
    stdout_write.write_all(&json_bytes).await.unwrap();
    stdout_write.flush().await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received, message);

    // EOF between frames is a normal shutdown, not an error.
    drop(stdout_write);
    let result = read_task.await.unwrap();
    assert!(result.is_ok());
}
