//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener and a real tokio-tungstenite client to
//! verify that data actually flows over the network correctly.

use forkhook_transport::WsTransport;

/// Helper: connects a tokio-tungstenite client to the given address.
async fn connect_client(
    addr: &str,
) -> tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
> {
    let url = format!("ws://{addr}");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("client should connect");
    ws
}

#[tokio::test]
async fn test_websocket_accept_and_send_receive() {
    // "127.0.0.1:0" lets the OS pick a free port; local_addr tells us
    // which one it chose.
    let mut transport = WsTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport.local_addr().unwrap().to_string();

    let server_handle = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });

    let mut client_ws = connect_client(&addr).await;
    let server_conn = server_handle.await.expect("task should complete");

    assert!(server_conn.id().into_inner() > 0);

    // --- Server sends, client receives ---
    server_conn
        .send(b"hello from server")
        .await
        .expect("send should succeed");

    use futures_util::StreamExt;
    let msg = client_ws.next().await.unwrap().unwrap();
    assert_eq!(msg.into_data().as_ref(), b"hello from server");

    // --- Client sends, server receives ---
    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::Message;
    client_ws
        .send(Message::Binary(b"hello from client".to_vec().into()))
        .await
        .unwrap();

    let received = server_conn
        .recv()
        .await
        .expect("recv should succeed")
        .expect("should have data");
    assert_eq!(received, b"hello from client");

    server_conn.close().await.expect("close should succeed");
}

#[tokio::test]
async fn test_websocket_text_frames_arrive_as_bytes() {
    let mut transport = WsTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport.local_addr().unwrap().to_string();

    let server_handle = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });

    let mut client_ws = connect_client(&addr).await;
    let server_conn = server_handle.await.unwrap();

    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::Message;
    client_ws
        .send(Message::Text("{\"seq\":1}".into()))
        .await
        .unwrap();

    let received = server_conn.recv().await.unwrap().unwrap();
    assert_eq!(received, b"{\"seq\":1}");
}

#[tokio::test]
async fn test_websocket_recv_returns_none_on_client_close() {
    let mut transport = WsTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport.local_addr().unwrap().to_string();

    let server_handle = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });

    let mut client_ws = connect_client(&addr).await;
    let server_conn = server_handle.await.unwrap();

    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite::Message;
    client_ws.send(Message::Close(None)).await.unwrap();

    let result = server_conn.recv().await.expect("recv should not error");
    assert!(result.is_none(), "should return None on client close");
}
