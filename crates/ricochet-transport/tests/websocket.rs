//! End-to-end tests for the WebSocket transport: a real listener on an
//! OS-assigned port and a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use ricochet_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    /// Binds a transport, connects one client, returns both ends.
    async fn pair() -> (WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        let server = tokio::spawn(async move { transport.accept().await.unwrap() });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        (server.await.unwrap(), client)
    }

    #[tokio::test]
    async fn test_text_frames_both_ways() {
        let (conn, mut client) = pair().await;
        assert!(conn.id().into_inner() > 0);

        conn.send_text(r#"{"event":"countdown","data":{"count":3}}"#)
            .await
            .unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(
            msg.into_text().unwrap().as_str(),
            r#"{"event":"countdown","data":{"count":3}}"#
        );

        client
            .send(Message::Text(r#"{"event":"player_ready"}"#.to_owned().into()))
            .await
            .unwrap();
        let received = conn.recv().await.unwrap().unwrap();
        assert_eq!(received, br#"{"event":"player_ready"}"#);
    }

    #[tokio::test]
    async fn test_binary_frames_are_received() {
        let (conn, mut client) = pair().await;
        client
            .send(Message::Binary(vec![1, 2, 3].into()))
            .await
            .unwrap();
        assert_eq!(conn.recv().await.unwrap().unwrap(), vec![1, 2, 3]);

        conn.send(&[9, 8]).await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_pending_recv() {
        let (conn, mut client) = pair().await;
        let conn = Arc::new(conn);

        // Park a reader on the connection; nothing will arrive for it.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        tokio::time::timeout(Duration::from_secs(2), conn.send_text("tick"))
            .await
            .expect("send must not block behind recv")
            .unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "tick");

        client.send(Message::Close(None)).await.unwrap();
        assert!(reader.await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (conn, mut client) = pair().await;
        client.send(Message::Close(None)).await.unwrap();
        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (a, _ca) = pair().await;
        let (b, _cb) = pair().await;
        assert_ne!(a.id(), b.id());
    }
}
