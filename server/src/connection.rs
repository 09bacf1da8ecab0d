//! Per-connection reader and writer tasks
//!
//! Each accepted socket is upgraded to a WebSocket and split in two. The
//! reader decodes request frames and forwards them to the hub; the writer
//! drains the connection's outbound queue and sends keepalive pings. When
//! either side stops, the other is aborted and the hub is told the
//! connection is gone.

use crate::client_manager::{ConnectionId, FrameBatch};
use crate::config::ServerConfig;
use crate::hub::HubMessage;
use clue_shared::{CodecError, RequestFrame, ServerFrame, WireFormat};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async_with_config, WebSocketStream};

type WsStream = WebSocketStream<TcpStream>;

/// Runs one connection until it closes, fails or falls silent.
pub async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    conn: ConnectionId,
    hub: mpsc::Sender<HubMessage>,
    config: ServerConfig,
) {
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(config.max_message_size);
    ws_config.max_frame_size = Some(config.max_message_size);

    let ws = match accept_async_with_config(stream, Some(ws_config)).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue);
    let register = HubMessage::Register {
        conn,
        addr,
        outbound: outbound_tx,
    };
    if let Err(e) = hub.send(register).await {
        error!("Failed to register connection {}: {}", conn, e);
        return;
    }
    info!("Connection {} open from {}", conn, addr);

    let (sink, stream) = ws.split();
    let mut reader = tokio::spawn(read_loop(
        stream,
        conn,
        hub.clone(),
        config.wire_format,
        config.pong_wait,
    ));
    let mut writer = tokio::spawn(write_loop(
        sink,
        outbound_rx,
        conn,
        config.wire_format,
        config.ping_period,
        config.write_wait,
    ));

    tokio::select! {
        _ = &mut reader => writer.abort(),
        _ = &mut writer => reader.abort(),
    }

    if let Err(e) = hub.send(HubMessage::Unregister { conn }).await {
        error!("Failed to unregister connection {}: {}", conn, e);
    }
    info!("Connection {} from {} closed", conn, addr);
}

/// Forwards decoded requests to the hub. Any inbound frame, pongs
/// included, resets the `pong_wait` deadline.
async fn read_loop(
    mut stream: SplitStream<WsStream>,
    conn: ConnectionId,
    hub: mpsc::Sender<HubMessage>,
    format: WireFormat,
    pong_wait: Duration,
) {
    loop {
        let message = match timeout(pong_wait, stream.next()).await {
            Err(_) => {
                warn!("Connection {} silent for {:?}, dropping", conn, pong_wait);
                return;
            }
            Ok(None) => return,
            Ok(Some(Err(e))) => {
                debug!("Connection {} read error: {}", conn, e);
                return;
            }
            Ok(Some(Ok(message))) => message,
        };

        if let Message::Close(_) = message {
            return;
        }

        let frame = match decode_request(format, &message) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                warn!("Malformed frame from connection {}: {}", conn, e);
                return;
            }
        };

        if let Err(e) = hub.send(HubMessage::Request { conn, frame }).await {
            error!("Hub gone, closing connection {}: {}", conn, e);
            return;
        }
    }
}

/// Sends queued batches and periodic pings. Ends when the hub drops the
/// queue's sender or a write fails or stalls past `write_wait`.
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::Receiver<FrameBatch>,
    conn: ConnectionId,
    format: WireFormat,
    ping_period: Duration,
    write_wait: Duration,
) {
    let mut ping = interval(ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first tick since it fires immediately
    ping.tick().await;

    loop {
        let messages = tokio::select! {
            batch = outbound.recv() => match batch {
                Some(frames) => encode_batch(format, conn, &frames),
                None => {
                    let _ = timeout(write_wait, sink.send(Message::Close(None))).await;
                    return;
                }
            },
            _ = ping.tick() => vec![Message::Ping(Vec::new())],
        };

        for message in messages {
            match timeout(write_wait, sink.send(message)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!("Connection {} write error: {}", conn, e);
                    return;
                }
                Err(_) => {
                    warn!("Connection {} write stalled for {:?}", conn, write_wait);
                    return;
                }
            }
        }
    }
}

/// Encodes a batch, skipping frames that fail to encode.
fn encode_batch(format: WireFormat, conn: ConnectionId, frames: &[ServerFrame]) -> Vec<Message> {
    frames
        .iter()
        .filter_map(|frame| match encode_frame(format, frame) {
            Ok(message) => Some(message),
            Err(e) => {
                error!("Failed to encode frame for connection {}: {}", conn, e);
                None
            }
        })
        .collect()
}

/// Decodes a data frame. Control frames yield `None`; a data frame of the
/// wrong kind for the configured format is an error.
pub fn decode_request(
    format: WireFormat,
    message: &Message,
) -> Result<Option<RequestFrame>, CodecError> {
    match (message, format) {
        (Message::Text(text), WireFormat::Json) => format.decode(text.as_bytes()).map(Some),
        (Message::Binary(bytes), WireFormat::Binary) => format.decode(bytes).map(Some),
        (Message::Text(_), WireFormat::Binary) => {
            Err(CodecError::WrongFrameType { expected: "binary" })
        }
        (Message::Binary(_), WireFormat::Json) => {
            Err(CodecError::WrongFrameType { expected: "text" })
        }
        _ => Ok(None),
    }
}

pub fn encode_frame(format: WireFormat, frame: &ServerFrame) -> Result<Message, CodecError> {
    let bytes = format.encode(frame)?;
    if format.is_text() {
        Ok(Message::Text(String::from_utf8_lossy(&bytes).into_owned()))
    } else {
        Ok(Message::Binary(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clue_shared::{ClueError, Request, ServerMessage};

    #[test]
    fn test_decode_json_text() {
        let message = Message::Text(r#"{"req_id":2,"request":"pass"}"#.to_string());
        let frame = decode_request(WireFormat::Json, &message).unwrap().unwrap();
        assert_eq!(frame.req_id, 2);
        assert_eq!(frame.request, Request::Pass);
    }

    #[test]
    fn test_decode_rejects_wrong_frame_type() {
        let message = Message::Binary(vec![1, 2, 3]);
        assert!(matches!(
            decode_request(WireFormat::Json, &message),
            Err(CodecError::WrongFrameType { expected: "text" })
        ));
        let message = Message::Text("{}".to_string());
        assert!(decode_request(WireFormat::Binary, &message).is_err());
    }

    #[test]
    fn test_control_frames_are_skipped() {
        let ping = Message::Ping(vec![9]);
        assert!(decode_request(WireFormat::Json, &ping).unwrap().is_none());
        let pong = Message::Pong(Vec::new());
        assert!(decode_request(WireFormat::Binary, &pong).unwrap().is_none());
    }

    #[test]
    fn test_encode_matches_format() {
        let frame = ServerFrame::response(
            5,
            ServerMessage::Error {
                code: ClueError::IllegalMove,
            },
        );
        match encode_frame(WireFormat::Json, &frame).unwrap() {
            Message::Text(text) => assert!(text.contains("illegal_move")),
            other => panic!("expected text, got {other:?}"),
        }

        let message = encode_frame(WireFormat::Binary, &frame).unwrap();
        let decoded = match message {
            Message::Binary(bytes) => WireFormat::Binary.decode::<ServerFrame>(&bytes).unwrap(),
            other => panic!("expected binary, got {other:?}"),
        };
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_encode_batch_keeps_order() {
        let frames = vec![
            ServerFrame::response(1, ServerMessage::Ack),
            ServerFrame::response(2, ServerMessage::Ack),
        ];
        let messages = encode_batch(WireFormat::Json, 1, &frames);
        assert_eq!(messages.len(), 2);
        match &messages[1] {
            Message::Text(text) => assert!(text.starts_with(r#"{"req_id":2"#)),
            other => panic!("expected text, got {other:?}"),
        }
    }
}
