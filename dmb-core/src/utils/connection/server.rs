//! HTTP Server Module
//!
//! This module defines the command server using the `picoserve` framework. It
//! serves the control page, accepts JSON commands over plain POST routes and a
//! WebSocket stream, and forwards decoded commands to the control task through
//! `CONTROL_CHANNEL`.

use embassy_net::Stack;
use embassy_time::Duration;
use picoserve::{
    io::embedded_io_async as embedded_aio,
    response::{
        ws::{Message, ReadMessageError, SocketRx, SocketTx, WebSocketCallback, WebSocketUpgrade},
        IntoResponse, Response, StatusCode,
    },
    routing::{get, post},
    Router,
};

use crate::utils::{
    connection::payload::{decode, ModePayload, Payload, SpeedPayload, VelocityPayload, WireCommand},
    controllers::{ControlCommand, CONTROL_CHANNEL},
    frontend::HTML,
};

pub struct CommandSocket;

/// Forward a decoded command, or answer 400 if decoding failed.
async fn dispatch(command: Option<ControlCommand>) -> impl IntoResponse {
    match command {
        Some(command) => {
            CONTROL_CHANNEL.send(command).await;
            Response::new(StatusCode::OK, "OK")
        }
        None => Response::new(StatusCode::BAD_REQUEST, "Invalid command format"),
    }
}

/// Streams commands over a WebSocket, one JSON `WireCommand` per frame.
impl WebSocketCallback for CommandSocket {
    async fn run<Reader, Writer>(
        self,
        mut rx: SocketRx<Reader>,
        mut tx: SocketTx<Writer>,
    ) -> Result<(), Writer::Error>
    where
        Reader: embedded_aio::Read,
        Writer: embedded_aio::Write<Error = Reader::Error>,
    {
        let mut buffer = [0; 512];

        tx.send_text("Connected").await?;

        let close_reason = loop {
            match rx.next_message(&mut buffer).await {
                Ok(Message::Pong(_)) => continue,
                Ok(Message::Ping(data)) => tx.send_pong(data).await?,
                Ok(Message::Close(reason)) => {
                    tracing::info!(?reason, "websocket closed");
                    break None;
                }
                Ok(Message::Text(data)) => match decode::<WireCommand>(data.as_bytes()) {
                    Some(command) => {
                        CONTROL_CHANNEL.send(command.into()).await;
                        tx.send_text("OK").await?;
                    }
                    None => tx.send_text("Invalid command format").await?,
                },
                Ok(Message::Binary(data)) => match decode::<WireCommand>(data) {
                    Some(command) => {
                        CONTROL_CHANNEL.send(command.into()).await;
                        tx.send_binary(b"OK").await?;
                    }
                    None => tx.send_binary(b"Invalid command format").await?,
                },
                Err(error) => {
                    tracing::error!(?error, "websocket error");
                    let code = match error {
                        ReadMessageError::TextIsNotUtf8 => 1007,
                        ReadMessageError::ReservedOpcode(_) => 1003,
                        ReadMessageError::ReadFrameError(_)
                        | ReadMessageError::UnexpectedMessageStart
                        | ReadMessageError::MessageStartsWithContinuation => 1002,
                        ReadMessageError::Io(err) => return Err(err),
                    };
                    break Some((code, "Websocket Error"));
                }
            };
        };

        tx.close(close_reason).await
    }
}

/// Runs the command server forever on `port`.
pub async fn run(
    id: usize,
    port: u16,
    stack: Stack<'static>,
    config: Option<&'static picoserve::Config<Duration>>,
) -> ! {
    let default_config = picoserve::Config::new(picoserve::Timeouts {
        start_read_request: Some(Duration::from_secs(5)),
        persistent_start_read_request: None,
        read_request: Some(Duration::from_secs(1)),
        write: Some(Duration::from_secs(5)),
    });

    let config = config.unwrap_or(&default_config);

    let router = Router::new()
        .route(
            "/",
            get(|| async {
                Response::new(StatusCode::OK, HTML)
                    .with_headers([("Content-Type", "text/html; charset=utf-8")])
            }),
        )
        .route(
            "/control",
            post(|Payload(body): Payload<VelocityPayload>| async move {
                dispatch(body.map(ControlCommand::from)).await
            }),
        )
        .route(
            "/mode",
            post(|Payload(body): Payload<ModePayload>| async move {
                dispatch(body.map(ControlCommand::from)).await
            }),
        )
        .route(
            "/speed",
            post(|Payload(body): Payload<SpeedPayload>| async move {
                dispatch(body.map(ControlCommand::from)).await
            }),
        )
        .route(
            "/ws",
            get(|upgrade: WebSocketUpgrade| async move {
                tracing::info!("new websocket command stream");
                upgrade.on_upgrade(CommandSocket).with_protocol("messages")
            }),
        );

    if let Some(ip_cfg) = stack.config_v4() {
        tracing::info!("Starting server at {}:{}", ip_cfg.address, port);
    } else {
        tracing::warn!("Starting server on port {port}, but no IPv4 address is assigned yet!");
    }

    let (mut rx_buffer, mut tx_buffer, mut http_buffer) = ([0; 1024], [0; 1024], [0; 2048]);

    picoserve::listen_and_serve_with_state(
        id,
        &router,
        config,
        stack,
        port,
        &mut rx_buffer,
        &mut tx_buffer,
        &mut http_buffer,
        &(),
    )
    .await
}
