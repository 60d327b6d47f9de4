use crate::{app, opts};
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    sync::mpsc::*,
};

/// Largest command the server accepts. Panel orders are short, anything bigger is garbage.
const MAX_MESSAGE_SIZE: u32 = 64 * 1024;

pub async fn run_server<P: AsRef<std::path::Path>>(evt_send: UnboundedSender<app::DaemonCommand>, socket_path: P) -> Result<()> {
    let socket_path = socket_path.as_ref();
    let listener = tokio::net::UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind IPC socket {}", socket_path.display()))?;
    log::info!("IPC server initialized");
    crate::select_until_shutdown! {
        connection = listener.accept() => match connection {
            Ok((stream, _addr)) => {
                let evt_send = evt_send.clone();
                tokio::spawn(async move {
                    let result = handle_connection(stream, evt_send).await;
                    crate::log_err!("while handling IPC connection with client", result);
                });
            },
            Err(e) => log::error!("Failed to connect to client: {:?}", e),
        }
    }
    let _ = std::fs::remove_file(socket_path);
    Ok(())
}

/// Handle a single IPC connection from start to end.
async fn handle_connection(mut stream: tokio::net::UnixStream, evt_send: UnboundedSender<app::DaemonCommand>) -> Result<()> {
    let (mut stream_read, mut stream_write) = stream.split();

    let action: opts::ActionWithServer = read_action_from_stream(&mut stream_read).await?;

    log::debug!("received command from IPC: {:?}", &action);

    let (command, maybe_response_recv) = action.into_daemon_command();

    evt_send.send(command)?;

    if let Some(mut response_recv) = maybe_response_recv {
        log::debug!("Waiting for response for IPC client");
        if let Ok(Some(response)) = tokio::time::timeout(Duration::from_millis(100), response_recv.recv()).await {
            let response = bincode::serialize(&response)?;
            let result = &stream_write.write_all(&response).await;
            crate::log_err!("sending text response to ipc client", &result);
        }
    }
    stream_write.shutdown().await?;
    Ok(())
}

/// Read a single length-prefixed message (see [`crate::client::frame_action`]) and parse it into an `ActionWithServer`.
async fn read_action_from_stream<R: AsyncRead + Unpin>(stream_read: &mut R) -> Result<opts::ActionWithServer> {
    let mut message_byte_length = [0u8; 4];
    stream_read.read_exact(&mut message_byte_length).await.context("Failed to read message size header in IPC message")?;
    let message_byte_length = u32::from_be_bytes(message_byte_length);
    if message_byte_length > MAX_MESSAGE_SIZE {
        anyhow::bail!("IPC message of {} bytes exceeds the limit of {} bytes", message_byte_length, MAX_MESSAGE_SIZE);
    }
    let mut raw_message = vec![0u8; message_byte_length as usize];
    stream_read.read_exact(&mut raw_message).await.context("Failed to read actual IPC message")?;

    bincode::deserialize(&raw_message).context("Failed to parse client message")
}
