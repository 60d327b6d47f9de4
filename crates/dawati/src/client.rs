use std::{
    io::{Read, Write},
    os::unix::net::UnixStream,
    process::Stdio,
    time::Duration,
};

use anyhow::{Context, Result};

use crate::{
    daemon_response::DaemonResponse,
    opts::{ActionClientOnly, ActionWithServer},
    paths::DawatiPaths,
};

/// How long to wait for the daemon to answer a command.
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(100);

pub fn handle_client_only_action(paths: &DawatiPaths, action: ActionClientOnly) -> Result<()> {
    match action {
        ActionClientOnly::Logs => {
            std::process::Command::new("tail")
                .arg("-f")
                .arg(paths.get_log_file())
                .stdin(Stdio::null())
                .spawn()
                .context("Failed to run tail on the log file")?
                .wait()?;
        }
    }
    Ok(())
}

/// Encode an action the way the IPC server expects it: the length of the payload as 4 big-endian bytes, then the payload.
pub fn frame_action(action: &ActionWithServer) -> Result<Vec<u8>> {
    let payload = bincode::serialize(action).context("Failed to serialize command")?;
    let len = u32::try_from(payload.len()).context("Command too large to send")?;
    let mut message = Vec::with_capacity(4 + payload.len());
    message.extend_from_slice(&len.to_be_bytes());
    message.extend_from_slice(&payload);
    Ok(message)
}

/// Send an action to the daemon over an open connection.
/// Returns `Ok(None)` if the daemon did not answer, which does _not_ indicate failure.
pub fn do_server_call(stream: &mut UnixStream, action: &ActionWithServer) -> Result<Option<DaemonResponse>> {
    log::debug!("Forwarding {:?} to server", action);
    stream.set_nonblocking(false).context("Failed to set stream to blocking mode")?;
    stream.write_all(&frame_action(action)?).context("Failed to write command to IPC stream")?;

    let mut buf = Vec::new();
    stream.set_read_timeout(Some(RESPONSE_TIMEOUT)).context("Failed to set read timeout")?;
    stream.read_to_end(&mut buf).context("Error reading response from server")?;

    if buf.is_empty() {
        Ok(None)
    } else {
        Ok(Some(bincode::deserialize(&buf).context("Failed to parse response from server")?))
    }
}
