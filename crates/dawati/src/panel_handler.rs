//! Runs the panel host on its own tokio runtime and relays between it and the gtk main loop.

use anyhow::Result;
use panel_host::{PanelGeometry, PanelRequest};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::app::DaemonCommand;

/// Start the panel handler thread, and return a handle that can be used to send it requests.
pub fn init(evt_send: UnboundedSender<DaemonCommand>) -> Result<PanelHandlerHandle> {
    let (request_send, request_recv) = tokio::sync::mpsc::unbounded_channel();
    let thread_handle = std::thread::Builder::new().name("outer-panel-handler".to_string()).spawn(move || {
        let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().thread_name("panel-handler").build() {
            Ok(rt) => rt,
            Err(err) => {
                log::error!("Failed to initialize tokio runtime for the panel handler: {}", err);
                return;
            }
        };
        rt.block_on(run(request_recv, evt_send));
    })?;
    Ok(PanelHandlerHandle { request_send, thread_handle: Some(thread_handle) })
}

async fn run(request_recv: UnboundedReceiver<PanelRequest>, evt_send: UnboundedSender<DaemonCommand>) {
    let con = match zbus::Connection::session().await {
        Ok(con) => con,
        Err(err) => {
            log::error!("Could not connect to the session bus, panels will not work: {}", err);
            return;
        }
    };

    let (event_send, mut event_recv) = tokio::sync::mpsc::unbounded_channel();
    let host = panel_host::run_host(con, request_recv, event_send);
    tokio::pin!(host);

    loop {
        tokio::select! {
            () = &mut host => break,
            Some(event) = event_recv.recv() => {
                if evt_send.send(DaemonCommand::PanelEvent(event)).is_err() {
                    log::debug!("App is gone, no longer forwarding panel events");
                }
            }
        }
    }
    log::debug!("Panel handler stopped");
}

/// Handle to the panel handler thread.
#[derive(Debug)]
pub struct PanelHandlerHandle {
    request_send: UnboundedSender<PanelRequest>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl PanelHandlerHandle {
    /// Sender for the toolbar buttons to request showing and hiding their panels.
    pub fn sender(&self) -> UnboundedSender<PanelRequest> {
        self.request_send.clone()
    }

    pub fn set_geometry(&self, geometry: PanelGeometry) {
        crate::log_err!("while forwarding panel geometry to the panel handler", self.request_send.send(PanelRequest::SetGeometry(geometry)));
    }

    /// Unload all panels and wait for the panel handler thread to finish.
    pub fn stop(&mut self) {
        let _ = self.request_send.send(PanelRequest::Shutdown);
        if let Some(thread_handle) = self.thread_handle.take() {
            if thread_handle.join().is_err() {
                log::error!("Panel handler thread panicked");
            }
        }
    }
}
