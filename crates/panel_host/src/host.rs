use std::{collections::HashMap, time::Duration};

use dawati_shared_util::PanelName;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use zbus::CacheProperties;

use crate::{dbus::PanelProxy, Error, LinkAction, PanelLink, PanelMetadata, Result};

/// Where panels may place their windows, handed to them in `InitPanel` and `SetMaximumSize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelGeometry {
    pub x: i32,
    pub y: i32,
    pub max_width: i32,
    pub max_height: i32,
}

/// Requests from the toolbar to the panel host.
#[derive(Debug)]
pub enum PanelRequest {
    Load(PanelMetadata),
    Show(PanelName),
    Hide(PanelName),
    Unload(PanelName),
    SetGeometry(PanelGeometry),
    /// Unload every running panel and stop the host.
    Shutdown,
}

/// How long shutdown waits for panels to acknowledge `Unload`.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Things the panels told the host, forwarded to the toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    Initialized { name: PanelName, tooltip: String, button_style: String },
    ButtonStyle { name: PanelName, style: String },
    ButtonState { name: PanelName, state: u32 },
    Tooltip { name: PanelName, tooltip: String },
    Modality { name: PanelName, modal: bool },
    FocusRequested(PanelName),
    Vanished(PanelName),
    Failed { name: PanelName, message: String },
}

impl PanelEvent {
    /// The panel the event is about.
    pub fn panel(&self) -> &PanelName {
        match self {
            PanelEvent::Initialized { name, .. }
            | PanelEvent::ButtonStyle { name, .. }
            | PanelEvent::ButtonState { name, .. }
            | PanelEvent::Tooltip { name, .. }
            | PanelEvent::Modality { name, .. }
            | PanelEvent::FocusRequested(name)
            | PanelEvent::Vanished(name)
            | PanelEvent::Failed { name, .. } => name,
        }
    }
}

/// Events produced by the per-panel tasks, handled by the host loop.
#[derive(Debug)]
enum HostEvent {
    OwnerChanged(PanelName, bool),
    Ready(PanelName),
    CallDone(PanelName, LinkAction),
    Initialized(PanelName, String, String),
    CallFailed(PanelName, LinkAction, String),
    Forward(PanelEvent),
}

impl HostEvent {
    fn panel(&self) -> &PanelName {
        match self {
            HostEvent::OwnerChanged(name, _)
            | HostEvent::Ready(name)
            | HostEvent::CallDone(name, _)
            | HostEvent::Initialized(name, ..)
            | HostEvent::CallFailed(name, ..) => name,
            HostEvent::Forward(event) => event.panel(),
        }
    }
}

/// What the host does about a [`HostEvent`]: tell the toolbar something, call the panel, or both.
#[derive(Debug, Default, PartialEq, Eq)]
struct Reaction {
    forward: Option<PanelEvent>,
    call: Option<LinkAction>,
}

impl Reaction {
    fn forward(event: PanelEvent) -> Self {
        Reaction { forward: Some(event), call: None }
    }

    fn call(action: Option<LinkAction>) -> Self {
        Reaction { forward: None, call: action }
    }
}

/// Update the link of the panel an event belongs to. `link` is None if the panel is not loaded
/// (anymore); events of such panels are dropped.
fn react(link: Option<&mut PanelLink>, event: HostEvent) -> Reaction {
    let Some(link) = link else {
        log::debug!("Dropping {:?}, the panel is not loaded", event);
        return Reaction::default();
    };
    match event {
        HostEvent::OwnerChanged(_, true) => Reaction::call(link.name_appeared()),
        HostEvent::OwnerChanged(name, false) => {
            if link.show_pending() {
                log::debug!("Panel {} went away before it could be shown", name);
            }
            link.name_vanished();
            Reaction::forward(PanelEvent::Vanished(name))
        }
        HostEvent::Ready(name) => {
            log::debug!("Panel {} is ready", name);
            link.ready();
            Reaction::default()
        }
        HostEvent::CallDone(_, LinkAction::Ping) => Reaction::call(link.ping_replied()),
        HostEvent::CallDone(..) => Reaction::default(),
        HostEvent::Initialized(name, tooltip, button_style) => {
            log::info!("Initialized panel {}", name);
            Reaction { forward: Some(PanelEvent::Initialized { name, tooltip, button_style }), call: link.initialized() }
        }
        HostEvent::CallFailed(name, action, message) => {
            log::warn!("Call {:?} on panel {} failed: {}", action, name, message);
            link.call_failed(action);
            Reaction::forward(PanelEvent::Failed { name, message })
        }
        HostEvent::Forward(event) => Reaction::forward(event),
    }
}

struct Panel {
    link: PanelLink,
    proxy: PanelProxy<'static>,
    listener: tokio::task::JoinHandle<()>,
}

impl Drop for Panel {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

struct PanelHost {
    con: zbus::Connection,
    panels: HashMap<PanelName, Panel>,
    geometry: PanelGeometry,
    evt_send: UnboundedSender<PanelEvent>,
    host_send: UnboundedSender<HostEvent>,
}

/// Serve panel requests until [`PanelRequest::Shutdown`] is received or the request channel is closed.
///
/// Calls to the panels are made from spawned tasks, so a slow or hanging panel never blocks the others.
/// On shutdown the `Unload` calls are awaited instead, as the runtime may go away right after.
pub async fn run_host(con: zbus::Connection, mut requests: UnboundedReceiver<PanelRequest>, evt_send: UnboundedSender<PanelEvent>) {
    let (host_send, mut host_recv) = tokio::sync::mpsc::unbounded_channel();
    let mut host = PanelHost { con, panels: HashMap::new(), geometry: PanelGeometry::default(), evt_send, host_send };

    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(PanelRequest::Shutdown) | None => break,
                Some(request) => host.handle_request(request).await,
            },
            Some(event) = host_recv.recv() => host.handle_host_event(event),
        }
    }
    host.shutdown().await;
}

impl PanelHost {
    async fn handle_request(&mut self, request: PanelRequest) {
        log::debug!("Handling panel request: {:?}", request);
        match request {
            PanelRequest::Load(metadata) => {
                let name = metadata.name.clone();
                if let Err(err) = self.load(metadata).await {
                    log::error!("Failed to connect to panel {}: {}", name, err);
                    self.send(PanelEvent::Failed { name, message: err.to_string() });
                }
            }
            PanelRequest::Show(name) => self.request_link(&name, PanelLink::show),
            PanelRequest::Hide(name) => self.request_link(&name, PanelLink::hide),
            PanelRequest::Unload(name) => self.unload(&name),
            PanelRequest::Shutdown => {}
            PanelRequest::SetGeometry(geometry) => {
                self.geometry = geometry;
                for panel in self.panels.values().filter(|panel| panel.link.is_running()) {
                    let proxy = panel.proxy.clone();
                    tokio::spawn(async move {
                        if let Err(err) = proxy.set_maximum_size(geometry.max_width, geometry.max_height).await {
                            log::warn!("Failed to update maximum panel size: {}", err);
                        }
                    });
                }
            }
        }
    }

    async fn load(&mut self, metadata: PanelMetadata) -> Result<()> {
        if self.panels.contains_key(&metadata.name) {
            log::debug!("Panel {} is already loaded", metadata.name);
            return Ok(());
        }
        let proxy = PanelProxy::builder(&self.con)
            .destination(metadata.service.0.clone())?
            .path(metadata.service.object_path())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        let listener = tokio::spawn({
            let name = metadata.name.clone();
            let proxy = proxy.clone();
            let host_send = self.host_send.clone();
            async move {
                if let Err(err) = forward_signals(name.clone(), proxy, host_send).await {
                    log::error!("Stopped listening to signals of panel {}: {}", name, err);
                }
            }
        });
        log::info!("Loaded panel {} ({})", metadata.name, metadata.service);
        self.panels.insert(metadata.name, Panel { link: PanelLink::new(), proxy, listener });
        Ok(())
    }

    fn unload(&mut self, name: &PanelName) {
        self.request_link(name, PanelLink::unload);
        if self.panels.remove(name).is_some() {
            log::info!("Unloaded panel {}", name);
        }
    }

    /// Like [`PanelHost::update_link`], for requests coming from the toolbar.
    fn request_link(&mut self, name: &PanelName, transition: impl FnOnce(&mut PanelLink) -> Option<LinkAction>) {
        if let Err(err) = self.update_link(name, transition) {
            log::warn!("Ignoring request: {}", err);
        }
    }

    async fn shutdown(&mut self) {
        let running: Vec<(PanelName, PanelProxy<'static>)> = self
            .panels
            .drain()
            .filter(|(_, panel)| panel.link.is_running())
            .map(|(name, panel)| (name, panel.proxy.clone()))
            .collect();
        log::debug!("Panel host stopping, unloading {} panel(s)", running.len());

        let unloads = running.iter().map(|(name, proxy)| async move {
            if let Err(err) = proxy.unload().await {
                log::warn!("Failed to unload panel {}: {}", name, err);
            }
        });
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, futures::future::join_all(unloads)).await.is_err() {
            log::warn!("Not all panels acknowledged unloading in time");
        }
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        let name = event.panel().clone();
        let reaction = react(self.panels.get_mut(&name).map(|panel| &mut panel.link), event);
        if let Some(event) = reaction.forward {
            self.send(event);
        }
        if let (Some(action), Some(panel)) = (reaction.call, self.panels.get(&name)) {
            spawn_call(name, panel.proxy.clone(), action, self.geometry, self.host_send.clone());
        }
    }

    /// Apply a transition to the link of a panel and perform the call it asks for.
    fn update_link(&mut self, name: &PanelName, transition: impl FnOnce(&mut PanelLink) -> Option<LinkAction>) -> Result<()> {
        let panel = self.panels.get_mut(name).ok_or_else(|| Error::UnknownPanel(name.clone()))?;
        if let Some(action) = transition(&mut panel.link) {
            spawn_call(name.clone(), panel.proxy.clone(), action, self.geometry, self.host_send.clone());
        }
        Ok(())
    }

    fn send(&self, event: PanelEvent) {
        if let Err(err) = self.evt_send.send(event) {
            log::warn!("Failed to forward panel event: {:?}", err);
        }
    }
}

fn spawn_call(
    name: PanelName,
    proxy: PanelProxy<'static>,
    action: LinkAction,
    geometry: PanelGeometry,
    host_send: UnboundedSender<HostEvent>,
) {
    tokio::spawn(async move {
        log::debug!("Calling {:?} on panel {}", action, name);
        let result = match action {
            LinkAction::Ping => proxy.ping().await.map(|_| HostEvent::CallDone(name.clone(), action)),
            LinkAction::InitPanel => proxy
                .init_panel(geometry.x, geometry.y, geometry.max_width, geometry.max_height)
                .await
                .map(|(_, _, tooltip, _, button_style, _, _)| HostEvent::Initialized(name.clone(), tooltip, button_style)),
            LinkAction::Show => proxy.show().await.map(|_| HostEvent::CallDone(name.clone(), action)),
            LinkAction::Hide => proxy.hide().await.map(|_| HostEvent::CallDone(name.clone(), action)),
            LinkAction::Unload => proxy.unload().await.map(|_| HostEvent::CallDone(name.clone(), action)),
        };
        let event = result.unwrap_or_else(|err| HostEvent::CallFailed(name, action, err.to_string()));
        let _ = host_send.send(event);
    });
}

/// Turn the signals of one panel into [`HostEvent`]s until the panel is unloaded.
async fn forward_signals(name: PanelName, proxy: PanelProxy<'static>, host_send: UnboundedSender<HostEvent>) -> zbus::Result<()> {
    use futures::StreamExt;

    let owner_changed = proxy.inner().receive_owner_changed().await?;
    let button_style = proxy.receive_request_button_style().await?;
    let button_state = proxy.receive_request_button_state().await?;
    let tooltip = proxy.receive_request_tooltip().await?;
    let modality = proxy.receive_request_modality().await?;
    let focus = proxy.receive_request_focus().await?;
    let ready = proxy.receive_ready().await?;
    tokio::pin!(owner_changed, button_style, button_state, tooltip, modality, focus, ready);

    loop {
        let event = tokio::select! {
            Some(owner) = owner_changed.next() => HostEvent::OwnerChanged(name.clone(), owner.is_some()),
            Some(signal) = button_style.next() => {
                let style = signal.args()?.style_id.to_string();
                HostEvent::Forward(PanelEvent::ButtonStyle { name: name.clone(), style })
            }
            Some(signal) = button_state.next() => {
                let state = signal.args()?.state;
                HostEvent::Forward(PanelEvent::ButtonState { name: name.clone(), state: u32::try_from(state).unwrap_or_default() })
            }
            Some(signal) = tooltip.next() => {
                let tooltip = signal.args()?.tooltip.to_string();
                HostEvent::Forward(PanelEvent::Tooltip { name: name.clone(), tooltip })
            }
            Some(signal) = modality.next() => {
                let modal = signal.args()?.state;
                HostEvent::Forward(PanelEvent::Modality { name: name.clone(), modal })
            }
            Some(_) = focus.next() => HostEvent::Forward(PanelEvent::FocusRequested(name.clone())),
            Some(_) = ready.next() => HostEvent::Ready(name.clone()),
            else => break,
        };
        if host_send.send(event).is_err() {
            break;
        }
    }
    Ok(())
}
