use std::collections::HashSet;

use dawati_shared_util::PanelName;

use crate::{
    error::ConstructionError,
    modal::{InputGrab, ModalOptions},
    surface::SurfaceId,
    toolbar::{ButtonState, ToolbarBackend},
};

pub fn names(list: &[&str]) -> Vec<PanelName> {
    list.iter().map(|name| PanelName::from(*name)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    Destroy(String),
    Show(String),
    Hide(String),
    SetChecked(u32, bool),
    State(u32, ButtonState),
    Style(u32, String),
}

/// Backend that hands out numbered buttons and keeps track of their on-screen order.
/// Button `n` lives on surface `SurfaceId(n)`.
#[derive(Debug, Default)]
pub struct FakeBackend {
    next_id: u32,
    pub on_screen: Vec<(u32, String)>,
    pub calls: Vec<Call>,
    pub broken: HashSet<String>,
}

impl FakeBackend {
    pub fn screen_order(&self) -> Vec<&str> {
        self.on_screen.iter().map(|(_, name)| name.as_str()).collect()
    }

    pub fn lifecycle_calls(&self) -> Vec<&Call> {
        self.calls.iter().filter(|call| matches!(call, Call::Create(_) | Call::Destroy(_))).collect()
    }
}

impl ToolbarBackend for FakeBackend {
    type Button = u32;

    fn create_button(&mut self, name: &PanelName) -> Result<u32, ConstructionError> {
        if self.broken.contains(name.as_str()) {
            return Err(ConstructionError::new(name.clone(), "no such panel"));
        }
        self.next_id += 1;
        self.on_screen.push((self.next_id, name.to_string()));
        self.calls.push(Call::Create(name.to_string()));
        Ok(self.next_id)
    }

    fn destroy_button(&mut self, name: &PanelName, button: u32) {
        self.on_screen.retain(|(id, _)| *id != button);
        self.calls.push(Call::Destroy(name.to_string()));
    }

    fn move_to_end(&mut self, button: &u32) {
        if let Some(index) = self.on_screen.iter().position(|(id, _)| id == button) {
            let entry = self.on_screen.remove(index);
            self.on_screen.push(entry);
        }
    }

    fn set_checked(&mut self, button: &u32, checked: bool) {
        self.calls.push(Call::SetChecked(*button, checked));
    }

    fn request_show(&mut self, name: &PanelName) {
        self.calls.push(Call::Show(name.to_string()));
    }

    fn request_hide(&mut self, name: &PanelName) {
        self.calls.push(Call::Hide(name.to_string()));
    }

    fn set_button_state(&mut self, button: &u32, state: ButtonState) {
        self.calls.push(Call::State(*button, state));
    }

    fn set_button_style(&mut self, button: &u32, style: &str) {
        self.calls.push(Call::Style(*button, style.to_string()));
    }

    fn surface(&self, button: &u32) -> SurfaceId {
        SurfaceId(u64::from(*button))
    }
}

#[derive(Debug, Default)]
pub struct FakeGrab {
    pub focus: Option<SurfaceId>,
    pub grabbed: bool,
    pub refuse_grab: bool,
    pub begin_calls: Vec<u32>,
    pub end_calls: Vec<u32>,
    pub now: u32,
}

impl FakeGrab {
    pub fn focused_on(surface: SurfaceId) -> Self {
        FakeGrab { focus: Some(surface), now: 42, ..Default::default() }
    }
}

impl InputGrab for FakeGrab {
    fn current_time(&self) -> u32 {
        self.now
    }

    fn begin_exclusive_input(&mut self, timestamp: u32, _options: ModalOptions) -> bool {
        self.begin_calls.push(timestamp);
        if self.refuse_grab {
            return false;
        }
        self.grabbed = true;
        true
    }

    fn end_exclusive_input(&mut self, timestamp: u32) {
        self.end_calls.push(timestamp);
        self.grabbed = false;
    }

    fn focus(&self) -> Option<SurfaceId> {
        self.focus
    }

    fn set_focus(&mut self, surface: Option<SurfaceId>) {
        self.focus = surface;
    }
}
