use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use crate::part::PartCategory;

/// Discrete commands produced by key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    SelectPart(PartCategory),
    NextColor,
    PreviousColor,
    Stop,
}

impl ViewerAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "select_car" => Some(Self::SelectPart(PartCategory::Body)),
            "select_brake" => Some(Self::SelectPart(PartCategory::BrakeDisc)),
            "select_seats" => Some(Self::SelectPart(PartCategory::Seat)),
            "select_rim" => Some(Self::SelectPart(PartCategory::Rim)),
            "next_color" => Some(Self::NextColor),
            "previous_color" => Some(Self::PreviousColor),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Per-frame pointer and keyboard state for the viewer window.
pub struct Input {
    bindings: InputBindings,
    drag_delta: (f32, f32),
    wheel: f32,
    actions: Vec<ViewerAction>,
    cursor_pos: Option<(f32, f32)>,
    left_pressed: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default bindings with per-action overrides from a JSON file, if it exists.
    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::with_bindings(InputBindings::load_or_default(path))
    }

    fn with_bindings(bindings: InputBindings) -> Self {
        Self { bindings, drag_delta: (0.0, 0.0), wheel: 0.0, actions: Vec::new(), cursor_pos: None, left_pressed: false }
    }

    pub fn push(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, pressed } => {
                if pressed {
                    self.apply_key_binding(&key);
                }
            }
            InputEvent::Wheel { delta } => self.wheel += delta,
            InputEvent::MouseButton { button: MouseButton::Left, pressed } => self.left_pressed = pressed,
            InputEvent::MouseButton { .. } => {}
            InputEvent::CursorPos { x, y } => {
                if let (true, Some((px, py))) = (self.left_pressed, self.cursor_pos) {
                    self.drag_delta.0 += x - px;
                    self.drag_delta.1 += y - py;
                }
                self.cursor_pos = Some((x, y));
            }
            InputEvent::Other => {}
        }
    }

    pub fn take_drag_delta(&mut self) -> Option<(f32, f32)> {
        let delta = std::mem::take(&mut self.drag_delta);
        (delta != (0.0, 0.0)).then_some(delta)
    }

    pub fn consume_wheel_delta(&mut self) -> Option<f32> {
        if self.wheel.abs() > 0.0 {
            Some(std::mem::take(&mut self.wheel))
        } else {
            None
        }
    }

    pub fn drain_actions(&mut self) -> Vec<ViewerAction> {
        std::mem::take(&mut self.actions)
    }

    fn apply_key_binding(&mut self, key: &Key) {
        if let Some(binding_key) = InputKeyBinding::from_event_key(key) {
            let actions: Vec<_> = self.bindings.actions_for_key(&binding_key).collect();
            self.actions.extend(actions);
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::with_bindings(InputBindings::default())
    }
}

#[derive(Debug, Clone)]
struct InputBindings {
    key_to_actions: HashMap<InputKeyBinding, Vec<ViewerAction>>,
}

impl InputBindings {
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfigFile>(&contents) {
                Ok(config) => Self::from_config(config, &path.display().to_string()),
                Err(err) => {
                    log::warn!("Failed to parse {}: {err}. Falling back to default bindings.", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::debug!("No input bindings at {} ({err}), using defaults.", path.display());
                Self::default()
            }
        }
    }

    fn from_config(config: InputConfigFile, origin: &str) -> Self {
        let mut action_map = Self::default_action_map();
        for (action, keys) in config.into_overrides(origin) {
            action_map.insert(action, keys);
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<ViewerAction, Vec<InputKeyBinding>> {
        use ViewerAction::*;
        let mut map = HashMap::new();
        map.insert(SelectPart(PartCategory::Body), vec![InputKeyBinding::character("1")]);
        map.insert(SelectPart(PartCategory::BrakeDisc), vec![InputKeyBinding::character("2")]);
        map.insert(SelectPart(PartCategory::Seat), vec![InputKeyBinding::character("3")]);
        map.insert(SelectPart(PartCategory::Rim), vec![InputKeyBinding::character("4")]);
        map.insert(PreviousColor, vec![InputKeyBinding::character("[")]);
        map.insert(NextColor, vec![InputKeyBinding::character("]")]);
        map.insert(Stop, vec![InputKeyBinding::Named(NamedKeyCode::Escape)]);
        map
    }

    fn from_action_map(action_map: HashMap<ViewerAction, Vec<InputKeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<InputKeyBinding, Vec<ViewerAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &InputKeyBinding) -> impl Iterator<Item = ViewerAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InputKeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl InputKeyBinding {
    fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) if !ch.is_empty() => Some(Self::Character(ch.to_lowercase())),
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Some(Self::Named(named));
        }
        (normalized.chars().count() == 1).then_some(Self::Character(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    Escape,
    Space,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Escape => Some(Self::Escape),
            NamedKey::Space => Some(Self::Space),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "escape" | "esc" => Some(Self::Escape),
            "space" => Some(Self::Space),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<ViewerAction, Vec<InputKeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let Some(action) = ViewerAction::from_str(&action_name.trim().to_lowercase()) else {
                log::warn!("{origin}: unknown action '{action_name}', ignoring.");
                continue;
            };
            let mut parsed = Vec::new();
            for key in keys {
                match InputKeyBinding::from_config_value(&key) {
                    Some(binding) => parsed.push(binding),
                    None => log::warn!("{origin}: unknown key '{key}' for action '{action_name}', ignoring."),
                }
            }
            if parsed.is_empty() {
                log::warn!("{origin}: action '{action_name}' has no valid keys, keeping defaults.");
                continue;
            }
            overrides.insert(action, parsed);
        }
        overrides
    }
}

pub enum InputEvent {
    Key { key: Key, pressed: bool },
    Wheel { delta: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    CursorPos { x: f32, y: f32 },
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 100.0,
                };
                InputEvent::Wheel { delta: d }
            }
            WindowEvent::CursorMoved { position, .. } => {
                InputEvent::CursorPos { x: position.x as f32, y: position.y as f32 }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                InputEvent::MouseButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            _ => InputEvent::Other,
        }
    }
}
