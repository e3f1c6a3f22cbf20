use livery::input::{Input, InputEvent, ViewerAction};
use livery::PartCategory;
use std::io::Write;
use tempfile::NamedTempFile;
use winit::keyboard::{Key, NamedKey};

#[test]
fn remapped_selection_keys_override_defaults() {
    let mut temp = NamedTempFile::new().expect("temp input config");
    write!(temp, r#"{{"bindings":{{"select_rim":["r"],"next_color":["space"]}}}}"#).expect("write remap config");

    let mut input = Input::from_config(temp.path());
    assert!(input.drain_actions().is_empty(), "no events yet");

    input.push(InputEvent::Key { key: Key::Character("r".into()), pressed: true });
    input.push(InputEvent::Key { key: Key::Character("4".into()), pressed: true });
    assert_eq!(input.drain_actions(), [ViewerAction::SelectPart(PartCategory::Rim)]);

    input.push(InputEvent::Key { key: Key::Named(NamedKey::Space), pressed: true });
    input.push(InputEvent::Key { key: Key::Character("]".into()), pressed: true });
    assert_eq!(input.drain_actions(), [ViewerAction::NextColor]);

    input.push(InputEvent::Key { key: Key::Character("1".into()), pressed: true });
    assert_eq!(input.drain_actions(), [ViewerAction::SelectPart(PartCategory::Body)], "untouched defaults remain");
}

#[test]
fn invalid_bindings_file_keeps_defaults() {
    let mut temp = NamedTempFile::new().expect("temp input config");
    write!(temp, "not json").expect("write config");
    let mut input = Input::from_config(temp.path());
    input.push(InputEvent::Key { key: Key::Named(NamedKey::Escape), pressed: true });
    assert_eq!(input.drain_actions(), [ViewerAction::Stop]);
}
