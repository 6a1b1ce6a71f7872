//! Page interaction: navigation, typing, clicks, pointer, dropdowns, keys, uploads.

use crate::model::{MouseAction, MouseMeta, NavigateMeta, SelectKind, SelectMeta, WriteMeta};

use super::phrase::View;

pub(super) fn navigate(meta: &NavigateMeta, view: &View<'_>) -> String {
    let mut line = match view.input() {
        Some(url) => format!("Navigate to {url}"),
        None => "Navigate".to_string(),
    };
    if meta.use_new_tab {
        line.push_str(" in a new tab");
    }
    line
}

pub(super) fn write(meta: &WriteMeta, view: &View<'_>) -> String {
    let text = view
        .input()
        .unwrap_or_else(|| "an empty value".to_string());
    match (meta.append, view.target()) {
        (false, Some(field)) => format!("Write {text} in field {field}"),
        (true, Some(field)) => format!("Append {text} to field {field}"),
        (false, None) => format!("Write {text}"),
        (true, None) => format!("Append {text}"),
    }
}

pub(super) fn click(view: &View<'_>) -> String {
    format!("Click on {}", view.subject())
}

pub(super) fn mouse(meta: &MouseMeta, view: &View<'_>) -> String {
    let subject = view.subject();
    match meta.action {
        Some(MouseAction::Click) => format!("Click on {subject}"),
        Some(MouseAction::DoubleClick) => format!("Double-click on {subject}"),
        Some(MouseAction::RightClick) => format!("Right-click on {subject}"),
        Some(MouseAction::Hover) => format!("Hover over {subject}"),
        Some(MouseAction::Move) => match (meta.x, meta.y, view.target()) {
            (Some(x), Some(y), Some(target)) => format!("Move mouse to {x}, {y} on {target}"),
            (Some(x), Some(y), None) => format!("Move mouse to {x}, {y}"),
            _ => format!("Move mouse to {subject}"),
        },
        Some(MouseAction::Down) => format!("Press mouse button on {subject}"),
        Some(MouseAction::Up) => format!("Release mouse button on {subject}"),
        Some(MouseAction::Enter) => format!("Move mouse into {subject}"),
        Some(MouseAction::Other) | None => format!("Mouse action on {subject}"),
    }
}

pub(super) fn select(meta: &SelectMeta, view: &View<'_>) -> String {
    let dropdown = view.target_or_element();
    match meta.kind {
        Some(SelectKind::Index) => {
            let index = meta.index.or_else(|| {
                view.step
                    .value
                    .as_deref()
                    .and_then(|v| v.trim().parse().ok())
            });
            match index {
                Some(n) => format!("Pick option {n} from dropdown {dropdown}"),
                None => format!("Pick an option from dropdown {dropdown}"),
            }
        }
        Some(SelectKind::Last) => format!("Pick last option from dropdown {dropdown}"),
        Some(SelectKind::Value | SelectKind::Other) | None => match view.input() {
            Some(choice) => format!("Pick {choice} from dropdown {dropdown}"),
            None => format!("Pick an option from dropdown {dropdown}"),
        },
    }
}

pub(super) fn press(view: &View<'_>) -> String {
    let key = view.input().unwrap_or_else(|| "a key".to_string());
    match view.target() {
        Some(target) => format!("Press {key} in {target}"),
        None => format!("Press {key}"),
    }
}

pub(super) fn upload(view: &View<'_>) -> String {
    let file = view.input().unwrap_or_else(|| "a file".to_string());
    format!("Upload {file} to {}", view.target_or_element())
}
