//! Waiting, scrolling, frames and windows, dialogs, cookies.

use crate::model::{
    CookieKind, CookieMeta, DismissKind, DismissMeta, ScrollKind, ScrollMeta, SwitchKind,
    SwitchMeta, WaitMeta, WindowKind, WindowMeta,
};

use super::phrase::{View, duration, quote};

pub(super) fn wait_for_element(meta: &WaitMeta, view: &View<'_>) -> String {
    let mut line = format!("Wait for {}", view.subject());
    if let Some(ms) = meta.timeout_ms {
        line.push_str(&format!(" for up to {}", duration(ms)));
    }
    line
}

pub(super) fn wait_for_time(meta: &WaitMeta, view: &View<'_>) -> String {
    let ms = meta.duration_ms.or_else(|| {
        view.step
            .value
            .as_deref()
            .and_then(|v| v.trim().parse().ok())
    });
    match ms {
        Some(ms) => format!("Wait {}", duration(ms)),
        None => "Wait".to_string(),
    }
}

pub(super) fn scroll(meta: &ScrollMeta, view: &View<'_>) -> String {
    match meta.kind {
        Some(ScrollKind::Bottom) => "Scroll to the bottom of the page".to_string(),
        Some(ScrollKind::Top) => "Scroll to the top of the page".to_string(),
        Some(ScrollKind::Element) => format!("Scroll to {}", view.target_or_element()),
        Some(ScrollKind::Other) | None => {
            if let Some(direction) = &meta.direction {
                let mut line = format!("Scroll {}", direction.to_lowercase());
                if let Some(pixels) = meta.y.or(meta.x) {
                    line.push_str(&format!(" by {} pixels", pixels.abs()));
                }
                line
            } else if let (Some(x), Some(y)) = (meta.x, meta.y) {
                format!("Scroll by {x}, {y}")
            } else if let Some(target) = view.target() {
                format!("Scroll to {target}")
            } else {
                "Scroll the page".to_string()
            }
        }
    }
}

pub(super) fn switch(meta: &SwitchMeta, view: &View<'_>) -> String {
    let named = |what: &str| match view.input() {
        Some(name) => format!("Switch to {what} {name}"),
        None => format!("Switch to {what}"),
    };
    match meta.kind {
        Some(SwitchKind::ParentFrame) => "Switch to parent frame".to_string(),
        Some(SwitchKind::Frame) => match view.target() {
            Some(frame) => format!("Switch to iframe {frame}"),
            None => named("iframe"),
        },
        Some(SwitchKind::NextWindow) => "Switch to next window".to_string(),
        Some(SwitchKind::PreviousWindow) => "Switch to previous window".to_string(),
        Some(SwitchKind::NextTab) => "Switch to next tab".to_string(),
        Some(SwitchKind::PreviousTab) => "Switch to previous tab".to_string(),
        Some(SwitchKind::Window) => named("window"),
        Some(SwitchKind::Tab) => named("tab"),
        Some(SwitchKind::Other) | None => match view.target() {
            Some(target) => format!("Switch context to {target}"),
            None => "Switch context".to_string(),
        },
    }
}

pub(super) fn window(meta: &WindowMeta) -> String {
    let resize = match (meta.width, meta.height) {
        (Some(w), Some(h)) => format!("Resize window to {w} x {h}"),
        _ => "Resize window".to_string(),
    };
    match meta.kind {
        Some(WindowKind::Maximize) => "Maximize window".to_string(),
        Some(WindowKind::Resize) => resize,
        Some(WindowKind::Other) | None if meta.width.is_some() && meta.height.is_some() => resize,
        Some(WindowKind::Other) | None => "Adjust window".to_string(),
    }
}

pub(super) fn dismiss(meta: &DismissMeta, view: &View<'_>) -> String {
    let dialog = match meta.kind {
        Some(DismissKind::Alert) => "alert",
        Some(DismissKind::Confirm) => "confirm dialog",
        Some(DismissKind::Prompt) => "prompt",
        Some(DismissKind::Other) | None => "dialog",
    };
    match view.input() {
        Some(reply) => format!("Dismiss {dialog} responding with {reply}"),
        None => format!("Dismiss {dialog}"),
    }
}

pub(super) fn cookie(meta: &CookieMeta, view: &View<'_>) -> String {
    let name = meta.name.as_deref().map(quote);
    match (meta.kind, name) {
        (Some(CookieKind::Create), Some(name)) => match view.input() {
            Some(value) => format!("Create cookie {name} with value {value}"),
            None => format!("Create cookie {name}"),
        },
        (Some(CookieKind::Create), None) => "Create cookie".to_string(),
        (Some(CookieKind::Delete), Some(name)) => format!("Delete cookie {name}"),
        (Some(CookieKind::Delete), None) => "Delete cookie".to_string(),
        (Some(CookieKind::Wipe), _) => "Delete all cookies".to_string(),
        (Some(CookieKind::Other) | None, _) => "Manage cookies".to_string(),
    }
}
