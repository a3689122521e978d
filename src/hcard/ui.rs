//! Buttons and keys of the viewer.
//!
//! In the browser the page's buttons send [`HcardEvent`]s through an
//! [`EventSender`](crate::flow::EventSender); natively the same events are
//! bound to keys.

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{Key, NamedKey},
};

use crate::hcard::{CameraPreset, HcardEvent};

pub const PAGE1_BUTTON: &str = "page1Button";
pub const PAGE2_BUTTON: &str = "page2Button";
pub const ANIMATION_BUTTON: &str = "animationButton";
/// Optional element receiving the load status text.
pub const STATUS_ELEMENT: &str = "loadStatus";

pub const BUTTONS: [&str; 3] = [PAGE1_BUTTON, PAGE2_BUTTON, ANIMATION_BUTTON];

/// The event a click on the button with element id `id` stands for.
pub fn button_event(id: &str) -> Option<HcardEvent> {
    match id {
        PAGE1_BUTTON => Some(HcardEvent::JumpTo(CameraPreset::Page1)),
        PAGE2_BUTTON => Some(HcardEvent::JumpTo(CameraPreset::Page2)),
        ANIMATION_BUTTON => Some(HcardEvent::ReplayAnimation),
        _ => None,
    }
}

/// Maps `1`, `2` and `Space` to the events of the three buttons. Key repeats are ignored.
pub fn key_event(event: &WindowEvent) -> Option<HcardEvent> {
    let WindowEvent::KeyboardInput {
        event:
            KeyEvent {
                logical_key,
                state: ElementState::Pressed,
                repeat: false,
                ..
            },
        ..
    } = event
    else {
        return None;
    };
    match logical_key {
        Key::Character(c) if c.as_str() == "1" => button_event(PAGE1_BUTTON),
        Key::Character(c) if c.as_str() == "2" => button_event(PAGE2_BUTTON),
        Key::Named(NamedKey::Space) => button_event(ANIMATION_BUTTON),
        _ => None,
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{bind_buttons, show_status};

#[cfg(target_arch = "wasm32")]
mod web {
    use anyhow::Context as _;
    use wasm_bindgen::{JsCast, closure::Closure};

    use super::{BUTTONS, STATUS_ELEMENT, button_event};
    use crate::{flow::EventSender, hcard::HcardEvent};

    fn document() -> anyhow::Result<web_sys::Document> {
        web_sys::window()
            .and_then(|window| window.document())
            .context("no document to bind to")
    }

    /// Registers click listeners on the page's buttons. Missing buttons are skipped.
    pub fn bind_buttons(sender: &EventSender<(), HcardEvent>) -> anyhow::Result<()> {
        let document = document()?;
        for id in BUTTONS {
            let Some(element) = document.get_element_by_id(id) else {
                log::warn!("Button #{id} not found, it stays unbound");
                continue;
            };
            let sender = sender.clone();
            let on_click = Closure::<dyn FnMut(web_sys::Event)>::new(move |_: web_sys::Event| {
                if let Some(event) = button_event(id) {
                    sender.send(event);
                }
            });
            element
                .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
                .map_err(|_| anyhow::anyhow!("could not listen to clicks on #{id}"))?;
            // The listeners live as long as the page
            on_click.forget();
        }
        Ok(())
    }

    /// Shows `message` in the status element, or empties it.
    pub fn show_status(message: Option<&str>) {
        let element = document()
            .ok()
            .and_then(|document| document.get_element_by_id(STATUS_ELEMENT));
        match element {
            Some(element) => element.set_text_content(message),
            None => {
                if let Some(message) = message {
                    log::warn!("#{STATUS_ELEMENT} not found: {message}");
                }
            }
        }
    }
}
