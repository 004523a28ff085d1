use winit::event::{MouseScrollDelta, WindowEvent};

use crate::input::{InputEvent, LINE_HEIGHT_PX};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events not represented by the input subsystem. Resizes are
/// reported by the runtime once the surface and canvas have followed.
pub(crate) fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Wheel {
            dy: wheel_dy(*delta),
        }),

        _ => None,
    }
}

/// Vertical wheel motion in pixels, positive when the content should move up.
fn wheel_dy(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
        MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
    }
}
