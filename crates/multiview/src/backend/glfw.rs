//! GLFW toolkit with one OpenGL context per window
//!
//! GLFW must be initialized, polled and torn down on a single thread; the
//! context guarantees that by building this toolkit inside its worker.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use glfw::Context as _;

use crate::backend::{next_window_id, Toolkit, ToolkitError, ToolkitEvent, ToolkitFactory, WindowId, WindowSpec};
use crate::diagnostics::GpuError;
use crate::window::{ButtonState, Modifiers, MouseButton, MouseEvent};

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    redisplay: bool,
    buttons_held: u32,
    initial_size: Option<(u32, u32)>,
}

impl GlfwWindow {
    fn cursor(&self) -> (i32, i32) {
        let (x, y) = self.window.get_cursor_pos();
        (x as i32, y as i32)
    }

    fn translate(&mut self, event: glfw::WindowEvent) -> Option<ToolkitEvent> {
        match event {
            glfw::WindowEvent::FramebufferSize(width, height) => Some(ToolkitEvent::Reshape {
                width: width.max(0) as u32,
                height: height.max(0) as u32,
            }),
            glfw::WindowEvent::MouseButton(button, action, mods) => {
                let state = match action {
                    glfw::Action::Press => {
                        self.buttons_held += 1;
                        ButtonState::Pressed
                    }
                    glfw::Action::Release => {
                        self.buttons_held = self.buttons_held.saturating_sub(1);
                        ButtonState::Released
                    }
                    glfw::Action::Repeat => return None,
                };
                let (x, y) = self.cursor();
                Some(ToolkitEvent::Mouse(MouseEvent::new(
                    x,
                    y,
                    state,
                    convert_button(button),
                    convert_modifiers(mods),
                )))
            }
            glfw::WindowEvent::CursorPos(x, y) if self.buttons_held > 0 => Some(ToolkitEvent::Motion {
                x: x as i32,
                y: y as i32,
            }),
            glfw::WindowEvent::Char(key) => {
                let (x, y) = self.cursor();
                Some(ToolkitEvent::Keyboard { key, x, y })
            }
            glfw::WindowEvent::Refresh => Some(ToolkitEvent::Display),
            glfw::WindowEvent::Close => Some(ToolkitEvent::CloseRequested),
            _ => None,
        }
    }
}

fn convert_button(button: glfw::MouseButton) -> MouseButton {
    match button {
        glfw::MouseButton::Button1 => MouseButton::Left,
        glfw::MouseButton::Button2 => MouseButton::Right,
        glfw::MouseButton::Button3 => MouseButton::Middle,
        other => MouseButton::Other(other as u8),
    }
}

fn convert_modifiers(mods: glfw::Modifiers) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    modifiers.set(Modifiers::SHIFT, mods.contains(glfw::Modifiers::Shift));
    modifiers.set(Modifiers::CONTROL, mods.contains(glfw::Modifiers::Control));
    modifiers.set(Modifiers::ALT, mods.contains(glfw::Modifiers::Alt));
    modifiers
}

/// Toolkit backed by GLFW windows with OpenGL contexts
pub struct GlfwToolkit {
    glfw: glfw::Glfw,
    windows: BTreeMap<WindowId, GlfwWindow>,
    current: Option<WindowId>,
    errors: Rc<RefCell<Vec<GpuError>>>,
}

impl GlfwToolkit {
    /// Initialize GLFW on the calling thread
    pub fn new() -> Result<Self, ToolkitError> {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let mut glfw = glfw::init(move |error: glfw::Error, description: String| {
            sink.borrow_mut().push(GpuError::new(error as u32, description));
        })
        .map_err(|e| ToolkitError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::OpenGl));
        glfw.window_hint(glfw::WindowHint::DoubleBuffer(true));
        glfw.window_hint(glfw::WindowHint::DepthBits(Some(24)));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        log::info!("GLFW {} initialized", glfw::get_version_string());
        Ok(Self {
            glfw,
            windows: BTreeMap::new(),
            current: None,
            errors,
        })
    }

    /// Factory building a GLFW toolkit on the context worker
    pub fn factory() -> ToolkitFactory {
        Arc::new(|| Ok(Box::new(GlfwToolkit::new()?) as Box<dyn Toolkit>))
    }
}

impl Toolkit for GlfwToolkit {
    fn name(&self) -> &'static str {
        "glfw"
    }

    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, ToolkitError> {
        let (mut window, events) = self
            .glfw
            .create_window(spec.width, spec.height, &spec.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| ToolkitError::CreationFailed {
                title: spec.title.clone(),
                reason: "GLFW could not create the window".to_string(),
            })?;

        window.set_framebuffer_size_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_char_polling(true);
        window.set_refresh_polling(true);
        window.set_close_polling(true);
        window.make_current();

        // HiDPI framebuffers can differ from the requested size
        let (width, height) = window.get_framebuffer_size();

        let id = next_window_id();
        self.windows.insert(
            id,
            GlfwWindow {
                window,
                events,
                redisplay: true,
                buttons_held: 0,
                initial_size: Some((width.max(0) as u32, height.max(0) as u32)),
            },
        );
        self.current = Some(id);
        Ok(id)
    }

    fn destroy_window(&mut self, id: WindowId) {
        if self.windows.remove(&id).is_none() {
            return;
        }
        if self.current == Some(id) {
            glfw::make_context_current(None);
            self.current = None;
        }
    }

    fn current_window(&self) -> Option<WindowId> {
        self.current
    }

    fn set_current_window(&mut self, id: WindowId) {
        if self.current == Some(id) {
            return;
        }
        if let Some(entry) = self.windows.get_mut(&id) {
            entry.window.make_current();
            self.current = Some(id);
        }
    }

    fn post_redisplay(&mut self, id: WindowId) {
        if let Some(entry) = self.windows.get_mut(&id) {
            entry.redisplay = true;
        }
    }

    fn swap_buffers(&mut self, id: WindowId) {
        if let Some(entry) = self.windows.get_mut(&id) {
            entry.window.swap_buffers();
        }
    }

    fn poll_events(&mut self) -> Vec<(WindowId, ToolkitEvent)> {
        self.glfw.poll_events();

        let mut events = Vec::new();
        for (&id, entry) in &mut self.windows {
            if let Some((width, height)) = entry.initial_size.take() {
                events.push((id, ToolkitEvent::Reshape { width, height }));
            }
            let pending: Vec<_> = glfw::flush_messages(&entry.events).map(|(_, event)| event).collect();
            for event in pending {
                if let Some(event) = entry.translate(event) {
                    events.push((id, event));
                }
            }
            if entry.redisplay {
                entry.redisplay = false;
                events.push((id, ToolkitEvent::Display));
            }
        }
        events
    }

    fn take_errors(&mut self) -> Vec<GpuError> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }
}
