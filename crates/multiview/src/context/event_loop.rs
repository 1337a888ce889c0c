//! Worker-side window bookkeeping and callback dispatch
//!
//! [`WindowLoop`] owns the toolkit, the registry and the timer schedule. It
//! lives on the context worker and is only reachable from there, either
//! directly in the worker loop or through actions posted by callers.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crate::backend::{Toolkit, ToolkitEvent, WindowId, WindowSpec};
use crate::config::ContextConfig;
use crate::context::registry::WindowRegistry;
use crate::context::timers::TimerSchedule;
use crate::context::ContextError;
use crate::diagnostics::report_errors;
use crate::window::{Window, WindowHandle};

/// Run a window callback, containing any panic it raises
fn guarded(handle: &WindowHandle, callback: &str, f: impl FnOnce(&mut dyn Window)) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handle.with(f)));
    if outcome.is_err() {
        log::error!("Window {} panicked in {}(); continuing", handle, callback);
    }
}

/// Windows, toolkit and timers owned by the context worker
pub struct WindowLoop {
    toolkit: Box<dyn Toolkit>,
    registry: WindowRegistry,
    timers: TimerSchedule,
    frame_interval: Duration,
    window_size: (u32, u32),
    quit_when_last_window_closed: bool,
    quit: bool,
}

impl WindowLoop {
    /// Wrap a toolkit freshly created on the worker thread
    pub fn new(toolkit: Box<dyn Toolkit>, config: &ContextConfig) -> Self {
        log::debug!("Window loop using the {} toolkit", toolkit.name());
        Self {
            toolkit,
            registry: WindowRegistry::new(),
            timers: TimerSchedule::new(),
            frame_interval: config.frame_interval(),
            window_size: (config.default_width, config.default_height),
            quit_when_last_window_closed: config.quit_when_last_window_closed,
            quit: false,
        }
    }

    /// Live windows
    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    /// Whether the loop asked the worker to exit
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Create the toolkit window for `handle` and initialize it
    ///
    /// Showing a handle that is already live does nothing. On success the
    /// handle carries its new id, the window is registered with a running
    /// timer, its camera has the initial viewport, and `init()` has run.
    pub fn add_window(&mut self, handle: WindowHandle) -> Result<(), ContextError> {
        if self.registry.contains_handle(&handle) {
            log::debug!("Window {} is already shown", handle);
            return Ok(());
        }

        let (width, height) = self.window_size;
        let id = self
            .toolkit
            .create_window(&WindowSpec::new(handle.name(), width, height))?;

        handle.set_id(Some(id));
        handle.set_quit_requested(false);
        if !self.registry.insert(handle.clone()) {
            self.toolkit.destroy_window(id);
            handle.set_id(None);
            return Err(ContextError::AlreadyRegistered(id));
        }
        self.timers.arm(id, Instant::now() + self.frame_interval);
        self.quit = false;

        self.toolkit.set_current_window(id);
        guarded(&handle, "init", |window| {
            window.base_mut().camera.set_viewport(width, height);
            window.init();
        });
        log::info!("Created window {}", handle);
        Ok(())
    }

    /// Tear down the window registered under `id`
    ///
    /// Runs the window's `destroy()` with its toolkit window current, then
    /// forgets it and releases the toolkit window. The previously current
    /// window is restored afterwards. Unknown ids are ignored.
    ///
    /// Removing the last window raises the quit flag when the configuration
    /// asks for it.
    pub fn destroy_window(&mut self, id: WindowId) -> bool {
        let Some(handle) = self.registry.find(id).cloned() else {
            log::debug!("Ignoring destroy of unknown {}", id);
            return false;
        };

        let previous = self.toolkit.current_window();
        self.toolkit.set_current_window(id);
        guarded(&handle, "destroy", |window| window.destroy());

        self.registry.erase(id);
        self.toolkit.destroy_window(id);
        handle.set_id(None);

        if let Some(previous) = previous.filter(|previous| *previous != id) {
            self.toolkit.set_current_window(previous);
        }
        log::info!("Destroyed window '{}' ({})", handle.name(), id);

        if self.registry.is_empty() && self.quit_when_last_window_closed && !self.quit {
            log::info!("Last window gone");
            self.quit = true;
        }
        true
    }

    /// Tear down whichever window this exact handle is registered as
    pub fn destroy_handle(&mut self, handle: &WindowHandle) -> bool {
        match self.registry.find_by_handle(handle) {
            Some(id) => self.destroy_window(id),
            None => {
                log::debug!("Ignoring destroy of {}", handle);
                false
            }
        }
    }

    /// Destroy every registered window
    pub fn destroy_all(&mut self) {
        while let Some(id) = self.registry.first_id() {
            self.destroy_window(id);
        }
    }

    /// One event-loop iteration: toolkit events, then due timers
    pub fn process_events(&mut self) {
        for (id, event) in self.toolkit.poll_events() {
            if let Err(e) = self.dispatch(id, event) {
                log::error!("Dropped {:?} for {}: {}", event, id, e);
            }
        }
        self.fire_timers(Instant::now());
    }

    /// Deliver the ticks due at `now`
    pub fn fire_timers(&mut self, now: Instant) {
        for id in self.timers.due(now) {
            if let Err(e) = self.dispatch(id, ToolkitEvent::Timer) {
                log::error!("Dropped timer for {}: {}", id, e);
            }
        }
    }

    /// Route one event to the window it addresses
    ///
    /// The addressed window is made current and the toolkit's current window
    /// decides which registered window receives the callback. Events for
    /// windows that are not registered are dropped; a registered window
    /// whose own id disagrees with the toolkit's is an error and receives
    /// nothing.
    pub fn dispatch(&mut self, target: WindowId, event: ToolkitEvent) -> Result<(), ContextError> {
        self.toolkit.set_current_window(target);
        let Some(active) = self.toolkit.current_window().filter(|active| *active == target) else {
            if self.registry.find(target).is_some() {
                log::warn!("Toolkit lost {}; forgetting it", target);
                self.destroy_window(target);
            }
            return Ok(());
        };
        let Some(handle) = self.registry.find(active).cloned() else {
            log::trace!("No registered window for {}", active);
            return Ok(());
        };

        let recorded = handle.id();
        if recorded != Some(active) {
            return Err(ContextError::WindowMismatch { active, recorded });
        }

        match event {
            ToolkitEvent::Display => {
                guarded(&handle, "display", |window| window.display());
                self.toolkit.swap_buffers(active);
                report_errors("display", self.toolkit.take_errors());
            }
            ToolkitEvent::Reshape { width, height } => {
                guarded(&handle, "reshape", |window| window.reshape(width, height));
            }
            ToolkitEvent::Mouse(mouse) => guarded(&handle, "mouse", |window| window.mouse(mouse)),
            ToolkitEvent::Motion { x, y } => guarded(&handle, "motion", |window| window.motion(x, y)),
            ToolkitEvent::Keyboard { key, x, y } => {
                guarded(&handle, "keyboard", |window| window.keyboard(key, x, y));
            }
            ToolkitEvent::Timer => {
                guarded(&handle, "timerfunc", |window| window.timerfunc(active));
                self.toolkit.post_redisplay(active);
                self.timers.arm(active, Instant::now() + self.frame_interval);
            }
            ToolkitEvent::CloseRequested => self.close_window(&handle, active),
        }
        Ok(())
    }

    fn close_window(&mut self, handle: &WindowHandle, id: WindowId) {
        log::info!("Close requested for {}", handle);
        handle.set_quit_requested(true);
        self.destroy_window(id);
    }
}
