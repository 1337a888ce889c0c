//! In-memory toolkit for tests and display-less machines
//!
//! [`HeadlessToolkit`] keeps its windows in a table shared with a
//! [`HeadlessDisplay`]. The display is the outside view: it scripts events
//! into windows, refuses window creation on demand, and reports what the
//! toolkit did (live windows, buffer swaps, destroyed windows).
//!
//! The display is `Send + Sync` and can be held by any thread while the
//! toolkit itself lives on the context worker.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{next_window_id, Toolkit, ToolkitError, ToolkitEvent, WindowId, WindowSpec};
use crate::diagnostics::GpuError;

#[derive(Debug)]
struct HeadlessWindow {
    title: String,
    width: u32,
    height: u32,
    swaps: usize,
    redisplay: bool,
}

#[derive(Debug, Default)]
struct DisplayState {
    windows: BTreeMap<WindowId, HeadlessWindow>,
    pending: VecDeque<(WindowId, ToolkitEvent)>,
    refused_titles: BTreeSet<String>,
    errors: Vec<GpuError>,
    fail_initialization: bool,
    created: usize,
    destroyed: usize,
}

/// Controller and observer for headless windows
#[derive(Debug, Clone, Default)]
pub struct HeadlessDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl HeadlessDisplay {
    /// Create an empty display
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a toolkit bound to this display
    pub fn toolkit(&self) -> Result<HeadlessToolkit, ToolkitError> {
        if self.state.lock().fail_initialization {
            return Err(ToolkitError::InitializationFailed(
                "headless display configured to fail".to_string(),
            ));
        }
        Ok(HeadlessToolkit {
            display: self.clone(),
            current: None,
        })
    }

    /// Make subsequent toolkit creation fail (or succeed again)
    pub fn set_fail_initialization(&self, fail: bool) {
        self.state.lock().fail_initialization = fail;
    }

    /// Queue an event for a window; delivered on the next poll
    pub fn inject(&self, id: WindowId, event: ToolkitEvent) {
        self.state.lock().pending.push_back((id, event));
    }

    /// Resize a window the way a user would
    pub fn resize(&self, id: WindowId, width: u32, height: u32) {
        let mut state = self.state.lock();
        if let Some(window) = state.windows.get_mut(&id) {
            window.width = width;
            window.height = height;
        }
        state.pending.push_back((id, ToolkitEvent::Reshape { width, height }));
    }

    /// Click a window's close button
    pub fn close(&self, id: WindowId) {
        self.inject(id, ToolkitEvent::CloseRequested);
    }

    /// Refuse to create windows with this title
    pub fn refuse_title(&self, title: impl Into<String>) {
        self.state.lock().refused_titles.insert(title.into());
    }

    /// Report an error on the next error drain
    pub fn push_error(&self, error: GpuError) {
        self.state.lock().errors.push(error);
    }

    /// Ids of windows that currently exist
    pub fn live_windows(&self) -> Vec<WindowId> {
        self.state.lock().windows.keys().copied().collect()
    }

    /// Title of a live window
    pub fn window_title(&self, id: WindowId) -> Option<String> {
        self.state.lock().windows.get(&id).map(|window| window.title.clone())
    }

    /// Size of a live window
    pub fn window_size(&self, id: WindowId) -> Option<(u32, u32)> {
        self.state
            .lock()
            .windows
            .get(&id)
            .map(|window| (window.width, window.height))
    }

    /// Number of buffer swaps a live window has seen
    pub fn swap_count(&self, id: WindowId) -> usize {
        self.state.lock().windows.get(&id).map_or(0, |window| window.swaps)
    }

    /// Windows created over the display's lifetime
    pub fn created_count(&self) -> usize {
        self.state.lock().created
    }

    /// Windows destroyed over the display's lifetime
    pub fn destroyed_count(&self) -> usize {
        self.state.lock().destroyed
    }
}

/// Toolkit whose windows exist only in memory
#[derive(Debug)]
pub struct HeadlessToolkit {
    display: HeadlessDisplay,
    current: Option<WindowId>,
}

impl Toolkit for HeadlessToolkit {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, ToolkitError> {
        let mut state = self.display.state.lock();
        if state.refused_titles.contains(&spec.title) {
            return Err(ToolkitError::CreationFailed {
                title: spec.title.clone(),
                reason: "refused by headless display".to_string(),
            });
        }

        let id = next_window_id();
        state.windows.insert(
            id,
            HeadlessWindow {
                title: spec.title.clone(),
                width: spec.width,
                height: spec.height,
                swaps: 0,
                redisplay: false,
            },
        );
        state.created += 1;
        // Toolkits report the initial size once the window is up
        state.pending.push_back((
            id,
            ToolkitEvent::Reshape {
                width: spec.width,
                height: spec.height,
            },
        ));
        self.current = Some(id);
        Ok(id)
    }

    fn destroy_window(&mut self, id: WindowId) {
        let mut state = self.display.state.lock();
        if state.windows.remove(&id).is_some() {
            state.destroyed += 1;
        }
        if self.current == Some(id) {
            self.current = None;
        }
    }

    fn current_window(&self) -> Option<WindowId> {
        self.current
    }

    fn set_current_window(&mut self, id: WindowId) {
        if self.display.state.lock().windows.contains_key(&id) {
            self.current = Some(id);
        }
    }

    fn post_redisplay(&mut self, id: WindowId) {
        if let Some(window) = self.display.state.lock().windows.get_mut(&id) {
            window.redisplay = true;
        }
    }

    fn swap_buffers(&mut self, id: WindowId) {
        if let Some(window) = self.display.state.lock().windows.get_mut(&id) {
            window.swaps += 1;
        }
    }

    fn poll_events(&mut self) -> Vec<(WindowId, ToolkitEvent)> {
        let mut guard = self.display.state.lock();
        let state = &mut *guard;

        let mut events: Vec<_> = state
            .pending
            .drain(..)
            .filter(|(id, _)| state.windows.contains_key(id))
            .collect();

        for (&id, window) in &mut state.windows {
            if window.redisplay {
                window.redisplay = false;
                events.push((id, ToolkitEvent::Display));
            }
        }
        events
    }

    fn take_errors(&mut self) -> Vec<GpuError> {
        std::mem::take(&mut self.display.state.lock().errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolkit() -> (HeadlessDisplay, HeadlessToolkit) {
        let display = HeadlessDisplay::new();
        let toolkit = display.toolkit().unwrap();
        (display, toolkit)
    }

    #[test]
    fn test_create_makes_window_current_and_reports_size() {
        let (display, mut toolkit) = toolkit();
        let id = toolkit.create_window(&WindowSpec::new("a box", 320, 240)).unwrap();

        assert_eq!(toolkit.current_window(), Some(id));
        assert_eq!(display.live_windows(), vec![id]);
        assert_eq!(display.window_title(id).as_deref(), Some("a box"));
        assert_eq!(
            toolkit.poll_events(),
            vec![(id, ToolkitEvent::Reshape { width: 320, height: 240 })]
        );
    }

    #[test]
    fn test_refused_title_fails_creation() {
        let (display, mut toolkit) = toolkit();
        display.refuse_title("broken");
        let result = toolkit.create_window(&WindowSpec::new("broken", 10, 10));
        assert!(matches!(result, Err(ToolkitError::CreationFailed { .. })));
        assert_eq!(display.created_count(), 0);
    }

    #[test]
    fn test_failed_initialization() {
        let display = HeadlessDisplay::new();
        display.set_fail_initialization(true);
        assert!(matches!(display.toolkit(), Err(ToolkitError::InitializationFailed(_))));
    }

    #[test]
    fn test_set_current_ignores_unknown_window() {
        let (_display, mut toolkit) = toolkit();
        let id = toolkit.create_window(&WindowSpec::new("a", 10, 10)).unwrap();
        toolkit.set_current_window(WindowId(-42));
        assert_eq!(toolkit.current_window(), Some(id));
    }

    #[test]
    fn test_events_for_destroyed_windows_are_dropped() {
        let (display, mut toolkit) = toolkit();
        let id = toolkit.create_window(&WindowSpec::new("a", 10, 10)).unwrap();
        display.inject(id, ToolkitEvent::Display);
        toolkit.destroy_window(id);

        assert!(toolkit.poll_events().is_empty());
        assert_eq!(toolkit.current_window(), None);
        assert_eq!(display.destroyed_count(), 1);
    }

    #[test]
    fn test_redisplay_is_coalesced() {
        let (display, mut toolkit) = toolkit();
        let id = toolkit.create_window(&WindowSpec::new("a", 10, 10)).unwrap();
        toolkit.poll_events();

        toolkit.post_redisplay(id);
        toolkit.post_redisplay(id);
        assert_eq!(toolkit.poll_events(), vec![(id, ToolkitEvent::Display)]);
        assert!(toolkit.poll_events().is_empty());

        toolkit.swap_buffers(id);
        assert_eq!(display.swap_count(id), 1);
    }

    #[test]
    fn test_errors_are_drained_once() {
        let (display, mut toolkit) = toolkit();
        display.push_error(GpuError::new(0x0502, "invalid operation"));
        assert_eq!(toolkit.take_errors().len(), 1);
        assert!(toolkit.take_errors().is_empty());
    }
}
