//! Shared, thread-safe handle to a window
//!
//! A [`WindowHandle`] is what callers create, keep, and pass to
//! `show`/`destroy`. The context keeps its own clone in the registry, so a
//! window lives as long as either side still holds it.
//!
//! Identity, the toolkit id and the "quit requested" flag are readable
//! without locking. The window itself sits behind a mutex: the worker thread
//! locks it for each callback, and callers lock it through
//! [`WindowHandle::with`] to push new data into it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::backend::WindowId;
use crate::window::handler::Window;

/// Raw id value meaning "no toolkit window yet"
const UNASSIGNED: i32 = -1;

struct Shared {
    name: String,
    id: AtomicI32,
    quit_requested: AtomicBool,
    window: Mutex<Box<dyn Window>>,
}

/// Cloneable handle to a window shared between callers and the context
#[derive(Clone)]
pub struct WindowHandle {
    shared: Arc<Shared>,
}

/// Identity of a handle, independent of its toolkit id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct HandleKey(usize);

impl WindowHandle {
    /// Wrap a window under a display name
    ///
    /// Names are used as window titles and for lookups; they need not be
    /// unique.
    pub fn new<W: Window + 'static>(name: impl Into<String>, window: W) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                id: AtomicI32::new(UNASSIGNED),
                quit_requested: AtomicBool::new(false),
                window: Mutex::new(Box::new(window)),
            }),
        }
    }

    /// Display name given at construction
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Toolkit id, or `None` while the window is not live
    pub fn id(&self) -> Option<WindowId> {
        match self.shared.id.load(Ordering::Acquire) {
            UNASSIGNED => None,
            raw => Some(WindowId(raw)),
        }
    }

    /// Whether the context has created the toolkit window
    pub fn is_live(&self) -> bool {
        self.id().is_some()
    }

    /// Whether the user closed this window
    ///
    /// Producers feeding the window poll this to know when to stop.
    pub fn quit_requested(&self) -> bool {
        self.shared.quit_requested.load(Ordering::Acquire)
    }

    /// Run `f` with exclusive access to the window
    ///
    /// Blocks while the worker thread is inside one of the window's
    /// callbacks. Keep `f` short: the worker waits on it too.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn Window) -> R) -> R {
        let mut window = self.shared.window.lock();
        f(window.as_mut())
    }

    /// Lock the window directly
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Window>> {
        self.shared.window.lock()
    }

    /// Whether both handles refer to the same window
    pub fn ptr_eq(&self, other: &WindowHandle) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn key(&self) -> HandleKey {
        HandleKey(Arc::as_ptr(&self.shared) as usize)
    }

    pub(crate) fn set_id(&self, id: Option<WindowId>) {
        let raw = id.map_or(UNASSIGNED, |id| id.0);
        self.shared.id.store(raw, Ordering::Release);
    }

    pub(crate) fn set_quit_requested(&self, requested: bool) {
        self.shared.quit_requested.store(requested, Ordering::Release);
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowHandle")
            .field("name", &self.shared.name)
            .field("id", &self.id())
            .field("quit_requested", &self.quit_requested())
            .finish()
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "'{}' ({})", self.shared.name, id),
            None => write!(f, "'{}' (not shown)", self.shared.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::BasicWindow;

    #[test]
    fn test_new_handle_is_not_live() {
        let handle = WindowHandle::new("points", BasicWindow::new());
        assert_eq!(handle.name(), "points");
        assert_eq!(handle.id(), None);
        assert!(!handle.is_live());
        assert!(!handle.quit_requested());
    }

    #[test]
    fn test_clones_share_identity_and_id() {
        let handle = WindowHandle::new("a", BasicWindow::new());
        let clone = handle.clone();
        let other = WindowHandle::new("a", BasicWindow::new());

        assert!(handle.ptr_eq(&clone));
        assert_eq!(handle.key(), clone.key());
        assert!(!handle.ptr_eq(&other));
        assert_ne!(handle.key(), other.key());

        handle.set_id(Some(WindowId(7)));
        assert_eq!(clone.id(), Some(WindowId(7)));
        clone.set_id(None);
        assert!(!handle.is_live());
    }

    #[test]
    fn test_with_gives_mutable_access() {
        let handle = WindowHandle::new("a", BasicWindow::new());
        handle.with(|window| window.reshape(10, 20));
        assert_eq!(handle.lock().camera().vp_width(), 10);
    }

    #[test]
    fn test_handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WindowHandle>();
    }
}
