//! The window context: one worker thread multiplexing many windows
//!
//! Windowing toolkits in the GLUT/GLFW family are single-threaded and want
//! to own the thread that runs their event loop. [`Context`] gives them one:
//! a dedicated worker thread that creates the toolkit, pumps its events,
//! ticks per-window timers, and runs work posted from any other thread.
//!
//! # Threading Model
//!
//! Callers never touch the toolkit. [`Context::show`] and
//! [`Context::destroy`] only append to an action queue; the worker drains it
//! between event-loop iterations. Window callbacks therefore run on the worker
//! only, one at a time.
//!
//! # Lifecycle
//!
//! The worker starts lazily on the first `show` and exits when [`Context::stop`]
//! is called or, by default, when the user closes the last window. Either
//! way every remaining window is destroyed on the worker before it exits, and
//! a later `show` starts a fresh worker.

mod actions;
mod event_loop;
mod registry;
mod timers;

#[cfg(test)]
mod tests;

pub use actions::{Action, ActionQueue};
pub use event_loop::WindowLoop;
pub use registry::WindowRegistry;
pub use timers::TimerSchedule;

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::backend::{HeadlessDisplay, Toolkit, ToolkitError, ToolkitFactory, WindowId};
use crate::config::{ConfigError, ContextConfig};
use crate::window::WindowHandle;

/// Attempts `show` makes to reach a worker that is not quitting
const SHOW_ATTEMPTS: usize = 3;

/// Context errors
#[derive(Error, Debug)]
pub enum ContextError {
    /// The toolkit failed
    #[error("Toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),

    /// The context configuration is unusable
    #[error("Invalid context configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The toolkit's current window is not the one the window records
    #[error("Current window is not our window: toolkit reports {active}, window records {recorded:?}")]
    WindowMismatch {
        /// Window the toolkit considers current
        active: WindowId,
        /// Id stored in the window's handle
        recorded: Option<WindowId>,
    },

    /// The toolkit handed out an id that is already registered
    #[error("{0} is already registered")]
    AlreadyRegistered(WindowId),

    /// The worker thread could not be spawned
    #[error("Failed to spawn context worker: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// Waiting on the worker from the worker itself would never return
    #[error("Cannot wait for the context from its own worker thread")]
    CalledFromWorker,
}

thread_local! {
    // Address of the context whose worker runs on this thread, 0 elsewhere
    static WORKER_OF: Cell<usize> = const { Cell::new(0) };
}

struct WorkerSlot {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

struct Inner {
    config: ContextConfig,
    factory: ToolkitFactory,
    actions: ActionQueue<WindowLoop>,
    worker: Mutex<WorkerSlot>,
    interrupt: AtomicBool,
    quit: AtomicBool,
    exited: Mutex<u64>,
    exit_signal: Condvar,
}

impl Inner {
    fn key(&self) -> usize {
        self as *const Inner as usize
    }

    fn exited_generation(&self) -> u64 {
        *self.exited.lock()
    }

    fn worker_alive(&self, slot: &WorkerSlot) -> bool {
        slot.handle.is_some()
            && self.exited_generation() < slot.generation
            && !self.interrupt.load(Ordering::Acquire)
            && !self.quit.load(Ordering::Acquire)
    }
}

/// Marks a worker generation as finished when dropped, even on panic
struct ExitSignal<'a> {
    inner: &'a Inner,
    generation: u64,
}

impl Drop for ExitSignal<'_> {
    fn drop(&mut self) {
        WORKER_OF.with(|worker| worker.set(0));
        let mut exited = self.inner.exited.lock();
        *exited = (*exited).max(self.generation);
        self.inner.exit_signal.notify_all();
    }
}

fn run_worker(inner: &Inner, generation: u64) {
    let _exit = ExitSignal { inner, generation };
    WORKER_OF.with(|worker| worker.set(inner.key()));

    let toolkit = match (inner.factory)() {
        Ok(toolkit) => toolkit,
        Err(e) => {
            log::error!("Window context could not start: {}", e);
            inner.quit.store(true, Ordering::Release);
            return;
        }
    };
    log::info!("Window context worker started ({} toolkit)", toolkit.name());

    let mut windows = WindowLoop::new(toolkit, &inner.config);
    let idle = inner.config.idle_sleep();

    while !inner.interrupt.load(Ordering::Acquire) && !inner.quit.load(Ordering::Acquire) {
        windows.process_events();

        for action in inner.actions.drain() {
            if panic::catch_unwind(AssertUnwindSafe(|| action(&mut windows))).is_err() {
                log::error!("Deferred window action panicked; continuing");
            }
        }

        // Quit only with the queue locked and empty, so a racing `show` is
        // either drained by this worker or refused and retried on a new one
        if windows.quit_requested() && !inner.actions.close_if_empty(|| inner.quit.store(true, Ordering::Release)) {
            log::debug!("Quit deferred; actions arrived during teardown");
        }
        thread::sleep(idle);
    }

    log::info!(
        "Window context worker stopping; destroying {} window(s)",
        windows.registry().len()
    );
    windows.destroy_all();
}

/// Owner of the worker thread that drives every window
///
/// Dropping a context stops its worker and destroys its windows.
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Create a stopped context that builds its toolkit with `factory`
    pub fn new(config: ContextConfig, factory: ToolkitFactory) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                factory,
                actions: ActionQueue::new(),
                worker: Mutex::new(WorkerSlot {
                    handle: None,
                    generation: 0,
                }),
                interrupt: AtomicBool::new(false),
                quit: AtomicBool::new(false),
                exited: Mutex::new(0),
                exit_signal: Condvar::new(),
            }),
        }
    }

    /// Create a context over in-memory windows, with the display that
    /// scripts and observes them
    pub fn headless(config: ContextConfig) -> (Self, HeadlessDisplay) {
        let display = HeadlessDisplay::new();
        let source = display.clone();
        let factory: ToolkitFactory = Arc::new(move || Ok(Box::new(source.toolkit()?) as Box<dyn Toolkit>));
        (Self::new(config, factory), display)
    }

    /// The process-wide context backed by GLFW
    #[cfg(feature = "glfw")]
    pub fn global() -> &'static Context {
        static GLOBAL: std::sync::OnceLock<Context> = std::sync::OnceLock::new();
        GLOBAL.get_or_init(|| Context::new(ContextConfig::default(), crate::backend::GlfwToolkit::factory()))
    }

    /// Configuration the context was created with
    pub fn config(&self) -> &ContextConfig {
        &self.inner.config
    }

    /// Whether a worker is running and has not been asked to exit
    pub fn is_running(&self) -> bool {
        let slot = self.inner.worker.lock();
        self.inner.worker_alive(&slot)
    }

    /// Actions posted but not yet run by a worker
    pub fn pending_actions(&self) -> usize {
        self.inner.actions.len()
    }

    fn on_worker_thread(&self) -> bool {
        WORKER_OF.with(|worker| worker.get() == self.inner.key())
    }

    /// Start the worker if it is not running
    ///
    /// A worker that exited on its own (last window closed) is joined and
    /// replaced by a fresh one. Fails without spawning anything when the
    /// configuration does not validate.
    pub fn start(&self) -> Result<(), ContextError> {
        if self.on_worker_thread() {
            return Ok(());
        }
        self.inner.config.validate()?;

        let mut slot = self.inner.worker.lock();
        if self.inner.worker_alive(&slot) {
            return Ok(());
        }

        if let Some(previous) = slot.handle.take() {
            log::debug!("Reaping previous window context worker");
            if previous.join().is_err() {
                log::error!("Previous window context worker panicked");
            }
        }

        self.inner.interrupt.store(false, Ordering::Release);
        self.inner.quit.store(false, Ordering::Release);
        slot.generation += 1;
        let generation = slot.generation;

        let inner = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name(self.inner.config.thread_name.clone())
            .spawn(move || run_worker(&inner, generation))?;
        slot.handle = Some(handle);
        log::debug!("Spawned window context worker #{}", generation);
        Ok(())
    }

    /// Show a window, starting the worker if needed
    ///
    /// Creation happens asynchronously on the worker; the handle becomes
    /// live once it has. Showing a live handle again does nothing.
    pub fn show(&self, handle: &WindowHandle) {
        let name = handle.name().to_string();
        let handle = handle.clone();
        let mut action = move |windows: &mut WindowLoop| {
            if let Err(e) = windows.add_window(handle) {
                log::error!("Failed to show window: {}", e);
            }
        };

        for _ in 0..SHOW_ATTEMPTS {
            if let Err(e) = self.start() {
                log::error!("Cannot start window context: {}", e);
                return;
            }
            // Refused only if the worker decided to quit after `start` saw it alive
            match self.inner.actions.post_unless(|| self.inner.quit.load(Ordering::Acquire), action) {
                Ok(()) => return,
                Err(refused) => action = refused,
            }
        }

        log::warn!("Window context keeps exiting; '{}' waits for the next start", name);
        self.inner.actions.post(action);
    }

    /// Destroy a window by handle
    ///
    /// The handle is resolved when the worker runs the request, so a `show`
    /// immediately followed by `destroy` leaves no window behind. Does not
    /// start the worker.
    pub fn destroy(&self, handle: &WindowHandle) {
        let handle = handle.clone();
        self.inner.actions.post(move |windows: &mut WindowLoop| {
            windows.destroy_handle(&handle);
        });
    }

    /// Destroy a window by toolkit id. Unknown ids are ignored.
    pub fn destroy_id(&self, id: WindowId) {
        self.inner.actions.post(move |windows: &mut WindowLoop| {
            windows.destroy_window(id);
        });
    }

    /// Block until the worker exits
    ///
    /// Returns immediately if no worker was started.
    pub fn wait(&self) -> Result<(), ContextError> {
        if self.on_worker_thread() {
            return Err(ContextError::CalledFromWorker);
        }

        let generation = {
            let slot = self.inner.worker.lock();
            if slot.handle.is_none() {
                return Ok(());
            }
            slot.generation
        };

        let mut exited = self.inner.exited.lock();
        while *exited < generation {
            self.inner.exit_signal.wait(&mut exited);
        }
        drop(exited);

        self.reap();
        Ok(())
    }

    /// Ask the worker to exit and wait for it
    pub fn stop(&self) -> Result<(), ContextError> {
        if self.on_worker_thread() {
            return Err(ContextError::CalledFromWorker);
        }
        self.inner.interrupt.store(true, Ordering::Release);
        self.wait()
    }

    fn reap(&self) {
        let mut slot = self.inner.worker.lock();
        if self.inner.exited_generation() < slot.generation {
            return;
        }
        if let Some(handle) = slot.handle.take() {
            if handle.join().is_err() {
                log::error!("Window context worker panicked");
            }
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Window context dropped without stopping: {}", e);
        }
    }
}
