//! Threaded context behaviour, driven through the headless toolkit

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::*;
use crate::backend::{HeadlessDisplay, ToolkitEvent};
use crate::window::{Window, WindowBase};

#[derive(Default)]
struct Tally {
    init: AtomicUsize,
    display: AtomicUsize,
    timer: AtomicUsize,
    destroy: AtomicUsize,
    keys: Mutex<Vec<char>>,
}

impl Tally {
    fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct CountingWindow {
    base: WindowBase,
    tally: Arc<Tally>,
}

impl Window for CountingWindow {
    fn base(&self) -> &WindowBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut WindowBase {
        &mut self.base
    }

    fn init(&mut self) {
        self.tally.init.fetch_add(1, Ordering::SeqCst);
    }

    fn display(&mut self) {
        self.tally.display.fetch_add(1, Ordering::SeqCst);
    }

    fn timerfunc(&mut self, _id: WindowId) {
        self.tally.timer.fetch_add(1, Ordering::SeqCst);
    }

    fn keyboard(&mut self, key: char, _x: i32, _y: i32) {
        self.tally.keys.lock().push(key);
    }

    fn destroy(&mut self) {
        self.tally.destroy.fetch_add(1, Ordering::SeqCst);
    }
}

fn counting_window(name: &str) -> (WindowHandle, Arc<Tally>) {
    let tally = Arc::new(Tally::default());
    let window = CountingWindow {
        base: WindowBase::new(),
        tally: Arc::clone(&tally),
    };
    (WindowHandle::new(name, window), tally)
}

fn test_config() -> ContextConfig {
    ContextConfig::default()
        .with_frame_interval(Duration::from_millis(5))
        .with_idle_sleep(Duration::from_micros(100))
        .with_quit_when_last_window_closed(false)
}

fn headless() -> (Context, HeadlessDisplay) {
    Context::headless(test_config())
}

/// Poll `condition` until it holds or two seconds pass
fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

/// Let the worker run a few more iterations
fn settle() {
    thread::sleep(Duration::from_millis(30));
}

#[test]
fn test_show_creates_and_initializes_once() {
    let (context, display) = headless();
    let (handle, tally) = counting_window("a box");

    context.show(&handle);
    assert!(eventually(|| handle.is_live() && Tally::count(&tally.init) == 1));
    let id = handle.id().unwrap();
    assert_eq!(display.window_title(id).as_deref(), Some("a box"));
    assert!(context.is_running());

    context.show(&handle);
    settle();
    assert_eq!(Tally::count(&tally.init), 1);
    assert_eq!(display.created_count(), 1);
    assert_eq!(handle.id(), Some(id));

    context.stop().unwrap();
}

#[test]
fn test_show_then_destroy_leaves_nothing_behind() {
    let (context, display) = headless();
    let (handle, tally) = counting_window("a destitute box");

    context.show(&handle);
    context.destroy(&handle);

    assert!(eventually(|| Tally::count(&tally.destroy) == 1));
    assert!(!handle.is_live());
    assert!(display.live_windows().is_empty());
    assert_eq!(Tally::count(&tally.init), 1);

    context.stop().unwrap();
}

#[test]
fn test_destroying_twice_is_harmless() {
    let (context, display) = headless();
    let (handle, tally) = counting_window("twice");
    context.show(&handle);
    assert!(eventually(|| handle.is_live()));
    let id = handle.id().unwrap();

    context.destroy_id(id);
    context.destroy_id(id);
    context.destroy(&handle);
    context.destroy_id(WindowId(i32::MAX));

    assert!(eventually(|| !handle.is_live()));
    settle();
    assert_eq!(Tally::count(&tally.destroy), 1);
    assert_eq!(display.destroyed_count(), 1);
    assert!(context.is_running());

    context.stop().unwrap();
}

#[test]
fn test_concurrent_shows_get_distinct_ids() {
    let (context, _display) = headless();
    let context = Arc::new(context);
    let windows: Vec<_> = ["left", "right"].iter().map(|name| counting_window(name)).collect();

    let showers: Vec<_> = windows
        .iter()
        .map(|(handle, _)| {
            let context = Arc::clone(&context);
            let handle = handle.clone();
            thread::spawn(move || context.show(&handle))
        })
        .collect();
    for shower in showers {
        shower.join().unwrap();
    }

    assert!(eventually(|| windows.iter().all(|(handle, _)| handle.is_live())));
    let first = windows[0].0.id().unwrap();
    let second = windows[1].0.id().unwrap();
    assert_ne!(first, second);

    settle();
    assert_eq!(windows[0].0.id(), Some(first));
    assert_eq!(windows[1].0.id(), Some(second));
    for (_, tally) in &windows {
        assert_eq!(Tally::count(&tally.init), 1);
    }

    context.stop().unwrap();
}

#[test]
fn test_stop_destroys_everything_and_start_is_fresh() {
    let (context, display) = headless();
    let (first, first_tally) = counting_window("first");
    let (second, second_tally) = counting_window("second");
    context.show(&first);
    context.show(&second);
    assert!(eventually(|| first.is_live() && second.is_live()));
    let old_id = first.id().unwrap();

    context.stop().unwrap();
    assert!(!context.is_running());
    assert_eq!(Tally::count(&first_tally.destroy), 1);
    assert_eq!(Tally::count(&second_tally.destroy), 1);
    assert!(!first.is_live() && !second.is_live());
    assert!(display.live_windows().is_empty());

    context.start().unwrap();
    assert!(context.is_running());
    settle();
    assert!(display.live_windows().is_empty());

    context.show(&first);
    assert!(eventually(|| first.is_live()));
    assert_ne!(first.id(), Some(old_id));
    assert_eq!(Tally::count(&first_tally.init), 2);

    context.stop().unwrap();
}

#[test]
fn test_destroy_does_not_start_worker() {
    let (context, _display) = headless();
    let (handle, _) = counting_window("idle");

    context.destroy(&handle);
    assert!(!context.is_running());
    assert_eq!(context.pending_actions(), 1);
    context.wait().unwrap();
}

#[test]
fn test_events_reach_only_the_addressed_window() {
    let (context, display) = headless();
    let (first, first_tally) = counting_window("first");
    let (second, second_tally) = counting_window("second");
    context.show(&first);
    context.show(&second);
    assert!(eventually(|| first.is_live() && second.is_live()));

    display.inject(first.id().unwrap(), ToolkitEvent::Keyboard { key: 'q', x: 1, y: 2 });
    display.resize(second.id().unwrap(), 800, 600);

    assert!(eventually(|| first_tally.keys.lock().len() == 1));
    assert!(eventually(|| second.lock().camera().vp_width() == 800));
    assert!(second_tally.keys.lock().is_empty());
    assert_eq!(first.lock().camera().vp_width(), 640);

    context.stop().unwrap();
}

#[test]
fn test_timers_drive_redisplay() {
    let (context, display) = headless();
    let (handle, tally) = counting_window("animated");
    context.show(&handle);
    assert!(eventually(|| handle.is_live()));

    assert!(eventually(|| Tally::count(&tally.timer) >= 2));
    assert!(eventually(|| Tally::count(&tally.display) >= 1));
    let id = handle.id().unwrap();
    assert!(display.swap_count(id) >= 1);

    context.stop().unwrap();
}

#[test]
fn test_closing_last_window_ends_worker_and_show_restarts() {
    let config = test_config().with_quit_when_last_window_closed(true);
    let (context, display) = Context::headless(config);
    let (handle, tally) = counting_window("closable");
    context.show(&handle);
    assert!(eventually(|| handle.is_live()));

    display.close(handle.id().unwrap());
    context.wait().unwrap();
    assert!(handle.quit_requested());
    assert!(!handle.is_live());
    assert!(!context.is_running());
    assert_eq!(Tally::count(&tally.destroy), 1);

    context.show(&handle);
    assert!(eventually(|| handle.is_live()));
    assert!(!handle.quit_requested());
    assert_eq!(Tally::count(&tally.init), 2);

    context.stop().unwrap();
}

#[test]
fn test_closing_one_of_two_windows_keeps_worker() {
    let config = test_config().with_quit_when_last_window_closed(true);
    let (context, display) = Context::headless(config);
    let (first, _) = counting_window("first");
    let (second, _) = counting_window("second");
    context.show(&first);
    context.show(&second);
    assert!(eventually(|| first.is_live() && second.is_live()));

    display.close(first.id().unwrap());
    assert!(eventually(|| !first.is_live()));
    settle();
    assert!(context.is_running());
    assert!(second.is_live());

    context.stop().unwrap();
}

#[test]
fn test_show_during_last_window_teardown_is_kept() {
    struct SlowToDestroy(WindowBase);
    impl Window for SlowToDestroy {
        fn base(&self) -> &WindowBase {
            &self.0
        }
        fn base_mut(&mut self) -> &mut WindowBase {
            &mut self.0
        }
        fn destroy(&mut self) {
            thread::sleep(Duration::from_millis(100));
        }
    }

    let config = test_config().with_quit_when_last_window_closed(true);
    let (context, _display) = Context::headless(config);
    let slow = WindowHandle::new("slow", SlowToDestroy(WindowBase::new()));
    let (late, tally) = counting_window("late");

    context.show(&slow);
    assert!(eventually(|| slow.is_live()));

    // The worker is still inside `destroy()` when the next show arrives
    context.destroy(&slow);
    thread::sleep(Duration::from_millis(30));
    context.show(&late);

    assert!(eventually(|| late.is_live()));
    assert_eq!(Tally::count(&tally.init), 1);
    assert!(!slow.is_live());
    assert!(context.is_running());

    context.stop().unwrap();
}

#[test]
fn test_invalid_config_refuses_to_start() {
    let (context, display) = Context::headless(test_config().with_frame_interval(Duration::ZERO));
    assert!(matches!(context.start(), Err(ContextError::InvalidConfig(_))));

    let (handle, _) = counting_window("unconfigured");
    context.show(&handle);
    settle();
    assert!(!context.is_running());
    assert!(!handle.is_live());
    assert_eq!(display.created_count(), 0);
    assert_eq!(context.pending_actions(), 0);
}

#[test]
fn test_creation_failure_keeps_other_windows() {
    let (context, display) = headless();
    display.refuse_title("broken");
    let (broken, broken_tally) = counting_window("broken");
    let (working, _) = counting_window("working");

    context.show(&broken);
    context.show(&working);
    assert!(eventually(|| working.is_live()));
    assert!(!broken.is_live());
    assert_eq!(Tally::count(&broken_tally.init), 0);
    assert!(context.is_running());

    context.stop().unwrap();
}

#[test]
fn test_failed_toolkit_initialization_stops_worker() {
    let (context, display) = headless();
    display.set_fail_initialization(true);
    let (handle, _) = counting_window("never");

    context.show(&handle);
    context.wait().unwrap();
    assert!(!context.is_running());
    assert!(!handle.is_live());

    display.set_fail_initialization(false);
    context.show(&handle);
    assert!(eventually(|| handle.is_live()));

    context.stop().unwrap();
}

#[test]
fn test_panicking_init_does_not_kill_worker() {
    struct Faulty(WindowBase);
    impl Window for Faulty {
        fn base(&self) -> &WindowBase {
            &self.0
        }
        fn base_mut(&mut self) -> &mut WindowBase {
            &mut self.0
        }
        fn init(&mut self) {
            panic!("no GPU");
        }
    }

    let (context, _display) = headless();
    let faulty = WindowHandle::new("faulty", Faulty(WindowBase::new()));
    let (healthy, _) = counting_window("healthy");
    context.show(&faulty);
    context.show(&healthy);

    assert!(eventually(|| healthy.is_live()));
    assert!(context.is_running());

    context.stop().unwrap();
}

#[test]
fn test_wait_from_worker_is_refused() {
    struct Impatient {
        base: WindowBase,
        context: Arc<Mutex<Option<Arc<Context>>>>,
        outcome: Arc<Mutex<Option<bool>>>,
    }
    impl Window for Impatient {
        fn base(&self) -> &WindowBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut WindowBase {
            &mut self.base
        }
        fn init(&mut self) {
            if let Some(context) = self.context.lock().as_ref() {
                let refused = matches!(context.wait(), Err(ContextError::CalledFromWorker));
                *self.outcome.lock() = Some(refused);
            }
        }
    }

    let (context, _display) = headless();
    let context = Arc::new(context);
    let slot = Arc::new(Mutex::new(Some(Arc::clone(&context))));
    let outcome = Arc::new(Mutex::new(None));
    let handle = WindowHandle::new(
        "impatient",
        Impatient {
            base: WindowBase::new(),
            context: Arc::clone(&slot),
            outcome: Arc::clone(&outcome),
        },
    );

    context.show(&handle);
    assert!(eventually(|| outcome.lock().is_some()));
    assert_eq!(*outcome.lock(), Some(true));

    // Break the cycle before the context is dropped
    slot.lock().take();
    context.stop().unwrap();
}
