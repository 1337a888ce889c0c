//! Deferred work posted by caller threads for the worker to run

use parking_lot::Mutex;

/// A unit of deferred work operating on worker-owned state `T`
pub type Action<T> = Box<dyn FnOnce(&mut T) + Send>;

/// FIFO of deferred actions shared between callers and the worker
///
/// Callers only ever append. The worker takes the whole batch at once and
/// runs it without holding the lock, so an action may post further actions;
/// those run in the next batch.
pub struct ActionQueue<T> {
    actions: Mutex<Vec<Action<T>>>,
}

impl<T> ActionQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Append an action
    pub fn post<F>(&self, action: F)
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.actions.lock().push(Box::new(action));
    }

    /// Append an action unless `closed` reports true
    ///
    /// `closed` runs with the queue locked, so it cannot interleave with
    /// [`ActionQueue::close_if_empty`]. A refused action is handed back.
    pub fn post_unless<F>(&self, closed: impl FnOnce() -> bool, action: F) -> Result<(), F>
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        let mut actions = self.actions.lock();
        if closed() {
            return Err(action);
        }
        actions.push(Box::new(action));
        Ok(())
    }

    /// Run `close` with the queue locked, but only if nothing is pending
    ///
    /// Returns whether `close` ran.
    pub fn close_if_empty(&self, close: impl FnOnce()) -> bool {
        let actions = self.actions.lock();
        if !actions.is_empty() {
            return false;
        }
        close();
        true
    }

    /// Take every pending action, oldest first
    pub fn drain(&self) -> Vec<Action<T>> {
        std::mem::take(&mut *self.actions.lock())
    }

    /// Number of pending actions
    pub fn len(&self) -> usize {
        self.actions.lock().len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.actions.lock().is_empty()
    }
}

impl<T> Default for ActionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
