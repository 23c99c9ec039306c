//! Dependency-keyed effect runner.
//!
//! An [`Effect`] remembers the key it last ran for. Watching a new key runs
//! the previous cleanup first, then the action. Watching the same key again
//! does nothing. This is the framework-independent form of a UI effect hook.

/// Cleanup registered by an effect action.
pub type Cleanup = Box<dyn FnOnce()>;

/// Runs an action whenever its dependency key changes.
pub struct Effect<K> {
    key: Option<K>,
    cleanup: Option<Cleanup>,
    runs: u64,
    disposed: bool,
}

impl<K: PartialEq> Effect<K> {
    pub fn new() -> Self {
        Self {
            key: None,
            cleanup: None,
            runs: 0,
            disposed: false,
        }
    }

    /// Run `action` if `key` differs from the last watched key.
    ///
    /// The first call always runs. Returns whether the action ran.
    pub fn watch<F>(&mut self, key: K, action: F) -> bool
    where
        F: FnOnce(&K) -> Option<Cleanup>,
    {
        if self.disposed || self.key.as_ref() == Some(&key) {
            return false;
        }

        self.run_cleanup();
        self.cleanup = action(&key);
        self.key = Some(key);
        self.runs += 1;
        true
    }

    /// Last watched key.
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    /// Number of times an action has run.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Run the pending cleanup and stop reacting to keys.
    pub fn dispose(&mut self) {
        self.run_cleanup();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl<K: PartialEq> Default for Effect<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for Effect<K> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for Effect<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("key", &self.key)
            .field("has_cleanup", &self.cleanup.is_some())
            .field("runs", &self.runs)
            .field("disposed", &self.disposed)
            .finish()
    }
}
