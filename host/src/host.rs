//! Render loop stand-in.
//!
//! A [`Host`] plays the part of a UI framework: bindings call its listener
//! when a result lands, and the host wakes up to re-render.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::config::Config;
use crate::error::{AppError, Result};

#[derive(Debug)]
pub struct Host {
    notify: Rc<Notify>,
    updates: Rc<Cell<u64>>,
    timeout: Duration,
}

impl Host {
    pub fn new(config: &Config) -> Self {
        Self {
            notify: Rc::new(Notify::new()),
            updates: Rc::new(Cell::new(0)),
            timeout: config.update_timeout,
        }
    }

    /// Callback to hand to a binding's `with_listener`.
    ///
    /// Can be shared by any number of bindings.
    pub fn listener(&self) -> impl Fn() + 'static {
        let notify = Rc::clone(&self.notify);
        let updates = Rc::clone(&self.updates);
        move || {
            updates.set(updates.get() + 1);
            notify.notify_one();
        }
    }

    /// Wait until some binding reports an update, bounded by the configured
    /// timeout.
    ///
    /// An update that landed since the last wait completes immediately.
    pub async fn wait_for_update(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.notify.notified())
            .await
            .map_err(|_| AppError::Timeout(self.timeout))
    }

    /// Keep waiting for updates until `ready` holds.
    ///
    /// `ready` is checked before the first wait, so it returns immediately
    /// when the condition is already met.
    pub async fn wait_until(&self, mut ready: impl FnMut() -> bool) -> Result<()> {
        while !ready() {
            self.wait_for_update().await?;
        }
        Ok(())
    }

    /// Number of updates reported so far.
    pub fn updates(&self) -> u64 {
        self.updates.get()
    }
}
