//! Once-only deferred type options.
//!
//! Type options may reference types that are not constructed yet (a tree node
//! whose children are tree nodes). Such options are supplied as a thunk and
//! resolved on first use. The thunk is moved out of its slot before it runs,
//! so it executes at most once: if it panics, the options stay unavailable and
//! every later access fails with [`ConfigError::LazyOptionsConsumed`].

use std::fmt;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::{fatal, ConfigError};

type Thunk<T> = Box<dyn FnOnce() -> T + Send>;

/// A value computed once, either supplied up front or from a thunk.
pub struct Lazy<T> {
    name: &'static str,
    cell: OnceCell<T>,
    thunk: Mutex<Option<Thunk<T>>>,
}

impl<T> Lazy<T> {
    /// Wraps an already available value.
    pub fn eager(name: &'static str, value: T) -> Self {
        Self {
            name,
            cell: OnceCell::with_value(value),
            thunk: Mutex::new(None),
        }
    }

    /// Defers computing the value until the first [`get`](Lazy::get).
    pub fn deferred<F>(name: &'static str, thunk: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            name,
            cell: OnceCell::new(),
            thunk: Mutex::new(Some(Box::new(thunk))),
        }
    }

    /// Returns true if the value has been computed.
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Returns the value, running the thunk if this is the first access.
    ///
    /// # Panics
    ///
    /// Panics if the thunk panicked on an earlier access.
    pub fn get(&self) -> &T {
        self.try_get().unwrap_or_else(|error| fatal(error))
    }

    /// Like [`get`](Lazy::get) but reports a consumed thunk as an error.
    pub fn try_get(&self) -> Result<&T, ConfigError> {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        self.cell.get_or_try_init(|| {
            let thunk = self.thunk.lock().take();
            match thunk {
                Some(thunk) => {
                    log::trace!("resolving lazy options of {}", self.name);
                    Ok(thunk())
                }
                None => Err(ConfigError::LazyOptionsConsumed(self.name)),
            }
        })
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("name", &self.name)
            .field("value", &self.cell.get())
            .finish()
    }
}
