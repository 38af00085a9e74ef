//! Per-domain holders for the last decoded status and for pending writes.

use std::fmt;

/// Callback invoked with the new value when a status changed.
pub type Listener<T> = Box<dyn FnMut(&T) + Send>;

/// Last decoded value of one status domain.
///
/// `valid` turns true on the first decode and stays so until [`reset`](Self::reset).
/// `updated` is raised by every decode and consumed once by [`drain`](Self::drain)
/// or [`notify`](Self::notify).
pub struct StatusStore<T> {
    value: T,
    valid: bool,
    updated: bool,
    listeners: Vec<Listener<T>>,
}

impl<T: Default> Default for StatusStore<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> StatusStore<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            valid: false,
            updated: false,
            listeners: Vec::new(),
        }
    }

    /// Store a freshly decoded value.
    pub fn apply(&mut self, value: T) {
        self.value = value;
        self.valid = true;
        self.updated = true;
    }

    /// Returns the value if it changed since the last drain.
    pub fn drain(&mut self) -> Option<&T> {
        if self.updated {
            self.updated = false;
            Some(&self.value)
        } else {
            None
        }
    }

    /// Drain and pass the value to every listener. Returns `true` if the
    /// listeners were called.
    pub fn notify(&mut self) -> bool {
        if !self.updated {
            return false;
        }
        self.updated = false;
        for listener in self.listeners.iter_mut() {
            listener(&self.value);
        }
        true
    }

    /// Forget validity. The value itself is kept, callers must check [`is_valid`](Self::is_valid).
    pub fn reset(&mut self) {
        self.valid = false;
        self.updated = false;
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&T) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// The value together with its validity.
    pub fn status(&self) -> (&T, bool) {
        (&self.value, self.valid)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }
}

impl<T: fmt::Debug> fmt::Debug for StatusStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusStore")
            .field("value", &self.value)
            .field("valid", &self.valid)
            .field("updated", &self.updated)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// A writable status domain: the status store plus the write the node wants
/// the panel to adopt.
///
/// Lifecycle of a write:
///
/// ```text
/// request_write / prepare -> prepared
/// submit                  -> unsubmitted   (offered to the panel)
/// mark_sent               -> stale         (on the wire, not yet confirmed)
/// confirm                 -> idle          (fresh status received)
/// ```
#[derive(Debug)]
pub struct UpdateStaging<T, U> {
    status: StatusStore<T>,
    requested: U,
    prepared: bool,
    unsubmitted: bool,
    stale: bool,
}

impl<T: Default, U: Default> Default for UpdateStaging<T, U> {
    fn default() -> Self {
        Self {
            status: StatusStore::default(),
            requested: U::default(),
            prepared: false,
            unsubmitted: false,
            stale: false,
        }
    }
}

impl<T, U> UpdateStaging<T, U>
where
    U: for<'a> From<&'a T> + Copy,
{
    /// Record a complete new value and queue it for the panel.
    pub fn request_write(&mut self, value: U) {
        self.requested = value;
        self.prepared = true;
        self.submit();
    }

    /// Get the pending value for editing.
    ///
    /// Unless a write is already prepared or in flight, the pending value is
    /// first seeded from the current status so untouched fields keep their
    /// present setting. An edit of an in-flight write starts from the value
    /// on the wire and is sent again.
    pub fn prepare(&mut self) -> &mut U {
        if !(self.prepared || self.stale) {
            self.requested = U::from(&self.status.value);
        }
        self.prepared = true;
        &mut self.requested
    }

    /// Hand the prepared value over to the poll policy.
    pub fn submit(&mut self) {
        if self.prepared {
            self.unsubmitted = true;
        }
    }

    /// The value is being put on the wire. Returns it for encoding.
    pub fn mark_sent(&mut self) -> U {
        self.prepared = false;
        self.unsubmitted = false;
        self.stale = true;
        self.requested
    }

    /// A fresh status for this domain arrived.
    pub fn confirm(&mut self) {
        self.stale = false;
    }

    /// Decode path: store the status and confirm any write in flight.
    pub fn apply(&mut self, value: T) {
        self.status.apply(value);
        self.confirm();
    }

    /// Clear the status flags and the whole write lifecycle.
    pub fn reset(&mut self) {
        self.status.reset();
        self.prepared = false;
        self.unsubmitted = false;
        self.stale = false;
    }

    pub fn requested(&self) -> &U {
        &self.requested
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_unsubmitted(&self) -> bool {
        self.unsubmitted
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn status(&self) -> &StatusStore<T> {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusStore<T> {
        &mut self.status
    }
}
