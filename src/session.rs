//! Engine session lifecycle and data operations.

use parking_lot::Mutex;

use crate::driver::{EngineDriver, check_status};
use crate::error::{OtamaError, Result};
use crate::id::RecordId;
use crate::results::{SearchResult, assemble};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Unopened,
    Open,
    Closed,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Unopened => "unopened",
            SessionState::Open => "open",
            SessionState::Closed => "closed",
        }
    }
}

/// One engine session over one opaque handle.
///
/// A session starts `Unopened`, transitions to `Open` via [`open`] and to
/// `Closed` via [`close`]. Every other operation requires the session to be
/// open and fails fast with [`OtamaError::InvalidState`] otherwise, without
/// touching the engine.
///
/// The native handle is not documented as thread-safe, so all operations on
/// a session are serialized through an internal lock. Independent sessions
/// (distinct handles) need no coordination between them. All calls block
/// until the engine returns; there is no cancellation or timeout surface.
///
/// [`open`]: Session::open
/// [`close`]: Session::close
pub struct Session {
    inner: Mutex<Inner>,
}

struct Inner {
    state: SessionState,
    driver: Box<dyn EngineDriver>,
}

impl Inner {
    fn require_open(&mut self, operation: &'static str) -> Result<&mut dyn EngineDriver> {
        match self.state {
            SessionState::Open => Ok(self.driver.as_mut()),
            state => Err(OtamaError::invalid_state(operation, state.name())),
        }
    }

    /// Run a status-only engine call behind the open-state guard.
    fn engine_call(
        &mut self,
        operation: &'static str,
        call: impl FnOnce(&mut dyn EngineDriver) -> crate::driver::Status,
    ) -> Result<()> {
        let driver = self.require_open(operation)?;
        let status = call(driver);
        check_status(self.driver.as_ref(), operation, status)
    }
}

impl Session {
    /// Create an unopened session over the given driver.
    pub fn new(driver: Box<dyn EngineDriver>) -> Self {
        Session {
            inner: Mutex::new(Inner {
                state: SessionState::Unopened,
                driver,
            }),
        }
    }

    /// Open the engine with an opaque configuration locator.
    ///
    /// The locator string is handed to the engine unmodified. On failure the
    /// session stays `Unopened` and may be opened again.
    pub fn open(&self, config: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Unopened {
            return Err(OtamaError::invalid_state("open", inner.state.name()));
        }
        let status = inner.driver.open(config);
        check_status(inner.driver.as_ref(), "open", status)?;
        inner.state = SessionState::Open;
        Ok(())
    }

    /// Close the session and release the handle.
    ///
    /// Best effort: release failures are not surfaced, and calling `close`
    /// more than once (or on a never-opened session) is harmless. After
    /// `close` every data operation fails with `InvalidState`.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Open {
            inner.driver.close();
        }
        inner.state = SessionState::Closed;
    }

    /// Initialize the engine's database storage.
    pub fn create_database(&self) -> Result<()> {
        self.inner
            .lock()
            .engine_call("create_database", |d| d.create_database())
    }

    /// Remove the engine's database storage.
    pub fn drop_database(&self) -> Result<()> {
        self.inner
            .lock()
            .engine_call("drop_database", |d| d.drop_database())
    }

    /// Commit pending inserts to the searchable index.
    pub fn pull(&self) -> Result<()> {
        self.inner.lock().engine_call("pull", |d| d.pull())
    }

    /// Alias for [`pull`](Session::pull).
    pub fn sync(&self) -> Result<()> {
        self.pull()
    }

    /// Insert the image at `source` and return its assigned identifier as a
    /// canonical lowercase hex string.
    ///
    /// On error no identifier is returned; the engine-side value is
    /// undefined and must not be used.
    pub fn insert(&self, source: &str) -> Result<String> {
        let mut inner = self.inner.lock();
        let driver = inner.require_open("insert")?;
        let mut id = RecordId::default();
        let status = driver.insert(source, &mut id);
        check_status(inner.driver.as_ref(), "insert", status)?;
        Ok(id.to_hex())
    }

    /// Search for the `limit` records most similar to the image at `source`.
    ///
    /// Results come back in engine rank order, at most `limit` of them; an
    /// empty set is a valid answer. On error nothing is returned, never a
    /// partially populated set.
    pub fn search(&self, limit: usize, source: &str) -> Result<Vec<SearchResult>> {
        let mut inner = self.inner.lock();
        let driver = inner.require_open("search")?;
        // The raw buffer is owned by this call and released on every exit
        // path, including decode failures, when `raw` drops.
        let (status, raw) = driver.search(limit, source);
        check_status(inner.driver.as_ref(), "search", status)?;
        match raw {
            Some(raw) => assemble(raw.as_ref(), limit),
            None => Ok(Vec::new()),
        }
    }

    /// Check whether a record identifier is present in the database.
    ///
    /// `id_hex` is validated locally before the engine is called; a
    /// malformed string fails with a codec error. An identifier that was
    /// never inserted yields `Ok(false)`.
    pub fn exists(&self, id_hex: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.require_open("exists")?;
        let id = RecordId::from_hex(id_hex)?;
        let mut found = false;
        let status = inner.driver.exists(&id, &mut found);
        check_status(inner.driver.as_ref(), "exists", status)?;
        Ok(found)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Scoped release: dropping an open session closes the handle, but
        // explicit `close` is the supported path.
        if self.state == SessionState::Open {
            self.driver.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{RawResults, Status};

    /// Driver that panics on any engine call, to prove state guards fire
    /// before the engine is touched.
    struct PanicDriver;

    impl EngineDriver for PanicDriver {
        fn open(&mut self, _config: &str) -> Status {
            panic!("engine called");
        }
        fn close(&mut self) {}
        fn create_database(&mut self) -> Status {
            panic!("engine called");
        }
        fn drop_database(&mut self) -> Status {
            panic!("engine called");
        }
        fn pull(&mut self) -> Status {
            panic!("engine called");
        }
        fn insert(&mut self, _source: &str, _id_out: &mut RecordId) -> Status {
            panic!("engine called");
        }
        fn search(&mut self, _limit: usize, _source: &str) -> (Status, Option<Box<dyn RawResults>>) {
            panic!("engine called");
        }
        fn exists(&mut self, _id: &RecordId, _found_out: &mut bool) -> Status {
            panic!("engine called");
        }
        fn status_message(&self, _status: Status) -> String {
            "panic driver".to_string()
        }
    }

    #[test]
    fn test_data_operations_before_open_fail_without_engine_call() {
        let session = Session::new(Box::new(PanicDriver));
        assert!(matches!(
            session.create_database(),
            Err(OtamaError::InvalidState { state: "unopened", .. })
        ));
        assert!(matches!(
            session.insert("a.jpg"),
            Err(OtamaError::InvalidState { .. })
        ));
        assert!(matches!(
            session.search(10, "a.jpg"),
            Err(OtamaError::InvalidState { .. })
        ));
        assert!(matches!(
            session.exists(&"0".repeat(40)),
            Err(OtamaError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_close_is_idempotent_and_never_reopens() {
        let session = Session::new(Box::new(PanicDriver));
        session.close();
        session.close();
        assert!(matches!(
            session.pull(),
            Err(OtamaError::InvalidState { state: "closed", .. })
        ));
        assert!(matches!(
            session.open(""),
            Err(OtamaError::InvalidState { state: "closed", .. })
        ));
    }
}
