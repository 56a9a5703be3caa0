//! Engine call surface.
//!
//! The native engine speaks a status-code protocol over an opaque handle.
//! [`EngineDriver`] mirrors that surface as a trait so the session layer can
//! run against either the real library (`ffi::NativeDriver`, behind the
//! `libotama` feature) or the in-memory driver used by the test suite. The
//! trait keeps the C calling convention's shape: out-parameters plus a
//! [`Status`] return, with translation into [`OtamaError`] happening above it.

use crate::error::{OtamaError, Result};
use crate::id::RecordId;
use crate::variant::Variant;

/// Engine status codes.
///
/// These mirror the engine's own code space; anything the binding does not
/// recognize is carried through as [`Status::Unknown`] so the engine's status
/// text can still be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// No data matched the request.
    NoData,
    /// An argument failed engine-side validation.
    InvalidArguments,
    /// Internal engine assertion failure.
    AssertionFailure,
    /// Operating-system level failure (I/O, memory).
    SysError,
    /// Operation not supported by this engine build.
    NotImplemented,
    /// A code outside the known range.
    Unknown(i32),
}

impl Status {
    /// Map a raw engine status code.
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => Status::Ok,
            1 => Status::NoData,
            2 => Status::InvalidArguments,
            3 => Status::AssertionFailure,
            4 => Status::SysError,
            5 => Status::NotImplemented,
            other => Status::Unknown(other),
        }
    }

    /// The raw engine code for this status.
    pub fn to_raw(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::NoData => 1,
            Status::InvalidArguments => 2,
            Status::AssertionFailure => 3,
            Status::SysError => 4,
            Status::NotImplemented => 5,
            Status::Unknown(code) => code,
        }
    }

    /// Whether this status indicates success.
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// Raw result buffer returned by a search call.
///
/// Slots are in engine-assigned rank order. The buffer is scoped to the
/// search call that produced it; implementations release the underlying
/// engine resources on drop.
pub trait RawResults {
    /// Number of populated slots.
    fn count(&self) -> usize;

    /// Identifier stored at `index`.
    fn id_at(&self, index: usize) -> RecordId;

    /// Value stored at `index`.
    ///
    /// Fallible because native variant conversion can hit tags or nesting the
    /// binding cannot represent.
    fn value_at(&self, index: usize) -> Result<Variant>;
}

/// Blocking call surface of one open engine handle.
///
/// A driver instance owns exactly one handle. Callers (the [`Session`]
/// layer) serialize access; implementations are not required to be
/// internally thread-safe beyond being [`Send`].
///
/// [`Session`]: crate::session::Session
pub trait EngineDriver: Send {
    /// Open the engine with an opaque configuration locator.
    ///
    /// The locator is passed through unmodified; the binding neither parses
    /// nor validates it.
    fn open(&mut self, config: &str) -> Status;

    /// Release the handle. Best effort, no status surface.
    fn close(&mut self);

    /// Initialize engine storage.
    fn create_database(&mut self) -> Status;

    /// Remove engine storage.
    fn drop_database(&mut self) -> Status;

    /// Commit pending inserts to the searchable index.
    fn pull(&mut self) -> Status;

    /// Extract features from `source` and insert them, writing the assigned
    /// identifier to `id_out` on success.
    fn insert(&mut self, source: &str, id_out: &mut RecordId) -> Status;

    /// Run a nearest-neighbor search seeded from `source`, returning at most
    /// `limit` hits in engine rank order.
    fn search(&mut self, limit: usize, source: &str) -> (Status, Option<Box<dyn RawResults>>);

    /// Check whether a record identifier is present, writing the answer to
    /// `found_out` on success.
    fn exists(&mut self, id: &RecordId, found_out: &mut bool) -> Status;

    /// The engine's own human-readable text for a status code.
    fn status_message(&self, status: Status) -> String;
}

/// Translate an engine status into a structured error.
///
/// Pure mapping: success becomes `Ok(())`, anything else becomes an
/// [`OtamaError::Engine`] carrying the operation name and the engine's own
/// status text. Retry decisions belong to the caller.
pub fn check_status(
    driver: &dyn EngineDriver,
    operation: &'static str,
    status: Status,
) -> Result<()> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(OtamaError::engine(operation, driver.status_message(status)))
    }
}
