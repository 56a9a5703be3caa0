//! # otama
//!
//! Rust binding for the otama content-based image similarity search engine.
//!
//! The engine itself (feature extraction, indexing, distance computation and
//! on-disk storage) lives behind an opaque handle and a status-code protocol;
//! this crate owns the marshaling layer on top of it:
//!
//! - [`Session`] lifecycle over the engine handle (open, close, create/drop
//!   database, insert, pull, search, exists)
//! - the binary/hex [`RecordId`] codec
//! - recursive [`Variant`] decoding into similarity scores
//! - ranked [`SearchResult`] assembly
//! - translation of engine status codes into structured [`OtamaError`] values
//!
//! The engine is reached through the [`EngineDriver`] trait. Production code
//! uses the FFI driver behind the `libotama` feature; tests use the
//! deterministic in-memory driver.
//!
//! ## Example
//!
//! ```
//! use otama::{MemoryDriver, Session};
//!
//! # fn main() -> otama::Result<()> {
//! let session = Session::new(Box::new(MemoryDriver::new()));
//! session.open("")?;
//! session.create_database()?;
//! let results = session.search(10, "query.jpg");
//! session.close();
//! # let _ = results;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
#[cfg(feature = "libotama")]
pub mod ffi;
pub mod id;
pub mod memory;
pub mod results;
pub mod session;
pub mod variant;

pub use driver::{EngineDriver, RawResults, Status};
pub use error::{OtamaError, Result};
#[cfg(feature = "libotama")]
pub use ffi::NativeDriver;
pub use id::{RECORD_ID_HEX_LEN, RECORD_ID_LEN, RecordId};
pub use memory::MemoryDriver;
pub use results::SearchResult;
pub use session::Session;
pub use variant::Variant;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
