//! FFI driver over the native otama library.
//!
//! All `extern "C"` declarations for the engine live in this module, gated
//! behind the `libotama` feature; `build.rs` emits the link line only when
//! the feature is enabled. Calls are blocking and the handle is not
//! thread-safe, which the session layer accounts for by serializing access.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_long};
use std::ptr;

use crate::driver::{EngineDriver, RawResults, Status};
use crate::error::{OtamaError, Result};
use crate::id::{RECORD_ID_LEN, RecordId};
use crate::variant::Variant;

/// Depth cap when converting native variants, mirroring the decoder's guard.
const MAX_CONVERT_DEPTH: usize = 64;

mod raw {
    use super::{c_char, c_int, c_long};

    /// Opaque engine handle.
    #[repr(C)]
    pub struct otama_t {
        _private: [u8; 0],
    }

    /// Opaque raw result buffer.
    #[repr(C)]
    pub struct otama_result_t {
        _private: [u8; 0],
    }

    /// Opaque variant value.
    #[repr(C)]
    pub struct otama_variant_t {
        _private: [u8; 0],
    }

    /// Binary record identifier, layout-compatible with the C struct.
    #[repr(C)]
    #[derive(Clone, Copy)]
    pub struct otama_id_t {
        pub octets: [u8; super::RECORD_ID_LEN],
    }

    pub const OTAMA_VARIANT_TYPE_NULL: c_int = 0;
    pub const OTAMA_VARIANT_TYPE_INT: c_int = 1;
    pub const OTAMA_VARIANT_TYPE_FLOAT: c_int = 2;
    pub const OTAMA_VARIANT_TYPE_STRING: c_int = 3;
    pub const OTAMA_VARIANT_TYPE_ARRAY: c_int = 4;
    pub const OTAMA_VARIANT_TYPE_HASH: c_int = 5;

    unsafe extern "C" {
        pub fn otama_open(otama: *mut *mut otama_t, config: *const c_char) -> c_int;
        pub fn otama_close(otama: *mut *mut otama_t);
        pub fn otama_create_database(otama: *mut otama_t) -> c_int;
        pub fn otama_drop_database(otama: *mut otama_t) -> c_int;
        pub fn otama_pull(otama: *mut otama_t) -> c_int;
        pub fn otama_insert_file(
            otama: *mut otama_t,
            id: *mut otama_id_t,
            file: *const c_char,
        ) -> c_int;
        pub fn otama_search_file(
            otama: *mut otama_t,
            results: *mut *mut otama_result_t,
            n: c_int,
            file: *const c_char,
        ) -> c_int;
        pub fn otama_exists(otama: *mut otama_t, result: *mut c_int, id: *const otama_id_t)
        -> c_int;

        pub fn otama_result_free(results: *mut *mut otama_result_t);
        pub fn otama_result_count(results: *const otama_result_t) -> c_long;
        pub fn otama_result_id(results: *const otama_result_t, index: c_long)
        -> *const otama_id_t;
        pub fn otama_result_value(
            results: *const otama_result_t,
            index: c_long,
        ) -> *mut otama_variant_t;

        pub fn otama_status_message(status: c_int) -> *const c_char;

        pub fn otama_variant_type(value: *mut otama_variant_t) -> c_int;
        pub fn otama_variant_to_int(value: *mut otama_variant_t) -> i64;
        pub fn otama_variant_to_float(value: *mut otama_variant_t) -> f64;
        pub fn otama_variant_to_string(value: *mut otama_variant_t) -> *const c_char;
        pub fn otama_variant_array_count(value: *mut otama_variant_t) -> c_long;
        pub fn otama_variant_array_at(
            value: *mut otama_variant_t,
            index: c_long,
        ) -> *mut otama_variant_t;
        pub fn otama_variant_hash_keys(value: *mut otama_variant_t) -> *mut otama_variant_t;
        pub fn otama_variant_hash_at(
            value: *mut otama_variant_t,
            key: *const c_char,
        ) -> *mut otama_variant_t;
    }
}

/// Driver backed by the native engine.
pub struct NativeDriver {
    handle: *mut raw::otama_t,
}

// The handle is only reachable through &mut self and the session serializes
// all calls; moving the driver between threads is sound.
unsafe impl Send for NativeDriver {}

impl NativeDriver {
    /// Create a driver with no handle; `open` acquires one.
    pub fn new() -> Self {
        NativeDriver {
            handle: ptr::null_mut(),
        }
    }
}

impl Default for NativeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineDriver for NativeDriver {
    fn open(&mut self, config: &str) -> Status {
        let Ok(config) = CString::new(config) else {
            return Status::InvalidArguments;
        };
        let code = unsafe { raw::otama_open(&mut self.handle, config.as_ptr()) };
        Status::from_raw(code)
    }

    fn close(&mut self) {
        if !self.handle.is_null() {
            unsafe { raw::otama_close(&mut self.handle) };
            self.handle = ptr::null_mut();
        }
    }

    fn create_database(&mut self) -> Status {
        Status::from_raw(unsafe { raw::otama_create_database(self.handle) })
    }

    fn drop_database(&mut self) -> Status {
        Status::from_raw(unsafe { raw::otama_drop_database(self.handle) })
    }

    fn pull(&mut self) -> Status {
        Status::from_raw(unsafe { raw::otama_pull(self.handle) })
    }

    fn insert(&mut self, source: &str, id_out: &mut RecordId) -> Status {
        let Ok(file) = CString::new(source) else {
            return Status::InvalidArguments;
        };
        let mut id = raw::otama_id_t {
            octets: [0; RECORD_ID_LEN],
        };
        let code = unsafe { raw::otama_insert_file(self.handle, &mut id, file.as_ptr()) };
        let status = Status::from_raw(code);
        if status.is_ok() {
            *id_out = RecordId::new(id.octets);
        }
        status
    }

    fn search(&mut self, limit: usize, source: &str) -> (Status, Option<Box<dyn RawResults>>) {
        let Ok(file) = CString::new(source) else {
            return (Status::InvalidArguments, None);
        };
        let n = c_int::try_from(limit).unwrap_or(c_int::MAX);
        let mut results: *mut raw::otama_result_t = ptr::null_mut();
        let code = unsafe { raw::otama_search_file(self.handle, &mut results, n, file.as_ptr()) };
        let status = Status::from_raw(code);
        if status.is_ok() && !results.is_null() {
            (status, Some(Box::new(NativeResults { results })))
        } else {
            if !results.is_null() {
                unsafe { raw::otama_result_free(&mut results) };
            }
            (status, None)
        }
    }

    fn exists(&mut self, id: &RecordId, found_out: &mut bool) -> Status {
        let native_id = raw::otama_id_t {
            octets: *id.as_bytes(),
        };
        let mut result: c_int = 0;
        let code = unsafe { raw::otama_exists(self.handle, &mut result, &native_id) };
        let status = Status::from_raw(code);
        if status.is_ok() {
            *found_out = result != 0;
        }
        status
    }

    fn status_message(&self, status: Status) -> String {
        let ptr = unsafe { raw::otama_status_message(status.to_raw()) };
        if ptr.is_null() {
            return format!("status code {}", status.to_raw());
        }
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

impl Drop for NativeDriver {
    fn drop(&mut self) {
        self.close();
    }
}

/// Raw result buffer owned by one search call; freed on drop.
struct NativeResults {
    results: *mut raw::otama_result_t,
}

unsafe impl Send for NativeResults {}

impl RawResults for NativeResults {
    fn count(&self) -> usize {
        let n = unsafe { raw::otama_result_count(self.results) };
        usize::try_from(n).unwrap_or(0)
    }

    fn id_at(&self, index: usize) -> RecordId {
        let id = unsafe { raw::otama_result_id(self.results, index as c_long) };
        if id.is_null() {
            return RecordId::default();
        }
        RecordId::new(unsafe { (*id).octets })
    }

    fn value_at(&self, index: usize) -> Result<Variant> {
        let value = unsafe { raw::otama_result_value(self.results, index as c_long) };
        convert_variant(value, 0)
    }
}

impl Drop for NativeResults {
    fn drop(&mut self) {
        if !self.results.is_null() {
            unsafe { raw::otama_result_free(&mut self.results) };
        }
    }
}

/// Convert a native variant tree into the binding's [`Variant`].
///
/// Hash key order is taken from the engine's own key listing so the
/// first-field drill policy sees the same order the engine reports.
fn convert_variant(value: *mut raw::otama_variant_t, depth: usize) -> Result<Variant> {
    if depth > MAX_CONVERT_DEPTH {
        return Err(OtamaError::decode(format!(
            "native variant nesting exceeds depth limit {MAX_CONVERT_DEPTH}"
        )));
    }
    if value.is_null() {
        return Ok(Variant::Null);
    }

    let tag = unsafe { raw::otama_variant_type(value) };
    match tag {
        raw::OTAMA_VARIANT_TYPE_NULL => Ok(Variant::Null),
        raw::OTAMA_VARIANT_TYPE_INT => Ok(Variant::Int(unsafe { raw::otama_variant_to_int(value) })),
        raw::OTAMA_VARIANT_TYPE_FLOAT => {
            Ok(Variant::Float(unsafe { raw::otama_variant_to_float(value) }))
        }
        raw::OTAMA_VARIANT_TYPE_STRING => {
            let s = unsafe { raw::otama_variant_to_string(value) };
            if s.is_null() {
                return Ok(Variant::String(String::new()));
            }
            Ok(Variant::String(
                unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned(),
            ))
        }
        raw::OTAMA_VARIANT_TYPE_ARRAY => {
            let count = unsafe { raw::otama_variant_array_count(value) };
            let count = usize::try_from(count).unwrap_or(0);
            let mut items = Vec::with_capacity(count);
            for i in 0..count {
                let item = unsafe { raw::otama_variant_array_at(value, i as c_long) };
                items.push(convert_variant(item, depth + 1)?);
            }
            Ok(Variant::Array(items))
        }
        raw::OTAMA_VARIANT_TYPE_HASH => {
            let keys = unsafe { raw::otama_variant_hash_keys(value) };
            let count = if keys.is_null() {
                0
            } else {
                usize::try_from(unsafe { raw::otama_variant_array_count(keys) }).unwrap_or(0)
            };
            let mut pairs = Vec::with_capacity(count);
            for i in 0..count {
                let key_variant = unsafe { raw::otama_variant_array_at(keys, i as c_long) };
                let key_ptr = unsafe { raw::otama_variant_to_string(key_variant) };
                if key_ptr.is_null() {
                    continue;
                }
                let key = unsafe { CStr::from_ptr(key_ptr) };
                let bound = unsafe { raw::otama_variant_hash_at(value, key.as_ptr()) };
                pairs.push((
                    key.to_string_lossy().into_owned(),
                    convert_variant(bound, depth + 1)?,
                ));
            }
            Ok(Variant::Hash(pairs))
        }
        other => Err(OtamaError::decode(format!(
            "unrecognized native variant tag {other}"
        ))),
    }
}
