//! FFI bindings for Holter Flux
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `holter_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::ComputeError;
use crate::pipeline::HolterProcessor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Borrow the bytes of a C string, or `None` for a null pointer
unsafe fn cstr_to_bytes<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_bytes())
}

/// Decode a configuration document passed across the boundary
fn config_from_bytes(bytes: &[u8]) -> Result<HolterProcessor, ComputeError> {
    let json = std::str::from_utf8(bytes).map_err(|e| {
        ComputeError::InvalidEncoding(format!(
            "config is not valid UTF-8 (first invalid byte at offset {})",
            e.valid_up_to()
        ))
    })?;
    HolterProcessor::from_config_json(json)
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a result to the caller, recording the error on failure
fn into_c_result(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&format!("{}: {}", e.code(), e));
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a session log and return the analysis payload as JSON.
///
/// # Safety
/// - `text` must be a valid null-terminated C string. Bytes that are not
///   UTF-8 fail with `INVALID_ENCODING`.
/// - Returns a newly allocated string that must be freed with `holter_free_string`.
/// - Returns NULL on error; call `holter_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn holter_analyze(text: *const c_char) -> *mut c_char {
    clear_last_error();

    let text_bytes = match cstr_to_bytes(text) {
        Some(bytes) => bytes,
        None => {
            set_last_error("Invalid session log string pointer");
            return ptr::null_mut();
        }
    };

    into_c_result(HolterProcessor::new().analyze_bytes_to_json(text_bytes))
}

/// Analyze a session log with a JSON engine configuration.
///
/// # Safety
/// - `text` and `config_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `holter_free_string`.
/// - Returns NULL on error; call `holter_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn holter_analyze_with_config(
    text: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let text_bytes = match cstr_to_bytes(text) {
        Some(bytes) => bytes,
        None => {
            set_last_error("Invalid session log string pointer");
            return ptr::null_mut();
        }
    };

    let config_bytes = match cstr_to_bytes(config_json) {
        Some(bytes) => bytes,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    into_c_result(
        config_from_bytes(config_bytes)
            .and_then(|processor| processor.analyze_bytes_to_json(text_bytes)),
    )
}

// ============================================================================
// Processor API
// ============================================================================

/// Opaque handle to a HolterProcessor
pub struct HolterProcessorHandle {
    processor: HolterProcessor,
}

/// Create a new HolterProcessor.
///
/// # Safety
/// - `config_json` may be NULL for default settings, otherwise it must be a
///   valid null-terminated C string.
/// - Returns a pointer that must be freed with `holter_processor_free`.
/// - Returns NULL on error; call `holter_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn holter_processor_new(
    config_json: *const c_char,
) -> *mut HolterProcessorHandle {
    clear_last_error();

    let processor = if config_json.is_null() {
        HolterProcessor::new()
    } else {
        match config_from_bytes(CStr::from_ptr(config_json).to_bytes()) {
            Ok(p) => p,
            Err(e) => {
                set_last_error(&format!("{}: {}", e.code(), e));
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(HolterProcessorHandle { processor }))
}

/// Free a HolterProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `holter_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn holter_processor_free(processor: *mut HolterProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Analyze a session log with a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `holter_processor_new`.
/// - `text` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `holter_free_string`.
/// - Returns NULL on error; call `holter_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn holter_processor_analyze(
    processor: *const HolterProcessorHandle,
    text: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let text_bytes = match cstr_to_bytes(text) {
        Some(bytes) => bytes,
        None => {
            set_last_error("Invalid session log string pointer");
            return ptr::null_mut();
        }
    };

    let handle = &*processor;
    into_c_result(handle.processor.analyze_bytes_to_json(text_bytes))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Holter functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Holter function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn holter_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Holter function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn holter_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn holter_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
