//! FFI interface for C/C++ hosts
//!
//! Markup goes in as a pointer/length pair, everything else as JSON.
//! Results come back as JSON strings owned by Rust.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ParserConfig;
use crate::detect;
use crate::error::ParseError;
use crate::pipeline::{parse_detected, ParseBudget};
use crate::templates::{TemplateRecord, TemplateSet};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_parse_result
#[repr(C)]
pub struct ParseResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if parsing failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Request accompanying the markup in [`parse_page_ffi`]
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageRequest {
    /// Raw template rows; rows that fail to decode are skipped
    #[serde(default)]
    pub templates: Vec<Value>,
    #[serde(default)]
    pub config: ParserConfig,
}

impl PageRequest {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json).map_err(ParseError::InvalidRequest)
    }
}

/// Parse a page into blocks.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized PageRequest (null-terminated), or null
///   for no templates and the default config
///
/// # Returns
/// ParseResultFFI with json_ptr holding the PageResult (success) or
/// error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be null or a valid null-terminated C string
/// - Caller must free the result via `free_parse_result`
#[no_mangle]
pub unsafe extern "C" fn parse_page_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ParseResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    let request = if request_json.is_null() {
        PageRequest::default()
    } else {
        let request_str = match CStr::from_ptr(request_json).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
        };
        match PageRequest::from_json(request_str) {
            Ok(r) => r,
            Err(e) => return make_error_result(&e.to_string()),
        }
    };

    let platform = detect::detect(html);
    let records = TemplateRecord::from_values(&request.templates);
    let templates = TemplateSet::from_records(&records).for_platform(platform);
    let page = parse_detected(html, platform, &templates, &request.config, &ParseBudget::unlimited());
    to_json_result(&page)
}

/// Detect the platform of a page; the JSON result is `{"platform": "..."}`.
///
/// # Safety
/// Same as parse_page_ffi
#[no_mangle]
pub unsafe extern "C" fn detect_platform_ffi(
    html_ptr: *const c_char,
    html_len: usize,
) -> ParseResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    to_json_result(&serde_json::json!({ "platform": detect::detect(html) }))
}

/// Free a ParseResultFFI returned by this module
///
/// # Safety
/// - `result` must have been returned by `parse_page_ffi` or `detect_platform_ffi`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_parse_result(result: ParseResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

fn to_json_result<T: Serialize>(value: &T) -> ParseResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ParseResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ParseResultFFI {
    let error_cstr = CString::new(msg).unwrap_or_else(|_| CString::new("Unknown error").unwrap());
    ParseResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
