// FFI boundary requires integer casts for lengths and counts
#![allow(
    clippy::cast_possible_truncation, // field/error counts fit in i32
    clippy::cast_possible_wrap,
    clippy::must_use_candidate,       // FFI functions don't need must_use
)]

//! C ABI for the login form detector
//!
//! # Memory Management
//!
//! Every [`LdDetectionResult`] returned by this library is allocated by Rust
//! and must be released with [`FreeDetectionResult`], which frees the record,
//! its field array, every string and the error array in one call. Detector
//! handles from [`ld_detector_new`] are released with [`ld_detector_free`].
//!
//! # Thread Safety
//!
//! A detector handle must only be used from one thread at a time. Create one
//! handle per thread for concurrent processing. [`DetectLoginPage`] builds a
//! private detector per call and shares no state.

use login_detect::{DetectorConfig, LoginPageDetector};
use login_detect_common::{DetectionResult, FieldType, FormField, Region};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use tracing::error;

/// One detected field as seen from C
#[repr(C)]
#[derive(Debug)]
pub struct LdDetectedField {
    /// Field type name ("Username", "Password", ...)
    pub type_name: *mut c_char,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// OCR text, or "Password field: N dots"
    pub content: *mut c_char,
}

/// Analysis outcome as seen from C
#[repr(C)]
#[derive(Debug)]
pub struct LdDetectionResult {
    pub is_login_page: bool,
    pub confidence: f64,
    /// Array of `field_count` entries (null when empty)
    pub fields: *mut LdDetectedField,
    pub field_count: i32,
    /// Array of `error_count` strings (null when empty)
    pub errors: *mut *mut c_char,
    pub error_count: i32,
    pub execution_time_ms: f64,
}

/// Opaque detector handle
pub struct LdDetector {
    inner: LoginPageDetector,
}

// ============================================================================
// Conversion
// ============================================================================

/// Owned C string; interior NULs are dropped
fn to_c_string(s: &str) -> *mut c_char {
    let cleaned: String = s.chars().filter(|c| *c != '\0').collect();
    CString::new(cleaned).map_or(ptr::null_mut(), CString::into_raw)
}

fn into_raw_slice<T>(items: Vec<T>) -> *mut T {
    if items.is_empty() {
        ptr::null_mut()
    } else {
        Box::into_raw(items.into_boxed_slice()).cast::<T>()
    }
}

/// Move a result into a freshly allocated C record
pub fn into_raw_result(result: DetectionResult) -> *mut LdDetectionResult {
    let fields: Vec<LdDetectedField> = result
        .fields
        .iter()
        .map(|f| LdDetectedField {
            type_name: to_c_string(f.field_type.name()),
            x: f.region.x,
            y: f.region.y,
            width: f.region.width,
            height: f.region.height,
            content: to_c_string(&f.content),
        })
        .collect();
    let errors: Vec<*mut c_char> = result.errors.iter().map(|e| to_c_string(e)).collect();

    let field_count = fields.len() as i32;
    let error_count = errors.len() as i32;
    Box::into_raw(Box::new(LdDetectionResult {
        is_login_page: result.is_login_page,
        confidence: result.confidence,
        fields: into_raw_slice(fields),
        field_count,
        errors: into_raw_slice(errors),
        error_count,
        execution_time_ms: result.execution_time_ms,
    }))
}

unsafe fn read_c_string(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

/// Copy a C record back into a [`DetectionResult`] (the record is not freed)
///
/// # Safety
/// `result` must be null or a pointer obtained from this library that has not
/// been freed yet.
pub unsafe fn read_result(result: *const LdDetectionResult) -> Option<DetectionResult> {
    let raw = result.as_ref()?;

    let mut fields = Vec::new();
    if !raw.fields.is_null() {
        for f in std::slice::from_raw_parts(raw.fields, raw.field_count.max(0) as usize) {
            let field_type = read_c_string(f.type_name)
                .parse()
                .unwrap_or(FieldType::UnknownField);
            fields.push(FormField {
                field_type,
                region: Region::new(f.x, f.y, f.width, f.height),
                content: read_c_string(f.content),
            });
        }
    }

    let mut errors = Vec::new();
    if !raw.errors.is_null() {
        for e in std::slice::from_raw_parts(raw.errors, raw.error_count.max(0) as usize) {
            errors.push(read_c_string(*e));
        }
    }

    Some(DetectionResult {
        is_login_page: raw.is_login_page,
        confidence: raw.confidence,
        fields,
        errors,
        execution_time_ms: raw.execution_time_ms,
        ..DetectionResult::default()
    })
}

unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run an analysis, turning a panic into an error result
fn guarded(analysis: impl FnOnce() -> DetectionResult) -> DetectionResult {
    catch_unwind(AssertUnwindSafe(analysis)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!("Detector panicked: {}", message);
        DetectionResult::failed(format!("Error: internal failure: {message}"))
    })
}

unsafe fn path_arg(path: *const c_char) -> Result<String, DetectionResult> {
    if path.is_null() {
        return Err(DetectionResult::failed("Error: image path is null"));
    }
    CStr::from_ptr(path)
        .to_str()
        .map(str::to_string)
        .map_err(|_| DetectionResult::failed("Error: image path is not valid UTF-8"))
}

// ============================================================================
// Detector Lifecycle
// ============================================================================

/// Create a detector with its own OCR engine
///
/// # Returns
/// Pointer to a new detector, or null when `threshold` is outside [0, 1]
///
/// # Memory
/// Caller must free with `ld_detector_free`
#[no_mangle]
pub extern "C" fn ld_detector_new(threshold: f64) -> *mut LdDetector {
    let created = catch_unwind(|| LoginPageDetector::new(DetectorConfig::with_threshold(threshold)));
    match created {
        Ok(Ok(inner)) => Box::into_raw(Box::new(LdDetector { inner })),
        Ok(Err(e)) => {
            error!("Failed to create detector: {}", e);
            ptr::null_mut()
        }
        Err(payload) => {
            error!("Detector construction panicked: {}", panic_message(payload.as_ref()));
            ptr::null_mut()
        }
    }
}

/// Free a detector and release its OCR engine
///
/// # Safety
/// - `detector` must be null or a pointer from `ld_detector_new`
/// - `detector` must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn ld_detector_free(detector: *mut LdDetector) {
    if !detector.is_null() {
        drop(Box::from_raw(detector));
    }
}

/// Analyze one image file
///
/// # Returns
/// A result record; never null. Failures are reported through its errors.
///
/// # Safety
/// - `detector` must be null or a valid pointer from `ld_detector_new`
/// - `path` must be null or a valid null-terminated string
#[no_mangle]
pub unsafe extern "C" fn ld_detector_analyze(
    detector: *mut LdDetector,
    path: *const c_char,
) -> *mut LdDetectionResult {
    let Some(detector) = detector.as_mut() else {
        return into_raw_result(DetectionResult::failed("Error: detector handle is null"));
    };
    let result = match path_arg(path) {
        Ok(path) => guarded(|| detector.inner.analyze_path(&path)),
        Err(failed) => failed,
    };
    into_raw_result(result)
}

// ============================================================================
// One-shot API
// ============================================================================

/// Analyze one image with a transient detector
///
/// # Safety
/// `path` must be null or a valid null-terminated string
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn DetectLoginPage(
    path: *const c_char,
    threshold: f64,
) -> *mut LdDetectionResult {
    let result = match path_arg(path) {
        Ok(path) => guarded(|| {
            match LoginPageDetector::new(DetectorConfig::with_threshold(threshold)) {
                Ok(mut detector) => detector.analyze_path(&path),
                Err(e) => DetectionResult::failed(format!("Error: {e}")),
            }
        }),
        Err(failed) => failed,
    };
    into_raw_result(result)
}

/// Release a result record and everything it points to
///
/// # Safety
/// - `result` must be null or a pointer returned by this library
/// - `result` must not be used after this call
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn FreeDetectionResult(result: *mut LdDetectionResult) {
    if result.is_null() {
        return;
    }
    let raw = Box::from_raw(result);

    if !raw.fields.is_null() {
        let fields = Box::from_raw(ptr::slice_from_raw_parts_mut(
            raw.fields,
            raw.field_count.max(0) as usize,
        ));
        for f in fields.iter() {
            free_c_string(f.type_name);
            free_c_string(f.content);
        }
    }

    if !raw.errors.is_null() {
        let errors = Box::from_raw(ptr::slice_from_raw_parts_mut(
            raw.errors,
            raw.error_count.max(0) as usize,
        ));
        for e in errors.iter() {
            free_c_string(*e);
        }
    }
}

/// Library version (static string, do not free)
#[no_mangle]
pub extern "C" fn ld_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr().cast()
}

/// Whether the library was built with an OCR backend
#[no_mangle]
pub const extern "C" fn ld_has_ocr() -> bool {
    cfg!(feature = "tesseract")
}
