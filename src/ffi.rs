//! A thin, mechanical C ABI over the native library API.
//!
//! Every function here is `NULL`-safe: a `NULL` or otherwise invalid handle
//! never crashes, it sets the thread-local error message and returns a zero
//! or empty value. Pointers returned by an accessor are valid until the
//! handle they came from is freed; the caller must not mutate through them.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::io::Read;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::document::{Document, FontFamily, ImageFormat};
use crate::{parse_bytes, parse_file, parse_reader};

/// `errmsg()`/`clear_error()` result codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtfResultCode {
    Ok = 0,
    Error = 1,
    NoMem = 2,
    Invalid = 3,
    TooBig = 4,
}

const ERROR_BUF_LEN: usize = 512;

thread_local! {
    static LAST_ERROR: RefCell<[u8; ERROR_BUF_LEN]> = RefCell::new([0u8; ERROR_BUF_LEN]);
}

/// Overwrite the thread-local error buffer, truncating at capacity and
/// always leaving it `NUL`-terminated.
fn set_last_error(message: &str) {
    LAST_ERROR.with(|cell| {
        let mut buf = cell.borrow_mut();
        buf.fill(0);
        let bytes = message.as_bytes();
        let n = bytes.len().min(ERROR_BUF_LEN - 1);
        buf[..n].copy_from_slice(&bytes[..n]);
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|cell| cell.borrow_mut().fill(0));
}

fn result_code_for(err: &crate::RtfError) -> RtfResultCode {
    match err {
        crate::RtfError::TooBig { .. } => RtfResultCode::TooBig,
        crate::RtfError::OutOfMemory => RtfResultCode::NoMem,
        crate::RtfError::Semantic { .. } => RtfResultCode::Invalid,
        crate::RtfError::Lexical { .. } | crate::RtfError::Structural { .. } | crate::RtfError::Io(_) => RtfResultCode::Error,
    }
}

/// `errmsg()`: the last error set on this thread, or an empty string.
#[no_mangle]
pub extern "C" fn rtf_reader_errmsg() -> *const c_char {
    LAST_ERROR.with(|cell| cell.borrow().as_ptr() as *const c_char)
}

/// `clear_error()`.
#[no_mangle]
pub extern "C" fn rtf_reader_clear_error() {
    clear_last_error();
}

/// Opaque document handle. `Document`'s accessor methods only ever read, so
/// a completed handle is safe to access from any thread, but never from more
/// than one at a time while it might be freed.
pub struct RtfDocument {
    document: Document,
    /// Cached `CString`s for pointers handed back to the caller, so repeated
    /// accessor calls return a stable address without re-allocating; kept
    /// alive until `rtf_reader_free`.
    text_cache: RefCell<Option<CString>>,
    font_name_cache: RefCell<Vec<Option<CString>>>,
    /// One scratch slot per accessor kind that hands back a freshly
    /// formatted `CString`, so the pointer stays valid at least until the
    /// next call to that same accessor on this handle.
    run_text_scratch: RefCell<Option<CString>>,
    cell_text_cache: RefCell<std::collections::HashMap<(usize, usize, usize), CString>>,
}

impl RtfDocument {
    fn new(document: Document) -> Self {
        RtfDocument {
            document,
            text_cache: RefCell::new(None),
            font_name_cache: RefCell::new(Vec::new()),
            run_text_scratch: RefCell::new(None),
            cell_text_cache: RefCell::new(std::collections::HashMap::new()),
        }
    }
}

fn handle_from_result(result: crate::Result<Document>) -> *mut RtfDocument {
    match result {
        Ok(doc) => {
            clear_last_error();
            Box::into_raw(Box::new(RtfDocument::new(doc)))
        }
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// `parse(ptr, len) → handle | NULL`.
///
/// # Safety
/// `ptr` must point to at least `len` readable bytes, or `len` must be 0.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_parse(ptr: *const u8, len: usize) -> *mut RtfDocument {
    if ptr.is_null() && len != 0 {
        set_last_error("null pointer with non-zero length");
        return ptr::null_mut();
    }
    let bytes = if len == 0 { &[] } else { std::slice::from_raw_parts(ptr, len) };
    handle_from_result(parse_bytes(bytes))
}

/// A caller-supplied pull reader: `read_fn(user_data, buf, buf_len)` returns
/// the number of bytes written into `buf`, 0 at end of stream, or a negative
/// value on error.
#[repr(C)]
pub struct RtfReaderStream {
    pub user_data: *mut c_void,
    pub read_fn: extern "C" fn(*mut c_void, *mut u8, usize) -> isize,
}

struct CReaderAdapter {
    stream: RtfReaderStream,
}

// SAFETY: the caller guarantees `user_data` and `read_fn` are safe to invoke
// from whichever thread ends up driving the parse; we never touch either
// concurrently ourselves.
unsafe impl Send for CReaderAdapter {}

impl Read for CReaderAdapter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = (self.stream.read_fn)(self.stream.user_data, buf.as_mut_ptr(), buf.len());
        if n < 0 {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "C reader callback failed"))
        } else {
            Ok(n as usize)
        }
    }
}

/// `parse_stream(reader_struct) → handle | NULL`.
///
/// # Safety
/// `reader` must point to a valid, initialized `RtfReaderStream` whose
/// `read_fn` is safe to call with the given `user_data` for the duration of
/// the parse.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_parse_stream(reader: *const RtfReaderStream) -> *mut RtfDocument {
    if reader.is_null() {
        set_last_error("null reader");
        return ptr::null_mut();
    }
    let stream = RtfReaderStream { user_data: (*reader).user_data, read_fn: (*reader).read_fn };
    handle_from_result(parse_reader(CReaderAdapter { stream }))
}

/// `parse_file(cstr) → handle | NULL`.
///
/// # Safety
/// `path` must be a valid, `NUL`-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_parse_file(path: *const c_char) -> *mut RtfDocument {
    if path.is_null() {
        set_last_error("null path");
        return ptr::null_mut();
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(p) => p,
        Err(_) => {
            set_last_error("path is not valid UTF-8");
            return ptr::null_mut();
        }
    };
    handle_from_result(parse_file(path))
}

/// `free(handle)`. `NULL`-safe.
///
/// # Safety
/// `handle` must be a pointer previously returned by one of the `parse_*`
/// functions above and not already freed.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_free(handle: *mut RtfDocument) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Accessors on a `NULL` handle return zero/empty and set `"Null document"`
/// as the thread-local error; they never crash.
unsafe fn with_handle<T>(handle: *const RtfDocument, default: T, f: impl FnOnce(&RtfDocument) -> T) -> T {
    match handle.as_ref() {
        Some(doc) => f(doc),
        None => {
            set_last_error("Null document");
            default
        }
    }
}

/// `get_text(handle) → *const c_char`. Valid until `free(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_text(handle: *const RtfDocument) -> *const c_char {
    with_handle(handle, ptr::null(), |doc| {
        let mut cache = doc.text_cache.borrow_mut();
        if cache.is_none() {
            *cache = Some(CString::new(doc.document.plain_text()).unwrap_or_default());
        }
        cache.as_ref().unwrap().as_ptr()
    })
}

/// `get_text_length(handle)`, in bytes, excluding the `NUL` terminator.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_text_length(handle: *const RtfDocument) -> usize {
    with_handle(handle, 0, |doc| doc.document.plain_text().len())
}

/// `get_run_count(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_run_count(handle: *const RtfDocument) -> usize {
    with_handle(handle, 0, |doc| doc.document.text_runs().len())
}

/// Packed per-run fields for the C ABI: character toggles as individual
/// bits, resolved font/color ids, and paragraph geometry, matching
/// [`crate::format::CharFormat`]/[`crate::format::ParaFormat`] without
/// exposing their Rust layout across the ABI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RtfRun {
    pub text: *const c_char,
    pub text_len: usize,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub font_id: i32,
    pub font_size_half_points: i32,
    pub color_id: i32,
    pub color_rgb: u32,
    /// 0=left, 1=center, 2=right, 3=justify.
    pub alignment: c_int,
    pub left_indent_twips: i32,
    pub right_indent_twips: i32,
    pub first_line_indent_twips: i32,
    pub space_before_twips: i32,
    pub space_after_twips: i32,
}

impl RtfRun {
    fn empty() -> Self {
        RtfRun {
            text: ptr::null(),
            text_len: 0,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            superscript: false,
            subscript: false,
            font_id: -1,
            font_size_half_points: -1,
            color_id: -1,
            color_rgb: 0,
            alignment: 0,
            left_indent_twips: 0,
            right_indent_twips: 0,
            first_line_indent_twips: 0,
            space_before_twips: 0,
            space_after_twips: 0,
        }
    }
}

/// `get_run(handle, i) → RtfRun`. Out-of-range `i` yields a zeroed run
/// pointing at `NULL` text.
///
/// The returned `text` pointer is only valid until the *next* call to
/// `get_run` on this handle (it reuses a single per-handle scratch
/// `CString`), unlike `get_text`, which is cached for the handle's lifetime.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_run(handle: *const RtfDocument, index: usize) -> RtfRun {
    with_handle(handle, RtfRun::empty(), |doc| {
        let runs = doc.document.text_runs();
        let Some(run) = runs.get(index) else { return RtfRun::empty() };
        let cf = &run.char_format;
        let pf = &run.para_format;
        let color_rgb = run
            .char_format
            .foreground_color_id
            .and_then(|id| doc.document.color(id))
            .map(|c| (u32::from(c.red) << 16) | (u32::from(c.green) << 8) | u32::from(c.blue))
            .unwrap_or(0);
        let mut scratch = doc.run_text_scratch.borrow_mut();
        *scratch = Some(CString::new(run.text.as_str()).unwrap_or_default());
        RtfRun {
            text: scratch.as_ref().unwrap().as_ptr(),
            text_len: run.text.len(),
            bold: cf.bold,
            italic: cf.italic,
            underline: cf.underline,
            strikethrough: cf.strikethrough,
            superscript: cf.superscript,
            subscript: cf.subscript,
            font_id: cf.font_id.map(i32::from).unwrap_or(-1),
            font_size_half_points: cf.font_size_half_points.map(i32::from).unwrap_or(-1),
            color_id: cf.foreground_color_id.map(i32::from).unwrap_or(-1),
            color_rgb,
            alignment: pf.alignment as c_int,
            left_indent_twips: pf.left_indent_twips,
            right_indent_twips: pf.right_indent_twips,
            first_line_indent_twips: pf.first_line_indent_twips,
            space_before_twips: pf.space_before_twips as i32,
            space_after_twips: pf.space_after_twips as i32,
        }
    })
}

/// `get_image_count(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_image_count(handle: *const RtfDocument) -> usize {
    with_handle(handle, 0, |doc| doc.document.image_count())
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RtfImage {
    pub format: c_int,
    pub width: i32,
    pub height: i32,
    pub dimensions_in_pixels: bool,
    pub data: *const u8,
    pub data_len: usize,
}

fn image_format_code(format: ImageFormat) -> c_int {
    match format {
        ImageFormat::Unknown => 0,
        ImageFormat::Wmf => 1,
        ImageFormat::Emf => 2,
        ImageFormat::Pict => 3,
        ImageFormat::Jpeg => 4,
        ImageFormat::Png => 5,
    }
}

/// `get_image(handle, i) → RtfImage`. `data` is valid until `free(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_image(handle: *const RtfDocument, index: usize) -> RtfImage {
    with_handle(
        handle,
        RtfImage { format: 0, width: 0, height: 0, dimensions_in_pixels: false, data: ptr::null(), data_len: 0 },
        |doc| match doc.document.image(index) {
            Some(img) => RtfImage {
                format: image_format_code(img.format),
                width: img.width,
                height: img.height,
                dimensions_in_pixels: img.dimensions_in_pixels,
                data: img.data.as_ptr(),
                data_len: img.data.len(),
            },
            None => RtfImage { format: 0, width: 0, height: 0, dimensions_in_pixels: false, data: ptr::null(), data_len: 0 },
        },
    )
}

/// `get_table_count(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_table_count(handle: *const RtfDocument) -> usize {
    with_handle(handle, 0, |doc| doc.document.table_count())
}

/// `table_get_row_count(handle, table_index)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_table_get_row_count(handle: *const RtfDocument, table_index: usize) -> usize {
    with_handle(handle, 0, |doc| doc.document.table(table_index).map_or(0, |t| t.row_count()))
}

/// `table_get_cell_count(handle, table_index, row_index)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_table_get_cell_count(handle: *const RtfDocument, table_index: usize, row_index: usize) -> usize {
    with_handle(handle, 0, |doc| doc.document.table(table_index).map_or(0, |t| t.cell_count(row_index)))
}

/// `table_get_cell_text(handle, table_index, row_index, cell_index)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_table_get_cell_text(
    handle: *const RtfDocument,
    table_index: usize,
    row_index: usize,
    cell_index: usize,
) -> *const c_char {
    with_handle(handle, ptr::null(), |doc| {
        let Some(table) = doc.document.table(table_index) else { return ptr::null() };
        let Some(row) = table.rows.get(row_index) else { return ptr::null() };
        let Some(cell) = row.cells.get(cell_index) else { return ptr::null() };
        let mut text = String::new();
        for element in &cell.content {
            if let crate::document::ContentElement::TextRun(run) = element {
                text.push_str(&run.text);
            }
        }
        let mut cache = doc.cell_text_cache.borrow_mut();
        cache
            .entry((table_index, row_index, cell_index))
            .or_insert_with(|| CString::new(text).unwrap_or_default())
            .as_ptr()
    })
}

/// `table_get_cell_width(handle, table_index, row_index, cell_index)`, in twips.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_table_get_cell_width(
    handle: *const RtfDocument,
    table_index: usize,
    row_index: usize,
    cell_index: usize,
) -> i32 {
    with_handle(handle, 0, |doc| {
        doc.document
            .table(table_index)
            .and_then(|t| t.rows.get(row_index))
            .and_then(|r| r.cells.get(cell_index))
            .map_or(0, |c| c.width_twips)
    })
}

/// `get_font_count(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_font_count(handle: *const RtfDocument) -> usize {
    with_handle(handle, 0, |doc| doc.document.fonts().len())
}

fn font_family_code(family: FontFamily) -> c_int {
    match family {
        FontFamily::DontCare => 0,
        FontFamily::Roman => 1,
        FontFamily::Swiss => 2,
        FontFamily::Modern => 3,
        FontFamily::Script => 4,
        FontFamily::Decorative => 5,
    }
}

/// `get_font_name(handle, index) → *const c_char`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_font_name(handle: *const RtfDocument, index: usize) -> *const c_char {
    with_handle(handle, ptr::null(), |doc| {
        let Some(font) = doc.document.fonts().get(index) else { return ptr::null() };
        let mut cache = doc.font_name_cache.borrow_mut();
        if cache.len() <= index {
            cache.resize(index + 1, None);
        }
        if cache[index].is_none() {
            cache[index] = Some(CString::new(font.name.as_str()).unwrap_or_default());
        }
        cache[index].as_ref().unwrap().as_ptr()
    })
}

/// `get_font_family(handle, index)`: 0=nil, 1=roman, 2=swiss, 3=modern,
/// 4=script, 5=decorative. Out-of-range returns 0.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_font_family(handle: *const RtfDocument, index: usize) -> c_int {
    with_handle(handle, 0, |doc| doc.document.fonts().get(index).map_or(0, |f| font_family_code(f.family)))
}

/// `get_color_count(handle)`.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_color_count(handle: *const RtfDocument) -> usize {
    with_handle(handle, 0, |doc| doc.document.colors().len())
}

/// `get_color_rgb(handle, index)`: packed `0x00RRGGBB`. Out-of-range
/// returns 0.
///
/// # Safety
/// `handle` must be `NULL` or a live pointer from a `parse_*` function.
#[no_mangle]
pub unsafe extern "C" fn rtf_reader_get_color_rgb(handle: *const RtfDocument, index: usize) -> u32 {
    with_handle(handle, 0, |doc| {
        doc.document
            .colors()
            .get(index)
            .map_or(0, |c| (u32::from(c.red) << 16) | (u32::from(c.green) << 8) | u32::from(c.blue))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_accessors_are_safe_and_zeroed() {
        unsafe {
            assert_eq!(rtf_reader_get_text(ptr::null()), ptr::null());
            assert_eq!(rtf_reader_get_text_length(ptr::null()), 0);
            assert_eq!(rtf_reader_get_run_count(ptr::null()), 0);
            assert_eq!(rtf_reader_get_image_count(ptr::null()), 0);
        }
        let msg = unsafe { CStr::from_ptr(rtf_reader_errmsg()) };
        assert_eq!(msg.to_str().unwrap(), "Null document");
    }

    #[test]
    fn free_of_null_is_a_no_op() {
        unsafe { rtf_reader_free(ptr::null_mut()) };
    }

    #[test]
    fn parse_roundtrips_through_the_c_abi() {
        let input = b"{\\rtf1 Hello}";
        let handle = unsafe { rtf_reader_parse(input.as_ptr(), input.len()) };
        assert!(!handle.is_null());
        unsafe {
            let text = CStr::from_ptr(rtf_reader_get_text(handle));
            assert_eq!(text.to_str().unwrap(), "Hello");
            assert_eq!(rtf_reader_get_run_count(handle), 1);
            rtf_reader_free(handle);
        }
    }

    #[test]
    fn invalid_input_sets_errmsg_and_returns_null() {
        let handle = unsafe { rtf_reader_parse(ptr::null(), 0) };
        assert!(handle.is_null());
        let msg = unsafe { CStr::from_ptr(rtf_reader_errmsg()) };
        assert!(!msg.to_str().unwrap().is_empty());
    }
}
