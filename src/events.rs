//! The event interface the parser drives as it walks the token stream.
//!
//! Modeled as a struct of boxed closures rather than a trait so that both
//! the in-process [`crate::builder::DocumentBuilder`] and the C ABI shim
//! (which has to bridge to a caller-supplied function pointer plus opaque
//! user-data pointer) implement it the same way, with no vtable games on
//! the FFI side.

use crate::document::{FontFamily, ImageFormat};
use crate::format::{CharFormat, ParaFormat};

/// Callbacks invoked by the parser as it consumes tokens. Every field has a
/// default no-op so a consumer only interested in plain text can build one
/// with `..Sink::default()`.
pub struct Sink<'a> {
    pub on_group_start: Box<dyn FnMut() + 'a>,
    pub on_group_end: Box<dyn FnMut() + 'a>,
    pub on_text: Box<dyn FnMut(&str, &CharFormat, &ParaFormat) + 'a>,
    /// A single decoded Unicode scalar value, used for `\u` and `\'HH`
    /// escapes that don't coalesce into a surrounding text run.
    pub on_character: Box<dyn FnMut(char, &CharFormat, &ParaFormat) + 'a>,
    pub on_binary: Box<dyn FnMut(&[u8]) + 'a>,
    /// One completed `\fonttbl` entry.
    pub on_font_table_entry: Box<dyn FnMut(u16, String, FontFamily, u8) + 'a>,
    /// One completed `\colortbl` entry, in table order (its index is the id
    /// other control words reference via `\cfN`/`\cbN`).
    pub on_color_table_entry: Box<dyn FnMut(u16, u8, u8, u8) + 'a>,
    /// The full raw text of a `\fldinst` destination, once its group closes.
    pub on_field_instruction: Box<dyn FnMut(&str) + 'a>,
    pub on_field_result_start: Box<dyn FnMut() + 'a>,
    pub on_field_result_end: Box<dyn FnMut() + 'a>,
    /// `\trowd`: a new table row is starting.
    pub on_table_row_start: Box<dyn FnMut() + 'a>,
    /// One `\cellxN`: the cumulative right boundary, in twips, of the next
    /// undeclared cell in the row.
    pub on_table_cell_boundary: Box<dyn FnMut(i32) + 'a>,
    /// `\cell`: the cell whose content was just emitted is complete.
    pub on_table_cell_end: Box<dyn FnMut() + 'a>,
    /// `\row`: the row whose cells were just emitted is complete.
    pub on_table_row_end: Box<dyn FnMut() + 'a>,
    /// A `\pict` destination's image, once its group closes.
    pub on_image: Box<dyn FnMut(ImageFormat, i32, i32, bool, &[u8]) + 'a>,
    /// Non-fatal recovery notice; `on_error` never stops the parse.
    pub on_error: Box<dyn FnMut(&crate::error::RtfError) + 'a>,
}

impl<'a> Default for Sink<'a> {
    fn default() -> Self {
        Sink {
            on_group_start: Box::new(|| {}),
            on_group_end: Box::new(|| {}),
            on_text: Box::new(|_, _, _| {}),
            on_character: Box::new(|_, _, _| {}),
            on_binary: Box::new(|_| {}),
            on_font_table_entry: Box::new(|_, _, _, _| {}),
            on_color_table_entry: Box::new(|_, _, _, _| {}),
            on_field_instruction: Box::new(|_| {}),
            on_field_result_start: Box::new(|| {}),
            on_field_result_end: Box::new(|| {}),
            on_table_row_start: Box::new(|| {}),
            on_table_cell_boundary: Box::new(|_| {}),
            on_table_cell_end: Box::new(|| {}),
            on_table_row_end: Box::new(|| {}),
            on_image: Box::new(|_, _, _, _, _| {}),
            on_error: Box::new(|_| {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn default_sink_is_inert() {
        let mut sink = Sink::default();
        (sink.on_group_start)();
        (sink.on_text)("x", &CharFormat::default(), &ParaFormat::default());
    }

    #[test]
    fn captures_via_closures() {
        let seen = Rc::new(RefCell::new(String::new()));
        let seen2 = seen.clone();
        let mut sink = Sink { on_text: Box::new(move |t, _, _| seen2.borrow_mut().push_str(t)), ..Sink::default() };
        (sink.on_text)("hello", &CharFormat::default(), &ParaFormat::default());
        assert_eq!(*seen.borrow(), "hello");
    }
}
