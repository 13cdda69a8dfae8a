//! End-to-end scenarios exercising the public `parse_*` entry points against
//! literal RTF inputs, independent of any single module's internals.

#[test]
fn plain_text_round_trips_a_simple_document() {
    let doc = rtf_reader::parse_bytes(br"{\rtf1 Hello World!}").unwrap();
    assert_eq!(doc.plain_text(), "Hello World!");
    let runs = doc.text_runs();
    assert_eq!(runs.len(), 1);
    assert!(!runs[0].char_format.bold);
}

#[test]
fn bold_and_italic_toggles_produce_distinct_runs() {
    let doc = rtf_reader::parse_bytes(br"{\rtf1 Hello \b bold\b0  and \i italic\i0  text!}").unwrap();
    assert_eq!(doc.plain_text(), "Hello bold and italic text!");
    let runs = doc.text_runs();
    assert!(runs.len() >= 3);
    assert!(runs.iter().any(|r| r.char_format.bold));
    assert!(runs.iter().any(|r| r.char_format.italic));
}

#[test]
fn par_control_word_renders_as_blank_line() {
    let doc = rtf_reader::parse_bytes(br"{\rtf1 First\par Second}").unwrap();
    assert_eq!(doc.plain_text(), "First\n\nSecond");
}

#[test]
fn font_and_color_tables_are_captured_and_referenced() {
    let input = br"{\rtf1\ansi\deff0 {\fonttbl{\f0\fswiss Arial;}{\f1\froman Times;}}{\colortbl;\red255\green0\blue0;} Hi}";
    let doc = rtf_reader::parse_bytes(input).unwrap();
    assert_eq!(doc.plain_text(), "Hi");

    let arial = doc.font(0).unwrap();
    assert_eq!(arial.name, "Arial");
    assert_eq!(arial.family, rtf_reader::FontFamily::Swiss);
    assert_eq!(doc.font(1).unwrap().name, "Times");

    let red = doc.color(1).unwrap();
    assert_eq!((red.red, red.green, red.blue), (255, 0, 0));
    assert!(doc.color(0).is_some(), "auto color is always present");
}

#[test]
fn unicode_escape_with_ascii_fallback_decodes_to_the_scalar() {
    let doc = rtf_reader::parse_bytes("{\\rtf1 A\\u8364?B}".as_bytes()).unwrap();
    assert_eq!(doc.plain_text(), "A\u{20AC}B");
}

#[test]
fn ignorable_bin_destination_is_skipped_without_disturbing_surrounding_text() {
    let doc = rtf_reader::parse_bytes(br"{\rtf1 Before{\*\bin5 XXXXX} After}").unwrap();
    let text = doc.plain_text();
    assert!(text.contains("Before"));
    assert!(text.contains(" After"));
    assert!(!text.contains("XXXXX"));
}

#[test]
fn table_rows_and_cells_are_structured_and_flattened() {
    let input = br"{\rtf1
{\trowd \cellx1000\cellx2000\cellx3000
\intbl H1\cell H2\cell H3\cell\row}
{\trowd \cellx1000\cellx2000\cellx3000
\intbl D1\cell D2\cell D3\cell\row}
}";
    let doc = rtf_reader::parse_bytes(input).unwrap();
    let text = doc.plain_text();
    assert!(text.contains("H1\tH2\tH3"));
    assert!(text.contains("D1\tD2\tD3"));
    assert!(text.find("H1\tH2\tH3").unwrap() < text.find("D1\tD2\tD3").unwrap());

    let table = doc.table(0).unwrap();
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.cell_count(0), 3);
}

#[test]
fn empty_input_is_invalid_with_no_document_produced() {
    let err = rtf_reader::parse_bytes(b"").unwrap_err();
    assert!(matches!(err, rtf_reader::RtfError::Semantic { .. }));
}

#[test]
fn input_missing_the_rtf_header_is_invalid() {
    let err = rtf_reader::parse_bytes(b"{not rtf}").unwrap_err();
    assert!(matches!(err, rtf_reader::RtfError::Semantic { .. }));
}

#[test]
fn minimal_document_has_empty_text_and_no_tables() {
    let doc = rtf_reader::parse_bytes(br"{\rtf1}").unwrap();
    assert_eq!(doc.plain_text(), "");
    assert_eq!(doc.text_runs().len(), 0);
    assert_eq!(doc.fonts().len(), 0);
    assert_eq!(doc.colors().len(), 0);
}

#[test]
fn parse_bytes_and_parse_reader_agree_on_a_nontrivial_document() {
    let input: &[u8] = br"{\rtf1\ansi {\fonttbl{\f0\fswiss Arial;}} Hello \b World\b0 !\par Second paragraph.}";
    let from_bytes = rtf_reader::parse_bytes(input).unwrap();
    let from_reader = rtf_reader::parse_reader(std::io::Cursor::new(input.to_vec())).unwrap();
    assert_eq!(from_bytes.plain_text(), from_reader.plain_text());
    assert_eq!(from_bytes.text_runs().len(), from_reader.text_runs().len());
}

#[test]
fn hyperlink_field_wraps_its_display_runs() {
    let input = br#"{\rtf1 {\field{\*\fldinst HYPERLINK "https://example.com"}{\fldrslt Example}} after}"#;
    let doc = rtf_reader::parse_bytes(input).unwrap();
    assert_eq!(doc.plain_text(), "Example after");
    let hyperlink_present = doc
        .content()
        .iter()
        .any(|e| matches!(e, rtf_reader::ContentElement::Hyperlink(link) if link.url == "https://example.com"));
    assert!(hyperlink_present);
}

#[test]
fn nested_groups_restore_formatting_on_group_end() {
    let doc = rtf_reader::parse_bytes(br"{\rtf1 plain {\b bold} plain again}").unwrap();
    let runs = doc.text_runs();
    assert!(runs.iter().any(|r| r.char_format.bold));
    assert!(runs.last().is_some_and(|r| !r.char_format.bold));
}

#[test]
fn deeply_nested_groups_at_the_default_limit_still_parse() {
    let mut input = String::from(r"{\rtf1 ");
    for _ in 0..90 {
        input.push('{');
    }
    input.push_str("deep");
    for _ in 0..90 {
        input.push('}');
    }
    input.push('}');
    let doc = rtf_reader::parse_bytes(input.as_bytes()).unwrap();
    assert!(doc.plain_text().contains("deep"));
}
