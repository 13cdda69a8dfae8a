//! Parser state: the formatting pair plus everything else that is scoped by
//! `{`/`}` group nesting.

use crate::format::{CharacterSet, FormatState};

/// Which destination kind, if any, is currently open. Tracked so text
/// emitted while e.g. `in_field_instruction` is true never reaches the
/// builder's plain-text path even if a nested group forgets to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DestinationFlags {
    pub in_header: bool,
    pub in_footer: bool,
    pub in_footnote: bool,
    pub in_pict: bool,
    pub in_field_instruction: bool,
    pub in_field_result: bool,
}

/// Everything a `{` snapshots and a `}` restores.
///
/// `character_set` and `code_page` are themselves document-wide in real RTF
/// (`\ansi`/`\ansicpg` normally appear only in the outermost group) but the
/// spec models them as part of `ParserState` so a pathological document that
/// changes charset mid-stream round-trips through group scoping like
/// everything else, rather than needing special-cased global mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserState {
    pub format: FormatState,
    pub character_set: CharacterSet,
    pub code_page: u32,
    /// `\ucN`: number of following `\uN` replacement bytes/chars to skip.
    pub unicode_skip_count: i32,
    pub destinations: DestinationFlags,
    /// `true` once this group (or an ancestor) has been marked for full
    /// text-extraction skip by `\*` over an unrecognized destination.
    pub skip_group: bool,
}

impl Default for ParserState {
    fn default() -> Self {
        ParserState {
            format: FormatState::default(),
            character_set: CharacterSet::default(),
            code_page: 1252,
            unicode_skip_count: 1,
            destinations: DestinationFlags::default(),
            skip_group: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_unicode_skip_count_is_one() {
        assert_eq!(ParserState::default().unicode_skip_count, 1);
    }

    #[test]
    fn snapshot_is_a_plain_copy() {
        let mut a = ParserState::default();
        a.format.char_format.bold = true;
        let b = a;
        assert_eq!(a, b);
    }
}
