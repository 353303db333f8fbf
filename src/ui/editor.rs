//! Keyboard helpers for the Fortran code editor.
//!
//! egui's multiline `TextEdit` has no notion of indentation. These helpers add
//! Tab/Shift+Tab block indentation, smart indentation on Enter and a whole-buffer
//! reindent that understands Fortran block structure.

use eframe::egui;
use eframe::egui::text::{CCursor, CCursorRange};

/// Options for [`handle_code_textedit_keys`].
#[derive(Clone, Debug)]
pub struct CodeEditOptions<'a> {
    /// Indent unit to insert (e.g., "    " or "\t")
    pub indent: &'a str,
}

impl Default for CodeEditOptions<'_> {
    fn default() -> Self {
        Self { indent: "    " }
    }
}

/// How a line affects the indentation of itself and the lines after it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockRole {
    /// Starts a block: following lines are indented
    Open,
    /// Splits a block (`else`, `case`, `contains`): dedented itself, following lines indented
    Middle,
    /// Ends a block: dedented itself
    Close,
    /// Any other statement
    Plain,
}

/// Classifies a line of free-form Fortran.
pub fn block_role(line: &str) -> BlockRole {
    let code = strip_comment(line).trim().to_ascii_lowercase();
    let code = strip_construct_label(&code);
    let words: Vec<&str> = code
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();
    let Some(&first) = words.first() else {
        return BlockRole::Plain;
    };
    let second = words.get(1).copied();

    if first.starts_with("end") && is_end_keyword(first) {
        return BlockRole::Close;
    }
    match (first, second) {
        ("else", _) | ("elseif", _) | ("case", _) | ("contains", None) => {
            return BlockRole::Middle
        }
        ("type" | "class", Some("is")) | ("class", Some("default")) => return BlockRole::Middle,
        _ => {}
    }

    let opens = match first {
        "if" => code.ends_with("then"),
        "do" | "select" | "interface" | "program" | "block" | "associate" | "where"
            if first != "where" || !code.contains(')') || code.ends_with(')') =>
        {
            true
        }
        "abstract" => second == Some("interface"),
        "module" => second.is_some() && second != Some("procedure"),
        "type" => {
            let rest = code["type".len()..].trim_start();
            !rest.starts_with('(') && !rest.is_empty()
        }
        _ => words.contains(&"subroutine") || words.contains(&"function"),
    };
    if opens {
        BlockRole::Open
    } else {
        BlockRole::Plain
    }
}

fn is_end_keyword(word: &str) -> bool {
    matches!(
        word,
        "end"
            | "endif"
            | "enddo"
            | "endselect"
            | "endsubroutine"
            | "endfunction"
            | "endmodule"
            | "endprogram"
            | "endinterface"
            | "endtype"
            | "endwhere"
            | "endblock"
            | "endassociate"
    )
}

/// Drops a trailing `!` comment that is not inside a string.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (idx, ch) in line.char_indices() {
        match (quote, ch) {
            (None, '!') => return &line[..idx],
            (None, '"' | '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    line
}

/// Drops a construct name such as `outer:` in `outer: do i = 1, n`.
fn strip_construct_label(code: &str) -> &str {
    match code.find(':') {
        Some(pos)
            if !code[pos..].starts_with("::")
                && code[..pos]
                    .trim()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !code[..pos].trim().is_empty() =>
        {
            code[pos + 1..].trim_start()
        }
        _ => code,
    }
}

/// Reindents Fortran source by block structure and removes trailing whitespace.
///
/// Blank lines are kept empty. Lines inside unterminated blocks stay indented.
pub fn reindent_fortran(src: &str, indent: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut level: usize = 0;

    for raw_line in src.lines() {
        let trimmed = raw_line.trim();
        let role = block_role(trimmed);
        let line_level = match role {
            BlockRole::Close | BlockRole::Middle => level.saturating_sub(1),
            BlockRole::Open | BlockRole::Plain => level,
        };
        if !trimmed.is_empty() {
            out.push_str(&indent.repeat(line_level));
            out.push_str(trimmed);
        }
        out.push('\n');

        level = match role {
            BlockRole::Open => level + 1,
            BlockRole::Middle => line_level + 1,
            BlockRole::Close => line_level,
            BlockRole::Plain => level,
        };
    }

    if !src.ends_with('\n') && out.ends_with('\n') {
        out.pop();
    }
    out
}

/// Applies Tab, Shift+Tab and Enter handling to a focused code editor.
///
/// Returns true if the text was modified.
pub fn handle_code_textedit_keys(
    ui: &mut egui::Ui,
    response: &egui::Response,
    text: &mut String,
    options: &CodeEditOptions,
) -> bool {
    if !response.has_focus() {
        return false;
    }

    let id = response.id;
    let (tab, shift, enter) = ui.input(|i| {
        (
            i.key_pressed(egui::Key::Tab),
            i.modifiers.shift,
            i.key_pressed(egui::Key::Enter),
        )
    });
    let (mut start, mut end) = selection(ui, id).unwrap_or_else(|| {
        let len = text.chars().count();
        (len, len)
    });
    let mut changed = false;

    if tab {
        // egui replaces a selection with a literal tab before we see the key;
        // undo that from last frame's snapshot so the block can be indented.
        let restored = match snapshot(ui, id) {
            Some(prev) if prev.start < prev.end && start == end && *text != prev.text => {
                *text = prev.text;
                start = prev.start;
                end = prev.end;
                true
            }
            _ => false,
        };
        if !restored {
            changed |= remove_inserted_tab(text, &mut start, &mut end);
        }

        if shift {
            changed |= shift_lines(text, options.indent, &mut start, &mut end, false);
        } else if start == end {
            let byte = char_to_byte_idx(text, start);
            text.insert_str(byte, options.indent);
            start += options.indent.chars().count();
            end = start;
            changed = true;
        } else {
            changed |= shift_lines(text, options.indent, &mut start, &mut end, true);
        }
        changed |= restored;
        set_selection(ui, id, start, end);
    }

    if enter {
        let caret = start;
        let caret_byte = char_to_byte_idx(text, caret);
        // egui usually inserted the newline already
        let newline_inserted = caret_byte > 0 && text[..caret_byte].ends_with('\n');
        let previous_end = if newline_inserted { caret_byte - 1 } else { caret_byte };
        let previous_start = find_line_start_byte(text, previous_end);
        let previous = &text[previous_start..previous_end];

        let mut insert: String = previous
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        if matches!(block_role(previous), BlockRole::Open | BlockRole::Middle) {
            insert.push_str(options.indent);
        }
        if !newline_inserted {
            insert.insert(0, '\n');
        }
        text.insert_str(caret_byte, &insert);
        start = caret + insert.chars().count();
        end = start;
        set_selection(ui, id, start, end);
        changed = true;
    }

    let (final_start, final_end) = selection(ui, id).unwrap_or((start, end));
    store_snapshot(ui, id, text, final_start, final_end);
    changed
}

// --- helpers ---

#[derive(Clone, Debug)]
struct EditSnapshot {
    text: String,
    start: usize,
    end: usize,
}

fn snapshot(ui: &egui::Ui, id: egui::Id) -> Option<EditSnapshot> {
    ui.memory(|mem| mem.data.get_temp::<EditSnapshot>(id))
}

fn store_snapshot(ui: &mut egui::Ui, id: egui::Id, text: &str, start: usize, end: usize) {
    ui.memory_mut(|mem| {
        mem.data.insert_temp(
            id,
            EditSnapshot {
                text: text.to_owned(),
                start,
                end,
            },
        );
    });
}

/// Selection as ordered char indices.
fn selection(ui: &egui::Ui, id: egui::Id) -> Option<(usize, usize)> {
    ui.memory(|mem| {
        mem.data
            .get_temp::<egui::text_edit::TextEditState>(id)
            .and_then(|s| s.cursor.char_range())
            .map(|r| {
                let (a, b) = (r.primary.index, r.secondary.index);
                (a.min(b), a.max(b))
            })
    })
}

fn set_selection(ui: &mut egui::Ui, id: egui::Id, start: usize, end: usize) {
    ui.memory_mut(|mem| {
        let state = mem
            .data
            .get_temp_mut_or_default::<egui::text_edit::TextEditState>(id);
        state
            .cursor
            .set_char_range(Some(CCursorRange::two(CCursor::new(start), CCursor::new(end))));
    });
}

/// Removes the `\t` egui typed just before the caret.
fn remove_inserted_tab(text: &mut String, start: &mut usize, end: &mut usize) -> bool {
    if *end == 0 {
        return false;
    }
    let byte = char_to_byte_idx(text, *end - 1);
    if !text[byte..].starts_with('\t') {
        return false;
    }
    text.replace_range(byte..byte + 1, "");
    *end -= 1;
    if *start > *end {
        *start = *end;
    }
    true
}

fn char_to_byte_idx(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

fn byte_to_char_idx(s: &str, byte_idx: usize) -> usize {
    s[..byte_idx].chars().count()
}

fn find_line_start_byte(s: &str, byte: usize) -> usize {
    s[..byte].rfind('\n').map(|pos| pos + 1).unwrap_or(0)
}

/// Byte offsets of the starts of every line touched by the selection.
///
/// A selection ending exactly at a line start does not include that line.
fn selected_line_starts(s: &str, start: usize, end: usize) -> Vec<usize> {
    let start_byte = char_to_byte_idx(s, start);
    let mut end_byte = char_to_byte_idx(s, end);
    if end > start && find_line_start_byte(s, end_byte) == end_byte {
        end_byte -= 1;
    }
    let first = find_line_start_byte(s, start_byte);
    let mut starts = vec![first];
    starts.extend(
        s[first..end_byte]
            .match_indices('\n')
            .map(|(off, _)| first + off + 1),
    );
    starts
}

/// Indents (or unindents) every selected line by one unit and widens the
/// selection to whole lines.
fn shift_lines(
    s: &mut String,
    indent: &str,
    start: &mut usize,
    end: &mut usize,
    indent_lines: bool,
) -> bool {
    let starts = selected_line_starts(s, *start, *end);
    let first = starts[0];
    let last_start = starts[starts.len() - 1];
    let last_end = s[last_start..]
        .find('\n')
        .map(|off| last_start + off)
        .unwrap_or(s.len());

    let mut shift: isize = 0;
    for &line_start in &starts {
        let at = (line_start as isize + shift) as usize;
        if indent_lines {
            s.insert_str(at, indent);
            shift += indent.len() as isize;
        } else {
            let removable = if s[at..].starts_with(indent) {
                indent.len()
            } else {
                s[at..]
                    .chars()
                    .take(indent.len())
                    .take_while(|c| *c == ' ')
                    .count()
            };
            s.drain(at..at + removable);
            shift -= removable as isize;
        }
    }

    if shift == 0 {
        return false;
    }
    *start = byte_to_char_idx(s, first);
    *end = byte_to_char_idx(s, (last_end as isize + shift) as usize);
    true
}

/// True when the platform uses Cmd instead of Ctrl for shortcuts.
pub fn is_macos_platform() -> bool {
    cfg!(target_os = "macos")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_roles() {
        assert_eq!(block_role("subroutine mask(is_in_lattice, x, y, z)"), BlockRole::Open);
        assert_eq!(block_role("IF (x > 0) THEN"), BlockRole::Open);
        assert_eq!(block_role("if (x > 0) y = 1"), BlockRole::Plain);
        assert_eq!(block_role("do i = 1, n"), BlockRole::Open);
        assert_eq!(block_role("outer: do while (k < 3)"), BlockRole::Open);
        assert_eq!(block_role("select case (k)"), BlockRole::Open);
        assert_eq!(block_role("pure real*8 function f(x)"), BlockRole::Open);
        assert_eq!(block_role("type point"), BlockRole::Open);
        assert_eq!(block_role("type(point) :: p"), BlockRole::Plain);
        assert_eq!(block_role("module procedure foo"), BlockRole::Plain);
        assert_eq!(block_role("else if (x < 0) then"), BlockRole::Middle);
        assert_eq!(block_role("case (1)"), BlockRole::Middle);
        assert_eq!(block_role("contains"), BlockRole::Middle);
        assert_eq!(block_role("end if"), BlockRole::Close);
        assert_eq!(block_role("ENDDO"), BlockRole::Close);
        assert_eq!(block_role("end subroutine"), BlockRole::Close);
        assert_eq!(block_role("endpoint = 3"), BlockRole::Plain);
        assert_eq!(block_role("x = 1 ! if (a) then"), BlockRole::Plain);
        assert_eq!(block_role("real*8, intent(in) :: x, y, z"), BlockRole::Plain);
    }

    #[test]
    fn test_reindent_mask() {
        let src = "subroutine mask(r, x, y, z)\nreal*8, intent(in) :: x, y, z   \n\
                   integer, intent(out) :: r\n\nif (x > 0) then\nr = 1\nelse\nr = 0\n\
                   end if\nend subroutine\n";
        let expected = "subroutine mask(r, x, y, z)\n    real*8, intent(in) :: x, y, z\n    \
                        integer, intent(out) :: r\n\n    if (x > 0) then\n        r = 1\n    \
                        else\n        r = 0\n    end if\nend subroutine\n";
        assert_eq!(reindent_fortran(src, "    "), expected);
    }

    #[test]
    fn test_reindent_nested_loops_and_select() {
        let src = "do i = 1, 2\ndo j = 1, 2\nselect case (j)\ncase (1)\nk = 1\ncase default\n\
                   k = 2\nend select\nenddo\nend do";
        let expected = "do i = 1, 2\n  do j = 1, 2\n    select case (j)\n    case (1)\n      \
                        k = 1\n    case default\n      k = 2\n    end select\n  enddo\nend do";
        assert_eq!(reindent_fortran(src, "  "), expected);
    }

    #[test]
    fn test_reindent_is_idempotent_and_tolerates_extra_ends() {
        let src = "end if\nx = 1\n";
        assert_eq!(reindent_fortran(src, "    "), src);
        let once = reindent_fortran("if (a) then\nb = 1\nend if\n", "\t");
        assert_eq!(reindent_fortran(&once, "\t"), once);
    }

    #[test]
    fn test_shift_lines_indent_and_unindent() {
        let mut text = "a\nb\nc".to_string();
        let (mut start, mut end) = (0, 3);
        assert!(shift_lines(&mut text, "  ", &mut start, &mut end, true));
        assert_eq!(text, "  a\n  b\nc");
        assert_eq!((start, end), (0, 7));

        assert!(shift_lines(&mut text, "  ", &mut start, &mut end, false));
        assert_eq!(text, "a\nb\nc");
        assert!(!shift_lines(&mut text, "  ", &mut start, &mut end, false));
    }

    #[test]
    fn test_selection_ending_at_line_start_excludes_that_line() {
        let text = "one\ntwo\nthree";
        assert_eq!(selected_line_starts(text, 0, 4), vec![0]);
        assert_eq!(selected_line_starts(text, 1, 5), vec![0, 4]);
        assert_eq!(selected_line_starts(text, 5, 5), vec![4]);
    }

    #[test]
    fn test_strip_comment_respects_strings() {
        assert_eq!(strip_comment("x = 1 ! note"), "x = 1 ");
        assert_eq!(strip_comment("s = 'hi!' ! c"), "s = 'hi!' ");
    }
}
