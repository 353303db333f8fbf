//! Syntax highlighter for the Fortran mask editor.
//!
//! Fortran is case-insensitive, so keywords and intrinsics are matched on the
//! lowercased word while the original spelling is kept in the output.

use eframe::egui::{self, Color32};
use eframe::epaint::text::{LayoutJob, TextFormat};

const KEYWORDS: &[&str] = &[
    "subroutine",
    "function",
    "end",
    "endif",
    "enddo",
    "if",
    "then",
    "else",
    "elseif",
    "do",
    "while",
    "select",
    "case",
    "default",
    "call",
    "return",
    "exit",
    "cycle",
    "stop",
    "module",
    "contains",
    "use",
    "implicit",
    "none",
    "intent",
    "in",
    "out",
    "inout",
    "parameter",
    "dimension",
    "integer",
    "real",
    "double",
    "precision",
    "complex",
    "logical",
    "character",
    "type",
    "pure",
    "elemental",
    "recursive",
    "result",
    "allocatable",
    "allocate",
    "deallocate",
    "save",
    "data",
    "where",
    "go",
    "goto",
    "continue",
];

const INTRINSICS: &[&str] = &[
    "abs", "sqrt", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "exp", "log", "log10",
    "mod", "modulo", "min", "max", "floor", "ceiling", "nint", "int", "dble", "real", "cmplx",
    "aimag", "conjg", "sign", "size", "sum", "product", "maxval", "minval", "reshape", "present",
];

/// Highlights Fortran code with syntax coloring.
///
/// # Arguments
///
/// * `text` - The Fortran source code to highlight
/// * `font_id` - The font to use for rendering
/// * `dark_mode` - Picks the palette for dark or light visuals
///
/// # Returns
///
/// A `LayoutJob` containing the highlighted text with appropriate colors
pub fn highlight_fortran(text: &str, font_id: egui::FontId, dark_mode: bool) -> LayoutJob {
    let mut job = LayoutJob::default();

    let (keyword_color, string_color, comment_color, number_color, intrinsic_color, default_color) =
        if dark_mode {
            (
                Color32::from_rgb(86, 156, 214),  // Blue
                Color32::from_rgb(206, 145, 120), // Orange
                Color32::from_rgb(106, 153, 85),  // Green
                Color32::from_rgb(181, 206, 168), // Light green
                Color32::from_rgb(220, 220, 170), // Yellow
                Color32::from_rgb(212, 212, 212), // Light gray (default)
            )
        } else {
            (
                Color32::from_rgb(0, 0, 170),
                Color32::from_rgb(163, 21, 21),
                Color32::from_rgb(0, 128, 0),
                Color32::from_rgb(100, 0, 150),
                Color32::from_rgb(0, 102, 153),
                Color32::BLACK,
            )
        };

    let format = |color| TextFormat::simple(font_id.clone(), color);
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        // `!` comments run to the end of the line
        if c == '!' {
            while let Some(&(_, ch)) = chars.peek() {
                if ch == '\n' {
                    break;
                }
                chars.next();
            }
            let end = chars.peek().map(|&(idx, _)| idx).unwrap_or(text.len());
            job.append(&text[i..end], 0.0, format(comment_color));
            continue;
        }

        // Strings; a doubled quote is an escaped quote
        if c == '"' || c == '\'' {
            while let Some((_, ch)) = chars.next() {
                if ch == c {
                    if matches!(chars.peek(), Some(&(_, next)) if next == c) {
                        chars.next();
                        continue;
                    }
                    break;
                }
                if ch == '\n' {
                    break;
                }
            }
            let end = chars.peek().map(|&(idx, _)| idx).unwrap_or(text.len());
            job.append(&text[i..end], 0.0, format(string_color));
            continue;
        }

        // Numbers such as 1, 2.5, 1.0D-3, 3e8 and 1_8
        if c.is_ascii_digit()
            || (c == '.' && matches!(chars.peek(), Some(&(_, d)) if d.is_ascii_digit()))
        {
            let mut prev = c;
            while let Some(&(idx, ch)) = chars.peek() {
                let exponent_sign =
                    (ch == '+' || ch == '-') && matches!(prev, 'd' | 'D' | 'e' | 'E');
                if ch.is_ascii_digit()
                    || ch == '.' && dot_operator_len(&text[idx..]).is_none()
                    || matches!(ch, 'd' | 'D' | 'e' | 'E' | '_')
                    || exponent_sign
                {
                    prev = ch;
                    chars.next();
                } else {
                    break;
                }
            }
            let end = chars.peek().map(|&(idx, _)| idx).unwrap_or(text.len());
            job.append(&text[i..end], 0.0, format(number_color));
            continue;
        }

        // Dot operators and logical constants: .and. .or. .not. .true. .eq. ...
        if c == '.' {
            if let Some(len) = dot_operator_len(&text[i..]) {
                for _ in 1..len {
                    chars.next();
                }
                job.append(&text[i..i + len], 0.0, format(keyword_color));
                continue;
            }
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while let Some(&(_, ch)) = chars.peek() {
                if ch.is_ascii_alphanumeric() || ch == '_' {
                    chars.next();
                } else {
                    break;
                }
            }
            let end = chars.peek().map(|&(idx, _)| idx).unwrap_or(text.len());
            let word = &text[i..end];
            let lower = word.to_ascii_lowercase();
            let called = text[end..].trim_start_matches([' ', '\t']).starts_with('(');

            let color = if INTRINSICS.contains(&lower.as_str()) && called {
                intrinsic_color
            } else if KEYWORDS.contains(&lower.as_str()) {
                keyword_color
            } else {
                default_color
            };
            job.append(word, 0.0, format(color));
            continue;
        }

        job.append(&text[i..i + c.len_utf8()], 0.0, format(default_color));
    }

    job
}

/// Length in bytes of a dot operator starting at the beginning of `text`.
fn dot_operator_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix('.')?;
    let word_len = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    if word_len == 0 || !rest[word_len..].starts_with('.') {
        return None;
    }
    const OPERATORS: &[&str] = &[
        "and", "or", "not", "eqv", "neqv", "true", "false", "eq", "ne", "lt", "le", "gt", "ge",
    ];
    let word = rest[..word_len].to_ascii_lowercase();
    OPERATORS
        .contains(&word.as_str())
        .then_some(word_len + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored_words(text: &str, dark_mode: bool) -> Vec<(String, Color32)> {
        let job = highlight_fortran(text, egui::FontId::monospace(12.0), dark_mode);
        job.sections
            .iter()
            .map(|s| (job.text[s.byte_range.clone()].to_string(), s.format.color))
            .filter(|(t, _)| !t.trim().is_empty())
            .collect()
    }

    fn color_of(text: &str, word: &str) -> Color32 {
        colored_words(text, true)
            .into_iter()
            .find(|(t, _)| t == word)
            .map(|(_, c)| c)
            .unwrap_or_else(|| panic!("{word} not found in {text}"))
    }

    #[test]
    fn test_text_is_preserved() {
        let source = "IF (x .GT. 1.5D0) THEN ! note\n  y = 'it''s'\nEND IF\n";
        let job = highlight_fortran(source, egui::FontId::monospace(12.0), true);
        assert_eq!(job.text, source);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let source = "IF (a) then\nEnd If";
        let keyword = color_of(source, "IF");
        assert_eq!(color_of(source, "then"), keyword);
        assert_eq!(color_of(source, "End"), keyword);
        assert_ne!(color_of(source, "a"), keyword);
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        let source = "x = 1 ! if then else\ny = 2";
        let words = colored_words(source, true);
        assert!(words.iter().any(|(t, _)| t == "! if then else"));
        assert!(words.iter().any(|(t, _)| t == "y"));
    }

    #[test]
    fn test_fortran_double_literal_is_one_number() {
        let words = colored_words("r = 5.0D-1", true);
        assert!(words.iter().any(|(t, _)| t == "5.0D-1"));
    }

    #[test]
    fn test_number_followed_by_dot_operator() {
        let source = "if (x > 1.and.y) z = 0";
        let words = colored_words(source, true);
        assert!(words.iter().any(|(t, _)| t == "1"));
        assert!(words.iter().any(|(t, _)| t == ".and."));
    }

    #[test]
    fn test_intrinsic_only_when_called() {
        let source = "y = abs(x) + abs";
        let words = colored_words(source, true);
        let colors: Vec<_> = words.iter().filter(|(t, _)| t == "abs").map(|(_, c)| *c).collect();
        assert_eq!(colors.len(), 2);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_light_mode_uses_black_default() {
        assert!(colored_words("foo", false).contains(&("foo".to_string(), Color32::BLACK)));
    }
}
