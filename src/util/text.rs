use std::borrow::Cow;

use scraper::{Html, Node};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Width of `s` in terminal columns.
///
/// ```
/// use scrollfeed::util::display_width;
///
/// assert_eq!(display_width("Markets"), 7);
/// assert_eq!(display_width("日本"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max_width` columns, appending "..." when cut.
///
/// Widths of three columns or fewer have no room for the ellipsis and just
/// keep whatever characters fit. Returns borrowed when nothing is cut.
///
/// ```
/// use scrollfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Stocks rally", 20), "Stocks rally");
/// assert_eq!(truncate_to_width("Stocks rally", 9), "Stocks...");
/// assert_eq!(truncate_to_width("Stocks", 2), "St");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    if max_width <= ELLIPSIS_WIDTH {
        let end = prefix_end(s, max_width);
        return if end == s.len() {
            Cow::Borrowed(s)
        } else {
            Cow::Owned(s[..end].to_owned())
        };
    }

    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let cut = prefix_end(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
}

/// Byte offset of the longest prefix of `s` that fits in `width` columns.
fn prefix_end(s: &str, width: usize) -> usize {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            return idx;
        }
        used += w;
    }
    s.len()
}

/// Greedy word wrap to `width` columns, capped at `max_lines`.
///
/// The last kept line is truncated with an ellipsis when text remains.
/// Words wider than a whole line are hard-cut.
pub fn wrap_to_width(s: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    if width == 0 || max_lines == 0 {
        return lines;
    }

    let mut current = String::new();
    let mut overflow = false;

    for word in s.split_whitespace() {
        let candidate_width = if current.is_empty() {
            display_width(word)
        } else {
            display_width(&current) + 1 + display_width(word)
        };

        if candidate_width <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            if lines.len() == max_lines {
                overflow = true;
                break;
            }
        }

        let mut rest = word;
        while display_width(rest) > width {
            let end = prefix_end(rest, width).max(rest.chars().next().map_or(0, char::len_utf8));
            lines.push(rest[..end].to_owned());
            rest = &rest[end..];
            if lines.len() == max_lines {
                overflow = true;
                break;
            }
        }
        if overflow {
            break;
        }
        current.push_str(rest);
    }

    if !overflow && !current.is_empty() {
        if lines.len() == max_lines {
            overflow = true;
        } else {
            lines.push(current);
        }
    }

    if overflow {
        if let Some(last) = lines.last_mut() {
            let room = width.saturating_sub(ELLIPSIS_WIDTH);
            let end = prefix_end(last, room);
            last.truncate(end);
            last.push_str(ELLIPSIS);
        }
    }

    lines
}

/// Elements that separate words when rendered.
const BREAKING_TAGS: &[&str] = &[
    "br", "p", "div", "li", "ul", "ol", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "img", "hr",
];

/// Reduce an HTML fragment (feed descriptions) to plain text.
///
/// Parses with an HTML5 parser, keeps the text nodes, and collapses
/// whitespace runs. Block-level elements become word breaks.
pub fn strip_html(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '&']) && !s.contains("  ") && !s.contains(['\n', '\t', '\r']) {
        return Cow::Borrowed(s.trim());
    }

    let fragment = Html::parse_fragment(s);
    let mut text = String::with_capacity(s.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(e) if BREAKING_TAGS.contains(&e.name()) => text.push(' '),
            _ => {}
        }
    }

    Cow::Owned(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn is_stripped_control(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Remove C0 controls, DEL and ANSI CSI/OSC sequences from upstream text.
///
/// Tab, newline and carriage return are kept. Borrowed when already clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().copied().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    i += 2;
                    while i < len {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    i += 2;
                    while i < len {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_stripped_control(b) {
            i += 1;
        } else {
            let start = i;
            while i < len && !is_stripped_control(bytes[i]) {
                i += 1;
            }
            // Only ASCII bytes end a run, so the slice is on a char boundary.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}
