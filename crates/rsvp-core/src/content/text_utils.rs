/// Separators that split tokens besides whitespace: hyphen, en dash, figure dash, em dash,
/// and horizontal bar.
const DASH_SEPARATORS: [char; 5] = ['-', '\u{2013}', '\u{2012}', '\u{2014}', '\u{2015}'];

pub(crate) fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || DASH_SEPARATORS.contains(&ch)
}

pub(super) fn next_word_at(text: &str, mut cursor: usize) -> Option<(&str, usize)> {
    let len = text.len();

    while cursor < len {
        let ch = text[cursor..].chars().next()?;
        if !is_separator(ch) {
            break;
        }
        cursor += ch.len_utf8();
    }
    if cursor >= len {
        return None;
    }

    let start = cursor;
    while cursor < len {
        let ch = text[cursor..].chars().next()?;
        if is_separator(ch) {
            break;
        }
        cursor += ch.len_utf8();
    }

    Some((&text[start..cursor], cursor))
}

pub(super) fn count_words(text: &str) -> usize {
    let mut count = 0usize;
    let mut cursor = 0usize;

    while let Some((_, next_cursor)) = next_word_at(text, cursor) {
        count += 1;
        cursor = next_cursor;
    }

    count
}
