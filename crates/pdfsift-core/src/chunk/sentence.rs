//! Dependency-free sentence splitting

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text after runs of `.`, `!` or `?` that are followed by whitespace or
/// the end of the text. Terminators are dropped; sentences are trimmed and
/// empty ones discarded.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (idx, c) = chars[i];
        if !is_terminal(c) {
            i += 1;
            continue;
        }

        let mut end = i;
        while end < chars.len() && is_terminal(chars[end].1) {
            end += 1;
        }
        let next = chars.get(end).map(|(pos, ch)| (*pos, *ch));
        match next {
            None => {
                sentences.push(&text[start..idx]);
                start = text.len();
            }
            Some((pos, ch)) if ch.is_whitespace() => {
                sentences.push(&text[start..idx]);
                start = pos;
            }
            _ => {}
        }
        i = end;
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
