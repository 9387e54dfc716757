use super::Segment;

/// Splits `text` into literal, variable and link segments in a single
/// left-to-right pass. The first token that matches at a position wins and
/// tokens never nest. Concatenating every segment's [`Segment::raw`]
/// reproduces `text` exactly.
pub fn parse(text: &str) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let token = match bytes[i] {
            b'{' => scan_variable(text, i),
            b'[' => scan_link(text, i),
            _ => None,
        };
        match token {
            Some((segment, end)) => {
                if literal_start < i {
                    segments.push(Segment::Literal {
                        text: text[literal_start..i].to_string(),
                    });
                }
                segments.push(segment);
                i = end;
                literal_start = end;
            }
            None => i += 1,
        }
    }

    if literal_start < bytes.len() {
        segments.push(Segment::Literal {
            text: text[literal_start..].to_string(),
        });
    }
    segments
}

/// `{{` + one or more characters other than `{` / `}` + `}}`, with a
/// non-blank inner name.
fn scan_variable(text: &str, start: usize) -> Option<(Segment, usize)> {
    let bytes = text.as_bytes();
    if !bytes[start..].starts_with(b"{{") {
        return None;
    }
    let inner_start = start + 2;
    let mut j = inner_start;
    while j < bytes.len() && bytes[j] != b'{' && bytes[j] != b'}' {
        j += 1;
    }
    if j == inner_start || !bytes[j..].starts_with(b"}}") {
        return None;
    }
    let name = text[inner_start..j].trim();
    if name.is_empty() {
        return None;
    }
    let end = j + 2;
    Some((
        Segment::Variable {
            raw: text[start..end].to_string(),
            name: name.to_string(),
        },
        end,
    ))
}

/// `[label](url)`: the label may not contain brackets or braces; the url may
/// not contain parentheses, braces or whitespace. Both must be non-empty.
fn scan_link(text: &str, start: usize) -> Option<(Segment, usize)> {
    let bytes = text.as_bytes();
    let label_start = start + 1;
    let mut j = label_start;
    while j < bytes.len() && !matches!(bytes[j], b'[' | b']' | b'{' | b'}') {
        j += 1;
    }
    if j == label_start || j >= bytes.len() || bytes[j] != b']' {
        return None;
    }
    if bytes.get(j + 1) != Some(&b'(') {
        return None;
    }
    let url_start = j + 2;
    let mut k = url_start;
    while k < bytes.len()
        && !matches!(bytes[k], b'(' | b')' | b'{' | b'}')
        && !bytes[k].is_ascii_whitespace()
    {
        k += 1;
    }
    if k == url_start || k >= bytes.len() || bytes[k] != b')' {
        return None;
    }
    let end = k + 1;
    Some((
        Segment::Link {
            raw: text[start..end].to_string(),
            label: text[label_start..j].to_string(),
            url: text[url_start..k].to_string(),
        },
        end,
    ))
}
