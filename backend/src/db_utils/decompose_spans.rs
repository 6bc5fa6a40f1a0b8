//! Splits Solr highlighting snippets into plain and highlighted spans.

use common::text_highlight::HighlightTextSpan;

/// Decomposes `text` on the highlight markers configured for the query.
///
/// Adjacent runs with the same state are merged, nested markers count as one highlighted run and
/// a stray closing marker is kept as literal text. Highlighted runs are numbered from 0.
pub fn decompose_text_into_spans(text: &str, prefix: &str, postfix: &str) -> Vec<HighlightTextSpan> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }
    if prefix.is_empty() || postfix.is_empty() || !text.contains(prefix) {
        return vec![HighlightTextSpan {
            text: text.to_string(),
            is_highlighted: false,
            index: 0,
        }];
    }

    let mut spans: Vec<HighlightTextSpan> = Vec::new();
    let mut buffer = String::new();
    let mut depth = 0usize;
    let mut rest = text;
    loop {
        let next_open = rest.find(prefix);
        let next_close = rest.find(postfix);
        let (is_open, position) = match (next_open, next_close) {
            (None, None) => break,
            (Some(open), None) => (true, open),
            (None, Some(close)) => (false, close),
            (Some(open), Some(close)) => (open <= close, open.min(close)),
        };
        buffer.push_str(&rest[..position]);
        push_span(&mut spans, &mut buffer, depth > 0);
        if is_open {
            depth += 1;
            rest = &rest[position + prefix.len()..];
        } else {
            if depth > 0 {
                depth -= 1;
            } else {
                buffer.push_str(postfix);
            }
            rest = &rest[position + postfix.len()..];
        }
    }
    buffer.push_str(rest);
    push_span(&mut spans, &mut buffer, depth > 0);

    let mut index = 0;
    for span in spans.iter_mut().filter(|span| span.is_highlighted) {
        span.index = index;
        index += 1;
    }
    spans
}

fn push_span(spans: &mut Vec<HighlightTextSpan>, buffer: &mut String, is_highlighted: bool) {
    if buffer.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.is_highlighted == is_highlighted => last.text.push_str(buffer),
        _ => spans.push(HighlightTextSpan {
            text: buffer.clone(),
            is_highlighted,
            index: 0,
        }),
    }
    buffer.clear();
}
