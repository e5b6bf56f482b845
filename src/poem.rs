//! Poem text parsing
//!
//! Splits the raw recommendation text returned by the model into its
//! display fields. Models are instructed to answer with a fixed layout
//! (title line, author line, poem body, an optional commentary paragraph,
//! and a closing source line); this module turns that convention into a
//! structured value without ever failing.

use std::borrow::Cow;

use serde::Serialize;

/// A poem recommendation broken into display fields.
///
/// Any field may be empty when the model strayed from the expected layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredPoem {
    pub title: String,
    pub author: String,
    pub body: String,
    pub commentary: String,
    pub source: String,
}

impl StructuredPoem {
    /// True when no field carries any text.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.author.is_empty()
            && self.body.is_empty()
            && self.commentary.is_empty()
            && self.source.is_empty()
    }
}

/// Parses raw model output into a [`StructuredPoem`].
///
/// The expected layout is:
///
/// ```text
/// <title>
/// <author>
/// <poem body, possibly several stanzas>
///
/// <commentary paragraph>        (optional)
/// <source>
/// ```
///
/// Inputs with fewer than four lines produce an all-empty poem rather than
/// an error; the caller decides how to present degraded output. Literal
/// `\n` sequences are normalized to real newlines first, since some models
/// escape line breaks inside their answer.
pub fn parse_poem_response(raw: &str) -> StructuredPoem {
    let text = normalize_escaped_newlines(raw);
    let lines: Vec<&str> = text.split('\n').map(str::trim_end).collect();

    if lines.len() < 4 {
        return StructuredPoem::default();
    }

    // Title and author keep their leading whitespace; only the source
    // line is trimmed on both ends.
    let title = lines[0].to_string();
    let author = lines[1].to_string();
    let source = lines[lines.len() - 1].trim().to_string();

    // Everything between the author line and the source line. Blank lines
    // inside this block separate stanzas and, when present, split the poem
    // body from a trailing commentary paragraph.
    let middle = lines[2..lines.len() - 1].join("\n");
    let paragraphs = split_paragraphs(&middle);

    let (body, commentary) = if paragraphs.len() > 1 {
        let commentary = paragraphs[paragraphs.len() - 1].clone();
        let body = paragraphs[..paragraphs.len() - 1].join("\n\n");
        (body, commentary)
    } else {
        let body = paragraphs.into_iter().next().unwrap_or_default();
        (body, String::new())
    };

    StructuredPoem {
        title,
        author,
        body,
        commentary,
        source,
    }
}

/// Replaces literal backslash-n sequences with real newlines. Borrows the
/// input unchanged when there is nothing to replace.
fn normalize_escaped_newlines(raw: &str) -> Cow<'_, str> {
    if raw.contains("\\n") {
        Cow::Owned(raw.replace("\\n", "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Splits a block on runs of two or more newlines and trims each piece.
///
/// Lines have already had trailing whitespace removed, so a blank
/// separator line is exactly an empty line here. Empty segments at the
/// edges are kept: a block that opens with a blank line still counts that
/// empty lead as a paragraph.
fn split_paragraphs(block: &str) -> Vec<String> {
    let bytes = block.as_bytes();
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut end = i;
            while end < bytes.len() && bytes[end] == b'\n' {
                end += 1;
            }
            if end - i >= 2 {
                paragraphs.push(block[start..i].trim().to_string());
                start = end;
            }
            i = end;
        } else {
            i += 1;
        }
    }
    paragraphs.push(block[start..].trim().to_string());
    paragraphs
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_full_layout() {
        let raw = "서시\n윤동주\n죽는 날까지 하늘을 우러러\n한 점 부끄럼이 없기를\n\n이 시는 자신의 삶을 성찰하는 마음을 담고 있습니다.\n하늘과 바람과 별과 시";
        let poem = parse_poem_response(raw);
        assert_eq!(
            poem,
            StructuredPoem {
                title: "서시".to_string(),
                author: "윤동주".to_string(),
                body: "죽는 날까지 하늘을 우러러\n한 점 부끄럼이 없기를".to_string(),
                commentary: "이 시는 자신의 삶을 성찰하는 마음을 담고 있습니다.".to_string(),
                source: "하늘과 바람과 별과 시".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_without_commentary() {
        let poem = parse_poem_response("진달래꽃\n김소월\n나 보기가 역겨워 가실 때에는\n김소월 시집");
        assert_eq!(poem.title, "진달래꽃");
        assert_eq!(poem.author, "김소월");
        assert_eq!(poem.body, "나 보기가 역겨워 가실 때에는");
        assert_eq!(poem.commentary, "");
        assert_eq!(poem.source, "김소월 시집");
    }

    #[test]
    fn test_parse_multi_stanza_body() {
        let raw = "제목\n시인\n첫째 연 첫 줄\n첫째 연 둘째 줄\n\n둘째 연 첫 줄\n\n짧은 해설입니다.\n출처";
        let poem = parse_poem_response(raw);
        assert_eq!(poem.body, "첫째 연 첫 줄\n첫째 연 둘째 줄\n\n둘째 연 첫 줄");
        assert_eq!(poem.commentary, "짧은 해설입니다.");
    }

    #[test]
    fn test_short_input_yields_empty_poem() {
        assert_eq!(parse_poem_response(""), StructuredPoem::default());
        assert_eq!(parse_poem_response("서시"), StructuredPoem::default());
        assert_eq!(
            parse_poem_response("서시\n윤동주\n본문 한 줄"),
            StructuredPoem::default()
        );
    }

    #[test]
    fn test_title_and_author_keep_leading_whitespace() {
        let poem = parse_poem_response("  제목\n  시인\n본문\n  출처  ");
        assert_eq!(poem.title, "  제목");
        assert_eq!(poem.author, "  시인");
        assert_eq!(poem.source, "출처");
    }

    #[test]
    fn test_escaped_newlines_match_real_newlines() {
        let escaped = r"서시\n윤동주\n죽는 날까지 하늘을 우러러\n\n삶을 성찰하는 시입니다.\n시집";
        let real = "서시\n윤동주\n죽는 날까지 하늘을 우러러\n\n삶을 성찰하는 시입니다.\n시집";
        assert_eq!(parse_poem_response(escaped), parse_poem_response(real));
    }

    #[test]
    fn test_crlf_line_endings() {
        let raw = "제목\r\n시인\r\n첫 줄\r\n둘째 줄\r\n\r\n짧은 해설\r\n시집 이름";
        let poem = parse_poem_response(raw);
        assert_eq!(poem.title, "제목");
        assert_eq!(poem.author, "시인");
        assert_eq!(poem.body, "첫 줄\n둘째 줄");
        assert_eq!(poem.commentary, "짧은 해설");
        assert_eq!(poem.source, "시집 이름");
    }

    #[test]
    fn test_whitespace_only_separator_line() {
        let raw = "제목\n시인\n본문 한 줄\n   \n해설 한 줄\n출처";
        let poem = parse_poem_response(raw);
        assert_eq!(poem.body, "본문 한 줄");
        assert_eq!(poem.commentary, "해설 한 줄");
    }

    #[test]
    fn test_paragraphs_are_trimmed_but_inner_indentation_survives() {
        let raw = "제목\n시인\n  들여쓴 첫 줄\n  들여쓴 둘째 줄\n\n해설\n출처";
        let poem = parse_poem_response(raw);
        assert_eq!(poem.body, "들여쓴 첫 줄\n  들여쓴 둘째 줄");
        assert_eq!(poem.commentary, "해설");
    }

    #[test]
    fn test_source_only_body_block() {
        let poem = parse_poem_response("제목\n시인\n\n출처");
        assert_eq!(poem.body, "");
        assert_eq!(poem.commentary, "");
        assert_eq!(poem.source, "출처");
    }

    #[test]
    fn test_blank_lines_after_author_promote_body_to_commentary() {
        // A blank block right after the author line counts as an empty
        // leading paragraph, so the only text paragraph lands in the
        // commentary slot.
        let poem = parse_poem_response("제목\n시인\n\n\n본문이어야 할 줄\n출처");
        assert_eq!(poem.body, "");
        assert_eq!(poem.commentary, "본문이어야 할 줄");
        assert_eq!(poem.source, "출처");
    }

    #[test]
    fn test_trailing_newline_shifts_source() {
        let poem = parse_poem_response("제목\n시인\n본문\n출처\n");
        assert_eq!(poem.body, "본문\n출처");
        assert_eq!(poem.source, "");
    }

    #[test]
    fn test_newline_only_input_does_not_panic() {
        let poem = parse_poem_response("\n\n\n\n");
        assert_eq!(poem.title, "");
        assert_eq!(poem.author, "");
        assert_eq!(poem.source, "");
        assert!(poem.commentary.is_empty());
    }

    #[test]
    fn test_split_paragraphs_edges() {
        assert_eq!(split_paragraphs(""), vec!["".to_string()]);
        assert_eq!(
            split_paragraphs("a\n\n\nb"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            split_paragraphs("\n\nx"),
            vec!["".to_string(), "x".to_string()]
        );
        assert_eq!(
            split_paragraphs("x\n\n"),
            vec!["x".to_string(), "".to_string()]
        );
        assert_eq!(
            split_paragraphs(" a \n\nb"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_reparsing_a_reconstructed_layout_is_stable() {
        let raw = "서시\n윤동주\n죽는 날까지 하늘을 우러러\n한 점 부끄럼이 없기를\n\n삶을 성찰하는 시입니다.\n하늘과 바람과 별과 시";
        let first = parse_poem_response(raw);
        let rebuilt = format!(
            "{}\n{}\n{}\n\n{}\n{}",
            first.title, first.author, first.body, first.commentary, first.source
        );
        assert_eq!(parse_poem_response(&rebuilt), first);
    }

    #[test]
    fn test_is_empty() {
        assert!(StructuredPoem::default().is_empty());
        assert!(!parse_poem_response("서시\n윤동주\n본문\n출처").is_empty());
    }
}
