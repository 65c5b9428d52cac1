//! Layout facts read from the original text: indentation, line starts,
//! trailing commas.

use crate::syntax::Span;

/// Indentation unit and line ending used by a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStyle {
    unit: String,
    newline: &'static str,
}

impl IndentStyle {
    pub fn spaces(width: usize) -> Self {
        Self {
            unit: " ".repeat(width.max(1)),
            newline: "\n",
        }
    }

    /// Detect the indentation style of `source`, falling back to
    /// `default_width` spaces when nothing is indented.
    ///
    /// Doc-comment continuation lines (` * ...`) are ignored; their single
    /// space of alignment would otherwise drag the unit down to one.
    pub fn detect(source: &str, default_width: usize) -> Self {
        Self {
            newline: detect_newline(source),
            ..Self::detect_unit(source, default_width)
        }
    }

    fn detect_unit(source: &str, default_width: usize) -> Self {
        let mut space_counts: Vec<usize> = Vec::new();
        let mut has_tabs = false;

        for line in source.lines() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('*') {
                continue;
            }

            let leading_spaces = line.len() - line.trim_start_matches(' ').len();
            let leading_tabs = line.len() - line.trim_start_matches('\t').len();

            if leading_tabs > 0 {
                has_tabs = true;
            } else if leading_spaces > 0 {
                space_counts.push(leading_spaces);
            }
        }

        if has_tabs {
            return Self {
                unit: "\t".to_string(),
                newline: "\n",
            };
        }
        match space_counts.into_iter().reduce(gcd) {
            Some(width) => Self::spaces(width),
            None => Self::spaces(default_width),
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn newline(&self) -> &'static str {
        self.newline
    }

    pub fn nested(&self, indent: &str) -> String {
        format!("{}{}", indent, self.unit)
    }
}

/// `\r\n` when most line breaks in `source` are CRLF
fn detect_newline(source: &str) -> &'static str {
    let breaks = source.matches('\n').count();
    let crlf = source.matches("\r\n").count();
    if crlf > 0 && crlf * 2 >= breaks {
        "\r\n"
    } else {
        "\n"
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

pub fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |nl| nl + 1)
}

/// Leading whitespace of the line containing `offset`
pub fn line_indent(source: &str, offset: usize) -> &str {
    let start = line_start(source, offset);
    let line = &source[start..offset];
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// End of the last non-whitespace byte inside `span`
pub fn content_end(source: &str, span: Span) -> usize {
    span.start + source[span.start..span.end].trim_end().len()
}

/// Strip `indent` from every line after the first
pub fn dedent(text: &str, indent: &str) -> String {
    if indent.is_empty() || !text.contains('\n') {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        out.push_str(line.strip_prefix(indent).unwrap_or(line));
    }
    out
}

/// Prefix every non-empty line after the first with `indent`, ending lines
/// with `newline`
pub fn reindent(text: &str, indent: &str, newline: &str) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or_default();
    let mut out = first.strip_suffix('\r').unwrap_or(first).to_string();
    let mut lines = lines.peekable();
    while let Some(line) = lines.next() {
        let line = match lines.peek() {
            Some(_) => line.strip_suffix('\r').unwrap_or(line),
            None => line,
        };
        out.push_str(newline);
        if !line.trim().is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out
}

/// Offset of the first comma in `span`, skipping whitespace and comments.
/// `None` when the first significant character is something else.
pub fn leading_comma(source: &str, span: Span) -> Option<usize> {
    let text = &source[span.start..span.end];
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = text[i..].find('\n').map_or(bytes.len(), |nl| i + nl);
            }
            b'#' if bytes.get(i + 1) != Some(&b'[') => {
                i = text[i..].find('\n').map_or(bytes.len(), |nl| i + nl);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i..].find("*/").map_or(bytes.len(), |end| i + end + 2);
            }
            b',' => return Some(span.start + i),
            _ => return None,
        }
    }
    None
}

/// End of a comment that trails `from` on the same line, or `from` itself.
/// The line break is not included.
pub fn trailing_comment_end(source: &str, from: usize, limit: usize) -> usize {
    let text = &source[from..limit];
    let rest = text.trim_start_matches([' ', '\t']);
    let start = from + (text.len() - rest.len());
    let line_comment = rest.starts_with("//") || (rest.starts_with('#') && !rest.starts_with("#["));
    if line_comment {
        return rest
            .find(['\r', '\n'])
            .map_or(limit, |eol| start + eol);
    }
    if rest.starts_with("/*") {
        if let Some(end) = rest.find("*/") {
            if !rest[..end].contains('\n') {
                return start + end + 2;
            }
        }
    }
    from
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_indentation() {
        let spaces = "<?php\nclass A\n{\n    /**\n     * doc\n     */\n    public $a;\n        // deeper\n}\n";
        assert_eq!(IndentStyle::detect(spaces, 2).unit(), "    ");

        let tabs = "<?php\nclass A\n{\n\tpublic $a;\n}\n";
        assert_eq!(IndentStyle::detect(tabs, 4).unit(), "\t");

        assert_eq!(IndentStyle::detect("<?php\n", 2).unit(), "  ");
    }

    #[test]
    fn test_line_indent() {
        let source = "a\n    b = [\n        1,\n";
        let offset = source.find('1').unwrap();
        assert_eq!(line_indent(source, offset), "        ");
        assert_eq!(line_indent(source, source.find('b').unwrap()), "    ");
    }

    #[test]
    fn test_dedent_and_reindent() {
        let text = "if ($a) {\n        b();\n    }";
        let flat = dedent(text, "    ");
        assert_eq!(flat, "if ($a) {\n    b();\n}");
        assert_eq!(reindent(&flat, "  ", "\n"), "if ($a) {\n      b();\n  }");
        assert_eq!(
            reindent("a {\r\n    b();\n}", "", "\r\n"),
            "a {\r\n    b();\r\n}"
        );
    }

    #[test]
    fn test_detect_line_ending() {
        let crlf = "<?php\r\nclass A\r\n{\r\n  public $a;\r\n}\r\n";
        let style = IndentStyle::detect(crlf, 4);
        assert_eq!(style.newline(), "\r\n");
        assert_eq!(style.unit(), "  ");
        assert_eq!(IndentStyle::detect("<?php\nclass A {}\n", 4).newline(), "\n");
        assert_eq!(IndentStyle::detect("<?php\n\tx;\r\n\r\n", 4).newline(), "\r\n");
    }

    #[test]
    fn test_leading_comma() {
        let source = "1 /* c */ , 2";
        assert_eq!(leading_comma(source, Span::new(1, source.len())), Some(10));
        assert_eq!(leading_comma("1\n]", Span::new(1, 3)), None);
    }

    #[test]
    fn test_trailing_comment_end() {
        let source = "a, // note\n]";
        assert_eq!(trailing_comment_end(source, 2, source.len()), 10);
        assert_eq!(trailing_comment_end("a, /* x */ b", 2, 12), 10);
        assert_eq!(trailing_comment_end("a,\n// own line\n", 2, 15), 2);
        assert_eq!(trailing_comment_end("a, #[Attr]", 2, 10), 2);
    }
}
