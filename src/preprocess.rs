use crate::dprintln;

const COMMENT: char = ';';
const LABEL_DECL: char = ':';

/// Source line with comments and surrounding whitespace removed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Line<'a> {
    pub text: &'a str,
    /// Byte offset of `text` inside the source
    pub offs: usize,
    /// 1-based line number inside the source
    pub number: usize,
}

/// Named address declared with `:name`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label {
    pub name: String,
    /// Index of the cleaned line this label points at
    pub line: usize,
    /// Word address, provisional until the generator resolves it
    pub address: u16,
}

/// Strip comments and blank lines, then pull label declarations out of the remaining lines.
pub fn preprocess(src: &str) -> (Vec<Line<'_>>, Vec<Label>) {
    let lines = strip_comments(src);
    let (lines, labels) = find_labels(lines);

    for label in &labels {
        dprintln!(Trace, "{} {}", label.name, label.line);
    }

    (lines, labels)
}

fn strip_comments(src: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offs = 0;
    for (i, raw) in src.split_inclusive('\n').enumerate() {
        let start = offs;
        offs += raw.len();

        let raw = raw.trim_end_matches(|c| c == '\n' || c == '\r');
        if raw.trim().is_empty() || raw.trim_start().starts_with(COMMENT) {
            continue;
        }
        let code = match raw.find(COMMENT) {
            Some(idx) => &raw[..idx],
            None => raw,
        };
        let leading = code.len() - code.trim_start().len();
        lines.push(Line {
            text: code.trim(),
            offs: start + leading,
            number: i + 1,
        });
    }
    lines
}

fn find_labels(lines: Vec<Line<'_>>) -> (Vec<Line<'_>>, Vec<Label>) {
    let mut labels: Vec<Label> = Vec::new();
    let mut kept = Vec::with_capacity(lines.len());
    for (idx, line) in lines.into_iter().enumerate() {
        let Some(name) = line.text.strip_prefix(LABEL_DECL) else {
            kept.push(line);
            continue;
        };
        // Declaration lines are removed, so earlier labels shift everything up
        let target = idx - labels.len();
        labels.push(Label {
            name: name.trim().to_owned(),
            line: target,
            address: target as u16,
        });
    }
    (kept, labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(lines: &[Line<'a>]) -> Vec<&'a str> {
        lines.iter().map(|line| line.text).collect()
    }

    #[test]
    fn strips_comments_and_blank_lines() {
        let src = "; header\n\nDWR %5 ; load\n   ; indented comment\n  HLT  \n\t\n";
        let (lines, labels) = preprocess(src);
        assert_eq!(texts(&lines), ["DWR %5", "HLT"]);
        assert!(labels.is_empty());
    }

    #[test]
    fn records_source_positions() {
        let src = "NOP\r\n  HLT ; done\r\n";
        let (lines, _) = preprocess(src);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].offs, 0);
        assert_eq!(lines[1].number, 2);
        assert_eq!(&src[lines[1].offs..lines[1].offs + 3], "HLT");
    }

    #[test]
    fn labels_account_for_removed_lines() {
        let (lines, labels) = preprocess(":a\nNOP\n:b\nHLT");
        assert_eq!(texts(&lines), ["NOP", "HLT"]);
        assert_eq!(labels.len(), 2);
        assert_eq!((labels[0].name.as_str(), labels[0].line), ("a", 0));
        assert_eq!((labels[1].name.as_str(), labels[1].line), ("b", 1));
        assert_eq!(labels[1].address, 1);
    }

    #[test]
    fn label_on_last_line_is_kept() {
        let (lines, labels) = preprocess("NOP\n:end");
        assert_eq!(texts(&lines), ["NOP"]);
        assert_eq!(labels[0].name, "end");
        assert_eq!(labels[0].line, 1);
    }

    #[test]
    fn duplicate_labels_are_not_rejected() {
        let (_, labels) = preprocess(":x\nNOP\n:x\nNOP");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].name, labels[1].name);
    }
}
