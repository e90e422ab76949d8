use super::types::Line;

const COMMENT_CHAR: char = ';';

fn strip_comment(raw: &str) -> &str {
    match raw.find(COMMENT_CHAR) {
        Some(pos) => &raw[..pos],
        None => raw,
    }
}

pub fn preprocess(source: &str) -> Vec<Line> {
    source
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, strip_comment(raw.trim()).trim()))
        .filter(|(_, text)| !text.is_empty())
        .map(|(number, text)| Line::new(number, text.to_owned()))
        .collect()
}
