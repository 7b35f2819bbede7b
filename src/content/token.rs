//! Rich-text tokenizer
//!
//! Markup is cut into atomic tokens so a split can only ever fall between
//! two tokens, never inside a tag or an entity.

use unicode_segmentation::UnicodeSegmentation;

/// Elements whose closing tag ends a visual line
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "table", "tr",
];

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Name given to `<!-- ... -->` and `<!DOCTYPE ...>` tokens
const MARKUP_DECLARATION: &str = "!";

/// An atomic unit of page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word-bound text segment
    Text(String),
    /// A run of horizontal whitespace
    Space(String),
    /// A hard line break: `\n` or a `<br>` tag
    LineBreak(String),
    /// Opening tag of an element
    Open { name: String, raw: String },
    /// Closing tag of an element
    Close { name: String, raw: String },
    /// Self-contained element (`<img>`, `<hr>`, comments)
    Void { name: String, raw: String },
}

impl Token {
    /// The exact markup this token was parsed from
    pub fn raw(&self) -> &str {
        match self {
            Token::Text(s) | Token::Space(s) | Token::LineBreak(s) => s,
            Token::Open { raw, .. } | Token::Close { raw, .. } | Token::Void { raw, .. } => raw,
        }
    }

    /// Number of rendered characters this token contributes
    pub fn char_len(&self) -> usize {
        match self {
            Token::Text(s) | Token::Space(s) => s.chars().count(),
            Token::LineBreak(_) => 1,
            Token::Close { name, .. } if is_block(name) => 1,
            _ => 0,
        }
    }

    /// Whether a cut next to this token lands on a line boundary
    pub fn is_line_boundary(&self) -> bool {
        match self {
            Token::LineBreak(_) => true,
            Token::Close { name, .. } => is_block(name),
            _ => false,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Space(_) | Token::LineBreak(_))
    }

    /// Visible content: text or an embedded element. Comments and
    /// doctypes render nothing.
    pub fn is_content(&self) -> bool {
        match self {
            Token::Text(_) => true,
            Token::Void { name, .. } => name != MARKUP_DECLARATION,
            _ => false,
        }
    }

    pub(crate) fn close_for(name: &str) -> Self {
        Token::Close {
            name: name.to_string(),
            raw: format!("</{}>", name),
        }
    }
}

pub(crate) fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Tokenize a rich-text fragment
pub fn tokenize(markup: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(rel) = markup[cursor..].find('<') {
        let tag_start = cursor + rel;
        match tag_end(markup, tag_start) {
            Some(end) => {
                push_text(&mut tokens, &markup[text_start..tag_start]);
                tokens.push(parse_tag(&markup[tag_start..end]));
                cursor = end;
                text_start = end;
            }
            None => {
                // A bare `<` is literal text
                cursor = tag_start + 1;
            }
        }
    }

    push_text(&mut tokens, &markup[text_start..]);
    tokens
}

/// Find the byte index just past the tag starting at `start`
fn tag_end(markup: &str, start: usize) -> Option<usize> {
    let rest = &markup[start..];
    if rest.starts_with("<!--") {
        return rest.find("-->").map(|i| start + i + 3);
    }

    let mut chars = rest.char_indices().skip(1);
    let (_, first) = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '/' || first == '!') {
        return None;
    }

    let mut quote: Option<char> = None;
    for (i, c) in chars {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(start + i + 1),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

fn parse_tag(raw: &str) -> Token {
    let owned = raw.to_string();
    if raw.starts_with("<!") {
        return Token::Void {
            name: MARKUP_DECLARATION.to_string(),
            raw: owned,
        };
    }

    let closing = raw.starts_with("</");
    let body = raw.trim_start_matches("</").trim_start_matches('<');
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();

    if name == "br" {
        return Token::LineBreak(owned);
    }
    if closing {
        return Token::Close { name, raw: owned };
    }
    if raw.ends_with("/>") || VOID_ELEMENTS.contains(&name.as_str()) {
        return Token::Void { name, raw: owned };
    }
    Token::Open { name, raw: owned }
}

fn push_text(tokens: &mut Vec<Token>, text: &str) {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        match entity_len(&rest[amp..]) {
            Some(len) => {
                push_segments(tokens, &rest[..amp]);
                tokens.push(Token::Text(rest[amp..amp + len].to_string()));
                rest = &rest[amp + len..];
            }
            None => {
                push_segments(tokens, &rest[..=amp]);
                rest = &rest[amp + 1..];
            }
        }
    }
    push_segments(tokens, rest);
}

/// Length of a character reference such as `&amp;` or `&#160;`
fn entity_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let end = body.find(';')?;
    let name = &body[..end];
    let valid = !name.is_empty()
        && name.len() <= 32
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    valid.then_some(end + 2)
}

fn push_segments(tokens: &mut Vec<Token>, text: &str) {
    for segment in text.split_word_bounds() {
        let token = if matches!(segment, "\n" | "\r\n" | "\r") {
            Token::LineBreak(segment.to_string())
        } else if segment.chars().all(char::is_whitespace) {
            Token::Space(segment.to_string())
        } else {
            Token::Text(segment.to_string())
        };
        tokens.push(token);
    }
}
