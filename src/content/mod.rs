//! Page content as a splittable token stream

mod stats;
mod token;

pub use stats::DocumentStats;
pub use token::{tokenize, Token};

/// A rich-text fragment held by one page.
///
/// Offsets into a fragment are token boundaries (`0..=len()`), so every
/// prefix and suffix is made of whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    tokens: Vec<Token>,
}

impl Fragment {
    /// Parse markup into a fragment
    pub fn parse(markup: &str) -> Self {
        Self {
            tokens: tokenize(markup),
        }
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens (addressable offsets are `0..=len()`)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True when the fragment holds no visible content, only whitespace or
    /// markup without text
    pub fn is_blank(&self) -> bool {
        !self.tokens.iter().any(Token::is_content)
    }

    /// Serialize back to markup
    pub fn to_markup(&self) -> String {
        self.tokens.iter().map(Token::raw).collect()
    }

    /// Text projection with markup stripped; line boundaries become `\n`
    pub fn plain_text(&self) -> String {
        let mut text = String::new();
        for token in &self.tokens {
            match token {
                Token::Text(s) | Token::Space(s) => text.push_str(s),
                t if t.is_line_boundary() => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    /// Rendered character count
    pub fn char_len(&self) -> usize {
        self.tokens.iter().map(Token::char_len).sum()
    }

    /// Whether the first `offset` tokens contain visible content
    pub fn has_content_before(&self, offset: usize) -> bool {
        self.tokens[..offset.min(self.len())]
            .iter()
            .any(Token::is_content)
    }

    /// Elements opened before `offset` and not yet closed, outermost first
    pub fn open_elements_at(&self, offset: usize) -> Vec<&Token> {
        let mut stack: Vec<&Token> = Vec::new();
        for token in &self.tokens[..offset.min(self.len())] {
            match token {
                Token::Open { .. } => stack.push(token),
                Token::Close { name, .. } => {
                    let matching = stack.iter().rposition(
                        |open| matches!(open, Token::Open { name: n, .. } if n == name),
                    );
                    if let Some(pos) = matching {
                        stack.truncate(pos);
                    }
                }
                _ => {}
            }
        }
        stack
    }

    /// The first `offset` tokens with every still-open element closed
    pub fn balanced_prefix(&self, offset: usize) -> Fragment {
        let offset = offset.min(self.len());
        let mut tokens = self.tokens[..offset].to_vec();
        tokens.extend(self.closing_tokens(offset));
        Fragment { tokens }
    }

    /// Cut at `offset` into two well-formed fragments.
    ///
    /// Elements open at the cut are closed at the end of the first half and
    /// re-opened at the start of the second. Whitespace at the boundary is
    /// trimmed from both halves.
    pub fn split_balanced(&self, offset: usize) -> (Fragment, Fragment) {
        let offset = offset.min(self.len());
        let open: Vec<Token> = self
            .open_elements_at(offset)
            .into_iter()
            .cloned()
            .collect();

        let mut head = self.tokens[..offset].to_vec();
        trim_trailing_whitespace(&mut head);
        head.extend(self.closing_tokens(offset));

        let mut tail = open;
        let mut rest = self.tokens[offset..].to_vec();
        trim_leading_whitespace(&mut rest);
        tail.extend(rest);

        (Fragment { tokens: head }, Fragment { tokens: tail })
    }

    /// `self`, a line break, then `next`. Empty sides are skipped, and no
    /// break is added when `self` already ends a line (e.g. with `</p>`).
    pub fn join(&self, next: &Fragment) -> Fragment {
        if self.is_empty() {
            return next.clone();
        }
        if next.is_empty() {
            return self.clone();
        }
        let mut tokens = Vec::with_capacity(self.len() + next.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        if !self.tokens.last().is_some_and(Token::is_line_boundary) {
            tokens.push(Token::LineBreak("\n".to_string()));
        }
        tokens.extend_from_slice(&next.tokens);
        Fragment { tokens }
    }

    fn closing_tokens(&self, offset: usize) -> impl Iterator<Item = Token> + '_ {
        self.open_elements_at(offset)
            .into_iter()
            .rev()
            .filter_map(|token| match token {
                Token::Open { name, .. } => Some(Token::close_for(name)),
                _ => None,
            })
    }
}

impl From<&str> for Fragment {
    fn from(markup: &str) -> Self {
        Fragment::parse(markup)
    }
}

/// Drop whitespace tokens sitting between the last visible content and the
/// end; tags in that stretch are kept.
fn trim_trailing_whitespace(tokens: &mut Vec<Token>) {
    let last_content = tokens.iter().rposition(Token::is_content);
    let keep_from = last_content.map_or(0, |i| i + 1);
    let mut index = tokens.len();
    while index > keep_from {
        index -= 1;
        if tokens[index].is_whitespace() {
            tokens.remove(index);
        }
    }
}

fn trim_leading_whitespace(tokens: &mut Vec<Token>) {
    let first_content = tokens
        .iter()
        .position(Token::is_content)
        .unwrap_or(tokens.len());
    let mut index = 0;
    let mut end = first_content;
    while index < end {
        if tokens[index].is_whitespace() {
            tokens.remove(index);
            end -= 1;
        } else {
            index += 1;
        }
    }
}
