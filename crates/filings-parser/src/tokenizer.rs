//! A lenient HTML token stream.
//!
//! EDGAR pages are loose HTML: unclosed `<br>` and `<tr>` tags, valueless
//! attributes, named entities like `&nbsp;`. The stream wraps a `quick-xml`
//! reader configured to tolerate all of that and hands out owned [`Token`]s
//! with lowercased tag and attribute names.

use quick_xml::Reader;
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use std::sync::LazyLock;
use tracing::debug;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("valid script regex")
});

/// One lexical unit of an HTML page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// An opening tag.
    Start {
        /// Lowercased tag name.
        name: String,
        /// Attributes in document order, names lowercased, values unescaped.
        attrs: Vec<(String, String)>,
    },
    /// A closing tag.
    End {
        /// Lowercased tag name.
        name: String,
    },
    /// Character data with entities resolved.
    Text(String),
}

impl Token {
    /// Whether this is an opening `name` tag.
    #[must_use]
    pub fn is_start(&self, tag: &str) -> bool {
        matches!(self, Self::Start { name, .. } if name == tag)
    }

    /// Whether this is a closing `name` tag.
    #[must_use]
    pub fn is_end(&self, tag: &str) -> bool {
        matches!(self, Self::End { name } if name == tag)
    }

    /// Value of an attribute on an opening tag.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            Self::Start { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Pull-based tokenizer over one page.
///
/// Reader errors end the stream; everything up to the error is still delivered.
pub struct TokenStream {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    pending: Option<Token>,
    done: bool,
}

impl fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStream")
            .field("position", &self.reader.buffer_position())
            .field("pending", &self.pending)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl TokenStream {
    /// Creates a stream over `html`, dropping `<script>` and `<style>` blocks.
    #[must_use]
    pub fn new(html: &str) -> Self {
        let cleaned = SCRIPT_RE.replace_all(html, "");
        let mut reader = Reader::from_reader(Cursor::new(cleaned.into_owned().into_bytes()));
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            pending: None,
            done: false,
        }
    }

    /// The next token, or `None` once the page is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        while !self.done {
            self.buf.clear();
            let token = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => Some(start_token(&e)),
                Ok(Event::End(e)) => Some(Token::End {
                    name: String::from_utf8_lossy(e.name().as_ref()).to_lowercase(),
                }),
                Ok(Event::Text(e)) => Some(Token::Text(
                    unescape_html(&String::from_utf8_lossy(&e)).into_owned(),
                )),
                Ok(Event::CData(e)) => Some(Token::Text(
                    String::from_utf8_lossy(&e).into_owned(),
                )),
                Ok(Event::Eof) => {
                    self.done = true;
                    None
                }
                Ok(_) => None,
                Err(e) => {
                    debug!(
                        position = self.reader.buffer_position(),
                        error = %e,
                        "Tokenizer stopped on malformed markup"
                    );
                    self.done = true;
                    None
                }
            };
            if token.is_some() {
                return token;
            }
        }
        None
    }

    /// Returns a token to the stream; it is handed out again by the next call.
    ///
    /// Only one token can be held back at a time.
    pub fn push_back(&mut self, token: Token) {
        self.pending = Some(token);
    }
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn start_token(e: &BytesStart<'_>) -> Token {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
    let attrs = e
        .html_attributes()
        .filter_map(|attr| attr.ok())
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
            let value = unescape_html(&String::from_utf8_lossy(&attr.value)).into_owned();
            (key, value)
        })
        .collect();
    Token::Start { name, attrs }
}

/// Resolves character references and the common named HTML entities.
///
/// Text that does not unescape cleanly (a bare `&`, an unknown entity) is
/// returned unchanged.
#[must_use]
pub fn unescape_html(raw: &str) -> Cow<'_, str> {
    unescape_with(raw, |entity| match entity {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some("\u{a0}"),
        "rsquo" => Some("\u{2019}"),
        "lsquo" => Some("\u{2018}"),
        "mdash" => Some("\u{2014}"),
        "ndash" => Some("\u{2013}"),
        _ => None,
    })
    .unwrap_or(Cow::Borrowed(raw))
}
