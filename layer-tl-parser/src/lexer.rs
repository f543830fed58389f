//! Streaming tokenizer for TL IDL text.
//!
//! The lexer pulls bytes from any [`Read`] source through a small refillable
//! buffer, so a schema never has to be materialized in memory as a whole.
//! Only the tokens of the declaration currently being read are queued.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::errors::{LexError, LexErrorKind, Position};
use crate::tl::Category;

/// Default size of the refill buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 512;

/// What a [`Token`] stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A `---types---` or `---functions---` separator.
    Section(Category),
    /// The qualified declaration name, e.g. `messages.sendMessage`.
    Name(String),
    /// The `#xxxxxxxx` identifier literal.
    Id(u32),
    /// The variable named by a `{t:Type}` block.
    TypeParam(String),
    /// Starts the parameter list. Only emitted for declarations with parameters.
    ParamsBegin,
    /// A parameter name.
    ParamName(String),
    /// The raw type text of the preceding parameter.
    ParamType(String),
    /// Ends the parameter list.
    ParamsEnd,
    /// The raw result type text. Always the last token of a declaration.
    ResultType(String),
}

/// A token together with the position of its first byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The token.
    pub kind: TokenKind,
    /// Where it starts.
    pub position: Position,
}

/// One whitespace-delimited unit of a declaration. `=` and `;` always form
/// their own word.
struct Word {
    text: String,
    position: Position,
}

/// A pull-based tokenizer over a byte source.
///
/// Iterating yields tokens until the input is exhausted or the first error;
/// after an error the iterator is fused.
pub struct Lexer<R> {
    reader: R,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    eof: bool,
    at: Position,
    category: Category,
    pending: VecDeque<Token>,
    layer: Option<u32>,
    failed: bool,
}

impl<R: Read> Lexer<R> {
    /// Creates a lexer with the default buffer size.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, reader)
    }

    /// Creates a lexer that refills at most `capacity` bytes at a time.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            reader,
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            end: 0,
            eof: false,
            at: Position::START,
            category: Category::Constructor,
            pending: VecDeque::new(),
            layer: None,
            failed: false,
        }
    }

    /// The category of the section currently being read.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The layer number from a `// LAYER N` comment, once one has been seen.
    pub fn layer(&self) -> Option<u32> {
        self.layer
    }

    /// Position of the next unread byte.
    pub fn position(&self) -> Position {
        self.at
    }

    /// Returns the next token, `Ok(None)` at a clean end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.pending.pop_front() {
            return Ok(Some(token));
        }
        if self.failed {
            return Ok(None);
        }

        let result = self.lex_next();
        if result.is_err() {
            self.failed = true;
            self.pending.clear();
        }
        result
    }

    fn lex_next(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            self.skip_trivia()?;
            let Some(b) = self.peek()? else {
                return Ok(None);
            };

            if b == b'-' {
                return self.lex_section().map(Some);
            }

            self.lex_declaration()?;
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            // An id-less pseudo-declaration produced nothing; keep going.
        }
    }

    /// `---types---` / `---functions---`.
    fn lex_section(&mut self) -> Result<Token, LexError> {
        let position = self.at;
        for _ in 0..3 {
            self.expect_byte(b'-')?;
        }

        let mut name = Vec::new();
        while let Some(b) = self.peek_in_declaration()? {
            if b == b'-' {
                break;
            }
            name.push(b);
            self.advance();
        }
        for _ in 0..3 {
            self.expect_byte(b'-')?;
        }

        let name = String::from_utf8(name)
            .map_err(|_| LexError::new(LexErrorKind::InvalidUtf8, position))?;
        self.category = match name.as_str() {
            "types" => Category::Constructor,
            "functions" => Category::Method,
            _ => return Err(LexError::new(LexErrorKind::InvalidSection(name), position)),
        };
        log::trace!("[tl-lex] section {} at {position}", self.category.section_name());

        Ok(Token { kind: TokenKind::Section(self.category), position })
    }

    /// Lexes one declaration up to and including its `;` into `pending`.
    ///
    /// A declaration without `#id` that still has parameters
    /// (`message msg_id:long … = Message;`) gets the identifier TL derives
    /// for it: the CRC32 of its whitespace-normalised text. Id-less
    /// declarations without parameters (`int ? = Int;`, `bytes = Bytes;`)
    /// describe built-in primitives and produce no tokens.
    fn lex_declaration(&mut self) -> Result<(), LexError> {
        let words = self.declaration_words()?;
        let Some((head, rest)) = words.split_first() else {
            return Ok(());
        };

        let (name, id, id_position) = match head.text.split_once('#') {
            Some((name, id)) => {
                if name.is_empty() {
                    return Err(unexpected("declaration name", head));
                }
                let id_position = Position {
                    offset: head.position.offset + name.len() + 1,
                    line: head.position.line,
                    column: head.position.column + name.len() + 1,
                };
                let id = parse_id(id).ok_or_else(|| {
                    LexError::new(LexErrorKind::InvalidId(id.to_owned()), id_position)
                })?;
                (name, id, id_position)
            }
            None if rest.iter().take_while(|w| w.text != "=").any(is_parameter) => {
                let id = derived_id(&words);
                log::trace!("[tl-lex] derived id {id:#010x} for `{}`", head.text);
                (head.text.as_str(), id, head.position)
            }
            None => {
                log::trace!("[tl-lex] skipping pseudo-declaration `{}`", head.text);
                return Ok(());
            }
        };

        self.pending.push_back(Token { kind: TokenKind::Name(name.to_owned()), position: head.position });
        self.pending.push_back(Token { kind: TokenKind::Id(id), position: id_position });

        let mut rest = rest.iter();
        let mut in_params = false;
        while let Some(word) = rest.next() {
            match word.text.as_str() {
                "=" => {
                    if in_params {
                        self.pending.push_back(Token { kind: TokenKind::ParamsEnd, position: word.position });
                    }
                    return self.lex_result_type(&mut rest);
                }
                // vector#1cb5c415 {t:Type} # [ t ] = Vector t;
                "#" if !in_params => match rest.find(|w| w.text == "=" || w.text == ";") {
                    Some(w) if w.text == "=" => return self.lex_result_type(&mut rest),
                    Some(w) => return Err(unexpected("`=`", w)),
                    None => break,
                },
                "?" if !in_params => continue,
                ";" => return Err(unexpected("parameter or `=`", word)),
                text if text.starts_with('{') && !in_params => {
                    let var = text
                        .strip_prefix('{')
                        .and_then(|t| t.strip_suffix('}'))
                        .and_then(|t| t.split_once(':'))
                        .map(|(var, _)| var)
                        .filter(|var| !var.is_empty())
                        .ok_or_else(|| unexpected("generic block `{X:Type}`", word))?;
                    self.pending.push_back(Token {
                        kind: TokenKind::TypeParam(var.to_owned()),
                        position: word.position,
                    });
                }
                text => {
                    let Some((pname, pty)) = text.split_once(':') else {
                        return Err(unexpected("parameter `name:type`", word));
                    };
                    if pname.is_empty() || pty.is_empty() {
                        return Err(unexpected("parameter `name:type`", word));
                    }
                    if !in_params {
                        in_params = true;
                        self.pending.push_back(Token { kind: TokenKind::ParamsBegin, position: word.position });
                    }
                    let type_position = Position {
                        offset: word.position.offset + pname.len() + 1,
                        line: word.position.line,
                        column: word.position.column + pname.len() + 1,
                    };
                    self.pending.push_back(Token {
                        kind: TokenKind::ParamName(pname.to_owned()),
                        position: word.position,
                    });
                    self.pending.push_back(Token {
                        kind: TokenKind::ParamType(pty.to_owned()),
                        position: type_position,
                    });
                }
            }
        }
        Err(LexError::new(LexErrorKind::UnexpectedEof, self.at))
    }

    /// Reads the words after `=` up to `;`. Multi-word results (`Vector t`)
    /// are joined with a single space.
    fn lex_result_type<'w>(&mut self, words: impl Iterator<Item = &'w Word>) -> Result<(), LexError> {
        let mut result = String::new();
        let mut position = None;
        for word in words {
            match word.text.as_str() {
                ";" if position.is_some() => break,
                ";" | "=" => return Err(unexpected("result type", word)),
                text => {
                    if !result.is_empty() {
                        result.push(' ');
                    }
                    result.push_str(text);
                    position.get_or_insert(word.position);
                }
            }
        }

        let Some(position) = position else {
            return Err(LexError::new(LexErrorKind::UnexpectedEof, self.at));
        };
        self.pending.push_back(Token { kind: TokenKind::ResultType(result), position });
        Ok(())
    }

    /// Every word of the current declaration, the closing `;` included.
    fn declaration_words(&mut self) -> Result<Vec<Word>, LexError> {
        let mut words = Vec::new();
        loop {
            let word = self.next_word()?;
            let done = word.text == ";";
            words.push(word);
            if done {
                return Ok(words);
            }
        }
    }

    /// Reads the next word of the current declaration. Newlines and end of
    /// input are errors here.
    fn next_word(&mut self) -> Result<Word, LexError> {
        while let Some(b) = self.peek_in_declaration()? {
            if b == b' ' || b == b'\t' {
                self.advance();
            } else {
                break;
            }
        }

        let position = self.at;
        let mut text = Vec::new();
        while let Some(b) = self.peek_in_declaration()? {
            match b {
                b' ' | b'\t' => break,
                b'=' | b';' => {
                    if text.is_empty() {
                        text.push(b);
                        self.advance();
                    }
                    break;
                }
                _ => {
                    text.push(b);
                    self.advance();
                }
            }
        }

        if text.is_empty() {
            return Err(LexError::new(LexErrorKind::UnexpectedEof, self.at));
        }
        let text =
            String::from_utf8(text).map_err(|_| LexError::new(LexErrorKind::InvalidUtf8, position))?;
        Ok(Word { text, position })
    }

    /// Skips blanks, line breaks and `//` comments between declarations.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        while let Some(b) = self.peek()? {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                b'/' => self.skip_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<(), LexError> {
        let position = self.at;
        self.advance();
        match self.peek()? {
            Some(b'/') => self.advance(),
            Some(b) => return Err(LexError::new(LexErrorKind::UnexpectedChar(b as char), self.at)),
            None => return Err(LexError::new(LexErrorKind::UnexpectedEof, self.at)),
        }

        let mut text = Vec::new();
        while let Some(b) = self.peek()? {
            if b == b'\n' {
                break;
            }
            text.push(b);
            self.advance();
        }

        if let Some(layer) = parse_layer_comment(&text) {
            log::debug!("[tl-lex] schema layer {layer} at {position}");
            self.layer = Some(layer);
        }
        Ok(())
    }

    fn expect_byte(&mut self, expected: u8) -> Result<(), LexError> {
        match self.peek_in_declaration()? {
            Some(b) if b == expected => {
                self.advance();
                Ok(())
            }
            Some(b) => Err(LexError::new(LexErrorKind::UnexpectedChar(b as char), self.at)),
            None => Err(LexError::new(LexErrorKind::UnexpectedEof, self.at)),
        }
    }

    /// Like [`Self::peek`], but a line break is fatal.
    fn peek_in_declaration(&mut self) -> Result<Option<u8>, LexError> {
        match self.peek()? {
            Some(b'\n' | b'\r') => Err(LexError::new(LexErrorKind::UnexpectedNewline, self.at)),
            other => Ok(other),
        }
    }

    fn peek(&mut self) -> Result<Option<u8>, LexError> {
        if self.pos == self.end {
            self.refill()?;
        }
        Ok((self.pos < self.end).then(|| self.buf[self.pos]))
    }

    /// Consumes the byte last returned by `peek`.
    fn advance(&mut self) {
        if let Some(&b) = self.buf[..self.end].get(self.pos) {
            self.pos += 1;
            self.at.offset += 1;
            if b == b'\n' {
                self.at.line += 1;
                self.at.column = 1;
            } else {
                self.at.column += 1;
            }
        }
    }

    fn refill(&mut self) -> Result<(), LexError> {
        if self.eof {
            return Ok(());
        }
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.eof = true;
                    self.pos = 0;
                    self.end = 0;
                    return Ok(());
                }
                Ok(n) => {
                    self.pos = 0;
                    self.end = n;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LexError::new(LexErrorKind::Io(e), self.at)),
            }
        }
    }
}

impl<R: Read> Iterator for Lexer<R> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

impl<R: Read> std::iter::FusedIterator for Lexer<R> {}

fn unexpected(expected: &'static str, word: &Word) -> LexError {
    LexError::new(
        LexErrorKind::UnexpectedToken { expected, found: format!("`{}`", word.text) },
        word.position,
    )
}

/// `name:type`, as opposed to `?`, `#` or a `{t:Type}` block.
fn is_parameter(word: &Word) -> bool {
    !word.text.starts_with('{') && word.text.contains(':')
}

/// CRC32 of the declaration with single spaces between words and no `;`.
fn derived_id(words: &[Word]) -> u32 {
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .filter(|&w| w != ";")
        .collect::<Vec<_>>()
        .join(" ");
    crc32fast::hash(text.as_bytes())
}

/// Parses the 1 to 8 hex digits after `#`.
fn parse_id(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.len() > 8 {
        return None;
    }
    u32::from_str_radix(raw, 16).ok()
}

/// Recognizes `// LAYER 181` (the slashes already consumed).
fn parse_layer_comment(text: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(text).ok()?.trim();
    let rest = text.strip_prefix("LAYER")?.trim();
    rest.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src.as_bytes()).map(|t| t.unwrap().kind).collect()
    }

    #[test]
    fn declaration_without_params() {
        assert_eq!(
            kinds("boolTrue#997275b5 = Bool;"),
            vec![
                TokenKind::Name("boolTrue".into()),
                TokenKind::Id(0x997275b5),
                TokenKind::ResultType("Bool".into()),
            ]
        );
    }

    #[test]
    fn declaration_with_params() {
        assert_eq!(
            kinds("user#12345 id:long name:flags.0?string = User;"),
            vec![
                TokenKind::Name("user".into()),
                TokenKind::Id(0x12345),
                TokenKind::ParamsBegin,
                TokenKind::ParamName("id".into()),
                TokenKind::ParamType("long".into()),
                TokenKind::ParamName("name".into()),
                TokenKind::ParamType("flags.0?string".into()),
                TokenKind::ParamsEnd,
                TokenKind::ResultType("User".into()),
            ]
        );
    }

    #[test]
    fn sections_switch_category() {
        let mut lexer = Lexer::new("---functions---\nping#7abe77ec ping_id:long = Pong;".as_bytes());
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.kind, TokenKind::Section(Category::Method));
        assert_eq!(lexer.category(), Category::Method);
    }

    #[test]
    fn generic_blocks_and_vector_declaration() {
        assert_eq!(
            kinds("vector#1cb5c415 {t:Type} # [ t ] = Vector t;"),
            vec![
                TokenKind::Name("vector".into()),
                TokenKind::Id(0x1cb5c415),
                TokenKind::TypeParam("t".into()),
                TokenKind::ResultType("Vector t".into()),
            ]
        );
    }

    #[test]
    fn pseudo_declarations_are_skipped() {
        assert_eq!(
            kinds("int ? = Int;\nbytes = Bytes;\ntrue#3fedd339 = True;"),
            vec![
                TokenKind::Name("true".into()),
                TokenKind::Id(0x3fedd339),
                TokenKind::ResultType("True".into()),
            ]
        );
    }

    #[test]
    fn idless_declaration_with_params_gets_crc32_id() {
        assert_eq!(
            kinds("message  msg_id:long seqno:int\tbytes:int body:Object = Message;"),
            vec![
                TokenKind::Name("message".into()),
                TokenKind::Id(0x5bb8e511),
                TokenKind::ParamsBegin,
                TokenKind::ParamName("msg_id".into()),
                TokenKind::ParamType("long".into()),
                TokenKind::ParamName("seqno".into()),
                TokenKind::ParamType("int".into()),
                TokenKind::ParamName("bytes".into()),
                TokenKind::ParamType("int".into()),
                TokenKind::ParamName("body".into()),
                TokenKind::ParamType("Object".into()),
                TokenKind::ParamsEnd,
                TokenKind::ResultType("Message".into()),
            ]
        );
    }

    #[test]
    fn newline_inside_declaration_is_fatal() {
        let mut lexer = Lexer::new("user#1 id:long\n = User;".as_bytes());
        let err = loop {
            match lexer.next_token() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err.kind, LexErrorKind::UnexpectedNewline));
        assert_eq!(err.position.line, 1);
        assert_eq!(err.position.column, 15);
        assert_eq!(err.position.offset, 14);
        assert!(lexer.next_token().unwrap().is_none());
    }

    #[test]
    fn layer_comment() {
        let mut lexer = Lexer::new("// LAYER 181\n".as_bytes());
        assert!(lexer.next_token().unwrap().is_none());
        assert_eq!(lexer.layer(), Some(181));
    }
}
