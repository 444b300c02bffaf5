//! A finite-state scanner over a buffered byte slice (`spec.md` §4.1). Unlike a
//! combinator-based parser, this mirrors the C original's `pdf_lib.c` character
//! scanner closely: explicit cursor, explicit `ungetc`, explicit `preceded_by_newline`
//! bookkeeping that the classical-xref reader depends on.

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Real(f64),
    String(Vec<u8>),
    Name(Vec<u8>),
    Id(Vec<u8>),
    BeginDict,
    EndDict,
    BeginArray,
    EndArray,
    Eof,
    Unknown(u8),
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | 0x0c | b'\r' | b' ')
}

pub struct Tokenizer<'a> {
    buf: &'a [u8],
    pos: usize,
    /// True if the whitespace run immediately before the last-returned token
    /// contained a newline — classical xref row parsing cares about this.
    pub preceded_by_newline: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Tokenizer { buf, pos: 0, preceded_by_newline: false }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Tokenizer { buf, pos, preceded_by_newline: false }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn getc(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn ungetc(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        self.preceded_by_newline = false;
        loop {
            match self.peek() {
                Some(b) if is_whitespace(b) => {
                    if b == b'\n' || b == b'\r' {
                        self.preceded_by_newline = true;
                    }
                    self.pos += 1;
                }
                Some(b'%') => {
                    while let Some(b) = self.peek() {
                        self.pos += 1;
                        if b == b'\n' || b == b'\r' {
                            self.preceded_by_newline = true;
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let b = match self.getc() {
            Some(b) => b,
            None => return Token::Eof,
        };
        match b {
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    Token::BeginDict
                } else {
                    self.ungetc();
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    Token::EndDict
                } else {
                    Token::Unknown(b'>')
                }
            }
            b'[' => Token::BeginArray,
            b']' => Token::EndArray,
            b'(' => self.read_literal_string(),
            b'/' => self.read_name(),
            b'+' | b'-' | b'0'..=b'9' | b'.' => {
                self.ungetc();
                self.read_number()
            }
            b'{' | b'}' => Token::Unknown(b),
            _ => {
                self.ungetc();
                self.read_identifier()
            }
        }
    }

    fn read_name(&mut self) -> Token {
        let mut name = Vec::new();
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                // `#xx` hex escape, e.g. a name containing a literal space as `#20`.
                if let (Some(h1), Some(h2)) = (self.buf.get(self.pos), self.buf.get(self.pos + 1)) {
                    if let Some(v) = hex_pair(*h1, *h2) {
                        name.push(v);
                        self.pos += 2;
                        continue;
                    }
                }
                name.push(b);
            } else {
                name.push(b);
            }
        }
        Token::Name(name)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            self.pos += 1;
            return Token::Unknown(self.buf[start]);
        }
        Token::Id(self.buf[start..self.pos].to_vec())
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let mut is_real = false;
        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !is_real => {
                    is_real = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.buf[start..self.pos]).unwrap_or("0");
        if is_real {
            // ".5" and "5." both parse; a lone "-" or "." with nothing else becomes 0.
            let normalized = if text.starts_with('.') {
                format!("0{text}")
            } else if text.ends_with('.') {
                format!("{text}0")
            } else if text == "-" || text.is_empty() {
                "0".to_string()
            } else {
                text.to_string()
            };
            Token::Real(normalized.parse().unwrap_or(0.0))
        } else {
            Token::Int(text.parse().unwrap_or(0))
        }
    }

    fn read_literal_string(&mut self) -> Token {
        let mut out = Vec::new();
        let mut depth = 1;
        while let Some(b) = self.getc() {
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                }
                b'\\' => match self.getc() {
                    Some(b'n') => out.push(b'\n'),
                    Some(b'r') => out.push(b'\r'),
                    Some(b't') => out.push(b'\t'),
                    Some(b'b') => out.push(0x08),
                    Some(b'f') => out.push(0x0c),
                    Some(b'(') => out.push(b'('),
                    Some(b')') => out.push(b')'),
                    Some(b'\\') => out.push(b'\\'),
                    Some(b'\r') => {
                        // \<CR> or \<CR><LF> line continuation: swallowed entirely.
                        if self.peek() == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    Some(b'\n') => {}
                    Some(d @ b'0'..=b'7') => {
                        let mut val = (d - b'0') as u32;
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d2 @ b'0'..=b'7') => {
                                    val = val * 8 + (d2 - b'0') as u32;
                                    self.pos += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((val & 0xff) as u8);
                    }
                    Some(other) => out.push(other),
                    None => break,
                },
                _ => out.push(b),
            }
        }
        Token::String(out)
    }

    fn read_hex_string(&mut self) -> Token {
        self.pos += 1; // consume the '<'
        let mut nibbles = Vec::new();
        while let Some(b) = self.getc() {
            if b == b'>' {
                break;
            }
            if is_whitespace(b) {
                continue;
            }
            if let Some(v) = hex_digit(b) {
                nibbles.push(v);
            }
        }
        if nibbles.len() % 2 == 1 {
            // An odd trailing nibble is treated as the high nibble of a zero low nibble.
            nibbles.push(0);
        }
        let bytes = nibbles.chunks(2).map(|c| (c[0] << 4) | c[1]).collect();
        Token::String(bytes)
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn hex_pair(h1: u8, h2: u8) -> Option<u8> {
    Some((hex_digit(h1)? << 4) | hex_digit(h2)?)
}
