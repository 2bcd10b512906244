//! Minimal Turtle reader for Brick building graphs.
//!
//! This is not a general RDF engine: it reads the subset of Turtle the
//! building files use — prefix declarations, `a` as `rdf:type`,
//! predicate lists with `;`, object lists with `,`, typed and plain
//! literals, and anonymous blank-node property lists (used for
//! `brick:hasArea [ brick:value ... ]`).

use brickwise_core::{BrickError, Result};
use std::collections::HashMap;
use std::fmt;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// A subject or object position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(String),
    /// Lexical form only; datatype and language tags are dropped.
    Literal(String),
    Blank(String),
}

impl Term {
    /// String value regardless of kind.
    pub fn as_str(&self) -> &str {
        match self {
            Term::Iri(s) | Term::Literal(s) | Term::Blank(s) => s,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub subject: Term,
    /// Always a full IRI.
    pub predicate: String,
    pub object: Term,
}

/// Parse a Turtle document into triples.
pub fn parse(input: &str) -> Result<Vec<Triple>> {
    Parser::new(input).parse_document()
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    prefixes: HashMap<String, String>,
    triples: Vec<Triple>,
    blank_counter: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            prefixes: HashMap::new(),
            triples: Vec::new(),
            blank_counter: 0,
        }
    }

    fn parse_document(mut self) -> Result<Vec<Triple>> {
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                None => break,
                Some('@') => self.parse_directive()?,
                _ => self.parse_statement()?,
            }
        }
        Ok(self.triples)
    }

    fn parse_directive(&mut self) -> Result<()> {
        let word = self.read_bareword();
        match word.as_str() {
            "@prefix" => {
                self.skip_whitespace();
                let name = self.read_bareword();
                let prefix = name
                    .strip_suffix(':')
                    .ok_or_else(|| self.error(&format!("malformed prefix name '{name}'")))?
                    .to_string();
                self.skip_whitespace();
                let iri = self.read_iri()?;
                self.prefixes.insert(prefix, iri);
                self.expect('.')?;
                Ok(())
            }
            "@base" => {
                // Buildings never use relative IRIs; record and move on.
                self.skip_whitespace();
                self.read_iri()?;
                self.expect('.')?;
                Ok(())
            }
            other => Err(self.error(&format!("unsupported directive '{other}'"))),
        }
    }

    fn parse_statement(&mut self) -> Result<()> {
        let subject = self.parse_subject()?;
        self.parse_predicate_object_list(&subject, '.')?;
        self.expect('.')?;
        Ok(())
    }

    fn parse_subject(&mut self) -> Result<Term> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some('<') => Ok(Term::Iri(self.read_iri()?)),
            Some('[') => self.parse_blank_node_property_list(),
            Some('_') => self.read_blank_label(),
            Some(_) => {
                let word = self.read_bareword();
                Ok(Term::Iri(self.expand(&word)?))
            }
            None => Err(self.error("expected subject, found end of input")),
        }
    }

    /// Parse `pred obj, obj ; pred obj ...` up to (not consuming) the
    /// terminator.
    fn parse_predicate_object_list(&mut self, subject: &Term, terminator: char) -> Result<()> {
        loop {
            self.skip_whitespace();
            let predicate = self.parse_predicate()?;
            loop {
                let object = self.parse_object()?;
                self.triples.push(Triple {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
                self.skip_whitespace();
                if self.chars.peek() == Some(&',') {
                    self.chars.next();
                } else {
                    break;
                }
            }
            self.skip_whitespace();
            match self.chars.peek() {
                Some(';') => {
                    self.chars.next();
                    self.skip_whitespace();
                    // A trailing ';' before the terminator is legal.
                    if self.chars.peek() == Some(&terminator) {
                        return Ok(());
                    }
                }
                Some(c) if *c == terminator => return Ok(()),
                Some(c) => {
                    let c = *c;
                    return Err(self.error(&format!("expected ';' or '{terminator}', found '{c}'")));
                }
                None => return Err(self.error("unexpected end of input in predicate list")),
            }
        }
    }

    fn parse_predicate(&mut self) -> Result<String> {
        self.skip_whitespace();
        if self.chars.peek() == Some(&'<') {
            return self.read_iri();
        }
        let word = self.read_bareword();
        if word == "a" {
            return Ok(RDF_TYPE.to_string());
        }
        self.expand(&word)
    }

    fn parse_object(&mut self) -> Result<Term> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some('<') => Ok(Term::Iri(self.read_iri()?)),
            Some('"') => self.read_literal(),
            Some('[') => self.parse_blank_node_property_list(),
            Some('_') => self.read_blank_label(),
            Some(c) if c.is_ascii_digit() || *c == '-' || *c == '+' => {
                let word = self.read_bareword();
                Ok(Term::Literal(word))
            }
            Some(_) => {
                let word = self.read_bareword();
                if word == "true" || word == "false" {
                    return Ok(Term::Literal(word));
                }
                Ok(Term::Iri(self.expand(&word)?))
            }
            None => Err(self.error("expected object, found end of input")),
        }
    }

    fn parse_blank_node_property_list(&mut self) -> Result<Term> {
        self.expect('[')?;
        let node = Term::Blank(format!("_:b{}", self.blank_counter));
        self.blank_counter += 1;
        self.skip_whitespace();
        if self.chars.peek() != Some(&']') {
            self.parse_predicate_object_list(&node, ']')?;
        }
        self.expect(']')?;
        Ok(node)
    }

    fn read_blank_label(&mut self) -> Result<Term> {
        let word = self.read_bareword();
        if !word.starts_with("_:") {
            return Err(self.error(&format!("malformed blank node label '{word}'")));
        }
        Ok(Term::Blank(word))
    }

    fn read_iri(&mut self) -> Result<String> {
        self.expect('<')?;
        let mut iri = String::new();
        for c in self.chars.by_ref() {
            if c == '>' {
                return Ok(iri);
            }
            iri.push(c);
        }
        Err(self.error("unterminated IRI"))
    }

    fn read_literal(&mut self) -> Result<Term> {
        self.expect('"')?;
        let mut value = String::new();
        let mut escaped = false;
        loop {
            let c = self
                .chars
                .next()
                .ok_or_else(|| self.error("unterminated string literal"))?;
            if escaped {
                value.push(match c {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                break;
            } else {
                value.push(c);
            }
        }
        // Datatype and language suffixes are consumed and dropped.
        if self.chars.peek() == Some(&'^') {
            self.chars.next();
            self.expect('^')?;
            if self.chars.peek() == Some(&'<') {
                self.read_iri()?;
            } else {
                self.read_bareword();
            }
        } else if self.chars.peek() == Some(&'@') {
            self.read_bareword();
        }
        Ok(Term::Literal(value))
    }

    fn read_bareword(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, ';' | ',' | ']' | '[' | '<' | '"') {
                break;
            }
            // A bare '.' terminates a statement unless it is inside a
            // number or a local name (e.g. "12.5", "ex:v1.2").
            if c == '.' {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                match lookahead.peek() {
                    Some(n) if !n.is_whitespace() && *n != '#' => {}
                    _ => break,
                }
            }
            word.push(c);
            self.chars.next();
        }
        word
    }

    fn expand(&self, word: &str) -> Result<String> {
        let (prefix, local) = word
            .split_once(':')
            .ok_or_else(|| self.error(&format!("expected a prefixed name, found '{word}'")))?;
        let base = self
            .prefixes
            .get(prefix)
            .ok_or_else(|| self.error(&format!("unknown prefix '{prefix}:'")))?;
        Ok(format!("{base}{local}"))
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(&format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(&format!("expected '{expected}', found end of input"))),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '#' {
                for c in self.chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: &str) -> BrickError {
        BrickError::Tool(format!("Turtle parse error: {message}"))
    }
}
