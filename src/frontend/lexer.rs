//! Lexer for Glitteral
//!
//! Maximal munch over a sliding candidate window. Every step tests each
//! token class against the window; the window grows while anything still
//! matches (fully or as a viable prefix) and the previous window's full
//! matches are emitted once nothing does. Reserved words win equal-length
//! ties, any other tie is an error.
//!
//! Indentation is significant only while no delimiter is open.

use log::{debug, trace};

use crate::frontend::token::{Keyword, Token, TokenKind, TypeSpecifier};
use crate::utils::{Error, Result, Span};

/// Width of one indentation level, in spaces
pub const INDENTATION_UNIT: usize = 3;

/// Appended to the source so the last token always has a successor
const EOF_SENTINEL: char = '█';

/// Characters that make up operator identifiers such as `+` or `≤`
const OPERATOR_CHARS: &[char] = &[
    '+', '−', '⋅', '÷', '=', '≠', '<', '>', '≤', '≥', '∧', '∨', '¬', '*', '/', '%',
];

/// Extra characters allowed after the first letter of a word identifier
const IDENTIFIER_PUNCTUATION: &[char] = &['_', '-', '!', '?'];

/// A token class the lexer can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Token(TokenKind),
    /// Newline plus indentation; becomes zero or more Indent/Dedent tokens
    Indentation,
}

impl Class {
    fn is_reserved(&self) -> bool {
        match self {
            Class::Token(kind) => kind.is_reserved(),
            Class::Indentation => false,
        }
    }

    fn name(&self) -> String {
        match self {
            Class::Token(kind) => format!("{:?}", kind),
            Class::Indentation => "Indentation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recognition {
    Full,
    Prefix,
}

/// One class's verdict on the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sighting {
    Full(Class),
    Prefix(Class),
}

/// Every class the lexer tests, in a fixed order
fn classes() -> Vec<Class> {
    let mut classes: Vec<Class> = Keyword::ALL
        .into_iter()
        .map(|keyword| Class::Token(TokenKind::Keyword(keyword)))
        .collect();
    classes.extend(
        TypeSpecifier::ALL
            .into_iter()
            .map(|specifier| Class::Token(TokenKind::TypeSpecifier(specifier))),
    );
    classes.extend(
        [
            TokenKind::BooleanLiteral,
            TokenKind::VoidLiteral,
            TokenKind::Identifier,
            TokenKind::IntegerLiteral,
            TokenKind::FloatLiteral,
            TokenKind::StringLiteral,
            TokenKind::InternLiteral,
            TokenKind::OpenParenthesis,
            TokenKind::CloseParenthesis,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::OpenBrace,
            TokenKind::CloseBrace,
            TokenKind::Pipe,
            TokenKind::Semicolon,
            TokenKind::Arrow,
            TokenKind::Dash,
            TokenKind::Comment,
            TokenKind::EndOfFile,
        ]
        .into_iter()
        .map(Class::Token),
    );
    classes.push(Class::Indentation);
    classes
}

// ==================== Recognizers ====================

fn exact(word: &str, candidate: &str) -> Option<Recognition> {
    if candidate == word {
        Some(Recognition::Full)
    } else if word.starts_with(candidate) {
        Some(Recognition::Prefix)
    } else {
        None
    }
}

fn identifier(candidate: &str) -> Option<Recognition> {
    let mut chars = candidate.chars();
    let first = chars.next()?;
    let word = first.is_alphabetic()
        && chars.all(|c| c.is_alphanumeric() || IDENTIFIER_PUNCTUATION.contains(&c));
    let operator = candidate.chars().all(|c| OPERATOR_CHARS.contains(&c));
    (word || operator).then_some(Recognition::Full)
}

fn integer(candidate: &str) -> Option<Recognition> {
    candidate
        .chars()
        .all(|c| c.is_ascii_digit())
        .then_some(Recognition::Full)
}

fn float(candidate: &str) -> Option<Recognition> {
    let (whole, fraction) = match candidate.split_once('.') {
        Some(parts) => parts,
        None => {
            return candidate
                .chars()
                .all(|c| c.is_ascii_digit())
                .then_some(Recognition::Prefix)
        }
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if fraction.is_empty() {
        Some(Recognition::Prefix)
    } else {
        Some(Recognition::Full)
    }
}

fn quoted(quote: char, candidate: &str) -> Option<Recognition> {
    let rest = candidate.strip_prefix(quote)?;
    if rest.contains(EOF_SENTINEL) {
        return None;
    }
    match rest.find(quote) {
        None => Some(Recognition::Prefix),
        Some(index) if index + quote.len_utf8() == rest.len() => Some(Recognition::Full),
        Some(_) => None,
    }
}

fn comment(candidate: &str) -> Option<Recognition> {
    let body = candidate.strip_prefix('#')?;
    (!body.contains('\n') && !body.contains(EOF_SENTINEL)).then_some(Recognition::Full)
}

/// Newline followed by groups of [`INDENTATION_UNIT`] spaces. Blank lines
/// before the final one are absorbed, and so is a final comment line.
fn indentation(candidate: &str, undelimited: bool) -> Option<Recognition> {
    let lines = match candidate.strip_prefix('\n') {
        Some(lines) if undelimited && !lines.contains(EOF_SENTINEL) => lines,
        _ => return None,
    };
    let mut lines = lines.split('\n');
    let last = lines.next_back().unwrap_or("");
    if !lines.all(is_blank_line) {
        return None;
    }
    if is_comment_line(last) {
        return Some(Recognition::Full);
    }
    if !last.chars().all(|c| c == ' ') {
        return None;
    }
    if last.len() % INDENTATION_UNIT == 0 {
        Some(Recognition::Full)
    } else {
        Some(Recognition::Prefix)
    }
}

/// Spaces, optionally followed by a comment
fn is_blank_line(line: &str) -> bool {
    let rest = line.trim_start_matches(' ');
    rest.is_empty() || rest.starts_with('#')
}

fn is_comment_line(line: &str) -> bool {
    line.trim_start_matches(' ').starts_with('#')
}

/// Spaces after the last newline of an indentation fragment
fn trailing_width(fragment: &str) -> usize {
    let last_line = fragment.rsplit('\n').next().unwrap_or("");
    last_line.chars().take_while(|&c| c == ' ').count()
}

fn recognize(class: Class, candidate: &str, undelimited: bool) -> Option<Recognition> {
    let kind = match class {
        Class::Indentation => return indentation(candidate, undelimited),
        Class::Token(kind) => kind,
    };
    match kind {
        TokenKind::Identifier => identifier(candidate),
        TokenKind::IntegerLiteral => integer(candidate),
        TokenKind::FloatLiteral => float(candidate),
        TokenKind::StringLiteral => quoted('"', candidate),
        TokenKind::InternLiteral => quoted('\'', candidate),
        TokenKind::BooleanLiteral => {
            exact("Truth", candidate).or_else(|| exact("Falsity", candidate))
        }
        TokenKind::Comment => comment(candidate),
        TokenKind::Indent | TokenKind::Dedent => None,
        _ => kind.spelling().and_then(|word| exact(word, candidate)),
    }
}

// ==================== Lexer ====================

/// The lexer state
pub struct Lexer {
    /// Source code plus the end-of-file sentinel
    source: Vec<char>,
    /// Classes tested against every window
    classes: Vec<Class>,
    /// Currently open delimiters, innermost last
    delimiters: Vec<TokenKind>,
    /// Indentation depth, in units
    indentation_level: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        let mut chars: Vec<char> = source.chars().collect();
        chars.push(EOF_SENTINEL);
        Self {
            source: chars,
            classes: classes(),
            delimiters: Vec::new(),
            indentation_level: 0,
            tokens: Vec::new(),
        }
    }

    /// Current indentation depth, in units
    pub fn indentation_level(&self) -> usize {
        self.indentation_level
    }

    /// True while no delimiter is open
    pub fn is_undelimited(&self) -> bool {
        self.delimiters.is_empty()
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    /// Classes that match or partially match `candidate`
    fn sight(&self, candidate: &str) -> Vec<Sighting> {
        let undelimited = self.is_undelimited();
        self.classes
            .iter()
            .filter_map(|&class| match recognize(class, candidate, undelimited)? {
                Recognition::Full => Some(Sighting::Full(class)),
                Recognition::Prefix => Some(Sighting::Prefix(class)),
            })
            .collect()
    }

    /// Pick the class to emit from the last non-empty sight
    fn resolve(&self, sight: &[Sighting], candidate: &str, fragment: &str, span: Span) -> Result<Class> {
        let full: Vec<Class> = sight
            .iter()
            .filter_map(|sighting| match sighting {
                Sighting::Full(class) => Some(*class),
                Sighting::Prefix(_) => None,
            })
            .collect();

        match full.as_slice() {
            [class] => Ok(*class),
            // Trailing spaces before the end of file; nothing follows to indent
            [] if sight.contains(&Sighting::Prefix(Class::Indentation)) && candidate.ends_with(EOF_SENTINEL) => {
                Ok(Class::Indentation)
            }
            [] if sight.contains(&Sighting::Prefix(Class::Indentation)) => Err(Error::Indentation {
                width: trailing_width(fragment),
                unit: INDENTATION_UNIT,
                span,
            }),
            [] => Err(Error::Untokenizable {
                fragment: candidate.to_string(),
                span,
            }),
            _ => {
                let reserved: Vec<Class> = full.iter().copied().filter(Class::is_reserved).collect();
                if let [class] = reserved.as_slice() {
                    return Ok(*class);
                }
                let tied = if reserved.is_empty() { &full } else { &reserved };
                Err(Error::AmbiguousToken {
                    fragment: fragment.to_string(),
                    candidates: tied.iter().map(Class::name).collect(),
                    span,
                })
            }
        }
    }

    /// Skip insignificant whitespace starting at `position`
    fn skip_whitespace(&self, mut position: usize) -> usize {
        let undelimited = self.is_undelimited();
        while let Some(&c) = self.source.get(position) {
            let insignificant = c == ' ' || (!undelimited && (c == '\t' || c == '\n'));
            if !insignificant {
                break;
            }
            position += 1;
        }
        position
    }

    fn track_delimiters(&mut self, kind: TokenKind) {
        match self.delimiters.last() {
            Some(top) if kind.is_close_delimiter() && top.opposite() == Some(kind) => {
                self.delimiters.pop();
            }
            _ if kind.is_open_delimiter() => self.delimiters.push(kind),
            _ => {}
        }
    }

    fn indent(&mut self, count: usize, span: Span) {
        for _ in 0..count {
            self.tokens.push(Token::new(TokenKind::Indent, "", span));
        }
        self.indentation_level += count;
    }

    fn dedent(&mut self, count: usize, span: Span) -> Result<()> {
        self.indentation_level = self
            .indentation_level
            .checked_sub(count)
            .ok_or(Error::DedentPastMargin { span })?;
        for _ in 0..count {
            self.tokens.push(Token::new(TokenKind::Dedent, "", span));
        }
        Ok(())
    }

    fn change_indentation(&mut self, fragment: &str, span: Span) -> Result<()> {
        let last_line = fragment.rsplit('\n').next().unwrap_or("");
        let at_end_of_file = span.end + 1 == self.source.len();
        if is_comment_line(last_line) || at_end_of_file {
            return Ok(());
        }
        let width = trailing_width(fragment);
        if width % INDENTATION_UNIT != 0 {
            return Err(Error::Indentation {
                width,
                unit: INDENTATION_UNIT,
                span,
            });
        }
        let level = width / INDENTATION_UNIT;
        if level > self.indentation_level {
            self.indent(level - self.indentation_level, span);
        } else if level < self.indentation_level {
            self.dedent(self.indentation_level - level, span)?;
        }
        Ok(())
    }

    /// Emit the match for `class`; returns true once end of file is reached
    fn chomp(&mut self, class: Class, fragment: String, span: Span) -> Result<bool> {
        debug!("chomping {} {:?}", class.name(), fragment);
        match class {
            Class::Indentation => self.change_indentation(&fragment, span)?,
            Class::Token(TokenKind::Comment) => {}
            Class::Token(TokenKind::EndOfFile) => {
                if span.end != self.source.len() {
                    return Err(Error::Untokenizable { fragment, span });
                }
                let open = self.indentation_level;
                self.dedent(open, span)?;
                return Ok(true);
            }
            Class::Token(kind) => {
                self.track_delimiters(kind);
                self.tokens.push(Token::new(kind, fragment, span));
            }
        }
        Ok(false)
    }

    /// Tokenize the entire source. Comments and the end-of-file sentinel are
    /// not part of the result.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut start = self.skip_whitespace(0);
        let mut end = start + 1;
        let mut sight: Vec<Sighting> = Vec::new();
        let mut finished = false;

        while end <= self.source.len() {
            let candidate = self.text(start, end);
            let premonition = self.sight(&candidate);
            trace!("window {}..{} {:?}: {:?}", start, end, candidate, premonition);
            if !premonition.is_empty() {
                sight = premonition;
                end += 1;
                continue;
            }

            let fragment = self.text(start, end - 1);
            let class = self.resolve(&sight, &candidate, &fragment, Span::new(start, end))?;
            if self.chomp(class, fragment, Span::new(start, end - 1))? {
                finished = true;
                break;
            }
            start = self.skip_whitespace(end - 1);
            end = start + 1;
            sight.clear();
        }

        // The window ran into the end of the buffer: only the sentinel can
        // still be pending.
        if !finished {
            let fragment = self.text(start, self.source.len());
            let class = self.resolve(&sight, &fragment, &fragment, Span::new(start, self.source.len()))?;
            self.chomp(class, fragment, Span::new(start, self.source.len()))?;
        }

        Ok(std::mem::take(&mut self.tokens))
    }
}

/// Tokenize `source` with a fresh lexer
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .expect("source should tokenize")
            .into_iter()
            .map(|token| (token.kind, token.text))
            .collect()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|(kind, _)| kind).collect()
    }

    fn tok(kind: TokenKind, text: &str) -> (TokenKind, String) {
        (kind, text.to_string())
    }

    #[test]
    fn test_token_matching() {
        let legitimates = [
            ("robot", TokenKind::Identifier),
            ("\"romance\"", TokenKind::StringLiteral),
            ("'rocketry'", TokenKind::InternLiteral),
            ("2015", TokenKind::IntegerLiteral),
            ("20.15", TokenKind::FloatLiteral),
            ("^int", TokenKind::TypeSpecifier(TypeSpecifier::Integer)),
        ];
        for (source, kind) in legitimates {
            assert_eq!(kinds(source), vec![kind], "tokenizing {:?}", source);
        }
    }

    #[test]
    fn test_tokenize_codeform() {
        assert_eq!(
            lex("(foo ^str 'bar' \"quux\" 3)"),
            vec![
                tok(TokenKind::OpenParenthesis, "("),
                tok(TokenKind::Identifier, "foo"),
                tok(TokenKind::TypeSpecifier(TypeSpecifier::String), "^str"),
                tok(TokenKind::InternLiteral, "'bar'"),
                tok(TokenKind::StringLiteral, "\"quux\""),
                tok(TokenKind::IntegerLiteral, "3"),
                tok(TokenKind::CloseParenthesis, ")"),
            ]
        );
    }

    #[test]
    fn test_longest_match() {
        assert_eq!(kinds(":=λ"), vec![TokenKind::Keyword(Keyword::DefLambda)]);
        assert_eq!(kinds(":="), vec![TokenKind::Keyword(Keyword::Def)]);
        assert_eq!(kinds("_:="), vec![TokenKind::Keyword(Keyword::SubscriptDef)]);
        assert_eq!(kinds("iffy"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("Truthy"), vec![TokenKind::Identifier]);
        assert_eq!(kinds("12.5"), vec![TokenKind::FloatLiteral]);
        assert_eq!(kinds("≤"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn test_reserved_words_win_ties() {
        assert_eq!(kinds("if"), vec![TokenKind::Keyword(Keyword::If)]);
        assert_eq!(kinds("while"), vec![TokenKind::Keyword(Keyword::While)]);
        assert_eq!(kinds("Truth"), vec![TokenKind::BooleanLiteral]);
        assert_eq!(kinds("Void"), vec![TokenKind::VoidLiteral]);
    }

    #[test]
    fn test_resolve_priority_and_ties() {
        let lexer = Lexer::new("");
        let span = Span::new(0, 2);
        let reserved = [
            Sighting::Full(Class::Token(TokenKind::Identifier)),
            Sighting::Full(Class::Token(TokenKind::Keyword(Keyword::If))),
        ];
        assert_eq!(
            lexer.resolve(&reserved, "if ", "if", span),
            Ok(Class::Token(TokenKind::Keyword(Keyword::If)))
        );

        let tied = [
            Sighting::Full(Class::Token(TokenKind::Identifier)),
            Sighting::Full(Class::Token(TokenKind::IntegerLiteral)),
        ];
        match lexer.resolve(&tied, "x ", "x", span) {
            Err(Error::AmbiguousToken { candidates, .. }) => {
                assert_eq!(candidates, vec!["Identifier", "IntegerLiteral"]);
            }
            other => panic!("expected an ambiguity error, got {:?}", other),
        }
    }

    #[test]
    fn test_untokenizable() {
        assert!(matches!(
            tokenize("(foo @)"),
            Err(Error::Untokenizable { ref fragment, .. }) if fragment == "@"
        ));
        assert!(matches!(tokenize("\"unterminated"), Err(Error::Untokenizable { .. })));
    }

    #[test]
    fn test_commentary() {
        assert_eq!(
            lex("foo # This is a comment.\n2"),
            vec![tok(TokenKind::Identifier, "foo"), tok(TokenKind::IntegerLiteral, "2")]
        );
        assert_eq!(lex("# only a comment"), vec![]);
    }

    #[test]
    fn test_indentation_round_trip() {
        let source = "do —\n   do —\n      do —\n         (f)\n(g)";
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize().unwrap();
        let indents: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TokenKind::Indent)
            .map(|(i, _)| i)
            .collect();
        let dedents: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TokenKind::Dedent)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(indents.len(), 3);
        assert_eq!(dedents.len(), 3);
        assert!(indents.iter().max() < dedents.iter().min());
        assert_eq!(lexer.indentation_level(), 0);
    }

    #[test]
    fn test_dedents_flushed_at_end_of_file() {
        let mut lexer = Lexer::new("when Truth —\n   (f)");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Dedent));
        assert_eq!(lexer.indentation_level(), 0);
    }

    #[test]
    fn test_blank_lines_do_not_dedent() {
        assert_eq!(
            kinds("do —\n   (f)\n\n   (g)\n"),
            vec![
                TokenKind::Keyword(Keyword::Do),
                TokenKind::Dash,
                TokenKind::Indent,
                TokenKind::OpenParenthesis,
                TokenKind::Identifier,
                TokenKind::CloseParenthesis,
                TokenKind::OpenParenthesis,
                TokenKind::Identifier,
                TokenKind::CloseParenthesis,
                TokenKind::Dedent,
            ]
        );
    }

    #[test]
    fn test_comment_lines_do_not_change_indentation() {
        let block = vec![
            TokenKind::Keyword(Keyword::Do),
            TokenKind::Dash,
            TokenKind::Indent,
            TokenKind::OpenParenthesis,
            TokenKind::Identifier,
            TokenKind::CloseParenthesis,
            TokenKind::OpenParenthesis,
            TokenKind::Identifier,
            TokenKind::CloseParenthesis,
            TokenKind::Dedent,
        ];
        assert_eq!(kinds("do —\n   (f)\n# note\n   (g)"), block);
        assert_eq!(kinds("do —\n   (f)\n      # deeper\n  # odd\n   (g)\n# trailing"), block);
    }

    #[test]
    fn test_trailing_spaces_at_end_of_file() {
        assert_eq!(
            kinds("do —\n   (f)\n  "),
            vec![
                TokenKind::Keyword(Keyword::Do),
                TokenKind::Dash,
                TokenKind::Indent,
                TokenKind::OpenParenthesis,
                TokenKind::Identifier,
                TokenKind::CloseParenthesis,
                TokenKind::Dedent,
            ]
        );
    }

    #[test]
    fn test_delimited_indentation_is_inert() {
        let tokens = kinds("(foo\n      bar\n  baz\n\tquux)\n[1\n 2]");
        assert!(!tokens.contains(&TokenKind::Indent));
        assert!(!tokens.contains(&TokenKind::Dedent));
        assert_eq!(tokens.len(), 10);
    }

    #[test]
    fn test_pipes_are_self_opposite() {
        let mut lexer = Lexer::new("|i a|");
        lexer.tokenize().unwrap();
        assert!(lexer.is_undelimited());

        let mut lexer = Lexer::new("(f [1 |2");
        lexer.tokenize().unwrap();
        assert!(!lexer.is_undelimited());
    }

    #[test]
    fn test_indentation_not_a_multiple_of_unit() {
        match tokenize("when Truth —\n  (f)") {
            Err(Error::Indentation { width, unit, .. }) => {
                assert_eq!(width, 2);
                assert_eq!(unit, INDENTATION_UNIT);
            }
            other => panic!("expected an indentation error, got {:?}", other),
        }
        assert!(matches!(
            tokenize("do —\n    (f)"),
            Err(Error::Indentation { width: 4, .. })
        ));
    }

    #[test]
    fn test_for_header() {
        assert_eq!(
            kinds("for |i a|—\n   (println a)"),
            vec![
                TokenKind::Keyword(Keyword::For),
                TokenKind::Pipe,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Pipe,
                TokenKind::Dash,
                TokenKind::Indent,
                TokenKind::OpenParenthesis,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::CloseParenthesis,
                TokenKind::Dedent,
            ]
        );
    }
}
