//! Parser for Glitteral
//!
//! Recursive descent over a peekable token stream. The parser is an
//! iterator of top-level nodes; it stops for good after the first error.

use std::iter::Peekable;
use std::vec::IntoIter;

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::token::{Keyword, Token, TokenKind, TypeSpecifier};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    failed: bool,
}

impl Parser {
    /// Create a parser from tokenized input
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
            failed: false,
        }
    }

    // ==================== Helper Methods ====================

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.tokens.peek().map(|token| token.kind)
    }

    fn advance(&mut self, expected: &str) -> Result<Token> {
        self.tokens.next().ok_or_else(|| Error::UnexpectedEnd {
            expected: expected.to_string(),
        })
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        let token = self.advance(expected)?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(expected, &token))
        }
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    // ==================== Parsing Methods ====================

    /// Parse one expression, dispatching on its leading token
    pub fn parse_expression(&mut self) -> Result<Node> {
        let leading = self.advance("expression")?;
        match leading.kind {
            TokenKind::Keyword(keyword) => self.parse_keyword_form(keyword, leading.span),
            TokenKind::OpenParenthesis => self.parse_application(leading.span),
            TokenKind::OpenBracket => self.parse_sequential(SequentialKind::List, leading.span),
            TokenKind::Pipe => self.parse_sequential(SequentialKind::Vector, leading.span),
            TokenKind::OpenBrace => self.parse_associative(leading.span),
            _ => parse_atom(leading),
        }
    }

    fn parse_keyword_form(&mut self, keyword: Keyword, start: Span) -> Result<Node> {
        debug!("parsing {} form", keyword.as_str());
        let kind = match keyword {
            Keyword::If => self.parse_conditional()?,
            Keyword::When => {
                let condition = self.parse_expression()?;
                let body = self.parse_dashed_block("when")?;
                NodeKind::SingleBranchConditional {
                    condition: Box::new(condition),
                    body,
                }
            }
            Keyword::Def => {
                let identifier = self.parse_identifier("definition")?;
                let value = self.parse_expression()?;
                NodeKind::Definition {
                    identifier: Box::new(identifier),
                    value: Box::new(value),
                }
            }
            Keyword::SubscriptDef => NodeKind::SubscriptAssignment {
                collection: Box::new(self.parse_expression()?),
                key: Box::new(self.parse_expression()?),
                value: Box::new(self.parse_expression()?),
            },
            Keyword::DefLambda => self.parse_named_function_definition()?,
            Keyword::Do => NodeKind::DoBlock {
                body: self.parse_dashed_block("do block")?,
            },
            Keyword::For => self.parse_determinate_iteration()?,
            Keyword::While => {
                let condition = self.parse_expression()?;
                let body = self.parse_dashed_block("while loop")?;
                NodeKind::IndeterminateIteration {
                    condition: Box::new(condition),
                    body,
                }
            }
        };
        Ok(Node::new(kind, start))
    }

    /// condition — Indent consequent [alternative] Dedent
    fn parse_conditional(&mut self) -> Result<NodeKind> {
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Dash, "— after the condition of a conditional")?;
        self.expect(TokenKind::Indent, "indented consequent")?;
        let consequent = self.parse_expression()?;
        let alternative = if self.check(TokenKind::Dedent) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        let closing = self.advance("Dedent closing the conditional")?;
        if closing.kind != TokenKind::Dedent {
            return Err(Error::MalformedForm {
                construct: "conditional".to_string(),
                found: format!("more than two branches (next is {})", closing),
                span: closing.span,
            });
        }
        Ok(NodeKind::Conditional {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternative,
        })
    }

    /// name |arg ^type ...| → ^type Indent body Dedent
    fn parse_named_function_definition(&mut self) -> Result<NodeKind> {
        let name = self.parse_identifier("named function definition")?;
        let signature = self.parse_expression()?;
        let elements = match signature.kind {
            NodeKind::Sequential { elements, .. } => elements,
            _ => {
                return Err(Error::MalformedForm {
                    construct: "named function definition".to_string(),
                    found: format!("{} where the argument list belongs", signature.describe()),
                    span: signature.span,
                })
            }
        };
        if elements.len() % 2 != 0 {
            return Err(Error::MalformedForm {
                construct: "named function definition".to_string(),
                found: format!("{} argument list elements, not name/type pairs", elements.len()),
                span: signature.span,
            });
        }

        let mut arguments = Vec::new();
        let mut pairs = elements.into_iter();
        while let (Some(name_node), Some(type_node)) = (pairs.next(), pairs.next()) {
            arguments.push(argument(name_node, type_node)?);
        }

        self.expect(TokenKind::Arrow, "→ before the return type")?;
        let return_type = self.parse_type_specifier("return type")?;
        let body = self.parse_block("named function definition")?;
        Ok(NodeKind::NamedFunctionDefinition {
            name: Box::new(name),
            arguments,
            return_type,
            body,
        })
    }

    /// |index iterable|— Indent body Dedent
    fn parse_determinate_iteration(&mut self) -> Result<NodeKind> {
        let bindings = self.parse_expression()?;
        let span = bindings.span;
        let elements = match bindings.kind {
            NodeKind::Sequential { elements, .. } => elements,
            _ => {
                return Err(Error::MalformedForm {
                    construct: "determinate iteration".to_string(),
                    found: format!("{} where |index iterable| belongs", bindings.describe()),
                    span,
                })
            }
        };
        let [index_identifier, iterable]: [Node; 2] =
            elements.try_into().map_err(|elements: Vec<Node>| Error::MalformedForm {
                construct: "determinate iteration".to_string(),
                found: format!("{} bindings instead of an index and an iterable", elements.len()),
                span,
            })?;
        if index_identifier.identifier_name().is_none() {
            return Err(Error::MalformedForm {
                construct: "determinate iteration".to_string(),
                found: format!("{} as the loop index", index_identifier.describe()),
                span: index_identifier.span,
            });
        }
        let body = self.parse_dashed_block("determinate iteration")?;
        Ok(NodeKind::DeterminateIteration {
            index_identifier: Box::new(index_identifier),
            iterable: Box::new(iterable),
            body,
        })
    }

    /// — Indent body Dedent
    fn parse_dashed_block(&mut self, construct: &str) -> Result<Vec<Node>> {
        self.expect(TokenKind::Dash, &format!("— introducing the {} body", construct))?;
        self.parse_block(construct)
    }

    /// Indent expression... Dedent
    fn parse_block(&mut self, construct: &str) -> Result<Vec<Node>> {
        self.expect(TokenKind::Indent, &format!("indented {} body", construct))?;
        let mut body = Vec::new();
        while !self.check(TokenKind::Dedent) {
            if self.peek_kind().is_none() {
                return Err(Error::UnexpectedEnd {
                    expected: format!("Dedent closing the {} body", construct),
                });
            }
            body.push(self.parse_expression()?);
        }
        self.advance("Dedent")?;
        if body.is_empty() {
            return Err(Error::UnexpectedEnd {
                expected: format!("{} body", construct),
            });
        }
        Ok(body)
    }

    /// (function argument...)
    fn parse_application(&mut self, start: Span) -> Result<Node> {
        if self.check(TokenKind::CloseParenthesis) {
            let close = self.advance(")")?;
            return Err(Error::MalformedForm {
                construct: "application".to_string(),
                found: "an empty pair of parentheses".to_string(),
                span: start.merge(&close.span),
            });
        }
        let function = self.parse_expression()?;
        if function.identifier_name().is_none() {
            return Err(Error::MalformedForm {
                construct: "application".to_string(),
                found: format!("{} in function position", function.describe()),
                span: function.span,
            });
        }
        let (arguments, end) = self.parse_until(TokenKind::CloseParenthesis, "application")?;
        Ok(Node::new(
            NodeKind::Application {
                function: Box::new(function),
                arguments,
            },
            start.merge(&end),
        ))
    }

    /// [element...] or |element...|
    fn parse_sequential(&mut self, kind: SequentialKind, start: Span) -> Result<Node> {
        let closer = match kind {
            SequentialKind::List => TokenKind::CloseBracket,
            SequentialKind::Vector => TokenKind::Pipe,
        };
        let (elements, end) = self.parse_until(closer, "sequential")?;
        Ok(Node::new(NodeKind::Sequential { kind, elements }, start.merge(&end)))
    }

    /// {key value; ...} or {{key value; ...}}
    fn parse_associative(&mut self, start: Span) -> Result<Node> {
        let kind = if self.check(TokenKind::OpenBrace) {
            self.advance("{")?;
            AssociativeKind::Hashtable
        } else {
            AssociativeKind::Dictionary
        };
        let mut associations = Vec::new();
        while !self.check(TokenKind::CloseBrace) {
            let key = self.parse_expression()?;
            let value = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "; after an association")?;
            associations.push((key, value));
        }
        let mut end = self.advance("}")?.span;
        if kind == AssociativeKind::Hashtable {
            end = self.expect(TokenKind::CloseBrace, "}} closing a hashtable")?.span;
        }
        Ok(Node::new(
            NodeKind::Associative {
                kind,
                associations,
                identifier: None,
            },
            start.merge(&end),
        ))
    }

    /// Expressions up to and including `closer`
    fn parse_until(&mut self, closer: TokenKind, construct: &str) -> Result<(Vec<Node>, Span)> {
        let mut nodes = Vec::new();
        loop {
            match self.peek_kind() {
                Some(kind) if kind == closer => {
                    let close = self.advance(construct)?;
                    return Ok((nodes, close.span));
                }
                Some(_) => nodes.push(self.parse_expression()?),
                None => {
                    return Err(Error::UnexpectedEnd {
                        expected: format!("{:?} closing the {}", closer, construct),
                    })
                }
            }
        }
    }

    fn parse_identifier(&mut self, construct: &str) -> Result<Node> {
        let node = self.parse_expression()?;
        if node.identifier_name().is_none() {
            return Err(Error::MalformedForm {
                construct: construct.to_string(),
                found: format!("{} where an identifier belongs", node.describe()),
                span: node.span,
            });
        }
        Ok(node)
    }

    fn parse_type_specifier(&mut self, expected: &str) -> Result<TypeSpecifier> {
        let token = self.advance(expected)?;
        match token.kind {
            TokenKind::TypeSpecifier(specifier) => Ok(specifier),
            _ => Err(unexpected(expected, &token)),
        }
    }
}

impl Iterator for Parser {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.tokens.peek()?;
        let parsed = self.parse_expression();
        self.failed = parsed.is_err();
        Some(parsed)
    }
}

fn unexpected(expected: &str, token: &Token) -> Error {
    Error::UnexpectedToken {
        expected: expected.to_string(),
        got: token.to_string(),
        span: token.span,
    }
}

/// Pair an argument name with its type specifier
fn argument(name: Node, type_node: Node) -> Result<Node> {
    let name_text = match name.identifier_name() {
        Some(text) => text.to_string(),
        None => {
            return Err(Error::MalformedForm {
                construct: "argument list".to_string(),
                found: format!("{} where an argument name belongs", name.describe()),
                span: name.span,
            })
        }
    };
    let type_specifier = match type_node.kind {
        NodeKind::Atom(Atom::TypeSpecifier(specifier)) => specifier,
        _ => {
            return Err(Error::MalformedForm {
                construct: "argument list".to_string(),
                found: format!("{} where a type specifier belongs", type_node.describe()),
                span: type_node.span,
            })
        }
    };
    Ok(Node::atom(
        Atom::Argument {
            name: name_text,
            type_specifier,
        },
        name.span.merge(&type_node.span),
    ))
}

/// Classify a non-structural token directly
fn parse_atom(token: Token) -> Result<Node> {
    let invalid = |kind: &str| Error::InvalidLiteral {
        kind: kind.to_string(),
        text: token.text.clone(),
        span: token.span,
    };
    let atom = match token.kind {
        TokenKind::Identifier => Atom::Identifier(token.text.clone()),
        TokenKind::IntegerLiteral => Atom::Integer(token.text.parse().map_err(|_| invalid("integer"))?),
        TokenKind::FloatLiteral => Atom::Float(token.text.parse().map_err(|_| invalid("float"))?),
        TokenKind::StringLiteral | TokenKind::InternLiteral => {
            let quote = if token.kind == TokenKind::StringLiteral { '"' } else { '\'' };
            Atom::String(token.text.trim_matches(quote).to_string())
        }
        TokenKind::BooleanLiteral => Atom::Boolean(token.text == "Truth"),
        TokenKind::VoidLiteral => Atom::Void,
        TokenKind::TypeSpecifier(specifier) => Atom::TypeSpecifier(specifier),
        TokenKind::Dash | TokenKind::Arrow => Atom::Reserved(token.text.clone()),
        _ => return Err(unexpected("expression", &token)),
    };
    Ok(Node::atom(atom, token.span))
}

/// Parse every top-level node of a token stream
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Node>> {
    Parser::new(tokens).collect()
}
