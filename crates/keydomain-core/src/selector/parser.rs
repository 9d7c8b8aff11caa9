//! Selector parsing using the `cssparser` tokenizer.

use std::str::FromStr;

use cssparser::{ParseError as CssParseError, Parser, ParserInput, Token};

use super::{AttributeSelector, Combinator, PseudoClass, Selector, SelectorPart, TypeSelector};
use crate::error::{DomError, Result};

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

impl Selector {
    /// Parse a single complex selector such as `"#panel > input[name=q]"`.
    ///
    /// Selector lists (`a, b`) are rejected.
    pub fn parse(source: &str) -> Result<Self> {
        let mut input = ParserInput::new(source);
        let mut parser = Parser::new(&mut input);
        parse_selector(source, &mut parser)
    }
}

fn parse_selector<'i>(source: &str, parser: &mut Parser<'i, '_>) -> Result<Selector> {
    let mut parts = vec![];
    let mut combinators = vec![];
    let mut current = SelectorPart::default();
    // Combinator waiting for the part that follows it.
    let mut pending: Option<Combinator> = None;

    parser.skip_whitespace();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };

        let combinator = match &token {
            Token::WhiteSpace(_) => Some(Combinator::Descendant),
            Token::Delim('>') => Some(Combinator::Child),
            Token::Delim('+') => Some(Combinator::AdjacentSibling),
            Token::Delim('~') => Some(Combinator::GeneralSibling),
            _ => None,
        };

        if let Some(combinator) = combinator {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                pending = Some(Combinator::Descendant);
            }
            if combinator == Combinator::Descendant {
                continue;
            }
            match pending {
                None => {
                    return Err(DomError::invalid_selector(
                        source,
                        "combinator without a left-hand selector",
                    ));
                }
                Some(Combinator::Descendant) => pending = Some(combinator),
                Some(_) => {
                    return Err(DomError::invalid_selector(source, "consecutive combinators"));
                }
            }
            continue;
        }

        // A simple selector follows; open a new part if needed.
        if current.is_empty()
            && let Some(c) = pending.take()
        {
            combinators.push(c);
        }

        match token {
            Token::Ident(name) => {
                if !current.is_empty() {
                    return Err(DomError::invalid_selector(
                        source,
                        "type selector must come first in a compound selector",
                    ));
                }
                current.type_selector = Some(TypeSelector::Type(name.to_ascii_lowercase()));
            }

            Token::Delim('*') => {
                if !current.is_empty() {
                    return Err(DomError::invalid_selector(
                        source,
                        "universal selector must come first in a compound selector",
                    ));
                }
                current.type_selector = Some(TypeSelector::Universal);
            }

            Token::Delim('.') => {
                let class = parser
                    .expect_ident()
                    .map_err(|_| DomError::invalid_selector(source, "expected class name after '.'"))?;
                current.classes.push(class.to_string());
            }

            Token::IDHash(id) => {
                if current.id.is_some() {
                    return Err(DomError::invalid_selector(source, "duplicate id selector"));
                }
                current.id = Some(id.to_string());
            }

            Token::SquareBracketBlock => {
                let attribute = parser
                    .parse_nested_block(|p| parse_attribute(p))
                    .map_err(|_: CssParseError<'_, ()>| {
                        DomError::invalid_selector(source, "invalid attribute selector")
                    })?;
                current.attributes.push(attribute);
            }

            Token::Colon => {
                let pseudo = parse_pseudo_class(source, parser)?;
                current.pseudo_classes.push(pseudo);
            }

            Token::Comma => {
                return Err(DomError::invalid_selector(
                    source,
                    "selector lists are not supported",
                ));
            }

            other => {
                return Err(DomError::invalid_selector(
                    source,
                    format!("unexpected token {:?}", other),
                ));
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    } else if matches!(pending, Some(c) if c != Combinator::Descendant) {
        return Err(DomError::invalid_selector(source, "dangling combinator"));
    }

    if parts.is_empty() {
        return Err(DomError::invalid_selector(source, "empty selector"));
    }

    debug_assert_eq!(combinators.len() + 1, parts.len());
    Ok(Selector { parts, combinators })
}

fn parse_pseudo_class<'i>(source: &str, parser: &mut Parser<'i, '_>) -> Result<PseudoClass> {
    let token = parser
        .next_including_whitespace()
        .map_err(|_| DomError::invalid_selector(source, "expected pseudo-class after ':'"))?
        .clone();

    match token {
        Token::Ident(name) => PseudoClass::from_css(&name).ok_or_else(|| {
            DomError::invalid_selector(source, format!("unknown pseudo-class ':{}'", name))
        }),
        Token::Function(name) if name.eq_ignore_ascii_case("not") => {
            let inner = parser
                .parse_nested_block(|p| parse_compound(p))
                .map_err(|_: CssParseError<'_, ()>| {
                    DomError::invalid_selector(source, "invalid :not() argument")
                })?;
            Ok(PseudoClass::Not(Box::new(inner)))
        }
        Token::Function(name) => Err(DomError::invalid_selector(
            source,
            format!("unsupported pseudo-class function ':{}()'", name),
        )),
        _ => Err(DomError::invalid_selector(
            source,
            "expected pseudo-class name after ':'",
        )),
    }
}

/// Parse the body of an attribute selector: `name` or `name=value`.
fn parse_attribute<'i>(
    parser: &mut Parser<'i, '_>,
) -> std::result::Result<AttributeSelector, CssParseError<'i, ()>> {
    let name = parser.expect_ident()?.to_ascii_lowercase();

    if parser.is_exhausted() {
        return Ok(AttributeSelector::present(name));
    }

    parser.expect_delim('=')?;
    let value = match parser.next()?.clone() {
        Token::Ident(v) | Token::QuotedString(v) => v.to_string(),
        Token::Number {
            int_value: Some(i), ..
        } => i.to_string(),
        other => return Err(parser.new_unexpected_token_error(other)),
    };
    parser.expect_exhausted()?;

    Ok(AttributeSelector::equals(name, value))
}

/// Parse a compound selector without combinators (the `:not()` argument).
fn parse_compound<'i>(
    parser: &mut Parser<'i, '_>,
) -> std::result::Result<SelectorPart, CssParseError<'i, ()>> {
    let mut part = SelectorPart::default();

    parser.skip_whitespace();

    loop {
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => break,
        };
        match token {
            Token::Ident(name) => {
                part.type_selector = Some(TypeSelector::Type(name.to_ascii_lowercase()));
            }
            Token::Delim('*') => {
                part.type_selector = Some(TypeSelector::Universal);
            }
            Token::Delim('.') => {
                let class = parser.expect_ident()?;
                part.classes.push(class.to_string());
            }
            Token::IDHash(id) => {
                part.id = Some(id.to_string());
            }
            Token::SquareBracketBlock => {
                let attribute = parser.parse_nested_block(|p| parse_attribute(p))?;
                part.attributes.push(attribute);
            }
            Token::WhiteSpace(_) => {
                parser.expect_exhausted()?;
                break;
            }
            other => return Err(parser.new_unexpected_token_error(other)),
        }
    }

    if part.is_empty() {
        return Err(parser.new_custom_error(()));
    }
    Ok(part)
}
