//! Selector grammar.
//!
//! ```text
//! list      := ws* complex (ws* ',' ws* complex)* ws*
//! complex   := compound (combinator compound)*
//! combinator:= ws* '>' ws* | ws+
//! compound  := ('*' | ident)? condition*          (at least one part)
//! condition := '#' ident | '.' ident | attribute | ':not(' ws* compound ws* ')'
//! attribute := '[' ws* attr-name ws* ('=' ws* value ws*)? ']'
//! ```

use winnow::{
    Parser as _,
    ascii::{multispace0, multispace1},
    combinator::{alt, cut_err, delimited, opt, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode, ModalResult},
    token::take_while,
};

use umbra_core::{
    name::Name,
    selector::{Combinator, ComplexSelector, CompoundSelector, Condition, SelectorList},
};

use crate::error::ParseError;

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn is_attr_name_char(c: char) -> bool {
    is_ident_char(c) || c == ':'
}

fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., is_ident_char).parse_next(input)
}

fn quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        delimited('"', take_while(0.., |c: char| c != '"'), '"'),
        delimited('\'', take_while(0.., |c: char| c != '\''), '\''),
    ))
    .parse_next(input)
}

fn attribute_value<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        quoted,
        take_while(1.., |c: char| !c.is_whitespace() && c != ']'),
    ))
    .parse_next(input)
}

fn attribute(input: &mut &str) -> ModalResult<Condition> {
    let (name, value) = delimited(
        ('[', multispace0),
        cut_err((
            terminated(take_while(1.., is_attr_name_char), multispace0),
            opt(preceded(
                ('=', multispace0),
                terminated(attribute_value, multispace0),
            )),
        )),
        cut_err(']'),
    )
    .parse_next(input)?;

    Ok(Condition::Attribute {
        name: Name::new(name),
        value: value.map(str::to_string),
    })
}

fn negation(input: &mut &str) -> ModalResult<Condition> {
    preceded(
        ":not(",
        cut_err(terminated(
            delimited(multispace0, compound, multispace0),
            ')',
        )),
    )
    .map(|inner| Condition::Not(Box::new(inner)))
    .parse_next(input)
}

fn condition(input: &mut &str) -> ModalResult<Condition> {
    alt((
        preceded('#', cut_err(ident)).map(|id: &str| Condition::Id(id.to_string())),
        preceded('.', cut_err(ident)).map(|class: &str| Condition::Class(class.to_string())),
        attribute,
        negation,
    ))
    .parse_next(input)
}

fn element(input: &mut &str) -> ModalResult<Option<Name>> {
    alt(('*'.value(None), ident.map(|name: &str| Some(Name::new(name))))).parse_next(input)
}

fn compound(input: &mut &str) -> ModalResult<CompoundSelector> {
    let element = opt(element).parse_next(input)?;
    let conditions: Vec<Condition> = repeat(0.., condition).parse_next(input)?;

    if element.is_none() && conditions.is_empty() {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    Ok(CompoundSelector {
        element: element.flatten(),
        conditions,
    })
}

fn combinator(input: &mut &str) -> ModalResult<Combinator> {
    alt((
        delimited(multispace0, '>', multispace0).value(Combinator::Child),
        multispace1.value(Combinator::Descendant),
    ))
    .parse_next(input)
}

fn complex(input: &mut &str) -> ModalResult<ComplexSelector> {
    let first = compound.parse_next(input)?;
    let rest: Vec<(Combinator, CompoundSelector)> =
        repeat(0.., (combinator, compound)).parse_next(input)?;

    Ok(rest
        .into_iter()
        .fold(ComplexSelector::new(first), |selector, (combinator, next)| {
            selector.then(combinator, next)
        }))
}

fn selector_list(input: &mut &str) -> ModalResult<SelectorList> {
    delimited(
        multispace0,
        separated(1.., complex, (multispace0, ',', multispace0)),
        multispace0,
    )
    .map(SelectorList)
    .parse_next(input)
}

/// Parses a comma-separated selector list.
///
/// # Errors
///
/// Returns [`ParseError::Selector`] with the byte offset of the first
/// character that could not be parsed.
///
/// # Examples
///
/// ```
/// let list = umbra_parser::parse_selector("svg use:not([cpy]), #a").unwrap();
/// assert_eq!(list.0.len(), 2);
/// assert!(umbra_parser::parse_selector("svg >").is_err());
/// ```
pub fn parse_selector(source: &str) -> Result<SelectorList, ParseError> {
    selector_list.parse(source).map_err(|err| ParseError::Selector {
        selector: source.to_string(),
        offset: err.offset(),
        message: err.inner().to_string(),
    })
}
