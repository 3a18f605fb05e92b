//! Lossless-enough BibTeX parser used by the tidy formatter.
//!
//! Unlike a bibliography reader this keeps the shape of every value (braced,
//! quoted, number, macro, concatenation) so tidy can re-render it. Anything
//! that is not a well-formed `@` block is kept as free text.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    IResult,
};

/// One piece of a field value; `#` joins several pieces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePart {
    /// `{content}`
    Braced(String),
    /// `"content"`
    Quoted(String),
    /// Bare digits
    Number(String),
    /// Bare identifier, e.g. a month macro
    Macro(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub name: String,
    pub parts: Vec<ValuePart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub entry_type: String,
    pub key: String,
    pub fields: Vec<RawField>,
}

/// Top-level block of a BibTeX document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Entry(RawEntry),
    /// `@string`, `@preamble` and `@comment` blocks, kept verbatim
    Verbatim(String),
    /// Text outside any block
    Text(String),
}

/// A recoverable parse problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutput {
    pub items: Vec<Item>,
    pub issues: Vec<ParseIssue>,
}

/// Parse a BibTeX document. Never fails; malformed blocks become [`Item::Text`].
pub fn parse(input: &str) -> ParseOutput {
    let mut output = ParseOutput::default();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }

        if block_start(remaining).is_some_and(|pos| pos == 0) {
            match parse_block(remaining) {
                Ok((rest, item)) => {
                    output.items.push(item);
                    remaining = rest;
                    continue;
                }
                Err(_) => {
                    let line = line_of(input, remaining);
                    tracing::debug!(line, "Malformed BibTeX block kept as text");
                    output.issues.push(ParseIssue {
                        line,
                        message: "Failed to parse entry".to_string(),
                    });
                    let end = block_start(&remaining[1..]).map_or(remaining.len(), |p| p + 1);
                    push_text(&mut output.items, &remaining[..end]);
                    remaining = &remaining[end..];
                    continue;
                }
            }
        }

        // Never zero: a block start at 0 was handled above
        let end = block_start(remaining).unwrap_or(remaining.len());
        push_text(&mut output.items, &remaining[..end]);
        remaining = &remaining[end..];
    }

    output
}

/// Offset of the first `@` that opens a block: `@type{` or `@type(`
///
/// An `@` inside free text such as an email address does not count.
fn block_start(text: &str) -> Option<usize> {
    text.match_indices('@').map(|(pos, _)| pos).find(|&pos| {
        let after = text[pos + 1..].trim_start();
        let name_len = after
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(after.len());
        name_len > 0 && after[name_len..].trim_start().starts_with(['{', '('])
    })
}

fn push_text(items: &mut Vec<Item>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        items.push(Item::Text(text.to_string()));
    }
}

fn line_of(input: &str, rest: &str) -> usize {
    let offset = input.len() - rest.len();
    input[..offset].matches('\n').count() + 1
}

fn parse_block(input: &str) -> IResult<&str, Item> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, block_type) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;

    match block_type.to_ascii_lowercase().as_str() {
        "string" | "preamble" | "comment" => {
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = braced_content(rest)?;
            let consumed = &input[..input.len() - rest.len()];
            Ok((rest, Item::Verbatim(consumed.trim().to_string())))
        }
        _ => {
            let (rest, entry) = entry_body(rest, block_type)?;
            Ok((rest, Item::Entry(entry)))
        }
    }
}

fn entry_body<'a>(input: &'a str, entry_type: &str) -> IResult<&'a str, RawEntry> {
    let (rest, _) = multispace0(input)?;
    let (rest, open) = alt((char('{'), char('(')))(rest)?;
    let close = if open == '(' { ')' } else { '}' };
    let (rest, _) = multispace0(rest)?;
    let (rest, key) =
        take_while1(|c: char| !c.is_whitespace() && !",{}()\"=#".contains(c))(rest)?;
    let (rest, _) = multispace0(rest)?;

    // `@misc{key}` has no field list at all
    if let Some(rest) = rest.strip_prefix(close) {
        return Ok((
            rest,
            RawEntry {
                entry_type: entry_type.to_string(),
                key: key.to_string(),
                fields: Vec::new(),
            },
        ));
    }

    let (rest, _) = char(',')(rest)?;
    let (rest, fields) = fields(rest, close)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char(close)(rest)?;

    Ok((
        rest,
        RawEntry {
            entry_type: entry_type.to_string(),
            key: key.to_string(),
            fields,
        },
    ))
}

fn fields(input: &str, close: char) -> IResult<&str, Vec<RawField>> {
    let mut fields = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        if rest.starts_with(close) {
            return Ok((rest, fields));
        }

        let (rest, field) = field(rest)?;
        fields.push(field);

        let (rest, _) = multispace0(rest)?;
        remaining = rest.strip_prefix(',').unwrap_or(rest);
    }
}

fn field(input: &str) -> IResult<&str, RawField> {
    let (rest, name) = take_while1(is_name_char)(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, parts) = value(rest)?;

    Ok((
        rest,
        RawField {
            name: name.to_string(),
            parts,
        },
    ))
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-:.+".contains(c)
}

fn value(input: &str) -> IResult<&str, Vec<ValuePart>> {
    let mut parts = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        let (rest, part) = alt((
            map(braced_content, |s: &str| {
                ValuePart::Braced(s[1..s.len() - 1].to_string())
            }),
            map(quoted_content, |s: &str| {
                ValuePart::Quoted(s[1..s.len() - 1].to_string())
            }),
            map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
                ValuePart::Number(s.to_string())
            }),
            map(take_while1(is_name_char), |s: &str| {
                ValuePart::Macro(s.to_string())
            }),
        ))(rest)?;
        parts.push(part);

        let (rest, _) = multispace0(rest)?;
        match rest.strip_prefix('#') {
            Some(rest) => remaining = rest,
            None => return Ok((rest, parts)),
        }
    }
}

/// `{...}` with nested braces; returns the slice including the outer braces
fn braced_content(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(fail(input, nom::error::ErrorKind::Char));
    }

    let mut depth = 0usize;
    for (pos, byte) in input.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[..pos + 1]));
                }
            }
            _ => {}
        }
    }

    Err(fail(input, nom::error::ErrorKind::TakeUntil))
}

/// `"..."` where quotes inside braces do not terminate; includes the quotes
fn quoted_content(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('"') {
        return Err(fail(input, nom::error::ErrorKind::Char));
    }

    let mut depth = 0usize;
    for (pos, byte) in input.bytes().enumerate().skip(1) {
        match byte {
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'}' => return Err(fail(input, nom::error::ErrorKind::Char)),
            b'"' if depth == 0 => return Ok((&input[pos + 1..], &input[..pos + 1])),
            _ => {}
        }
    }

    Err(fail(input, nom::error::ErrorKind::TakeUntil))
}

fn fail(input: &str, kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}
