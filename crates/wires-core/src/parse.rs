//! Small text grammars at the composer's edges.
//!
//! Built on `winnow` 0.7. Two inputs arrive as text:
//! canonical port names (`in0`, `out3`) and live-activity push messages
//! (`<componentId>` or `<componentId> <portName>`).

use crate::error::WiresError;
use crate::model::PortDirection;
use winnow::ascii::{digit1, space0, space1};
use winnow::combinator::{alt, opt, preceded};
use winnow::prelude::*;
use winnow::token::take_till;

/// A parsed live-activity message: which component (and optionally which
/// output port) just produced data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushMessage<'a> {
    pub component: &'a str,
    pub port: Option<&'a str>,
}

/// Parse a canonical port name (`"in"+index` / `"out"+index`) for the given
/// direction.
pub fn parse_canonical_port_name(name: &str, direction: PortDirection) -> Result<u32, WiresError> {
    let mut rest = name;
    let (prefix, index) = (port_prefix, port_index)
        .parse_next(&mut rest)
        .map_err(|_| WiresError::InvalidPortName(name.to_string()))?;
    if !rest.is_empty() || prefix != direction.as_str() {
        return Err(WiresError::InvalidPortName(name.to_string()));
    }
    Ok(index)
}

/// Parse a push message in either the legacy (bare id) or extended
/// (`id port`) form. Surrounding whitespace is ignored.
pub fn parse_push_message(input: &str) -> Result<PushMessage<'_>, WiresError> {
    let mut rest = input.trim();
    let message = push_message
        .parse_next(&mut rest)
        .map_err(|_| WiresError::MalformedPushMessage(input.to_string()))?;
    if !rest.is_empty() {
        return Err(WiresError::MalformedPushMessage(input.to_string()));
    }
    Ok(message)
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn port_prefix<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt(("out", "in")).parse_next(input)
}

fn port_index(input: &mut &str) -> ModalResult<u32> {
    digit1.try_map(str::parse::<u32>).parse_next(input)
}

fn token<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., char::is_whitespace).parse_next(input)
}

fn push_message<'a>(input: &mut &'a str) -> ModalResult<PushMessage<'a>> {
    let component = token.parse_next(input)?;
    let port = opt(preceded(space1, token)).parse_next(input)?;
    let _ = space0.parse_next(input)?;
    Ok(PushMessage { component, port })
}
