//! Command block parsing and the user-command registry
//!
//! User M-commands register a validate/execute capability pair with the
//! [`CommandRegistry`]. The registry tries handlers in registration
//! order and reports anything unrecognized as
//! [`CommandStatus::Unhandled`], for the surrounding dispatcher to pass
//! upstream. This replaces the firmware idiom of chained
//! previous-handler function pointers.

use keyseat_core::{Error, ParameterField, Result};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Strip `;` end-of-line and `( ... )` inline comments
fn strip_comments(line: &str) -> String {
    let mut out = String::new();
    let mut depth = 0u32;
    for c in line.chars() {
        match c {
            ';' if depth == 0 => break,
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Scan a source line into letter/value words.
///
/// Letters are case-insensitive and values may be signed decimals.
pub fn parse_words(line: &str) -> Result<Vec<(char, f64)>> {
    let cleaned = strip_comments(line);
    let mut words = Vec::new();
    let mut chars = cleaned.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if !c.is_ascii_alphabetic() {
            return Err(Error::other(format!("unexpected character '{c}' in block")));
        }
        let letter = c.to_ascii_uppercase();
        let mut number = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_digit() || n == '.' || n == '-' || n == '+' {
                number.push(n);
                chars.next();
            } else {
                break;
            }
        }
        if number.is_empty() {
            return Err(Error::other(format!("word {letter} has no value")));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| Error::other(format!("invalid value '{number}' for word {letter}")))?;
        words.push((letter, value));
    }
    Ok(words)
}

/// A parsed command block: the M-code plus its argument words
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBlock {
    /// The block's M-code number
    pub mcode: u16,
    words: Vec<(char, f64)>,
}

impl CommandBlock {
    /// Parse one source line as a user M-command block.
    ///
    /// Returns `Ok(None)` when the line holds no M word and is therefore
    /// not a candidate for the user-command registry.
    pub fn parse(line: &str) -> Result<Option<CommandBlock>> {
        let all = parse_words(line)?;
        let mcode = match all.iter().find(|(letter, _)| *letter == 'M') {
            Some((_, value)) if value.fract() == 0.0 && *value >= 0.0 && *value <= u16::MAX as f64 => {
                *value as u16
            }
            Some((_, value)) => {
                return Err(Error::other(format!("invalid M-code number {value}")))
            }
            None => return Ok(None),
        };
        let words = all.into_iter().filter(|(letter, _)| *letter != 'M').collect();
        Ok(Some(CommandBlock { mcode, words }))
    }

    /// Value of the first word with the given letter, if present
    pub fn word(&self, letter: char) -> Option<f64> {
        let letter = letter.to_ascii_uppercase();
        self.words
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, v)| *v)
    }

    /// Check whether a word with the given letter is present
    pub fn has_word(&self, letter: char) -> bool {
        self.word(letter).is_some()
    }
}

/// Outcome surfaced to the command dispatcher's caller
#[derive(Debug, Clone, PartialEq)]
pub enum CommandStatus {
    /// The command completed
    Ok,
    /// A word failed validation; the cycle never started
    InvalidArgument(ParameterField),
    /// Sag compensation is impossible for this tool/bore combination
    GeometryInfeasible,
    /// The block is not recognized by any registered handler
    Unhandled,
    /// The machine layer failed while executing the command
    MachineFault(String),
}

impl CommandStatus {
    /// Map an execution error onto the surfaced status
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Validation(e) => CommandStatus::InvalidArgument(e.field()),
            Error::Geometry(_) => CommandStatus::GeometryInfeasible,
            other => CommandStatus::MachineFault(other.to_string()),
        }
    }

    /// Check if this status reports success
    pub fn is_ok(&self) -> bool {
        matches!(self, CommandStatus::Ok)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::InvalidArgument(field) => write!(f, "invalid argument: {}", field),
            Self::GeometryInfeasible => write!(f, "geometry infeasible"),
            Self::Unhandled => write!(f, "unhandled"),
            Self::MachineFault(reason) => write!(f, "machine fault: {}", reason),
        }
    }
}

/// A registered user-command capability: a validate/execute pair
pub trait CommandHandler: Send + Sync {
    /// Check whether this handler services the given M-code
    fn accepts(&self, mcode: u16) -> bool;

    /// Check the block's words without side effects
    fn validate(&self, block: &CommandBlock) -> Result<()>;

    /// Execute the command; the registry always validates first
    fn execute(&self, block: &CommandBlock) -> Result<()>;
}

/// Handle identifying a registered handler
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerHandle(Uuid);

/// Registry of user command handlers, tried in registration order
#[derive(Default)]
pub struct CommandRegistry {
    handlers: Vec<(HandlerHandle, Box<dyn CommandHandler>)>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; earlier registrations are tried first
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> HandlerHandle {
        let handle = HandlerHandle(Uuid::new_v4());
        self.handlers.push((handle.clone(), handler));
        handle
    }

    /// Remove a previously registered handler
    pub fn unregister(&mut self, handle: &HandlerHandle) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| h != handle);
        self.handlers.len() != before
    }

    /// Dispatch one source line.
    ///
    /// Lines with no M word, unparseable lines, and M-codes no handler
    /// accepts are all reported as `Unhandled` and left to the upstream
    /// dispatcher.
    pub fn dispatch_line(&self, line: &str) -> CommandStatus {
        let block = match CommandBlock::parse(line) {
            Ok(Some(block)) => block,
            Ok(None) => return CommandStatus::Unhandled,
            Err(e) => {
                debug!(line, error = %e, "block not parseable as a user command");
                return CommandStatus::Unhandled;
            }
        };

        for (_, handler) in &self.handlers {
            if !handler.accepts(block.mcode) {
                continue;
            }
            if let Err(e) = handler.validate(&block) {
                return CommandStatus::from_error(&e);
            }
            return match handler.execute(&block) {
                Ok(()) => CommandStatus::Ok,
                Err(e) => CommandStatus::from_error(&e),
            };
        }
        CommandStatus::Unhandled
    }
}
