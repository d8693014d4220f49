//! Interactive operator input.

use ambar_shared::errors::{AmbarError, AmbarResult};
use std::io::{BufRead, Write};
use std::net::Ipv4Addr;

/// Asks the operator a question and returns the normalized answer
/// (trimmed, lower-cased).
pub trait Prompter: Send + Sync {
    fn ask(&self, question: &str) -> AmbarResult<String>;
}

/// Reads answers from stdin, one line per question.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&self, question: &str) -> AmbarResult<String> {
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{question}")
            .and_then(|_| stdout.flush())
            .map_err(|e| AmbarError::Internal(format!("failed to write prompt: {e}")))?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| AmbarError::InvalidArgument(format!("failed to read answer: {e}")))?;
        if read == 0 {
            return Err(AmbarError::InvalidArgument(
                "no answer given (stdin closed)".to_string(),
            ));
        }
        Ok(normalize(&line))
    }
}

pub(crate) fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// `y` accepts `detected`; an IPv4 literal overrides it; anything else aborts.
pub fn parse_host_answer(answer: &str, detected: Ipv4Addr) -> AmbarResult<Ipv4Addr> {
    let answer = normalize(answer);
    if answer == "y" {
        return Ok(detected);
    }
    answer.parse::<Ipv4Addr>().map_err(|_| {
        AmbarError::InvalidArgument(format!("{answer} is not a valid ipv4 address"))
    })
}

/// `y` keeps the current port (`None`); an integer in `[0, 65535]`
/// overrides it; anything else aborts.
pub fn parse_port_answer(answer: &str) -> AmbarResult<Option<u16>> {
    let answer = normalize(answer);
    if answer == "y" {
        return Ok(None);
    }
    answer
        .parse::<u16>()
        .map(Some)
        .map_err(|_| AmbarError::InvalidArgument(format!("{answer} is not a valid port")))
}

/// Whether a yes/no answer confirms.
pub fn is_confirmed(answer: &str) -> bool {
    normalize(answer) == "y"
}
