use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum StyleError {
    Parse(serde_json::Error),
    Io(std::io::Error),
}

impl Error for StyleError {}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StyleError::Parse(err) => write!(f, "malformed style text: {err}"),
            StyleError::Io(err) => write!(f, "could not read style: {err}"),
        }
    }
}

impl From<serde_json::Error> for StyleError {
    fn from(err: serde_json::Error) -> Self {
        StyleError::Parse(err)
    }
}

impl From<std::io::Error> for StyleError {
    fn from(err: std::io::Error) -> Self {
        StyleError::Io(err)
    }
}

#[derive(Debug)]
pub enum NodeError {
    EmptyRange { start: u64, end: u64 },
    Visit(String),
}

impl Error for NodeError {}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NodeError::EmptyRange { start, end } => {
                write!(f, "invalid node range: start {start} > end {end}")
            }
            NodeError::Visit(msg) => write!(f, "node visit failed: {msg}"),
        }
    }
}
