//! Reference-counted immutable text shared between nodes.
//!
//! Sibling nodes from one source file share a single seqid/filename buffer;
//! the buffer is freed when the last holder is dropped.

use std::fmt;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedStr(Rc<str>);

impl SharedStr {
    pub fn new(text: &str) -> Self {
        Self(Rc::from(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of live holders of this buffer.
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl From<&str> for SharedStr {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SharedStr {
    fn from(text: String) -> Self {
        Self(Rc::from(text))
    }
}

impl AsRef<str> for SharedStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SharedStr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
