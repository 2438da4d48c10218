//! Frame structure and serialization

use bytes::{BufMut, Bytes, BytesMut};

/// Wire spelling of a set package flag
pub const FLAG_TRUE: &str = "True";
/// Wire spelling of a cleared package flag
pub const FLAG_FALSE: &str = "False";
/// The end-of-stream marker: an empty name line
pub const SENTINEL: &[u8] = b"\n";

/// One code unit on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Unit name
    pub name: String,
    /// Package flag
    pub is_package: bool,
    /// Compressed body, ending in a sync flush point
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame
    pub fn new(name: impl Into<String>, is_package: bool, body: Bytes) -> Self {
        Self {
            name: name.into(),
            is_package,
            body,
        }
    }

    /// Get the compressed body size
    pub fn payload_size(&self) -> usize {
        self.body.len()
    }

    /// The three newline-terminated header lines
    pub fn header(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.name,
            if self.is_package { FLAG_TRUE } else { FLAG_FALSE },
            self.body.len()
        )
    }

    /// Header followed by the raw body
    pub fn to_bytes(&self) -> Bytes {
        let header = self.header();
        let mut buf = BytesMut::with_capacity(header.len() + self.body.len());
        buf.put_slice(header.as_bytes());
        buf.put_slice(&self.body);
        buf.freeze()
    }
}

/// Parse a package flag line
pub fn parse_flag(line: &str) -> Option<bool> {
    match line {
        FLAG_TRUE => Some(true),
        FLAG_FALSE => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let body = Bytes::from_static(b"\x78\x01abc");
        let frame = Frame::new("stowaway.helpers", false, body.clone());

        assert_eq!(frame.name, "stowaway.helpers");
        assert!(!frame.is_package);
        assert_eq!(frame.body, body);
        assert_eq!(frame.payload_size(), 5);
    }

    #[test]
    fn test_frame_header_layout() {
        let frame = Frame::new("stowaway", true, Bytes::from_static(b"xyz"));
        assert_eq!(frame.header(), "stowaway\nTrue\n3\n");
        assert_eq!(&frame.to_bytes()[..], b"stowaway\nTrue\n3\nxyz");
    }

    #[test]
    fn test_empty_body() {
        let frame = Frame::new("empty", false, Bytes::new());
        assert_eq!(&frame.to_bytes()[..], b"empty\nFalse\n0\n");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag("true"), None);
        assert_eq!(parse_flag(""), None);
    }
}
