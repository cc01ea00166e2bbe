//! Line splitting with carried-over fragments.
//!
//! Appended bytes rarely end exactly on a line boundary. The unterminated tail
//! of one read is kept as a fragment and prepended to the next read of the
//! same object, so a line split across two fetches is emitted exactly once.

use bytes::{Bytes, BytesMut};

/// Result of splitting one read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitLines {
    /// Complete lines, each still ending in `\n`
    pub lines: Vec<Bytes>,

    /// Trailing bytes with no terminator yet
    pub fragment: Bytes,
}

impl SplitLines {
    /// Number of bytes in complete lines.
    pub fn complete_len(&self) -> usize {
        self.lines.iter().map(Bytes::len).sum()
    }
}

/// Split `previous ++ new` into complete lines and a trailing fragment.
///
/// Lines keep their `\n` terminator, so concatenating every line and the
/// fragment reproduces the input byte for byte. Line slices share the
/// underlying buffer and are not copied.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use lh_reader::split_lines;
///
/// let first = split_lines(&Bytes::new(), Bytes::from_static(b"a\nb"));
/// assert_eq!(first.lines, vec![Bytes::from_static(b"a\n")]);
/// assert_eq!(first.fragment, Bytes::from_static(b"b"));
///
/// let second = split_lines(&first.fragment, Bytes::from_static(b"c\n"));
/// assert_eq!(second.lines, vec![Bytes::from_static(b"bc\n")]);
/// assert!(second.fragment.is_empty());
/// ```
pub fn split_lines(previous: &Bytes, new: Bytes) -> SplitLines {
    let buffer = if previous.is_empty() {
        new
    } else if new.is_empty() {
        previous.clone()
    } else {
        let mut joined = BytesMut::with_capacity(previous.len() + new.len());
        joined.extend_from_slice(previous);
        joined.extend_from_slice(&new);
        joined.freeze()
    };

    let mut lines = Vec::new();
    let mut start = 0;

    for (i, byte) in buffer.iter().enumerate() {
        if *byte == b'\n' {
            lines.push(buffer.slice(start..=i));
            start = i + 1;
        }
    }

    SplitLines {
        lines,
        fragment: buffer.slice(start..),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(split: &SplitLines) -> Vec<u8> {
        let mut out: Vec<u8> = split.lines.iter().flat_map(|l| l.to_vec()).collect();
        out.extend_from_slice(&split.fragment);
        out
    }

    #[test]
    fn test_split_complete_lines() {
        let split = split_lines(&Bytes::new(), Bytes::from_static(b"one\ntwo\n"));

        assert_eq!(split.lines.len(), 2);
        assert_eq!(&split.lines[1][..], b"two\n");
        assert!(split.fragment.is_empty());
        assert_eq!(split.complete_len(), 8);
    }

    #[test]
    fn test_split_keeps_crlf() {
        let split = split_lines(&Bytes::new(), Bytes::from_static(b"one\r\ntwo"));

        assert_eq!(&split.lines[0][..], b"one\r\n");
        assert_eq!(&split.fragment[..], b"two");
    }

    #[test]
    fn test_split_fragment_only() {
        let split = split_lines(&Bytes::from_static(b"par"), Bytes::from_static(b"tial"));

        assert!(split.lines.is_empty());
        assert_eq!(&split.fragment[..], b"partial");
    }

    #[test]
    fn test_split_fragment_completed_once() {
        let first = split_lines(&Bytes::new(), Bytes::from_static(b"2024-01-01 00:00"));
        assert!(first.lines.is_empty());

        let second = split_lines(&first.fragment, Bytes::from_static(b":05 rest\nnext"));
        assert_eq!(second.lines, vec![Bytes::from_static(b"2024-01-01 00:00:05 rest\n")]);
        assert_eq!(&second.fragment[..], b"next");
    }

    #[test]
    fn test_split_empty_inputs() {
        let split = split_lines(&Bytes::new(), Bytes::new());
        assert_eq!(split, SplitLines::default());

        let kept = split_lines(&Bytes::from_static(b"tail"), Bytes::new());
        assert_eq!(&kept.fragment[..], b"tail");
    }

    #[test]
    fn test_split_blank_lines_preserved() {
        let split = split_lines(&Bytes::new(), Bytes::from_static(b"\n\na\n"));
        assert_eq!(split.lines.len(), 3);
        assert_eq!(&split.lines[0][..], b"\n");
    }

    #[test]
    fn test_split_is_lossless() {
        let inputs: [(&[u8], &[u8]); 5] = [
            (b"", b"a\nb\nc"),
            (b"frag", b"ment\n"),
            (b"x\r", b"\ny\n\n"),
            (b"", b"\n"),
            (b"no newline", b" at all"),
        ];

        for (previous, new) in inputs {
            let previous = Bytes::copy_from_slice(previous);
            let split = split_lines(&previous, Bytes::copy_from_slice(new));

            let mut expected = previous.to_vec();
            expected.extend_from_slice(new);
            assert_eq!(concat(&split), expected);
            assert!(!split.fragment.contains(&b'\n'));
        }
    }
}
