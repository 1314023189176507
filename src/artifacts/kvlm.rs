//! Key/value-with-message envelope used by commits and tags
//!
//! A KVLM buffer is a header block of `key SP value LF` lines followed by a
//! blank line and a free-form message. Continuation lines begin with a single
//! space; duplicate keys collapse into an ordered list. Parsing and
//! serialization are exact inverses: `serialize(parse(x)) == x` for any
//! well-formed input.

use crate::error::VesError;
use bytes::Bytes;

/// Ordered key/value header plus message
///
/// Field order is preserved from the source buffer (or from insertion order
/// when building a new envelope), which is what makes round-trips byte-exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kvlm {
    fields: Vec<(Bytes, Vec<Bytes>)>,
    message: Bytes,
}

impl Kvlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw KVLM buffer
    ///
    /// The header ends at the first LF immediately followed by another LF or
    /// by end-of-input. Within the header a line starting with SP continues
    /// the previous value (the SP is stripped, the LF kept).
    pub fn parse(raw: &[u8]) -> anyhow::Result<Self> {
        let mut kvlm = Kvlm::new();
        let mut pos = 0;

        loop {
            if pos >= raw.len() {
                // header ran to end-of-input with no separator, empty message
                kvlm.message = Bytes::new();
                break;
            }
            if raw[pos] == b'\n' {
                // blank separator, the rest is the message verbatim
                kvlm.message = Bytes::copy_from_slice(&raw[pos + 1..]);
                break;
            }

            let spc = raw[pos..]
                .iter()
                .position(|&b| b == b' ')
                .map(|i| pos + i)
                .ok_or_else(|| {
                    VesError::MalformedObject("header line without key separator".to_string())
                })?;
            let key = Bytes::copy_from_slice(&raw[pos..spc]);

            // find the end of the value, folding continuation lines
            let mut end = spc;
            loop {
                end = raw[end + 1..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map(|i| end + 1 + i)
                    .ok_or_else(|| {
                        VesError::MalformedObject("unterminated header value".to_string())
                    })?;
                if raw.get(end + 1) != Some(&b' ') {
                    break;
                }
            }

            let mut value = Vec::with_capacity(end - spc - 1);
            let mut i = spc + 1;
            while i < end {
                if raw[i] == b'\n' && raw.get(i + 1) == Some(&b' ') {
                    value.push(b'\n');
                    i += 2; // swallow the continuation SP
                } else {
                    value.push(raw[i]);
                    i += 1;
                }
            }

            kvlm.push(key, Bytes::from(value));
            pos = end + 1;
        }

        Ok(kvlm)
    }

    /// Serialize back to the raw form
    pub fn serialize(&self) -> Bytes {
        let mut out = Vec::new();

        for (key, values) in &self.fields {
            for value in values {
                out.extend_from_slice(key);
                out.push(b' ');
                for &b in value.iter() {
                    out.push(b);
                    if b == b'\n' {
                        out.push(b' ');
                    }
                }
                out.push(b'\n');
            }
        }

        out.push(b'\n');
        out.extend_from_slice(&self.message);

        Bytes::from(out)
    }

    /// Append a value under a key, collapsing duplicates into a list
    pub fn push(&mut self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();

        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((key, vec![value])),
        }
    }

    /// All values recorded under a key, in order of appearance
    pub fn values(&self, key: &[u8]) -> &[Bytes] {
        self.fields
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// The single value under a key, erroring on absence or duplication
    pub fn single(&self, key: &[u8]) -> anyhow::Result<&Bytes> {
        let values = self.values(key);
        match values {
            [value] => Ok(value),
            [] => Err(VesError::MalformedObject(format!(
                "missing {} header",
                String::from_utf8_lossy(key)
            ))
            .into()),
            _ => Err(VesError::MalformedObject(format!(
                "duplicated {} header",
                String::from_utf8_lossy(key)
            ))
            .into()),
        }
    }

    pub fn message(&self) -> &Bytes {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<Bytes>) {
        self.message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SAMPLE: &[u8] = b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
parent 206941306e8a8af65b66eaaaea388a7ae24d49a0\n\
author A U Thor <a@u> 0 +0000\n\
committer A U Thor <a@u> 0 +0000\n\
\n\
first\n";

    #[test]
    fn parses_header_fields_and_message() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();

        assert_eq!(
            kvlm.single(b"tree").unwrap().as_ref(),
            b"29ff16c9c14e2652b22f8b78bb08a5a07930c147"
        );
        assert_eq!(
            kvlm.single(b"author").unwrap().as_ref(),
            b"A U Thor <a@u> 0 +0000"
        );
        assert_eq!(kvlm.message().as_ref(), b"first\n");
    }

    #[test]
    fn round_trips_byte_exactly() {
        let kvlm = Kvlm::parse(SAMPLE).unwrap();
        assert_eq!(kvlm.serialize().as_ref(), SAMPLE);
    }

    #[test]
    fn continuation_lines_fold_and_unfold() {
        let raw = b"gpgsig line one\n line two\n line three\n\nmsg\n";
        let kvlm = Kvlm::parse(raw).unwrap();

        assert_eq!(
            kvlm.single(b"gpgsig").unwrap().as_ref(),
            b"line one\nline two\nline three"
        );
        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }

    #[test]
    fn duplicate_keys_collapse_into_ordered_list() {
        let raw = b"parent aaaa\nparent bbbb\n\n";
        let kvlm = Kvlm::parse(raw).unwrap();

        let parents = kvlm.values(b"parent");
        assert_eq!(parents.len(), 2);
        assert_eq!(parents[0].as_ref(), b"aaaa");
        assert_eq!(parents[1].as_ref(), b"bbbb");
        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }

    #[test]
    fn empty_message_is_preserved() {
        let raw = b"tree abcd\n\n";
        let kvlm = Kvlm::parse(raw).unwrap();
        assert_eq!(kvlm.message().as_ref(), b"");
        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }

    #[test]
    fn message_only_buffer() {
        let raw = b"\njust a message";
        let kvlm = Kvlm::parse(raw).unwrap();
        assert_eq!(kvlm.message().as_ref(), b"just a message");
        assert_eq!(kvlm.serialize().as_ref(), raw.as_slice());
    }

    fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
        prop::string::string_regex("[a-z]{1,10}")
            .unwrap()
            .prop_map(String::into_bytes)
    }

    fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
        // values may contain internal newlines (they become continuations)
        // but must not start or end with one, and must not contain "\n "
        prop::string::string_regex("[ -~]{1,20}(\n[!-~][ -~]{0,10}){0,3}")
            .unwrap()
            .prop_map(String::into_bytes)
    }

    proptest! {
        #[test]
        fn prop_parse_inverts_serialize(
            entries in prop::collection::vec((key_strategy(), value_strategy()), 0..6),
            message in prop::string::string_regex("[ -~\n]{0,50}").unwrap()
        ) {
            let mut kvlm = Kvlm::new();
            for (key, value) in entries {
                kvlm.push(key, value);
            }
            kvlm.set_message(message.into_bytes());

            let parsed = Kvlm::parse(&kvlm.serialize()).unwrap();
            prop_assert_eq!(parsed, kvlm);
        }

        #[test]
        fn prop_serialize_inverts_parse_on_reserialized_input(
            entries in prop::collection::vec((key_strategy(), value_strategy()), 0..6),
            message in prop::string::string_regex("[ -~\n]{0,50}").unwrap()
        ) {
            let mut kvlm = Kvlm::new();
            for (key, value) in entries {
                kvlm.push(key, value);
            }
            kvlm.set_message(message.into_bytes());

            // any serialized envelope is a well-formed buffer
            let raw = kvlm.serialize();
            let reparsed = Kvlm::parse(&raw).unwrap();
            prop_assert_eq!(reparsed.serialize(), raw);
        }
    }
}
