//! `commit <id>` blocks and their `Key: value` fields.

use bstr::{BStr, BString, ByteSlice};

/// `commit` as a whole word at the start of the line.
pub fn is_commit_start(stripped: &[u8]) -> bool {
    match stripped.strip_prefix(b"commit") {
        Some(rest) => !rest
            .first()
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_'),
        None => false,
    }
}

/// Split `Key: value`. The key is a run of word characters and exactly
/// one whitespace character follows the colon.
pub fn parse_field(stripped: &[u8]) -> Option<(&BStr, &BStr)> {
    let colon = stripped.find_byte(b':')?;
    let key = &stripped[..colon];
    if key.is_empty() || !key.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_') {
        return None;
    }
    let rest = &stripped[colon + 1..];
    match rest.first() {
        Some(b) if b.is_ascii_whitespace() => Some((key.as_bstr(), rest[1..].as_bstr())),
        _ => None,
    }
}

/// Header fields of one commit, in the order git printed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRecord {
    /// Object name from the `commit <id>` line, when it had one.
    pub id: Option<BString>,
    fields: Vec<(BString, BString)>,
}

impl CommitRecord {
    /// Take the id from the opening `commit <id> [(decorations)]` line.
    pub fn open(&mut self, stripped: &[u8]) {
        self.id = stripped
            .strip_prefix(b"commit")
            .and_then(|rest| rest.fields().next())
            .map(BString::from);
    }

    /// Set a field, replacing an earlier value for the same key in place.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) {
        match self.fields.iter_mut().find(|(k, _)| k.as_slice() == key) {
            Some((_, v)) => *v = value.into(),
            None => self.fields.push((key.into(), value.into())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&BStr> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_slice() == key.as_bytes())
            .map(|(_, v)| v.as_bstr())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BStr, &BStr)> {
        self.fields.iter().map(|(k, v)| (k.as_bstr(), v.as_bstr()))
    }
}
