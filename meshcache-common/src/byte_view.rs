//  Copyright 2024 MrCroxx
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

use std::ops::Deref;

use bytes::Bytes;

/// An immutable, reference-counted view over an opaque byte payload.
///
/// Cloning a `ByteView` is cheap (it shares the underlying buffer); no clone
/// ever mutates the bytes another clone sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Builds a view from an owned buffer.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Number of bytes carried by this view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this view carries zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns a defensive copy of the underlying bytes.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Decodes the underlying bytes as UTF-8, replacing invalid sequences.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Consumes the view, returning the backing `Bytes` without copying.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl Deref for ByteView {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_bytes() {
        let view = ByteView::new(b"1234".to_vec());
        assert_eq!(view.len(), 4);
        assert!(!view.is_empty());
        assert_eq!(view.as_bytes(), b"1234".to_vec());
        assert_eq!(view.as_string(), "1234");
    }

    #[test]
    fn equality_is_by_content() {
        let a = ByteView::from("hello");
        let b = ByteView::new(b"hello".to_vec());
        assert_eq!(a, b);
        let c = ByteView::from("world");
        assert_ne!(a, c);
    }

    #[test]
    fn clone_is_cheap_and_shared() {
        let a = ByteView::from("shared");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.as_bytes(), b"shared".to_vec());
    }

    #[test]
    fn zero_length_value_is_legal() {
        let view = ByteView::new(Vec::new());
        assert_eq!(view.len(), 0);
        assert!(view.is_empty());
    }
}
