//! Byte-transparent text codec for source, data and trace files.
//!
//! GHDL and GTKWave treat files as ISO-8859-1. Decoding every byte to the
//! code point of the same value and encoding back keeps arbitrary bytes
//! (UTF-8 comments included) intact across a rewrite.

use std::io;
use std::path::Path;

/// Decodes ISO-8859-1 bytes into a string, one char per byte.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Encodes a string as ISO-8859-1. Chars above U+00FF become `?`.
#[must_use]
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
        .collect()
}

/// Reads a whole file as ISO-8859-1 text.
pub fn read_latin1(path: impl AsRef<Path>) -> io::Result<String> {
    std::fs::read(path).map(|bytes| decode_latin1(&bytes))
}

/// Writes text to a file as ISO-8859-1, replacing any existing content.
pub fn write_latin1(path: impl AsRef<Path>, text: &str) -> io::Result<()> {
    std::fs::write(path, encode_latin1(text))
}
