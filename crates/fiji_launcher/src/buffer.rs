//! Growable text buffer with a small printf-style formatter
//!
//! The formatter understands a restricted set of directives and copies
//! anything it does not recognize verbatim, so format strings coming from
//! settings files can never abort the launcher.

use std::fmt;

const DEFAULT_CAPACITY: usize = 32;

/// Argument for [`StringBuffer::append_formatted`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg<'a> {
    Str(&'a str),
    Char(char),
    Int(i64),
    UInt(u64),
}

impl FormatArg<'_> {
    fn as_i64(&self) -> i64 {
        match *self {
            FormatArg::Int(i) => i,
            FormatArg::UInt(u) => u as i64,
            FormatArg::Char(c) => c as i64,
            FormatArg::Str(_) => 0,
        }
    }

    fn as_u64(&self) -> u64 {
        match *self {
            FormatArg::Int(i) => i as u64,
            FormatArg::UInt(u) => u,
            FormatArg::Char(c) => c as u64,
            FormatArg::Str(_) => 0,
        }
    }
}

impl<'a> From<&'a str> for FormatArg<'a> {
    fn from(s: &'a str) -> Self {
        FormatArg::Str(s)
    }
}

impl<'a> From<&'a String> for FormatArg<'a> {
    fn from(s: &'a String) -> Self {
        FormatArg::Str(s)
    }
}

impl From<char> for FormatArg<'_> {
    fn from(c: char) -> Self {
        FormatArg::Char(c)
    }
}

impl From<i32> for FormatArg<'_> {
    fn from(i: i32) -> Self {
        FormatArg::Int(i.into())
    }
}

impl From<i64> for FormatArg<'_> {
    fn from(i: i64) -> Self {
        FormatArg::Int(i)
    }
}

impl From<u64> for FormatArg<'_> {
    fn from(u: u64) -> Self {
        FormatArg::UInt(u)
    }
}

impl From<usize> for FormatArg<'_> {
    fn from(u: usize) -> Self {
        FormatArg::UInt(u as u64)
    }
}

/// A NUL-terminated, geometrically growing text buffer.
///
/// The backing storage always holds `len() + 1` bytes, the last being `\0`.
/// Capacity grows by half of its current value (or to the requested size,
/// whichever is larger) and is never released before the buffer is dropped.
#[derive(Clone)]
pub struct StringBuffer {
    buffer: String,
    alloc: usize,
}

impl StringBuffer {
    /// Create an empty buffer with room for `capacity` bytes of text
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = String::with_capacity(capacity + 1);
        buffer.push('\0');
        Self {
            buffer,
            alloc: capacity,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a buffer holding a copy of `text`
    pub fn copy_of(text: &str) -> Self {
        let mut result = Self::with_capacity(text.len());
        result.append(text);
        result
    }

    /// Create a buffer from a format string
    pub fn formatted(fmt: &str, args: &[FormatArg<'_>]) -> Self {
        let mut result = Self::with_capacity(fmt.len() + 64);
        result.append_formatted(fmt, args);
        result
    }

    pub fn len(&self) -> usize {
        self.buffer.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.alloc
    }

    pub fn as_str(&self) -> &str {
        &self.buffer[..self.len()]
    }

    /// The text including its terminating NUL byte
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn ensure_alloc(&mut self, length: usize) {
        if self.alloc < length {
            let grown = self.alloc + self.alloc / 2;
            let new_alloc = grown.max(length);
            self.buffer.reserve_exact(new_alloc + 1 - self.buffer.len());
            self.alloc = new_alloc;
        }
    }

    pub fn append(&mut self, text: &str) {
        self.ensure_alloc(self.len() + text.len());
        self.buffer.pop();
        self.buffer.push_str(text);
        self.buffer.push('\0');
    }

    pub fn push(&mut self, c: char) {
        self.ensure_alloc(self.len() + c.len_utf8());
        self.buffer.pop();
        self.buffer.push(c);
        self.buffer.push('\0');
    }

    /// Append at most `max` characters of `text`
    pub fn append_at_most(&mut self, text: &str, max: usize) {
        match text.char_indices().nth(max) {
            Some((end, _)) => self.append(&text[..end]),
            None => self.append(text),
        }
    }

    /// Append `entry` to a separator-delimited path list
    pub fn append_path_list(&mut self, entry: &str, separator: char) {
        if !self.is_empty() {
            self.push(separator);
        }
        self.append(entry);
    }

    /// Truncate to `length` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `length` exceeds the current length or does not fall on a
    /// character boundary.
    pub fn set_length(&mut self, length: usize) {
        assert!(
            length <= self.len(),
            "set_length({}) would grow a buffer of length {}",
            length,
            self.len()
        );
        assert!(self.buffer.is_char_boundary(length));
        self.buffer.truncate(length);
        self.buffer.push('\0');
    }

    /// Replace the contents with a copy of `text`
    pub fn copy_from(&mut self, text: &str) {
        self.set_length(0);
        self.append(text);
    }

    /// Replace every occurrence of `from` with `to`
    pub fn replace(&mut self, from: char, to: char) {
        if !self.as_str().contains(from) {
            return;
        }
        let replaced = self.as_str().replace(from, to.encode_utf8(&mut [0; 4]));
        self.copy_from(&replaced);
    }

    /// Append formatted text.
    ///
    /// Supported: `%s` (with fill/width or `.*` precision), `%c`,
    /// `%u %i %d %l %o %x %X` (with fill/width) and `%%`. Missing arguments
    /// format as empty strings or zero.
    pub fn append_formatted(&mut self, fmt: &str, args: &[FormatArg<'_>]) {
        let bytes = fmt.as_bytes();
        let mut args = args.iter();
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos] != b'%' {
                let next = fmt[pos..].find('%').map_or(bytes.len(), |i| pos + i);
                self.append(&fmt[pos..next]);
                pos = next;
                continue;
            }
            if bytes.get(pos + 1) == Some(&b'%') {
                self.push('%');
                pos += 2;
                continue;
            }

            let start = pos;
            let mut p = pos + 1;
            let mut fill = None;
            let mut width = None;
            let mut max = None;

            if matches!(bytes.get(p), Some(b' ') | Some(b'0')) {
                fill = Some(bytes[p] as char);
                p += 1;
            }
            if bytes.get(p).is_some_and(u8::is_ascii_digit) {
                let digits = bytes[p..].iter().take_while(|b| b.is_ascii_digit()).count();
                width = fmt[p..p + digits].parse::<usize>().ok();
                p += digits;
            } else if bytes.get(p) == Some(&b'.') && bytes.get(p + 1) == Some(&b'*') {
                max = Some(args.next().map_or(0, |a| a.as_i64().max(0) as usize));
                p += 2;
            }

            match bytes.get(p) {
                Some(b's') => {
                    let s = match args.next() {
                        Some(FormatArg::Str(s)) => *s,
                        _ => "",
                    };
                    let shown = max.map_or(s.chars().count(), |m| m.min(s.chars().count()));
                    if let Some(width) = width {
                        self.pad(fill.unwrap_or(' '), width.saturating_sub(shown));
                    }
                    self.append_at_most(s, shown);
                }
                Some(b'c') => {
                    if let Some(arg) = args.next() {
                        let c = match *arg {
                            FormatArg::Char(c) => c,
                            other => char::from_u32(other.as_u64() as u32).unwrap_or('?'),
                        };
                        self.push(c);
                    }
                }
                Some(&conversion @ (b'u' | b'i' | b'l' | b'd' | b'o' | b'x' | b'X')) => {
                    let arg = args.next().copied().unwrap_or(FormatArg::Int(0));
                    self.append_number(conversion, arg, fill, width);
                }
                Some(_) => {
                    // unknown directive: copy it verbatim
                    let end = p + fmt[p..].chars().next().map_or(0, char::len_utf8);
                    self.append(&fmt[start..end]);
                    pos = end;
                    continue;
                }
                None => {
                    self.append(&fmt[start..]);
                    pos = bytes.len();
                    continue;
                }
            }
            pos = p + 1;
        }
    }

    fn pad(&mut self, fill: char, count: usize) {
        for _ in 0..count {
            self.push(fill);
        }
    }

    fn append_number(
        &mut self,
        conversion: u8,
        arg: FormatArg<'_>,
        fill: Option<char>,
        width: Option<usize>,
    ) {
        let base: u64 = match conversion {
            b'x' | b'X' => 16,
            b'o' => 8,
            _ => 10,
        };
        let (negative, magnitude) = if conversion == b'u' {
            (false, arg.as_u64())
        } else {
            let signed = arg.as_i64();
            (signed < 0, signed.unsigned_abs())
        };

        let mut digits = Vec::new();
        let mut number = magnitude;
        loop {
            let digit = (number % base) as u8;
            digits.push(match digit {
                0..=9 => (b'0' + digit) as char,
                _ if conversion == b'X' => (b'A' + digit - 10) as char,
                _ => (b'a' + digit - 10) as char,
            });
            number /= base;
            if number == 0 {
                break;
            }
        }

        let fill = fill.unwrap_or(' ');
        let padding = width.map_or(0, |width| {
            width.saturating_sub(digits.len() + usize::from(negative))
        });
        // Zeros go between the sign and the digits
        if fill == '0' {
            if negative {
                self.push('-');
            }
            self.pad(fill, padding);
        } else {
            self.pad(fill, padding);
            if negative {
                self.push('-');
            }
        }
        for c in digits.into_iter().rev() {
            self.push(c);
        }
    }
}

impl Default for StringBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl From<StringBuffer> for String {
    fn from(buffer: StringBuffer) -> Self {
        buffer.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_nul_terminator() {
        let mut buffer = StringBuffer::with_capacity(2);
        buffer.append("hello");
        buffer.push('!');
        assert_eq!(buffer.as_str(), "hello!");
        assert_eq!(buffer.as_bytes_with_nul(), b"hello!\0");
        assert!(buffer.len() <= buffer.capacity());
    }

    #[test]
    fn test_growth_is_geometric() {
        let mut buffer = StringBuffer::with_capacity(100);
        buffer.append(&"x".repeat(101));
        assert_eq!(buffer.capacity(), 150);
        buffer.set_length(0);
        assert_eq!(buffer.capacity(), 150);
    }

    #[test]
    fn test_set_length_truncates() {
        let mut buffer = StringBuffer::copy_of("/opt/fiji/jars");
        buffer.set_length(9);
        assert_eq!(buffer.as_str(), "/opt/fiji");
        assert_eq!(buffer.as_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    #[should_panic(expected = "would grow")]
    fn test_set_length_cannot_grow() {
        let mut buffer = StringBuffer::copy_of("abc");
        buffer.set_length(4);
    }

    #[test]
    fn test_format_strings_and_numbers() {
        let buffer = StringBuffer::formatted("-Xmx%dm", &[768.into()]);
        assert_eq!(buffer.as_str(), "-Xmx768m");

        let buffer = StringBuffer::formatted("%s/%s", &["/opt/fiji".into(), "jars".into()]);
        assert_eq!(buffer.as_str(), "/opt/fiji/jars");

        let buffer = StringBuffer::formatted("[%5d|%05d|%x|%X|%o]", &[
            (-42).into(),
            42.into(),
            255.into(),
            255.into(),
            8.into(),
        ]);
        assert_eq!(buffer.as_str(), "[  -42|00042|ff|FF|10]");

        let buffer = StringBuffer::formatted("%05d|%03d|%02d", &[
            (-42).into(),
            (-7).into(),
            (-123).into(),
        ]);
        assert_eq!(buffer.as_str(), "-0042|-07|-123");
    }

    #[test]
    fn test_format_padding_and_precision() {
        let buffer = StringBuffer::formatted("%8s|% 4s|%.*s", &[
            "abc".into(),
            "ab".into(),
            2.into(),
            "truncated".into(),
        ]);
        assert_eq!(buffer.as_str(), "     abc|  ab|tr");
    }

    #[test]
    fn test_format_percent_and_char() {
        let buffer = StringBuffer::formatted("100%% %c", &['x'.into()]);
        assert_eq!(buffer.as_str(), "100% x");
    }

    #[test]
    fn test_unknown_directive_copied_verbatim() {
        let buffer = StringBuffer::formatted("%q and %5z and %", &[]);
        assert_eq!(buffer.as_str(), "%q and %5z and %");
    }

    #[test]
    fn test_missing_arguments_are_empty() {
        let buffer = StringBuffer::formatted("[%s][%d]", &[]);
        assert_eq!(buffer.as_str(), "[][0]");
    }

    #[test]
    fn test_replace_and_path_list() {
        let mut buffer = StringBuffer::copy_of("Gaussian_Blur");
        buffer.replace('_', ' ');
        assert_eq!(buffer.as_str(), "Gaussian Blur");

        let mut list = StringBuffer::new();
        list.append_path_list("a.jar", ':');
        list.append_path_list("b.jar", ':');
        assert_eq!(list.as_str(), "a.jar:b.jar");
    }
}
