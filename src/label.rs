//! Single-label helpers for names in presentation format.
//!
//! A name like `_http._tcp.example.com` travels through the codec as an
//! escaped string: `.` separates labels, `\.` and `\\` stand for literal
//! dots and backslashes, and `\DDD` (three decimal digits) stands for an
//! arbitrary octet.

use crate::constants::*;
use crate::errors::*;

/// Unescapes the next label of `name` into `dest` and advances `name`
/// past the label and its trailing dot. Returns the unescaped length;
/// zero means the end of the name was reached.
pub fn unescape_label<'a>(name: &mut &'a str, dest: &mut [u8; DNS_LABEL_MAX]) -> Result<usize> {
    let bytes = name.as_bytes();
    let mut i = 0;
    let mut n = 0;

    loop {
        if i >= bytes.len() {
            break;
        }
        let c = bytes[i];
        if c == b'.' {
            i += 1;
            break;
        }

        if n >= DNS_LABEL_MAX {
            return Err(WireError::PacketTooLarge);
        }

        if c == b'\\' {
            i += 1;
            if i >= bytes.len() {
                return Err(WireError::InvalidName("Trailing backslash"));
            }
            match bytes[i] {
                e @ b'.' | e @ b'\\' => {
                    dest[n] = e;
                    n += 1;
                    i += 1;
                }
                e @ b'0'..=b'9' => {
                    if i + 2 >= bytes.len()
                        || !bytes[i + 1].is_ascii_digit()
                        || !bytes[i + 2].is_ascii_digit()
                    {
                        return Err(WireError::InvalidName("Invalid escape sequence"));
                    }
                    let v = (e - b'0') as u32 * 100
                        + (bytes[i + 1] - b'0') as u32 * 10
                        + (bytes[i + 2] - b'0') as u32;
                    if v > 255 {
                        return Err(WireError::InvalidName("Escape value out of range"));
                    }
                    dest[n] = v as u8;
                    n += 1;
                    i += 3;
                }
                _ => return Err(WireError::InvalidName("Invalid escape sequence")),
            }
        } else if c >= b' ' && c != 0x7f {
            dest[n] = c;
            n += 1;
            i += 1;
        } else {
            return Err(WireError::InvalidName("Unescaped control character"));
        }
    }

    // An empty label is only acceptable as the end of the name.
    if n == 0 && i < bytes.len() {
        return Err(WireError::InvalidName("Empty label"));
    }

    *name = &name[i..];
    Ok(n)
}

/// Escapes a raw label for presentation format, the inverse of
/// [`unescape_label`]. Alphanumerics, `_` and `-` pass through, dots and
/// backslashes gain a backslash, everything else becomes `\DDD`.
pub fn escape_label(label: &[u8], dest: &mut String) {
    for &c in label {
        match c {
            b'.' | b'\\' => {
                dest.push('\\');
                dest.push(c as char);
            }
            b'_' | b'-' | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' => dest.push(c as char),
            _ => {
                dest.push('\\');
                dest.push((b'0' + c / 100) as char);
                dest.push((b'0' + c / 10 % 10) as char);
                dest.push((b'0' + c % 10) as char);
            }
        }
    }
}

/// Converts a label to A-label (ACE) form for the conventional DNS wire.
/// Returns `None` when the label is plain ASCII and needs no conversion.
pub fn apply_idna(label: &[u8]) -> Result<Option<Vec<u8>>> {
    if label.is_ascii() {
        return Ok(None);
    }
    let s = std::str::from_utf8(label)
        .map_err(|_| WireError::InvalidName("Label is not valid UTF-8"))?;
    match idna::domain_to_ascii(s) {
        Ok(ace) => Ok(Some(ace.into_bytes())),
        Err(_) => Err(WireError::InvalidName("IDNA conversion failed")),
    }
}

/// Converts an A-label back to its U-label form for mDNS and LLMNR, which
/// carry UTF-8 on the wire. Labels that are not ACE, or that fail to
/// decode, pass through unchanged.
pub fn undo_idna(label: &[u8]) -> Result<Option<Vec<u8>>> {
    if !label.starts_with(b"xn--") {
        return Ok(None);
    }
    let s = match std::str::from_utf8(label) {
        Ok(s) => s,
        Err(_) => return Ok(None),
    };
    let (unicode, result) = idna::domain_to_unicode(s);
    match result {
        Ok(()) => Ok(Some(unicode.into_bytes())),
        Err(_) => Ok(None),
    }
}

/// Whether a name in presentation format refers to the root domain.
pub fn name_is_root(name: &str) -> bool {
    name.is_empty() || name == "."
}
