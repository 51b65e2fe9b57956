//! Reads fixed-width ASCII fields from a frame payload.

/// Reader over one payload.
///
/// Every read consumes its full width, whether the field parses or not. The
/// position never moves past the end of the payload: a field that is cut off
/// by the end of the payload consumes what's left and fails to parse.
#[derive(Clone, Debug)]
pub struct FieldCursor<'a> {
    payload: &'a [u8],
    position: usize,
}

impl<'a> FieldCursor<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            position: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.payload.len() - self.position
    }

    /// Take the next `width` bytes.
    ///
    /// Returns `None` if less than `width` bytes are left, but advances to the
    /// end anyway.
    pub fn read_code(&mut self, width: usize) -> Option<&'a [u8]> {
        let start = self.position;
        let end = start.saturating_add(width).min(self.payload.len());
        self.position = end;
        (end - start == width).then(|| &self.payload[start..end])
    }

    pub fn skip(&mut self, width: usize) {
        self.read_code(width);
    }

    /// Read a base-10 number, possibly signed and fractional.
    ///
    /// Returns `NaN` if the field doesn't hold a number.
    pub fn read_decimal(&mut self, width: usize) -> f64 {
        self.read_code(width)
            .and_then(parse_decimal)
            .unwrap_or(f64::NAN)
    }

    /// Read an unsigned base-16 integer.
    pub fn read_hex(&mut self, width: usize) -> Option<u32> {
        self.read_code(width).and_then(parse_hex)
    }
}

/// Parses an ASCII decimal number. Surrounding spaces are allowed, the number
/// itself may only contain digits, a sign and a decimal point.
pub(crate) fn parse_decimal(field: &[u8]) -> Option<f64> {
    let field = field.trim_ascii();
    if field.is_empty()
        || !field
            .iter()
            .all(|byte| byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.'))
    {
        return None;
    }

    // the check above guarantees ASCII
    std::str::from_utf8(field).ok()?.parse().ok()
}

pub(crate) fn parse_hex(field: &[u8]) -> Option<u32> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }

    u32::from_str_radix(std::str::from_utf8(field).ok()?, 16).ok()
}
