//! Fixed-point decimal representation for the `decimal` logical type.

use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

/// A decimal number: an unscaled two's complement integer and a scale.
///
/// The value is `unscaled * 10^-scale`. Decimals up to 38 digits fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: i128,
    scale: u32,
}

impl Decimal {
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Number of decimal digits in the unscaled value.
    pub fn precision(&self) -> u32 {
        let mut abs = self.unscaled.unsigned_abs();
        let mut digits = 1;
        while abs >= 10 {
            abs /= 10;
            digits += 1;
        }
        digits
    }

    /// The same value at a larger scale. Reducing the scale would round, so
    /// it is refused.
    pub fn rescale(&self, scale: u32) -> Result<Self, ConversionError> {
        if scale == self.scale {
            return Ok(*self);
        }
        if scale < self.scale {
            return Err(ConversionError::OutOfRange(format!(
                "cannot encode decimal with scale {} as scale {} without rounding",
                self.scale, scale
            )));
        }
        let factor = 10i128
            .checked_pow(scale - self.scale)
            .and_then(|f| self.unscaled.checked_mul(f))
            .ok_or_else(|| {
                ConversionError::OutOfRange(format!("{} does not fit at scale {}", self, scale))
            })?;
        Ok(Self::new(factor, scale))
    }

    /// Decode a big-endian two's complement unscaled value.
    pub fn from_be_bytes(bytes: &[u8], scale: u32) -> Result<Self, ConversionError> {
        if bytes.is_empty() {
            return Ok(Self::new(0, scale));
        }
        let is_negative = bytes[0] & 0x80 != 0;
        let sign_byte = if is_negative { 0xFF } else { 0x00 };
        // Sign extension bytes beyond 16 carry no information.
        let significant = bytes.len().saturating_sub(16);
        if bytes[..significant].iter().any(|&b| b != sign_byte)
            || (significant > 0 && (bytes[significant] & 0x80 != 0) != is_negative)
        {
            return Err(ConversionError::OutOfRange(format!(
                "decimal of {} bytes does not fit in 128 bits",
                bytes.len()
            )));
        }
        let mut value: i128 = if is_negative { -1 } else { 0 };
        for &byte in &bytes[significant..] {
            value = (value << 8) | i128::from(byte);
        }
        Ok(Self::new(value, scale))
    }

    /// The shortest big-endian two's complement encoding of the unscaled value.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let full = self.unscaled.to_be_bytes();
        let sign_byte = if self.unscaled < 0 { 0xFF } else { 0x00 };
        let mut start = 0;
        while start < full.len() - 1
            && full[start] == sign_byte
            && (full[start + 1] & 0x80) == (sign_byte & 0x80)
        {
            start += 1;
        }
        full[start..].to_vec()
    }

    /// The unscaled value sign-extended to exactly `size` bytes.
    pub fn to_fixed_bytes(&self, size: usize) -> Result<Vec<u8>, ConversionError> {
        let minimal = self.to_be_bytes();
        if minimal.len() > size {
            return Err(ConversionError::OutOfRange(format!(
                "{} needs {} bytes, fixed size is {}",
                self,
                minimal.len(),
                size
            )));
        }
        let sign_byte = if self.unscaled < 0 { 0xFF } else { 0x00 };
        let mut out = vec![sign_byte; size - minimal.len()];
        out.extend_from_slice(&minimal);
        Ok(out)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let abs = self.unscaled.unsigned_abs();
        let Some(divisor) = 10u128.checked_pow(self.scale) else {
            return write!(f, "{}E-{}", self.unscaled, self.scale);
        };
        let sign = if self.unscaled < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0>width$}",
            sign,
            abs / divisor,
            abs % divisor,
            width = self.scale as usize
        )
    }
}

impl FromStr for Decimal {
    type Err = ConversionError;

    /// Parse plain decimal notation such as `-12.340`. The scale is the
    /// number of digits after the point.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConversionError::UnsupportedValue {
            logical_type: "decimal".to_string(),
            found: format!("{:?}", s),
        };
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let mut unscaled: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c.to_digit(10).ok_or_else(invalid)?;
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add(i128::from(digit)))
                .ok_or_else(|| ConversionError::OutOfRange(format!("decimal too large: {}", s)))?;
        }
        if negative {
            unscaled = -unscaled;
        }
        let scale = u32::try_from(frac_part.len())
            .map_err(|_| ConversionError::OutOfRange(format!("decimal scale too large: {}", s)))?;
        Ok(Self::new(unscaled, scale))
    }
}
