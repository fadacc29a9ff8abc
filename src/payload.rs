//! Cached payloads and the store-native number predicate.
//!
//! Counters live in the store as plain decimal strings so `INCRBY`/`DECRBY` can
//! operate on them. Numbers therefore bypass the codec in both directions, and
//! [`Numeric::parse`] is the one place that decides whether raw bytes are such a number.

use std::fmt;

/// A number stored verbatim in the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    /// Parse raw store content as a number.
    ///
    /// Accepts an optional sign, digits, an optional fraction and an optional
    /// exponent. Rejects empty input, surrounding whitespace, `inf` and `NaN`.
    pub fn parse(raw: &[u8]) -> Option<Numeric> {
        let text = std::str::from_utf8(raw).ok()?;
        if !looks_numeric(text) {
            return None;
        }
        if let Ok(n) = text.parse::<i64>() {
            return Some(Numeric::Int(n));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Numeric::Float)
    }

    /// Bytes written to the store for this number.
    ///
    /// Floats always carry a fraction or an exponent (`2.0`, `1e300`) so that
    /// [`parse`](Self::parse) reads them back as floats.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Numeric::Int(n) => n.to_string().into_bytes(),
            Numeric::Float(x) => format!("{:?}", x).into_bytes(),
        }
    }

    /// Whether the number can be stored and read back. `inf` and `NaN` cannot.
    pub fn is_finite(self) -> bool {
        match self {
            Numeric::Int(_) => true,
            Numeric::Float(x) => x.is_finite(),
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Numeric::Int(n) => Some(n),
            Numeric::Float(_) => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(n) => n as f64,
            Numeric::Float(f) => f,
        }
    }
}

fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    let mantissa_ok = match frac_part {
        Some(frac) => {
            all_digits(int_part) && all_digits(frac) && !(int_part.is_empty() && frac.is_empty())
        }
        None => !int_part.is_empty() && all_digits(int_part),
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && all_digits(digits)
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(n) => write!(f, "{}", n),
            Numeric::Float(x) => write!(f, "{}", x),
        }
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Numeric::Int(n)
    }
}

impl From<i32> for Numeric {
    fn from(n: i32) -> Self {
        Numeric::Int(n.into())
    }
}

impl From<u32> for Numeric {
    fn from(n: u32) -> Self {
        Numeric::Int(n.into())
    }
}

impl From<f64> for Numeric {
    fn from(f: f64) -> Self {
        Numeric::Float(f)
    }
}

/// Content handed to or returned from the adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload<V> {
    /// Stored verbatim, never passed through the codec.
    Number(Numeric),
    /// Passed through the codec on the way in and out.
    Value(V),
}

impl<V> Payload<V> {
    pub fn number(n: impl Into<Numeric>) -> Self {
        Payload::Number(n.into())
    }

    pub fn as_number(&self) -> Option<Numeric> {
        match self {
            Payload::Number(n) => Some(*n),
            Payload::Value(_) => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Payload::Value(v) => Some(v),
            Payload::Number(_) => None,
        }
    }
}
