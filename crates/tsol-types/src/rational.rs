//! Rational number literals.
//!
//! Numeric literals are typed as exact rationals until they are used in a
//! typed context. This module parses literal text (decimal, hex, scientific,
//! with a denomination suffix), evaluates operators between two literals
//! exactly, and derives the smallest integer or fixed point type that can
//! hold a value.

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::ctx::TypeCtx;
use crate::error::TypeError;
use crate::operators::Token;
use crate::ty::TypeId;

const LOG2_OF_10_AWAY_FROM_ZERO: f64 = 3.3219280948873624;

/// Literal suffix multiplying the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denomination {
    None,
    Nano,
    Micro,
    Milli,
    Ton,
    Kiloton,
    Megaton,
    Gigaton,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Year,
}

impl Denomination {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let denomination = match suffix {
            "" => Denomination::None,
            "nano" | "nanoton" | "nanoever" | "nTon" | "nEver" => Denomination::Nano,
            "micro" | "microton" | "microever" => Denomination::Micro,
            "milli" | "milliton" | "milliever" => Denomination::Milli,
            "ton" | "ever" | "Ton" | "Ever" => Denomination::Ton,
            "kiloton" | "kiloever" | "kTon" | "kEver" => Denomination::Kiloton,
            "megaton" | "megaever" | "MTon" | "MEver" => Denomination::Megaton,
            "gigaton" | "gigaever" | "GTon" | "GEver" => Denomination::Gigaton,
            "seconds" => Denomination::Second,
            "minutes" => Denomination::Minute,
            "hours" => Denomination::Hour,
            "days" => Denomination::Day,
            "weeks" => Denomination::Week,
            "years" => Denomination::Year,
            _ => return None,
        };
        Some(denomination)
    }

    pub fn multiplier(self) -> u64 {
        match self {
            Denomination::None | Denomination::Nano | Denomination::Second => 1,
            Denomination::Micro => 1_000,
            Denomination::Milli => 1_000_000,
            Denomination::Ton => 1_000_000_000,
            Denomination::Kiloton => 1_000_000_000_000,
            Denomination::Megaton => 1_000_000_000_000_000,
            Denomination::Gigaton => 1_000_000_000_000_000_000,
            Denomination::Minute => 60,
            Denomination::Hour => 3_600,
            Denomination::Day => 86_400,
            Denomination::Week => 604_800,
            Denomination::Year => 31_536_000,
        }
    }
}

// ── Parsing ────────────────────────────────────────────────────────────

fn parse_decimal_digits(digits: &str) -> Option<BigInt> {
    if digits.is_empty() {
        return Some(BigInt::zero());
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigInt::parse_bytes(digits.as_bytes(), 10)
}

/// Parse `123` or `1.25` into an exact rational.
pub fn parse_rational(text: &str) -> Option<BigRational> {
    if text.is_empty() {
        return None;
    }
    match text.split_once('.') {
        Some((integer, fraction)) => {
            let integer = parse_decimal_digits(integer)?;
            let fraction_value = parse_decimal_digits(fraction)?;
            let scale = num_traits::pow(BigInt::from(10), fraction.len());
            Some(BigRational::from_integer(integer) + BigRational::new(fraction_value, scale))
        }
        None => {
            if !text.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            BigInt::parse_bytes(text.as_bytes(), 10).map(BigRational::from_integer)
        }
    }
}

/// Parse the text of a numeric literal and apply its denomination.
///
/// Returns `None` for malformed literals and for exponents whose result
/// would exceed `precision_bits`.
pub fn parse_literal(text: &str, denomination: Denomination, precision_bits: u32) -> Option<BigRational> {
    let text: String = text.chars().filter(|c| *c != '_').collect();

    let value = if let Some(hex) = text.strip_prefix("0x") {
        BigRational::from_integer(BigInt::parse_bytes(hex.as_bytes(), 16)?)
    } else if let Some(exp_point) = text.find(['e', 'E']) {
        let mut value = parse_rational(&text[..exp_point])?;
        if value.is_zero() {
            return Some(value);
        }
        let exp: i32 = text[exp_point + 1..].parse().ok()?;
        let exp_abs = exp.unsigned_abs();
        let ten_pow = BigRational::from_integer(num_traits::pow(BigInt::from(10), exp_abs as usize));
        if exp < 0 {
            if !fits_precision_base_x(value.denom(), LOG2_OF_10_AWAY_FROM_ZERO, exp_abs, precision_bits) {
                return None;
            }
            value /= ten_pow;
        } else if exp > 0 {
            if !fits_precision_base_x(value.numer(), LOG2_OF_10_AWAY_FROM_ZERO, exp_abs, precision_bits) {
                return None;
            }
            value *= ten_pow;
        }
        value
    } else {
        parse_rational(&text)?
    };

    let value = value * BigRational::from_integer(BigInt::from(denomination.multiplier()));
    if exceeds_precision(&value, precision_bits) {
        return None;
    }
    Some(value)
}

/// Byte width of a hex literal that may stand in for `bytesN`.
pub fn hex_literal_bytes(text: &str) -> Option<u8> {
    let digits = text
        .strip_prefix("0x")?
        .chars()
        .filter(|c| *c != '_')
        .count();
    if digits % 2 == 0 && (2..=64).contains(&digits) {
        Some((digits / 2) as u8)
    } else {
        None
    }
}

// ── Precision ──────────────────────────────────────────────────────────

fn msb(value: &BigInt) -> u64 {
    value.bits().saturating_sub(1)
}

/// Whether `mantissa * base^exp` fits into `max_bits`, given `log2(base)`.
fn fits_precision_base_x(mantissa: &BigInt, log2_of_base: f64, exp: u32, max_bits: u32) -> bool {
    if mantissa.is_zero() {
        return true;
    }
    let mantissa_msb = msb(&mantissa.abs());
    if mantissa_msb > u64::from(max_bits) {
        return false;
    }
    let bits_needed = mantissa_msb as f64 + (log2_of_base * f64::from(exp)).ceil();
    bits_needed <= f64::from(max_bits)
}

fn fits_precision_exp(base: &BigInt, exp: u32, max_bits: u32) -> bool {
    if base.is_zero() {
        return true;
    }
    msb(&base.abs()).saturating_mul(u64::from(exp)) <= u64::from(max_bits)
}

/// True if the numerator or denominator of `value` needs more than `max_bits`.
pub fn exceeds_precision(value: &BigRational, max_bits: u32) -> bool {
    !value.numer().is_zero()
        && msb(&value.numer().abs()).max(msb(&value.denom().abs())) > u64::from(max_bits)
}

// ── Evaluation ─────────────────────────────────────────────────────────

pub fn is_fractional(value: &BigRational) -> bool {
    !value.is_integer()
}

pub fn evaluate_unary(op: Token, value: &BigRational) -> Option<BigRational> {
    match op {
        Token::BitNot => {
            if is_fractional(value) {
                None
            } else {
                Some(BigRational::from_integer(-value.numer() - BigInt::one()))
            }
        }
        Token::Sub => Some(-value.clone()),
        _ => None,
    }
}

fn to_shift_amount(right: &BigRational) -> Option<u32> {
    if right.is_negative() {
        return None;
    }
    right.numer().to_u32()
}

/// Evaluate `left op right` exactly. `Ok(None)` if the operator does not
/// apply to these values; a precision error if an exponentiation or a left
/// shift would need more than `precision_bits`.
pub fn evaluate_binary(
    op: Token,
    left: &BigRational,
    right: &BigRational,
    precision_bits: u32,
) -> Result<Option<BigRational>, TypeError> {
    let fractional = is_fractional(left) || is_fractional(right);
    let integer = |v: BigInt| Ok(Some(BigRational::from_integer(v)));
    match op {
        Token::BitOr if !fractional => integer(left.numer() | right.numer()),
        Token::BitXor if !fractional => integer(left.numer() ^ right.numer()),
        Token::BitAnd if !fractional => integer(left.numer() & right.numer()),
        Token::Add => Ok(Some(left + right)),
        Token::Sub => Ok(Some(left - right)),
        Token::Mul => Ok(Some(left * right)),
        Token::Div => {
            if right.is_zero() {
                Ok(None)
            } else {
                Ok(Some(left / right))
            }
        }
        Token::Mod => {
            if right.is_zero() {
                Ok(None)
            } else if fractional {
                let quotient = (left / right).trunc();
                Ok(Some(left - quotient * right))
            } else {
                // Truncated remainder: the sign follows the dividend.
                integer(left.numer() % right.numer())
            }
        }
        Token::Exp => {
            if is_fractional(right) {
                return Ok(None);
            }
            let exp = right.numer();
            if exp.is_zero() {
                return Ok(Some(BigRational::one()));
            }
            if left.is_zero() || left.is_one() {
                return Ok(Some(left.clone()));
            }
            if *left == -BigRational::one() {
                return Ok(Some(if exp.is_odd() {
                    -BigRational::one()
                } else {
                    BigRational::one()
                }));
            }
            let Some(abs_exp) = exp.abs().to_u32() else {
                return Ok(None);
            };
            if !fits_precision_exp(left.numer(), abs_exp, precision_bits)
                || !fits_precision_exp(left.denom(), abs_exp, precision_bits)
            {
                return Err(TypeError::Precision { bits: precision_bits });
            }
            let numer = num_traits::pow(left.numer().clone(), abs_exp as usize);
            let denom = num_traits::pow(left.denom().clone(), abs_exp as usize);
            if exp.sign() == Sign::Minus {
                Ok(Some(BigRational::new(denom, numer)))
            } else {
                Ok(Some(BigRational::new(numer, denom)))
            }
        }
        Token::Shl => {
            if fractional {
                return Ok(None);
            }
            let Some(amount) = to_shift_amount(right) else {
                return Ok(None);
            };
            if left.numer().is_zero() {
                return Ok(Some(BigRational::zero()));
            }
            if !fits_precision_base_x(left.numer(), 1.0, amount, precision_bits) {
                return Err(TypeError::Precision { bits: precision_bits });
            }
            integer(left.numer() << amount as usize)
        }
        Token::Sar => {
            if fractional {
                return Ok(None);
            }
            let Some(amount) = to_shift_amount(right) else {
                return Ok(None);
            };
            let numer = left.numer();
            if numer.is_zero() {
                return Ok(Some(BigRational::zero()));
            }
            if u64::from(amount) > msb(&numer.abs()) {
                return integer(if numer.is_negative() {
                    -BigInt::one()
                } else {
                    BigInt::zero()
                });
            }
            // Floor division by a power of two.
            integer(numer.div_floor(&(BigInt::one() << amount as usize)))
        }
        _ => Ok(None),
    }
}

// ── Display ────────────────────────────────────────────────────────────

/// Abbreviate numbers with more than 32 digits.
pub fn readable_bigint(value: &BigInt) -> String {
    let text = value.to_string();
    if text.len() > 32 {
        let omitted = text.len() - 8;
        format!(
            "{}...({} digits omitted)...{}",
            &text[..4],
            omitted,
            &text[text.len() - 4..]
        )
    } else {
        text
    }
}

pub fn readable_rational(value: &BigRational) -> String {
    if value.is_integer() {
        format!("int_const {}", readable_bigint(value.numer()))
    } else {
        format!(
            "rational_const {} / {}",
            readable_bigint(value.numer()),
            readable_bigint(value.denom())
        )
    }
}

/// Number of bytes needed to hold a non-negative value.
fn number_encoding_size(value: &BigInt) -> u16 {
    value.bits().div_ceil(8) as u16
}

fn max_u256() -> BigInt {
    (BigInt::one() << 256usize) - BigInt::one()
}

// ── Mobile types ───────────────────────────────────────────────────────

impl TypeCtx {
    /// Parse literal text into a rational number type. Hex literals of an
    /// even number of digits remember their byte width.
    pub fn rational_literal(&mut self, text: &str, denomination: Denomination) -> Option<TypeId> {
        let value = parse_literal(text, denomination, self.config().precision_bits)?;
        let bytes = if denomination == Denomination::None {
            hex_literal_bytes(text)
        } else {
            None
        };
        Some(match bytes {
            Some(bytes) => self.rational_with_bytes(value, bytes),
            None => self.rational(value),
        })
    }

    /// The smallest integer type holding the integral value `value`.
    pub fn integer_type_of(&mut self, value: &BigRational) -> Option<TypeId> {
        tsol_common::tsol_assert!(!is_fractional(value), "integerType() called for fractional number.");
        let mut v = value.numer().clone();
        let negative = v.is_negative();
        if negative {
            v = (-v - BigInt::one()) << 1usize;
        }
        if v > max_u256() {
            return None;
        }
        let bytes = number_encoding_size(&v).max(1);
        Some(self.integer(bytes * 8, negative))
    }

    /// The smallest fixed point type holding `value` exactly, or truncated
    /// after the maximum number of fractional digits.
    pub fn fixed_point_type_of(&mut self, value: &BigRational) -> Option<TypeId> {
        let negative = value.is_negative();
        let max_fractional_digits = self.config().max_fractional_digits;
        let mut fractional_digits: u32 = 0;
        let mut v = value.abs();
        let max_value = BigRational::from_integer(if negative {
            BigInt::one() << 255usize
        } else {
            max_u256()
        });
        let ten = BigRational::from_integer(BigInt::from(10));
        while &v * &ten <= max_value && !v.is_integer() && fractional_digits < max_fractional_digits {
            v *= &ten;
            fractional_digits += 1;
        }
        if v > max_value {
            return None;
        }
        let mut truncated = v.to_integer();
        if negative && !truncated.is_zero() {
            truncated = (truncated - BigInt::one()) << 1usize;
        }
        if truncated > max_u256() {
            return None;
        }
        let bytes = number_encoding_size(&truncated).max(1);
        Some(self.fixed_point(bytes * 8, fractional_digits as u16, negative))
    }

    /// Integer type for integral values, fixed point type otherwise.
    pub(crate) fn rational_mobile(&mut self, value: &BigRational) -> Option<TypeId> {
        if is_fractional(value) {
            self.fixed_point_type_of(value)
        } else {
            self.integer_type_of(value)
        }
    }
}
