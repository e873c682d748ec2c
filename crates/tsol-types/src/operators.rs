//! Result types of unary and binary operators.
//!
//! Each category decides which operators it accepts and what they produce.
//! A rule returns `Ok(None)` when the operator simply does not apply and an
//! error when there is something specific to report, e.g. a negative
//! literal exponent.

use num_traits::Signed;

use crate::ctx::TypeCtx;
use crate::error::{TypeError, TypeResult};
use crate::rational::{self, is_fractional};
use crate::ty::{ArrayKind, FunctionKind, Type, TypeId};

/// Operator tokens that reach the type layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    // Binary arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    // Shifts: `<<`, `>>` (arithmetic), `>>>` (logical, rejected)
    Shl,
    Sar,
    Shr,
    // Bitwise
    BitOr,
    BitXor,
    BitAnd,
    // Boolean
    And,
    Or,
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    // Unary only
    Not,
    BitNot,
    Inc,
    Dec,
    Delete,
}

impl Token {
    pub fn is_compare_op(self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::NotEqual
                | Token::LessThan
                | Token::GreaterThan
                | Token::LessThanOrEqual
                | Token::GreaterThanOrEqual
        )
    }

    pub fn is_shift_op(self) -> bool {
        matches!(self, Token::Shl | Token::Sar | Token::Shr)
    }

    pub fn is_bit_op(self) -> bool {
        matches!(self, Token::BitOr | Token::BitXor | Token::BitAnd | Token::BitNot)
    }

    pub fn is_boolean_op(self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Token::Add => "+",
            Token::Sub => "-",
            Token::Mul => "*",
            Token::Div => "/",
            Token::Mod => "%",
            Token::Exp => "**",
            Token::Shl => "<<",
            Token::Sar => ">>",
            Token::Shr => ">>>",
            Token::BitOr => "|",
            Token::BitXor => "^",
            Token::BitAnd => "&",
            Token::And => "&&",
            Token::Or => "||",
            Token::Equal => "==",
            Token::NotEqual => "!=",
            Token::LessThan => "<",
            Token::GreaterThan => ">",
            Token::LessThanOrEqual => "<=",
            Token::GreaterThanOrEqual => ">=",
            Token::Not => "!",
            Token::BitNot => "~",
            Token::Inc => "++",
            Token::Dec => "--",
            Token::Delete => "delete",
        }
    }
}

impl TypeCtx {
    /// Whether `amount` may be the right operand of the shift `op`.
    fn is_valid_shift_amount(&mut self, op: Token, amount: TypeId) -> bool {
        if op == Token::Shr {
            return false;
        }
        match self.get(amount).clone() {
            Type::Integer(int) => !int.signed,
            Type::RationalNumber(number) => {
                !is_fractional(&number.value)
                    && self
                        .integer_type_of(&number.value)
                        .is_some_and(|int| matches!(self.get(int), Type::Integer(i) if !i.signed))
            }
            _ => false,
        }
    }

    // ── Unary ──────────────────────────────────────────────────────────

    /// Result type of applying the prefix operator `op` to a value of type `id`.
    pub fn unary_operator_result(&mut self, id: TypeId, op: Token) -> TypeResult {
        let empty = self.prims().empty_tuple;
        let delete_only = if op == Token::Delete { Some(empty) } else { None };
        let result = match self.get(id).clone() {
            Type::Integer(int) => match op {
                Token::Delete => Some(empty),
                Token::Sub if !int.signed => {
                    return Err(TypeError::operator(
                        "Unary negation is only allowed for signed integers.",
                    ))
                }
                Token::Sub | Token::Inc | Token::Dec | Token::BitNot => Some(id),
                _ => None,
            },
            Type::FixedPoint(_) => match op {
                Token::Delete => Some(empty),
                Token::Add | Token::Sub | Token::Inc | Token::Dec => Some(id),
                _ => None,
            },
            Type::RationalNumber(number) => {
                rational::evaluate_unary(op, &number.value).map(|value| self.rational(value))
            }
            Type::FixedBytes(_) => match op {
                Token::Delete => Some(empty),
                Token::BitNot => Some(id),
                _ => None,
            },
            Type::Bool => match op {
                Token::Delete => Some(empty),
                Token::Not => Some(id),
                _ => None,
            },
            Type::Contract { is_super: true, .. } => None,
            Type::Contract { .. }
            | Type::Address
            | Type::Enum(_)
            | Type::Struct { .. }
            | Type::Array(_)
            | Type::Mapping { .. }
            | Type::Optional(_)
            | Type::Function(_)
            | Type::VarInteger(_)
            | Type::TvmCell
            | Type::TvmSlice
            | Type::TvmBuilder
            | Type::TvmVector(_)
            | Type::ExtraCurrencyCollection => delete_only,
            Type::StringLiteral(_)
            | Type::UserDefinedValueType(_)
            | Type::ArraySlice(_)
            | Type::Tuple(_)
            | Type::Modifier(_)
            | Type::Module(_)
            | Type::TypeType(_)
            | Type::Magic(_)
            | Type::Null
            | Type::EmptyMap
            | Type::Variant
            | Type::InaccessibleDynamic => None,
        };
        Ok(result)
    }

    // ── Binary ─────────────────────────────────────────────────────────

    /// Result type of `left op right`, where `left` decides the rule.
    pub fn binary_operator_result(&mut self, left: TypeId, op: Token, right: TypeId) -> TypeResult {
        match self.get(left).clone() {
            Type::Integer(_) => self.integer_binary(left, op, right),
            Type::FixedPoint(_) => {
                let Some(common) = self.common_type(left, right) else {
                    return Ok(None);
                };
                if op.is_compare_op() {
                    Ok(Some(common))
                } else if op.is_bit_op() || op.is_boolean_op() || op == Token::Exp {
                    Ok(None)
                } else {
                    Ok(Some(common))
                }
            }
            Type::VarInteger(var) => {
                let int = self.integer(var.as_integer().bits, var.signed);
                let Some(result) = self.integer_binary(int, op, right)? else {
                    return Ok(None);
                };
                if self.is_implicitly_convertible(result, left).is_ok() {
                    Ok(Some(left))
                } else {
                    Ok(Some(result))
                }
            }
            Type::RationalNumber(_) => self.rational_binary(left, op, right),
            Type::StringLiteral(_) => {
                if op == Token::Add && (self.is_fixed_bytes(right) || self.is_string_or_literal(right)) {
                    Ok(Some(self.prims().string))
                } else if op.is_compare_op() {
                    Ok(self.common_type(left, right))
                } else {
                    Ok(None)
                }
            }
            Type::FixedBytes(_) => {
                if op == Token::Add && self.is_string_or_literal(right) {
                    return Ok(Some(self.prims().string));
                }
                if op.is_shift_op() {
                    return Ok(self.is_valid_shift_amount(op, right).then_some(left));
                }
                let common = self
                    .common_type(left, right)
                    .filter(|&common| self.is_fixed_bytes(common));
                match common {
                    Some(common) if op.is_compare_op() || op.is_bit_op() => Ok(Some(common)),
                    _ => Ok(None),
                }
            }
            Type::Address => {
                if !op.is_compare_op() {
                    return Err(TypeError::operator(
                        "Arithmetic operations on addresses are not supported. Convert to integer first before using them.",
                    ));
                }
                Ok(self.common_type(left, right))
            }
            Type::Bool => {
                let applies = matches!(self.get(right), Type::Bool)
                    && matches!(op, Token::Equal | Token::NotEqual | Token::And | Token::Or);
                Ok(applies.then_some(right))
            }
            Type::Array(array) => {
                if array.kind == ArrayKind::String {
                    if op == Token::Add
                        && (self.is_fixed_bytes(right) || self.is_string_or_literal(right))
                    {
                        return Ok(Some(self.prims().string));
                    }
                    if op.is_compare_op() {
                        return Ok(self.common_type(left, right));
                    }
                }
                if array.kind == ArrayKind::Bytes && matches!(op, Token::Equal | Token::NotEqual) {
                    return Ok(self.common_type(left, right));
                }
                Ok(None)
            }
            Type::Function(function) => {
                if !matches!(op, Token::Equal | Token::NotEqual) {
                    return Ok(None);
                }
                let Type::Function(other) = self.get(right) else {
                    return Ok(None);
                };
                let comparable = match (function.kind, other.kind) {
                    (FunctionKind::Internal, FunctionKind::Internal) => true,
                    (FunctionKind::External, FunctionKind::External) => {
                        !function.bound() && !other.bound()
                    }
                    _ => false,
                };
                if comparable {
                    Ok(self.common_type(left, right))
                } else {
                    Ok(None)
                }
            }
            Type::TvmCell => {
                let applies = matches!(self.get(right), Type::TvmCell)
                    && matches!(op, Token::Equal | Token::NotEqual);
                Ok(applies.then_some(right))
            }
            Type::Contract { .. }
            | Type::Enum(_)
            | Type::UserDefinedValueType(_)
            | Type::Struct { .. }
            | Type::ArraySlice(_)
            | Type::Mapping { .. }
            | Type::Optional(_)
            | Type::Tuple(_)
            | Type::Modifier(_)
            | Type::Module(_)
            | Type::TypeType(_)
            | Type::Magic(_)
            | Type::Null
            | Type::EmptyMap
            | Type::Variant
            | Type::TvmSlice
            | Type::TvmBuilder
            | Type::TvmVector(_)
            | Type::ExtraCurrencyCollection
            | Type::InaccessibleDynamic => Ok(None),
        }
    }

    fn is_fixed_bytes(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::FixedBytes(_))
    }

    fn is_string_or_literal(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::StringLiteral(_) => true,
            Type::Array(array) => array.is_string(),
            _ => false,
        }
    }

    fn integer_binary(&mut self, left: TypeId, op: Token, right: TypeId) -> TypeResult {
        if !matches!(
            self.get(right),
            Type::RationalNumber(_) | Type::FixedPoint(_) | Type::VarInteger(_) | Type::Integer(_)
        ) {
            return Ok(None);
        }
        if op.is_shift_op() {
            return Ok(self.is_valid_shift_amount(op, right).then_some(left));
        }
        if op == Token::Exp {
            match self.get(right).clone() {
                Type::Integer(int) if int.signed => {
                    return Err(TypeError::operator(
                        "Exponentiation power is not allowed to be a signed integer type.",
                    ))
                }
                Type::FixedPoint(_) => return Ok(None),
                Type::RationalNumber(number) => {
                    if is_fractional(&number.value) {
                        return Err(TypeError::operator("Exponent is fractional."));
                    }
                    if self.integer_type_of(&number.value).is_none() {
                        return Err(TypeError::operator("Exponent too large."));
                    }
                    if number.value.is_negative() {
                        return Err(TypeError::operator(
                            "Exponentiation power is not allowed to be a negative integer literal.",
                        ));
                    }
                }
                _ => {}
            }
            return Ok(Some(left));
        }
        let Some(common) = self.common_type(left, right) else {
            return Ok(None);
        };
        if op.is_compare_op() {
            return Ok(Some(common));
        }
        if op.is_boolean_op() {
            return Ok(None);
        }
        Ok(Some(common))
    }

    fn rational_binary(&mut self, left: TypeId, op: Token, right: TypeId) -> TypeResult {
        let Type::RationalNumber(number) = self.get(left).clone() else {
            return Ok(None);
        };
        match self.get(right).clone() {
            Type::Integer(_) | Type::FixedPoint(_) => {
                if is_fractional(&number.value) {
                    return Err(TypeError::operator("Fractional literals not supported."));
                }
                if self.integer_type_of(&number.value).is_none() {
                    return Err(TypeError::operator("Literal too large."));
                }
                let wide = if number.value.is_negative() {
                    self.prims().int256
                } else {
                    self.prims().uint256
                };
                if op.is_shift_op() {
                    return Ok(self.is_valid_shift_amount(op, right).then_some(wide));
                }
                if op == Token::Exp {
                    return match self.get(right) {
                        Type::Integer(int) if int.signed => Err(TypeError::operator(
                            "Exponentiation power is not allowed to be a signed integer type.",
                        )),
                        Type::FixedPoint(_) => Err(TypeError::operator("Exponent is fractional.")),
                        _ => Ok(Some(wide)),
                    };
                }
                match self.common_type(left, right) {
                    Some(common) => self.binary_operator_result(common, op, right),
                    None => Ok(None),
                }
            }
            Type::RationalNumber(other) => {
                if op.is_compare_op() {
                    let this_mobile = self.mobile_type(left);
                    let other_mobile = self.mobile_type(right);
                    return match (this_mobile, other_mobile) {
                        (Some(a), Some(b)) => self.binary_operator_result(a, op, b),
                        _ => Ok(None),
                    };
                }
                let precision_bits = self.config().precision_bits;
                match rational::evaluate_binary(op, &number.value, &other.value, precision_bits)? {
                    Some(value) => {
                        if rational::exceeds_precision(&value, precision_bits) {
                            return Err(TypeError::Precision {
                                bits: precision_bits,
                            });
                        }
                        Ok(Some(self.rational(value)))
                    }
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn token_traits() {
        assert!(Token::LessThanOrEqual.is_compare_op());
        assert!(Token::Shr.is_shift_op());
        assert!(Token::BitNot.is_bit_op());
        assert!(!Token::Shl.is_bit_op());
        assert!(Token::Not.is_boolean_op());
        assert_eq!(Token::Exp.as_str(), "**");
    }

    #[test]
    fn integer_unary() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert_eq!(ctx.unary_operator_result(p.int8, Token::Sub), Ok(Some(p.int8)));
        assert_eq!(
            ctx.unary_operator_result(p.uint8, Token::Sub),
            Err(TypeError::operator("Unary negation is only allowed for signed integers."))
        );
        assert_eq!(ctx.unary_operator_result(p.uint8, Token::Delete), Ok(Some(p.empty_tuple)));
        assert_eq!(ctx.unary_operator_result(p.uint8, Token::Not), Ok(None));
        assert_eq!(ctx.unary_operator_result(p.bool, Token::Not), Ok(Some(p.bool)));
    }

    #[test]
    fn integer_binary_uses_common_type() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::Add, p.uint256), Ok(Some(p.uint256)));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::LessThan, p.uint32), Ok(Some(p.uint32)));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::And, p.uint8), Ok(None));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::Add, p.int8), Ok(None));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::Add, p.bool), Ok(None));
    }

    #[test]
    fn integer_shifts_and_powers() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert_eq!(ctx.binary_operator_result(p.int8, Token::Shl, p.uint256), Ok(Some(p.int8)));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::Shl, p.int8), Ok(None));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::Shr, p.uint8), Ok(None));
        assert_eq!(
            ctx.binary_operator_result(p.uint8, Token::Exp, p.int8),
            Err(TypeError::operator("Exponentiation power is not allowed to be a signed integer type."))
        );
        let half = ctx.rational(rat(1, 2));
        assert_eq!(
            ctx.binary_operator_result(p.uint8, Token::Exp, half),
            Err(TypeError::operator("Exponent is fractional."))
        );
        let minus_two = ctx.rational(rat(-2, 1));
        assert_eq!(
            ctx.binary_operator_result(p.uint8, Token::Exp, minus_two),
            Err(TypeError::operator(
                "Exponentiation power is not allowed to be a negative integer literal."
            ))
        );
        let three = ctx.rational(rat(3, 1));
        assert_eq!(ctx.binary_operator_result(p.uint8, Token::Exp, three), Ok(Some(p.uint8)));
    }

    #[test]
    fn literal_arithmetic_is_exact() {
        let mut ctx = TypeCtx::new();
        let a = ctx.rational(rat(1, 2));
        let b = ctx.rational(rat(1, 3));
        let expected = ctx.rational(rat(5, 6));
        assert_eq!(ctx.binary_operator_result(a, Token::Add, b), Ok(Some(expected)));
        let zero = ctx.rational(rat(0, 1));
        assert_eq!(ctx.binary_operator_result(a, Token::Div, zero), Ok(None));
        let minus_half = ctx.rational(rat(-1, 2));
        assert_eq!(ctx.unary_operator_result(a, Token::Sub), Ok(Some(minus_half)));
    }

    #[test]
    fn literal_with_integer_operand() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let one = ctx.rational(rat(1, 1));
        let minus_one = ctx.rational(rat(-1, 1));
        let half = ctx.rational(rat(1, 2));
        assert_eq!(ctx.binary_operator_result(one, Token::Add, p.uint32), Ok(Some(p.uint32)));
        assert_eq!(ctx.binary_operator_result(one, Token::Shl, p.uint8), Ok(Some(p.uint256)));
        assert_eq!(ctx.binary_operator_result(minus_one, Token::Exp, p.uint8), Ok(Some(p.int256)));
        assert_eq!(
            ctx.binary_operator_result(half, Token::Add, p.uint8),
            Err(TypeError::operator("Fractional literals not supported."))
        );
    }

    #[test]
    fn literal_precision_limit() {
        let mut ctx = TypeCtx::new();
        let big = BigRational::from_integer(BigInt::from(1) << 3000usize);
        let a = ctx.rational(big.clone());
        let b = ctx.rational(big);
        assert_eq!(
            ctx.binary_operator_result(a, Token::Mul, b),
            Err(TypeError::Precision { bits: 4096 })
        );
    }

    #[test]
    fn literal_comparison_uses_mobile_types() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let one = ctx.rational(rat(1, 1));
        let big = ctx.rational(rat(300, 1));
        assert_eq!(ctx.binary_operator_result(one, Token::LessThan, big), Ok(Some(p.uint16)));
    }

    #[test]
    fn bytes_and_strings() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        let lit = ctx.string_literal("ab");
        assert_eq!(ctx.binary_operator_result(p.bytes4, Token::Add, lit), Ok(Some(p.string)));
        assert_eq!(ctx.binary_operator_result(p.string, Token::Add, p.bytes4), Ok(Some(p.string)));
        assert_eq!(ctx.binary_operator_result(p.bytes4, Token::BitAnd, p.bytes32), Ok(Some(p.bytes32)));
        assert_eq!(ctx.binary_operator_result(p.bytes4, Token::Add, p.bytes4), Ok(None));
        assert_eq!(ctx.binary_operator_result(p.bytes, Token::Equal, p.bytes), Ok(Some(p.bytes)));
        assert_eq!(ctx.binary_operator_result(p.bytes, Token::LessThan, p.bytes), Ok(None));
    }

    #[test]
    fn address_arithmetic_is_rejected() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert!(matches!(
            ctx.binary_operator_result(p.address, Token::Add, p.address),
            Err(TypeError::Operator { .. })
        ));
        assert_eq!(ctx.binary_operator_result(p.address, Token::Equal, p.address), Ok(Some(p.address)));
    }

    #[test]
    fn var_integer_keeps_its_type() {
        let mut ctx = TypeCtx::new();
        let p = *ctx.prims();
        assert_eq!(
            ctx.binary_operator_result(p.var_uint16, Token::Add, p.uint8),
            Ok(Some(p.var_uint16))
        );
        assert_eq!(
            ctx.binary_operator_result(p.var_uint16, Token::Add, p.uint256),
            Ok(Some(p.uint256))
        );
    }
}
