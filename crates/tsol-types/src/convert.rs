//! Conversion rules between types.
//!
//! Implicit conversion decides whether a value of one type may stand in for
//! another without a cast. Explicit conversion widens it with the lossy and
//! reinterpreting casts each category allows. Both are directed relations and
//! both hold for every type onto itself.
//!
//! The mobile type of a literal or slice is the runtime type it settles into,
//! and [`TypeCtx::common_type`] uses it to find the result type of binary
//! operators and conditionals.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::ctx::TypeCtx;
use crate::error::BoolResult;
use crate::rational::is_fractional;
use crate::ty::{
    ArrayKind, FixedPointType, FunctionKind, FunctionType, IntegerType, RationalNumberType, Type,
    TypeId,
};

// ── Integer ranges ─────────────────────────────────────────────────────

pub(crate) fn integer_min(int: IntegerType) -> BigInt {
    if int.signed {
        -(BigInt::one() << (int.bits as usize - 1))
    } else {
        BigInt::zero()
    }
}

pub(crate) fn integer_max(int: IntegerType) -> BigInt {
    if int.signed {
        (BigInt::one() << (int.bits as usize - 1)) - 1
    } else {
        (BigInt::one() << int.bits as usize) - 1
    }
}

fn ten_pow(exp: u16) -> BigInt {
    num_traits::pow(BigInt::from(10), exp as usize)
}

/// Largest integer a fixed point type can hold.
pub(crate) fn fixed_max_integer(fixed: FixedPointType) -> BigInt {
    let magnitude_bits = fixed.total_bits as usize - usize::from(fixed.signed);
    ((BigInt::one() << magnitude_bits) - 1) / ten_pow(fixed.fractional_digits)
}

/// Smallest integer a fixed point type can hold.
pub(crate) fn fixed_min_integer(fixed: FixedPointType) -> BigInt {
    if fixed.signed {
        -(BigInt::one() << (fixed.total_bits as usize - 1)) / ten_pow(fixed.fractional_digits)
    } else {
        BigInt::zero()
    }
}

impl TypeCtx {
    // ── Equality ───────────────────────────────────────────────────────

    /// Semantic type equality.
    ///
    /// Interning makes handle equality sufficient in most cases. Function
    /// types compare without parameter names or declarations, and struct
    /// types compare by declaration regardless of their pointer flag.
    pub fn types_equal(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Type::Function(x), Type::Function(y)) => {
                self.equal_excluding_mutability(x, y) && x.mutability == y.mutability
            }
            (Type::Struct { id: x, .. }, Type::Struct { id: y, .. }) => x == y,
            (Type::Array(x), Type::Array(y)) => {
                x.kind == y.kind
                    && x.is_pointer == y.is_pointer
                    && x.length == y.length
                    && self.types_equal(x.base, y.base)
            }
            (Type::ArraySlice(x), Type::ArraySlice(y))
            | (Type::Optional(x), Type::Optional(y))
            | (Type::TvmVector(x), Type::TvmVector(y))
            | (Type::TypeType(x), Type::TypeType(y)) => self.types_equal(*x, *y),
            (
                Type::Mapping { key: k1, value: v1 },
                Type::Mapping { key: k2, value: v2 },
            ) => self.types_equal(*k1, *k2) && self.types_equal(*v1, *v2),
            (Type::Tuple(xs), Type::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(x, y)| match (x, y) {
                        (Some(x), Some(y)) => self.types_equal(*x, *y),
                        (None, None) => true,
                        _ => false,
                    })
            }
            (Type::Modifier(xs), Type::Modifier(ys)) => self.lists_equal(xs, ys),
            _ => false,
        }
    }

    fn lists_equal(&self, xs: &[TypeId], ys: &[TypeId]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.types_equal(*x, *y))
    }

    /// Function type equality ignoring state mutability, names and declaration.
    pub fn equal_excluding_mutability(&self, a: &FunctionType, b: &FunctionType) -> bool {
        a.kind == b.kind
            && a.options == b.options
            && self.lists_equal(&a.params, &b.params)
            && self.lists_equal(&a.returns, &b.returns)
    }

    // ── Implicit conversion ────────────────────────────────────────────

    /// Whether a value of type `from` may be used where `to` is expected.
    pub fn is_implicitly_convertible(&mut self, from: TypeId, to: TypeId) -> BoolResult {
        if self.default_implicit(from, to) {
            return BoolResult::ok();
        }
        match self.get(from).clone() {
            Type::Integer(int) => self.integer_implicit(int, to),
            Type::FixedPoint(fixed) => self.fixed_implicit(fixed, to),
            Type::VarInteger(var) => {
                let int = self.integer(var.as_integer().bits, var.signed);
                self.is_implicitly_convertible(int, to)
            }
            Type::RationalNumber(number) => self.rational_implicit(&number, to),
            Type::StringLiteral(value) => self.string_literal_implicit(&value, to),
            Type::FixedBytes(n) => {
                matches!(self.get(to), Type::FixedBytes(m) if *m >= n).into()
            }
            Type::Address => matches!(self.get(to), Type::Address).into(),
            Type::Contract { id, is_super } => {
                if is_super {
                    return BoolResult::no();
                }
                match *self.get(to) {
                    Type::Contract {
                        id: target,
                        is_super: false,
                    } => self.decls().derives_from(id, target).into(),
                    Type::Address => BoolResult::ok(),
                    _ => BoolResult::no(),
                }
            }
            Type::Struct { id, .. } => {
                matches!(self.get(to), Type::Struct { id: target, .. } if *target == id).into()
            }
            Type::Array(_) => self.array_implicit(from, to).into(),
            Type::ArraySlice(array) => {
                let dynamic = matches!(self.get(array), Type::Array(a) if a.is_dynamically_sized());
                (dynamic && self.types_equal(array, to)).into()
            }
            Type::Function(function) => self.function_implicit(&function, to),
            Type::Tuple(components) => self.tuple_implicit(&components, to),
            Type::Optional(inner) => match *self.get(to) {
                Type::Optional(target) => self.is_implicitly_convertible(inner, target),
                _ => BoolResult::no(),
            },
            Type::Null => matches!(self.get(to), Type::Optional(_) | Type::Null).into(),
            Type::EmptyMap => matches!(self.get(to), Type::Mapping { .. } | Type::EmptyMap).into(),
            Type::Bool
            | Type::Enum(_)
            | Type::UserDefinedValueType(_)
            | Type::Mapping { .. }
            | Type::Modifier(_)
            | Type::Module(_)
            | Type::TypeType(_)
            | Type::Magic(_)
            | Type::Variant
            | Type::TvmCell
            | Type::TvmSlice
            | Type::TvmBuilder
            | Type::TvmVector(_)
            | Type::ExtraCurrencyCollection
            | Type::InaccessibleDynamic => BoolResult::no(),
        }
    }

    /// Identity, or conversion into the value type of an optional target.
    fn default_implicit(&mut self, from: TypeId, to: TypeId) -> bool {
        if self.types_equal(from, to) {
            return true;
        }
        match *self.get(to) {
            Type::Optional(inner) => self.is_implicitly_convertible(from, inner).is_ok(),
            _ => false,
        }
    }

    fn integer_implicit(&mut self, int: IntegerType, to: TypeId) -> BoolResult {
        match *self.get(to) {
            Type::VarInteger(var) => {
                let target = var.as_integer();
                if target.bits < int.bits {
                    BoolResult::no()
                } else if int.signed {
                    target.signed.into()
                } else {
                    (!target.signed || target.bits > int.bits).into()
                }
            }
            Type::Integer(target) => (int.signed == target.signed && target.bits >= int.bits).into(),
            Type::FixedPoint(fixed) => (integer_max(int) <= fixed_max_integer(fixed)
                && integer_min(int) >= fixed_min_integer(fixed))
            .into(),
            Type::Function(ref function) => (function.kind == FunctionKind::Internal).into(),
            _ => BoolResult::no(),
        }
    }

    fn fixed_implicit(&mut self, fixed: FixedPointType, to: TypeId) -> BoolResult {
        let Type::FixedPoint(target) = *self.get(to) else {
            return BoolResult::no();
        };
        if target.fractional_digits < fixed.fractional_digits {
            return BoolResult::err("Too many fractional digits.");
        }
        if target.total_bits < fixed.total_bits {
            return BoolResult::no();
        }
        (fixed_max_integer(fixed) <= fixed_max_integer(target)
            && fixed_min_integer(fixed) >= fixed_min_integer(target))
        .into()
    }

    fn rational_implicit(&mut self, number: &RationalNumberType, to: TypeId) -> BoolResult {
        let value = &number.value;
        match *self.get(to) {
            Type::Integer(int) => self.rational_fits_integer(value, int, to),
            Type::VarInteger(var) => self.rational_fits_integer(value, var.as_integer(), to),
            Type::FixedPoint(fixed) => rational_fits_fixed(value, fixed).into(),
            Type::FixedBytes(n) => {
                (!is_fractional(value) && (value.is_zero() || number.compatible_bytes == Some(n)))
                    .into()
            }
            _ => BoolResult::no(),
        }
    }

    fn rational_fits_integer(&self, value: &BigRational, int: IntegerType, to: TypeId) -> BoolResult {
        if is_fractional(value) {
            return BoolResult::no();
        }
        let numer = value.numer();
        if numer.is_negative() && !int.signed {
            return BoolResult::err("Cannot implicitly convert signed literal to unsigned type.");
        }
        if *numer > integer_max(int) || *numer < integer_min(int) {
            return BoolResult::err(format!("Literal is too large to fit in {}.", self.display(to)));
        }
        BoolResult::ok()
    }

    fn string_literal_implicit(&mut self, value: &[u8], to: TypeId) -> BoolResult {
        match self.get(to) {
            Type::FixedBytes(n) => {
                if usize::from(*n) < value.len() {
                    BoolResult::err("Literal is larger than the type.")
                } else {
                    BoolResult::ok()
                }
            }
            Type::Array(array) => match array.kind {
                ArrayKind::String => match std::str::from_utf8(value) {
                    Ok(_) => BoolResult::ok(),
                    Err(err) => BoolResult::err(format!(
                        "Contains invalid UTF-8 sequence at position {}.",
                        err.valid_up_to()
                    )),
                },
                ArrayKind::Bytes => BoolResult::ok(),
                ArrayKind::Ordinary => BoolResult::no(),
            },
            _ => BoolResult::no(),
        }
    }

    /// Byte arrays and strings convert into each other. Ordinary arrays need
    /// equal element types after unwrapping nested arrays, and at every level
    /// a fixed-length source converts to a dynamic target or one of equal
    /// length. A dynamic source never converts to a fixed target.
    fn array_implicit(&self, from: TypeId, to: TypeId) -> bool {
        let (Type::Array(source), Type::Array(target)) = (self.get(from), self.get(to)) else {
            return false;
        };
        if source.is_byte_array_or_string() && target.is_byte_array_or_string() {
            return true;
        }
        if source.is_byte_array_or_string() != target.is_byte_array_or_string() {
            return false;
        }
        let (mut source, mut target) = (source, target);
        loop {
            let length_ok = match (&source.length, &target.length) {
                (_, None) => true,
                (Some(a), Some(b)) => a == b,
                (None, Some(_)) => false,
            };
            if !length_ok {
                return false;
            }
            match (self.get(source.base), self.get(target.base)) {
                (Type::Array(inner_source), Type::Array(inner_target)) => {
                    if inner_source.kind != inner_target.kind {
                        return false;
                    }
                    source = inner_source;
                    target = inner_target;
                }
                _ => return self.bases_equal_ignoring_location(source.base, target.base),
            }
        }
    }

    fn bases_equal_ignoring_location(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Type::Struct { id: x, .. }, Type::Struct { id: y, .. }) => x == y,
            _ => self.types_equal(a, b),
        }
    }

    fn function_implicit(&mut self, function: &FunctionType, to: TypeId) -> BoolResult {
        let Type::Function(target) = self.get(to) else {
            return BoolResult::no();
        };
        if target.bound() != function.bound() {
            return BoolResult::err("Bound functions can not be converted to non-bound functions.");
        }
        if target.kind != function.kind {
            return BoolResult::err("Special functions can not be converted to function types.");
        }
        if !self.equal_excluding_mutability(function, target) {
            return BoolResult::no();
        }
        (function.mutability <= target.mutability).into()
    }

    fn tuple_implicit(&mut self, components: &[Option<TypeId>], to: TypeId) -> BoolResult {
        let Type::Tuple(targets) = self.get(to).clone() else {
            return BoolResult::no();
        };
        if targets.is_empty() {
            return components.is_empty().into();
        }
        if components.len() != targets.len() {
            return BoolResult::no();
        }
        for (component, target) in components.iter().zip(&targets) {
            match (component, target) {
                (None, Some(_)) => return BoolResult::no(),
                (Some(component), Some(target)) => {
                    if !self.is_implicitly_convertible(*component, *target).is_ok() {
                        return BoolResult::no();
                    }
                }
                _ => {}
            }
        }
        BoolResult::ok()
    }

    // ── Explicit conversion ────────────────────────────────────────────

    /// Whether `from` may be cast to `to`. Every implicit conversion is also
    /// an explicit one.
    pub fn is_explicitly_convertible(&mut self, from: TypeId, to: TypeId) -> BoolResult {
        let implicit = self.is_implicitly_convertible(from, to);
        if implicit.is_ok() {
            return implicit;
        }
        let target = self.get(to).clone();
        let allowed = match self.get(from).clone() {
            Type::Integer(int) => match target {
                Type::Integer(_)
                | Type::VarInteger(_)
                | Type::Address
                | Type::Contract { .. }
                | Type::Enum(_)
                | Type::FixedPoint(_) => true,
                Type::FixedBytes(n) => u16::from(n) * 8 == int.bits,
                _ => false,
            },
            Type::FixedPoint(_) => matches!(
                target,
                Type::FixedPoint(_) | Type::Integer(_) | Type::VarInteger(_)
            ),
            Type::VarInteger(var) => {
                let int = self.integer(var.as_integer().bits, var.signed);
                return self.is_explicitly_convertible(int, to);
            }
            Type::RationalNumber(number) => match target {
                Type::FixedBytes(_) => false,
                Type::Integer(_) => true,
                Type::Enum(id) => {
                    let count = self.decls().enum_def(id).values.len();
                    !number.value.is_negative()
                        && !is_fractional(&number.value)
                        && *number.value.numer() < BigInt::from(count)
                }
                _ => match self.mobile_type(from) {
                    Some(mobile) => return self.is_explicitly_convertible(mobile, to),
                    None => false,
                },
            },
            Type::FixedBytes(n) => match target {
                Type::Array(array) => array.kind == ArrayKind::Bytes,
                Type::Integer(int) => int.bits == u16::from(n) * 8,
                Type::FixedPoint(_) | Type::FixedBytes(_) => true,
                _ => false,
            },
            Type::Address => matches!(target, Type::Address | Type::Contract { .. }),
            Type::Contract { is_super, .. } => !is_super && matches!(target, Type::Address),
            Type::Array(array) => {
                array.is_byte_array_or_string() && matches!(target, Type::FixedBytes(_))
            }
            Type::ArraySlice(array) => return self.is_explicitly_convertible(array, to),
            Type::Enum(id) => match target {
                Type::Enum(other) => other == id,
                Type::Integer(int) => !int.signed,
                _ => false,
            },
            Type::TypeType(actual) => {
                matches!(target, Type::Address)
                    && matches!(*self.get(actual), Type::Contract { id, .. } if self.decls().contract(id).is_library())
            }
            Type::Function(function) => match target {
                Type::Function(other) => {
                    (function.kind == FunctionKind::Declaration)
                        == (other.kind == FunctionKind::Declaration)
                }
                _ => false,
            },
            Type::StringLiteral(_)
            | Type::Bool
            | Type::UserDefinedValueType(_)
            | Type::Struct { .. }
            | Type::Mapping { .. }
            | Type::Optional(_)
            | Type::Tuple(_)
            | Type::Modifier(_)
            | Type::Module(_)
            | Type::Magic(_)
            | Type::Null
            | Type::EmptyMap
            | Type::Variant
            | Type::TvmCell
            | Type::TvmSlice
            | Type::TvmBuilder
            | Type::TvmVector(_)
            | Type::ExtraCurrencyCollection
            | Type::InaccessibleDynamic => false,
        };
        allowed.into()
    }

    // ── Mobile and common types ────────────────────────────────────────

    /// The runtime type a value settles into once it is stored or passed on.
    /// `None` if the value has no such type (e.g. a literal too large for
    /// 256 bits, or a function with call options applied).
    pub fn mobile_type(&mut self, id: TypeId) -> Option<TypeId> {
        match self.get(id).clone() {
            Type::RationalNumber(number) => self.rational_mobile(&number.value),
            Type::StringLiteral(_) => Some(self.prims().string),
            Type::ArraySlice(array) => {
                let Type::Array(inner) = self.get(array).clone() else {
                    return Some(id);
                };
                if inner.is_dynamically_sized() && !self.is_dynamically_encoded(inner.base) {
                    Some(array)
                } else {
                    Some(id)
                }
            }
            Type::Function(function) => {
                let options = function.options;
                if options.value_set || options.gas_set || options.salt_set || options.bound {
                    return None;
                }
                let param_names = vec![String::new(); function.params.len()];
                let return_names = vec![String::new(); function.returns.len()];
                Some(self.function(FunctionType {
                    param_names,
                    return_names,
                    ..*function
                }))
            }
            Type::Tuple(components) => {
                let mut mobiles = Vec::with_capacity(components.len());
                for component in components {
                    match component {
                        Some(component) => mobiles.push(Some(self.mobile_type(component)?)),
                        None => mobiles.push(None),
                    }
                }
                Some(self.partial_tuple(mobiles))
            }
            _ => Some(id),
        }
    }

    /// The type both operands convert to, if any.
    ///
    /// Both `a`'s and `b`'s mobile types are tried. If both qualify and
    /// differ, the one with the smaller rich identifier is chosen so the
    /// result does not depend on operand order.
    pub fn common_type(&mut self, a: TypeId, b: TypeId) -> Option<TypeId> {
        let first = self
            .mobile_type(a)
            .filter(|&mobile| self.is_implicitly_convertible(b, mobile).is_ok());
        let second = self
            .mobile_type(b)
            .filter(|&mobile| self.is_implicitly_convertible(a, mobile).is_ok());
        match (first, second) {
            (Some(x), Some(y)) if !self.types_equal(x, y) => {
                if self.rich_identifier(y) < self.rich_identifier(x) {
                    Some(y)
                } else {
                    Some(x)
                }
            }
            (Some(x), _) => Some(x),
            (None, y) => y,
        }
    }
}

/// Whether a rational literal is exactly representable in `fixed`.
fn rational_fits_fixed(value: &BigRational, fixed: FixedPointType) -> bool {
    if value.is_negative() && !fixed.signed {
        return false;
    }
    if !is_fractional(value) {
        let numer = value.numer();
        return *numer <= fixed_max_integer(fixed) && *numer >= fixed_min_integer(fixed);
    }
    let scaled = value * BigRational::from_integer(ten_pow(fixed.fractional_digits));
    if !scaled.is_integer() {
        return false;
    }
    let scaled = scaled.to_integer();
    let int = fixed.as_integer();
    scaled <= integer_max(int) && scaled >= integer_min(int)
}
