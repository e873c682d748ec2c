//! Whole-taxonomy properties of the type engine.
//!
//! These sweep a pool covering every constructible value category and check
//! the relations that must hold for all of them: identity conversion,
//! injective rich identifiers, plain escaped identifiers and an
//! order-independent common type.

use std::collections::HashSet;

use num_bigint::BigInt;
use num_rational::BigRational;
use tsol_types::decl::{ContractKind, ScopeId};
use tsol_types::layout::{StorageOffset, StorageOffsets};
use tsol_types::rational::Denomination;
use tsol_types::ty::{FunctionType, StateMutability, Type};
use tsol_types::{FunctionKind, Token, TypeCtx, TypeError, TypeId};

// ── Helpers ────────────────────────────────────────────────────────────

/// One or more types of every category a value can have.
fn type_pool(ctx: &mut TypeCtx) -> Vec<TypeId> {
    let p = *ctx.prims();
    let su = ctx.decls_mut().add_source_unit("pool.tsol");
    let scope = ScopeId::SourceUnit(su);
    let color = ctx.decls_mut().add_enum("Color", scope, &["Red", "Green"]);
    let point = ctx.decls_mut().add_struct("Point", scope);
    ctx.decls_mut()
        .set_struct_members(point, vec![("x".to_string(), p.int256), ("y".to_string(), p.int256)]);
    let base = ctx.decls_mut().add_contract("Base", ContractKind::Contract, su);
    let derived = ctx.decls_mut().add_contract("Derived", ContractKind::Contract, su);
    ctx.decls_mut().add_base(derived, base);
    ctx.decls_mut().link_contracts().unwrap();
    let price = ctx.decls_mut().add_udvt("Price", scope, p.uint128);

    let mut pool = vec![
        p.bool,
        p.address,
        p.uint8,
        p.uint16,
        p.uint32,
        p.uint64,
        p.uint128,
        p.uint256,
        p.int8,
        p.int256,
        ctx.int(257),
        p.bytes1,
        p.bytes4,
        p.bytes32,
        p.bytes,
        p.string,
        p.cell,
        p.slice,
        p.builder,
        p.variant,
        p.null,
        p.empty_map,
        p.extra_currency_collection,
        p.var_uint16,
        p.var_uint32,
        ctx.var_integer(16, true),
        ctx.fixed_point(128, 18, true),
        ctx.fixed_point(64, 2, false),
        ctx.enum_type(color),
        ctx.udvt(price),
        ctx.contract(base, false),
        ctx.contract(derived, false),
    ];
    let point_ty = ctx.struct_type(point);
    pool.push(point_ty);
    pool.push(ctx.with_location(point_ty, true));

    let uint8_list = ctx.dynamic_array(p.uint8);
    let uint8_triple = ctx.fixed_array(p.uint8, 3);
    let uint16_list = ctx.dynamic_array(p.uint16);
    pool.extend([uint8_list, uint8_triple, uint16_list]);
    pool.push(ctx.with_location(uint8_list, true));
    pool.push(ctx.mapping(p.uint32, p.address));
    pool.push(ctx.optional(p.uint8));
    pool.push(ctx.optional(p.uint16));
    pool.push(ctx.optional(p.string));
    pool.push(ctx.tuple(vec![p.uint8, p.bool]));
    pool.push(ctx.tuple(vec![p.uint16, p.bool]));
    pool.push(ctx.tvm_vector(p.uint32));

    for text in ["0", "1", "255", "256", "0x00ff", "1.5", "1e80"] {
        pool.push(ctx.rational_literal(text, Denomination::None).unwrap());
    }
    pool.push(ctx.rational(BigRational::from_integer(BigInt::from(-128))));
    pool.push(ctx.rational(BigRational::new(BigInt::from(-1), BigInt::from(3))));
    pool.push(ctx.string_literal("abc"));
    pool.push(ctx.string_literal(vec![0xffu8, 0xfe]));
    pool
}

// ── Conversion properties ──────────────────────────────────────────────

#[test]
fn every_type_converts_to_itself() {
    let mut ctx = TypeCtx::new();
    for ty in type_pool(&mut ctx) {
        assert!(
            ctx.is_implicitly_convertible(ty, ty).is_ok(),
            "{} does not convert to itself",
            ctx.rich_identifier(ty)
        );
        assert!(
            ctx.is_explicitly_convertible(ty, ty).is_ok(),
            "{} does not cast to itself",
            ctx.rich_identifier(ty)
        );
    }
}

#[test]
fn rich_identifiers_are_injective() {
    let mut ctx = TypeCtx::new();
    let pool = type_pool(&mut ctx);
    let handles: HashSet<TypeId> = pool.iter().copied().collect();
    let ids: HashSet<&str> = handles.iter().map(|&ty| ctx.rich_identifier(ty)).collect();
    assert_eq!(ids.len(), handles.len());
    for &ty in &handles {
        assert_eq!(ctx.lookup(ctx.rich_identifier(ty)), Some(ty));
    }
}

#[test]
fn escaped_identifiers_are_plain() {
    let mut ctx = TypeCtx::new();
    for ty in type_pool(&mut ctx) {
        let identifier = ctx.identifier(ty);
        assert!(
            identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
            "{} is not a plain identifier",
            identifier
        );
        assert!(!identifier.starts_with(|c: char| c.is_ascii_digit()));
    }
}

#[test]
fn common_type_is_symmetric() {
    let mut ctx = TypeCtx::new();
    let pool = type_pool(&mut ctx);
    for &a in &pool {
        for &b in &pool {
            let ab = ctx.common_type(a, b);
            let ba = ctx.common_type(b, a);
            let same = match (ab, ba) {
                (Some(x), Some(y)) => ctx.types_equal(x, y),
                (None, None) => true,
                _ => false,
            };
            assert!(
                same,
                "commonType({}, {}) = {:?} but commonType({}, {}) = {:?}",
                ctx.rich_identifier(a),
                ctx.rich_identifier(b),
                ab.map(|t| ctx.rich_identifier(t).to_string()),
                ctx.rich_identifier(b),
                ctx.rich_identifier(a),
                ba.map(|t| ctx.rich_identifier(t).to_string()),
            );
        }
    }
}

#[test]
fn common_type_of_literal_and_integer() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let big = ctx.rational_literal("300", Denomination::None).unwrap();
    assert_eq!(ctx.common_type(p.uint8, big), Some(p.uint16));
    assert_eq!(ctx.common_type(big, p.uint32), Some(p.uint32));
    let maybe = ctx.optional(p.uint16);
    assert_eq!(ctx.common_type(p.uint8, maybe), Some(maybe));
    assert_eq!(ctx.common_type(p.bool, p.uint8), None);
}

#[test]
fn fixed_array_converts_to_dynamic_only() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let fixed = ctx.fixed_array(p.uint32, 3);
    let other_fixed = ctx.fixed_array(p.uint32, 4);
    let dynamic = ctx.dynamic_array(p.uint32);
    assert!(ctx.is_implicitly_convertible(fixed, dynamic).is_ok());
    assert!(!ctx.is_implicitly_convertible(dynamic, fixed).is_ok());
    assert!(!ctx.is_implicitly_convertible(fixed, other_fixed).is_ok());

    let nested_fixed = ctx.fixed_array(fixed, 2);
    let nested_dynamic = ctx.dynamic_array(dynamic);
    assert!(ctx.is_implicitly_convertible(nested_fixed, nested_dynamic).is_ok());
    assert!(!ctx.is_implicitly_convertible(nested_dynamic, nested_fixed).is_ok());
}

#[test]
fn contracts_convert_to_their_bases() {
    let mut ctx = TypeCtx::new();
    let su = ctx.decls_mut().add_source_unit("main.tsol");
    let base = ctx.decls_mut().add_contract("Base", ContractKind::Contract, su);
    let derived = ctx.decls_mut().add_contract("Derived", ContractKind::Contract, su);
    ctx.decls_mut().add_base(derived, base);
    ctx.decls_mut().link_contracts().unwrap();
    let base_ty = ctx.contract(base, false);
    let derived_ty = ctx.contract(derived, false);
    let address = ctx.prims().address;
    assert!(ctx.is_implicitly_convertible(derived_ty, base_ty).is_ok());
    assert!(!ctx.is_implicitly_convertible(base_ty, derived_ty).is_ok());
    assert!(ctx.is_implicitly_convertible(derived_ty, address).is_ok());
}

#[test]
fn integers_convert_to_internal_function_types() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let internal = ctx.function(FunctionType::builtin(
        FunctionKind::Internal,
        vec![p.uint8],
        vec![p.bool],
        StateMutability::Pure,
    ));
    let external = ctx.function(FunctionType::builtin(
        FunctionKind::External,
        vec![p.uint8],
        vec![p.bool],
        StateMutability::Pure,
    ));
    assert!(ctx.is_implicitly_convertible(p.uint32, internal).is_ok());
    assert!(ctx.is_implicitly_convertible(p.int8, internal).is_ok());
    assert!(!ctx.is_implicitly_convertible(p.uint32, external).is_ok());
    assert!(!ctx.is_implicitly_convertible(p.bool, internal).is_ok());
}

// ── Literal properties ─────────────────────────────────────────────────

#[test]
fn literal_mobile_types_fit_their_values() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let cases = [("255", p.uint8), ("256", p.uint16), ("0", p.uint8)];
    for (text, expected) in cases {
        let literal = ctx.rational_literal(text, Denomination::None).unwrap();
        assert_eq!(ctx.mobile_type(literal), Some(expected), "literal {}", text);
    }
    let negative = ctx.rational(BigRational::from_integer(BigInt::from(-128)));
    assert_eq!(ctx.mobile_type(negative), Some(p.int8));
    let below = ctx.rational(BigRational::from_integer(BigInt::from(-129)));
    let int16 = ctx.int(16);
    assert_eq!(ctx.mobile_type(below), Some(int16));

    let one_and_half = ctx.rational_literal("1.5", Denomination::None).unwrap();
    let mobile = ctx.mobile_type(one_and_half).unwrap();
    let Type::FixedPoint(fixed) = ctx.get(mobile).clone() else {
        panic!("expected a fixed point type, got {}", ctx.rich_identifier(mobile));
    };
    assert_eq!(fixed.fractional_digits, 1);
    assert_eq!(fixed.total_bits, 8);
    assert!(!fixed.signed);
}

#[test]
fn literal_denominations_scale_the_value() {
    let mut ctx = TypeCtx::new();
    let one_ton = ctx.rational_literal("1", Denomination::Ton).unwrap();
    let expected = ctx.rational(BigRational::from_integer(BigInt::from(1_000_000_000u64)));
    assert_eq!(one_ton, expected);
    let day = ctx.rational_literal("1", Denomination::Day).unwrap();
    let seconds = ctx.rational(BigRational::from_integer(BigInt::from(86_400)));
    assert_eq!(day, seconds);
}

#[test]
fn literal_arithmetic_is_exact_until_the_precision_ceiling() {
    let mut ctx = TypeCtx::new();
    let a = ctx.rational_literal("1", Denomination::None).unwrap();
    let b = ctx.rational_literal("3", Denomination::None).unwrap();
    let third = ctx.binary_operator_result(a, Token::Div, b).unwrap().unwrap();
    assert_eq!(ctx.rich_identifier(third), "t_rational_1_by_3");

    let huge = ctx.rational(BigRational::from_integer(BigInt::from(1) << 2100usize));
    assert_eq!(
        ctx.binary_operator_result(huge, Token::Mul, huge),
        Err(TypeError::Precision { bits: 4096 })
    );
}

#[test]
fn exponent_and_shift_overflow_hit_the_precision_ceiling() {
    let mut ctx = TypeCtx::new();
    let one = ctx.rational_literal("1", Denomination::None).unwrap();
    let two = ctx.rational_literal("2", Denomination::None).unwrap();
    let five_thousand = ctx.rational_literal("5000", Denomination::None).unwrap();
    let precision = Err(TypeError::Precision { bits: 4096 });
    assert_eq!(ctx.binary_operator_result(two, Token::Exp, five_thousand), precision);
    assert_eq!(ctx.binary_operator_result(one, Token::Shl, five_thousand), precision);

    let ten = ctx.rational_literal("10", Denomination::None).unwrap();
    let power = ctx.binary_operator_result(two, Token::Exp, ten).unwrap().unwrap();
    assert_eq!(ctx.rich_identifier(power), "t_rational_1024_by_1");
}

#[test]
fn denominations_count_against_the_precision_ceiling() {
    let mut ctx = TypeCtx::new();
    // 10^1232 needs 4093 bits on its own.
    let text = format!("1{}", "0".repeat(1232));
    assert!(ctx.rational_literal(&text, Denomination::None).is_some());
    assert!(ctx.rational_literal(&text, Denomination::Second).is_some());
    assert!(ctx.rational_literal(&text, Denomination::Ton).is_none());
    assert!(ctx.rational_literal(&text, Denomination::Day).is_none());
}

// ── Storage packing ────────────────────────────────────────────────────

fn positions(ctx: &mut TypeCtx, types: &[TypeId]) -> (Vec<(u32, u32)>, u32) {
    let offsets = StorageOffsets::compute(ctx, types);
    let positions = (0..types.len())
        .map(|i| {
            let StorageOffset { slot, offset } = offsets.offset(i).unwrap().clone();
            (u32::try_from(slot).unwrap(), offset)
        })
        .collect();
    (positions, u32::try_from(offsets.storage_size().clone()).unwrap())
}

#[test]
fn small_values_share_a_slot() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let (packed, slots) = positions(&mut ctx, &[p.uint8, p.uint8, p.uint256, p.bool]);
    assert_eq!(packed, [(0, 0), (0, 1), (1, 0), (2, 0)]);
    assert_eq!(slots, 3);

    let (packed, slots) = positions(&mut ctx, &[p.uint256, p.uint256]);
    assert_eq!(packed, [(0, 0), (1, 0)]);
    assert_eq!(slots, 2);
}

#[test]
fn full_width_value_forces_a_new_slot() {
    let mut ctx = TypeCtx::new();
    let p = *ctx.prims();
    let (packed, slots) = positions(&mut ctx, &[p.bytes1, p.uint256, p.bytes1]);
    assert_eq!(packed, [(0, 0), (1, 0), (2, 0)]);
    assert_eq!(slots, 3);
}
