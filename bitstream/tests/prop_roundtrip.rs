use bitstream::{width_for_max, BitBuffer};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Bit(bool),
    UnsignedBits { bits: u32, value: u32 },
    UnsignedMax { max: u32, value: u32 },
    SignedBits { bits: u32, value: i32 },
    SignedMax { max: u32, value: i32 },
    Ones(usize),
    Zeros(usize),
    Pad(bool),
    F32(f32),
    F64(f64),
}

fn mask_value(bits: u32, value: u32) -> u32 {
    if bits >= 32 {
        value
    } else {
        value & ((1u32 << bits) - 1)
    }
}

fn clamp_signed(bits: u32, value: i32) -> i32 {
    let magnitude = mask_value(bits, value.unsigned_abs());
    let magnitude = i32::try_from(magnitude).unwrap_or(i32::MAX);
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Bit),
        (1u32..=32, any::<u32>()).prop_map(|(bits, value)| Op::UnsignedBits {
            bits,
            value: mask_value(bits, value),
        }),
        any::<u32>()
            .prop_flat_map(|max| (Just(max), 0..=max))
            .prop_map(|(max, value)| Op::UnsignedMax { max, value }),
        (1u32..=32, any::<i32>()).prop_map(|(bits, value)| Op::SignedBits {
            bits,
            value: clamp_signed(bits, value),
        }),
        (0u32..=i32::MAX as u32)
            .prop_flat_map(|max| {
                let bound = i32::try_from(max).unwrap_or(i32::MAX);
                (Just(max), -bound..=bound)
            })
            .prop_map(|(max, value)| Op::SignedMax { max, value }),
        (0usize..20).prop_map(Op::Ones),
        (0usize..20).prop_map(Op::Zeros),
        any::<bool>().prop_map(Op::Pad),
        any::<f32>().prop_map(Op::F32),
        any::<f64>().prop_map(Op::F64),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut buffer = BitBuffer::new();

        for op in &ops {
            match op {
                Op::Bit(b) => buffer.write_bool(*b),
                Op::UnsignedBits { bits, value } => buffer.write_unsigned_bits(*value, *bits).unwrap(),
                Op::UnsignedMax { max, value } => buffer.write_unsigned_max(*value, *max).unwrap(),
                Op::SignedBits { bits, value } => buffer.write_signed_bits(*value, *bits).unwrap(),
                Op::SignedMax { max, value } => buffer.write_signed_max(*value, *max).unwrap(),
                Op::Ones(n) => buffer.write_ones(*n).unwrap(),
                Op::Zeros(n) => buffer.write_zeros(*n).unwrap(),
                Op::Pad(bit) => {
                    buffer.pad_to_byte(*bit);
                }
                Op::F32(v) => buffer.write_f32(*v),
                Op::F64(v) => buffer.write_f64(*v),
            }
        }

        let bit_len = buffer.bit_len();
        let mut reader = BitBuffer::from_parts(buffer.finish(), bit_len).unwrap();

        for op in &ops {
            match op {
                Op::Bit(b) => {
                    prop_assert_eq!(reader.read_bool().unwrap(), *b);
                }
                Op::UnsignedBits { bits, value } => {
                    prop_assert_eq!(reader.read_unsigned_bits(*bits).unwrap(), *value);
                }
                Op::UnsignedMax { max, value } => {
                    prop_assert_eq!(reader.read_unsigned_max(*max).unwrap(), *value);
                }
                Op::SignedBits { bits, value } => {
                    prop_assert_eq!(reader.read_signed_bits(*bits).unwrap(), *value);
                }
                Op::SignedMax { max, value } => {
                    prop_assert_eq!(reader.read_signed_max(*max).unwrap(), *value);
                }
                Op::Ones(n) => {
                    for _ in 0..*n {
                        prop_assert!(reader.read_bool().unwrap());
                    }
                }
                Op::Zeros(n) => {
                    for _ in 0..*n {
                        prop_assert!(!reader.read_bool().unwrap());
                    }
                }
                Op::Pad(_) => {
                    reader.skip_to_byte().unwrap();
                }
                Op::F32(v) => {
                    prop_assert_eq!(reader.read_f32().unwrap().to_bits(), v.to_bits());
                }
                Op::F64(v) => {
                    prop_assert_eq!(reader.read_f64().unwrap().to_bits(), v.to_bits());
                }
            }
        }
        prop_assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn prop_unsigned_width_roundtrip(bits in 1u32..=32, raw in any::<u32>()) {
        let value = mask_value(bits, raw);
        let mut buffer = BitBuffer::new();
        buffer.write_unsigned_bits(value, bits).unwrap();
        prop_assert_eq!(buffer.bit_len(), bits as usize);
        let mut reader = BitBuffer::from_bytes(buffer.finish());
        prop_assert_eq!(reader.read_unsigned_bits(bits).unwrap(), value);
    }

    #[test]
    fn prop_signed_max_roundtrip_including_bounds(max in 0u32..=i32::MAX as u32, pick in 0u8..3, raw in any::<i32>()) {
        let bound = i32::try_from(max).unwrap();
        let value = match pick {
            0 => bound,
            1 => -bound,
            _ => raw.clamp(-bound, bound),
        };
        let mut buffer = BitBuffer::new();
        buffer.write_signed_max(value, max).unwrap();
        prop_assert_eq!(buffer.bit_len(), 1 + width_for_max(max) as usize);
        let mut reader = BitBuffer::from_bytes(buffer.finish());
        prop_assert_eq!(reader.read_signed_max(max).unwrap(), value);
    }
}
