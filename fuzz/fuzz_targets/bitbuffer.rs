#![no_main]

use bitstream::BitBuffer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitBuffer::from_bytes(data.to_vec());
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of reads.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        let arg = u32::from(data[idx] >> 3);
        idx += 1;

        let before = reader.cursor();
        let failed = match op {
            0 => reader.read_bool().is_err(),
            1 => reader.read_unsigned_bits(arg + 1).is_err(),
            2 => reader.read_unsigned_max(arg << 8).is_err(),
            3 => reader.read_signed_bits(arg + 1).is_err(),
            4 => reader.read_signed_max(arg.wrapping_mul(0x0101_0101)).is_err(),
            5 => reader.skip_to_byte().is_err(),
            _ => reader.read_f64().is_err(),
        };
        if failed {
            assert_eq!(reader.cursor(), before);
        }
        assert!(reader.cursor() <= reader.bit_len());
    }
});
