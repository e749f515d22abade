#![no_main]

use libfuzzer_sys::fuzz_target;
use rekey_wire::Buffer;

fuzz_target!(|data: &[u8]| {
    // Every handler parses its request body through the same sequence of
    // get_u32/get_bytes/get_str calls; none of it should panic on
    // attacker-controlled bytes, truncated or not.
    let mut buf = Buffer::from_vec(data.to_vec());
    let _ = buf.get_u32();
    let _ = buf.get_bytes();
    let _ = buf.get_str();
    let _ = buf.get_u32();
    let _ = buf.get_rest();
});
