#![no_main]

use libfuzzer_sys::fuzz_target;
use rekey_auth::exported_name;

fuzz_target!(|data: &[u8]| {
    // The exported name is the one GSS-produced value we parse by hand
    // rather than handing to libgssapi; it runs before AUTH completes,
    // so a crash here is reachable pre-authentication.
    let _ = exported_name::decode(data);
});
