#![no_main]
use bias_config::record::{RECORD_LEN, decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some(bytes) = data.get(..RECORD_LEN) else {
        return;
    };
    let mut block = [0u8; RECORD_LEN];
    block.copy_from_slice(bytes);
    let gain = data.get(RECORD_LEN).copied().map_or(8, |g| u32::from(g).max(1));

    // Anything that decodes must re-encode to the same bytes.
    if let Ok(params) = decode(&block, gain) {
        assert_eq!(encode(&params), block);
    }
});
