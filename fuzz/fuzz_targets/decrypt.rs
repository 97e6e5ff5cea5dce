#![no_main]

use citadel_cipher::{BlockMode, Cipher, CipherConfig, BASE_ASCII};
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

static ENGINES: Lazy<Vec<Cipher>> = Lazy::new(|| {
    [BlockMode::Ecb, BlockMode::Cbc, BlockMode::Cfb, BlockMode::Ofb, BlockMode::Gcm]
        .into_iter()
        .flat_map(|mode| {
            ["raw", BASE_ASCII, "62"].into_iter().map(move |base| {
                let config = CipherConfig::builder()
                    .with_key("fuzz key")
                    .with_mode(mode)
                    .with_base(base)
                    .build()
                    .unwrap();
                Cipher::new(config).unwrap()
            })
        })
        .collect()
});

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let engine = &ENGINES[data[0] as usize % ENGINES.len()];
    let input = &data[1..];

    // never panics on hostile input
    let _ = engine.decrypt(input);
    let _ = engine.unobfuscate(input, 7);

    // and whatever it encrypts comes back
    let ct = engine.encrypt(input).unwrap();
    assert_eq!(engine.decrypt(&ct).unwrap(), input);
});
