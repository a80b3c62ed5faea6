#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Loading must fail cleanly on garbage; lookups on anything that loads must not panic
    if let Ok(db) = ipdb::Database::<ipdb::FieldMap>::from_bytes(data.to_vec()) {
        for language in db.languages() {
            let _ = db.find("1.2.3.4", &language);
            let _ = db.find("2001:db8::1", &language);
            let _ = db.find("::", &language);
        }
    }
});
