#![no_main]
use ipdb::{Database, DatabaseBuilder};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

static DB: OnceLock<Database> = OnceLock::new();

fn database() -> &'static Database {
    DB.get_or_init(|| {
        let mut builder = DatabaseBuilder::new(&["country_name", "city_name"])
            .with_language("CN")
            .with_language("EN");
        builder
            .insert("1.1.1.0/24", &["澳大利亚", "悉尼", "Australia", "Sydney"])
            .unwrap();
        builder
            .insert("10.0.0.0/8", &["局域网", "", "LAN", ""])
            .unwrap();
        builder
            .insert("2001:db8::/32", &["保留地址", "", "Reserved", ""])
            .unwrap();
        builder
            .insert("240e::/20", &["中国", "", "China", ""])
            .unwrap();
        let bytes = builder.build().expect("Failed to build fuzz database");
        Database::from_bytes(bytes).expect("Failed to load fuzz database")
    })
}

fuzz_target!(|data: &[u8]| {
    let db = database();

    // Query as UTF-8 text
    if let Ok(query) = std::str::from_utf8(data) {
        let _ = db.find(query, "CN");
        let _ = db.find_map(query, "EN");
    }

    // Query as raw address bytes
    match data.len() {
        4 => {
            let addr = std::net::Ipv4Addr::new(data[0], data[1], data[2], data[3]);
            let _ = db.find(&addr.to_string(), "EN");
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(data);
            let addr = std::net::Ipv6Addr::from(octets);
            let _ = db.find(&addr.to_string(), "EN");
        }
        _ => {}
    }
});
