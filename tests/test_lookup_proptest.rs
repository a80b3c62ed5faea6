//! Property tests over generated networks

use ipdb::{Database, DatabaseBuilder, IpdbError};
use proptest::prelude::*;
use std::net::Ipv4Addr;

/// File mapping `n.0.0.0/8` to `net-n` for every n in `firsts`
fn build_bytes(firsts: &[u8]) -> Vec<u8> {
    let mut builder = DatabaseBuilder::new(&["name", "octet"])
        .with_language("EN")
        .with_language("CN");
    for &first in firsts {
        let name = format!("net-{}", first);
        let octet = first.to_string();
        builder
            .insert(
                &format!("{}.0.0.0/8", first),
                &[name.as_str(), octet.as_str(), name.as_str(), octet.as_str()],
            )
            .unwrap();
    }
    builder.build().unwrap()
}

fn build(firsts: &[u8]) -> Database {
    Database::from_bytes(build_bytes(firsts)).unwrap()
}

proptest! {
    #[test]
    fn lookup_finds_exactly_inserted_networks(
        firsts in prop::collection::btree_set(1u8..=254, 1..20),
        probe in any::<u32>(),
    ) {
        let firsts: Vec<u8> = firsts.into_iter().collect();
        let db = build(&firsts);
        let addr = Ipv4Addr::from(probe);
        let first = addr.octets()[0];

        match db.find(&addr.to_string(), "EN") {
            Ok(values) => {
                prop_assert!(firsts.contains(&first));
                prop_assert_eq!(values.len(), db.fields().len());
                prop_assert_eq!(&values[0], &format!("net-{}", first));
            }
            Err(e) => {
                prop_assert_eq!(e, IpdbError::DataNotFound);
                prop_assert!(!firsts.contains(&first));
            }
        }
    }

    #[test]
    fn cached_and_uncached_agree(probe in any::<u32>(), repeats in 1usize..4) {
        let firsts: Vec<u8> = (1..=200).step_by(3).collect();
        let cached = build(&firsts);
        let addr = Ipv4Addr::from(probe).to_string();

        let uncached: Database = Database::from_bytes_builder(build_bytes(&firsts))
            .no_cache()
            .open()
            .unwrap();

        for _ in 0..repeats {
            prop_assert_eq!(cached.find(&addr, "CN"), uncached.find(&addr, "CN"));
        }
    }

    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,40}") {
        let db = build(&[1, 2, 3]);
        match db.find(&text, "EN") {
            Ok(_) | Err(IpdbError::DataNotFound) | Err(IpdbError::InvalidAddress(_))
            | Err(IpdbError::Ipv6NotSupported) => {}
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn unknown_languages_always_rejected(code in "[A-Z]{2}", probe in any::<u32>()) {
        prop_assume!(code != "EN" && code != "CN");
        let db = build(&[1, 2, 3]);
        let result = db.find(&Ipv4Addr::from(probe).to_string(), &code);
        prop_assert_eq!(result, Err(IpdbError::LanguageNotSupported(code)));
    }

    #[test]
    fn damaged_bytes_never_panic(flips in prop::collection::vec((any::<usize>(), any::<u8>()), 1..8)) {
        let mut builder = DatabaseBuilder::new(&["name"]).with_language("EN");
        builder.insert("1.0.0.0/8", &["one"]).unwrap();
        builder.insert("2001:db8::/32", &["doc"]).unwrap();
        let mut bytes = builder.build().unwrap();
        let len = bytes.len();
        for (at, value) in flips {
            bytes[at % len] = value;
        }
        if let Ok(db) = Database::<ipdb::FieldMap>::from_bytes(bytes) {
            let _ = db.find("1.2.3.4", "EN");
            let _ = db.find("2001:db8::1", "EN");
        }
    }
}
