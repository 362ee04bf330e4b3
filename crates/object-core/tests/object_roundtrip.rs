//! Property coverage for the object-module text format.

use object_core::{parse_object, to_object_text, Definition, Module, UseEntry, Word};
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn symbol() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

prop_compose! {
    fn arbitrary_module()(
        code in prop::collection::vec(any::<Word>(), 1..40)
    )(
        relative in prop::collection::vec(0..code.len(), 0..10),
        uses in prop::collection::vec((symbol(), 0..code.len()), 0..6),
        definitions in prop::collection::btree_map(symbol(), 0..code.len(), 0..6),
        code in Just(code),
    ) -> Module {
        Module {
            name: "m".into(),
            code,
            relative,
            uses: uses
                .into_iter()
                .map(|(symbol, index)| UseEntry { symbol, index })
                .collect(),
            definitions: definitions
                .into_iter()
                .map(|(symbol, address)| Definition { symbol, address })
                .collect(),
            base: None,
        }
    }
}

proptest! {
    #[test]
    fn property_object_text_round_trips(module in arbitrary_module()) {
        let text = to_object_text(&module);
        let parsed = parse_object("m", &text).expect("serialized module should parse");
        prop_assert_eq!(&parsed.uses, &module.uses);
        prop_assert_eq!(&parsed.definitions, &module.definitions);
        prop_assert_eq!(&parsed.relative, &module.relative);
        prop_assert_eq!(&parsed.code, &module.code);
    }

    #[test]
    fn property_serialization_is_stable(module in arbitrary_module()) {
        let once = to_object_text(&module);
        let parsed = parse_object("m", &once).expect("serialized module should parse");
        prop_assert_eq!(to_object_text(&parsed), once);
    }
}
