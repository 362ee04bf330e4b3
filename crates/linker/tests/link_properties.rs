//! Linking properties and end-to-end assemble-then-link checks.

use assembler::Assembler;
use linker::{LinkError, Linker};
use object_core::{parse_image, to_image_text, Definition, Module, UseEntry, Word};
use proptest::prelude::*;
use rstest::rstest;
use tempfile as _;
use thiserror as _;

fn assemble(name: &str, source: &str) -> Module {
    let mut assembler = Assembler::from_source(name, source).expect("source should preprocess");
    assembler
        .second_pass()
        .cloned()
        .unwrap_or_else(|e| panic!("{}", e.format_for_stdout()))
}

const MAIN: &str = "\
MAIN: BEGIN
SUM: EXTERN
PUBLIC N
SECTION TEXT
INPUT N
LOAD N
ADD SUM + 1
STORE R
OUTPUT R
STOP
SECTION DATA
N: CONST 0
SECTION BSS
R: SPACE
END
";

const LIB: &str = "\
LIB: BEGIN
N: EXTERN
PUBLIC SUM
SECTION TEXT
LOAD N
STOP
SECTION DATA
SUM: CONST 0x10
ONE: CONST 1
END
";

#[test]
fn extern_resolved_to_later_module() {
    let a = assemble(
        "a",
        "A: BEGIN\nY: EXTERN\nSECTION TEXT\nLOAD Y\nSTOP\nEND\n",
    );
    let b = assemble(
        "b",
        "B: BEGIN\nPUBLIC Y\nSECTION TEXT\nSTOP\nSECTION DATA\nY: CONST 7\nEND\n",
    );
    assert_eq!(a.code, vec![10, 0, 14]);
    let mut linker = Linker::new(vec![a, b]);
    let image = linker.link().unwrap();
    assert_eq!(image.globals["Y"].address, 4);
    assert_eq!(image.words, vec![10, 4, 14, 14, 7]);
}

#[test]
fn two_module_program_links() {
    let main = assemble("main", MAIN);
    let lib = assemble("lib", LIB);
    assert_eq!(main.size(), 13);

    let mut linker = Linker::new(vec![main, lib]);
    let image = linker.link().unwrap().clone();
    assert_eq!(image.globals["N"].address, 11);
    assert_eq!(image.globals["SUM"].address, 16);
    assert_eq!(
        image.words,
        vec![12, 11, 10, 11, 1, 17, 11, 12, 13, 12, 14, 0, 0, 10, 11, 14, 16, 1]
    );
    assert_eq!(linker.modules()[1].base, Some(13));
}

#[rstest]
#[case(vec!["main"])]
#[case(vec!["lib"])]
fn missing_partner_is_undefined_symbol(#[case] names: Vec<&str>) {
    let modules = names
        .iter()
        .map(|&name| assemble(name, if name == "main" { MAIN } else { LIB }))
        .collect();
    let mut linker = Linker::new(modules);
    assert!(matches!(
        linker.link(),
        Err(LinkError::UndefinedSymbol { .. })
    ));
}

fn symbol() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,5}"
}

prop_compose! {
    fn arbitrary_module(index: usize)(
        code in prop::collection::vec(any::<Word>(), 1..20)
    )(
        relative in prop::collection::vec(0..code.len(), 0..5),
        uses in prop::collection::vec((symbol(), 0..code.len()), 0..4),
        defined in prop::collection::btree_map(symbol(), 0..code.len(), 0..3),
        code in Just(code),
    ) -> Module {
        Module {
            name: format!("m{index}"),
            code,
            relative,
            uses: uses
                .into_iter()
                .map(|(symbol, index)| UseEntry { symbol, index })
                .collect(),
            definitions: defined
                .into_iter()
                .map(|(symbol, address)| Definition { symbol, address })
                .collect(),
            base: None,
        }
    }
}

fn arbitrary_modules() -> impl Strategy<Value = Vec<Module>> {
    (1..4usize).prop_flat_map(|count| {
        (0..count)
            .map(arbitrary_module)
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn property_linking_twice_is_identical(modules in arbitrary_modules()) {
        let first = Linker::new(modules.clone()).link().map(|image| to_image_text(&image.words));
        let second = Linker::new(modules).link().map(|image| to_image_text(&image.words));
        prop_assert_eq!(&first, &second);
        if let Ok(text) = first {
            prop_assert!(parse_image(&text).is_ok());
        }
    }

    #[test]
    fn property_image_size_is_sum_of_modules(modules in arbitrary_modules()) {
        let total: usize = modules.iter().map(Module::size).sum();
        if let Ok(image) = Linker::new(modules).link() {
            prop_assert_eq!(image.words.len(), total);
        }
    }

    #[test]
    fn property_unpublished_use_aborts(mut modules in arbitrary_modules()) {
        modules[0].uses.push(UseEntry { symbol: "NOWHERE".into(), index: 0 });
        let mut linker = Linker::new(modules);
        let result = linker.link();
        let is_rejected = matches!(
            result,
            Err(LinkError::UndefinedSymbol { .. } | LinkError::DuplicateSymbol { .. })
        );
        prop_assert!(is_rejected);
    }
}
