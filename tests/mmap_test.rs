use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;

use tempfile::tempdir;

use lexis::{LexiconEntry, LexisError, MappingState, PartialLexicon};

fn write_block(dir: &Path, name: &str, terms: &[(&str, u64)]) -> PartialLexicon {
    let mut lexicon = PartialLexicon::create(dir, name, 10).unwrap();
    for (term, offset) in terms {
        lexicon.append_term(term, *offset).unwrap();
    }
    lexicon.flush().unwrap();
    lexicon
}

#[test]
fn test_mmap_sequential_scan_order() {
    let dir = tempdir().unwrap();
    let mut lexicon = write_block(
        dir.path(),
        "block_0.lex",
        &[("apple", 100), ("banana", 250), ("cherry", 900)],
    );

    assert_eq!(lexicon.mapping_state(), MappingState::Unmapped);
    assert!(lexicon.enable_memory_mapping().unwrap());
    assert_eq!(lexicon.mapping_state(), MappingState::Mapped);

    let mut terms = Vec::new();
    while lexicon.remaining() > 0 {
        terms.push(lexicon.read_next_mmap().unwrap().term().to_string());
    }
    assert_eq!(terms, vec!["apple", "banana", "cherry"]);

    let err = lexicon.read_next_mmap().unwrap_err();
    assert!(err.is_out_of_range());
}

#[test]
fn test_mmap_exhaustion_is_stable() {
    let dir = tempdir().unwrap();
    let mut lexicon = write_block(dir.path(), "block_0.lex", &[("solo", 1)]);
    lexicon.enable_memory_mapping().unwrap();

    assert_eq!(lexicon.read_next_mmap().unwrap(), LexiconEntry::new("solo", 1));
    for _ in 0..3 {
        assert!(matches!(
            lexicon.read_next_mmap(),
            Err(LexisError::OutOfRange {
                position: 18,
                len: 18
            })
        ));
    }
}

#[test]
fn test_mmap_persistence_reload() {
    let dir = tempdir().unwrap();
    drop(write_block(
        dir.path(),
        "block_0.lex",
        &[("alpha", 8), ("beta", 16), ("gamma", 24)],
    ));

    let mut lexicon = PartialLexicon::open(dir.path(), "block_0.lex", 10).unwrap();
    assert!(lexicon.enable_memory_mapping().unwrap());
    let entries: Vec<LexiconEntry> = lexicon
        .scanner()
        .unwrap()
        .collect::<lexis::Result<_>>()
        .unwrap();

    assert_eq!(
        entries,
        vec![
            LexiconEntry::new("alpha", 8),
            LexiconEntry::new("beta", 16),
            LexiconEntry::new("gamma", 24),
        ]
    );
}

#[test]
fn test_mmap_drives_multiway_merge() {
    let dir = tempdir().unwrap();
    let mut blocks = vec![
        write_block(
            dir.path(),
            "block_0.lex",
            &[("ant", 0), ("cat", 10), ("eel", 20)],
        ),
        write_block(dir.path(), "block_1.lex", &[("bee", 30), ("cat", 40)]),
        write_block(dir.path(), "block_2.lex", &[("dog", 50), ("fox", 60)]),
    ];

    let mut heap = BinaryHeap::new();
    for (i, block) in blocks.iter_mut().enumerate() {
        assert!(block.enable_memory_mapping().unwrap());
        if block.remaining() > 0 {
            heap.push(Reverse((block.read_next_mmap().unwrap(), i)));
        }
    }

    let mut merged = Vec::new();
    while let Some(Reverse((entry, i))) = heap.pop() {
        merged.push(entry.term().to_string());
        match blocks[i].read_next_mmap() {
            Ok(next) => heap.push(Reverse((next, i))),
            Err(e) if e.is_out_of_range() => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(merged, vec!["ant", "bee", "cat", "cat", "dog", "eel", "fox"]);
}
