//! Property-based tests for merging, normalization and pairing.

use std::collections::BTreeSet;

use pdfchunk::structure::merge_runs;
use pdfchunk::{
    Chunk, ClassifiedChunk, GlyphRun, HeaderParagraphPairer, PairingMode, Role, TextNormalizer,
};
use proptest::prelude::*;

fn run_strategy() -> impl Strategy<Value = Vec<GlyphRun>> {
    prop::collection::vec((0u32..6, 10u32..14, "[a-z]{1,8}"), 0..40).prop_map(|items| {
        items
            .into_iter()
            .map(|(page, size, text)| GlyphRun::new(page, size, text))
            .collect()
    })
}

fn size_groups(runs: &[GlyphRun]) -> Vec<Vec<&GlyphRun>> {
    let mut groups: Vec<Vec<&GlyphRun>> = Vec::new();
    for run in runs {
        match groups.last_mut() {
            Some(group) if group[0].size == run.size => group.push(run),
            _ => groups.push(vec![run]),
        }
    }
    groups
}

/// Property: with no TOC pages, chunks cover every run once, in order
#[test]
fn proptest_merge_covers_every_run() {
    proptest!(|(runs in run_strategy())| {
        let doc = merge_runs(runs.clone(), &BTreeSet::new(), &TextNormalizer::new());

        let merged: Vec<&str> = doc.chunks.iter().flat_map(|c| c.text.split(' ')).collect();
        let input: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        prop_assert_eq!(merged, input);
        prop_assert!(doc.toc.is_empty());
    });
}

fn joined(group: &[&GlyphRun]) -> String {
    group.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join(" ")
}

/// Property: with TOC pages, every run reaches the body or a final TOC snapshot
#[test]
fn proptest_merge_covers_every_run_with_toc() {
    proptest!(|(runs in run_strategy(), toc in prop::collection::btree_set(0u32..6, 1..4))| {
        let doc = merge_runs(runs.clone(), &toc, &TextNormalizer::new());
        let groups = size_groups(&runs);
        let mut body = doc.chunks.iter();

        for (i, group) in groups.iter().enumerate() {
            let expected = Chunk::new(group[0].page, group[0].size, joined(group));
            let on_toc = toc.contains(&group[0].page);
            let last = i + 1 == groups.len();

            if on_toc {
                prop_assert!(doc.toc.contains(&expected));
            }
            if !(on_toc && last) {
                prop_assert_eq!(body.next(), Some(&expected));
            }
        }
        prop_assert!(body.next().is_none());

        for entry in &doc.toc {
            let found = groups.iter().any(|g| {
                g[0].page == entry.page && joined(g).starts_with(&entry.text)
            });
            prop_assert!(found);
        }
    });
}

/// Property: a chunk boundary falls exactly where the font size changes
#[test]
fn proptest_size_boundaries() {
    proptest!(|(runs in run_strategy())| {
        let doc = merge_runs(runs.clone(), &BTreeSet::new(), &TextNormalizer::new());
        let groups = size_groups(&runs);

        prop_assert_eq!(doc.chunks.len(), groups.len());
        for (chunk, group) in doc.chunks.iter().zip(&groups) {
            prop_assert_eq!(chunk.size, group[0].size);
            prop_assert_eq!(chunk.page, group[0].page);
            let texts: Vec<&str> = group.iter().map(|r| r.text.as_str()).collect();
            prop_assert_eq!(&chunk.text, &texts.join(" "));
        }
    });
}

/// Property: the same input and TOC pages give the same partitioning
#[test]
fn proptest_toc_split_is_deterministic() {
    proptest!(|(runs in run_strategy(), toc in prop::collection::btree_set(0u32..6, 0..4))| {
        let normalizer = TextNormalizer::new();
        let first = merge_runs(runs.clone(), &toc, &normalizer);
        let second = merge_runs(runs, &toc, &normalizer);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.toc.iter().all(|entry| toc.contains(&entry.page)));
    });
}

/// Property: normalizing normalized text changes nothing
#[test]
fn proptest_normalization_idempotent() {
    proptest!(|(text in "[a-zA-Z0-9 ()cid:\\-\t\n\\x{A0}]{0,80}")| {
        let normalizer = TextNormalizer::new();
        let once = normalizer.normalize_text(&text);
        let twice = normalizer.normalize_text(&once);
        prop_assert_eq!(&twice, &once);
        prop_assert!(!once.contains("  "));
        prop_assert!(!once.contains('\n'));
    });
}

/// Property: normalization never panics on arbitrary text
#[test]
fn proptest_normalization_unicode() {
    proptest!(|(text in "\\PC{0,200}")| {
        let once = TextNormalizer::new().normalize_text(&text);
        prop_assert_eq!(once.trim(), once.as_str());
    });
}

fn classified(roles: &[bool]) -> Vec<Chunk> {
    roles
        .iter()
        .enumerate()
        .map(|(i, heading)| Chunk::new(i as u32, if *heading { 20 } else { 12 }, format!("c{}", i)))
        .collect()
}

fn emitted(chunks: &[Chunk], mode: PairingMode) -> Vec<String> {
    let classified: Vec<ClassifiedChunk<'_>> = chunks
        .iter()
        .map(|chunk| ClassifiedChunk {
            chunk,
            role: if chunk.size == 20 { Role::Heading } else { Role::Paragraph },
        })
        .collect();

    let mut texts: Vec<String> = HeaderParagraphPairer::new(mode)
        .pair(&classified)
        .into_iter()
        .flat_map(|pair| pair.header.into_iter().chain(pair.paragraph))
        .collect();
    texts.sort();
    texts
}

/// Property: keeping orphans emits every chunk exactly once
#[test]
fn proptest_pairing_keep_orphans_covers_all() {
    proptest!(|(roles in prop::collection::vec(any::<bool>(), 0..30))| {
        let chunks = classified(&roles);
        let mut expected: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        expected.sort();
        prop_assert_eq!(emitted(&chunks, PairingMode::KeepOrphans), expected);
    });
}

/// Property: compatible pairing loses only a leading paragraph
#[test]
fn proptest_pairing_compatible_gap() {
    proptest!(|(roles in prop::collection::vec(any::<bool>(), 0..30))| {
        let chunks = classified(&roles);
        let mut expected: Vec<String> = chunks
            .iter()
            .enumerate()
            .filter(|(i, c)| *i > 0 || c.size == 20)
            .map(|(_, c)| c.text.clone())
            .collect();
        expected.sort();
        prop_assert_eq!(emitted(&chunks, PairingMode::Compatible), expected);
    });
}
