//! Codec tests: round-trip fidelity, comment/string hazards, bracket
//! isolation and the fallback encode path.

use crate::codec::{decode, encode};
use crate::error::SyncError;
use crate::record::{Award, Publication, PublicationKind};
use proptest::prelude::*;

const AWARDS_TS: &str = "\u{feff}import type { Award } from '../types';\nimport { certificates } from './assets';\n\n/* Exported for the awards page.\n   Bracket in a comment: ] */\n// Sorted roughly by date [newest first]\nexport const awards: Award[] = [\n  {\n    title: 'Best Paper // not a comment',\n    organization: \"IEEE /* not a comment */ Society\",\n    date: '2023-06-01',\n    description: 'Cited as \"outstanding\" [Vol 2]',\n    certificateUrl: certificates.bestPaper,\n  },\n  {\n    title: 'Young Researcher Award',\n    organization: 'ACM',\n    date: '2021-11-15',\n    category: 'honors',\n  },\n];\n";

fn sample_publication(title: &str) -> Publication {
    Publication {
        title: title.to_string(),
        authors: "A. Author".to_string(),
        journal: "Journal of Tests".to_string(),
        year: 2024,
        doi: None,
        kind: PublicationKind::Journal,
        pdf_url: None,
        image_url: None,
    }
}

#[test]
fn test_decode_yields_records_in_file_order() {
    let awards: Vec<Award> = decode("data/awards.ts", AWARDS_TS).unwrap();
    assert_eq!(awards.len(), 2);
    assert_eq!(awards[0].title, "Best Paper // not a comment");
    assert_eq!(awards[1].title, "Young Researcher Award");
}

#[test]
fn test_comment_markers_inside_strings_survive() {
    let awards: Vec<Award> = decode("data/awards.ts", AWARDS_TS).unwrap();
    assert_eq!(awards[0].organization, "IEEE /* not a comment */ Society");

    let encoded = encode("data/awards.ts", &awards, Some(AWARDS_TS), "Award", "awards").unwrap();
    let again: Vec<Award> = decode("data/awards.ts", &encoded).unwrap();
    assert_eq!(again, awards);
}

#[test]
fn test_bare_identifier_becomes_placeholder_string() {
    let awards: Vec<Award> = decode("data/awards.ts", AWARDS_TS).unwrap();
    assert_eq!(
        awards[0].certificate_url.as_deref(),
        Some("certificates.bestPaper")
    );
}

#[test]
fn test_round_trip_value_equality_and_prefix_preservation() {
    let awards: Vec<Award> = decode("data/awards.ts", AWARDS_TS).unwrap();
    let encoded = encode("data/awards.ts", &awards, Some(AWARDS_TS), "Award", "awards").unwrap();

    // Every byte before the declaration's `=` is preserved verbatim,
    // including the BOM, imports and both comment forms.
    let eq_pos = AWARDS_TS.find("] = [").map(|i| i + 4).unwrap();
    assert_eq!(&encoded[..eq_pos], &AWARDS_TS[..eq_pos]);

    // The trailing `;` and newline after the array survive too.
    assert!(encoded.ends_with("];\n"));

    let again: Vec<Award> = decode("data/awards.ts", &encoded).unwrap();
    assert_eq!(again, awards);
}

#[test]
fn test_second_round_trip_is_stable() {
    let awards: Vec<Award> = decode("data/awards.ts", AWARDS_TS).unwrap();
    let once = encode("data/awards.ts", &awards, Some(AWARDS_TS), "Award", "awards").unwrap();
    let twice = encode(
        "data/awards.ts",
        &decode::<Award>("data/awards.ts", &once).unwrap(),
        Some(&once),
        "Award",
        "awards",
    )
    .unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_locator_skips_non_array_exports() {
    let content = "export const meta = { tags: ['x', 'y'] };\n\
                   export const publications: Publication[] = [\n\
                     { title: 'T', authors: 'A', journal: 'J', year: 2020, type: 'journal' },\n\
                   ];\n";
    let records: Vec<Publication> = decode("data/publications.ts", content).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "T");
}

#[test]
fn test_brackets_inside_strings_do_not_confuse_matching() {
    let content = "export const publications = [\n\
                   { title: 'Proceedings ]][[ Part 2', authors: 'A', journal: 'J', year: 1999, type: 'proceedings' }\n\
                   ];\n// trailing comment with ]\n";
    let records: Vec<Publication> = decode("data/publications.ts", content).unwrap();
    assert_eq!(records[0].title, "Proceedings ]][[ Part 2");

    let encoded = encode(
        "data/publications.ts",
        &records,
        Some(content),
        "Publication",
        "publications",
    )
    .unwrap();
    assert!(encoded.ends_with("];\n// trailing comment with ]\n"));
}

#[test]
fn test_string_escapes_decoded() {
    let content = "export const publications = [{\n\
                   title: 'Line\\nBreak \\'quoted\\' \\u0041 \\u{1F600}',\n\
                   authors: \"Tab\\there\",\n\
                   journal: `back\\`tick`,\n\
                   year: 2020, type: 'journal'\n\
                   }];";
    let records: Vec<Publication> = decode("data/publications.ts", content).unwrap();
    assert_eq!(records[0].title, "Line\nBreak 'quoted' A \u{1F600}");
    assert_eq!(records[0].authors, "Tab\there");
    assert_eq!(records[0].journal, "back`tick");
}

#[test]
fn test_surrogate_pair_escape() {
    let content = "export const publications = [{ title: '\\uD83D\\uDE00', authors: 'A', journal: 'J', year: 2020, type: 'journal' }];";
    let records: Vec<Publication> = decode("data/publications.ts", content).unwrap();
    assert_eq!(records[0].title, "\u{1F600}");
}

#[test]
fn test_trailing_commas_and_numeric_forms() {
    let content = "export const xs = [\n  { title: 'T', authors: 'A', journal: 'J', year: 2.02e3, type: 'journal', },\n]\n";
    let records: Vec<Publication> = decode("data/publications.ts", content).unwrap();
    assert_eq!(records[0].year, 2020);
}

#[test]
fn test_empty_array_decodes_and_encodes() {
    let content = "export const awards: Award[] = [];\n";
    let records: Vec<Award> = decode("data/awards.ts", content).unwrap();
    assert!(records.is_empty());

    let encoded = encode("data/awards.ts", &records, Some(content), "Award", "awards").unwrap();
    assert_eq!(encoded, "export const awards: Award[] = [];\n");
}

#[test]
fn test_missing_export_is_parse_error() {
    let content = "import { x } from 'y';\nconst local = [1, 2, 3];\n";
    let result: Result<Vec<Award>, _> = decode("data/awards.ts", content);
    match result {
        Err(SyncError::Parse { path, message, .. }) => {
            assert_eq!(path, "data/awards.ts");
            assert!(message.contains("no exported array"));
        }
        other => panic!("expected parse error, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_malformed_literal_carries_excerpt() {
    let content = "export const awards = [ { title 'missing colon' } ];";
    let result: Result<Vec<Award>, _> = decode("data/awards.ts", content);
    match result {
        Err(SyncError::Parse { excerpt, .. }) => assert!(!excerpt.is_empty()),
        other => panic!("expected parse error, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_record_schema_mismatch_is_parse_error() {
    // Well-formed literal, but missing the required `date` field.
    let content = "export const awards = [{ title: 'T', organization: 'O' }];";
    let result: Result<Vec<Award>, _> = decode("data/awards.ts", content);
    match result {
        Err(SyncError::Parse { message, .. }) => {
            assert!(message.contains("record 0"));
        }
        other => panic!("expected parse error, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_unbalanced_array_is_parse_error() {
    let content = "export const awards = [ { title: 'T' }";
    let result: Result<Vec<Award>, _> = decode("data/awards.ts", content);
    assert!(matches!(result, Err(SyncError::Parse { .. })));
}

#[test]
fn test_fallback_encode_decodes_back() {
    let records = vec![sample_publication("Fresh File")];
    let encoded = encode(
        "data/publications.ts",
        &records,
        None,
        "Publication",
        "publications",
    )
    .unwrap();

    assert!(encoded.starts_with("export const publications: Publication[] = ["));
    assert!(encoded.ends_with(";\n"));

    let decoded: Vec<Publication> = decode("data/publications.ts", &encoded).unwrap();
    assert_eq!(decoded, records);
}

#[test]
fn test_encode_against_unparseable_original_fails_loudly() {
    let records = vec![sample_publication("X")];
    let result = encode(
        "data/publications.ts",
        &records,
        Some("// nothing exported here\n"),
        "Publication",
        "publications",
    );
    assert!(matches!(result, Err(SyncError::Parse { .. })));
}

proptest! {
    // Any title serde_json can emit must survive a fresh encode/decode,
    // including quotes, backslashes, comment markers and control chars.
    #[test]
    fn prop_titles_round_trip(title in ".*") {
        let record = sample_publication(&title);
        let encoded = encode(
            "data/publications.ts",
            std::slice::from_ref(&record),
            None,
            "Publication",
            "publications",
        )
        .unwrap();
        let decoded: Vec<Publication> = decode("data/publications.ts", &encoded).unwrap();
        prop_assert_eq!(&decoded[0].title, &title);
    }

    #[test]
    fn prop_round_trip_preserves_count(n in 0usize..20) {
        let records: Vec<Publication> =
            (0..n).map(|i| sample_publication(&format!("P{}", i))).collect();
        let encoded = encode(
            "data/publications.ts",
            &records,
            None,
            "Publication",
            "publications",
        )
        .unwrap();
        let decoded: Vec<Publication> = decode("data/publications.ts", &encoded).unwrap();
        prop_assert_eq!(decoded, records);
    }
}
