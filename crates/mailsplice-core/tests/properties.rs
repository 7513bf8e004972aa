//! Property tests for part selection.

#![allow(clippy::unwrap_used)]

use mailsplice_core::mailsplice_mime::parse;
use mailsplice_core::{Config, Error, Mode, StructuralError, Target, process};
use proptest::prelude::*;

const TYPES: [&str; 4] = ["text/plain", "text/html", "text/calendar", "image/png"];

/// Builds a multipart message whose n-th part has type `types[n]` and body
/// `part<n>`.
fn message(container: &str, types: &[usize]) -> Vec<u8> {
    let mut out = format!("Subject: generated\r\nContent-Type: {container}; boundary=b\r\n\r\n");
    for (n, &ty) in types.iter().enumerate() {
        out.push_str(&format!("--b\r\nContent-Type: {}\r\n\r\npart{n}\r\n", TYPES[ty]));
    }
    out.push_str("--b--\r\n");
    out.into_bytes()
}

proptest! {
    #[test]
    fn index_mode_selects_exactly_the_indexed_child(
        types in prop::collection::vec(0..TYPES.len(), 1..8),
        index in 0usize..10,
    ) {
        let input = message("multipart/mixed", &types);
        let result = process(&input, &Config::new(Mode::PartIndex(index)));

        if index < types.len() {
            let out = result.unwrap();
            let root = parse(&out).unwrap();
            prop_assert!(root.matches_type(TYPES[types[index]]));
            prop_assert_eq!(root.decode_body().unwrap(), format!("part{index}").into_bytes());
            prop_assert_eq!(root.headers.get("subject"), Some("generated"));
        } else {
            let is_out_of_range = matches!(
                result,
                Err(Error::Structural(StructuralError::IndexOutOfRange { .. }))
            );
            prop_assert!(is_out_of_range);
        }
    }

    #[test]
    fn alternative_mode_takes_the_first_matching_child(
        types in prop::collection::vec(0..TYPES.len(), 1..8),
    ) {
        let input = message("multipart/alternative", &types);
        let result = process(&input, &Config::new(Mode::Alternative(Target::Html)));

        match types.iter().position(|&ty| TYPES[ty] == "text/html") {
            Some(first) => {
                let out = result.unwrap();
                let root = parse(&out).unwrap();
                prop_assert!(root.matches_type("text/html"));
                let content_type = root.content_type();
                prop_assert_eq!(content_type.charset(), Some("utf-8"));
                prop_assert_eq!(root.decode_body().unwrap(), format!("part{first}").into_bytes());
            }
            None => {
                let is_absent = matches!(
                    result,
                    Err(Error::Structural(StructuralError::TargetAbsent(_)))
                );
                prop_assert!(is_absent);
            }
        }
    }

    #[test]
    fn output_reparses_without_defects(
        types in prop::collection::vec(0..TYPES.len(), 1..8),
        index in 0usize..8,
    ) {
        let input = message("multipart/mixed", &types);
        if let Ok(out) = process(&input, &Config::new(Mode::PartIndex(index))) {
            let root = parse(&out).unwrap();
            prop_assert!(root.walk().all(|node| node.defects.is_empty()));
        }
    }
}
