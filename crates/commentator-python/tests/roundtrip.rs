// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Round-trip tests for the syntax tree adapter.
//!
//! Every fixture must serialize back byte for byte, and every top-level
//! function must extract and re-parse on its own.

use std::path::PathBuf;

use commentator_python::{enumerate, extract_source, parse};
use difference::assert_diff;

fn all_fixtures() -> impl Iterator<Item = (PathBuf, String)> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");

    path.read_dir().expect("read_dir").map(|file| {
        let path = file.unwrap().path();
        let contents = std::fs::read_to_string(&path).expect("reading file");
        (path, contents)
    })
}

fn visualize(s: &str) -> String {
    s.replace(' ', "▩").replace('\t', "→").split('\n').collect::<Vec<_>>().join("↩\n")
}

#[test]
fn roundtrip_fixtures() {
    for (path, input) in all_fixtures() {
        let tree = match parse(&input) {
            Ok(tree) => tree,
            Err(e) => panic!("{}: {}", path.display(), e),
        };
        let generated = tree.serialize();
        if generated != input {
            assert_diff!(&visualize(&input), &visualize(&generated), "", 0);
        }
    }
}

#[test]
fn extracted_functions_reparse() {
    for (path, input) in all_fixtures() {
        let tree = parse(&input).unwrap();
        for name in enumerate(&tree) {
            let source = extract_source(&tree, &name).unwrap();
            let fragment = parse(&source)
                .unwrap_or_else(|e| panic!("{}::{}: {}", path.display(), name, e));
            assert_eq!(enumerate(&fragment), vec![name.clone()]);
        }
    }
}

#[test]
fn fixture_function_names() {
    let mut names: Vec<(String, Vec<String>)> = all_fixtures()
        .map(|(path, input)| {
            let file = path.file_name().unwrap().to_string_lossy().into_owned();
            (file, enumerate(&parse(&input).unwrap()))
        })
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            ("classes_and_annotations.py".to_string(), vec!["closest".to_string()]),
            (
                "decorated_and_async.py".to_string(),
                vec!["fib".to_string(), "fetch".to_string()]
            ),
            ("odd_layout.py".to_string(), vec!["tabs".to_string()]),
            ("strings.py".to_string(), vec!["render".to_string()]),
        ]
    );
}
