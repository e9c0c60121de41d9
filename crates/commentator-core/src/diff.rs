//! Unified diff generation for dry runs.
//!
//! The annotation loop only ever replaces whole top-level functions, so a
//! diff is one hunk per replaced function rather than a general line diff.

use std::ops::Range;

/// A region of the old text replaced by a region of the new text. Both are
/// byte ranges that start at the beginning of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacedRegion {
    pub old: Range<usize>,
    pub new: Range<usize>,
}

/// 1-based line number of a byte offset.
fn line_of(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}

fn region_lines(text: &str, range: &Range<usize>) -> Vec<String> {
    text.get(range.clone())
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Generate a unified diff for one file.
///
/// Regions whose old and new text are identical produce no hunk. Returns an
/// empty string when there is nothing to show.
pub fn generate_unified_diff(
    path: &str,
    old_text: &str,
    new_text: &str,
    regions: &[ReplacedRegion],
) -> String {
    let mut hunks = String::new();
    let mut sorted: Vec<&ReplacedRegion> = regions.iter().collect();
    sorted.sort_by_key(|r| r.old.start);

    for region in sorted {
        let old_lines = region_lines(old_text, &region.old);
        let new_lines = region_lines(new_text, &region.new);
        if old_lines == new_lines {
            continue;
        }
        hunks.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            line_of(old_text, region.old.start),
            old_lines.len(),
            line_of(new_text, region.new.start),
            new_lines.len()
        ));
        for line in &old_lines {
            hunks.push_str(&format!("-{}\n", line));
        }
        for line in &new_lines {
            hunks.push_str(&format!("+{}\n", line));
        }
    }

    if hunks.is_empty() {
        return hunks;
    }
    format!("--- a/{}\n+++ b/{}\n{}", path, path, hunks)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_region() {
        let old = "import os\n\ndef f(x):\n    return x\n";
        let new = "import os\n\ndef f(x: int) -> int:\n    '''Identity.'''\n    return x\n";
        let region = ReplacedRegion {
            old: 11..old.len() - 1,
            new: 11..new.len() - 1,
        };
        let diff = generate_unified_diff("m.py", old, new, &[region]);
        assert_eq!(
            diff,
            "\
--- a/m.py
+++ b/m.py
@@ -3,2 +3,3 @@
-def f(x):
-    return x
+def f(x: int) -> int:
+    '''Identity.'''
+    return x
"
        );
    }

    #[test]
    fn unchanged_regions_produce_nothing() {
        let text = "def f():\n    pass\n";
        let region = ReplacedRegion {
            old: 0..text.len(),
            new: 0..text.len(),
        };
        assert_eq!(generate_unified_diff("m.py", text, text, &[region]), "");
    }

    #[test]
    fn hunks_follow_old_order() {
        let old = "def a():\n    pass\n\ndef b():\n    pass\n";
        let new = "def a() -> None:\n    pass\n\ndef b() -> None:\n    pass\n";
        let regions = [
            ReplacedRegion {
                old: 19..36,
                new: 27..52,
            },
            ReplacedRegion {
                old: 0..17,
                new: 0..25,
            },
        ];
        let diff = generate_unified_diff("m.py", old, new, &regions);
        let first = diff.find("@@ -1,").unwrap();
        let second = diff.find("@@ -4,").unwrap();
        assert!(first < second);
        assert_eq!(diff.matches("--- a/m.py").count(), 1);
    }
}
