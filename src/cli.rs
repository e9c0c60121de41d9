//! CLI front door for annotation runs.
//!
//! [`run_annotate`] is what the `commentator` binary calls once arguments
//! and configuration are resolved. It is a library function so integration
//! tests can drive whole runs with a scripted generator.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use commentator_core::diagnostics::DiagnosticSink;
use commentator_core::diff::{generate_unified_diff, ReplacedRegion};
use commentator_core::error::CommentatorError;
use commentator_core::language::classify;
use commentator_core::output::{AnnotationReport, FileReport, FileStatus, FunctionStatus};
use commentator_python::locate::function_span;
use commentator_python::{parse, SyntaxTree};

use crate::annotate::{AnnotateError, AnnotateOptions, AnnotatedSource, Annotator};
use crate::generate::Generator;

/// Settings for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub annotate: AnnotateOptions,
    /// Compute diffs instead of writing files.
    pub dry_run: bool,
}

/// Annotate `files` in order and write back every file that changed.
///
/// Files that cannot be processed (not Python, not parseable) are reported
/// as skipped. A fatal generation failure stops the run at once; the file
/// being processed is left as it was.
pub fn run_annotate(
    files: &[PathBuf],
    options: &RunOptions,
    generator: &mut dyn Generator,
    sink: &mut dyn DiagnosticSink,
) -> Result<AnnotationReport, CommentatorError> {
    let mut annotator = Annotator::new(generator, sink, options.annotate.clone());
    let mut reports = Vec::with_capacity(files.len());

    for path in files {
        let file = path.display().to_string();
        let language = classify(&file);
        let source = fs::read_to_string(path)
            .map_err(|e| CommentatorError::apply(format!("failed to read file: {}", e), &file))?;

        let annotated = match annotator.annotate_source(&file, &source) {
            Ok(annotated) => annotated,
            Err(err @ AnnotateError::Fatal(_)) => return Err(err.into()),
            Err(err) => {
                warn!(file = %file, error = %err, "skipping file");
                reports.push(FileReport::skipped(&file, language, err.to_string()));
                continue;
            }
        };

        let mut report = FileReport {
            path: file.clone(),
            language: language.to_string(),
            status: FileStatus::Unchanged,
            functions: annotated.outcomes.clone(),
            reason: None,
            diff: None,
        };

        if annotated.changed() {
            report.status = FileStatus::Updated;
            if options.dry_run {
                report.diff = Some(file_diff(&file, &source, &annotated)?);
            } else {
                fs::write(path, annotated.text()).map_err(|e| {
                    CommentatorError::apply(format!("failed to write file: {}", e), &file)
                })?;
                info!(file = %file, "file updated");
            }
        }
        reports.push(report);
    }

    Ok(AnnotationReport::new(options.dry_run, reports))
}

/// Unified diff between `source` and the annotated result, one hunk per
/// accepted function.
fn file_diff(
    display: &str,
    source: &str,
    annotated: &AnnotatedSource,
) -> Result<String, CommentatorError> {
    let original: SyntaxTree = parse(source)
        .map_err(|e| CommentatorError::internal(format!("{} no longer parses: {}", display, e)))?;
    let mut regions = Vec::new();
    for name in annotated.accepted_names() {
        let old = function_span(&original, name);
        let new = function_span(&annotated.tree, name);
        match (old, new) {
            (Ok(old), Ok(new)) => regions.push(ReplacedRegion { old, new }),
            _ => {
                return Err(CommentatorError::FunctionNotFound {
                    file: display.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }
    Ok(generate_unified_diff(
        display,
        &original.serialize(),
        &annotated.text(),
        &regions,
    ))
}

/// Human-readable report: diffs first (dry runs), then one line per file and
/// a totals line.
pub fn render_text_report(report: &AnnotationReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        if let Some(diff) = &file.diff {
            out.push_str(diff);
        }
    }
    for file in &report.files {
        let _ = match file.status {
            FileStatus::Skipped => writeln!(
                out,
                "skipped {}: {}",
                file.path,
                file.reason.as_deref().unwrap_or("not processed")
            ),
            status => {
                let verb = match (status, report.dry_run) {
                    (FileStatus::Updated, true) => "would update",
                    (FileStatus::Updated, false) => "updated",
                    _ => "unchanged",
                };
                let accepted = count(file, FunctionStatus::Accepted);
                let exhausted = count(file, FunctionStatus::Exhausted);
                writeln!(
                    out,
                    "{} {} ({} annotated, {} given up)",
                    verb, file.path, accepted, exhausted
                )
            }
        };
    }
    let summary = &report.summary;
    let _ = writeln!(
        out,
        "{} file(s) updated, {} skipped; {} function(s) annotated, {} already complete, {} given up",
        summary.files_updated,
        summary.files_skipped,
        summary.accepted,
        summary.already_complete,
        summary.exhausted
    );
    out
}

fn count(file: &FileReport, status: FunctionStatus) -> usize {
    file.functions.iter().filter(|f| f.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use commentator_core::diagnostics::MemorySink;
    use commentator_core::output::FunctionOutcome;
    use tempfile::TempDir;

    use crate::generate::{GenerationRequest, GenerationResult};

    struct Fixed(&'static str);

    impl Generator for Fixed {
        fn generate(&mut self, _request: &GenerationRequest) -> GenerationResult<String> {
            Ok(self.0.to_string())
        }
    }

    const SOURCE: &str = "import math\n\ndef area(r):\n    return math.pi * r * r\n";
    const REWRITE: &str = "```python\ndef area(r: float) -> float:\n    \"\"\"Area of a circle.\"\"\"\n    return math.pi * r * r\n```";

    #[test]
    fn dry_run_reports_a_diff_and_leaves_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("circle.py");
        fs::write(&path, SOURCE).unwrap();

        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let mut generator = Fixed(REWRITE);
        let mut sink = MemorySink::new();
        let report =
            run_annotate(std::slice::from_ref(&path), &options, &mut generator, &mut sink).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE);
        let file = &report.files[0];
        assert_eq!(file.status, FileStatus::Updated);
        let diff = file.diff.as_deref().unwrap();
        assert!(diff.contains("-def area(r):"));
        assert!(diff.contains("+def area(r: float) -> float:"));
        assert!(diff.contains("@@ -3,2 +3,3 @@"));
    }

    #[test]
    fn non_dry_run_writes_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("circle.py");
        fs::write(&path, SOURCE).unwrap();

        let mut generator = Fixed(REWRITE);
        let mut sink = MemorySink::new();
        let report = run_annotate(
            std::slice::from_ref(&path),
            &RunOptions::default(),
            &mut generator,
            &mut sink,
        )
        .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("import math\n\ndef area(r: float) -> float:\n"));
        assert!(report.files[0].diff.is_none());
        assert_eq!(report.summary.files_updated, 1);
    }

    #[test]
    fn unreadable_python_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.py");
        fs::write(&path, "def f(:\n").unwrap();

        let mut generator = Fixed(REWRITE);
        let mut sink = MemorySink::new();
        let report =
            run_annotate(&[path], &RunOptions::default(), &mut generator, &mut sink).unwrap();
        assert_eq!(report.files[0].status, FileStatus::Skipped);
        assert_eq!(report.summary.files_skipped, 1);
    }

    #[test]
    fn reports_carry_the_file_path() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("broken.py");
        let circle = temp.path().join("circle.py");
        fs::write(&broken, "def f(:\n").unwrap();
        fs::write(&circle, SOURCE).unwrap();

        let mut generator = Fixed(REWRITE);
        let mut sink = MemorySink::new();
        let report = run_annotate(
            &[broken.clone(), circle.clone()],
            &RunOptions::default(),
            &mut generator,
            &mut sink,
        )
        .unwrap();

        assert_eq!(report.files[0].path, broken.display().to_string());
        assert!(report.files[0].reason.is_some());
        assert_eq!(report.files[1].path, circle.display().to_string());
        assert_eq!(report.files[1].status, FileStatus::Updated);
    }

    #[test]
    fn text_report_lists_each_file() {
        let files = vec![
            FileReport {
                path: "a.py".to_string(),
                language: "Python".to_string(),
                status: FileStatus::Updated,
                functions: vec![FunctionOutcome {
                    name: "f".to_string(),
                    status: FunctionStatus::Accepted,
                    attempts: 1,
                    gained_typing: true,
                }],
                reason: None,
                diff: None,
            },
            FileReport::skipped("b.js", "JavaScript", "cannot validate JavaScript code"),
        ];
        let text = render_text_report(&AnnotationReport::new(false, files));
        assert!(text.contains("updated a.py (1 annotated, 0 given up)"));
        assert!(text.contains("skipped b.js: cannot validate JavaScript code"));
        assert!(text.ends_with("1 file(s) updated, 1 skipped; 1 function(s) annotated, 0 already complete, 0 given up\n"));
    }
}
