//! Static-analysis collaborator seam and its tokei-backed default.

use std::collections::BTreeMap;
use std::path::Path;

use tokei::{Config, LanguageType};

use crate::domain::{LanguageDistribution, QualityMetric};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::report::AnalysisReport;

/// Produces a raw analysis report for an acquired repository.
///
/// Implementations return `Ok(None)` when the content is unusable, e.g. no
/// supported language was detected; that outcome is a skip, not an error.
pub trait StaticAnalyzer {
    /// Analyze the repository checked out at `path`.
    fn analyze(&self, path: &Path, locator: &str) -> Result<Option<AnalysisReport>>;
}

/// Default analyzer: detects languages with `tokei` and derives line-based
/// raw metrics (lines of code, comment rate, language distribution).
pub struct TokeiAnalyzer<F: FileSystem> {
    fs: F,
    config: Config,
}

impl<F: FileSystem> TokeiAnalyzer<F> {
    /// Create an analyzer with default `tokei` configuration.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            config: Config::default(),
        }
    }

    /// Create an analyzer with a custom `tokei` configuration.
    pub fn with_config(fs: F, config: Config) -> Self {
        Self { fs, config }
    }
}

impl<F: FileSystem> StaticAnalyzer for TokeiAnalyzer<F> {
    fn analyze(&self, path: &Path, locator: &str) -> Result<Option<AnalysisReport>> {
        let files = self.fs.list_files(path)?;
        let mut per_language: BTreeMap<String, usize> = BTreeMap::new();
        let mut code_lines = 0usize;
        let mut comment_lines = 0usize;

        for file in files {
            let Some(language) = LanguageType::from_path(&file, &self.config) else {
                continue;
            };
            let contents = self.fs.read_to_string(&file)?;
            let counts = count_lines(&contents, language);
            if counts.total() == 0 {
                continue;
            }
            code_lines += counts.code;
            comment_lines += counts.comments;
            *per_language.entry(language.to_string()).or_insert(0) += counts.total();
        }

        let total = code_lines + comment_lines;
        if total == 0 {
            return Ok(None);
        }

        let mut languages = LanguageDistribution::new();
        for (language, lines) in per_language {
            languages.insert(language, (lines as f64 / total as f64) * 100.0);
        }

        let mut metrics = BTreeMap::new();
        metrics.insert(QualityMetric::LinesOfCode, code_lines as f64);
        metrics.insert(
            QualityMetric::CommentRate,
            comment_lines as f64 / total as f64,
        );

        Ok(Some(AnalysisReport::new(
            locator,
            languages,
            Vec::new(),
            Vec::new(),
            metrics,
        )))
    }
}

struct LineCounts {
    code: usize,
    comments: usize,
}

impl LineCounts {
    fn total(&self) -> usize {
        self.code + self.comments
    }
}

/// Tally non-blank lines into code and comment lines using the language's
/// line-comment tokens. Block comments are not tracked; this is a heuristic
/// good enough for a comment-rate utility, not a full parse.
fn count_lines(contents: &str, language: LanguageType) -> LineCounts {
    let tokens = language.line_comments();
    let mut counts = LineCounts {
        code: 0,
        comments: 0,
    };

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if tokens.iter().any(|token| trimmed.starts_with(token)) {
            counts.comments += 1;
        } else {
            counts.code += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::{StaticAnalyzer, TokeiAnalyzer, count_lines};
    use crate::domain::QualityMetric;
    use crate::fs::MockFileSystem;
    use std::path::{Path, PathBuf};

    #[test]
    fn counts_code_and_comment_lines() {
        let contents = "// header\nfn main() {\n    // nested comment\n    println!();\n}\n\n";
        let counts = count_lines(contents, tokei::LanguageType::Rust);
        assert_eq!(counts.code, 3);
        assert_eq!(counts.comments, 2);
    }

    #[test]
    fn analyze_reports_languages_and_raw_metrics() {
        let mut fs = MockFileSystem::new();
        fs.expect_list_files().returning(|_| {
            Ok(vec![
                PathBuf::from("src/main.rs"),
                PathBuf::from("src/app.py"),
            ])
        });
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("src/main.rs"))
            .returning(|_| Ok("// entry\nfn main() {}\n".to_string()));
        fs.expect_read_to_string()
            .withf(|path| path == Path::new("src/app.py"))
            .returning(|_| Ok("print('hi')\nx = 1\n".to_string()));

        let analyzer = TokeiAnalyzer::new(fs);
        let report = analyzer
            .analyze(Path::new("/repo"), "https://github.com/org/repo")
            .expect("analyze")
            .expect("report");

        assert_eq!(report.project_url, "https://github.com/org/repo");
        let rust_key = tokei::LanguageType::Rust.to_string();
        let python_key = tokei::LanguageType::Python.to_string();
        assert_eq!(report.languages.get(&rust_key).copied(), Some(50.0));
        assert_eq!(report.languages.get(&python_key).copied(), Some(50.0));
        assert_eq!(report.metrics[&QualityMetric::LinesOfCode], 3.0);
        assert_eq!(report.metrics[&QualityMetric::CommentRate], 0.25);
    }

    #[test]
    fn analyze_skips_unsupported_content() {
        let mut fs = MockFileSystem::new();
        fs.expect_list_files()
            .returning(|_| Ok(vec![PathBuf::from("data.bin"), PathBuf::from("notes")]));

        let analyzer = TokeiAnalyzer::new(fs);
        let report = analyzer
            .analyze(Path::new("/repo"), "https://github.com/org/repo")
            .expect("analyze");

        assert!(report.is_none());
    }

    #[test]
    fn analyze_skips_empty_supported_files() {
        let mut fs = MockFileSystem::new();
        fs.expect_list_files()
            .returning(|_| Ok(vec![PathBuf::from("src/empty.rs")]));
        fs.expect_read_to_string().returning(|_| Ok(String::new()));

        let analyzer = TokeiAnalyzer::new(fs);
        let report = analyzer
            .analyze(Path::new("/repo"), "https://github.com/org/repo")
            .expect("analyze");

        assert!(report.is_none());
    }
}
