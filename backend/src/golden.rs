//! Golden-file regression testing.
//!
//! `check` compares produced output against a baseline under
//! `testdata/golden/`; with `UPDATE_GOLDEN` set in the environment the
//! baseline is rewritten instead. Comparison goes through the fuzzy
//! comparator so whitespace drift does not churn baselines.

use std::fs;
use std::path::{Path, PathBuf};

use crate::compare::{compare, CompareOptions, CompareResult};
use crate::error::{ConvertError, Result};
use crate::logger;

pub const GOLDEN_DIR: &str = "testdata/golden";
pub const UPDATE_ENV: &str = "UPDATE_GOLDEN";

#[derive(Debug)]
pub enum GoldenOutcome {
    /// Baseline written (or rewritten) because updates were requested.
    Updated(PathBuf),
    /// Output matched the baseline.
    Matched,
    /// Output drifted from the baseline.
    Drifted(CompareResult),
}

impl GoldenOutcome {
    pub fn passed(&self) -> bool {
        !matches!(self, GoldenOutcome::Drifted(_))
    }
}

pub struct GoldenRunner {
    dir: PathBuf,
    update: bool,
    options: CompareOptions,
}

impl Default for GoldenRunner {
    fn default() -> Self {
        GoldenRunner {
            dir: PathBuf::from(GOLDEN_DIR),
            update: std::env::var(UPDATE_ENV).is_ok_and(|v| !v.is_empty()),
            options: CompareOptions::default(),
        }
    }
}

impl GoldenRunner {
    pub fn new(dir: &Path, update: bool, options: CompareOptions) -> Self {
        GoldenRunner {
            dir: dir.to_path_buf(),
            update,
            options,
        }
    }

    pub fn golden_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.golden", name))
    }

    /// Compares `actual` against the named baseline, or rewrites it in
    /// update mode. A missing baseline outside update mode is an error
    /// pointing at the env var that creates it.
    pub fn check(&self, name: &str, actual: &str) -> Result<GoldenOutcome> {
        let path = self.golden_path(name);

        if self.update {
            self.save(name, actual)?;
            logger::info(&format!("updated golden file {}", path.display()));
            return Ok(GoldenOutcome::Updated(path));
        }

        let expected = self.load(name)?;
        let result = compare(&expected, actual, &self.options);
        if result.matched {
            Ok(GoldenOutcome::Matched)
        } else {
            Ok(GoldenOutcome::Drifted(result))
        }
    }

    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.golden_path(name);
        fs::read_to_string(&path).map_err(|_| ConvertError::InvalidConf {
            path,
            reason: format!("golden file not found (set {}=1 to create it)", UPDATE_ENV),
        })
    }

    pub fn save(&self, name: &str, content: &str) -> Result<()> {
        let path = self.golden_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(name: &str, update: bool) -> GoldenRunner {
        let dir = std::env::temp_dir().join(format!("cedrus_golden_{}", name));
        let _ = fs::remove_dir_all(&dir);
        GoldenRunner::new(&dir, update, CompareOptions::default())
    }

    #[test]
    fn update_mode_writes_the_baseline() {
        let runner = runner("update", true);
        let outcome = runner.check("gen_1_1", "In the beginning").unwrap();
        assert!(matches!(outcome, GoldenOutcome::Updated(_)));
        assert_eq!(runner.load("gen_1_1").unwrap(), "In the beginning");
    }

    #[test]
    fn matching_output_passes() {
        let runner = runner("match", false);
        runner.save("verse", "For God so loved the world").unwrap();
        let outcome = runner.check("verse", "For God so loved the world").unwrap();
        assert!(outcome.passed());
        assert!(matches!(outcome, GoldenOutcome::Matched));
    }

    #[test]
    fn drift_is_reported_with_a_diff() {
        let runner = runner("drift", false);
        runner.save("verse", "For God so loved the world").unwrap();
        let outcome = runner.check("verse", "For God so loved the earth").unwrap();
        match outcome {
            GoldenOutcome::Drifted(result) => {
                assert!(!result.matched);
                assert!(result.similarity < 1.0);
                assert!(result.diff.contains("world"));
            }
            other => panic!("expected drift, got {:?}", other),
        }
    }

    #[test]
    fn missing_baseline_is_an_error() {
        let runner = runner("missing", false);
        let err = runner.check("never_written", "text").unwrap_err();
        assert!(err.to_string().contains("UPDATE_GOLDEN"));
    }
}
