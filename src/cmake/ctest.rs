// src/cmake/ctest.rs

//! CTest summary parsing

use regex::Regex;
use std::sync::LazyLock;

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)% tests passed,\s+(\d+) tests? failed out of (\d+)").unwrap()
});

static NO_TESTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no tests were found").unwrap());

// "  3 - MatrixTest.Inverse (Failed)" below "The following tests FAILED:"
static FAILED_TEST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s+-\s+(.+?)\s+\([^)]*\)\s*$").unwrap());

/// What ctest reported about a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtestSummary {
    /// Tests were executed
    Ran { failed: usize, total: usize },
    /// The build tree has no registered tests
    NoTests,
}

impl CtestSummary {
    pub fn passed(&self) -> usize {
        match self {
            CtestSummary::Ran { failed, total } => total.saturating_sub(*failed),
            CtestSummary::NoTests => 0,
        }
    }
}

/// Find the summary line in ctest output
///
/// The last summary wins when the output holds more than one (e.g. a
/// rerun appended to the same log).
pub fn parse_summary(output: &str) -> Option<CtestSummary> {
    if let Some(caps) = SUMMARY_RE.captures_iter(output).last() {
        let failed = caps[2].parse().ok()?;
        let total = caps[3].parse().ok()?;
        return Some(CtestSummary::Ran { failed, total });
    }

    if NO_TESTS_RE.is_match(output) {
        return Some(CtestSummary::NoTests);
    }

    None
}

/// Names of the tests ctest lists as failed
pub fn failed_tests(output: &str) -> Vec<String> {
    let Some(start) = output.rfind("The following tests FAILED:") else {
        return Vec::new();
    };

    output[start..]
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| FAILED_TEST_RE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}
