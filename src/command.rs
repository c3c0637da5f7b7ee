//! Helpers for running the external tools we depend on.

use std::{process::Output, sync::LazyLock};

use regex::Regex;

use crate::prelude::*;

/// Lines on standard error that indicate a real failure.
static ERROR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error").expect("failed to compile regex"));

/// Poppler complains about damaged cross-reference tables, but recovers from
/// them without trouble. Scanned books are full of these.
static DOWNGRADE_TO_WARNING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)error: xref num").expect("failed to compile regex")
});

/// Does this line of tool output describe an actual error?
pub fn is_error_line(line: &str) -> bool {
    ERROR_REGEX.is_match(line) && !DOWNGRADE_TO_WARNING_REGEX.is_match(line)
}

/// How to treat what a successful command printed on standard error.
#[derive(Clone, Copy, Debug)]
pub enum StderrPolicy {
    /// Log every line as a warning.
    Warn,
    /// Fail on lines matching the classifier, and warn about the rest.
    FailOn(fn(&str) -> bool),
    /// The tool reports progress on stderr. Log it at debug level.
    Chatter,
}

/// What a single line on standard error means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StderrLine {
    Error,
    Warning,
    Chatter,
}

impl StderrPolicy {
    /// Classify one line of standard error.
    pub fn classify(self, line: &str) -> StderrLine {
        match self {
            StderrPolicy::Warn => StderrLine::Warning,
            StderrPolicy::FailOn(is_error) if is_error(line) => StderrLine::Error,
            StderrPolicy::FailOn(_) => StderrLine::Warning,
            StderrPolicy::Chatter => StderrLine::Chatter,
        }
    }
}

/// Turn a finished command into an error if it failed.
///
/// A command fails if it exited unsuccessfully, or if `policy` classifies any
/// line it printed on standard error as an error.
pub fn check_for_command_failure(
    command_name: &str,
    output: &Output,
    policy: StderrPolicy,
) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    trace!(command_name, output = %stdout, "Standard output from command");

    if !output.status.success() {
        return match output.status.code() {
            Some(exit_code) => Err(anyhow!(
                "{} failed with exit code {} and error output:\n{}",
                command_name,
                exit_code,
                stderr.trim(),
            )),
            None => Err(anyhow!(
                "{} was terminated with error output:\n{}",
                command_name,
                stderr.trim(),
            )),
        };
    }

    let mut error_lines = vec![];
    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match policy.classify(line) {
            StderrLine::Error => error_lines.push(line),
            StderrLine::Warning => warn!(command_name, "{}", line),
            StderrLine::Chatter => debug!(command_name, "{}", line),
        }
    }
    if error_lines.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} printed error output:\n{}",
            command_name,
            error_lines.join("\n"),
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::{os::unix::process::ExitStatusExt as _, process::ExitStatus};

    use super::*;

    fn output(code: i32, stderr: &str) -> Output {
        Output {
            // Raw wait statuses keep the exit code in the high byte.
            status: ExitStatus::from_raw(code << 8),
            stdout: vec![],
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn is_error_line_works() {
        assert!(is_error_line("error: something went wrong"));
        assert!(is_error_line("Syntax Error: Couldn't read xref table"));
        assert!(!is_error_line("Warning: something is odd"));
        assert!(!is_error_line(
            "Internal Error: xref num 1234 not found but needed, document has changes, reconstruct aborted"
        ));
    }

    #[test]
    fn successful_command_with_warnings_is_ok() {
        let out = output(0, "Warning: odd font\n");
        assert!(
            check_for_command_failure("tool", &out, StderrPolicy::FailOn(is_error_line)).is_ok()
        );
    }

    #[test]
    fn error_lines_fail_even_on_success() {
        let out = output(0, "Syntax Error: bad stream\n");
        let err = check_for_command_failure("tool", &out, StderrPolicy::FailOn(is_error_line))
            .unwrap_err();
        assert!(err.to_string().contains("bad stream"));
    }

    #[test]
    fn nonzero_exit_fails() {
        let out = output(2, "cannot open file\n");
        let err = check_for_command_failure("tool", &out, StderrPolicy::Warn).unwrap_err();
        assert!(err.to_string().contains("exit code 2"));
    }

    #[test]
    fn tesseract_progress_is_chatter() {
        let policy = StderrPolicy::Chatter;
        assert_eq!(
            policy.classify("Estimating resolution as 287"),
            StderrLine::Chatter
        );
        let out = output(
            0,
            "Tesseract Open Source OCR Engine v5.3.0\nEstimating resolution as 287\n",
        );
        assert!(check_for_command_failure("tesseract", &out, policy).is_ok());
    }

    #[test]
    fn policies_classify_lines() {
        let line = "Syntax Error: bad stream";
        assert_eq!(StderrPolicy::Warn.classify(line), StderrLine::Warning);
        assert_eq!(
            StderrPolicy::FailOn(is_error_line).classify(line),
            StderrLine::Error
        );
        assert_eq!(
            StderrPolicy::FailOn(is_error_line).classify("Warning: odd font"),
            StderrLine::Warning
        );
    }
}
