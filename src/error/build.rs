//! Instrumentation and toolchain invocation errors

use super::CovstageError;

pub fn instrumentation_failed(
    package: impl Into<String>,
    reason: impl Into<String>,
) -> CovstageError {
    CovstageError::InstrumentationFailed {
        package: package.into(),
        reason: reason.into(),
    }
}

/// Creates a build failure carrying the verbatim toolchain output
pub fn build_failure(
    program: impl Into<String>,
    args: &[String],
    status: impl Into<String>,
    output: impl Into<String>,
) -> CovstageError {
    CovstageError::BuildFailure {
        program: program.into(),
        args: args.join(" "),
        status: status.into(),
        output: output.into(),
    }
}

pub fn spawn_failed(program: impl Into<String>, reason: impl Into<String>) -> CovstageError {
    CovstageError::ToolchainSpawnFailed {
        program: program.into(),
        reason: reason.into(),
    }
}
