//! The two external transform stages: XSLT processing and FO rendering.
//!
//! Each stage is one synchronous subprocess with a fixed argument contract
//! and an exit-code-zero success criterion. Outcomes are typed: a failure
//! carries the stage's tool tag, an explicit severity and the captured
//! output. The XSLT stage is fatal, the FO render stage soft; deciding what
//! either means for the overall operation is left to the orchestrator.

use std::path::Path;

use tracing::{error, info};

use crate::config::{OutputFormat, ToolCommands};
use crate::runner::ProcessRunner;

/// Tool tag used in XSLT-stage failure log prefixes.
pub const XSLT_TOOL: &str = "SAXON";
/// Tool tag used in FO-render-stage failure log prefixes.
pub const FO_TOOL: &str = "FOP";

/// How a stage failure propagates out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the operation and carry the captured output on the error.
    Fatal,
    /// Abort the operation with a bare failure signal; the captured output
    /// is only logged.
    Soft,
}

/// A transform stage that exited non-zero or could not be launched.
#[derive(Debug)]
pub struct StageFailure {
    pub tool: &'static str,
    pub severity: Severity,
    pub exit_code: i32,
    pub lines: Vec<String>,
}

pub type StageResult = Result<(), StageFailure>;

/// Stage A: run the XSLT processor over the normalised EAD, producing the
/// intermediate FO document. Args: stylesheet, source XML, output path.
pub fn run_xslt(
    runner: &dyn ProcessRunner,
    tools: &ToolCommands,
    stylesheet: &Path,
    source: &Path,
    fo_output: &Path,
) -> StageResult {
    let args = vec![
        stylesheet.display().to_string(),
        source.display().to_string(),
        fo_output.display().to_string(),
    ];
    run_stage(runner, &tools.xslt_processor, args, XSLT_TOOL, Severity::Fatal)
}

/// Stage B: run the FO renderer over the intermediate document, producing
/// the final artifact. Args: format flag, FO input, output path.
pub fn run_fo_render(
    runner: &dyn ProcessRunner,
    tools: &ToolCommands,
    format: OutputFormat,
    fo_input: &Path,
    artifact: &Path,
) -> StageResult {
    let args = vec![
        format.render_flag(),
        fo_input.display().to_string(),
        artifact.display().to_string(),
    ];
    run_stage(runner, &tools.fo_renderer, args, FO_TOOL, Severity::Soft)
}

fn run_stage(
    runner: &dyn ProcessRunner,
    command: &str,
    args: Vec<String>,
    tool: &'static str,
    severity: Severity,
) -> StageResult {
    match runner.run(command, &args) {
        Ok(output) if output.success() => {
            info!(tool, command, "Transform stage completed");
            Ok(())
        }
        Ok(output) => Err(StageFailure {
            tool,
            severity,
            exit_code: output.exit_code,
            lines: output.captured_lines(),
        }),
        Err(e) => Err(StageFailure {
            tool,
            severity,
            exit_code: -1,
            lines: vec![format!("failed to launch {command}: {e}")],
        }),
    }
}

/// Log every captured line of a failed stage individually, prefixed with the
/// stage's tool tag for operator diagnosis.
pub fn log_stage_failure(failure: &StageFailure) {
    for line in &failure.lines {
        error!("ERROR({}): {}", failure.tool, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockProcessRunner, RunOutput};

    fn ok_output() -> RunOutput {
        RunOutput {
            exit_code: 0,
            stdout_lines: vec![],
            stderr_lines: vec![],
        }
    }

    #[test]
    fn xslt_stage_passes_stylesheet_source_output_in_order() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|command, args| {
                command == "saxon"
                    && args == ["sheet.xsl", "resource.xml", "out.fo"]
            })
            .times(1)
            .returning(|_, _| Ok(ok_output()));

        let result = run_xslt(
            &runner,
            &ToolCommands::default(),
            Path::new("sheet.xsl"),
            Path::new("resource.xml"),
            Path::new("out.fo"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn xslt_failure_is_fatal_and_carries_output() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_, _| {
            Ok(RunOutput {
                exit_code: 2,
                stdout_lines: vec!["Error at line 10".into()],
                stderr_lines: vec!["SXXP0003: parse failure".into()],
            })
        });

        let failure = run_xslt(
            &runner,
            &ToolCommands::default(),
            Path::new("sheet.xsl"),
            Path::new("resource.xml"),
            Path::new("out.fo"),
        )
        .unwrap_err();

        assert_eq!(failure.tool, XSLT_TOOL);
        assert_eq!(failure.severity, Severity::Fatal);
        assert_eq!(failure.exit_code, 2);
        assert_eq!(
            failure.lines,
            vec!["Error at line 10", "SXXP0003: parse failure"]
        );
    }

    #[test]
    fn fo_stage_leads_with_the_format_flag() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|command, args| {
                command == "fop" && args == ["-rtf", "in.fo", "downloads/42.rtf"]
            })
            .times(1)
            .returning(|_, _| Ok(ok_output()));

        let result = run_fo_render(
            &runner,
            &ToolCommands::default(),
            OutputFormat::Rtf,
            Path::new("in.fo"),
            Path::new("downloads/42.rtf"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn fo_failure_is_soft() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_, _| {
            Ok(RunOutput {
                exit_code: 1,
                stdout_lines: vec![],
                stderr_lines: vec!["[FATAL] Invalid FO input".into()],
            })
        });

        let failure = run_fo_render(
            &runner,
            &ToolCommands::default(),
            OutputFormat::Pdf,
            Path::new("in.fo"),
            Path::new("downloads/42.pdf"),
        )
        .unwrap_err();

        assert_eq!(failure.tool, FO_TOOL);
        assert_eq!(failure.severity, Severity::Soft);
    }

    #[test]
    fn launch_failure_keeps_the_stage_severity() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_, _| {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            ))
        });

        let failure = run_fo_render(
            &runner,
            &ToolCommands::default(),
            OutputFormat::Pdf,
            Path::new("in.fo"),
            Path::new("out.pdf"),
        )
        .unwrap_err();

        assert_eq!(failure.severity, Severity::Soft);
        assert!(failure.lines[0].contains("failed to launch fop"));
    }
}
