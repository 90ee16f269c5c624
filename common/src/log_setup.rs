use std::path::PathBuf;

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};

/// Where log records go besides the console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr only.
    #[default]
    Stderr,
    /// Log to rotating files in the given directory, duplicating warnings to stderr.
    Directory(PathBuf),
}

/// Initialize the global logger.
///
/// `base_level` is a flexi_logger level string such as `"info"` or `"avgcolor=debug"`;
/// `RUST_LOG` takes precedence when set. The returned handle must be kept alive
/// for as long as logging is needed.
pub fn setup_logging(
    base_level: &str,
    output: LogOutput,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(base_level)?;

    let logger = match output {
        LogOutput::Stderr => logger.log_to_stderr(),
        LogOutput::Directory(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .duplicate_to_stderr(Duplicate::Warn)
            .rotate(
                Criterion::Size(1024 * 1024), //1MB
                Naming::Timestamps,
                Cleanup::KeepLogFiles(5),
            ),
    };

    logger.start()
}
