use log::{error, info, LevelFilter};
use std::path::Path;

// For file-based logging with rotation
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Environment variable overriding the configured log level
pub const LOG_ENV: &str = "IMAGE_SAVER_LOG";

/// Initialize a rotating file logger with timestamp, log level, and module path
pub fn init_logger(log_dir: &Path, level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let log_file_path = log_dir.join("image-saver.log");
    let archived_logs_pattern = format!("{}/image-saver.{{}}.log", log_dir.display());

    // Rotate at 10MB, keep 5 archived log files
    let file_trigger = SizeTrigger::new(10 * 1024 * 1024);
    let file_roller = FixedWindowRoller::builder()
        .build(&archived_logs_pattern, 5)
        .map_err(|e| format!("Failed to create log roller: {}", e))?;

    let compound_policy = CompoundPolicy::new(Box::new(file_trigger), Box::new(file_roller));

    let rolling_file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] [{M}:{L}] - {m}{n}",
        )))
        .build(&log_file_path, Box::new(compound_policy))
        .map_err(|e| format!("Failed to create log appender: {}", e))?;

    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(level);

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(rolling_file)))
        .build(Root::builder().appender("file").build(level))
        .map_err(|e| format!("Failed to build log config: {}", e))?;

    log4rs::init_config(config).map_err(|e| format!("Failed to initialize log4rs: {}", e))?;

    info!("Logging to file: {}", log_file_path.display());
    Ok(())
}

/// Log a store I/O step that failed
pub fn log_store_io_error(path: &Path, operation: &str, error: &dyn std::error::Error) {
    error!(
        "Store {} failed on {}: {}",
        operation,
        path.display(),
        error
    );
}

/// Log a stored image whose contents could not be digested
pub fn log_digest_error(path: &Path, error: &dyn std::error::Error) {
    error!("Cannot digest stored image {}: {}", path.display(), error);
}

/// Log a change made to the store directory
pub fn log_store_change(operation: &str, path: &Path, details: Option<&str>) {
    match details {
        Some(details) => info!("STORE {} {} ({})", operation, path.display(), details),
        None => info!("STORE {} {}", operation, path.display()),
    }
}
