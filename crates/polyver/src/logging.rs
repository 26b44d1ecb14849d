use std::fs::OpenOptions;
use std::path::Path;

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use polyver_core::AppPaths;

const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Terminal logging to stderr at a verbosity-controlled level, combined
/// with an always-on debug log file when the data directory is usable.
pub fn init(verbosity: u8) {
    let term_level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("polyver")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Ok(paths) = AppPaths::new()
        && paths.ensure_dirs().is_ok()
    {
        let log_path = paths.log_file();
        trim_log_file_if_oversized(&log_path, MAX_LOG_SIZE);
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            loggers.push(WriteLogger::new(LevelFilter::Debug, config, file));
        }
    }

    let _ = CombinedLogger::init(loggers);
}

/// Keep the log file bounded by dropping its older half, cutting at a line
/// boundary so the survivor starts with a complete record.
fn trim_log_file_if_oversized(log_path: &Path, max_log_size: u64) {
    if let Ok(metadata) = std::fs::metadata(log_path)
        && metadata.len() > max_log_size
        && let Ok(contents) = std::fs::read(log_path)
    {
        let half = contents.len() / 2;
        let keep_from = contents[half..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(half, |pos| half + pos + 1);
        let _ = std::fs::write(log_path, &contents[keep_from..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_log_keeps_its_recent_half_on_a_line_boundary() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp.path().join("debug.log");

        let mut contents = String::new();
        for i in 0..200 {
            contents.push_str(&format!("line {i}\n"));
        }
        std::fs::write(&log_path, &contents).unwrap();

        trim_log_file_if_oversized(&log_path, 64);

        let trimmed = std::fs::read_to_string(&log_path).unwrap();
        assert!(trimmed.len() < contents.len());
        assert!(trimmed.starts_with("line "));
        assert!(trimmed.ends_with("line 199\n"));
    }

    #[test]
    fn small_log_is_left_untouched() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let log_path = temp.path().join("debug.log");
        std::fs::write(&log_path, "line 0\n").unwrap();

        trim_log_file_if_oversized(&log_path, MAX_LOG_SIZE);

        assert_eq!(std::fs::read_to_string(&log_path).unwrap(), "line 0\n");
    }
}
