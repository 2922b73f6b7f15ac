pub mod args;

pub use args::{CompressArgs, ExtendedCompressArgs, RenderArgs, ServeArgs};

/// Initialize `env_logger` from a `-v` count.
pub fn init_logging(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();
}

/// Whether a parse error was caused by a value that is not a number at all,
/// as opposed to a number outside the accepted range.
pub fn is_non_numeric_value(error: &clap::Error) -> bool {
    use clap::error::{ContextKind, ContextValue, ErrorKind};

    if !matches!(error.kind(), ErrorKind::ValueValidation | ErrorKind::InvalidValue) {
        return false;
    }
    match error.get(ContextKind::InvalidValue) {
        Some(ContextValue::String(value)) => value.trim().parse::<i64>().is_err(),
        _ => false,
    }
}
