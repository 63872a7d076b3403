//! Logging setup

/// Initialize the logging system with a default filter, still overridable through `RUST_LOG`
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_with_filter(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_with_filter("debug");
        init_with_filter("info");
        log::info!("logger still usable");
    }
}
