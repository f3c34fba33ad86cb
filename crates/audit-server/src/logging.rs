use std::io::Write;

/// Install the timestamped `env_logger` format. An explicit `filter` wins;
/// otherwise `RUST_LOG` applies, defaulting to `debug` or `info`.
pub fn init_logging(debug: bool, filter: Option<&str>) {
    logger_builder(debug, filter).init();
}

fn logger_builder(debug: bool, filter: Option<&str>) -> env_logger::Builder {
    let mut builder = match filter {
        Some(filter) => {
            let mut builder = env_logger::Builder::new();
            builder.parse_filters(filter);
            builder
        }
        None => {
            let default = if debug { "debug" } else { "info" };
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        }
    };

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn explicit_filter_overrides_debug_flag() {
        let logger = logger_builder(true, Some("warn")).build();
        assert_eq!(logger.filter(), LevelFilter::Warn);
    }

    #[test]
    fn module_directives_are_honoured() {
        let logger = logger_builder(false, Some("error,audit_pipeline=trace")).build();
        assert_eq!(logger.filter(), LevelFilter::Trace);
    }
}
