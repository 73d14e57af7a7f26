use std::io::{BufReader, BufWriter};

use morgen_tasks::config::{APP_NAME, Preferences};
use morgen_tasks::launcher::{Session, plugin};

struct FilteredJournal {
    inner: systemd_journal_logger::JournalLog,
}

impl log::Log for FilteredJournal {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if metadata.target().starts_with("morgen_tasks") {
            let max = if morgen_tasks::debug_logging() {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            metadata.level() <= max
        } else {
            metadata.level() <= log::LevelFilter::Warn
        }
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Log to the systemd user journal (`journalctl --user -t morgen-tasks -f`).
/// Without a journal the plugin runs silently.
fn init_logging() {
    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier(APP_NAME.to_string()),
        Err(e) => {
            eprintln!("{}: journal unavailable, logging disabled: {}", APP_NAME, e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn main() {
    init_logging();

    let config_path = Preferences::config_path();
    let prefs = Preferences::load(config_path.as_deref());
    log::info!(
        "Starting {} {} (keyword {:?})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        prefs.keyword()
    );

    let mut session = Session::new(prefs, config_path);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = plugin::run(&mut session, BufReader::new(stdin.lock()), BufWriter::new(stdout.lock())) {
        log::error!("Plugin loop ended: {}", e);
        std::process::exit(1);
    }
}
