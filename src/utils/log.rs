use colog::format::CologStyle;
use env_logger::Builder;
use log::{Level, LevelFilter};

struct CustomLevelTokens;

impl CologStyle for CustomLevelTokens {
    fn level_token(&self, level: &Level) -> &str {
        match *level {
            Level::Error => "ERR",
            Level::Warn => "WRN",
            Level::Info => "INF",
            Level::Debug => "DBG",
            Level::Trace => "TRC",
        }
    }
}

pub struct Logger;

impl Logger {
    /// Logs go to stderr, stdout belongs to relay responses.
    pub fn init(level: Option<LevelFilter>) {
        Builder::new()
            .filter(Some("chat_relay"), level.unwrap_or(LevelFilter::Info))
            .filter(Some("reqwest"), LevelFilter::Warn)
            .filter(Some("hyper_util"), LevelFilter::Warn)
            .target(env_logger::Target::Stderr)
            .format(colog::formatter(CustomLevelTokens))
            .write_style(env_logger::WriteStyle::Auto)
            .init();
    }

    /// Parses a configured level name such as `"debug"`, warning about names that don't parse.
    pub fn level(name: Option<&str>) -> Option<LevelFilter> {
        let name = name?;
        match name.parse() {
            Ok(level) => Some(level),
            Err(_) => {
                eprintln!("unknown log level \"{name}\", falling back to info");
                None
            }
        }
    }
}
