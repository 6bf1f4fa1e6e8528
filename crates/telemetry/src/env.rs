const SAMPLEWEB_LOG_FORMAT: &str = "SAMPLEWEB_LOG_FORMAT";

/// The output format of the fmt layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Reads the format from `SAMPLEWEB_LOG_FORMAT`, defaulting to text.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(SAMPLEWEB_LOG_FORMAT).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            Some("") | None => Self::Text,
            Some(v) => {
                static WARN_ONCE: std::sync::Once = std::sync::Once::new();
                WARN_ONCE.call_once(|| {
                    eprintln!("warning: '{v}' is not a valid log format, defaulting to text");
                });
                Self::Text
            }
        }
    }
}
