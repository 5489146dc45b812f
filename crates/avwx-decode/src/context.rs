use chrono::{DateTime, Utc};

/// Processing clock and decoder options shared by every decoder.
///
/// `now` is only consulted for timestamps the bulletin cannot supply: the
/// month and year of day-of-month groups, and the fallback for anything
/// unparseable.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    pub now: DateTime<Utc>,
    /// Prefix for three-letter upper-wind station codes (e.g. "C": YVR -> CYVR)
    pub short_code_prefix: Option<String>,
}

impl DecodeContext {
    /// Context on the wall clock
    pub fn current() -> Self {
        Self::at(Utc::now())
    }

    /// Context with a fixed processing time
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            short_code_prefix: None,
        }
    }

    pub fn with_short_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.short_code_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::current()
    }
}
