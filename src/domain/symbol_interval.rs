use {
    crate::utils::TimeUtils,
    serde::{Deserialize, Serialize},
};

/// A symbol sampled at a fixed native interval.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Hash, Eq, PartialEq)]
pub struct SymbolInterval {
    pub name: String,
    pub interval_ms: i64,
}

impl SymbolInterval {
    pub fn new(name: impl Into<String>, interval_ms: i64) -> Self {
        Self {
            name: name.into(),
            interval_ms,
        }
    }

    pub fn daily(name: impl Into<String>) -> Self {
        Self::new(name, TimeUtils::MS_IN_D)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval_label(&self) -> &'static str {
        TimeUtils::interval_to_string(self.interval_ms)
    }
}

impl std::fmt::Display for SymbolInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} @ {}ms (or {})",
            self.name,
            self.interval_ms,
            self.interval_label()
        )
    }
}
