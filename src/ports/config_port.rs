//! Configuration access port.

use crate::domain::error::ZoneTraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
    fn has_section(&self, section: &str) -> bool;

    fn require_string(&self, section: &str, key: &str) -> Result<String, ZoneTraderError> {
        self.get_string(section, key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ZoneTraderError::missing(section, key))
    }

    /// Integer setting that must not be negative. Missing keys take `default`.
    fn get_count(&self, section: &str, key: &str, default: usize) -> Result<usize, ZoneTraderError> {
        let raw = self.get_int(section, key, default as i64);
        usize::try_from(raw)
            .map_err(|_| ZoneTraderError::invalid(section, key, format!("must not be negative, got {raw}")))
    }
}
