use serde::{Deserialize, Serialize};

/// Store-wide settings (singleton).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub store_name: String,
    pub logo_url: String,
    pub slogan: String,
    /// International format, e.g. `+50587010851`.
    pub whatsapp_number: String,
    /// Local currency units per US dollar.
    pub exchange_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_name: "BOUTIQUEMG RESERVED".into(),
            logo_url: "/logo.png".into(),
            slogan: "Style That Lasts".into(),
            whatsapp_number: "+50587010851".into(),
            exchange_rate: 36.5,
        }
    }
}

impl Settings {
    /// Convert a local-currency price to US dollars, rounded to cents.
    pub fn convert_price(&self, local: f64) -> f64 {
        if self.exchange_rate <= 0.0 {
            return 0.0;
        }
        (local / self.exchange_rate * 100.0).round() / 100.0
    }
}

pub(crate) fn validate_exchange_rate(rate: f64) -> Result<(), String> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(format!("exchange rate must be greater than zero, got {rate}"));
    }
    Ok(())
}
