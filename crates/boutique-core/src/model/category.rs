use serde::{Deserialize, Serialize};

use super::EntityId;

/// A product category. `code` prefixes every product reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    pub code: String,
}

pub const CODE_MIN_LEN: usize = 2;
pub const CODE_MAX_LEN: usize = 4;

/// Trim and uppercase a category code, rejecting anything that is not
/// 2-4 ASCII letters or digits.
pub fn normalize_code(raw: &str) -> Result<String, String> {
    let code = raw.trim().to_ascii_uppercase();
    let len = code.chars().count();
    if !(CODE_MIN_LEN..=CODE_MAX_LEN).contains(&len) {
        return Err(format!(
            "category code must be {CODE_MIN_LEN}-{CODE_MAX_LEN} characters, got {len}"
        ));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("category code must be letters or digits: {code:?}"));
    }
    Ok(code)
}
