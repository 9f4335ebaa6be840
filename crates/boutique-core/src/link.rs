// ── WhatsApp deep links ──
//
// Pure formatting: nothing here touches the store.

use url::Url;

use crate::error::CoreError;
use crate::model::{Product, Settings};

const WHATSAPP_BASE: &str = "https://wa.me/";

/// The pre-filled reservation message a customer sends to the store.
pub fn reservation_message(
    settings: &Settings,
    product: &Product,
    customer_name: &str,
    customer_phone: &str,
) -> String {
    let usd = settings.convert_price(product.price);
    format!(
        "Hello! I'm interested in reserving this product:\n\n\
         Reference: {reference}\n\
         Name: {name}\n\
         Price: C$ {price} ($ {usd:.2})\n\n\
         My name: {customer_name}\n\
         My phone: {customer_phone}\n\n\
         Please confirm this reservation. Thank you!",
        reference = product.reference,
        name = product.name,
        price = product.price,
    )
}

/// `https://wa.me/{number}` with the leading `+` stripped, and the
/// message (if any) in the `text` query parameter.
pub fn whatsapp_link(number: &str, message: Option<&str>) -> Result<Url, CoreError> {
    let digits: String = number.chars().filter(|c| *c != '+' && !c.is_whitespace()).collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation(format!(
            "invalid WhatsApp number: {number:?}"
        )));
    }

    let mut url = Url::parse(WHATSAPP_BASE)
        .and_then(|base| base.join(&digits))
        .map_err(|e| CoreError::Internal(format!("whatsapp url: {e}")))?;
    if let Some(text) = message {
        url.query_pairs_mut().append_pair("text", text);
    }
    Ok(url)
}

/// Link that opens a chat with the store, pre-filled with a reservation
/// request for `product`.
pub fn reservation_link(
    settings: &Settings,
    product: &Product,
    customer_name: &str,
    customer_phone: &str,
) -> Result<Url, CoreError> {
    let message = reservation_message(settings, product, customer_name, customer_phone);
    whatsapp_link(&settings.whatsapp_number, Some(&message))
}
