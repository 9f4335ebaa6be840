//! WhatsApp reservation link.

use boutique_core::Controller;
use boutique_core::link::reservation_link;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(
    controller: &Controller,
    product: &str,
    name: &str,
    phone: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let product = util::resolve_product(controller, product)?;
    if !product.is_available() {
        output::warn(
            global,
            &format!("{} is {} and cannot be reserved", product.reference, product.status),
        );
    }
    let url = reservation_link(&controller.settings(), &product, name, phone)?;
    output::print_output(url.as_str(), global.quiet);
    Ok(())
}
