//! Dashboard counts.

use boutique_core::{Controller, Dashboard};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(d: &Dashboard) -> String {
    [
        format!("Products:       {}", d.products),
        format!("  available:    {}", d.available),
        format!("  reserved:     {}", d.reserved),
        format!("  sold:         {}", d.sold),
        format!("Categories:     {}", d.categories),
        format!("Reservations:   {} pending", d.pending_reservations),
        format!("                {} completed", d.completed_reservations),
        format!("                {} cancelled", d.cancelled_reservations),
        format!("Catalog value:  C$ {:.2}", d.catalog_value),
    ]
    .join("\n")
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = controller.dashboard();
    let out = output::render_single(&global.output, &dashboard, detail, |d| {
        d.products.to_string()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
