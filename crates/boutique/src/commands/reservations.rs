//! Reservation command handlers.

use std::sync::Arc;

use tabled::Tabled;

use boutique_core::{Controller, Reservation, ReservationFilter};

use crate::cli::{GlobalOpts, ReservationsArgs, ReservationsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ReservationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Date")]
    date: String,
}

fn detail(controller: &Controller, r: &Reservation) -> String {
    [
        format!("ID:        {}", r.id),
        format!("Product:   {}", util::product_label(controller, &r.product_id)),
        format!("Customer:  {}", r.customer_name),
        format!("Phone:     {}", r.customer_phone),
        format!("Status:    {}", r.status),
        format!("Date:      {}", r.reservation_date.format("%Y-%m-%d %H:%M")),
    ]
    .join("\n")
}

fn print_reservation(
    controller: &Controller,
    reservation: &Reservation,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        reservation,
        |r| detail(controller, r),
        |r| r.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: ReservationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ReservationsCommand::List { status, product } => {
            let mut filters = Vec::new();
            if let Some(status) = status {
                filters.push(ReservationFilter::ByStatus(util::reservation_status(status)));
            }
            if let Some(product) = product {
                let product = util::resolve_product(controller, &product)?;
                filters.push(ReservationFilter::ByProduct(product.id.clone()));
            }

            let mut reservations: Vec<Arc<Reservation>> = controller
                .reservations_snapshot()
                .iter()
                .filter(|r| filters.iter().all(|f| f.matches(r)))
                .cloned()
                .collect();
            reservations.sort_by(|a, b| b.reservation_date.cmp(&a.reservation_date));

            let out = output::render_list(
                &global.output,
                &reservations,
                |r| ReservationRow {
                    id: r.id.to_string(),
                    product: util::product_label(controller, &r.product_id),
                    customer: r.customer_name.clone(),
                    phone: r.customer_phone.clone(),
                    status: r.status.to_string(),
                    date: r.reservation_date.format("%Y-%m-%d %H:%M").to_string(),
                },
                |r| r.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReservationsCommand::Reserve {
            product,
            name,
            phone,
        } => {
            let product = util::resolve_product(controller, &product)?;
            let reservation = controller
                .reserve_product(product.id.clone(), name, phone)
                .await?;
            output::success(global, &format!("Product {} reserved", product.reference));
            print_reservation(controller, &reservation, global)
        }

        ReservationsCommand::Complete { reservation } => {
            let existing = util::resolve_reservation(controller, &reservation)?;
            let label = util::product_label(controller, &existing.product_id);
            let completed = controller.complete_reservation(existing.id.clone()).await?;
            output::success(global, &format!("Reservation completed, {label} sold"));
            print_reservation(controller, &completed, global)
        }

        ReservationsCommand::Cancel { reservation } => {
            let existing = util::resolve_reservation(controller, &reservation)?;
            let label = util::product_label(controller, &existing.product_id);
            let cancelled = controller.cancel_reservation(existing.id.clone()).await?;
            output::success(
                global,
                &format!("Reservation cancelled, {label} available again"),
            );
            print_reservation(controller, &cancelled, global)
        }
    }
}
