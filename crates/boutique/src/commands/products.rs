//! Product command handlers.

use std::sync::Arc;

use tabled::Tabled;

use boutique_core::{
    AddProductRequest, Controller, Product, ProductFilter, Settings, UpdateProductRequest,
};

use crate::cli::{GlobalOpts, ProductsArgs, ProductsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "USD")]
    usd: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Images")]
    images: usize,
}

fn row(controller: &Controller, settings: &Settings, p: &Arc<Product>) -> ProductRow {
    ProductRow {
        reference: p.reference.clone(),
        name: p.name.clone(),
        price: format!("C$ {:.2}", p.price),
        usd: format!("$ {:.2}", settings.convert_price(p.price)),
        category: controller
            .category_by_id(&p.category_id)
            .map_or_else(|| "-".into(), |c| c.code.clone()),
        status: p.status.to_string(),
        images: p.images.len(),
    }
}

fn detail(controller: &Controller, settings: &Settings, p: &Product) -> String {
    let category = controller
        .category_by_id(&p.category_id)
        .map_or_else(|| p.category_id.to_string(), |c| format!("{} ({})", c.name, c.code));
    let mut lines = vec![
        format!("ID:          {}", p.id),
        format!("Reference:   {}", p.reference),
        format!("Name:        {}", p.name),
        format!(
            "Price:       C$ {:.2} ($ {:.2})",
            p.price,
            settings.convert_price(p.price)
        ),
        format!("Category:    {category}"),
        format!("Status:      {}", p.status),
        format!("Created:     {}", p.created_at.format("%Y-%m-%d %H:%M")),
    ];
    if !p.description.is_empty() {
        lines.push(format!("Description: {}", p.description));
    }
    for (n, image) in p.images.iter().enumerate() {
        lines.push(format!("Image {}:     {image}", n + 1));
    }
    if let Some(r) = controller.reservation_by_product_id(&p.id) {
        lines.push(format!(
            "Reserved by: {} ({}) since {}",
            r.customer_name,
            r.customer_phone,
            r.reservation_date.format("%Y-%m-%d")
        ));
    }
    lines.join("\n")
}

fn print_product(
    controller: &Controller,
    product: &Product,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let settings = controller.settings();
    let out = output::render_single(
        &global.output,
        product,
        |p| detail(controller, &settings, p),
        |p| p.reference.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ProductsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProductsCommand::List {
            category,
            status,
            search,
        } => {
            let mut filters = Vec::new();
            if let Some(category) = category {
                let category = util::resolve_category(controller, &category)?;
                filters.push(ProductFilter::ByCategory(category.id.clone()));
            }
            if let Some(status) = status {
                filters.push(ProductFilter::ByStatus(util::product_status(status)));
            }
            if let Some(term) = search {
                filters.push(ProductFilter::Search(term));
            }

            let mut products: Vec<Arc<Product>> = controller
                .products_snapshot()
                .iter()
                .filter(|p| filters.iter().all(|f| f.matches(p)))
                .cloned()
                .collect();
            products.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let settings = controller.settings();
            let out = output::render_list(
                &global.output,
                &products,
                |p| row(controller, &settings, p),
                |p| p.reference.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Get { product } => {
            let product = util::resolve_product(controller, &product)?;
            print_product(controller, &product, global)
        }

        ProductsCommand::Add {
            name,
            price,
            category,
            description,
            images,
        } => {
            let category = util::resolve_category(controller, &category)?;
            let product = controller
                .add_product(AddProductRequest {
                    name,
                    price,
                    description,
                    images,
                    category_id: category.id.clone(),
                })
                .await?;
            output::success(global, &format!("Product {} added", product.reference));
            print_product(controller, &product, global)
        }

        ProductsCommand::Update {
            product,
            name,
            price,
            description,
            images,
            category,
            status,
        } => {
            let existing = util::resolve_product(controller, &product)?;
            let category_id = match category {
                Some(c) => Some(util::resolve_category(controller, &c)?.id.clone()),
                None => None,
            };
            let update = UpdateProductRequest {
                name,
                price,
                description,
                images: (!images.is_empty()).then_some(images),
                category_id,
                status: status.map(util::product_status),
            };
            let updated = controller.update_product(existing.id.clone(), update).await?;
            output::success(global, &format!("Product {} updated", updated.reference));
            print_product(controller, &updated, global)
        }

        ProductsCommand::Delete { product } => {
            let existing = util::resolve_product(controller, &product)?;
            if !util::confirm(
                &format!("Delete product {} ({})?", existing.reference, existing.name),
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_product(existing.id.clone()).await?;
            output::success(global, &format!("Product {} deleted", existing.reference));
            Ok(())
        }
    }
}
