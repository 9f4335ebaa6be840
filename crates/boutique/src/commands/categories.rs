//! Category command handlers.

use std::sync::Arc;

use tabled::Tabled;

use boutique_core::{AddCategoryRequest, Category, Controller, UpdateCategoryRequest};

use crate::cli::{CategoriesArgs, CategoriesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Products")]
    products: usize,
    #[tabled(rename = "ID")]
    id: String,
}

fn detail(c: &Category) -> String {
    [
        format!("ID:    {}", c.id),
        format!("Name:  {}", c.name),
        format!("Code:  {}", c.code),
    ]
    .join("\n")
}

fn print_category(category: &Category, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, category, detail, |c| c.code.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: CategoriesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CategoriesCommand::List => {
            let products = controller.products_snapshot();
            let mut categories: Vec<Arc<Category>> =
                controller.categories_snapshot().iter().cloned().collect();
            categories.sort_by(|a, b| a.name.cmp(&b.name));

            let out = output::render_list(
                &global.output,
                &categories,
                |c| CategoryRow {
                    code: c.code.clone(),
                    name: c.name.clone(),
                    products: products.iter().filter(|p| p.category_id == c.id).count(),
                    id: c.id.to_string(),
                },
                |c| c.code.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CategoriesCommand::Add { name, code } => {
            let category = controller
                .add_category(AddCategoryRequest { name, code })
                .await?;
            output::success(global, &format!("Category {} added", category.code));
            print_category(&category, global)
        }

        CategoriesCommand::Update {
            category,
            name,
            code,
        } => {
            let existing = util::resolve_category(controller, &category)?;
            let updated = controller
                .update_category(existing.id.clone(), UpdateCategoryRequest { name, code })
                .await?;
            output::success(global, &format!("Category {} updated", updated.code));
            print_category(&updated, global)
        }

        CategoriesCommand::Delete { category } => {
            let existing = util::resolve_category(controller, &category)?;
            if !util::confirm(
                &format!("Delete category {} ({})?", existing.name, existing.code),
                global.yes,
            )? {
                return Ok(());
            }
            controller.delete_category(existing.id.clone()).await?;
            output::success(global, &format!("Category {} deleted", existing.code));
            Ok(())
        }
    }
}
