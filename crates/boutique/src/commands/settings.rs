//! Store settings handlers.

use boutique_core::{Controller, Settings, UpdateSettingsRequest};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

fn detail(s: &Settings) -> String {
    [
        format!("Store name:     {}", s.store_name),
        format!("Slogan:         {}", s.slogan),
        format!("Logo:           {}", s.logo_url),
        format!("WhatsApp:       {}", s.whatsapp_number),
        format!("Exchange rate:  C$ {} per US$", s.exchange_rate),
    ]
    .join("\n")
}

fn print_settings(settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, settings, detail, |s| s.store_name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Show => print_settings(&controller.settings(), global),

        SettingsCommand::Set {
            store_name,
            logo_url,
            slogan,
            whatsapp,
            exchange_rate,
        } => {
            let update = UpdateSettingsRequest {
                store_name,
                logo_url,
                slogan,
                whatsapp_number: whatsapp,
                exchange_rate,
            };
            let saved = controller.update_settings(update).await?;
            output::success(global, "Settings saved");
            print_settings(&saved, global)
        }
    }
}
