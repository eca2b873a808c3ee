use clap::{Parser, Subcommand};

use crate::{auth::supabase::SupabaseAuthClient, form::Mode, utils::credentials_path};

mod auth;
mod commands;
mod config;
mod errors;
mod form;
mod models;
mod ui;
mod utils;

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive login/signup form (default)
    Form {
        /// Open the form in signup mode
        #[clap(long)]
        signup: bool,
    },
    Login,
    Signup,
    Logout,
    Whoami,
}

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = "Sign in to Tarot Trader from the command line")]
struct TarotArgs {
    #[clap(subcommand)]
    command: Option<Commands>,
}

/// Wrapper function for looping a prompt function
/// if error occurs
fn super_prompt(title: &str, function: &dyn Fn() -> anyhow::Result<()>) {
    loop {
        println!("\n{}\n", title);
        let res = function();

        match res {
            Ok(_) => break,
            Err(e) => {
                eprintln!("Error: {}", e);

                let response = inquire::Confirm::new("Try again")
                    .with_default(true)
                    .prompt();

                if let Ok(true) = response {
                    continue;
                }

                break;
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = TarotArgs::parse();

    let client = SupabaseAuthClient::from_config()?;
    let store = credentials_path()?;

    log::debug!("auth server {}, credentials at {}", client.base_url(), store.display());

    match args.command.unwrap_or(Commands::Form { signup: false }) {
        Commands::Form { signup } => {
            let mode = if signup { Mode::Signup } else { Mode::Login };

            ui::form_renderer::run_form(&client, mode, &store)?;
        }
        Commands::Login => {
            super_prompt("Login", &|| commands::prompt_auth(Mode::Login, &client, &store));
        }
        Commands::Signup => {
            super_prompt("Signup", &|| commands::prompt_auth(Mode::Signup, &client, &store));
        }
        Commands::Logout => println!("{}", commands::logout(&client, &store)?),
        Commands::Whoami => println!("{}", commands::whoami(&client, &store)?),
    }

    Ok(())
}
