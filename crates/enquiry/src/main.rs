/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Enquiry CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

const DEFAULT_LOG_DIRECTIVE: &str = "enquiry=info,enquiry_core=info,enquiry_data=info";

#[derive(Parser)]
#[command(name = "enquiry")]
#[command(version)]
#[command(about = "Fill enquiry report templates from query results", long_about = None)]
struct Cli {
    /// Service configuration file (defaults to $ENQUIRY_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `enquiry_template=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report for an enquiry
    Render {
        /// Enquiry id
        enquiry_id: u32,

        /// Output format (xlsx, docx, pdf)
        #[arg(short = 't', long)]
        to: String,

        /// JSON or YAML file with user_id, filter_params and fields
        #[arg(long)]
        request: Option<PathBuf>,

        /// Form field value (KEY=VALUE)
        #[arg(short = 'F', long = "field")]
        fields: Vec<String>,

        /// Column filter (COLUMN=VALUE), repeatable per column
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Id of the requesting user
        #[arg(long)]
        user: Option<u32>,

        /// Copy the report to PATH
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Show the output formats and input fields of an enquiry
    Info {
        /// Enquiry id
        enquiry_id: u32,
    },

    /// Hide a remembered form field value
    DeleteFieldValue {
        /// Enquiry id
        enquiry_id: u32,

        /// Id of the value, as listed by `info`
        value_id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_LOG_DIRECTIVE.into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Render {
            enquiry_id,
            to,
            request,
            fields,
            filters,
            user,
            output,
        } => {
            commands::render::execute(
                config,
                commands::render::RenderArgs {
                    enquiry_id,
                    to,
                    request,
                    fields,
                    filters,
                    user,
                    output,
                },
            )
            .await
        }
        Commands::Info { enquiry_id } => commands::info::execute(config, enquiry_id).await,
        Commands::DeleteFieldValue {
            enquiry_id,
            value_id,
        } => commands::delete_value::execute(config, enquiry_id, value_id).await,
    }
}
