//! Sentinel — operator CLI for the Safe secret store.
//!
//! A standalone HTTP client that talks to Safe exclusively via the REST
//! API. In production the connection goes through the mTLS terminator,
//! which overrides the peer identity header with the verified SVID; the
//! `--peer-id` flag only matters against a bare dev listener.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod safe;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use safe::SafeClient;

/// Sentinel — operator console for the Silo secret store.
#[derive(Parser)]
#[command(
    name = "silo-sentinel",
    version,
    about = "Sentinel CLI — manage secrets in the Silo Safe store",
    long_about = None,
    after_help = "Environment variables:\n  \
        SILO_SAFE_URL   Safe server address (default: http://127.0.0.1:8443)\n  \
        SILO_PEER_ID    Peer identity sent to a dev listener\n\n\
        Examples:\n  \
        silo-sentinel status\n  \
        silo-sentinel set billing -v '{\"user\":\"app\",\"pass\":\"s3cr3t\"}' -f json\n  \
        silo-sentinel get --reveal\n  \
        silo-sentinel delete billing",
)]
struct Cli {
    /// Safe server address.
    #[arg(long, env = "SILO_SAFE_URL", default_value = "http://127.0.0.1:8443")]
    addr: String,

    /// Peer identity for a dev listener without an mTLS terminator.
    #[arg(long, env = "SILO_PEER_ID")]
    peer_id: Option<String>,

    /// Request timeout in seconds; when it fires, the operation failed.
    #[arg(long, default_value = "10")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show Safe reachability and keystone bootstrap status.
    Status,
    /// List stored secrets.
    Get {
        /// Include raw (untransformed) secret values in the listing.
        #[arg(long, default_value = "false")]
        reveal: bool,
    },
    /// Create or overwrite a secret for one or more workloads.
    Set {
        /// Workload ids to store the secret under.
        #[arg(required = true)]
        workload_ids: Vec<String>,
        /// The secret value.
        #[arg(short, long)]
        value: String,
        /// Template applied to the value before the format stage.
        #[arg(short, long, default_value = "")]
        template: String,
        /// Output format: json, yaml, or raw.
        #[arg(short, long, default_value = "json")]
        format: String,
        /// RFC 3339 instant before which the secret is not served.
        #[arg(long)]
        not_before: Option<String>,
        /// RFC 3339 instant after which the secret expires.
        #[arg(long)]
        expires_after: Option<String>,
    },
    /// Delete secrets by workload id.
    Delete {
        /// Workload ids whose secrets should be removed.
        #[arg(required = true)]
        workload_ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = match SafeClient::new(cli.addr, cli.peer_id, cli.timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &SafeClient, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Status => cmd_status(client).await,
        Commands::Get { reveal } => cmd_get(client, reveal).await,
        Commands::Set {
            workload_ids,
            value,
            template,
            format,
            not_before,
            expires_after,
        } => {
            cmd_set(
                client,
                &workload_ids,
                &value,
                &template,
                &format,
                not_before.as_deref(),
                expires_after.as_deref(),
            )
            .await
        }
        Commands::Delete { workload_ids } => cmd_delete(client, &workload_ids).await,
    }
}

async fn cmd_status(client: &SafeClient) -> Result<()> {
    client.check().await?;
    println!("safe: reachable");

    let resp = client.get("/v1/sentinel/keystone").await?;
    let status = resp
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("unknown");
    println!("keystone: {status}");
    Ok(())
}

async fn cmd_get(client: &SafeClient, reveal: bool) -> Result<()> {
    let path = if reveal {
        "/v1/sentinel/secrets?reveal=true"
    } else {
        "/v1/sentinel/secrets"
    };
    let resp = client.get(path).await?;

    let secrets = resp
        .get("secrets")
        .and_then(|s| s.as_array())
        .cloned()
        .unwrap_or_default();
    if secrets.is_empty() {
        println!("no secrets stored");
        return Ok(());
    }

    for secret in &secrets {
        let name = secret.get("name").and_then(|v| v.as_str()).unwrap_or("?");
        let updated = secret
            .get("updated")
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        println!("{name}  (updated {updated})");
        if let Some(value) = secret.get("value").and_then(|v| v.as_str()) {
            println!("  value: {value}");
        }
        if let Some(rendered) = secret.get("valueTransformed").and_then(|v| v.as_str()) {
            println!("  rendered: {rendered}");
        }
    }
    Ok(())
}

async fn cmd_set(
    client: &SafeClient,
    workload_ids: &[String],
    value: &str,
    template: &str,
    format: &str,
    not_before: Option<&str>,
    expires_after: Option<&str>,
) -> Result<()> {
    let mut body = serde_json::json!({
        "workloadIds": workload_ids,
        "value": value,
        "template": template,
        "format": format,
    });
    if let Some(nb) = not_before {
        body["notBefore"] = serde_json::Value::String(nb.to_owned());
    }
    if let Some(exp) = expires_after {
        body["expiresAfter"] = serde_json::Value::String(exp.to_owned());
    }

    client.put("/v1/sentinel/secrets", &body).await?;
    println!("stored secret for {} workload id(s)", workload_ids.len());
    Ok(())
}

async fn cmd_delete(client: &SafeClient, workload_ids: &[String]) -> Result<()> {
    let body = serde_json::json!({ "workloadIds": workload_ids });
    client.delete("/v1/sentinel/secrets", &body).await?;
    println!("deleted {} workload id(s)", workload_ids.len());
    Ok(())
}
