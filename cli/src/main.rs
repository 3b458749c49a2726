use clap::{Parser, Subcommand};
use reqwest::Method;
use serde_json::json;

mod util;

use util::{api_request, exit_error};

#[derive(Parser)]
#[command(
    name = "horizon",
    version,
    about = "Knowledge Horizon CLI — operate the chat-assistant configuration, report curation, and org registry"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "HORIZON_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Admin bearer token (omit when the API runs in open dev mode)
    #[arg(long, env = "HORIZON_ADMIN_TOKEN")]
    admin_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Chat-assistant configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Per-stream instruction overlays
    Stream {
        #[command(subcommand)]
        command: StreamCommands,
    },
    /// Report curation
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Organization registry
    Org {
        #[command(subcommand)]
        command: OrgCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Full configuration snapshot: every page, scope, and stream overlay
    Show,
    /// Resolved configuration for one page/tab/subtab scope
    Page {
        page: String,
        #[arg(long)]
        tab: Option<String>,
        #[arg(long)]
        subtab: Option<String>,
    },
    /// Save an override (whitespace-only value clears it)
    Set {
        page: String,
        /// Field key (e.g. "identity")
        field_key: String,
        /// Override text
        value: String,
        #[arg(long)]
        tab: Option<String>,
        #[arg(long)]
        subtab: Option<String>,
    },
    /// Clear an override so the default applies again
    Clear {
        page: String,
        field_key: String,
        #[arg(long)]
        tab: Option<String>,
        #[arg(long)]
        subtab: Option<String>,
    },
}

#[derive(Subcommand)]
enum StreamCommands {
    /// Show a stream's overlay and composed prompt
    Show {
        stream_id: String,
        /// Page whose identity the prompt is layered onto
        #[arg(long)]
        page: Option<String>,
    },
    /// Save a stream's instruction overlay
    Set {
        stream_id: String,
        instructions: String,
        #[arg(long)]
        page: Option<String>,
    },
    /// Clear a stream's instruction overlay
    Clear { stream_id: String },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Curation view: candidates, effective states, aggregate counts
    View { report_id: String },
    /// Load a candidate set from a pipeline output file (JSON)
    Load {
        report_id: String,
        /// Path to a JSON file matching the LoadCurationRequest schema
        file: String,
    },
    /// Pull an article into the report
    Include {
        report_id: String,
        item_id: String,
        /// Editorial category for the article
        #[arg(long)]
        category: Option<String>,
    },
    /// Drop an article from the report
    Exclude { report_id: String, item_id: String },
    /// Revert an article to the pipeline's original decision
    Reset { report_id: String, item_id: String },
}

#[derive(Subcommand)]
enum OrgCommands {
    /// List organizations
    List,
    /// Create an organization
    Create {
        name: String,
        #[arg(long)]
        slug: Option<String>,
    },
    /// Show one organization
    Show { org_id: String },
}

fn scope_query(tab: Option<String>, subtab: Option<String>) -> Vec<(String, String)> {
    let mut query = Vec::new();
    if let Some(t) = tab {
        query.push(("tab".to_string(), t));
    }
    if let Some(s) = subtab {
        query.push(("subtab".to_string(), s));
    }
    query
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let api_url = cli.api_url;
    let token = cli.admin_token.as_deref();

    let code = match cli.command {
        Commands::Health => api_request(&api_url, Method::GET, "/health", None, None, &[]).await,

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                api_request(&api_url, Method::GET, "/api/admin/chat-config", token, None, &[]).await
            }
            ConfigCommands::Page { page, tab, subtab } => {
                api_request(
                    &api_url,
                    Method::GET,
                    &format!("/api/admin/chat-config/pages/{page}"),
                    token,
                    None,
                    &scope_query(tab, subtab),
                )
                .await
            }
            ConfigCommands::Set {
                page,
                field_key,
                value,
                tab,
                subtab,
            } => {
                let body = json!({
                    "field_key": field_key,
                    "value": value,
                    "tab": tab,
                    "subtab": subtab,
                });
                api_request(
                    &api_url,
                    Method::PUT,
                    &format!("/api/admin/chat-config/pages/{page}"),
                    token,
                    Some(body),
                    &[],
                )
                .await
            }
            ConfigCommands::Clear {
                page,
                field_key,
                tab,
                subtab,
            } => {
                let mut query = scope_query(tab, subtab);
                query.push(("field_key".to_string(), field_key));
                api_request(
                    &api_url,
                    Method::DELETE,
                    &format!("/api/admin/chat-config/pages/{page}"),
                    token,
                    None,
                    &query,
                )
                .await
            }
        },

        Commands::Stream { command } => match command {
            StreamCommands::Show { stream_id, page } => {
                let query: Vec<_> = page.into_iter().map(|p| ("page".to_string(), p)).collect();
                api_request(
                    &api_url,
                    Method::GET,
                    &format!("/api/admin/chat-config/streams/{stream_id}"),
                    token,
                    None,
                    &query,
                )
                .await
            }
            StreamCommands::Set {
                stream_id,
                instructions,
                page,
            } => {
                let body = json!({ "instructions": instructions, "page": page });
                api_request(
                    &api_url,
                    Method::PUT,
                    &format!("/api/admin/chat-config/streams/{stream_id}"),
                    token,
                    Some(body),
                    &[],
                )
                .await
            }
            StreamCommands::Clear { stream_id } => {
                api_request(
                    &api_url,
                    Method::DELETE,
                    &format!("/api/admin/chat-config/streams/{stream_id}"),
                    token,
                    None,
                    &[],
                )
                .await
            }
        },

        Commands::Report { command } => match command {
            ReportCommands::View { report_id } => {
                api_request(
                    &api_url,
                    Method::GET,
                    &format!("/api/reports/{report_id}/curation"),
                    token,
                    None,
                    &[],
                )
                .await
            }
            ReportCommands::Load { report_id, file } => {
                let raw = std::fs::read_to_string(&file).unwrap_or_else(|e| {
                    exit_error(&format!("Could not read {file}: {e}"), None);
                });
                let body: serde_json::Value = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    exit_error(&format!("Invalid JSON in {file}: {e}"), None);
                });
                api_request(
                    &api_url,
                    Method::PUT,
                    &format!("/api/reports/{report_id}/curation"),
                    token,
                    Some(body),
                    &[],
                )
                .await
            }
            ReportCommands::Include {
                report_id,
                item_id,
                category,
            } => {
                api_request(
                    &api_url,
                    Method::POST,
                    &format!("/api/reports/{report_id}/items/{item_id}/include"),
                    token,
                    Some(json!({ "category": category })),
                    &[],
                )
                .await
            }
            ReportCommands::Exclude { report_id, item_id } => {
                api_request(
                    &api_url,
                    Method::POST,
                    &format!("/api/reports/{report_id}/items/{item_id}/exclude"),
                    token,
                    None,
                    &[],
                )
                .await
            }
            ReportCommands::Reset { report_id, item_id } => {
                api_request(
                    &api_url,
                    Method::POST,
                    &format!("/api/reports/{report_id}/items/{item_id}/reset"),
                    token,
                    None,
                    &[],
                )
                .await
            }
        },

        Commands::Org { command } => match command {
            OrgCommands::List => {
                api_request(&api_url, Method::GET, "/api/admin/orgs", token, None, &[]).await
            }
            OrgCommands::Create { name, slug } => {
                api_request(
                    &api_url,
                    Method::POST,
                    "/api/admin/orgs",
                    token,
                    Some(json!({ "name": name, "slug": slug })),
                    &[],
                )
                .await
            }
            OrgCommands::Show { org_id } => {
                api_request(
                    &api_url,
                    Method::GET,
                    &format!("/api/admin/orgs/{org_id}"),
                    token,
                    None,
                    &[],
                )
                .await
            }
        },
    };

    std::process::exit(code);
}
