use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::manifest::{load_manifests, PageKind, Revalidate};
use crate::regeneration::{parse_http_date, CachePolicy, Freshness};
use crate::render::{RenderError, RenderRequest, RenderedPage};
use crate::resolver::{Event, Request, Resolver, RouteResult};
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for the edge route resolver
#[derive(Parser, Debug)]
#[command(name = "brrtedge")]
#[command(about = "Edge route resolution and regeneration tooling", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one URL against the build manifests
    Resolve {
        /// Directory holding the build manifests [default: `BRRTE_MANIFEST_DIR`
        /// or `.serverless_nextjs`]
        #[arg(long)]
        manifests: Option<PathBuf>,

        /// Request URL, path plus optional query (`/blog/a?x=1`)
        url: String,

        /// Host header sent with the request
        #[arg(long)]
        host: Option<String>,

        /// Extra request header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Use the API flow instead of the page flow
        #[arg(long, default_value_t = false)]
        api: bool,
    },
    /// Dump the compiled page and API route tables
    Routes {
        /// Directory holding the build manifests [default: `BRRTE_MANIFEST_DIR`
        /// or `.serverless_nextjs`]
        #[arg(long)]
        manifests: Option<PathBuf>,
    },
    /// Print the cache-control value for a revalidation window
    CacheControl {
        /// Seconds between regenerations, or `false` for never
        #[arg(long)]
        revalidate: String,

        /// `Expires` of the stored object (HTTP date)
        #[arg(long)]
        expires: Option<String>,

        /// `s-maxage` for content that never regenerates [default:
        /// `BRRTE_LONG_TTL_SECS` or 31 days]
        #[arg(long)]
        long_ttl: Option<u64>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput {
    result: RouteResult,
    status: u16,
    headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

#[derive(Serialize)]
struct PageRouteOutput<'a> {
    route: &'a str,
    page: &'a PageKind,
}

#[derive(Serialize)]
struct ApiRouteOutput<'a> {
    route: &'a str,
    page: &'a str,
}

/// Answers `Render` results with the page name and request, so a dry run
/// shows what would be rendered.
fn echo_renderer(page: &str, request: &RenderRequest) -> Result<RenderedPage, RenderError> {
    let page_data = json!({ "page": page, "request": request });
    Ok(RenderedPage::new(
        format!("<!-- render {page} -->"),
        page_data,
    ))
}

/// Parse `--revalidate`: a number of seconds or `false`.
pub fn parse_revalidate(value: &str) -> Result<Revalidate> {
    match value.trim() {
        "false" | "never" => Ok(Revalidate::Never),
        secs => secs
            .parse()
            .map(Revalidate::After)
            .with_context(|| format!("--revalidate expects seconds or `false`, got {secs:?}")),
    }
}

fn load_resolver(manifests: &Path) -> Result<Resolver> {
    let manifests = load_manifests(manifests)?;
    Resolver::new(manifests).context("Failed to compile route patterns")
}

fn resolve(
    manifests: &Path,
    url: &str,
    host: Option<&str>,
    headers: &[String],
    api: bool,
) -> Result<Value> {
    let resolver = load_resolver(manifests)?;

    let mut request = Request::new(url);
    if let Some(host) = host {
        request = request.with_header("host", host);
    }
    for header in headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("header {header:?} is not `name: value`");
        };
        request = request.with_header(name.trim(), value.trim());
    }

    let mut event = Event::new(request);
    let result = if api {
        resolver.handle_api(&mut event)
    } else {
        resolver.handle_default(&mut event, &echo_renderer)
    };

    let response = &event.response;
    let output = ResolveOutput {
        result,
        status: response.status(),
        headers: response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: response
            .body()
            .map(|body| String::from_utf8_lossy(body).into_owned()),
    };
    Ok(serde_json::to_value(output)?)
}

fn routes(manifests: &Path) -> Result<Value> {
    let resolver = load_resolver(manifests)?;
    let mut pages: Vec<PageRouteOutput<'_>> = resolver
        .page_routes()
        .entries()
        .map(|(route, page)| PageRouteOutput { route, page })
        .collect();
    pages.sort_by(|a, b| a.route.cmp(b.route));
    let mut api: Vec<ApiRouteOutput<'_>> = resolver
        .api_routes()
        .entries()
        .map(|(route, page)| ApiRouteOutput {
            route,
            page: page.as_str(),
        })
        .collect();
    api.sort_by(|a, b| a.route.cmp(b.route));

    Ok(json!({
        "buildId": resolver.build_id(),
        "basePath": resolver.base_path(),
        "pages": pages,
        "api": api,
    }))
}

fn cache_control(revalidate: &str, expires: Option<&str>, policy: CachePolicy) -> Result<Value> {
    let revalidate = parse_revalidate(revalidate)?;
    let expires = match expires {
        Some(raw) => match parse_http_date(raw) {
            Some(at) => Some(at),
            None => bail!("--expires is not an HTTP date: {raw:?}"),
        },
        None => None,
    };
    let freshness = Freshness {
        expires,
        last_modified: None,
    };
    let value = policy
        .cache_control(Some(revalidate), &freshness, Utc::now())
        .map(|cc| cc.to_string());
    Ok(json!({ "revalidate": revalidate, "cacheControl": value }))
}

/// Run a parsed command with settings from the environment.
///
/// # Errors
///
/// See [`execute_with`].
pub fn execute<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    execute_with(cli, &RuntimeConfig::from_env(), out)
}

/// Run a parsed command, writing pretty JSON to `out`.
///
/// Flags win over `config`.
///
/// # Errors
///
/// Manifest loading, pattern compilation and argument errors.
pub fn execute_with<W: Write>(cli: &Cli, config: &RuntimeConfig, out: &mut W) -> Result<()> {
    let manifest_dir =
        |flag: &Option<PathBuf>| flag.clone().unwrap_or_else(|| config.manifest_dir.clone());
    let value = match &cli.command {
        Commands::Resolve {
            manifests,
            url,
            host,
            headers,
            api,
        } => resolve(&manifest_dir(manifests), url, host.as_deref(), headers, *api)?,
        Commands::Routes { manifests } => routes(&manifest_dir(manifests))?,
        Commands::CacheControl {
            revalidate,
            expires,
            long_ttl,
        } => {
            let policy = long_ttl.map_or_else(|| config.cache_policy(), CachePolicy::new);
            cache_control(revalidate, expires.as_deref(), policy)?
        }
    };
    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)?;
    Ok(())
}

/// Parse the process arguments and run the command against stdout.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    execute(&cli, &mut stdout.lock())
}
