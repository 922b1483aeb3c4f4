// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, load config, build the client and
//   hand it to the query flow.
// - Decides the exit code; the library never exits the process.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use yelp_api_cli::{query_api, ApiClient, Config, QueryError, QuerySummary, SearchQuery};

const DEFAULT_TERM: &str = "dinner";
const DEFAULT_LOCATION: &str = "San Francisco, CA";

/// Search Yelp by term and location and print the detail record of every
/// business found.
#[derive(Parser, Debug)]
#[command(name = "yelp-api-cli", version)]
struct Cli {
    /// Search query term
    #[arg(short = 'q', long, default_value = DEFAULT_TERM)]
    term: String,

    /// Location to be queried
    #[arg(short = 'l', long, default_value = DEFAULT_LOCATION)]
    location: String,
}

fn run(cli: &Cli) -> Result<QuerySummary> {
    // Config path comes from YELP_API_CONFIG or the platform config dir.
    let config = Config::from_env().context("loading config")?;
    let api = ApiClient::new(&config).context("creating API client")?;
    let query = SearchQuery::new(
        cli.term.as_str(),
        cli.location.as_str(),
        config.endpoints.default_search_results.as_str(),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Ok(query_api(&api, &query, &mut out)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yelp_api_cli=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(summary) => {
            if !summary.failed.is_empty() {
                tracing::warn!(
                    failed = summary.failed.len(),
                    fetched = summary.fetched.len(),
                    "some business details could not be fetched"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => ExitCode::from(report(&e, &mut io::stdout().lock())),
    }
}

/// Print a top-level failure and pick the exit code: 1 when the search body
/// was not JSON (the body is echoed verbatim), 2 for everything else.
fn report(err: &anyhow::Error, out: &mut dyn Write) -> u8 {
    let written = match err.downcast_ref::<QueryError>() {
        Some(QueryError::Parse { body, .. }) => {
            writeln!(out, "Error: could not parse JSON response:")
                .and_then(|()| writeln!(out, "{body}"))
                .map(|()| 1)
        }
        _ => writeln!(out, "Failure!!! {err:#}").map(|()| 2),
    };
    written.unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;
    use yelp_api_cli::ConfigError;

    fn reported(err: anyhow::Error) -> (u8, String) {
        let mut out = Vec::new();
        let code = report(&err, &mut out);
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn unparseable_search_body_exits_1_and_echoes_it() {
        let body = "<html>Service Unavailable</html>".to_string();
        let source = serde_json::from_str::<serde_json::Value>(&body).unwrap_err();
        let err = anyhow::Error::from(QueryError::Parse { body, source });

        let (code, output) = reported(err);
        assert_eq!(code, 1);
        assert_eq!(
            output,
            "Error: could not parse JSON response:\n<html>Service Unavailable</html>\n"
        );
    }

    #[test]
    fn config_failure_is_prefixed_and_names_the_cause_once() {
        let err = anyhow::Error::from(ConfigError::Read {
            path: PathBuf::from("/nonexistent"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        })
        .context("loading config");

        let (code, output) = reported(err);
        assert_eq!(code, 2);
        assert_eq!(
            output,
            "Failure!!! loading config: failed to read config file /nonexistent: \
             No such file or directory\n"
        );
        assert_eq!(output.matches("No such file or directory").count(), 1);
    }

    #[test]
    fn search_http_failure_is_prefixed() {
        let err = anyhow::Error::from(QueryError::Http(yelp_api_cli::HttpError::Status {
            url: "https://api.yelp.com/v2/search".into(),
            status: 401,
            body: "unauthorized".into(),
        }));

        let (code, output) = reported(err);
        assert_ne!(code, 0);
        assert_eq!(
            output,
            "Failure!!! search request failed: \
             request to https://api.yelp.com/v2/search returned HTTP 401: unauthorized\n"
        );
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_demo_query() {
        let cli = Cli::try_parse_from(["yelp-api-cli"]).unwrap();
        assert_eq!(cli.term, "dinner");
        assert_eq!(cli.location, "San Francisco, CA");
    }

    #[test]
    fn short_and_long_flags() {
        let cli = Cli::try_parse_from(["yelp-api-cli", "-q", "tacos", "--location", "Austin, TX"])
            .unwrap();
        assert_eq!(cli.term, "tacos");
        assert_eq!(cli.location, "Austin, TX");
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["yelp-api-cli", "--limit", "3"]).is_err());
    }
}
