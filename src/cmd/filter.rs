//! The `filter` subcommand.

use clap::Parser;
use tokio::io::AsyncReadExt;

use crate::filtering::{CadenceFilter, EventFilter, FilterOutcome, filter_payload};

/// Arguments of `sensu-handlers filter`.
#[derive(Parser, Debug)]
pub struct FilterArgs {
    /// Gate the first notification on `page_after` instead of `alert_after`.
    #[arg(long)]
    paging: bool,
}

/// Applies the cadence filter selected by `args` to a raw event.
pub fn run(args: &FilterArgs, payload: &str) -> FilterOutcome {
    let filter = if args.paging { CadenceFilter::paging() } else { CadenceFilter::standard() };
    let outcome = filter_payload(&filter, payload);
    tracing::debug!(
        filter = filter.name(),
        allowed = outcome.is_allowed(),
        reason = %outcome.reason,
        "Filter evaluated."
    );
    outcome
}

/// Reads an event from stdin, prints the filter's reason and returns whether
/// the event may be handled.
pub async fn execute(args: FilterArgs) -> Result<bool, std::io::Error> {
    let mut payload = String::new();
    tokio::io::stdin().read_to_string(&mut payload).await?;

    let outcome = run(&args, &payload);
    println!("{}", outcome.reason);
    Ok(outcome.is_allowed())
}
