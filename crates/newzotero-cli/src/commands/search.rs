use newzotero_core::models::ResultsLimit;
use newzotero_core::remote::RemoteStore;

use crate::commands::common::{format_search_lines, normalize_content, Context};
use crate::error::CliError;

pub async fn run_search(
    query: &[String],
    limit: ResultsLimit,
    as_json: bool,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let query = normalize_content(query)?;
    let context = Context::load(global_profile)?;
    let store = context.backend()?.scoped(context.session()?);
    let hits = store.search(&query, limit).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("No matching notes.");
    } else {
        for line in format_search_lines(&hits) {
            println!("{line}");
        }
    }

    Ok(())
}
