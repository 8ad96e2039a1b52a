use newzotero_core::config::normalize_server_url;
use newzotero_core::session::{Session, SessionStore};
use newzotero_core::user_check::{UserCheckStatus, UserCheckTracker};

use crate::commands::common::Context;
use crate::config_profiles::{default_config_path, CliProfilesConfig};
use crate::error::CliError;

pub async fn run_login(
    username: &str,
    server_url: Option<&str>,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    if let Some(server_url) = server_url {
        store_server_url(server_url, global_profile)?;
    }

    let context = Context::load(global_profile)?;
    let session = Session::login(username)?;
    let backend = context.backend()?;

    let mut tracker = UserCheckTracker::new();
    if let Some(ticket) = tracker.begin(session.username()) {
        let result = backend.check_user_exists(ticket.username()).await;
        tracker.resolve(&ticket, &result);
    }
    if tracker.status() != UserCheckStatus::Blank {
        println!("{}", tracker.status().message());
    }

    context.sessions.save_session(&session)?;
    println!(
        "Logged in profile '{}' as {}",
        context.profile,
        session.username()
    );
    Ok(())
}

pub fn run_logout(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = Context::load(global_profile)?;
    context.sessions.clear_session()?;
    println!("Logged out profile '{}'", context.profile);
    Ok(())
}

pub fn run_whoami(global_profile: Option<&str>) -> Result<(), CliError> {
    let context = Context::load(global_profile)?;
    match context.sessions.load_session()? {
        Some(session) => println!(
            "{} (profile '{}', {})",
            session.username(),
            context.profile,
            context.client_config.server_url
        ),
        None => println!("Profile '{}' is not logged in.", context.profile),
    }
    Ok(())
}

fn store_server_url(server_url: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let server_url = normalize_server_url(Some(server_url))?;
    let path = default_config_path().map_err(CliError::Config)?;
    let mut config = CliProfilesConfig::load_from_path(&path).map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    config.profile_mut_or_default(&profile_name).server_url = Some(server_url);
    config.save_to_path(&path).map_err(CliError::Config)
}
