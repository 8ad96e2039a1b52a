use crate::commands::common::{normalize_content, Context};
use crate::error::CliError;

pub async fn run_feedback(
    email: &str,
    message: &[String],
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CliError::EmptyContent);
    }
    let message = normalize_content(message)?;

    let context = Context::load(global_profile)?;
    let ack = context.backend()?.submit_feedback(email, &message).await?;
    if ack.success {
        println!("Thanks, your feedback was sent.");
        Ok(())
    } else {
        Err(CliError::RolledBack(
            ack.error
                .or(ack.message)
                .unwrap_or_else(|| "feedback was not accepted".to_string()),
        ))
    }
}
