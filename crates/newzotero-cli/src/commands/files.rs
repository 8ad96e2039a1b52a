use std::path::PathBuf;

use newzotero_core::controller::UploadOutcome;
use newzotero_core::doi::CrossrefClient;
use newzotero_core::remote::FileUpload;
use newzotero_core::util::is_uploadable_document;

use crate::cli::FilesCommands;
use crate::commands::common::{
    content_type_for, download_target, file_to_list_item, finish_mutation, format_file_lines,
    resolve_file_id, Context, FileListItem,
};
use crate::error::CliError;

pub async fn run_files(
    command: FilesCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = Context::load(global_profile)?;
    match command {
        FilesCommands::List { json } => run_list(&context, json).await,
        FilesCommands::AddDoi { doi } => {
            let crossref = CrossrefClient::new(&context.client_config)?;
            let mut library = context.open_library().await?;
            finish_mutation(library.import_doi(&crossref, &doi).await?)
        }
        FilesCommands::AddManual {
            title,
            author,
            date,
            page,
            content,
        } => {
            let mut library = context.open_library().await?;
            library.set_excerpt_citation(&title, &author, &date, &page);
            library.set_excerpt_content(content.unwrap_or_default());
            finish_mutation(library.add_manual_file().await?)
        }
        FilesCommands::Upload { paths } => run_upload(&context, paths).await,
        FilesCommands::Delete { id } => {
            let mut library = context.open_library().await?;
            let file_id = resolve_file_id(&library.state().files, &id)?;
            finish_mutation(library.delete_file(file_id).await?)
        }
        FilesCommands::Download { id, output } => {
            let library = context.open_library().await?;
            let file_id = resolve_file_id(&library.state().files, &id)?;
            let download = library.download(&file_id).await?;
            let target = output
                .unwrap_or_else(|| download_target(download.file_name.as_deref(), &file_id));
            std::fs::write(&target, &download.bytes)?;
            println!("{}", target.display());
            Ok(())
        }
    }
}

async fn run_list(context: &Context, as_json: bool) -> Result<(), CliError> {
    let library = context.open_library().await?;
    let state = library.state();

    if as_json {
        let items = state
            .files
            .iter()
            .map(file_to_list_item)
            .collect::<Vec<FileListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if state.files.is_empty() {
        println!("No files yet.");
    } else {
        for line in format_file_lines(&state.files, state.selected_file.as_ref()) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Documents read from disk, plus per-path outcomes for the ones that
/// could not be read.
#[derive(Debug, Default)]
pub struct PreparedUploads {
    pub uploads: Vec<FileUpload>,
    pub failed: Vec<UploadOutcome>,
    pub skipped: Vec<String>,
}

/// Read each uploadable path; unsupported types are skipped unread and read
/// errors become failed outcomes.
pub fn prepare_uploads(paths: &[PathBuf]) -> PreparedUploads {
    let mut prepared = PreparedUploads::default();
    for path in paths {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            prepared.failed.push(UploadOutcome::Failed {
                file_name: path.display().to_string(),
                message: "invalid file path".to_string(),
            });
            continue;
        };
        if !is_uploadable_document(file_name) {
            prepared.skipped.push(file_name.to_string());
            continue;
        }
        match std::fs::read(path) {
            Ok(bytes) => prepared.uploads.push(FileUpload {
                file_name: file_name.to_string(),
                content_type: content_type_for(path).to_string(),
                bytes,
            }),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read document");
                prepared.failed.push(UploadOutcome::Failed {
                    file_name: file_name.to_string(),
                    message: err.to_string(),
                });
            }
        }
    }
    prepared
}

async fn run_upload(context: &Context, paths: Vec<PathBuf>) -> Result<(), CliError> {
    let prepared = prepare_uploads(&paths);
    for file_name in &prepared.skipped {
        eprintln!("skipped {file_name}: only .pdf, .docx and .doc documents can be uploaded");
    }

    let mut outcomes = prepared.failed;
    // An empty batch still goes through the controller so it reports the rejection.
    if !prepared.uploads.is_empty() || outcomes.is_empty() {
        let mut library = context.open_library().await?;
        outcomes.extend(library.upload_batch(prepared.uploads).await?);
    }

    for outcome in &outcomes {
        match outcome {
            UploadOutcome::Uploaded {
                file_id: Some(id), ..
            } => println!("uploaded {} as {id}", outcome.file_name()),
            UploadOutcome::Uploaded { .. } => println!("uploaded {}", outcome.file_name()),
            UploadOutcome::Failed { message, .. } => {
                eprintln!("failed {}: {message}", outcome.file_name());
            }
        }
    }
    let uploaded = outcomes.iter().filter(|outcome| outcome.is_uploaded()).count();
    println!("{uploaded} of {} uploaded", outcomes.len());
    if uploaded == 0 {
        return Err(CliError::NothingUploaded);
    }
    Ok(())
}
