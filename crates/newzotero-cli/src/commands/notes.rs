use newzotero_core::controller::OptimisticController;
use newzotero_core::remote::HttpRemoteStore;
use serde::Serialize;

use crate::cli::NotesCommands;
use crate::commands::common::{
    finish_mutation, format_note_lines, normalize_content, note_to_list_item, resolve_file_id,
    resolve_note_id, Context, NoteListItem,
};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct NotesListing {
    file: Option<String>,
    excerpts: Vec<NoteListItem>,
    free: Vec<NoteListItem>,
}

pub async fn run_notes(
    command: NotesCommands,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let context = Context::load(global_profile)?;
    match command {
        NotesCommands::List { file, json } => {
            let mut library = context.open_library().await?;
            if let Some(file) = file {
                select(&mut library, &file).await?;
            }
            print_notes(&library, json)
        }
        NotesCommands::Add {
            file,
            page,
            content,
        } => {
            let content = normalize_content(&content)?;
            let mut library = context.open_library().await?;
            match file {
                Some(file) => select(&mut library, &file).await?,
                None if library.state().files.is_empty() => return Err(CliError::NoFiles),
                None => {}
            }
            if let Some(page) = page {
                let draft = library.state().excerpt_draft.clone();
                library.set_excerpt_citation(&draft.title, &draft.author, &draft.date, &page);
            }
            library.set_excerpt_content(content);
            finish_mutation(library.add_excerpt().await?)
        }
        NotesCommands::Free { content } => {
            let content = normalize_content(&content)?;
            let mut library = context.open_library().await?;
            library.set_free_draft(content);
            finish_mutation(library.add_free_note().await?)
        }
        NotesCommands::Delete { id } => {
            let mut library = context.open_library().await?;
            if !holds_note(&library, &id) {
                // Excerpts of other files are only visible once their file is selected.
                load_all_excerpts(&mut library, &id).await?;
            }
            let note_id = resolve_note_id(&library.state().notes, &id)?;
            finish_mutation(library.delete_note(note_id).await?)
        }
    }
}

async fn select(
    library: &mut OptimisticController<HttpRemoteStore>,
    file: &str,
) -> Result<(), CliError> {
    let file_id = resolve_file_id(&library.state().files, file)?;
    library.select(&file_id).await?;
    Ok(())
}

/// Select each file in turn until one holds the note `id`.
async fn load_all_excerpts(
    library: &mut OptimisticController<HttpRemoteStore>,
    id: &str,
) -> Result<(), CliError> {
    let file_ids = library
        .state()
        .files
        .iter()
        .map(|file| file.id.clone())
        .collect::<Vec<_>>();
    for file_id in file_ids {
        library.select(&file_id).await?;
        if holds_note(library, id) {
            break;
        }
    }
    Ok(())
}

fn holds_note(library: &OptimisticController<HttpRemoteStore>, id: &str) -> bool {
    let id = id.trim();
    library.state().notes.iter().any(|note| note.id.matches_str(id))
}

fn print_notes(
    library: &OptimisticController<HttpRemoteStore>,
    as_json: bool,
) -> Result<(), CliError> {
    let state = library.state();
    let selected = state.selected();

    if as_json {
        let listing = NotesListing {
            file: selected.map(|file| file.id.to_string()),
            excerpts: state.excerpts().map(note_to_list_item).collect(),
            free: state.free_notes().map(note_to_list_item).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if let Some(file) = selected {
        println!("Excerpts of {} ({})", file.title, file.id);
        for line in format_note_lines(state.excerpts()) {
            println!("  {line}");
        }
    }
    println!("Free notes");
    for line in format_note_lines(state.free_notes()) {
        println!("  {line}");
    }
    Ok(())
}
