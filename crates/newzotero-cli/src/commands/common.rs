use std::path::{Path, PathBuf};

use newzotero_core::config::{normalize_server_url, ClientConfig};
use newzotero_core::controller::{MutationReport, OptimisticController};
use newzotero_core::models::{path_safe_slug, SearchHit};
use newzotero_core::remote::{HttpBackend, HttpRemoteStore};
use newzotero_core::session::{Session, SessionStore};
use newzotero_core::{EntityId, LibraryFile, Note};
use serde::Serialize;

use crate::config_profiles::{default_config_path, CliProfilesConfig, ProfileSessionStore};
use crate::error::CliError;

/// Resolved profile, endpoints and session store for one invocation.
pub struct Context {
    pub profile: String,
    pub client_config: ClientConfig,
    pub sessions: ProfileSessionStore,
}

impl Context {
    pub fn load(profile: Option<&str>) -> Result<Self, CliError> {
        let path = default_config_path().map_err(CliError::Config)?;
        Self::load_from(path, profile)
    }

    pub fn load_from(path: PathBuf, profile: Option<&str>) -> Result<Self, CliError> {
        let config = CliProfilesConfig::load_from_path(&path).map_err(CliError::Config)?;
        let profile_name = config.resolve_profile_name(profile);

        let mut client_config = ClientConfig::from_env()?;
        if let Some(server_url) = config.profile(&profile_name).and_then(|p| p.server_url()) {
            client_config = client_config.with_server_url(normalize_server_url(Some(&server_url))?);
        }

        Ok(Self {
            sessions: ProfileSessionStore::new(path, profile_name.clone()),
            profile: profile_name,
            client_config,
        })
    }

    pub fn backend(&self) -> Result<HttpBackend, CliError> {
        Ok(HttpBackend::new(&self.client_config)?)
    }

    pub fn session(&self) -> Result<Session, CliError> {
        self.sessions.load_session()?.ok_or(CliError::NotLoggedIn)
    }

    /// Controller bound to the stored session, with the library loaded.
    pub async fn open_library(&self) -> Result<OptimisticController<HttpRemoteStore>, CliError> {
        let store = self.backend()?.scoped(self.session()?);
        let mut controller = OptimisticController::new(store);
        controller.load().await?;
        Ok(controller)
    }
}

#[derive(Debug, Serialize)]
pub struct FileListItem {
    pub id: EntityId,
    pub title: String,
    pub kind: &'static str,
    pub citation: String,
    pub downloadable: bool,
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<EntityId>,
    pub kind: &'static str,
    pub preview: String,
    pub content: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

pub fn file_to_list_item(file: &LibraryFile) -> FileListItem {
    FileListItem {
        id: file.id.clone(),
        title: file.title.clone(),
        kind: file.meta.kind.label(),
        citation: file.meta.apa_citation(),
        downloadable: file.is_uploaded(),
    }
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.clone(),
        file_id: note.file_id.clone(),
        kind: if note.is_free() { "free" } else { "abstract" },
        preview: note.preview(80),
        content: note.content.clone(),
        created_at: note.created_at.clone(),
        page: note.page.clone().filter(|page| !page.is_empty()),
    }
}

pub fn format_file_lines(files: &[LibraryFile], selected: Option<&EntityId>) -> Vec<String> {
    files
        .iter()
        .map(|file| {
            let marker = if Some(&file.id) == selected { "*" } else { " " };
            format!(
                "{marker} {} [{}] {}",
                file.id,
                file.meta.kind.label(),
                file.meta.apa_citation()
            )
        })
        .collect()
}

pub fn format_note_lines<'a>(notes: impl IntoIterator<Item = &'a Note>) -> Vec<String> {
    notes
        .into_iter()
        .map(|note| match note.page.as_deref().filter(|page| !page.is_empty()) {
            Some(page) => format!("{} (p. {page}) {}", note.id, note.preview(80)),
            None => format!("{} {}", note.id, note.preview(80)),
        })
        .collect()
}

pub fn format_search_lines(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .enumerate()
        .map(|(index, hit)| {
            let source = if hit.title.is_empty() {
                "free note".to_string()
            } else {
                format!("{}. ({}). {}", hit.author, hit.date, hit.title)
            };
            let download = hit
                .downloadable_file()
                .map(|id| format!(" [download: {id}]"))
                .unwrap_or_default();
            format!(
                "{}. {:.3} {source}{download}\n   {}",
                index + 1,
                hit.score,
                hit.content.lines().next().unwrap_or("")
            )
        })
        .collect()
}

/// Join trailing words into note content; blank input is rejected.
pub fn normalize_content(parts: &[String]) -> Result<String, CliError> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyContent);
    }
    Ok(trimmed.to_string())
}

pub fn normalize_identifier(id: &str) -> Result<&str, CliError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::EmptyId);
    }
    Ok(id)
}

pub fn resolve_file_id(files: &[LibraryFile], query: &str) -> Result<EntityId, CliError> {
    let query = normalize_identifier(query)?;
    files
        .iter()
        .find(|file| file.id.matches_str(query))
        .map(|file| file.id.clone())
        .ok_or_else(|| CliError::FileNotFound(query.to_string()))
}

pub fn resolve_note_id(notes: &[Note], query: &str) -> Result<EntityId, CliError> {
    let query = normalize_identifier(query)?;
    notes
        .iter()
        .find(|note| note.id.matches_str(query))
        .map(|note| note.id.clone())
        .ok_or_else(|| CliError::NoteNotFound(query.to_string()))
}

/// Print the settled entity, or fail when the change was rolled back.
pub fn finish_mutation(report: MutationReport) -> Result<(), CliError> {
    if report.is_confirmed() {
        println!("{}", report.entity);
        Ok(())
    } else {
        Err(CliError::RolledBack(
            report
                .failure
                .unwrap_or_else(|| "the server did not confirm the change".to_string()),
        ))
    }
}

/// MIME type sent with an uploaded document.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        _ => "application/octet-stream",
    }
}

/// Where a downloaded file is written when no output path is given.
pub fn download_target(server_name: Option<&str>, file_id: &EntityId) -> PathBuf {
    let name = server_name
        .map(path_safe_slug)
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| path_safe_slug(&file_id.to_string()));
    PathBuf::from(name)
}
