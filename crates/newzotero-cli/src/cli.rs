use std::path::PathBuf;

use clap::{Parser, Subcommand};
use newzotero_core::models::ResultsLimit;

#[derive(Parser)]
#[command(name = "newzotero")]
#[command(about = "Collect excerpts and notes from your literature")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the library for a user ID; unused IDs start a new library
    Login {
        username: String,
        /// Backend origin stored with the profile
        #[arg(long, value_name = "URL")]
        server_url: Option<String>,
    },
    /// Forget the stored user ID
    Logout,
    /// Show the active user ID
    Whoami,
    /// Manage literature files
    Files {
        #[command(subcommand)]
        command: FilesCommands,
    },
    /// Manage excerpts and free notes
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
    /// Search notes by similarity
    Search {
        /// Search query
        query: Vec<String>,
        /// Number of results: 3, 5, 10, 20 or all
        #[arg(short, long, default_value = "5")]
        limit: ResultsLimit,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send feedback to the maintainers
    Feedback {
        /// Reply address
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Message
        message: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum FilesCommands {
    /// List files in the library
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a file from its DOI
    AddDoi { doi: String },
    /// Add a file by hand, optionally with a first excerpt
    AddManual {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "")]
        date: String,
        #[arg(long, default_value = "")]
        page: String,
        /// Excerpt content
        #[arg(long)]
        content: Option<String>,
    },
    /// Upload .pdf, .docx or .doc documents
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Delete a file and its excerpts
    Delete { id: String },
    /// Download an uploaded file
    Download {
        id: String,
        /// Output path (defaults to the server-provided file name)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum NotesCommands {
    /// List free notes and the excerpts of a file
    List {
        /// File ID (defaults to the first file)
        #[arg(long, value_name = "ID")]
        file: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an excerpt to a file
    Add {
        /// File ID (defaults to the first file)
        #[arg(long, value_name = "ID")]
        file: Option<String>,
        /// Page the excerpt comes from
        #[arg(long)]
        page: Option<String>,
        /// Excerpt content
        content: Vec<String>,
    },
    /// Add a free note
    Free { content: Vec<String> },
    /// Delete a note
    Delete { id: String },
}
