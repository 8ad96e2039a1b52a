//! Optimistic mutation controller.
//!
//! Local state changes first and the backend confirms afterwards; a rejected
//! confirm rolls the local change back. The state machine in [`mutation`] is
//! pure; [`OptimisticController`] drives it against a [`crate::remote::RemoteStore`].

mod driver;
pub mod mutation;
pub mod state;
mod upload;

pub use driver::{MutationReport, OptimisticController};
pub use mutation::{
    apply, reconcile, ConfirmRequest, ConfirmStatus, MutationIntent, MutationPhase, PendingMutation,
    Reconciled,
};
pub use state::{partition_notes, select_file, LibraryState};
pub use upload::{filter_uploadable, UploadOutcome};
