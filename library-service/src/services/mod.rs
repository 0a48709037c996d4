pub mod database;
pub mod email;
pub mod gate;
pub mod handoff;
pub mod storage;
pub mod store;
pub mod sweeper;

pub use database::Database;
pub use email::{EmailProvider, MockEmailService, SmtpEmailService};
pub use gate::{AccessGate, Candidate, Decision};
pub use handoff::HandoffCodec;
pub use storage::{HttpBlobStorage, Storage};
pub use store::{
    CollectionStore, IdentityStore, InvitationStore, LibraryStore, MediaStore, PurgeCandidate,
};
pub use sweeper::{SweepOutcome, Sweeper};
