pub mod collection;
pub mod invitation;
pub mod media;
pub mod user;

pub use collection::{Collection, CollectionDetail};
pub use invitation::Invitation;
pub use media::{FileKind, Media, MediaDetail, MediaFile, MediaKind, Tag};
pub use user::User;
