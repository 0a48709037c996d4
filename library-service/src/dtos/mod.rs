pub mod auth;
pub mod collection;
pub mod media;

pub use auth::{SignInCallbackRequest, SignInDecisionResponse};
pub use collection::{
    AddCollectionMediaRequest, CollectionListResponse, CollectionResponse,
    CreateCollectionRequest, UpdateCollectionRequest,
};
pub use media::{
    DeletedMediaListResponse, DeletedMediaResponse, MediaListResponse, MediaResponse,
    RegisterMediaRequest, UpdateMediaRequest,
};
