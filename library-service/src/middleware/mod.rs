pub mod requester;

pub use requester::RequesterId;
