pub mod digest;
pub mod xxhash;

pub use digest::{digest, ContentDigest};
