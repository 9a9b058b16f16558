pub mod post;

pub use post::{AttachmentPoster, PostMode, PostOutcome};
