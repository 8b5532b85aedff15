//! External provider clients and their decode steps.
//!
//! Each client owns the translation from one provider's loosely-shaped
//! payload into the crate's typed records; a record that fails to decode is
//! skipped, never an error. Transient transport failures retry with
//! back-off, everything else surfaces as a typed [`SourceError`].
//!
//! [`SourceError`]: crate::error::SourceError

mod orders;
mod retry;
mod shopping;
mod social;
mod vision;

pub use orders::OrdersClient;
pub use shopping::ShoppingClient;
pub use social::{SearchPage, SocialClient};
pub use vision::VisionClient;
