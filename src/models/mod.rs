pub mod identity;
pub mod notification;

pub use identity::{CallerIdentity, SupabaseClaims};
pub use notification::{NotificationKind, NotificationRequest, RenderedMessage};
