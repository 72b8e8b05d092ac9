mod context_source;
mod member;
mod message;
mod room;

pub use context_source::{ContextSource, NewContextSource, SourceKind};
pub use member::{EngineKind, Member, NewMember};
pub use message::{Message, MessageRole, MessageWithSender, NewMessage};
pub use room::Room;
