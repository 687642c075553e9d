pub mod chat;
pub mod supabase;

pub use chat::{ChatLog, MemoryChatLog, SupabaseChatLog};
pub use supabase::SupabaseClient;
