pub mod completion;

pub use completion::{sanitize_for_prompt, ChatCompletionClient, CompletionBackend};
