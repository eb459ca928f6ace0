pub mod composer;
pub mod registry;

pub use composer::{compose, pack_ids_from_value, system_message, ComposedPrompt};
