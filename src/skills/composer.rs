use serde_json::Value;

use super::registry;

/// System prompt material assembled from the active skill packs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system_prompt: String,
    pub context: String,
    /// Summary of what the client asked for.  `None` for the default pack.
    pub active_packs_info: Option<String>,
}

/// Extract the requested pack ids from a client-supplied JSON value.
///
/// Anything other than an array is treated as "nothing active".  Non-string
/// elements are kept (as their JSON text, `null` as an empty string) so the
/// summary line still reports exactly what was sent; they never match a pack.
pub fn pack_ids_from_value(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect()
}

/// Combine the packs named by `ids` into a single prompt.
///
/// Order is preserved and duplicates repeat.  Unknown ids are dropped
/// silently; if every id is unknown the prompt and context are empty but the
/// summary still lists what was requested.
pub fn compose(ids: &[String]) -> ComposedPrompt {
    if ids.is_empty() {
        let pack = registry::default_pack();
        return ComposedPrompt {
            system_prompt: pack.system_prompt.to_string(),
            context: pack.context.to_string(),
            active_packs_info: None,
        };
    }

    let packs: Vec<_> = ids.iter().filter_map(|id| registry::lookup(id)).collect();

    ComposedPrompt {
        system_prompt: packs
            .iter()
            .map(|p| p.system_prompt)
            .collect::<Vec<_>>()
            .join("\n\n"),
        context: packs
            .iter()
            .map(|p| p.context)
            .collect::<Vec<_>>()
            .join("\n\n"),
        active_packs_info: Some(format!(
            "Currently using {} skill pack(s): {}",
            ids.len(),
            ids.join(", ")
        )),
    }
}

/// Render the upstream `system` message.
pub fn system_message(prompt: &ComposedPrompt) -> String {
    match prompt.active_packs_info {
        Some(ref info) => format!(
            "{}\n\nContext: {}\n\n{}",
            prompt.system_prompt, prompt.context, info
        ),
        None => format!("{}\n\nContext: {}", prompt.system_prompt, prompt.context),
    }
}
