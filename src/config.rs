use std::path::Path;

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use tower_lsp::lsp_types::ClientCapabilities;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Sort scanned files by distance to the active document so the nearest wins collisions
    pub proximity_ordering: bool,
    pub document_links: bool,
    pub completions: bool,
    /// Namespace assumed for summon and selector identifiers written without one
    pub default_namespace: String,
    pub max_completions: usize,
}

impl Settings {
    pub fn new(root_dir: &Path, capabilities: &ClientCapabilities) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/bedrock-definitions/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.bedrock-definitions",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("proximity_ordering", true)?
            .set_default("document_links", true)?
            .set_default("completions", true)?
            .set_default("default_namespace", "minecraft")?
            .set_default("max_completions", 200)?
            .set_override_option(
                "document_links",
                capabilities.text_document.as_ref().and_then(|it| {
                    match it.document_link.is_none() {
                        true => Some(false),
                        false => None,
                    }
                }),
            )?
            .set_override_option(
                "completions",
                capabilities.text_document.as_ref().and_then(|it| {
                    match it.completion.is_none() {
                        true => Some(false),
                        false => None,
                    }
                }),
            )?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            proximity_ordering: true,
            document_links: true,
            completions: true,
            default_namespace: "minecraft".to_string(),
            max_completions: 200,
        }
    }
}
