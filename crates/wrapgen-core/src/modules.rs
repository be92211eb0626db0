//! Module index: the `pub mod` list that wires generated units into a crate.

use wrapgen_catalog::{ParameterCatalog, Variant};

use crate::assemble::{selected_variants, GenerateOptions};
use crate::render::cfg_attr;

/// Render one cfg-gated `pub mod` declaration per generated variant, in
/// variant order.
///
/// `file_of` gives a unit's file relative to the index. Files other than
/// `<module>.rs` get a `#[path]` attribute.
pub fn render_module_index<F>(
    params: &ParameterCatalog,
    options: &GenerateOptions,
    file_of: F,
) -> String
where
    F: Fn(&Variant<'_>) -> String,
{
    let mut lines = Vec::new();
    for variant in selected_variants(params, options) {
        let module = variant.module_name();
        lines.push(format!("#[{}]", cfg_attr(&variant.cfgs())));
        let file = file_of(&variant);
        if file != format!("{module}.rs") {
            lines.push(format!("#[path = \"{}\"]", file.escape_default()));
        }
        lines.push(format!("pub mod {module};"));
    }
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}
