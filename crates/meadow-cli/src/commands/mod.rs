pub mod check_catalog;
pub mod inspect;
pub mod simulate;

use std::path::Path;
use std::sync::Arc;

use meadow_core::Catalog;

/// Read and validate a catalog file.
fn load_catalog(path: &Path) -> Result<Arc<Catalog>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read catalog '{}': {e}", path.display()))?;
    let catalog = Catalog::from_json_str(&json)
        .map_err(|e| format!("invalid catalog '{}': {e}", path.display()))?;
    Ok(Arc::new(catalog))
}
