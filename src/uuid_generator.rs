use tracing::{instrument, trace};
use uuid::Uuid;

/// Creates the identifier of a freshly closed item.
///
/// Identifiers are random rather than derived from content, so two identical
/// items in the same file still get distinct keys.
#[instrument(level = "trace")]
pub fn generate_item_id() -> Uuid {
	let id = Uuid::new_v4();
	trace!("Generated item id {}", id);
	id
}
