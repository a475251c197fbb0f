//! # Initializer registry: discovery, filtering and ordering.
//!
//! ```text
//! Provider::enumerate() ──► filter(requires_initialization) ──► stable sort by priority
//! ```
//!
//! ## Rules
//! - The provider is queried once per run and never mutated
//! - `requires_initialization()` is called exactly once per candidate
//! - Ties keep discovery order (stable sort)
//! - The order only decides submission; completion order is unspecified

use crate::initializers::{InitializerRef, Provider};

/// Collects the initializers that need to run, ordered by ascending priority.
///
/// An empty result is valid; the gate then succeeds without creating a pool.
pub fn collect(provider: &dyn Provider) -> Vec<InitializerRef> {
    let mut list: Vec<InitializerRef> = provider
        .enumerate()
        .into_iter()
        .filter(|init| init.requires_initialization())
        .collect();
    list.sort_by_key(|init| init.priority());
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializers::{InitFn, ProviderFn};
    use tokio_util::sync::CancellationToken;

    fn init(name: &'static str, priority: i32, required: bool) -> InitializerRef {
        InitFn::new(name, |_ctx: CancellationToken| async { Ok(()) })
            .with_priority(priority)
            .with_required(required)
            .into_ref()
    }

    fn names(list: &[InitializerRef]) -> Vec<&str> {
        list.iter().map(|i| i.name()).collect()
    }

    #[test]
    fn filters_and_sorts_stably() {
        let provider: Vec<InitializerRef> = vec![
            init("late", 10, true),
            init("skipped", -100, false),
            init("first-tie", 0, true),
            init("early", -5, true),
            init("second-tie", 0, true),
        ];
        let list = collect(&provider);
        assert_eq!(names(&list), vec!["early", "first-tie", "second-tie", "late"]);
    }

    #[test]
    fn empty_provider_yields_empty_list() {
        let provider = ProviderFn::new(Vec::new);
        assert!(collect(&provider).is_empty());
    }

    #[test]
    fn all_filtered_yields_empty_list() {
        let provider: Vec<InitializerRef> = vec![init("a", 0, false), init("b", 1, false)];
        assert!(collect(&provider).is_empty());
    }
}
