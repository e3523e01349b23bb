/// Recommended error type for a scenario binary's `main` function and any shared behaviour
/// code. Compatible with [crate::scenario::VuBehaviour] so `?` propagates cleanly.
pub type GustResult<T> = anyhow::Result<T>;
