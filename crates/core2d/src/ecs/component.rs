//! Component trait

/// Marker trait for components.
///
/// Any plain `'static + Send + Sync` value can be stored as a component; one
/// table exists per concrete type.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}
