//! Utility macros

/// Implement `FromRef<AppState>` for several fields at once, so handlers can
/// extract just the piece of state they need.
///
/// ```ignore
/// impl_from_ref! {
///     registry: Arc<CatalogRegistry>,
///     start_time: Instant,
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($($field:ident: $type:ty),+ $(,)?) => {
        $(
            impl axum::extract::FromRef<$crate::state::AppState> for $type {
                fn from_ref(state: &$crate::state::AppState) -> Self {
                    state.$field.clone()
                }
            }
        )+
    };
}
