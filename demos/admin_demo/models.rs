//! Demo models: a plain record and one exercising every hook

use admin::prelude::*;
use std::sync::Arc;

admin_model!(Hero, "Hero", {
    name: String,
    secret_name: String,
    age: Option<i64>,
});

impl ModelHooks for Hero {}

admin_enum!(F4 {
    O1 => ("o1", "option 1"),
    O2 => ("o2", "option 2"),
    O3 => ("o3", "option 3"),
});

admin_model!(Stuff, "Stuff", {
    f1: String,
    f2: i64 = 42,
    f3: bool = false,
    f4: Option<F4>,
    f5: Option<Uuid>,
    f6: Option<bool>,
    f7: Option<f64>,
    hidden: String = "hidden".to_string(),
});

impl ModelHooks for Stuff {
    fn admin_fields() -> Option<&'static [&'static str]> {
        Some(&["id", "f1", "f2", "f3", "f4", "f5", "f6", "f7"])
    }

    fn before_save(&mut self) -> anyhow::Result<()> {
        tracing::info!("saving object hook");
        Ok(())
    }

    fn after_load(&mut self) {
        tracing::info!("loaded object hook");
    }

    fn before_delete(&mut self) -> anyhow::Result<()> {
        tracing::info!("delete object hook");
        Ok(())
    }

    fn after_load_row(&mut self) {
        tracing::debug!(row = ?self, "loaded row");
    }

    /// `f2==N`, `f3`, `!f3`, otherwise a case-insensitive prefix match on
    /// f1, f2 and f4
    fn filter_predicate(filter: &str) -> Option<RowFilter<Self>> {
        if let Some(Ok(value)) = filter.strip_prefix("f2==").map(str::parse::<i64>) {
            tracing::debug!(value, "filter where f2 ==");
            return Some(Arc::new(move |s: &Stuff| s.f2 == value));
        }
        match filter {
            "f3" => return Some(Arc::new(|s: &Stuff| s.f3)),
            "!f3" => return Some(Arc::new(|s: &Stuff| !s.f3)),
            _ => {}
        }

        let prefix = filter.to_lowercase();
        Some(Arc::new(move |s: &Stuff| {
            s.f1.to_lowercase().starts_with(&prefix)
                || s.f2.to_string().starts_with(&prefix)
                || s.f4.is_some_and(|f4| f4.member_name().starts_with(&prefix))
        }))
    }
}
