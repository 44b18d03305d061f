//! Per-client CRUD state and the controller operating on it
//!
//! Each client holds one [`CrudState`] per registered model. The
//! [`CrudController`] implements the edit and list operations against it.
//! Every mutation is gated by the model's [`AccessPolicy`]; a denied call
//! returns without touching the state or the store.

use crate::core::access::{AccessContext, AccessPolicy};
use crate::core::events::{AdminEvent, EventBus, RecordEvent};
use crate::core::model::{Model, filter_for};
use crate::core::query::ListParams;
use crate::core::store::RecordStore;
use std::sync::Arc;

/// Where the client should go after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Re-render the current page
    Stay,
    /// Send the client to this URL
    Redirect(String),
}

/// Edit-form and list state of one model for one client
#[derive(Debug, Clone)]
pub struct CrudState<M: Model> {
    /// Record shown in the edit form; default-constructed when none is loaded
    pub current: M,

    /// Outcome of the last storage operation
    pub db_message: String,

    /// Outcome of the last field edit
    pub form_message: String,

    /// List view to return to after editing
    pub page_params: ListParams,

    /// Route id (`"3"`, `"new"`) the edit form was loaded for
    pub loaded_for: Option<String>,
}

impl<M: Model> CrudState<M> {
    pub fn new(default_page_size: usize) -> Self {
        Self {
            current: M::default(),
            db_message: String::new(),
            form_message: String::new(),
            page_params: ListParams::new(default_page_size),
            loaded_for: None,
        }
    }

    /// Forget the current record and messages
    pub fn reset(&mut self) {
        self.current = M::default();
        self.db_message.clear();
        self.form_message.clear();
        self.loaded_for = None;
    }
}

/// List-page actions posted by the pagination and filter controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    Prev,
    Next,
    PageSize(String),
    Filter(String),
    New,
    Refresh,
}

impl ListAction {
    pub fn parse(action: &str, value: Option<String>) -> Option<Self> {
        let value = value.unwrap_or_default();
        match action {
            "prev" => Some(ListAction::Prev),
            "next" => Some(ListAction::Next),
            "page-size" | "page_size" => Some(ListAction::PageSize(value)),
            "filter" => Some(ListAction::Filter(value)),
            "clear-filter" => Some(ListAction::Filter(String::new())),
            "new" => Some(ListAction::New),
            "refresh" => Some(ListAction::Refresh),
            _ => None,
        }
    }
}

/// CRUD operations of one model
pub struct CrudController<M: Model> {
    store: Arc<dyn RecordStore<M>>,
    policy: AccessPolicy,
    list_path: String,
    default_page_size: usize,
    event_bus: Option<Arc<EventBus>>,
}

impl<M: Model> CrudController<M> {
    /// Controller serving `{prefix}/{M::NAME}`
    pub fn new(store: Arc<dyn RecordStore<M>>, prefix: &str) -> Self {
        Self {
            store,
            policy: AccessPolicy::default(),
            list_path: format!("{}/{}", prefix, M::NAME),
            default_page_size: crate::core::query::DEFAULT_PAGE_SIZE,
            event_bus: None,
        }
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn list_path(&self) -> &str {
        &self.list_path
    }

    /// Edit route of a record id (`"new"` for creation)
    pub fn edit_path(&self, id: &str) -> String {
        format!("{}/{}", self.list_path, id)
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn new_state(&self) -> CrudState<M> {
        CrudState::new(self.default_page_size)
    }

    pub fn can_access(&self, ctx: &AccessContext) -> bool {
        self.policy.check(ctx)
    }

    /// Coerce `raw` and assign it to field `name` of the current record
    ///
    /// A coercion failure lands in `form_message` and leaves the record
    /// unchanged.
    pub fn set_field(&self, state: &mut CrudState<M>, ctx: &AccessContext, name: &str, raw: &str) {
        if !self.can_access(ctx) {
            return;
        }
        state.form_message.clear();

        let result = match M::field(name) {
            Some(def) => def.coerce(raw).and_then(|value| {
                state.current.put_field(name, value.clone())?;
                Ok(value)
            }),
            None => Err(crate::core::error::ValidationError::UnknownField {
                model: M::NAME,
                field: name.to_string(),
            }),
        };

        match result {
            Ok(value) => {
                tracing::debug!(model = M::NAME, field = name, value = %value.display(), "set field");
                self.publish(RecordEvent::FieldChanged {
                    model: M::NAME.to_string(),
                    record_id: state.current.id(),
                    field: name.to_string(),
                    value,
                });
            }
            Err(e) => state.form_message = e.to_string(),
        }
    }

    /// Restore field `name` of the current record to the model default
    pub fn reset_field(&self, state: &mut CrudState<M>, ctx: &AccessContext, name: &str) {
        if !self.can_access(ctx) {
            return;
        }
        state.form_message.clear();

        let Some(default) = M::default().get_field(name) else {
            return;
        };
        match state.current.put_field(name, default.clone()) {
            Ok(()) => self.publish(RecordEvent::FieldChanged {
                model: M::NAME.to_string(),
                record_id: state.current.id(),
                field: name.to_string(),
                value: default,
            }),
            Err(e) => state.form_message = e.to_string(),
        }
    }

    /// Load the record named by the route id into the edit form
    ///
    /// A non-numeric id (`new`) starts a blank record. An id with no record
    /// redirects back to the list.
    pub async fn load(&self, state: &mut CrudState<M>, ctx: &AccessContext, id: &str) -> Navigation {
        if !self.can_access(ctx) {
            return Navigation::Stay;
        }
        let Ok(id) = id.parse::<i64>() else {
            state.current = M::default();
            state.db_message.clear();
            state.form_message.clear();
            return Navigation::Stay;
        };

        match self.store.get(id).await {
            Err(e) => {
                state.db_message = e.to_string();
                Navigation::Stay
            }
            Ok(None) => {
                tracing::info!(model = M::NAME, id, "record not found");
                self.redirect_back_to_table(state)
            }
            Ok(Some(mut record)) => {
                state.db_message.clear();
                record.after_load();
                tracing::debug!(model = M::NAME, id, "loaded record");
                state.current = record;
                Navigation::Stay
            }
        }
    }

    /// Load the edit form for `id` unless it already shows that route
    ///
    /// Edits survive re-renders of the same edit page; navigating to another
    /// id (or back from the list) reloads.
    pub async fn open(&self, state: &mut CrudState<M>, ctx: &AccessContext, id: &str) -> Navigation {
        if state.loaded_for.as_deref() == Some(id) {
            return Navigation::Stay;
        }
        let navigation = self.load(state, ctx, id).await;
        if navigation == Navigation::Stay {
            state.loaded_for = Some(id.to_string());
        }
        navigation
    }

    /// Run the save hook and upsert the current record
    ///
    /// Storage and hook failures stay on the page with `db_message` set.
    pub async fn save(&self, state: &mut CrudState<M>, ctx: &AccessContext) -> Navigation {
        if !self.can_access(ctx) {
            return Navigation::Stay;
        }
        if let Err(e) = state.current.before_save() {
            state.db_message = e.to_string();
            return Navigation::Stay;
        }

        tracing::info!(model = M::NAME, id = ?state.current.id(), "persist record");
        match self.store.upsert(state.current.clone()).await {
            Ok(saved) => {
                let id = saved.id().unwrap_or_default();
                self.publish(RecordEvent::Saved {
                    model: M::NAME.to_string(),
                    record_id: id,
                });
                let navigation = self.redirect_back_to_table(state);
                state.db_message = format!("Persist {} #{}", M::NAME, id);
                navigation
            }
            Err(e) => {
                state.db_message = e.to_string();
                Navigation::Stay
            }
        }
    }

    /// Delete the current record and return to the list
    ///
    /// A record that was never saved is not passed to the hook or the store.
    pub async fn delete(&self, state: &mut CrudState<M>, ctx: &AccessContext) -> Navigation {
        if !self.can_access(ctx) {
            return Navigation::Stay;
        }
        let Some(id) = state.current.id() else {
            return self.redirect_back_to_table(state);
        };

        if let Err(e) = state.current.before_delete() {
            state.db_message = e.to_string();
            return Navigation::Stay;
        }

        tracing::info!(model = M::NAME, id, "delete record");
        match self.store.delete(id).await {
            Ok(_) => {
                self.publish(RecordEvent::Deleted {
                    model: M::NAME.to_string(),
                    record_id: id,
                });
                let navigation = self.redirect_back_to_table(state);
                state.db_message = format!("Deleted {} #{}", M::NAME, id);
                navigation
            }
            Err(e) => {
                state.db_message = e.to_string();
                Navigation::Stay
            }
        }
    }

    /// One page of records for the list view at `current_route`
    ///
    /// Empty when the client is unauthenticated or denied, or when
    /// `current_route` is not this model's list route. Caches `params` so the
    /// edit form can return to the same view.
    pub async fn page(
        &self,
        state: &mut CrudState<M>,
        ctx: &AccessContext,
        params: &ListParams,
        current_route: &str,
    ) -> Vec<M> {
        if !ctx.is_authenticated() || !self.can_access(ctx) {
            return Vec::new();
        }
        if current_route != self.list_path {
            return Vec::new();
        }
        state.page_params = params.clone();

        let filter = (!params.filter.is_empty()).then(|| filter_for::<M>(&params.filter));
        tracing::debug!(
            model = M::NAME,
            offset = params.offset,
            page_size = params.page_size,
            filter = %params.filter,
            "get page"
        );

        match self.store.find(filter, params.offset, params.page_size).await {
            Ok(mut rows) => {
                rows.iter_mut().for_each(|row| row.after_load_row());
                rows
            }
            Err(e) => {
                state.db_message = e.to_string();
                Vec::new()
            }
        }
    }

    /// Whether the list may continue past `page`
    pub fn has_next(page: &[M], params: &ListParams) -> bool {
        params.has_next(page.len())
    }

    /// Redirect target of a pagination or filter control
    ///
    /// An unparseable page size leaves the view as is.
    pub fn list_action(&self, params: &ListParams, action: ListAction) -> Navigation {
        let target = match action {
            ListAction::Prev => params.prev_page(),
            ListAction::Next => params.next_page(),
            ListAction::PageSize(raw) => match params.with_page_size(&raw) {
                Some(params) => params,
                None => return Navigation::Stay,
            },
            ListAction::Filter(filter) => params.with_filter(&filter),
            ListAction::New => return Navigation::Redirect(self.edit_path("new")),
            ListAction::Refresh => params.clone(),
        };
        let url = target.href(&self.list_path);
        tracing::debug!(url = %url, "redirect");
        Navigation::Redirect(url)
    }

    /// Reset the edit form and go back to the cached list view
    pub fn redirect_back_to_table(&self, state: &mut CrudState<M>) -> Navigation {
        state.reset();
        Navigation::Redirect(state.page_params.href(&self.list_path))
    }

    fn publish(&self, event: RecordEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(AdminEvent::Record(event));
        }
    }
}
