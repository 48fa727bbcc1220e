//! List/create/update/delete flow shared by the entity pages

use std::sync::Arc;

use ratatui::widgets::TableState;
use tracing::{info, warn};

use crate::api::{ApiError, ApiResult, CrudService};
use crate::console::{
    components::{
        confirm_dialog::{ConfirmDialog, CONFIRM_TITLE},
        data_table::clamp_selection,
        ToastMessage,
    },
    events::Notifier,
    operations::Mailbox,
};
use crate::models::Record;

/// Operator-facing texts of one entity
#[derive(Debug, Clone)]
pub struct CrudMessages {
    pub load_error: &'static str,
    pub created: &'static str,
    pub updated: &'static str,
    pub deleted_summary: &'static str,
    pub deleted: &'static str,
    pub save_error: &'static str,
    pub delete_error: &'static str,
    /// Confirmation text; `{itemName}` is replaced with the record's name
    pub confirm: &'static str,
}

pub enum CrudReply<R> {
    Loaded(ApiResult<Vec<R>>),
    Saved {
        updated: bool,
        list: ApiResult<Vec<R>>,
    },
    SaveFailed(ApiError),
    Deleted(ApiResult<Vec<R>>),
    DeleteFailed(ApiError),
}

/// What applying a reply did, so the page can react (e.g. reset its form)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudOutcome {
    Loaded,
    Saved,
    Deleted,
    Failed,
}

/// Owns the list of one collection and runs its mutations in the background
pub struct CrudController<R, I> {
    service: Arc<dyn CrudService<Record = R, Input = I>>,
    notifier: Notifier,
    messages: CrudMessages,
    pub records: Vec<R>,
    pub table_state: TableState,
    pub confirm: ConfirmDialog,
    editing_id: Option<String>,
    loading: bool,
    saving: bool,
    mailbox: Mailbox<CrudReply<R>>,
}

impl<R, I> CrudController<R, I>
where
    R: Record + Clone + Send + Sync + 'static,
    I: Send + Sync + 'static,
{
    pub fn new(
        service: Arc<dyn CrudService<Record = R, Input = I>>,
        notifier: Notifier,
        messages: CrudMessages,
    ) -> Self {
        let confirm = ConfirmDialog::new(CONFIRM_TITLE, messages.confirm);
        Self {
            service,
            notifier,
            messages,
            records: Vec::new(),
            table_state: TableState::default(),
            confirm,
            editing_id: None,
            loading: false,
            saving: false,
            mailbox: Mailbox::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }

    pub fn mount(&mut self) {
        self.mailbox.reset();
        self.load();
    }

    /// Drop everything in flight; late replies will not reach this page
    pub fn unmount(&mut self) {
        self.mailbox.reset();
        self.loading = false;
        self.saving = false;
        self.confirm.close();
    }

    pub fn load(&mut self) {
        self.loading = true;
        let service = Arc::clone(&self.service);
        self.mailbox
            .spawn(async move { CrudReply::Loaded(service.list().await) });
    }

    /// Record under the table highlight
    pub fn selected(&self) -> Option<&R> {
        self.table_state
            .selected()
            .and_then(|i| self.records.get(i))
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn begin_edit(&mut self, id: &str) {
        self.editing_id = Some(id.to_string());
    }

    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
    }

    /// Validate, then create or update. `problems` are the messages of every
    /// missing or malformed field; when there are any nothing is sent and a
    /// single warning lists them all. Returns whether a request went out.
    pub fn submit(&mut self, input: I, problems: Vec<String>) -> bool {
        if !problems.is_empty() {
            self.notifier
                .notify(ToastMessage::warn("Campos obrigatórios", problems.join("\n")));
            return false;
        }
        if self.saving {
            return false;
        }
        self.saving = true;

        let service = Arc::clone(&self.service);
        let editing = self.editing_id.clone();
        self.mailbox.spawn(async move {
            let saved = match &editing {
                Some(id) => service.update(id, &input).await,
                None => service.create(&input).await,
            };
            match saved {
                Ok(_) => CrudReply::Saved {
                    updated: editing.is_some(),
                    list: service.list().await,
                },
                Err(e) => CrudReply::SaveFailed(e),
            }
        });
        true
    }

    /// Ask for confirmation before deleting `record`
    pub fn request_delete(&mut self, record: &R, display_name: &str) {
        self.confirm.open(record.id(), display_name);
    }

    pub fn delete(&mut self, id: String) {
        let service = Arc::clone(&self.service);
        self.mailbox.spawn(async move {
            match service.delete(&id).await {
                Ok(()) => CrudReply::Deleted(service.list().await),
                Err(e) => CrudReply::DeleteFailed(e),
            }
        });
    }

    fn replace_records(&mut self, list: ApiResult<Vec<R>>) -> bool {
        match list {
            Ok(records) => {
                self.records = records;
                clamp_selection(&mut self.table_state, self.records.len());
                true
            }
            Err(e) => {
                warn!("Failed to load list: {}", e);
                self.notifier.notify(ToastMessage::error(
                    "Erro ao carregar dados",
                    e.user_message(self.messages.load_error),
                ));
                false
            }
        }
    }

    /// Apply every reply that arrived since the last call
    pub fn poll(&mut self) -> Vec<CrudOutcome> {
        let replies = self.mailbox.drain();
        replies.into_iter().map(|reply| self.apply(reply)).collect()
    }

    fn apply(&mut self, reply: CrudReply<R>) -> CrudOutcome {
        match reply {
            CrudReply::Loaded(list) => {
                self.loading = false;
                if self.replace_records(list) {
                    info!("Loaded {} records", self.records.len());
                    CrudOutcome::Loaded
                } else {
                    CrudOutcome::Failed
                }
            }
            CrudReply::Saved { updated, list } => {
                self.saving = false;
                self.editing_id = None;
                let detail = if updated {
                    self.messages.updated
                } else {
                    self.messages.created
                };
                self.notifier.notify(ToastMessage::success("Sucesso", detail));
                self.replace_records(list);
                CrudOutcome::Saved
            }
            CrudReply::SaveFailed(e) => {
                self.saving = false;
                warn!("Save failed: {}", e);
                self.notifier.notify(ToastMessage::error(
                    "Erro",
                    e.user_message(self.messages.save_error),
                ));
                CrudOutcome::Failed
            }
            CrudReply::Deleted(list) => {
                self.notifier.notify(ToastMessage::success(
                    self.messages.deleted_summary,
                    self.messages.deleted,
                ));
                self.replace_records(list);
                CrudOutcome::Deleted
            }
            CrudReply::DeleteFailed(e) => {
                warn!("Delete failed: {}", e);
                self.notifier.notify(ToastMessage::error(
                    "Erro ao excluir",
                    e.user_message(self.messages.delete_error),
                ));
                CrudOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory services for page tests

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::api::{ApiError, ApiResult, CrudService, EnumSource, ListService};
    use crate::models::{EnumItem, EnumKind, Record};

    /// Records every call; `fail_with` makes every call return that status
    pub struct MemoryService<R, I> {
        pub records: Mutex<Vec<R>>,
        pub calls: Mutex<Vec<String>>,
        pub fail_with: Mutex<Option<(u16, Option<String>)>>,
        pub latency: Duration,
        pub make: fn(&str, &I) -> R,
    }

    impl<R: Clone, I> MemoryService<R, I> {
        pub fn new(records: Vec<R>, make: fn(&str, &I) -> R) -> Self {
            Self {
                records: Mutex::new(records),
                calls: Mutex::new(Vec::new()),
                fail_with: Mutex::new(None),
                latency: Duration::from_millis(0),
                make,
            }
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub fn fail(&self, status: u16, message: Option<&str>) {
            *self.fail_with.lock().unwrap() = Some((status, message.map(str::to_string)));
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record_call(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn failure(&self) -> Option<ApiError> {
            self.fail_with
                .lock()
                .unwrap()
                .clone()
                .map(|(status, message)| ApiError::Status { status, message })
        }
    }

    #[async_trait]
    impl<R, I> ListService for MemoryService<R, I>
    where
        R: Record + Clone + Send + Sync + 'static,
        I: Send + Sync + 'static,
    {
        type Record = R;

        async fn list(&self) -> ApiResult<Vec<R>> {
            self.record_call("list".to_string());
            tokio::time::sleep(self.latency).await;
            if let Some(e) = self.failure() {
                return Err(e);
            }
            Ok(self.records.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl<R, I> CrudService for MemoryService<R, I>
    where
        R: Record + Clone + Send + Sync + 'static,
        I: Send + Sync + 'static,
    {
        type Input = I;

        async fn create(&self, input: &I) -> ApiResult<R> {
            self.record_call("create".to_string());
            tokio::time::sleep(self.latency).await;
            if let Some(e) = self.failure() {
                return Err(e);
            }
            let mut records = self.records.lock().unwrap();
            let record = (self.make)(&(records.len() + 1).to_string(), input);
            records.push(record.clone());
            Ok(record)
        }

        async fn update(&self, id: &str, input: &I) -> ApiResult<R> {
            self.record_call(format!("update {}", id));
            tokio::time::sleep(self.latency).await;
            if let Some(e) = self.failure() {
                return Err(e);
            }
            let record = (self.make)(id, input);
            let mut records = self.records.lock().unwrap();
            if let Some(slot) = records.iter_mut().find(|r| r.id() == id) {
                *slot = record.clone();
            }
            Ok(record)
        }

        async fn delete(&self, id: &str) -> ApiResult<()> {
            self.record_call(format!("delete {}", id));
            tokio::time::sleep(self.latency).await;
            if let Some(e) = self.failure() {
                return Err(e);
            }
            self.records.lock().unwrap().retain(|r| r.id() != id);
            Ok(())
        }
    }

    /// Serves fixed enumerations
    pub struct StaticEnums;

    #[async_trait]
    impl EnumSource for StaticEnums {
        async fn options(&self, kind: EnumKind) -> ApiResult<Vec<EnumItem>> {
            let items: &[(&str, &str)] = match kind {
                EnumKind::Gender => &[("MALE", "Masculino"), ("FEMALE", "Feminino")],
                EnumKind::BloodType => &[("A_POSITIVE", "A+"), ("O_NEGATIVE", "O-")],
                EnumKind::Classification => &[("RED", "Vermelho"), ("YELLOW", "Amarelo")],
            };
            Ok(items
                .iter()
                .enumerate()
                .map(|(i, (value, label))| EnumItem {
                    id: i.to_string(),
                    value: value.to_string(),
                    label: label.to_string(),
                })
                .collect())
        }
    }
}
