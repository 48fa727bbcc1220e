//! Option lists served by `/enums/{kind}`

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{ApiResult, EnumSource};
use crate::console::{components::ToastMessage, events::Notifier, operations::Mailbox};
use crate::models::{option_label, EnumItem, EnumKind, SelectOption};

fn load_error(kind: EnumKind) -> (&'static str, &'static str) {
    match kind {
        EnumKind::Gender => (
            "Erro ao carregar gêneros",
            "Não foi possível carregar a lista de gêneros.",
        ),
        EnumKind::BloodType => (
            "Erro ao carregar tipos sanguíneos",
            "Não foi possível carregar a lista de tipos sanguíneos.",
        ),
        EnumKind::Classification => (
            "Erro ao carregar classificações",
            "Não foi possível carregar a lista de classificações.",
        ),
    }
}

/// Fetches the enumerations a page needs when it mounts
pub struct EnumLoader {
    source: Arc<dyn EnumSource>,
    notifier: Notifier,
    tables: HashMap<EnumKind, Vec<SelectOption>>,
    mailbox: Mailbox<(EnumKind, ApiResult<Vec<EnumItem>>)>,
}

impl EnumLoader {
    pub fn new(source: Arc<dyn EnumSource>, notifier: Notifier) -> Self {
        Self {
            source,
            notifier,
            tables: HashMap::new(),
            mailbox: Mailbox::new(),
        }
    }

    pub fn mount(&mut self, kinds: &[EnumKind]) {
        self.mailbox.reset();
        for &kind in kinds {
            let source = Arc::clone(&self.source);
            self.mailbox
                .spawn(async move { (kind, source.options(kind).await) });
        }
    }

    pub fn unmount(&mut self) {
        self.mailbox.reset();
    }

    /// Store arrived lists; returns the kinds that changed
    pub fn poll(&mut self) -> Vec<EnumKind> {
        let mut updated = Vec::new();
        for (kind, result) in self.mailbox.drain() {
            match result {
                Ok(items) => {
                    debug!("Loaded {} options for {}", items.len(), kind.as_path());
                    self.tables
                        .insert(kind, items.into_iter().map(SelectOption::from).collect());
                    updated.push(kind);
                }
                Err(e) => {
                    warn!("Failed to load {} options: {}", kind.as_path(), e);
                    let (summary, detail) = load_error(kind);
                    self.notifier
                        .notify(ToastMessage::error(summary, e.user_message(detail)));
                }
            }
        }
        updated
    }

    /// Fetch `kinds` directly, without going through the mailbox
    pub async fn preload(&mut self, kinds: &[EnumKind]) -> ApiResult<()> {
        for &kind in kinds {
            let items = self.source.options(kind).await?;
            self.tables
                .insert(kind, items.into_iter().map(SelectOption::from).collect());
        }
        Ok(())
    }

    pub fn options(&self, kind: EnumKind) -> Vec<SelectOption> {
        self.tables.get(&kind).cloned().unwrap_or_default()
    }

    pub fn label(&self, kind: EnumKind, value: &str) -> String {
        option_label(
            self.tables.get(&kind).map(Vec::as_slice).unwrap_or_default(),
            value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{events::AppEvent, screens::crud::testing::StaticEnums};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_labels_fall_back_to_raw_value_until_loaded() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut enums = EnumLoader::new(Arc::new(StaticEnums), Notifier::new(tx));
        assert_eq!(enums.label(EnumKind::Gender, "MALE"), "MALE");

        enums.preload(&[EnumKind::Gender]).await.unwrap();
        assert_eq!(enums.label(EnumKind::Gender, "MALE"), "Masculino");
        assert!(enums.options(EnumKind::BloodType).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_delivers_through_poll() {
        let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
        let mut enums = EnumLoader::new(Arc::new(StaticEnums), Notifier::new(tx));
        enums.mount(&[EnumKind::Classification]);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(enums.poll(), vec![EnumKind::Classification]);
        assert_eq!(enums.options(EnumKind::Classification).len(), 2);
        assert!(rx.try_recv().is_err());
    }
}
