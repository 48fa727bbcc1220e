use super::crud::CrudMessages;
use super::entity_page::{EntitySchema, FormPage};
use super::enums::EnumLoader;
use crate::console::{
    app::Screen,
    components::{Column, FieldSet, FormField},
};
use crate::models::{Specialty, SpecialtyInput};

pub struct SpecialtySchema;

pub type SpecialtyPage = FormPage<SpecialtySchema>;

impl EntitySchema for SpecialtySchema {
    type Record = Specialty;
    type Input = SpecialtyInput;

    const SCREEN: Screen = Screen::Specialty;
    const FORM_TITLE: &'static str = "Cadastro de Especialidade";
    const EDIT_TITLE: &'static str = "Editar Especialidade";
    const LIST_TITLE: &'static str = "Especialidades Cadastradas";

    fn messages() -> CrudMessages {
        CrudMessages {
            load_error: "Não foi possível carregar as especialidades.",
            created: "Especialidade cadastrada com sucesso!",
            updated: "Especialidade atualizada com sucesso!",
            deleted_summary: "Especialidade excluída",
            deleted: "A especialidade foi excluída com sucesso.",
            save_error: "Erro ao salvar especialidade",
            delete_error: "Não foi possível excluir a especialidade.",
            confirm: "Tem certeza que deseja excluir a especialidade {itemName}?",
        }
    }

    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Nome")
                .with_placeholder("Nome da especialidade")
                .required("Nome é obrigatório"),
            FormField::text("description", "Descrição").with_placeholder("Descrição"),
        ]
    }

    fn columns(_enums: &EnumLoader) -> Vec<Column<Specialty>> {
        vec![
            Column::new("name", "Nome"),
            Column::new("description", "Descrição"),
        ]
    }

    fn read_form(form: &FieldSet) -> SpecialtyInput {
        SpecialtyInput {
            name: form.value("name"),
            description: form.value("description"),
        }
    }

    fn fill_form(record: &Specialty, form: &mut FieldSet) {
        form.set_value("name", &record.name);
        form.set_value("description", record.description.as_deref().unwrap_or_default());
    }

    fn display_name(record: &Specialty) -> String {
        record.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::events::{AppEvent, Notifier};
    use crate::console::screens::crud::testing::{MemoryService, StaticEnums};
    use crate::console::traits::Page;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn make(id: &str, input: &SpecialtyInput) -> Specialty {
        Specialty {
            id: id.to_string(),
            name: input.name.clone(),
            description: Some(input.description.clone()).filter(|d| !d.is_empty()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_then_escape_returns_to_create_mode() {
        let record = Specialty {
            id: "2".to_string(),
            name: "Cardiologia".to_string(),
            description: None,
        };
        let service = Arc::new(MemoryService::new(vec![record.clone()], make));
        let (tx, _rx) = mpsc::unbounded_channel::<AppEvent>();
        let mut page = SpecialtyPage::new(service, Arc::new(StaticEnums), Notifier::new(tx));
        page.on_enter();
        tokio::time::sleep(Duration::from_millis(20)).await;
        page.poll();

        page.start_edit(&record);
        assert_eq!(page.form().value("name"), "Cardiologia");
        assert_eq!(page.form().value("description"), "");

        page.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(!page.is_editing());
        assert_eq!(page.form().value("name"), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ctrl_s_saves_from_any_field() {
        let service = Arc::new(MemoryService::new(Vec::new(), make));
        let (tx, _rx) = mpsc::unbounded_channel::<AppEvent>();
        let mut page =
            SpecialtyPage::new(service.clone(), Arc::new(StaticEnums), Notifier::new(tx));
        page.on_enter();
        page.form_mut().set_value("name", "Neurologia");
        page.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        page.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        tokio::time::sleep(Duration::from_millis(20)).await;
        page.poll();

        assert_eq!(service.calls(), vec!["list", "create", "list"]);
        assert_eq!(page.records()[0].name, "Neurologia");
        assert_eq!(page.records()[0].description, None);
    }

    #[test]
    fn test_confirm_message_uses_specialty_wording() {
        let text = SpecialtySchema::messages().confirm.replace("{itemName}", "Ortopedia");
        assert_eq!(text, "Tem certeza que deseja excluir a especialidade Ortopedia?");
    }
}
