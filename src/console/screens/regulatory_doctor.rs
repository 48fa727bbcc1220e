use super::crud::CrudMessages;
use super::entity_page::{EntitySchema, FormPage};
use super::enums::EnumLoader;
use crate::console::{
    app::Screen,
    components::{Column, FieldSet, FormField},
};
use crate::models::{option_label, EnumKind, RegulatoryDoctor, RegulatoryDoctorInput};

pub struct RegulatoryDoctorSchema;

pub type RegulatoryDoctorPage = FormPage<RegulatoryDoctorSchema>;

impl EntitySchema for RegulatoryDoctorSchema {
    type Record = RegulatoryDoctor;
    type Input = RegulatoryDoctorInput;

    const SCREEN: Screen = Screen::RegulatoryDoctor;
    const FORM_TITLE: &'static str = "Cadastro de Médico Regulador";
    const EDIT_TITLE: &'static str = "Editar Médico Regulador";
    const LIST_TITLE: &'static str = "Lista de Médicos Reguladores";

    fn messages() -> CrudMessages {
        CrudMessages {
            load_error: "Não foi possível carregar a lista de médicos reguladores.",
            created: "Médico regulador cadastrado com sucesso!",
            updated: "Médico regulador atualizado com sucesso!",
            deleted_summary: "Médico regulador excluído",
            deleted: "O médico regulador foi excluído com sucesso.",
            save_error: "Erro ao salvar médico regulador",
            delete_error: "Não foi possível excluir o médico regulador.",
            confirm: "Deseja realmente excluir o médico regulador {itemName}?",
        }
    }

    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Nome").required("Nome é obrigatório"),
            FormField::text("cpf", "CPF").required("CPF é obrigatório"),
            FormField::select("gender", "Gênero").required("Gênero é obrigatório"),
            FormField::text("phone", "Telefone"),
            FormField::text("crm", "CRM").required("CRM é obrigatório"),
            FormField::text("insurance", "Convênio").required("Convênio é obrigatório"),
        ]
    }

    fn enum_fields() -> &'static [(&'static str, EnumKind)] {
        &[("gender", EnumKind::Gender)]
    }

    fn columns(enums: &EnumLoader) -> Vec<Column<RegulatoryDoctor>> {
        let genders = enums.options(EnumKind::Gender);
        vec![
            Column::new("name", "Nome"),
            Column::new("cpf", "CPF"),
            Column::new("crm", "CRM"),
            Column::new("insurance", "Convênio"),
            Column::new("gender", "Gênero")
                .with_render(move |d: &RegulatoryDoctor| option_label(&genders, &d.gender)),
            Column::new("phone", "Telefone"),
        ]
    }

    fn read_form(form: &FieldSet) -> RegulatoryDoctorInput {
        RegulatoryDoctorInput {
            name: form.value("name"),
            cpf: form.value("cpf"),
            phone: form.value("phone"),
            crm: form.value("crm"),
            insurance: form.value("insurance"),
            gender: form.value("gender"),
        }
    }

    fn fill_form(record: &RegulatoryDoctor, form: &mut FieldSet) {
        form.set_value("name", &record.name);
        form.set_value("cpf", &record.cpf);
        form.set_value("phone", &record.phone);
        form.set_value("crm", &record.crm);
        form.set_value("insurance", &record.insurance);
        form.set_value("gender", &record.gender);
    }

    fn display_name(record: &RegulatoryDoctor) -> String {
        record.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::components::Severity;
    use crate::console::events::{AppEvent, Notifier};
    use crate::console::screens::crud::testing::{MemoryService, StaticEnums};
    use crate::console::traits::Page;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Service = MemoryService<RegulatoryDoctor, RegulatoryDoctorInput>;

    fn make(id: &str, input: &RegulatoryDoctorInput) -> RegulatoryDoctor {
        RegulatoryDoctor {
            id: id.to_string(),
            name: input.name.clone(),
            cpf: input.cpf.clone(),
            phone: input.phone.clone(),
            crm: input.crm.clone(),
            insurance: input.insurance.clone(),
            gender: input.gender.clone(),
        }
    }

    fn toasts(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<crate::console::components::ToastMessage> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                AppEvent::Notify(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_form_lists_every_required_field() {
        let service = Arc::new(Service::new(Vec::new(), make));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut page =
            RegulatoryDoctorPage::new(service, Arc::new(StaticEnums), Notifier::new(tx));
        assert!(!page.submit());
        let shown = toasts(&mut rx);
        assert_eq!(shown[0].severity, Severity::Warn);
        assert_eq!(
            shown[0].detail.as_deref(),
            Some(
                "Nome é obrigatório\nCPF é obrigatório\nGênero é obrigatório\n\
                 CRM é obrigatório\nConvênio é obrigatório"
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_from_table_confirms_then_removes() {
        let record = make("5", &RegulatoryDoctorInput {
            name: "Dra. Lúcia".to_string(),
            ..Default::default()
        });
        let service = Arc::new(Service::new(vec![record], make));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut page =
            RegulatoryDoctorPage::new(service.clone(), Arc::new(StaticEnums), Notifier::new(tx));
        page.on_enter();
        tokio::time::sleep(Duration::from_millis(20)).await;
        page.poll();

        // Shift+Tab from the first field moves to the list
        page.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::NONE));
        page.handle_key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
        assert_eq!(service.calls(), vec!["list"]);

        page.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
        tokio::time::sleep(Duration::from_millis(20)).await;
        page.poll();

        assert_eq!(service.calls(), vec!["list", "delete 5", "list"]);
        assert!(page.records().is_empty());
        let shown = toasts(&mut rx);
        let last = shown.last().unwrap();
        assert_eq!(last.summary, "Médico regulador excluído");
        assert_eq!(
            last.detail.as_deref(),
            Some("O médico regulador foi excluído com sucesso.")
        );
    }
}
