//! Patient registry

use super::crud::CrudMessages;
use super::entity_page::{EntitySchema, FormPage};
use super::enums::EnumLoader;
use crate::console::{
    app::Screen,
    components::{Column, FieldSet, FormField},
};
use crate::models::{EnumKind, Patient, PatientInput};

pub struct PatientSchema;

pub type PatientPage = FormPage<PatientSchema>;

impl EntitySchema for PatientSchema {
    type Record = Patient;
    type Input = PatientInput;

    const SCREEN: Screen = Screen::Patient;
    const FORM_TITLE: &'static str = "Cadastro de Paciente";
    const EDIT_TITLE: &'static str = "Editar Paciente";
    const LIST_TITLE: &'static str = "Lista de Pacientes";

    fn messages() -> CrudMessages {
        CrudMessages {
            load_error: "Não foi possível carregar a lista de pacientes.",
            created: "Paciente cadastrado com sucesso!",
            updated: "Paciente atualizado com sucesso!",
            deleted_summary: "Paciente excluído",
            deleted: "O paciente foi excluído com sucesso.",
            save_error: "Erro ao salvar paciente",
            delete_error: "Não foi possível excluir o paciente.",
            confirm: "Deseja realmente excluir o paciente {itemName}?",
        }
    }

    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Nome")
                .with_placeholder("Nome")
                .required("Nome é obrigatório"),
            FormField::text("cpf", "CPF")
                .with_placeholder("CPF")
                .required("CPF é obrigatório"),
            FormField::select("gender", "Gênero").required("Gênero é obrigatório"),
            FormField::text("phone", "Telefone").with_placeholder("Telefone"),
            FormField::select("bloodType", "Tipo Sanguíneo"),
            FormField::date("birthDate", "Data de Nascimento"),
        ]
    }

    fn enum_fields() -> &'static [(&'static str, EnumKind)] {
        &[("gender", EnumKind::Gender), ("bloodType", EnumKind::BloodType)]
    }

    fn columns(enums: &EnumLoader) -> Vec<Column<Patient>> {
        let genders = enums.options(EnumKind::Gender);
        let blood_types = enums.options(EnumKind::BloodType);
        vec![
            Column::new("name", "Nome"),
            Column::new("cpf", "CPF"),
            Column::new("gender", "Gênero").with_render(move |p: &Patient| {
                crate::models::option_label(&genders, &p.gender)
            }),
            Column::new("bloodType", "Tipo Sanguíneo").with_render(move |p: &Patient| {
                crate::models::option_label(&blood_types, &p.blood_type)
            }),
            Column::new("phone", "Telefone"),
        ]
    }

    fn read_form(form: &FieldSet) -> PatientInput {
        PatientInput {
            name: form.value("name"),
            cpf: form.value("cpf"),
            gender: form.value("gender"),
            phone: form.value("phone"),
            blood_type: form.value("bloodType"),
            birth_date: form.value("birthDate"),
        }
    }

    fn fill_form(record: &Patient, form: &mut FieldSet) {
        form.set_value("name", &record.name);
        form.set_value("cpf", &record.cpf);
        form.set_value("gender", &record.gender);
        form.set_value("phone", &record.phone);
        form.set_value("bloodType", &record.blood_type);
        form.set_value("birthDate", &record.birth_date);
    }

    fn display_name(record: &Patient) -> String {
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

    type Service = MemoryService<Patient, PatientInput>;

    fn make(id: &str, input: &PatientInput) -> Patient {
        Patient {
            id: id.to_string(),
            name: input.name.clone(),
            cpf: input.cpf.clone(),
            gender: input.gender.clone(),
            phone: input.phone.clone(),
            blood_type: input.blood_type.clone(),
            birth_date: input.birth_date.clone(),
        }
    }

    fn page(service: Arc<Service>) -> (PatientPage, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PatientPage::new(service, Arc::new(StaticEnums), Notifier::new(tx)),
            rx,
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn settle(page: &mut PatientPage) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        page.poll();
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_loads_list_and_enum_options() {
        let service = Arc::new(Service::new(
            vec![make("1", &PatientInput {
                name: "Ana".to_string(),
                gender: "FEMALE".to_string(),
                ..Default::default()
            })],
            make,
        ));
        let (mut page, _rx) = page(service);
        page.on_enter();
        settle(&mut page).await;

        assert_eq!(page.records().len(), 1);
        let gender = page.form().get("gender").unwrap();
        assert_eq!(gender.options.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_with_blank_form_warns_and_sends_nothing() {
        let service = Arc::new(Service::new(Vec::new(), make));
        let (mut page, mut rx) = page(service.clone());
        page.on_enter();
        settle(&mut page).await;

        page.handle_key(key(KeyCode::Enter));
        settle(&mut page).await;

        assert_eq!(service.calls(), vec!["list"]);
        let warnings: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                AppEvent::Notify(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].detail.as_deref(),
            Some("Nome é obrigatório\nCPF é obrigatório\nGênero é obrigatório")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_form_is_created_and_reset() {
        let service = Arc::new(Service::new(Vec::new(), make));
        let (mut page, _rx) = page(service.clone());
        page.on_enter();
        settle(&mut page).await;

        for c in "Ana".chars() {
            page.handle_key(key(KeyCode::Char(c)));
        }
        page.handle_key(key(KeyCode::Tab));
        for c in "123".chars() {
            page.handle_key(key(KeyCode::Char(c)));
        }
        page.form_mut().set_value("gender", "FEMALE");
        page.handle_key(key(KeyCode::BackTab));
        page.handle_key(key(KeyCode::Enter));
        settle(&mut page).await;

        assert_eq!(service.calls(), vec!["list", "create", "list"]);
        assert_eq!(page.records()[0].name, "Ana");
        assert_eq!(page.records()[0].cpf, "123");
        assert_eq!(page.form().value("name"), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_fills_form_and_updates() {
        let existing = make("7", &PatientInput {
            name: "Bia".to_string(),
            cpf: "222".to_string(),
            gender: "FEMALE".to_string(),
            ..Default::default()
        });
        let service = Arc::new(Service::new(vec![existing.clone()], make));
        let (mut page, _rx) = page(service.clone());
        page.on_enter();
        settle(&mut page).await;

        page.start_edit(&existing);
        assert!(page.is_editing());
        assert_eq!(page.form().value("cpf"), "222");

        page.form_mut().set_value("name", "Beatriz");
        assert!(page.submit());
        settle(&mut page).await;

        assert_eq!(service.calls(), vec!["list", "update 7", "list"]);
        assert!(!page.is_editing());
        assert_eq!(page.records()[0].name, "Beatriz");
    }

    #[test]
    fn test_gender_column_shows_label() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let enums = EnumLoader::new(Arc::new(StaticEnums), Notifier::new(tx));
        let columns = PatientSchema::columns(&enums);
        let patient = Patient {
            gender: "FEMALE".to_string(),
            ..Default::default()
        };
        // Without loaded options the raw value is shown
        assert_eq!(columns[2].text(&patient), "FEMALE");
    }
}
