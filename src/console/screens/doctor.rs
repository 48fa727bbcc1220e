use super::crud::CrudMessages;
use super::entity_page::{EntitySchema, FormPage};
use super::enums::EnumLoader;
use crate::console::{
    app::Screen,
    components::{Column, FieldSet, FormField},
};
use crate::models::{option_label, Doctor, DoctorInput, EnumKind};

pub struct DoctorSchema;

pub type DoctorPage = FormPage<DoctorSchema>;

impl EntitySchema for DoctorSchema {
    type Record = Doctor;
    type Input = DoctorInput;

    const SCREEN: Screen = Screen::Doctor;
    const FORM_TITLE: &'static str = "Cadastro de Médico";
    const EDIT_TITLE: &'static str = "Editar Médico";
    const LIST_TITLE: &'static str = "Lista de Médicos";

    fn messages() -> CrudMessages {
        CrudMessages {
            load_error: "Não foi possível carregar a lista de médicos.",
            created: "Médico cadastrado com sucesso!",
            updated: "Médico atualizado com sucesso!",
            deleted_summary: "Médico excluído",
            deleted: "O médico foi excluído com sucesso.",
            save_error: "Erro ao salvar médico",
            delete_error: "Não foi possível excluir o médico.",
            confirm: "Deseja realmente excluir o médico {itemName}?",
        }
    }

    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Nome").required("Nome é obrigatório"),
            FormField::text("cpf", "CPF").required("CPF é obrigatório"),
            FormField::select("gender", "Gênero").required("Gênero é obrigatório"),
            FormField::text("phone", "Telefone"),
            FormField::text("crm", "CRM").required("CRM é obrigatório"),
            FormField::text("registration", "Matrícula").required("Matrícula é obrigatória"),
        ]
    }

    fn enum_fields() -> &'static [(&'static str, EnumKind)] {
        &[("gender", EnumKind::Gender)]
    }

    fn columns(enums: &EnumLoader) -> Vec<Column<Doctor>> {
        let genders = enums.options(EnumKind::Gender);
        vec![
            Column::new("name", "Nome"),
            Column::new("cpf", "CPF"),
            Column::new("crm", "CRM"),
            Column::new("registration", "Matrícula"),
            Column::new("gender", "Gênero")
                .with_render(move |d: &Doctor| option_label(&genders, &d.gender)),
            Column::new("phone", "Telefone"),
        ]
    }

    fn read_form(form: &FieldSet) -> DoctorInput {
        DoctorInput {
            name: form.value("name"),
            cpf: form.value("cpf"),
            phone: form.value("phone"),
            crm: form.value("crm"),
            registration: form.value("registration"),
            gender: form.value("gender"),
        }
    }

    fn fill_form(record: &Doctor, form: &mut FieldSet) {
        form.set_value("name", &record.name);
        form.set_value("cpf", &record.cpf);
        form.set_value("phone", &record.phone);
        form.set_value("crm", &record.crm);
        form.set_value("registration", &record.registration);
        form.set_value("gender", &record.gender);
    }

    fn display_name(record: &Doctor) -> String {
        record.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::events::{AppEvent, Notifier};
    use crate::console::screens::crud::testing::{MemoryService, StaticEnums};
    use crate::console::traits::Page;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    type Service = MemoryService<Doctor, DoctorInput>;

    fn make(id: &str, input: &DoctorInput) -> Doctor {
        Doctor {
            id: id.to_string(),
            name: input.name.clone(),
            cpf: input.cpf.clone(),
            phone: input.phone.clone(),
            crm: input.crm.clone(),
            registration: input.registration.clone(),
            gender: input.gender.clone(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gender_column_uses_loaded_labels() {
        let doctor = make("1", &DoctorInput {
            name: "Carlos".to_string(),
            gender: "MALE".to_string(),
            ..Default::default()
        });
        let (tx, _rx) = mpsc::unbounded_channel::<AppEvent>();
        let mut enums = EnumLoader::new(Arc::new(StaticEnums), Notifier::new(tx));
        enums.mount(&[EnumKind::Gender]);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(enums.poll(), vec![EnumKind::Gender]);

        let columns = DoctorSchema::columns(&enums);
        assert_eq!(columns[4].text(&doctor), "Masculino");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_crm_and_registration_are_reported() {
        let service = Arc::new(Service::new(Vec::new(), make));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut page = DoctorPage::new(service.clone(), Arc::new(StaticEnums), Notifier::new(tx));
        page.on_enter();
        page.form_mut().set_value("name", "Carlos");
        page.form_mut().set_value("cpf", "111");
        page.form_mut().set_value("gender", "MALE");

        assert!(!page.submit());
        let detail = std::iter::from_fn(|| rx.try_recv().ok())
            .find_map(|e| match e {
                AppEvent::Notify(m) => m.detail,
                _ => None,
            });
        assert_eq!(
            detail.as_deref(),
            Some("CRM é obrigatório\nMatrícula é obrigatória")
        );
        assert!(service.calls().iter().all(|c| c == "list"));
    }
}
