use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::api::{ListService, Services};
use crate::console::components::{data_table::TableView, DataTable};
use crate::console::events::Notifier;
use crate::console::screens::{
    doctor::DoctorSchema, enums::EnumLoader, hospital, patient::PatientSchema,
    regulatory_doctor::RegulatoryDoctorSchema, request, specialty::SpecialtySchema, EntitySchema,
};
use crate::models::EnumKind;

#[derive(Parser)]
#[command(name = "drtransfer")]
#[command(about = "Terminal administration console for hospital patient transfers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the REST API (overrides DRTRANSFER_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Page opened at startup (/, /patient, /doctor, /regulatory-doctor,
    /// /specialty, /hospital, /request, /transfer)
    #[arg(long, default_value = "/")]
    pub page: String,

    /// Run in CLI mode (print output and exit, no interactive console)
    #[arg(long, global = true)]
    pub cli: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every record of a collection
    List {
        /// Collection to list (patients, doctors, regulatory-doctors,
        /// specialties, hospitals, requests)
        entity: String,
    },
}

/// Collections that can be listed from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Patients,
    Doctors,
    RegulatoryDoctors,
    Specialties,
    Hospitals,
    Requests,
}

impl Commands {
    pub fn parse_entity(s: &str) -> Result<Entity> {
        match s.to_lowercase().as_str() {
            "patients" | "patient" => Ok(Entity::Patients),
            "doctors" | "doctor" => Ok(Entity::Doctors),
            "regulatory-doctors" | "regulatory-doctor" | "regulatorydoctors" => {
                Ok(Entity::RegulatoryDoctors)
            }
            "specialties" | "specialty" => Ok(Entity::Specialties),
            "hospitals" | "hospital" => Ok(Entity::Hospitals),
            "requests" | "request" => Ok(Entity::Requests),
            _ => Err(anyhow!("Invalid entity: {}", s)),
        }
    }
}

async fn schema_view<S: EntitySchema>(
    service: &dyn ListService<Record = S::Record>,
    enums: &mut EnumLoader,
) -> Result<TableView> {
    let kinds: Vec<EnumKind> = S::enum_fields().iter().map(|(_, kind)| *kind).collect();
    enums.preload(&kinds).await?;
    let rows = service.list().await?;
    Ok(DataTable::new(S::columns(enums)).project(&rows))
}

/// Fetch a collection and project it through the same columns its page shows
pub async fn list_view(entity: Entity, services: &Services) -> Result<TableView> {
    // Nothing consumes toasts outside the console
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut enums = EnumLoader::new(services.enums.clone(), Notifier::new(tx));

    match entity {
        Entity::Patients => {
            schema_view::<PatientSchema>(services.patients.as_ref(), &mut enums).await
        }
        Entity::Doctors => schema_view::<DoctorSchema>(services.doctors.as_ref(), &mut enums).await,
        Entity::RegulatoryDoctors => {
            schema_view::<RegulatoryDoctorSchema>(services.regulatory_doctors.as_ref(), &mut enums)
                .await
        }
        Entity::Specialties => {
            schema_view::<SpecialtySchema>(services.specialties.as_ref(), &mut enums).await
        }
        Entity::Hospitals => {
            let rows = services.hospitals.list().await?;
            Ok(DataTable::new(hospital::columns()).project(&rows))
        }
        Entity::Requests => {
            enums.preload(&[EnumKind::Classification]).await?;
            let rows = services.requests.list().await?;
            Ok(DataTable::new(request::columns(&enums)).project(&rows))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entity_accepts_singular_and_plural() {
        assert_eq!(Commands::parse_entity("Patients").unwrap(), Entity::Patients);
        assert_eq!(
            Commands::parse_entity("regulatory-doctor").unwrap(),
            Entity::RegulatoryDoctors
        );
        assert_eq!(Commands::parse_entity("requests").unwrap(), Entity::Requests);
        assert!(Commands::parse_entity("transfers").is_err());
    }

    #[test]
    fn test_cli_parses_page_and_list_command() {
        let cli = Cli::parse_from(["drtransfer", "--page", "/hospital"]);
        assert_eq!(cli.page, "/hospital");
        assert!(cli.command.is_none());

        let cli = Cli::parse_from([
            "drtransfer",
            "list",
            "hospitals",
            "--cli",
            "--api-url",
            "http://api:8080",
        ]);
        assert!(cli.cli);
        assert_eq!(cli.api_url.as_deref(), Some("http://api:8080"));
        assert!(matches!(cli.command, Some(Commands::List { ref entity }) if entity == "hospitals"));
    }
}
