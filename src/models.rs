use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A row the console can list in a table or offer in an autocomplete.
///
/// Fields are addressed by their JSON (camelCase) name. `None` means the value
/// is missing on this record and renders as an empty cell.
pub trait Record {
    fn id(&self) -> &str;
    fn field(&self, name: &str) -> Option<String>;
}

/// Plain dropdown entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Enumeration entry served by `/enums/{kind}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumItem {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub value: String,
    pub label: String,
}

impl From<EnumItem> for SelectOption {
    fn from(item: EnumItem) -> Self {
        SelectOption {
            value: item.value,
            label: item.label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    Gender,
    BloodType,
    Classification,
}

impl EnumKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            EnumKind::Gender => "gender",
            EnumKind::BloodType => "bloodType",
            EnumKind::Classification => "classification",
        }
    }
}

/// Look up the label of an enum value, falling back to the raw value.
pub fn option_label(options: &[SelectOption], value: &str) -> String {
    options
        .iter()
        .find(|o| o.value == value)
        .map(|o| o.label.clone())
        .unwrap_or_else(|| value.to_string())
}

/// Identifiers are opaque: the backend sends strings for most entities and
/// numbers for a few, both are kept as strings.
pub fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}

/// [`opaque_id`] for identifiers that may be absent or null
pub fn opaque_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "opaque_id")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(id)| id))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub gender: String,
    pub phone: String,
    pub blood_type: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub name: String,
    pub cpf: String,
    pub gender: String,
    pub phone: String,
    pub blood_type: String,
    pub birth_date: String,
}

impl Record for Patient {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => non_empty(&self.id),
            "name" => non_empty(&self.name),
            "cpf" => non_empty(&self.cpf),
            "gender" => non_empty(&self.gender),
            "phone" => non_empty(&self.phone),
            "bloodType" => non_empty(&self.blood_type),
            "birthDate" => non_empty(&self.birth_date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub phone: String,
    pub crm: String,
    pub registration: String,
    pub gender: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInput {
    pub name: String,
    pub cpf: String,
    pub phone: String,
    pub crm: String,
    pub registration: String,
    pub gender: String,
}

impl Record for Doctor {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => non_empty(&self.id),
            "name" => non_empty(&self.name),
            "cpf" => non_empty(&self.cpf),
            "phone" => non_empty(&self.phone),
            "crm" => non_empty(&self.crm),
            "registration" => non_empty(&self.registration),
            "gender" => non_empty(&self.gender),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryDoctor {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub phone: String,
    pub crm: String,
    pub insurance: String,
    pub gender: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryDoctorInput {
    pub name: String,
    pub cpf: String,
    pub phone: String,
    pub crm: String,
    pub insurance: String,
    pub gender: String,
}

impl Record for RegulatoryDoctor {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => non_empty(&self.id),
            "name" => non_empty(&self.name),
            "cpf" => non_empty(&self.cpf),
            "phone" => non_empty(&self.phone),
            "crm" => non_empty(&self.crm),
            "insurance" => non_empty(&self.insurance),
            "gender" => non_empty(&self.gender),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specialty {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyInput {
    pub name: String,
    pub description: String,
}

impl Record for Specialty {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => non_empty(&self.id),
            "name" => non_empty(&self.name),
            "description" => self.description.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub available_beds: i64,
}

impl Record for Hospital {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => non_empty(&self.id),
            "name" => non_empty(&self.name),
            "address" => self.address.clone(),
            "phone" => self.phone.clone(),
            "availableBeds" => Some(self.available_beds.to_string()),
            _ => None,
        }
    }
}

/// Transfer request as served by `/requests`, plus the patient and specialty
/// it points at once resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub patient_id: String,
    #[serde(deserialize_with = "opaque_id")]
    pub specialty_id: String,
    pub classification: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub patient: Option<Patient>,
    #[serde(skip)]
    pub specialty: Option<Specialty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequestInput {
    pub patient_id: String,
    pub specialty_id: String,
    pub classification: String,
}

impl TransferRequest {
    pub fn patient_name(&self) -> Option<&str> {
        self.patient.as_ref().map(|p| p.name.as_str())
    }

    pub fn specialty_name(&self) -> Option<&str> {
        self.specialty.as_ref().map(|s| s.name.as_str())
    }
}

impl Record for TransferRequest {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => non_empty(&self.id),
            "patientId" => non_empty(&self.patient_id),
            "specialtyId" => non_empty(&self.specialty_id),
            "classification" => non_empty(&self.classification),
            "patient" => self.patient_name().map(str::to_string),
            "specialty" => self.specialty_name().map(str::to_string),
            "createdAt" => self.created_at.map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
            "updatedAt" => self.updated_at.map(|d| d.format("%Y-%m-%d %H:%M").to_string()),
            _ => None,
        }
    }
}

/// Means of transport chosen when a request is transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transport {
    #[default]
    Land,
    Plane,
    Helicopter,
}

impl Transport {
    pub const ALL: [Transport; 3] = [Transport::Land, Transport::Plane, Transport::Helicopter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Land => "LAND",
            Transport::Plane => "PLANE",
            Transport::Helicopter => "HELICOPTER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transport::Land => "Terrestre",
            Transport::Plane => "Avião",
            Transport::Helicopter => "Helicóptero",
        }
    }
}
