use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a housing unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Estado {
    /// Free, available for sale
    Libre,
    /// Temporarily held by a manager
    Bloqueada,
    /// Reserved by a buyer
    Reservada,
}

impl Estado {
    /// Every valid state, in display order
    pub const ALL: [Estado; 3] = [Estado::Libre, Estado::Bloqueada, Estado::Reservada];

    /// Wire/storage code of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Libre => "LIBRE",
            Estado::Bloqueada => "BLOQUEADA",
            Estado::Reservada => "RESERVADA",
        }
    }

    /// Comma separated list of the valid codes, used in validation messages
    pub fn valid_codes() -> String {
        Self::ALL
            .iter()
            .map(Estado::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estado {
    type Err = EstadoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIBRE" => Ok(Estado::Libre),
            "BLOQUEADA" => Ok(Estado::Bloqueada),
            "RESERVADA" => Ok(Estado::Reservada),
            other => Err(EstadoParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstadoParseError(pub String);

impl fmt::Display for EstadoParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid estado '{}', expected one of: {}",
            self.0,
            Estado::valid_codes()
        )
    }
}

impl std::error::Error for EstadoParseError {}

/// Kind of person that can be attached to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonKind {
    Gestor,
    Promotor,
}

impl PersonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonKind::Gestor => "GESTOR",
            PersonKind::Promotor => "PROMOTOR",
        }
    }
}

impl FromStr for PersonKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GESTOR" => Ok(PersonKind::Gestor),
            "PROMOTOR" => Ok(PersonKind::Promotor),
            other => Err(format!("Invalid person kind: {}", other)),
        }
    }
}

/// Role of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Gestor,
    Promotor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Gestor => "gestor",
            Role::Promotor => "promotor",
            Role::Viewer => "viewer",
        }
    }

    /// Only administrators and managers may run bulk imports
    pub fn can_import(&self) -> bool {
        matches!(self, Role::Admin | Role::Gestor)
    }

    /// Viewers are read-only; every other role may change a unit's estado
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin | Role::Gestor | Role::Promotor)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "gestor" => Ok(Role::Gestor),
            "promotor" => Ok(Role::Promotor),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

/// A manager or promoter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub kind: PersonKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    pub fn to_ref(&self) -> PersonRef {
        PersonRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Display data of a person referenced from another record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub name: String,
}

/// One sellable residential unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingUnit {
    pub id: Uuid,
    /// Unique human-readable code, see [`HousingUnit::compose_code`]
    pub code: String,
    pub portal: Option<String>,
    pub floor: Option<String>,
    pub letter: Option<String>,
    pub typology: Option<String>,
    pub orientation: Option<String>,
    pub bedrooms: Option<i32>,
    /// Usable surface including terrace (m²)
    pub surface_with_terrace: Option<f64>,
    /// Usable surface of the dwelling itself (m²)
    pub surface_interior: Option<f64>,
    /// Usable surface of the terraces (m²)
    pub surface_terraces: Option<f64>,
    pub final_price: Option<f64>,
    pub notes: Option<String>,
    pub estado: Estado,
    pub manager_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub manager: Option<PersonRef>,
    pub responsible: Option<PersonRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HousingUnit {
    /// Build the unique code of a unit from its portal, floor and letter.
    /// Floor and letter are separated so floor 1 door 12 and floor 11 door 2 stay distinct.
    pub fn compose_code(portal: &str, floor: &str, letter: &str) -> String {
        format!(
            "P{}-{}-{}",
            portal.trim().to_uppercase(),
            floor.trim().to_uppercase(),
            letter.trim().to_uppercase()
        )
    }
}

/// One audit record of a state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub id: Uuid,
    pub unit_id: Uuid,
    /// None only for the initial assignment of a newly created unit
    pub from_estado: Option<Estado>,
    pub to_estado: Estado,
    pub manager_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub reason: Option<String>,
    pub actor_user_id: Option<Uuid>,
    /// Display name of the acting user at the time of the change
    pub actor_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A state change joined with the display data shown in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub change: StateChange,
    pub unit_code: Option<String>,
    pub manager: Option<PersonRef>,
    pub responsible: Option<PersonRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Pendiente,
    Ok,
    Error,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pendiente => "PENDIENTE",
            ImportStatus::Ok => "OK",
            ImportStatus::Error => "ERROR",
        }
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" => Ok(ImportStatus::Pendiente),
            "OK" => Ok(ImportStatus::Ok),
            "ERROR" => Ok(ImportStatus::Error),
            other => Err(format!("Invalid import status: {}", other)),
        }
    }
}

/// A rejected spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRowError {
    /// Spreadsheet row number (1-based, header is row 1)
    pub row: usize,
    pub error: String,
    /// Raw cells of the row keyed by header
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// One record of a bulk import attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub filename: Option<String>,
    pub status: ImportStatus,
    pub total_rows: u32,
    pub ok_rows: u32,
    pub error_rows: u32,
    pub log: Vec<ImportRowError>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Request / response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitListResponse {
    pub units: Vec<HousingUnit>,
    /// Units loaded before filtering
    pub total: usize,
    /// Units left after filtering
    pub filtered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptionsResponse {
    pub portals: Vec<String>,
    pub typologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HousingUnitDetailResponse {
    pub unit: HousingUnit,
    /// Final price formatted for display, "—" when unknown
    pub price_display: String,
    pub created_display: String,
    pub updated_display: String,
    pub allowed_transitions: Vec<Estado>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEstadoRequest {
    pub new_estado: Estado,
    pub manager_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEstadoResponse {
    pub change: StateChange,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub entries: Vec<HistoryEntry>,
    pub total: usize,
    pub filtered: usize,
}

/// Display metadata for one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstadoInfo {
    pub estado: Estado,
    pub label: String,
    pub badge_class: String,
    pub color: String,
    pub icon: String,
    pub transitions: Vec<Estado>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstadoCounts {
    pub total: usize,
    pub libres: usize,
    pub bloqueadas: usize,
    pub reservadas: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstadoShare {
    pub estado: Estado,
    pub label: String,
    pub value: usize,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub counts: EstadoCounts,
    pub distribution: Vec<EstadoShare>,
    pub recent_changes: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePersonRequest {
    pub name: String,
    pub email: Option<String>,
    pub kind: PersonKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreviewResponse {
    pub headers: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResponse {
    pub job_id: Uuid,
    pub total_rows: u32,
    pub ok_rows: u32,
    pub error_rows: u32,
    pub details: Vec<ImportRowError>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationFailureDto {
    pub state_change_id: Uuid,
    pub unit_code: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
