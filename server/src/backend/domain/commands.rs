//! Domain-level command types.
//! These structs are used by services inside the domain layer and by the
//! storage layer; they are **not** exposed over the public API. The REST
//! layer maps the public DTOs defined in the `shared` crate to these types.

pub mod state_change {
    use shared::Estado;
    use uuid::Uuid;

    /// Identity of the user performing a write, snapshotted into history.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Actor {
        pub user_id: Uuid,
        pub name: Option<String>,
    }

    /// Input of the atomic state change operation.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ChangeEstadoCommand {
        pub unit_id: Uuid,
        pub new_estado: Estado,
        pub manager_id: Option<Uuid>,
        pub responsible_id: Option<Uuid>,
        /// Trimmed reason, None when blank
        pub reason: Option<String>,
        pub actor: Actor,
    }
}

pub mod import {
    use shared::Estado;
    use uuid::Uuid;

    /// Attributes of a housing unit written by the import pipeline.
    #[derive(Debug, Clone, PartialEq)]
    pub struct UnitUpsert {
        pub code: String,
        pub portal: String,
        pub floor: String,
        pub letter: String,
        pub typology: Option<String>,
        pub orientation: Option<String>,
        pub bedrooms: Option<i32>,
        pub surface_with_terrace: Option<f64>,
        pub surface_interior: Option<f64>,
        pub surface_terraces: Option<f64>,
        pub final_price: Option<f64>,
        pub notes: Option<String>,
        pub estado: Estado,
        pub manager_id: Option<Uuid>,
        pub responsible_id: Option<Uuid>,
    }

    /// What an upsert did to the stored unit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UpsertOutcome {
        Inserted { unit_id: Uuid },
        Updated { unit_id: Uuid, estado_changed: bool },
    }

    impl UpsertOutcome {
        pub fn unit_id(&self) -> Uuid {
            match self {
                UpsertOutcome::Inserted { unit_id } => *unit_id,
                UpsertOutcome::Updated { unit_id, .. } => *unit_id,
            }
        }
    }
}
