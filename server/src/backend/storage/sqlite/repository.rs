use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use shared::{
    Estado, HistoryEntry, HousingUnit, ImportJob, ImportRowError, ImportStatus, Person,
    PersonKind, PersonRef, StateChange,
};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use uuid::Uuid;

use crate::backend::domain::commands::{
    import::{UnitUpsert, UpsertOutcome},
    state_change::{Actor, ChangeEstadoCommand},
};
use crate::backend::storage::sqlite::connection::DbConnection;
use crate::backend::storage::traits::InventoryRepository;

const UNIT_COLUMNS: &str = r#"
    u.id, u.code, u.portal, u.floor, u.letter, u.typology, u.orientation, u.bedrooms,
    u.surface_with_terrace, u.surface_interior, u.surface_terraces, u.final_price, u.notes,
    u.estado, u.manager_id, u.responsible_id, u.created_at, u.updated_at,
    m.name AS manager_name, r.name AS responsible_name
"#;

const PERSON_COLUMNS: &str = "id, name, email, kind, active, created_at, updated_at";

/// SQLite implementation of the inventory repository
#[derive(Clone)]
pub struct SqliteRepository {
    db: DbConnection,
}

impl SqliteRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventoryRepository for SqliteRepository {
    async fn list_units(&self) -> Result<Vec<HousingUnit>> {
        let sql = format!(
            r#"
            SELECT {UNIT_COLUMNS}
            FROM housing_units u
            LEFT JOIN persons m ON m.id = u.manager_id
            LEFT JOIN persons r ON r.id = u.responsible_id
            ORDER BY u.code ASC
            "#
        );

        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        rows.iter().map(unit_from_row).collect()
    }

    async fn get_unit(&self, unit_id: Uuid) -> Result<Option<HousingUnit>> {
        let sql = format!(
            r#"
            SELECT {UNIT_COLUMNS}
            FROM housing_units u
            LEFT JOIN persons m ON m.id = u.manager_id
            LEFT JOIN persons r ON r.id = u.responsible_id
            WHERE u.id = ?
            "#
        );

        let row = sqlx::query(&sql)
            .bind(unit_id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(unit_from_row).transpose()
    }

    async fn upsert_unit(&self, unit: &UnitUpsert, actor: &Actor, reason: &str) -> Result<UpsertOutcome> {
        let mut tx = self.db.pool().begin().await?;
        lock_unit(&mut *tx, "code", &unit.code).await?;
        let now = Utc::now();

        let existing = sqlx::query("SELECT id, estado FROM housing_units WHERE code = ?")
            .bind(&unit.code)
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = match existing {
            Some(row) => {
                let unit_id = parse_uuid(&row.try_get::<String, _>("id")?)?;
                let previous = parse_estado(&row.try_get::<String, _>("estado")?)?;

                sqlx::query(
                    r#"
                    UPDATE housing_units
                    SET portal = ?, floor = ?, letter = ?, typology = ?, orientation = ?,
                        bedrooms = ?, surface_with_terrace = ?, surface_interior = ?,
                        surface_terraces = ?, final_price = ?, notes = ?, estado = ?,
                        manager_id = ?, responsible_id = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&unit.portal)
                .bind(&unit.floor)
                .bind(&unit.letter)
                .bind(&unit.typology)
                .bind(&unit.orientation)
                .bind(unit.bedrooms)
                .bind(unit.surface_with_terrace)
                .bind(unit.surface_interior)
                .bind(unit.surface_terraces)
                .bind(unit.final_price)
                .bind(&unit.notes)
                .bind(unit.estado.as_str())
                .bind(unit.manager_id.map(|id| id.to_string()))
                .bind(unit.responsible_id.map(|id| id.to_string()))
                .bind(now)
                .bind(unit_id.to_string())
                .execute(&mut *tx)
                .await?;

                let estado_changed = previous != unit.estado;
                if estado_changed {
                    let change = new_change(unit_id, Some(previous), unit, actor, reason);
                    insert_state_change(&mut *tx, &change).await?;
                }

                UpsertOutcome::Updated { unit_id, estado_changed }
            }
            None => {
                let unit_id = Uuid::new_v4();

                sqlx::query(
                    r#"
                    INSERT INTO housing_units (
                        id, code, portal, floor, letter, typology, orientation, bedrooms,
                        surface_with_terrace, surface_interior, surface_terraces, final_price,
                        notes, estado, manager_id, responsible_id, created_at, updated_at
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(unit_id.to_string())
                .bind(&unit.code)
                .bind(&unit.portal)
                .bind(&unit.floor)
                .bind(&unit.letter)
                .bind(&unit.typology)
                .bind(&unit.orientation)
                .bind(unit.bedrooms)
                .bind(unit.surface_with_terrace)
                .bind(unit.surface_interior)
                .bind(unit.surface_terraces)
                .bind(unit.final_price)
                .bind(&unit.notes)
                .bind(unit.estado.as_str())
                .bind(unit.manager_id.map(|id| id.to_string()))
                .bind(unit.responsible_id.map(|id| id.to_string()))
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                let change = new_change(unit_id, None, unit, actor, reason);
                insert_state_change(&mut *tx, &change).await?;

                UpsertOutcome::Inserted { unit_id }
            }
        };

        tx.commit().await?;
        debug!("Upserted unit {}: {:?}", unit.code, outcome);
        Ok(outcome)
    }

    async fn list_persons(&self, active_only: bool) -> Result<Vec<Person>> {
        let sql = if active_only {
            format!("SELECT {PERSON_COLUMNS} FROM persons WHERE active = 1 ORDER BY name ASC")
        } else {
            format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY name ASC")
        };

        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        rows.iter().map(person_from_row).collect()
    }

    async fn get_person(&self, person_id: Uuid) -> Result<Option<Person>> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(person_id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(person_from_row).transpose()
    }

    async fn insert_person(&self, person: &Person) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO persons (id, name, email, kind, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(person.id.to_string())
        .bind(&person.name)
        .bind(&person.email)
        .bind(person.kind.as_str())
        .bind(person.active)
        .bind(person.created_at)
        .bind(person.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn change_estado(&self, command: &ChangeEstadoCommand) -> Result<StateChange> {
        let mut tx = self.db.pool().begin().await?;

        let unit_id = command.unit_id.to_string();
        if !lock_unit(&mut *tx, "id", &unit_id).await? {
            bail!("Vivienda no encontrada: {}", command.unit_id);
        }

        let row = sqlx::query("SELECT estado FROM housing_units WHERE id = ?")
            .bind(&unit_id)
            .fetch_one(&mut *tx)
            .await?;
        let previous = parse_estado(&row.try_get::<String, _>("estado")?)?;

        if previous == command.new_estado {
            bail!("La vivienda ya está en estado {}", previous);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE housing_units
            SET estado = ?, manager_id = ?, responsible_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(command.new_estado.as_str())
        .bind(command.manager_id.map(|id| id.to_string()))
        .bind(command.responsible_id.map(|id| id.to_string()))
        .bind(now)
        .bind(&unit_id)
        .execute(&mut *tx)
        .await?;

        let change = StateChange {
            id: Uuid::new_v4(),
            unit_id: command.unit_id,
            from_estado: Some(previous),
            to_estado: command.new_estado,
            manager_id: command.manager_id,
            responsible_id: command.responsible_id,
            reason: command.reason.clone(),
            actor_user_id: Some(command.actor.user_id),
            actor_name: command.actor.name.clone(),
            created_at: now,
        };
        insert_state_change(&mut *tx, &change).await?;

        tx.commit().await?;
        info!(
            "Unit {} changed from {} to {}",
            command.unit_id, previous, command.new_estado
        );
        Ok(change)
    }

    async fn list_history(&self, limit: Option<u32>) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.unit_id, c.from_estado, c.to_estado, c.manager_id, c.responsible_id,
                   c.reason, c.actor_user_id, c.actor_name, c.created_at,
                   u.code AS unit_code, m.name AS manager_name, r.name AS responsible_name
            FROM state_changes c
            LEFT JOIN housing_units u ON u.id = c.unit_id
            LEFT JOIN persons m ON m.id = c.manager_id
            LEFT JOIN persons r ON r.id = c.responsible_id
            ORDER BY c.created_at DESC, c.rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit.map(i64::from).unwrap_or(-1))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(history_entry_from_row).collect()
    }

    async fn append_import_job(&self, job: &ImportJob) -> Result<()> {
        let log = serde_json::to_string(&job.log).context("Failed to serialize import log")?;

        sqlx::query(
            r#"
            INSERT INTO import_jobs (id, filename, status, total_rows, ok_rows, error_rows, log, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.id.to_string())
        .bind(&job.filename)
        .bind(job.status.as_str())
        .bind(i64::from(job.total_rows))
        .bind(i64::from(job.ok_rows))
        .bind(i64::from(job.error_rows))
        .bind(log)
        .bind(job.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_import_jobs(&self, limit: Option<u32>) -> Result<Vec<ImportJob>> {
        let rows = sqlx::query(
            r#"
            SELECT id, filename, status, total_rows, ok_rows, error_rows, log, created_at
            FROM import_jobs
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit.map(i64::from).unwrap_or(-1))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(import_job_from_row).collect()
    }
}

fn new_change(
    unit_id: Uuid,
    from_estado: Option<Estado>,
    unit: &UnitUpsert,
    actor: &Actor,
    reason: &str,
) -> StateChange {
    StateChange {
        id: Uuid::new_v4(),
        unit_id,
        from_estado,
        to_estado: unit.estado,
        manager_id: unit.manager_id,
        responsible_id: unit.responsible_id,
        reason: Some(reason.to_string()),
        actor_user_id: Some(actor.user_id),
        actor_name: actor.name.clone(),
        created_at: Utc::now(),
    }
}

/// Take the database write lock for the rest of the transaction.
///
/// A deferred transaction that reads first has to upgrade its lock when it
/// writes, and SQLite refuses that upgrade to one of two racing writers. A
/// write as the first statement waits on `busy_timeout` instead. The update
/// leaves the row unchanged; returns whether a unit matched.
async fn lock_unit(conn: &mut SqliteConnection, key_column: &str, key: &str) -> Result<bool> {
    let sql = format!("UPDATE housing_units SET updated_at = updated_at WHERE {} = ?", key_column);
    let result = sqlx::query(&sql).bind(key).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

async fn insert_state_change(conn: &mut SqliteConnection, change: &StateChange) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO state_changes (
            id, unit_id, from_estado, to_estado, manager_id, responsible_id,
            reason, actor_user_id, actor_name, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(change.id.to_string())
    .bind(change.unit_id.to_string())
    .bind(change.from_estado.map(|e| e.as_str()))
    .bind(change.to_estado.as_str())
    .bind(change.manager_id.map(|id| id.to_string()))
    .bind(change.responsible_id.map(|id| id.to_string()))
    .bind(&change.reason)
    .bind(change.actor_user_id.map(|id| id.to_string()))
    .bind(&change.actor_name)
    .bind(change.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid UUID in database: {}", value))
}

fn parse_optional_uuid(value: Option<String>) -> Result<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

fn parse_estado(value: &str) -> Result<Estado> {
    Ok(value.parse::<Estado>()?)
}

fn person_ref(id: Option<Uuid>, name: Option<String>) -> Option<PersonRef> {
    match (id, name) {
        (Some(id), Some(name)) => Some(PersonRef { id, name }),
        _ => None,
    }
}

fn unit_from_row(row: &SqliteRow) -> Result<HousingUnit> {
    let manager_id = parse_optional_uuid(row.try_get("manager_id")?)?;
    let responsible_id = parse_optional_uuid(row.try_get("responsible_id")?)?;

    Ok(HousingUnit {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        code: row.try_get("code")?,
        portal: row.try_get("portal")?,
        floor: row.try_get("floor")?,
        letter: row.try_get("letter")?,
        typology: row.try_get("typology")?,
        orientation: row.try_get("orientation")?,
        bedrooms: row.try_get("bedrooms")?,
        surface_with_terrace: row.try_get("surface_with_terrace")?,
        surface_interior: row.try_get("surface_interior")?,
        surface_terraces: row.try_get("surface_terraces")?,
        final_price: row.try_get("final_price")?,
        notes: row.try_get("notes")?,
        estado: parse_estado(&row.try_get::<String, _>("estado")?)?,
        manager_id,
        responsible_id,
        manager: person_ref(manager_id, row.try_get("manager_name")?),
        responsible: person_ref(responsible_id, row.try_get("responsible_name")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn person_from_row(row: &SqliteRow) -> Result<Person> {
    let kind: String = row.try_get("kind")?;
    Ok(Person {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        kind: kind.parse::<PersonKind>().map_err(anyhow::Error::msg)?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn history_entry_from_row(row: &SqliteRow) -> Result<HistoryEntry> {
    let manager_id = parse_optional_uuid(row.try_get("manager_id")?)?;
    let responsible_id = parse_optional_uuid(row.try_get("responsible_id")?)?;
    let from_estado: Option<String> = row.try_get("from_estado")?;

    let change = StateChange {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        unit_id: parse_uuid(&row.try_get::<String, _>("unit_id")?)?,
        from_estado: from_estado.as_deref().map(parse_estado).transpose()?,
        to_estado: parse_estado(&row.try_get::<String, _>("to_estado")?)?,
        manager_id,
        responsible_id,
        reason: row.try_get("reason")?,
        actor_user_id: parse_optional_uuid(row.try_get("actor_user_id")?)?,
        actor_name: row.try_get("actor_name")?,
        created_at: row.try_get("created_at")?,
    };

    Ok(HistoryEntry {
        change,
        unit_code: row.try_get("unit_code")?,
        manager: person_ref(manager_id, row.try_get("manager_name")?),
        responsible: person_ref(responsible_id, row.try_get("responsible_name")?),
    })
}

fn import_job_from_row(row: &SqliteRow) -> Result<ImportJob> {
    let status: String = row.try_get("status")?;
    let log: String = row.try_get("log")?;
    let count = |column: &str| -> Result<u32> {
        let value: i64 = row.try_get(column)?;
        Ok(u32::try_from(value)?)
    };

    Ok(ImportJob {
        id: parse_uuid(&row.try_get::<String, _>("id")?)?,
        filename: row.try_get("filename")?,
        status: status.parse::<ImportStatus>().map_err(anyhow::Error::msg)?,
        total_rows: count("total_rows")?,
        ok_rows: count("ok_rows")?,
        error_rows: count("error_rows")?,
        log: serde_json::from_str::<Vec<ImportRowError>>(&log)
            .context("Invalid import log in database")?,
        created_at: row.try_get("created_at")?,
    })
}
