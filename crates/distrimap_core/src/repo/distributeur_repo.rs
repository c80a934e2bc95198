//! Distributeur repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over `distributeurs` and their images.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Distributeur::validate()` before any SQL mutation.
//! - A distributeur row and its image rows are always written in one
//!   transaction; a failed image insert leaves no partial row behind.
//! - Listing never performs geospatial filtering; callers rank results with
//!   `geo::filter_by_radius`.
//! - Default order is newest first (`created_at DESC`, insertion order on ties).

use crate::db::{ensure_directory_schema, DbError};
use crate::model::distributeur::{
    Distributeur, DistributeurId, DistributeurImage, DistributeurStatus,
    DistributeurValidationError,
};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DISTRIBUTEUR_SELECT_SQL: &str = "SELECT
    id,
    nom,
    type,
    adresse,
    ville,
    latitude,
    longitude,
    description,
    telephone,
    horaires,
    statut,
    created_at,
    updated_at
FROM distributeurs";

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for distributeur persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(DistributeurValidationError),
    Db(DbError),
    NotFound(DistributeurId),
    AlreadyExists(DistributeurId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "distributeur not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "distributeur already exists: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted distributeur data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DistributeurValidationError> for RepoError {
    fn from(value: DistributeurValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter and pagination options for listing distributeurs.
///
/// Blank string filters are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributeurListQuery {
    /// Exact match on `type`.
    pub kind: Option<String>,
    /// Exact match on `ville`, ASCII case-insensitive.
    pub ville: Option<String>,
    /// Substring match over nom, adresse, description and ville.
    pub text: Option<String>,
    pub statut: Option<DistributeurStatus>,
    /// `None` returns every matching row.
    pub limit: Option<u32>,
    pub offset: u32,
}

impl DistributeurListQuery {
    /// Same filters, no pagination.
    pub fn unpaginated(&self) -> Self {
        Self {
            limit: None,
            offset: 0,
            ..self.clone()
        }
    }
}

/// Aggregated counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub total: u64,
    pub by_statut: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    pub by_ville: BTreeMap<String, u64>,
}

/// Repository interface for the distributeur directory.
pub trait DistributeurRepository {
    /// Inserts one distributeur with its images and returns its stable id.
    fn create_distributeur(&mut self, distributeur: &Distributeur) -> RepoResult<DistributeurId>;
    /// Replaces all mutable fields and the whole image set.
    fn update_distributeur(&mut self, distributeur: &Distributeur) -> RepoResult<()>;
    fn get_distributeur(&self, id: DistributeurId) -> RepoResult<Option<Distributeur>>;
    fn list_distributeurs(&self, query: &DistributeurListQuery) -> RepoResult<Vec<Distributeur>>;
    /// Hard-deletes one distributeur; its images cascade.
    fn delete_distributeur(&mut self, id: DistributeurId) -> RepoResult<()>;
    /// Distinct cities, case folded like the `ville` filter, sorted case-insensitively.
    fn list_villes(&self) -> RepoResult<Vec<String>>;
    /// Distinct types, sorted case-insensitively.
    fn list_types(&self) -> RepoResult<Vec<String>>;
    fn directory_stats(&self) -> RepoResult<DirectoryStats>;
}

/// SQLite-backed distributeur repository.
pub struct SqliteDistributeurRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteDistributeurRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `RepoError::Db` when the directory tables are missing or incomplete.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_directory_schema(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection whose schema the caller already checked with
    /// `ensure_directory_schema`, e.g. once per long-lived connection.
    pub fn from_verified(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl DistributeurRepository for SqliteDistributeurRepository<'_> {
    fn create_distributeur(&mut self, distributeur: &Distributeur) -> RepoResult<DistributeurId> {
        distributeur.validate()?;

        let id_text = distributeur.id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if distributeur_exists_in_tx(&tx, &id_text)? {
            return Err(RepoError::AlreadyExists(distributeur.id));
        }

        tx.execute(
            "INSERT INTO distributeurs (
                id,
                nom,
                type,
                adresse,
                ville,
                latitude,
                longitude,
                description,
                telephone,
                horaires,
                statut
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                id_text,
                distributeur.nom.trim(),
                distributeur.kind.trim(),
                distributeur.adresse.as_deref(),
                distributeur.ville.trim(),
                distributeur.latitude,
                distributeur.longitude,
                distributeur.description.as_deref(),
                distributeur.telephone.as_deref(),
                distributeur.horaires.as_deref(),
                distributeur.statut.as_str(),
            ],
        )?;
        insert_images_in_tx(&tx, &id_text, &distributeur.images)?;
        tx.commit()?;

        info!(
            "event=distributeur_create module=repo status=ok id={} images={}",
            id_text,
            distributeur.images.len()
        );
        Ok(distributeur.id)
    }

    fn update_distributeur(&mut self, distributeur: &Distributeur) -> RepoResult<()> {
        distributeur.validate()?;

        let id_text = distributeur.id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE distributeurs
                 SET
                    nom = ?2,
                    type = ?3,
                    adresse = ?4,
                    ville = ?5,
                    latitude = ?6,
                    longitude = ?7,
                    description = ?8,
                    telephone = ?9,
                    horaires = ?10,
                    statut = ?11,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id_text,
                distributeur.nom.trim(),
                distributeur.kind.trim(),
                distributeur.adresse.as_deref(),
                distributeur.ville.trim(),
                distributeur.latitude,
                distributeur.longitude,
                distributeur.description.as_deref(),
                distributeur.telephone.as_deref(),
                distributeur.horaires.as_deref(),
                distributeur.statut.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(distributeur.id));
        }

        tx.execute(
            "DELETE FROM distributeur_images WHERE distributeur_id = ?1;",
            [id_text.as_str()],
        )?;
        insert_images_in_tx(&tx, &id_text, &distributeur.images)?;
        tx.commit()?;

        info!(
            "event=distributeur_update module=repo status=ok id={} images={}",
            id_text,
            distributeur.images.len()
        );
        Ok(())
    }

    fn get_distributeur(&self, id: DistributeurId) -> RepoResult<Option<Distributeur>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DISTRIBUTEUR_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut distributeur = parse_distributeur_row(row)?;
            distributeur.images = load_images(self.conn, &distributeur.id.to_string())?;
            return Ok(Some(distributeur));
        }

        Ok(None)
    }

    fn list_distributeurs(&self, query: &DistributeurListQuery) -> RepoResult<Vec<Distributeur>> {
        let mut sql = format!("{DISTRIBUTEUR_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = non_blank(query.kind.as_deref()) {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.to_string()));
        }

        if let Some(ville) = non_blank(query.ville.as_deref()) {
            sql.push_str(" AND ville = ? COLLATE NOCASE");
            bind_values.push(Value::Text(ville.to_string()));
        }

        if let Some(statut) = query.statut {
            sql.push_str(" AND statut = ?");
            bind_values.push(Value::Text(statut.as_str().to_string()));
        }

        if let Some(text) = non_blank(query.text.as_deref()) {
            sql.push_str(
                " AND (
                    nom LIKE ?1 ESCAPE '\\'
                    OR ifnull(adresse, '') LIKE ?1 ESCAPE '\\'
                    OR ifnull(description, '') LIKE ?1 ESCAPE '\\'
                    OR ville LIKE ?1 ESCAPE '\\'
                )"
                .replace("?1", &format!("?{}", bind_values.len() + 1))
                .as_str(),
            );
            bind_values.push(Value::Text(like_pattern(text)));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                bind_values.push(Value::Integer(i64::from(limit)));
                bind_values.push(Value::Integer(i64::from(offset)));
            }
            (None, 0) => {}
            (None, offset) => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                bind_values.push(Value::Integer(i64::from(offset)));
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut distributeurs = Vec::new();
        while let Some(row) = rows.next()? {
            let mut distributeur = parse_distributeur_row(row)?;
            distributeur.images = load_images(self.conn, &distributeur.id.to_string())?;
            distributeurs.push(distributeur);
        }

        Ok(distributeurs)
    }

    fn delete_distributeur(&mut self, id: DistributeurId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM distributeurs WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=distributeur_delete module=repo status=ok id={id}");
        Ok(())
    }

    fn list_villes(&self) -> RepoResult<Vec<String>> {
        distinct_values(self.conn, GroupKey::VILLE)
    }

    fn list_types(&self) -> RepoResult<Vec<String>> {
        distinct_values(self.conn, GroupKey::TYPE)
    }

    fn directory_stats(&self) -> RepoResult<DirectoryStats> {
        let total: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM distributeurs;", [], |row| row.get(0))?;

        Ok(DirectoryStats {
            total: to_count(total)?,
            by_statut: grouped_counts(self.conn, GroupKey::STATUT)?,
            by_type: grouped_counts(self.conn, GroupKey::TYPE)?,
            by_ville: grouped_counts(self.conn, GroupKey::VILLE)?,
        })
    }
}

fn insert_images_in_tx(
    tx: &Transaction<'_>,
    distributeur_id: &str,
    images: &[DistributeurImage],
) -> RepoResult<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO distributeur_images (distributeur_id, url, position)
         VALUES (?1, ?2, ?3);",
    )?;
    for image in images {
        if let Err(err) = stmt.execute(params![distributeur_id, image.url.trim(), image.position])
        {
            error!(
                "event=distributeur_images module=repo status=error id={} error={}",
                distributeur_id, err
            );
            return Err(err.into());
        }
    }
    Ok(())
}

fn load_images(conn: &Connection, distributeur_id: &str) -> RepoResult<Vec<DistributeurImage>> {
    let mut stmt = conn.prepare_cached(
        "SELECT url, position
         FROM distributeur_images
         WHERE distributeur_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([distributeur_id])?;
    let mut images = Vec::new();
    while let Some(row) = rows.next()? {
        images.push(DistributeurImage {
            url: row.get("url")?,
            position: row.get("position")?,
        });
    }
    Ok(images)
}

fn distributeur_exists_in_tx(tx: &Transaction<'_>, id: &str) -> RepoResult<bool> {
    let found = tx
        .query_row(
            "SELECT 1 FROM distributeurs WHERE id = ?1;",
            [id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Column plus the collation its listing filter matches with, so lookup
/// values and counts line up with what filtering returns.
#[derive(Debug, Clone, Copy)]
struct GroupKey {
    column: &'static str,
    collation: &'static str,
}

impl GroupKey {
    const TYPE: Self = Self {
        column: "type",
        collation: "BINARY",
    };
    const VILLE: Self = Self {
        column: "ville",
        collation: "NOCASE",
    };
    const STATUT: Self = Self {
        column: "statut",
        collation: "BINARY",
    };
}

fn distinct_values(conn: &Connection, key: GroupKey) -> RepoResult<Vec<String>> {
    let GroupKey { column, collation } = key;
    let mut stmt = conn.prepare(&format!(
        "SELECT MIN({column})
         FROM distributeurs
         GROUP BY {column} COLLATE {collation}
         ORDER BY MIN({column}) COLLATE NOCASE ASC, MIN({column}) ASC;"
    ))?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
}

fn grouped_counts(conn: &Connection, key: GroupKey) -> RepoResult<BTreeMap<String, u64>> {
    let GroupKey { column, collation } = key;
    let mut stmt = conn.prepare(&format!(
        "SELECT MIN({column}), COUNT(*)
         FROM distributeurs
         GROUP BY {column} COLLATE {collation};"
    ))?;
    let mut rows = stmt.query([])?;
    let mut counts = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        counts.insert(key, to_count(count)?);
    }
    Ok(counts)
}

fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative count {value}")))
}

fn parse_distributeur_row(row: &Row<'_>) -> RepoResult<Distributeur> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in distributeurs.id"))
    })?;

    let statut_text: String = row.get("statut")?;
    let statut = DistributeurStatus::parse(&statut_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid statut `{statut_text}` in distributeurs.statut"
        ))
    })?;

    Ok(Distributeur {
        id,
        nom: row.get("nom")?,
        kind: row.get("type")?,
        adresse: row.get("adresse")?,
        ville: row.get("ville")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        description: row.get("description")?,
        telephone: row.get("telephone")?,
        horaires: row.get("horaires")?,
        statut,
        images: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Builds a `%term%` pattern with LIKE wildcards escaped by `\`.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
