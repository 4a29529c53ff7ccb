/*
 * Responsibility
 * - drinks CRUD (プロセス内ストア)
 * - title は一意 (重複は RepoError::Conflict)
 * - id はストアが採番する。削除済み id は再利用しない
 */
use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrinkRow {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

#[derive(Debug)]
struct DrinkTable {
    next_id: i64,
    rows: BTreeMap<i64, DrinkRow>,
}

impl DrinkTable {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|row| row.title == title && Some(row.id) != except)
    }
}

#[derive(Debug)]
pub struct DrinkRepo {
    table: RwLock<DrinkTable>,
}

impl Default for DrinkRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl DrinkRepo {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(DrinkTable {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    /// Store with the starter drink the service ships with.
    pub async fn seeded() -> Self {
        let repo = Self::new();
        // a fresh store cannot conflict
        let _ = repo
            .create(
                "water",
                vec![Ingredient {
                    name: "water".into(),
                    color: "blue".into(),
                    parts: 1,
                }],
            )
            .await;
        repo
    }

    /// Ordered by id.
    pub async fn list(&self) -> Vec<DrinkRow> {
        self.table.read().await.rows.values().cloned().collect()
    }

    pub async fn get(&self, id: i64) -> Option<DrinkRow> {
        self.table.read().await.rows.get(&id).cloned()
    }

    pub async fn create(
        &self,
        title: &str,
        recipe: Vec<Ingredient>,
    ) -> Result<DrinkRow, RepoError> {
        let mut table = self.table.write().await;

        if table.title_taken(title, None) {
            return Err(RepoError::Conflict);
        }

        let id = table.next_id;
        table.next_id += 1;

        let row = DrinkRow {
            id,
            title: title.to_string(),
            recipe,
        };
        table.rows.insert(id, row.clone());

        Ok(row)
    }

    /// `None` fields are left untouched. `Ok(None)` when `id` does not exist.
    pub async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<Vec<Ingredient>>,
    ) -> Result<Option<DrinkRow>, RepoError> {
        let mut table = self.table.write().await;

        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(title) = title
            && table.title_taken(title, Some(id))
        {
            return Err(RepoError::Conflict);
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            row.title = title.to_string();
        }
        if let Some(recipe) = recipe {
            row.recipe = recipe;
        }

        Ok(Some(row.clone()))
    }

    pub async fn delete(&self, id: i64) -> bool {
        self.table.write().await.rows.remove(&id).is_some()
    }
}
