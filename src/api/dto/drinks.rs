/*
 * Responsibility
 * - Drinks の request/response DTO
 * - short (公開一覧: color/parts のみ) と long (name を含む) の 2 つの表現
 * - validation (形式チェック) 用の validate()
 */
use serde::{Deserialize, Serialize};

use crate::repos::drink_repo::{DrinkRow, Ingredient};

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientInput {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Clients send either a single ingredient or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    One(IngredientInput),
    Many(Vec<IngredientInput>),
}

impl RecipeInput {
    pub fn into_ingredients(self) -> Vec<Ingredient> {
        let items = match self {
            RecipeInput::One(one) => vec![one],
            RecipeInput::Many(many) => many,
        };
        items
            .into_iter()
            .map(|i| Ingredient {
                name: i.name.trim().to_string(),
                color: i.color.trim().to_string(),
                parts: i.parts,
            })
            .collect()
    }

    fn validate(&self) -> Result<(), &'static str> {
        let items: &[IngredientInput] = match self {
            RecipeInput::One(one) => std::slice::from_ref(one),
            RecipeInput::Many(many) => many,
        };
        if items.is_empty() {
            return Err("recipe needs at least one ingredient");
        }
        for item in items {
            if item.name.trim().is_empty() {
                return Err("ingredient name is required");
            }
            if item.color.trim().is_empty() {
                return Err("ingredient color is required");
            }
            if item.parts == 0 {
                return Err("ingredient parts must be >= 1");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

impl CreateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        match &self.title {
            Some(title) if !title.trim().is_empty() => {}
            _ => return Err("title is required"),
        }
        match &self.recipe {
            Some(recipe) => recipe.validate(),
            None => Err("recipe is required"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<RecipeInput>,
}

impl UpdateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        if let Some(recipe) = &self.recipe {
            recipe.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Serialize)]
pub struct LongIngredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Serialize)]
pub struct DrinkShort {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

#[derive(Debug, Serialize)]
pub struct DrinkLong {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<LongIngredient>,
}

impl From<DrinkRow> for DrinkShort {
    fn from(row: DrinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            recipe: row
                .recipe
                .into_iter()
                .map(|i| ShortIngredient {
                    color: i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

impl From<DrinkRow> for DrinkLong {
    fn from(row: DrinkRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            recipe: row
                .recipe
                .into_iter()
                .map(|i| LongIngredient {
                    name: i.name,
                    color: i.color,
                    parts: i.parts,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    pub delete: i64,
}
