use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas ---

/// Ingredient
///
/// One entry of a drink's recipe. `parts` is the quantity: how many parts of the cup
/// this ingredient fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Drink
///
/// A menu entry as stored in the `drink` table. Serialized as-is this is the long
/// (detail) view; `short()` yields the public summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Drink {
    #[ts(type = "number")]
    pub id: i64,
    // Unique across the menu.
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// Public projection: ingredient quantities are left out.
    pub fn short(&self) -> DrinkShort {
        DrinkShort {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| IngredientShort {
                    name: ingredient.name.clone(),
                    color: ingredient.color.clone(),
                })
                .collect(),
        }
    }
}

/// IngredientShort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IngredientShort {
    pub name: String,
    pub color: String,
}

/// DrinkShort
///
/// The summary view served on the public listing (GET /drinks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DrinkShort {
    #[ts(type = "number")]
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientShort>,
}

// --- Request Payloads (Input) ---

/// RecipeInput
///
/// Clients may send a single ingredient object or an array of them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(untagged)]
#[ts(export)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl From<RecipeInput> for Vec<Ingredient> {
    fn from(input: RecipeInput) -> Self {
        match input {
            RecipeInput::Many(ingredients) => ingredients,
            RecipeInput::One(ingredient) => vec![ingredient],
        }
    }
}

/// CreateDrinkRequest
///
/// Input payload for POST /drinks. Both fields are optional at the serde level so that
/// a missing field is reported as a 400 with a readable message instead of a
/// deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateDrinkRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecipeInput>,
}

/// UpdateDrinkRequest
///
/// Partial update payload for PATCH /drinks/{id}; only provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateDrinkRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecipeInput>,
}

const ZERO_PARTS: &str = "Ingredient parts must be greater than zero";

fn all_parts_positive(recipe: &[Ingredient]) -> bool {
    recipe.iter().all(|ingredient| ingredient.parts > 0)
}

/// NewDrink
///
/// A validated `CreateDrinkRequest`, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl TryFrom<CreateDrinkRequest> for NewDrink {
    type Error = &'static str;

    fn try_from(req: CreateDrinkRequest) -> Result<Self, Self::Error> {
        const REQUIRED: &str = "Title and recipe are required";

        let title = req.title.filter(|t| !t.trim().is_empty()).ok_or(REQUIRED)?;
        let recipe: Vec<Ingredient> = req.recipe.ok_or(REQUIRED)?.into();
        if recipe.is_empty() {
            return Err(REQUIRED);
        }
        if !all_parts_positive(&recipe) {
            return Err(ZERO_PARTS);
        }

        Ok(NewDrink { title, recipe })
    }
}

/// DrinkChanges
///
/// A validated `UpdateDrinkRequest`. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrinkChanges {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

impl TryFrom<UpdateDrinkRequest> for DrinkChanges {
    type Error = &'static str;

    fn try_from(req: UpdateDrinkRequest) -> Result<Self, Self::Error> {
        if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("Title must not be empty");
        }
        let recipe: Option<Vec<Ingredient>> = req.recipe.map(Into::into);
        if recipe.as_ref().is_some_and(Vec::is_empty) {
            return Err("Recipe must contain at least one ingredient");
        }
        if recipe.as_deref().is_some_and(|r| !all_parts_positive(r)) {
            return Err(ZERO_PARTS);
        }

        Ok(DrinkChanges {
            title: req.title,
            recipe,
        })
    }
}

// --- Response Envelopes (Output) ---

/// DrinkSummaryResponse
///
/// Body of GET /drinks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DrinkSummaryResponse {
    pub success: bool,
    pub drinks: Vec<DrinkShort>,
}

/// DrinkDetailResponse
///
/// Body of GET /drinks-detail, and of POST/PATCH where `drinks` holds only the created
/// or updated drink.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DrinkDetailResponse {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

/// DeleteDrinkResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    #[ts(type = "number")]
    pub delete: i64,
}

/// ErrorResponse
///
/// Uniform failure body. `error` repeats the HTTP status code.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub message: String,
}
