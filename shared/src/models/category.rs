//! Food item categories and the five budget buckets they roll up into

use serde::{Deserialize, Serialize};

/// Category of an inventory item as recorded in the item catalog
///
/// Codes are accepted in both English and Indonesian forms. Anything not
/// recognized parses to [`ItemCategory::Unclassified`], which keeps the
/// original code for audit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Protein,
    Carbohydrate,
    Vegetable,
    Fruit,
    Dairy,
    Spice,
    Oil,
    Beverage,
    Other,
    Unclassified(String),
}

impl ItemCategory {
    /// Parse a catalog category code
    pub fn from_code(code: &str) -> Self {
        let normalized = code.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "PROTEIN" | "PROTEIN_HEWANI" | "PROTEIN_NABATI" | "LAUK_PAUK" => ItemCategory::Protein,
            "CARBOHYDRATE" | "CARBS" | "KARBOHIDRAT" | "MAKANAN_POKOK" => ItemCategory::Carbohydrate,
            "VEGETABLE" | "VEGETABLES" | "SAYURAN" | "SAYUR" => ItemCategory::Vegetable,
            "FRUIT" | "FRUITS" | "BUAH" | "BUAH_BUAHAN" => ItemCategory::Fruit,
            "DAIRY" | "SUSU" | "SUSU_OLAHAN" => ItemCategory::Dairy,
            "SPICE" | "SPICES" | "BUMBU" | "BUMBU_REMPAH" => ItemCategory::Spice,
            "OIL" | "MINYAK" | "MINYAK_LEMAK" => ItemCategory::Oil,
            "BEVERAGE" | "MINUMAN" => ItemCategory::Beverage,
            "OTHER" | "LAINNYA" => ItemCategory::Other,
            _ => ItemCategory::Unclassified(code.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ItemCategory::Protein => "PROTEIN",
            ItemCategory::Carbohydrate => "CARBOHYDRATE",
            ItemCategory::Vegetable => "VEGETABLE",
            ItemCategory::Fruit => "FRUIT",
            ItemCategory::Dairy => "DAIRY",
            ItemCategory::Spice => "SPICE",
            ItemCategory::Oil => "OIL",
            ItemCategory::Beverage => "BEVERAGE",
            ItemCategory::Other => "OTHER",
            ItemCategory::Unclassified(code) => code,
        }
    }

    /// Budget bucket this category is charged against
    pub fn bucket(&self) -> CategoryBucket {
        match self {
            ItemCategory::Protein => CategoryBucket::Protein,
            ItemCategory::Carbohydrate => CategoryBucket::Carbohydrate,
            ItemCategory::Vegetable => CategoryBucket::Vegetable,
            ItemCategory::Fruit => CategoryBucket::Fruit,
            ItemCategory::Dairy
            | ItemCategory::Spice
            | ItemCategory::Oil
            | ItemCategory::Beverage
            | ItemCategory::Other
            | ItemCategory::Unclassified(_) => CategoryBucket::Other,
        }
    }
}

/// One of the five mutually exclusive spend classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBucket {
    Protein,
    Carbohydrate,
    Vegetable,
    Fruit,
    Other,
}

impl CategoryBucket {
    /// All buckets in reporting order
    pub const ALL: [CategoryBucket; 5] = [
        CategoryBucket::Protein,
        CategoryBucket::Carbohydrate,
        CategoryBucket::Vegetable,
        CategoryBucket::Fruit,
        CategoryBucket::Other,
    ];

    /// Buckets that carry a planned allocation for variance analysis
    pub const PRICED: [CategoryBucket; 4] = [
        CategoryBucket::Protein,
        CategoryBucket::Carbohydrate,
        CategoryBucket::Vegetable,
        CategoryBucket::Fruit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryBucket::Protein => "protein",
            CategoryBucket::Carbohydrate => "carbohydrate",
            CategoryBucket::Vegetable => "vegetable",
            CategoryBucket::Fruit => "fruit",
            CategoryBucket::Other => "other",
        }
    }
}

impl std::fmt::Display for CategoryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_and_indonesian_codes_agree() {
        assert_eq!(ItemCategory::from_code("PROTEIN_HEWANI"), ItemCategory::Protein);
        assert_eq!(ItemCategory::from_code("karbohidrat"), ItemCategory::Carbohydrate);
        assert_eq!(ItemCategory::from_code("Sayuran"), ItemCategory::Vegetable);
        assert_eq!(ItemCategory::from_code("buah-buahan"), ItemCategory::Fruit);
        assert_eq!(ItemCategory::from_code("SUSU_OLAHAN"), ItemCategory::Dairy);
    }

    #[test]
    fn test_unknown_code_routes_to_other() {
        let category = ItemCategory::from_code("FROZEN_DESSERT");
        assert_eq!(category, ItemCategory::Unclassified("FROZEN_DESSERT".to_string()));
        assert_eq!(category.bucket(), CategoryBucket::Other);
        assert_eq!(category.code(), "FROZEN_DESSERT");
    }

    #[test]
    fn test_secondary_categories_route_to_other() {
        for code in ["DAIRY", "BUMBU_REMPAH", "MINYAK_LEMAK", "MINUMAN", "LAINNYA"] {
            assert_eq!(ItemCategory::from_code(code).bucket(), CategoryBucket::Other);
        }
    }

    #[test]
    fn test_priced_buckets_exclude_other() {
        assert!(!CategoryBucket::PRICED.contains(&CategoryBucket::Other));
        assert_eq!(CategoryBucket::ALL.len(), 5);
    }
}
