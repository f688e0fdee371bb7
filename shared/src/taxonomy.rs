//! Canonical complaint categories.
//!
//! Filing, filtering and the public tabs all go through [`Category`], so a
//! complaint filed under any historical spelling ("Water", "Animal Care", ...)
//! is still reachable by the category filter.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    PublicWorks,
    WaterSupply,
    Electricity,
    Environment,
    Traffic,
    PublicAmenities,
    LawAndOrder,
    UrbanPlanning,
    Health,
    AnimalWelfare,
    CitizenServices,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::PublicWorks,
        Category::WaterSupply,
        Category::Electricity,
        Category::Environment,
        Category::Traffic,
        Category::PublicAmenities,
        Category::LawAndOrder,
        Category::UrbanPlanning,
        Category::Health,
        Category::AnimalWelfare,
        Category::CitizenServices,
        Category::Other,
    ];

    /// Label the filing form offers and the backend stores.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PublicWorks => "Public Works (roads, potholes, drainage)",
            Self::WaterSupply => "Water Supply & Sanitation",
            Self::Electricity => "Electricity & Streetlights",
            Self::Environment => "Environment & Waste Management",
            Self::Traffic => "Traffic & Transport",
            Self::PublicAmenities => "Public Amenities (parks, toilets, bus stops)",
            Self::LawAndOrder => "Law & Order / Safety",
            Self::UrbanPlanning => "Urban Planning / Construction",
            Self::Health => "Health & Hygiene",
            Self::AnimalWelfare => "Animal Welfare",
            Self::CitizenServices => "Citizen Services (documents, offices)",
            Self::Other => "Other",
        }
    }

    /// Label used on filter chips and admin tables.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::PublicWorks => "Public Works",
            Self::WaterSupply => "Water Supply & Sanitation",
            Self::Electricity => "Electricity & Streetlights",
            Self::Environment => "Environment & Waste Management",
            Self::Traffic => "Traffic & Transport",
            Self::PublicAmenities => "Public Amenities",
            Self::LawAndOrder => "Law & Order / Safety",
            Self::UrbanPlanning => "Urban Planning / Construction",
            Self::Health => "Health & Hygiene",
            Self::AnimalWelfare => "Animal Welfare",
            Self::CitizenServices => "Citizen Services",
            Self::Other => "Other",
        }
    }

    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::PublicWorks => &["public works", "roads", "potholes", "infrastructure"],
            Self::WaterSupply => &["water", "water supply", "sanitation", "drainage & sanitation"],
            Self::Electricity => &["electricity", "streetlights", "street lights", "power"],
            Self::Environment => &["environment", "waste", "waste management", "garbage"],
            Self::Traffic => &["traffic", "transport", "traffic & transport"],
            Self::PublicAmenities => &["public amenities", "amenities", "parks"],
            Self::LawAndOrder => &["law & order", "law and order", "safety"],
            Self::UrbanPlanning => &["urban planning", "construction"],
            Self::Health => &["health", "hygiene", "health & sanitation"],
            Self::AnimalWelfare => &["animal care", "animals", "animal welfare"],
            Self::CitizenServices => &["citizen services", "documents"],
            Self::Other => &["other", "others", "general"],
        }
    }

    /// Resolves a long label, short label or alias, ignoring case and
    /// surrounding whitespace.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let needle = label.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|c| {
            c.label().to_lowercase() == needle
                || c.short_label().to_lowercase() == needle
                || c.aliases().contains(&needle.as_str())
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_label())
    }
}

/// A category as carried on a complaint: the canonical value plus the label
/// the backend sent, so an unknown label still displays as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryLabel {
    pub category: Category,
    pub raw: String,
}

impl CategoryLabel {
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let category = Category::parse(&raw).unwrap_or(Category::Other);
        Self { category, raw }
    }

    #[must_use]
    pub fn canonical(category: Category) -> Self {
        Self {
            category,
            raw: category.label().to_string(),
        }
    }

    /// Text shown to the user. Known categories use the short label; unknown
    /// ones keep the backend's text.
    #[must_use]
    pub fn display(&self) -> &str {
        if self.category == Category::Other && !self.raw.trim().is_empty() {
            &self.raw
        } else {
            self.category.short_label()
        }
    }
}

impl From<Category> for CategoryLabel {
    fn from(category: Category) -> Self {
        Self::canonical(category)
    }
}

impl Serialize for CategoryLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CategoryLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or(Self::Other))
    }
}
