use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body type requested for the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

impl Gender {
    /// Display name for the UI
    pub fn name(&self) -> &str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Neutral => "Neutral",
        }
    }

    /// Form value sent to the service
    pub fn id(&self) -> &str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Neutral => "neutral",
        }
    }

    /// Garment catalog and cloth simulation only exist for male and female bodies
    pub fn has_garments(&self) -> bool {
        matches!(self, Self::Male | Self::Female)
    }

    pub fn all() -> [Gender; 3] {
        [Self::Male, Self::Female, Self::Neutral]
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|g| g.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown gender '{s}'"))
    }
}

/// Garment size label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GarmentSize {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
}

impl GarmentSize {
    pub fn id(&self) -> &str {
        match self {
            Self::XS => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
            Self::XXL => "XXL",
        }
    }

    pub fn all() -> [GarmentSize; 6] {
        [Self::XS, Self::S, Self::M, Self::L, Self::XL, Self::XXL]
    }
}

impl Default for GarmentSize {
    fn default() -> Self {
        Self::M
    }
}

impl fmt::Display for GarmentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GarmentSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|size| size.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown garment size '{s}'"))
    }
}

/// Where a garment sits on the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentSlot {
    Tops,
    Bottoms,
    Other,
}

impl GarmentSlot {
    pub fn name(&self) -> &str {
        match self {
            Self::Tops => "Tops",
            Self::Bottoms => "Bottoms",
            Self::Other => "Other",
        }
    }

    pub fn all() -> [GarmentSlot; 3] {
        [Self::Tops, Self::Bottoms, Self::Other]
    }
}

/// Garment kinds the service ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GarmentKind {
    TShirt,
    Sweatshirt,
    Hoodie,
    Pants,
}

impl GarmentKind {
    /// Catalog id, also the folder name of the garment in the preview bucket
    pub fn id(&self) -> &str {
        match self {
            Self::TShirt => "t-shirt",
            Self::Sweatshirt => "sweatshirt",
            Self::Hoodie => "hoodie",
            Self::Pants => "pants",
        }
    }

    pub fn slot(&self) -> GarmentSlot {
        match self {
            Self::TShirt | Self::Sweatshirt | Self::Hoodie => GarmentSlot::Tops,
            Self::Pants => GarmentSlot::Bottoms,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.id() == id)
    }

    /// Slot for an arbitrary catalog id; unknown garments land in `Other`
    pub fn slot_for(id: &str) -> GarmentSlot {
        Self::from_id(id)
            .map(|kind| kind.slot())
            .unwrap_or(GarmentSlot::Other)
    }

    pub fn all() -> [GarmentKind; 4] {
        [Self::TShirt, Self::Sweatshirt, Self::Hoodie, Self::Pants]
    }
}

/// Cloth simulation quality, 1 (fast) to 10 (detailed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u8> for Quality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!("quality must be between {} and {}, got {value}", Self::MIN, Self::MAX)
        })
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Plausible body height in centimeters
pub const HEIGHT_RANGE_CM: std::ops::RangeInclusive<f32> = 140.0..=220.0;

/// Plausible body weight in kilograms
pub const WEIGHT_RANGE_KG: std::ops::RangeInclusive<f32> = 40.0..=120.0;

/// Garment color used when the user never picks one
pub const DEFAULT_GARMENT_COLOR: &str = "#C2C2C2";

/// Accepts `#RRGGBB`
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
