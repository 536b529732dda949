//! Area types and their clipping priority.
//!
//! Every polygon handed to the clipper is tagged with an [`AreaType`].
//! Where two areas overlap, the one earlier in [`AreaType::PRIORITY`] keeps
//! the ground. The table lists the types in declaration order, so the slot
//! index of a type and its priority agree; the clipper walks the table
//! rather than the discriminants.

use std::fmt;

use crate::error::{Error, Result};

/// Material class of an area polygon.
///
/// ## Rust Lesson #10: Enums (Sum Types)
///
/// A closed enum means an out-of-range area can't be constructed at all.
/// Raw integer slots coming from outside go through [`AreaType::from_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AreaType {
    SomeSort,
    /// Leave the area completely empty.
    Hole,
    Airport,
    Freeway,
    Road,
    Railroad,
    Pond,
    Lake,
    DryLake,
    IntLake,
    Reservoir,
    IntReservoir,
    Stream,
    IntStream,
    Canal,
    Glacier,
    /// Default owner of any tile area nobody else claims.
    Ocean,
    Urban,
    Town,
    FloodLand,
    Bog,
    Marsh,
    Sand,
    Littoral,
    // USGS land covers
    BuiltUpCover,
    DryCropPastureCover,
    IrrCropPastureCover,
    MixedCropPastureCover,
    CropGrassCover,
    CropWoodCover,
    GrassCover,
    ShrubCover,
    ShrubGrassCover,
    SavannaCover,
    DeciduousBroadCover,
    DeciduousNeedleCover,
    EvergreenBroadCover,
    EvergreenNeedleCover,
    MixedForestCover,
    WaterBodyCover,
    HerbWetlandCover,
    WoodedWetlandCover,
    BarrenCover,
    HerbTundraCover,
    WoodedTundraCover,
    MixedTundraCover,
    BareTundraCover,
    SnowCover,
    Island,
    /// Landmass: everything except holes is clipped to these polygons.
    Default,
    Void,
    Null,
}

impl AreaType {
    /// Clipping priority, highest first.
    pub const PRIORITY: [AreaType; 52] = [
        AreaType::SomeSort,
        AreaType::Hole,
        AreaType::Airport,
        AreaType::Freeway,
        AreaType::Road,
        AreaType::Railroad,
        AreaType::Pond,
        AreaType::Lake,
        AreaType::DryLake,
        AreaType::IntLake,
        AreaType::Reservoir,
        AreaType::IntReservoir,
        AreaType::Stream,
        AreaType::IntStream,
        AreaType::Canal,
        AreaType::Glacier,
        AreaType::Ocean,
        AreaType::Urban,
        AreaType::Town,
        AreaType::FloodLand,
        AreaType::Bog,
        AreaType::Marsh,
        AreaType::Sand,
        AreaType::Littoral,
        AreaType::BuiltUpCover,
        AreaType::DryCropPastureCover,
        AreaType::IrrCropPastureCover,
        AreaType::MixedCropPastureCover,
        AreaType::CropGrassCover,
        AreaType::CropWoodCover,
        AreaType::GrassCover,
        AreaType::ShrubCover,
        AreaType::ShrubGrassCover,
        AreaType::SavannaCover,
        AreaType::DeciduousBroadCover,
        AreaType::DeciduousNeedleCover,
        AreaType::EvergreenBroadCover,
        AreaType::EvergreenNeedleCover,
        AreaType::MixedForestCover,
        AreaType::WaterBodyCover,
        AreaType::HerbWetlandCover,
        AreaType::WoodedWetlandCover,
        AreaType::BarrenCover,
        AreaType::HerbTundraCover,
        AreaType::WoodedTundraCover,
        AreaType::MixedTundraCover,
        AreaType::BareTundraCover,
        AreaType::SnowCover,
        AreaType::Island,
        AreaType::Default,
        AreaType::Void,
        AreaType::Null,
    ];

    /// Number of area slots.
    pub const COUNT: usize = Self::PRIORITY.len();

    /// Slot index of this type (0-based).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Position in the priority table; lower clips first.
    pub fn priority(self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|&t| t == self)
            .unwrap_or(Self::COUNT)
    }

    /// Look up a raw slot index.
    pub fn from_index(index: usize) -> Result<AreaType> {
        Self::PRIORITY
            .get(index)
            .copied()
            .ok_or(Error::AreaIndexOutOfRange {
                index,
                max: Self::COUNT - 1,
            })
    }

    /// Name used in polygon definition files.
    pub fn name(self) -> &'static str {
        match self {
            AreaType::SomeSort => "SomeSort",
            AreaType::Hole => "Hole",
            AreaType::Airport => "Airport",
            AreaType::Freeway => "Freeway",
            AreaType::Road => "Road",
            AreaType::Railroad => "Railroad",
            AreaType::Pond => "Pond",
            AreaType::Lake => "Lake",
            AreaType::DryLake => "DryLake",
            AreaType::IntLake => "IntermittentLake",
            AreaType::Reservoir => "Reservoir",
            AreaType::IntReservoir => "IntermittentReservoir",
            AreaType::Stream => "Stream",
            AreaType::IntStream => "IntermittentStream",
            AreaType::Canal => "Canal",
            AreaType::Glacier => "Glacier",
            AreaType::Ocean => "Ocean",
            AreaType::Urban => "Urban",
            AreaType::Town => "Town",
            AreaType::FloodLand => "FloodLand",
            AreaType::Bog => "Bog",
            AreaType::Marsh => "Marsh",
            AreaType::Sand => "Sand",
            AreaType::Littoral => "Littoral",
            AreaType::BuiltUpCover => "BuiltUpCover",
            AreaType::DryCropPastureCover => "DryCropPastureCover",
            AreaType::IrrCropPastureCover => "IrrCropPastureCover",
            AreaType::MixedCropPastureCover => "MixedCropPastureCover",
            AreaType::CropGrassCover => "CropGrassCover",
            AreaType::CropWoodCover => "CropWoodCover",
            AreaType::GrassCover => "GrassCover",
            AreaType::ShrubCover => "ShrubCover",
            AreaType::ShrubGrassCover => "ShrubGrassCover",
            AreaType::SavannaCover => "SavannaCover",
            AreaType::DeciduousBroadCover => "DeciduousBroadCover",
            AreaType::DeciduousNeedleCover => "DeciduousNeedleCover",
            AreaType::EvergreenBroadCover => "EvergreenBroadCover",
            AreaType::EvergreenNeedleCover => "EvergreenNeedleCover",
            AreaType::MixedForestCover => "MixedForestCover",
            AreaType::WaterBodyCover => "WaterBodyCover",
            AreaType::HerbWetlandCover => "HerbWetlandCover",
            AreaType::WoodedWetlandCover => "WoodedWetlandCover",
            AreaType::BarrenCover => "BarrenCover",
            AreaType::HerbTundraCover => "HerbTundraCover",
            AreaType::WoodedTundraCover => "WoodedTundraCover",
            AreaType::MixedTundraCover => "MixedTundraCover",
            AreaType::BareTundraCover => "BareTundraCover",
            AreaType::SnowCover => "SnowCover",
            AreaType::Island => "Island",
            AreaType::Default => "Default",
            AreaType::Void => "Void",
            AreaType::Null => "Null",
        }
    }

    /// Parse an area name from a polygon definition file.
    ///
    /// Accepts the canonical names plus the short forms older files use
    /// for the intermittent water types.
    pub fn from_name(name: &str) -> Result<AreaType> {
        match name {
            "IntLake" => return Ok(AreaType::IntLake),
            "IntReservoir" => return Ok(AreaType::IntReservoir),
            "IntStream" => return Ok(AreaType::IntStream),
            _ => {}
        }
        Self::PRIORITY
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::UnknownAreaType(name.to_string()))
    }

    #[inline]
    pub fn is_hole_area(self) -> bool {
        self == AreaType::Hole
    }

    #[inline]
    pub fn is_landmass_area(self) -> bool {
        self == AreaType::Default
    }

    #[inline]
    pub fn is_island_area(self) -> bool {
        self == AreaType::Island
    }

    /// Water bodies: these get island holes cut out of them.
    pub fn is_water_area(self) -> bool {
        matches!(
            self,
            AreaType::Pond
                | AreaType::Lake
                | AreaType::DryLake
                | AreaType::IntLake
                | AreaType::Reservoir
                | AreaType::IntReservoir
                | AreaType::Stream
                | AreaType::IntStream
                | AreaType::Canal
                | AreaType::Ocean
                | AreaType::Bog
                | AreaType::Marsh
                | AreaType::Littoral
                | AreaType::WaterBodyCover
        )
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
