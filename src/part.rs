use std::fmt;

/// Semantic vehicle regions a mesh can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartCategory {
    Body,
    BrakeDisc,
    Seat,
    Rim,
}

/// How many material references a registry entry keeps for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArity {
    /// Last classified material wins.
    Single,
    /// Every classified material is appended in traversal order.
    Collection,
}

impl PartCategory {
    pub const ALL: [PartCategory; 4] =
        [PartCategory::Body, PartCategory::BrakeDisc, PartCategory::Seat, PartCategory::Rim];

    pub const COUNT: usize = Self::ALL.len();

    /// Maps the consumer-facing part name ("car", "brake", "seats", "rim") to a category.
    pub fn from_part_name(name: &str) -> Option<Self> {
        match name {
            "car" => Some(PartCategory::Body),
            "brake" => Some(PartCategory::BrakeDisc),
            "seats" => Some(PartCategory::Seat),
            "rim" => Some(PartCategory::Rim),
            _ => None,
        }
    }

    pub fn part_name(self) -> &'static str {
        match self {
            PartCategory::Body => "car",
            PartCategory::BrakeDisc => "brake",
            PartCategory::Seat => "seats",
            PartCategory::Rim => "rim",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PartCategory::Body => "Body",
            PartCategory::BrakeDisc => "Brake Disc",
            PartCategory::Seat => "Seat",
            PartCategory::Rim => "Rim",
        }
    }

    pub fn arity(self) -> StorageArity {
        match self {
            PartCategory::Body | PartCategory::Seat => StorageArity::Single,
            PartCategory::BrakeDisc | PartCategory::Rim => StorageArity::Collection,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PartCategory::Body => 0,
            PartCategory::BrakeDisc => 1,
            PartCategory::Seat => 2,
            PartCategory::Rim => 3,
        }
    }
}

impl fmt::Display for PartCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
