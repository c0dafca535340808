//! ATA Attribute Unit Conversion
//!
//! Vendors expose host read/write totals under many attribute names and in
//! many units. The tables below map each known name to the conversion that
//! turns its raw value into bytes.

use serde::{Deserialize, Serialize};

const GIB: u64 = 1 << 30;
const MIB: u64 = 1 << 20;
const BLOCK_32MIB: u64 = 32 << 20;

// =============================================================================
// Conversion Kinds
// =============================================================================

/// How a raw attribute value maps to bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// Logical blocks, multiplied by the logical block size
    LbaToBytes,
    Gib,
    Mib,
    /// 32 MiB blocks
    Block32Mib,
    /// Already bytes
    Identity,
}

impl ConversionKind {
    /// Convert a raw value to bytes, saturating on overflow
    pub fn apply(&self, raw: u64, logical_block_size: u64) -> u64 {
        match self {
            ConversionKind::LbaToBytes => raw.saturating_mul(logical_block_size),
            ConversionKind::Gib => raw.saturating_mul(GIB),
            ConversionKind::Mib => raw.saturating_mul(MIB),
            ConversionKind::Block32Mib => raw.saturating_mul(BLOCK_32MIB),
            ConversionKind::Identity => raw,
        }
    }
}

// =============================================================================
// Conversion Tables
// =============================================================================

/// Which host counter an attribute feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Read,
    Write,
}

// "Host_Reades_GiB" is spelled that way in the firmware of some drives.
static READ_TABLE: &[(&str, ConversionKind)] = &[
    ("Total_LBAs_Read", ConversionKind::LbaToBytes),
    ("Host_Reads", ConversionKind::LbaToBytes),
    ("Host_Reades_GiB", ConversionKind::Gib),
    ("Host_Reads_MiB", ConversionKind::Mib),
    ("Lifetime_Reads_GiB", ConversionKind::Gib),
    ("Host_Reads_32MiB", ConversionKind::Block32Mib),
    ("Host_Reads_GiB", ConversionKind::Gib),
    ("Total_Reads_GiB", ConversionKind::Gib),
    ("Total_Reads_GB", ConversionKind::Gib),
    ("Flash_Reads_LBAs", ConversionKind::LbaToBytes),
    ("Device_Bytes_Read", ConversionKind::Identity),
];

static WRITE_TABLE: &[(&str, ConversionKind)] = &[
    ("Total_LBAs_Written", ConversionKind::LbaToBytes),
    ("Host_Writes_GiB", ConversionKind::Gib),
    ("Host_Writes_MiB", ConversionKind::Mib),
    ("Lifetime_Writes_GiB", ConversionKind::Gib),
    ("Host_Writes_32MiB", ConversionKind::Block32Mib),
    ("Flash_Writes_GiB", ConversionKind::Gib),
    ("Total_Writes_GiB", ConversionKind::Gib),
    ("Total_Writes_GB", ConversionKind::Gib),
    ("Flash_Writes_LBAs", ConversionKind::LbaToBytes),
];

impl Category {
    /// Known attribute names for this category
    pub fn table(&self) -> &'static [(&'static str, ConversionKind)] {
        match self {
            Category::Read => READ_TABLE,
            Category::Write => WRITE_TABLE,
        }
    }

    /// Conversion for an attribute name, if the name is known
    pub fn kind_for(&self, name: &str) -> Option<ConversionKind> {
        self.table()
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, kind)| *kind)
    }
}

/// Bytes for a single attribute, or `None` if the name is not in the table
pub fn bytes_for(
    category: Category,
    name: &str,
    raw_value: u64,
    logical_block_size: u64,
) -> Option<u64> {
    category
        .kind_for(name)
        .map(|kind| kind.apply(raw_value, logical_block_size))
}

// =============================================================================
// Attribute Lookup
// =============================================================================

/// A named ATA SMART attribute with its raw value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtaAttribute {
    pub name: String,
    pub raw_value: u64,
}

impl AtaAttribute {
    pub fn new(name: impl Into<String>, raw_value: u64) -> Self {
        Self {
            name: name.into(),
            raw_value,
        }
    }
}

/// Bytes from the first attribute, in table order, whose name is known
///
/// Attributes are keyed by name: a name repeated further down keeps the
/// position of its first row but takes the raw value of its last row.
/// Other known names after the first are ignored and nothing is summed.
pub fn first_match(
    category: Category,
    attributes: &[AtaAttribute],
    logical_block_size: u64,
) -> Option<u64> {
    let first = attributes
        .iter()
        .find(|attr| category.kind_for(&attr.name).is_some())?;
    let latest = attributes
        .iter()
        .rev()
        .find(|attr| attr.name == first.name)
        .unwrap_or(first);

    bytes_for(category, &latest.name, latest.raw_value, logical_block_size)
}
