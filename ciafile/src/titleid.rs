use std::fmt;

use crate::{Error, Result};
use bitflags::bitflags;

/// A title id split into its parts
///
/// Layout of the raw u64, from the most significant bits down:
/// platform (16 bits), category (16 bits), unique id (32 bits).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TitleId {
    id: u32,
    category: Category,
    plat: Platform,
}

impl TitleId {
    pub fn from_u64(what: u64) -> Result<TitleId> {
        let plat = Platform::from_u16((what >> 48) as u16)
            .ok_or(Error::EnumValueOutOfRange("titleid::Platform"))?;

        Ok(TitleId {
            id: what as u32,
            category: Category::from_bits_retain((what >> 32) as u16),
            plat,
        })
    }
    #[must_use]
    pub fn to_u64(self) -> u64 {
        (self.plat as u64) << 48 | u64::from(self.category.bits()) << 32 | u64::from(self.id)
    }
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.to_u64() == 0
    }
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }
    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }
    #[must_use]
    pub fn plat(&self) -> Platform {
        self.plat
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016x}", self.to_u64())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Platform {
    Wii = 1,
    Dsi = 3,
    Ctr = 4,
    Wiiu = 5,
}

impl Platform {
    #[must_use]
    pub fn from_u16(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self::Wii),
            3 => Some(Self::Dsi),
            4 => Some(Self::Ctr),
            5 => Some(Self::Wiiu),
            _ => None,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Category: u16 {
        const NORMAL = 0x0;
        const DLP_CHILD = 0x1;
        const DEMO = 0x2;
        const CONTENTS = 0x3;
        const ADDON_CONTENTS = 0x4;
        const PATCH = 0x6;
        const CANNOT_EXECUTION = 0x8;
        const SYSTEM = 0x10;
        const REQUIRE_BATCH_UPDATE = 0x20;
        const NOT_REQUIRE_USER_APPROVAL = 0x40;
        const NOT_REQUIRE_RIGHT_FOR_MOUNT = 0x80;
        const CAN_SKIP_CONVERT_JUMP_ID = 0x100;
        const TWL = 0x8000;

        // https://www.3dbrew.org/wiki/Title_list#CTR_System_Titles
        const UPDATE = Self::PATCH.bits() | Self::CANNOT_EXECUTION.bits();
        const DLC = Self::ADDON_CONTENTS.bits() | Self::CANNOT_EXECUTION.bits() | Self::NOT_REQUIRE_RIGHT_FOR_MOUNT.bits();
        const SYSTEM_APPLICATION = Self::NORMAL.bits() | Self::SYSTEM.bits();
        const SYSTEM_CONTENT = Self::CONTENTS.bits() | Self::CANNOT_EXECUTION.bits() | Self::SYSTEM.bits();
        const SHARED_CONTENT = Self::CONTENTS.bits() | Self::CANNOT_EXECUTION.bits() | Self::NOT_REQUIRE_RIGHT_FOR_MOUNT.bits() | Self::SYSTEM.bits();
        const AUTO_UPDATE_CONTENT = Self::CONTENTS.bits() | Self::CANNOT_EXECUTION.bits() | Self::NOT_REQUIRE_USER_APPROVAL.bits() | Self::NOT_REQUIRE_RIGHT_FOR_MOUNT.bits() | Self::SYSTEM.bits();
        const APPLET = Self::NORMAL.bits() | Self::SYSTEM.bits() | Self::REQUIRE_BATCH_UPDATE.bits();
        const BASE = Self::NORMAL.bits() | Self::SYSTEM.bits() | Self::REQUIRE_BATCH_UPDATE.bits() | Self::CAN_SKIP_CONVERT_JUMP_ID.bits();
        const FIRMWARE = Self::NORMAL.bits() | Self::CANNOT_EXECUTION.bits() | Self::SYSTEM.bits() | Self::REQUIRE_BATCH_UPDATE.bits() | Self::CAN_SKIP_CONVERT_JUMP_ID.bits();

        const _ = !0;
    }
}

const CATEGORY_NAMES: [(Category, &str); 12] = [
    (Category::NORMAL, "Application"),
    (Category::DLP_CHILD, "Download Play child"),
    (Category::DEMO, "Demo"),
    (Category::UPDATE, "Update"),
    (Category::DLC, "DLC"),
    (Category::SYSTEM_APPLICATION, "System application"),
    (Category::SYSTEM_CONTENT, "System data archive"),
    (Category::SHARED_CONTENT, "Shared data archive"),
    (Category::AUTO_UPDATE_CONTENT, "System data archive (auto update)"),
    (Category::APPLET, "System applet"),
    (Category::BASE, "System module"),
    (Category::FIRMWARE, "Firmware"),
];

impl Category {
    /// Human readable name of the well known categories
    ///
    /// Categories overlap bit-wise, so this compares the whole value.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        if let Some((_, name)) = CATEGORY_NAMES.iter().find(|(cat, _)| cat == self) {
            *name
        } else if self.contains(Self::TWL) {
            "TWL title"
        } else {
            "Unknown"
        }
    }
}
