// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier types for clients, regions and display anchors.
use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Length of a [`ClientId`] in its hex string form.
const CLIENT_HEX_LEN: usize = 32;

/// Opaque 128-bit identifier of a connected client (a player session).
///
/// The string form is 32 lowercase hex characters.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ClientId(pub [u8; 16]);

impl ClientId {
    /// Builds an id from a `u128` (big-endian byte order).
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Returns the id as a `u128`.
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Parses the 32-character hex form. Returns `None` on any malformed input.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != CLIENT_HEX_LEN {
            return None;
        }
        let mut out = [0u8; 16];
        hex::decode_to_slice(s, &mut out).ok()?;
        Some(Self(out))
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Coordinate of a region cell (the unit of ownership and locking).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RegionCoord {
    /// Cell index along X.
    pub x: i32,
    /// Cell index along Z.
    pub z: i32,
}

impl RegionCoord {
    /// Creates a region coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The four cardinal neighbours (no diagonals).
    ///
    /// Neighbours that would overflow the coordinate range are omitted.
    pub fn cardinal_neighbors(self) -> impl Iterator<Item = RegionCoord> {
        let Self { x, z } = self;
        [
            x.checked_add(1).map(|nx| Self::new(nx, z)),
            x.checked_sub(1).map(|nx| Self::new(nx, z)),
            z.checked_add(1).map(|nz| Self::new(x, nz)),
            z.checked_sub(1).map(|nz| Self::new(x, nz)),
        ]
        .into_iter()
        .flatten()
    }
}

impl fmt::Display for RegionCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Which edge of a region an anchor sits on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Side {
    /// The -Z edge.
    North,
    /// The +X edge.
    East,
    /// The +Z edge.
    South,
    /// The -X edge.
    West,
}

impl Side {
    /// Every side, in canonical order.
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Stable lowercase name used in the anchor id string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        }
    }

    /// Parses [`Side::as_str`] output.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|side| side.as_str() == s)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`AnchorId::from_str`] for malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid anchor id")]
pub struct InvalidAnchorId;

/// Deterministic identifier of one display anchor.
///
/// String form: `<owner-hex>:<world>:<region-x>:<region-z>:<side>`.
/// The world name may itself contain `:`; the numeric tail is parsed from the
/// right. A valid id has a non-empty world name, and for every valid id
/// `AnchorId::parse(&id.to_string()) == Some(id)`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct AnchorId {
    owner: ClientId,
    world: String,
    region: RegionCoord,
    side: Side,
}

impl AnchorId {
    /// Builds an id from its fields.
    pub fn new(owner: ClientId, world: impl Into<String>, region: RegionCoord, side: Side) -> Self {
        Self {
            owner,
            world: world.into(),
            region,
            side,
        }
    }

    /// Client this anchor is shown to.
    pub fn owner(&self) -> ClientId {
        self.owner
    }

    /// World the anchored region lives in.
    pub fn world(&self) -> &str {
        &self.world
    }

    /// Region the anchor describes.
    pub fn region(&self) -> RegionCoord {
        self.region
    }

    /// Edge of the region the anchor sits on.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Full parse of the string form. Returns `None` on malformed input.
    pub fn parse(s: &str) -> Option<Self> {
        let owner = Self::owner_of(s)?;
        let rest = &s[CLIENT_HEX_LEN + 1..];
        let mut tail = rest.rsplitn(4, ':');
        let side = Side::parse(tail.next()?)?;
        let z = tail.next()?.parse().ok()?;
        let x = tail.next()?.parse().ok()?;
        let world = tail.next()?;
        if world.is_empty() {
            return None;
        }
        Some(Self::new(owner, world, RegionCoord::new(x, z), side))
    }

    /// Fast path: extracts just the owner without parsing the rest.
    pub fn owner_of(s: &str) -> Option<ClientId> {
        let head = s.get(..CLIENT_HEX_LEN)?;
        if s.as_bytes().get(CLIENT_HEX_LEN) != Some(&b':') {
            return None;
        }
        ClientId::from_hex(head)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.owner, self.world, self.region.x, self.region.z, self.side
        )
    }
}

impl FromStr for AnchorId {
    type Err = InvalidAnchorId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(InvalidAnchorId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> ClientId {
        ClientId::from_u128(0x00ff_1234_0000_0000_0000_0000_dead_beef)
    }

    #[test]
    fn same_fields_give_same_string() {
        let a = AnchorId::new(owner(), "world", RegionCoord::new(3, -7), Side::East);
        let b = AnchorId::new(owner(), "world", RegionCoord::new(3, -7), Side::East);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(
            a.to_string(),
            "00ff12340000000000000000deadbeef:world:3:-7:east"
        );
    }

    #[test]
    fn world_names_with_separators_round_trip() {
        let id = AnchorId::new(owner(), "minecraft:the_end", RegionCoord::new(-1, 0), Side::North);
        assert_eq!(AnchorId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        let good = AnchorId::new(owner(), "w", RegionCoord::new(0, 0), Side::West).to_string();
        let cases = [
            String::new(),
            "garbage".to_owned(),
            good.replace("west", "up"),
            good.replace(":w:", "::"),
            good.replacen('0', "g", 1),
            good[..CLIENT_HEX_LEN].to_owned(),
            format!("{}:w:1:west", &good[..CLIENT_HEX_LEN]),
            format!("{}:w:1:99999999999:west", &good[..CLIENT_HEX_LEN]),
            "é".repeat(40),
        ];
        for case in cases {
            assert_eq!(AnchorId::parse(&case), None, "accepted {case:?}");
            assert!(case.parse::<AnchorId>().is_err());
        }
    }

    #[test]
    fn owner_fast_path_matches_full_parse() {
        let id = AnchorId::new(owner(), "w", RegionCoord::new(9, 9), Side::South);
        let s = id.to_string();
        assert_eq!(AnchorId::owner_of(&s), Some(owner()));
        assert_eq!(AnchorId::owner_of("short"), None);
        assert_eq!(AnchorId::owner_of(&s.replacen(':', "-", 1)), None);
    }

    #[test]
    fn neighbors_are_cardinal_only() {
        let n: Vec<_> = RegionCoord::new(0, 0).cardinal_neighbors().collect();
        assert_eq!(n.len(), 4);
        assert!(!n.contains(&RegionCoord::new(1, 1)));
        assert!(n.contains(&RegionCoord::new(0, -1)));

        let edge: Vec<_> = RegionCoord::new(i32::MAX, 0).cardinal_neighbors().collect();
        assert_eq!(edge.len(), 3);
    }
}
