// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Anchor id and content-hash properties.
#![allow(missing_docs, clippy::unwrap_used)]

use beacon_core::render::DisplayLocation;
use beacon_core::{content_hash, AnchorId, ClientId, RegionCoord, Side};
use proptest::prelude::*;

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::North),
        Just(Side::East),
        Just(Side::South),
        Just(Side::West)
    ]
}

proptest! {
    #[test]
    fn parse_inverts_display(
        owner in any::<u128>(),
        world in "[a-z_:/0-9-]{1,24}",
        x in any::<i32>(),
        z in any::<i32>(),
        side in side(),
    ) {
        let id = AnchorId::new(ClientId::from_u128(owner), world, RegionCoord::new(x, z), side);
        let text = id.to_string();
        prop_assert_eq!(AnchorId::parse(&text), Some(id.clone()));
        prop_assert_eq!(AnchorId::owner_of(&text), Some(id.owner()));
        prop_assert_eq!(text, id.to_string());
    }

    #[test]
    fn parse_never_panics(s in ".{0,80}") {
        let _ = AnchorId::parse(&s);
        let _ = AnchorId::owner_of(&s);
    }

    #[test]
    fn content_hash_tracks_location_and_lines(
        x in -1.0e6..1.0e6_f64,
        dx in 0.001..100.0_f64,
        line in "[ -~]{0,32}",
        other in "[ -~]{0,32}",
    ) {
        let loc = DisplayLocation::new("w", x, 64.0, -x);
        let lines = vec![line.clone()];
        prop_assert_eq!(content_hash(&loc, &lines), content_hash(&loc.clone(), &lines.clone()));

        let moved = DisplayLocation::new("w", x + dx, 64.0, -x);
        prop_assert_ne!(content_hash(&loc, &lines), content_hash(&moved, &lines));

        if other != line {
            prop_assert_ne!(content_hash(&loc, &lines), content_hash(&loc, &[other]));
        }
    }
}

#[test]
fn malformed_ids_are_rejected() {
    let owner = ClientId::from_u128(7).to_string();
    for bad in [
        String::new(),
        "nonsense".to_owned(),
        owner.clone(),
        format!("{owner}:"),
        format!("{owner}::1:2:north"),
        format!("{owner}:w:1:2:up"),
        format!("{owner}:w:one:2:north"),
        format!("{owner}:w:1:north"),
        format!("zz{}:w:1:2:north", &owner[2..]),
    ] {
        assert_eq!(AnchorId::parse(&bad), None, "{bad:?}");
        assert!(bad.parse::<AnchorId>().is_err());
    }
}

#[test]
fn line_boundaries_are_part_of_the_hash() {
    let loc = DisplayLocation::new("w", 1.0, 2.0, 3.0);
    let split = content_hash(&loc, &["ab".to_owned(), "c".to_owned()]);
    let joined = content_hash(&loc, &["a".to_owned(), "bc".to_owned()]);
    assert_ne!(split, joined);
}
