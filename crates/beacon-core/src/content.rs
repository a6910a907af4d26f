// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Anchor text.

use crate::collab::Requirement;
use crate::eligibility::RegionStatus;
use crate::ident::RegionCoord;

/// Builds the lines shown by an anchor for `region`.
///
/// Frontier anchors show what unlocking costs; `requirement` is ignored for
/// unlocked regions.
pub fn anchor_lines(
    region: RegionCoord,
    status: RegionStatus,
    requirement: Option<&Requirement>,
) -> Vec<String> {
    let header = match status {
        RegionStatus::Unlocked => "Unlocked",
        RegionStatus::Locked => "Locked",
    };
    let mut lines = vec![header.to_owned(), format!("Region {region}")];
    if status == RegionStatus::Locked {
        lines.push(match requirement {
            Some(Requirement::Items { material, amount }) => {
                format!("Requires {amount} x {material}")
            }
            Some(Requirement::Description(text)) => format!("Requires {text}"),
            None => "Requirement unknown".to_owned(),
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_regions_list_their_cost() {
        let req = Requirement::Items {
            material: "diamond".into(),
            amount: 32,
        };
        let lines = anchor_lines(RegionCoord::new(1, 0), RegionStatus::Locked, Some(&req));
        assert_eq!(lines, vec!["Locked", "Region (1, 0)", "Requires 32 x diamond"]);
    }

    #[test]
    fn unlocked_regions_ignore_requirement() {
        let req = Requirement::Description("500 coins".into());
        let lines = anchor_lines(RegionCoord::new(0, 0), RegionStatus::Unlocked, Some(&req));
        assert_eq!(lines, vec!["Unlocked", "Region (0, 0)"]);
    }

    #[test]
    fn missing_requirement_is_explicit() {
        let lines = anchor_lines(RegionCoord::new(0, 5), RegionStatus::Locked, None);
        assert_eq!(lines.last().map(String::as_str), Some("Requirement unknown"));
    }
}
