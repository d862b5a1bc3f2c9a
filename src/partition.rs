use std::collections::{BTreeMap, HashSet};

use tracing::info;

use crate::attributes::NormalizedSnapshot;
use crate::model::{Attribute, Role, RoleTag};
use crate::roles::ResolvedRoles;

/// One promising player's latest attributes, restricted to the columns of their role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleRow {
    pub player_id: u64,
    pub player_name: String,
    pub potential_rating_ratio: Option<f64>,
    /// Parallel to `RoleTag::attributes()`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RolePartitionedDataset {
    pub tag: RoleTag,
    pub rows: Vec<RoleRow>,
}

impl RolePartitionedDataset {
    pub fn columns(&self) -> &'static [Attribute] {
        self.tag.attributes()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn player_names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.player_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleDatasets {
    pub forwards: RolePartitionedDataset,
    pub midfielders: RolePartitionedDataset,
    pub backs: RolePartitionedDataset,
}

impl RoleDatasets {
    pub fn get(&self, tag: RoleTag) -> &RolePartitionedDataset {
        match tag {
            RoleTag::Forward => &self.forwards,
            RoleTag::Midfield => &self.midfielders,
            RoleTag::Back => &self.backs,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RolePartitionedDataset> {
        RoleTag::ALL.into_iter().map(|tag| self.get(tag))
    }
}

/// Split the allow-listed players' latest snapshots into backs, midfielders and forwards.
/// Goalkeepers, unresolved roles and players without a name are left out.
pub fn build_role_datasets(
    promising_names: &[String],
    latest: &[NormalizedSnapshot],
    roles: &ResolvedRoles,
) -> RoleDatasets {
    let allow: HashSet<&str> = promising_names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();

    let mut by_tag: BTreeMap<RoleTag, Vec<RoleRow>> = BTreeMap::new();
    let mut skipped: BTreeMap<Role, usize> = BTreeMap::new();
    let mut without_role = 0usize;

    for snap in latest {
        let Some(name) = snap.player_name.as_deref() else {
            continue;
        };
        if !allow.contains(name.trim()) {
            continue;
        }
        let Some(role) = roles.role_of(snap.player_id()) else {
            without_role += 1;
            continue;
        };
        let Some(tag) = role.tag() else {
            *skipped.entry(role).or_insert(0) += 1;
            continue;
        };
        let values = tag
            .attributes()
            .iter()
            .map(|attr| snap.attribute(*attr))
            .collect();
        by_tag.entry(tag).or_default().push(RoleRow {
            player_id: snap.player_id(),
            player_name: name.to_string(),
            potential_rating_ratio: snap.potential_rating_ratio,
            values,
        });
    }

    let mut take = |tag: RoleTag| RolePartitionedDataset {
        tag,
        rows: by_tag.remove(&tag).unwrap_or_default(),
    };
    let out = RoleDatasets {
        forwards: take(RoleTag::Forward),
        midfielders: take(RoleTag::Midfield),
        backs: take(RoleTag::Back),
    };
    info!(
        allow_list = allow.len(),
        forwards = out.forwards.len(),
        midfielders = out.midfielders.len(),
        backs = out.backs.len(),
        without_role,
        excluded = ?skipped,
        "built role datasets"
    );
    out
}
