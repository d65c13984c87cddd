//! Group forest
//!
//! Pieces and groups point at an optional parent group. The chain of
//! parents ends at a top group, which is the unit of selection.

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};

use super::object::{GroupId, PieceId};
use super::Model;

/// A named set of pieces and child groups.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) name: String,
    pub(crate) parent: Option<GroupId>,
    /// Rotation pivot of the group
    pub center: Vec3,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }
}

impl Model {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Look up the group `name` directly under `parent`.
    ///
    /// A same-named group under another parent is never reused: with
    /// `create` a new group is made, under a unique name if needed.
    pub fn get_group(&mut self, name: &str, parent: Option<GroupId>, create: bool) -> Result<GroupId> {
        if let Some(group) = self.groups.iter().find(|g| g.name == name && g.parent == parent) {
            return Ok(group.id);
        }

        if !create {
            return Err(Error::GroupNotFound(name.to_string()));
        }

        Ok(self.add_group(name, parent))
    }

    /// Create a group. Taken or empty names are made unique.
    pub fn add_group(&mut self, name: &str, parent: Option<GroupId>) -> GroupId {
        let name = self.unique_group_name(name);
        let id = GroupId(self.alloc_id());
        self.groups.push(Group {
            id,
            name,
            parent,
            center: Vec3::ZERO,
        });
        id
    }

    pub(crate) fn unique_group_name(&self, base: &str) -> String {
        let base = base.trim();
        if !base.is_empty() && self.group_by_name(base).is_none() {
            return base.to_string();
        }

        let stem = if base.is_empty() { "Group" } else { base };
        (1..)
            .map(|n| format!("{stem} #{n}"))
            .find(|candidate| self.group_by_name(candidate).is_none())
            .unwrap_or_else(|| stem.to_string())
    }

    /// Delete a group. Its pieces and child groups move up to its parent.
    pub fn remove_group(&mut self, id: GroupId) -> Result<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| Error::GroupNotFound(format!("{id:?}")))?;
        let removed = self.groups.remove(index);

        for piece in &mut self.pieces {
            if piece.group == Some(id) {
                piece.group = removed.parent;
            }
        }
        for group in &mut self.groups {
            if group.parent == Some(id) {
                group.parent = removed.parent;
            }
        }
        Ok(())
    }

    /// Root of the parent chain starting at `group`.
    pub fn top_group_of(&self, group: GroupId) -> GroupId {
        let mut top = group;
        // A well-formed forest has chains no longer than the group count.
        for _ in 0..=self.groups.len() {
            match self.group(top).and_then(|g| g.parent) {
                Some(parent) => top = parent,
                None => break,
            }
        }
        top
    }

    /// Top group of a piece, if it is grouped at all.
    pub fn top_group(&self, piece: PieceId) -> Option<GroupId> {
        let group = self.piece(piece)?.group?;
        Some(self.top_group_of(group))
    }

    /// True if `ancestor` is `group` or one of its parents.
    pub(crate) fn group_has_ancestor(&self, group: GroupId, ancestor: GroupId) -> bool {
        let mut current = Some(group);
        for _ in 0..=self.groups.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.group(id).and_then(|g| g.parent),
                None => return false,
            }
        }
        false
    }

    /// Re-parent a group and commit a checkpoint. Refuses to create a cycle.
    pub fn set_group_parent(&mut self, group: GroupId, parent: Option<GroupId>) -> Result<()> {
        if self.group(group).is_none() {
            return Err(Error::GroupNotFound(format!("{group:?}")));
        }

        if let Some(parent) = parent {
            let parent_group = self
                .group(parent)
                .ok_or_else(|| Error::GroupNotFound(format!("{parent:?}")))?;
            if self.group_has_ancestor(parent, group) {
                return Err(Error::GroupCycle(parent_group.name.clone()));
            }
        }

        if let Some(g) = self.group_mut(group) {
            g.parent = parent;
        }
        self.remove_empty_groups();
        self.save_checkpoint("Editing Groups");
        Ok(())
    }

    /// Pieces plus child groups pointing at `id`.
    pub(crate) fn group_reference_count(&self, id: GroupId) -> usize {
        let pieces = self.pieces.iter().filter(|p| p.group == Some(id)).count();
        let groups = self.groups.iter().filter(|g| g.parent == Some(id)).count();
        pieces + groups
    }

    /// Prune groups with fewer than two members until none are left.
    ///
    /// A group with a single member hands that member over to its own
    /// parent. Returns the number of groups removed.
    pub fn remove_empty_groups(&mut self) -> usize {
        let mut removed = 0;

        'scan: loop {
            for index in 0..self.groups.len() {
                let id = self.groups[index].id;
                if self.group_reference_count(id) < 2 {
                    let group = self.groups.remove(index);
                    for piece in &mut self.pieces {
                        if piece.group == Some(id) {
                            piece.group = group.parent;
                        }
                    }
                    for child in &mut self.groups {
                        if child.parent == Some(id) {
                            child.parent = group.parent;
                        }
                    }
                    log::debug!("Pruned group '{}'", group.name);
                    removed += 1;
                    continue 'scan;
                }
            }
            break;
        }

        removed
    }

    /// Break any parent cycle by detaching the group that closes it.
    pub(crate) fn break_group_cycles(&mut self) {
        for index in 0..self.groups.len() {
            let id = self.groups[index].id;
            if let Some(parent) = self.groups[index].parent {
                if self.group_has_ancestor(parent, id) {
                    log::warn!("Group '{}' is its own ancestor, detaching it", self.groups[index].name);
                    self.groups[index].parent = None;
                }
            }
        }
    }
}
