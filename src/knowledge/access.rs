//! Validation and accessibility of remote announcements
//!
//! Accessibility is a property of the observing node: a remote entry that is
//! not accessible now is kept (parked) so that a later group grant can promote
//! it without the network resending anything.

use crate::authorization::AccessGroup;
use crate::entry::{decode_announcement, decode_installation, ComponentEntry, ComponentInstallation};
use crate::error::{RejectReason, ValidationError};
use crate::types::NodeId;
use std::collections::BTreeSet;

/// Raw announcement of one component by a remote node
#[derive(Debug, Clone, Copy)]
pub struct RemoteAnnouncement<'a> {
    pub publisher: &'a NodeId,
    pub component_id: &'a str,
    pub raw: &'a str,
}

/// Result of assessing a remote announcement against local policy
#[derive(Debug)]
pub enum Assessment {
    Accessible(ComponentEntry),
    Inaccessible(ComponentEntry),
    Rejected(RejectReason),
}

/// Decode, test accessibility against the local node's groups, and validate
pub fn assess(
    announcement: RemoteAnnouncement<'_>,
    accessible_groups: &BTreeSet<AccessGroup>,
) -> Assessment {
    let decoded = match decode_announcement(announcement.raw) {
        Ok(decoded) => decoded,
        Err(e) => return Assessment::Rejected(e.into()),
    };

    if !decoded.declared_permissions.is_accessible_to(accessible_groups) {
        // parked without structural validation; the descriptor is informational only
        let payload = decode_installation(&decoded.data).ok();
        return Assessment::Inaccessible(ComponentEntry::remote(
            announcement.component_id,
            decoded.declared_permissions,
            payload,
            announcement.raw,
        ));
    }

    let installation = match decode_installation(&decoded.data) {
        Ok(installation) => installation,
        Err(e) => return Assessment::Rejected(e.into()),
    };
    if let Err(e) = validate_installation(announcement.publisher, &installation) {
        return Assessment::Rejected(e.into());
    }

    Assessment::Accessible(ComponentEntry::remote(
        announcement.component_id,
        decoded.declared_permissions,
        Some(installation),
        announcement.raw,
    ))
}

/// Structural checks for an accessible descriptor
pub fn validate_installation(
    publisher: &NodeId,
    installation: &ComponentInstallation,
) -> Result<(), ValidationError> {
    if installation.node_id != publisher.as_str() {
        return Err(ValidationError::OriginMismatch {
            publisher: publisher.clone(),
            declared: installation.node_id.clone(),
        });
    }
    let revision = installation
        .component_revision
        .as_ref()
        .ok_or(ValidationError::MissingRevision)?;
    let interface = revision
        .component_interface
        .as_ref()
        .ok_or(ValidationError::MissingInterface)?;
    if interface.identifier_and_version.is_none() {
        return Err(ValidationError::MissingIdentifier);
    }
    Ok(())
}
